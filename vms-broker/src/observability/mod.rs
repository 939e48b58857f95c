//! Structured logging vocabulary shared by all broker components.
//!
//! Library code emits `tracing` events tagged with the names in [`events`] and the
//! keys in [`fields`]; it never installs a global subscriber.

pub mod events;
pub mod fields;
