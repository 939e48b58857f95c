//! Subscription routing layer.
//!
//! Owns the live subscription index and answers "who receives this payload" and
//! "what is currently subscribed" under a single lock.
//!
//! ```
//! use std::collections::HashSet;
//! use vms_broker::{Layer, SubscriptionRouter};
//!
//! let speed = Layer::new(1, 0, 0);
//! let router: SubscriptionRouter<&str> = SubscriptionRouter::new();
//!
//! router.subscribe_layer("dashboard", speed);
//! router.subscribe_layer_from_publisher("recorder", speed, 3);
//! router.subscribe_all("logger");
//!
//! assert_eq!(
//!     router.get_subscribers_for_layer_from_publisher(&speed, 3),
//!     HashSet::from(["dashboard", "recorder", "logger"])
//! );
//! assert_eq!(
//!     router.get_subscribers_for_layer_from_publisher(&speed, 4),
//!     HashSet::from(["dashboard", "logger"])
//! );
//! ```

pub(crate) mod nested_index;
pub(crate) mod subscription_router;
