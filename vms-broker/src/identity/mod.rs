//! Publisher identity layer.
//!
//! Maps opaque publisher identity blobs onto dense integer handles so that the
//! rest of the broker can key availability and routing state on a plain `i32`.
//!
//! ```
//! use vms_broker::PublisherIdentityRegistry;
//!
//! let registry = PublisherIdentityRegistry::new();
//! let camera = registry.get_or_create_id(b"camera-service".to_vec())?;
//! let radar = registry.get_or_create_id(b"radar-service".to_vec())?;
//!
//! assert_eq!(camera, 0);
//! assert_eq!(radar, 1);
//! assert_eq!(registry.get_or_create_id(b"camera-service".to_vec())?, camera);
//! assert_eq!(registry.get_info(radar)?, b"radar-service".to_vec());
//! # Ok::<(), vms_broker::PublisherIdentityError>(())
//! ```

pub(crate) mod publisher_registry;
