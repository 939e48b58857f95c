//! Layer availability layer.
//!
//! Turns the complete set of publisher offerings into the set of layers that can
//! actually be produced. A layer is available when at least one of its declared
//! dependency sets is fully available; cycles fail the path they occur on.
//!
//! ```
//! use vms_broker::{Layer, LayerAvailability, LayerDependency, PublisherOffering};
//!
//! let map = Layer::new(1, 0, 0);
//! let position = Layer::new(2, 0, 0);
//!
//! let availability = LayerAvailability::new();
//! let offerings = [
//!     PublisherOffering::new(1, vec![LayerDependency::with_dependencies(map, [position])]),
//!     PublisherOffering::new(2, vec![LayerDependency::leaf(position)]),
//! ];
//! let generation = availability.set_offerings(&offerings).unwrap();
//!
//! let snapshot = availability.get_available_layers();
//! assert_eq!(snapshot.generation, generation);
//! assert!(snapshot.contains_layer(&map));
//! assert!(snapshot.contains_layer(&position));
//! ```

pub(crate) mod dependency_resolver;
pub(crate) mod layer_availability;
