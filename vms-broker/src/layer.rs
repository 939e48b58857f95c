/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Layer identity and offering data model shared by availability and routing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Typed, versioned category of data that can be published and subscribed to.
///
/// Equality and hashing are structural over all three fields, so a `Layer` is
/// safe to use as a map key.
///
/// ```
/// use vms_broker::Layer;
///
/// let speed = Layer::new(1, 0, 2);
/// assert_eq!(speed, Layer::new(1, 0, 2));
/// assert_ne!(speed, Layer::new(1, 0, 3));
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    #[serde(rename = "type")]
    pub layer_type: i32,
    pub subtype: i32,
    pub version: i32,
}

impl Layer {
    pub const fn new(layer_type: i32, subtype: i32, version: i32) -> Self {
        Self {
            layer_type,
            subtype,
            version,
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}/{}/{})",
            self.layer_type, self.subtype, self.version
        )
    }
}

/// A layer paired with the publishers currently associated with it.
///
/// Derived reporting data; never the source of truth for either component.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AssociatedLayer {
    pub layer: Layer,
    pub publisher_ids: BTreeSet<i32>,
}

impl AssociatedLayer {
    pub fn new(layer: Layer, publisher_ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            layer,
            publisher_ids: publisher_ids.into_iter().collect(),
        }
    }
}

/// One alternative way a publisher can produce `layer`: every layer in
/// `dependencies` must be available.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDependency {
    pub layer: Layer,
    #[serde(default)]
    pub dependencies: BTreeSet<Layer>,
}

impl LayerDependency {
    /// A leaf offering with no prerequisites.
    pub fn leaf(layer: Layer) -> Self {
        Self {
            layer,
            dependencies: BTreeSet::new(),
        }
    }

    pub fn with_dependencies(layer: Layer, dependencies: impl IntoIterator<Item = Layer>) -> Self {
        Self {
            layer,
            dependencies: dependencies.into_iter().collect(),
        }
    }
}

/// Everything a single publisher currently offers.
///
/// Listing the same layer more than once with different dependency sets declares
/// alternatives; any one of them is enough.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublisherOffering {
    pub publisher_id: i32,
    pub offerings: Vec<LayerDependency>,
}

impl PublisherOffering {
    pub fn new(publisher_id: i32, offerings: Vec<LayerDependency>) -> Self {
        Self {
            publisher_id,
            offerings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AssociatedLayer, Layer, LayerDependency};
    use std::collections::HashSet;

    #[test]
    fn layer_identity_is_structural() {
        let mut seen = HashSet::new();
        seen.insert(Layer::new(1, 2, 3));
        seen.insert(Layer::new(1, 2, 3));
        seen.insert(Layer::new(1, 2, 4));

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn associated_layer_ignores_publisher_insertion_order() {
        let mut seen = HashSet::new();
        seen.insert(AssociatedLayer::new(Layer::new(1, 0, 0), [3, 1, 2]));
        seen.insert(AssociatedLayer::new(Layer::new(1, 0, 0), [2, 3, 1]));

        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn layer_deserializes_type_field() {
        let layer: Layer =
            serde_json::from_str(r#"{"type": 7, "subtype": 1, "version": 2}"#).unwrap();

        assert_eq!(layer, Layer::new(7, 1, 2));
    }

    #[test]
    fn dependencies_default_to_leaf() {
        let dependency: LayerDependency =
            serde_json::from_str(r#"{"layer": {"type": 7, "subtype": 1, "version": 2}}"#).unwrap();

        assert_eq!(dependency, LayerDependency::leaf(Layer::new(7, 1, 2)));
    }
}
