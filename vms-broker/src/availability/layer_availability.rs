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

//! Availability snapshot owner rebuilt from the complete set of publisher offerings.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::{debug, error};

use crate::availability::dependency_resolver::{resolve_available_layers, DependencySets};
use crate::layer::{AssociatedLayer, Layer, PublisherOffering};
use crate::observability::events;

const COMPONENT: &str = "layer_availability";

/// Failures while replacing the offering set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LayerAvailabilityError {
    /// The generation counter cannot advance any further. Staleness checks would
    /// silently break if it wrapped, so the replacement is refused.
    GenerationOverflow,
}

impl Display for LayerAvailabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerAvailabilityError::GenerationOverflow => {
                write!(f, "layer availability generation counter overflowed")
            }
        }
    }
}

impl Error for LayerAvailabilityError {}

/// Snapshot of the available layers tagged with the generation that produced it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AvailableLayers {
    pub generation: u64,
    pub layers: BTreeSet<AssociatedLayer>,
}

impl AvailableLayers {
    /// Returns `true` if `layer` is available in this snapshot.
    pub fn contains_layer(&self, layer: &Layer) -> bool {
        self.layers.iter().any(|associated| associated.layer == *layer)
    }
}

#[derive(Default)]
struct AvailabilityState {
    generation: u64,
    dependency_sets: DependencySets,
    publishers_by_layer: HashMap<Layer, BTreeSet<i32>>,
    available_layers: BTreeSet<AssociatedLayer>,
    unavailable_layers: BTreeSet<AssociatedLayer>,
}

impl AvailabilityState {
    fn associate(&self, layer: Layer) -> AssociatedLayer {
        AssociatedLayer {
            layer,
            publisher_ids: self
                .publishers_by_layer
                .get(&layer)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Computes which offered layers can actually be produced.
///
/// Every call to [`LayerAvailability::set_offerings`] is a full replacement: the
/// previous offerings and derived sets are discarded.
#[derive(Default)]
pub struct LayerAvailability {
    state: Mutex<AvailabilityState>,
}

impl LayerAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all offerings and recomputes availability.
    ///
    /// Returns the new generation.
    pub fn set_offerings<'a>(
        &self,
        offerings: impl IntoIterator<Item = &'a PublisherOffering>,
    ) -> Result<u64, LayerAvailabilityError> {
        let mut state = self.state.lock();

        let generation = state.generation.checked_add(1).ok_or_else(|| {
            error!(
                event = events::AVAILABILITY_GENERATION_OVERFLOW,
                component = COMPONENT,
                generation = state.generation,
                "layer availability generation overflow"
            );
            LayerAvailabilityError::GenerationOverflow
        })?;
        state.generation = generation;

        debug!(
            event = events::AVAILABILITY_RECOMPUTE_START,
            component = COMPONENT,
            generation,
            "recomputing layer availability"
        );

        state.dependency_sets.clear();
        state.publishers_by_layer.clear();
        for offering in offerings {
            for dependency in &offering.offerings {
                state
                    .publishers_by_layer
                    .entry(dependency.layer)
                    .or_default()
                    .insert(offering.publisher_id);
                state
                    .dependency_sets
                    .entry(dependency.layer)
                    .or_default()
                    .insert(dependency.dependencies.clone());
            }
        }

        let resolved = resolve_available_layers(&state.dependency_sets);
        let (available, unavailable): (Vec<Layer>, Vec<Layer>) = state
            .dependency_sets
            .keys()
            .copied()
            .partition(|layer| resolved.contains(layer));

        let available_layers = available
            .into_iter()
            .map(|layer| state.associate(layer))
            .collect();
        let unavailable_layers = unavailable
            .into_iter()
            .map(|layer| state.associate(layer))
            .collect();
        state.available_layers = available_layers;
        state.unavailable_layers = unavailable_layers;

        debug!(
            event = events::AVAILABILITY_RECOMPUTE_OK,
            component = COMPONENT,
            generation,
            available = state.available_layers.len(),
            unavailable = state.unavailable_layers.len(),
            "layer availability recomputed"
        );

        Ok(generation)
    }

    /// Returns the available layers together with the generation that produced them.
    pub fn get_available_layers(&self) -> AvailableLayers {
        let state = self.state.lock();
        AvailableLayers {
            generation: state.generation,
            layers: state.available_layers.clone(),
        }
    }

    /// Offered layers whose dependencies cannot be satisfied.
    pub fn get_unavailable_layers(&self) -> BTreeSet<AssociatedLayer> {
        self.state.lock().unavailable_layers.clone()
    }

    /// Layers named in any current offering, available or not.
    pub fn offered_layers(&self) -> HashSet<Layer> {
        self.state.lock().dependency_sets.keys().copied().collect()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    #[cfg(test)]
    pub(crate) fn with_generation(generation: u64) -> Self {
        Self {
            state: Mutex::new(AvailabilityState {
                generation,
                ..Default::default()
            }),
        }
    }
}
