/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

//! # vms-broker
//!
//! `vms-broker` implements the in-vehicle data-layer publish/subscribe core:
//! publishers declare which layers they can produce (optionally conditioned on
//! other layers), subscribers register interest at one of several granularities,
//! and the broker routes each published payload to the right subscriber set.
//!
//! Typical usage is API-first and centered on [`VmsBroker`]; the building blocks
//! ([`PublisherIdentityRegistry`], [`LayerAvailability`], [`SubscriptionRouter`])
//! are exported for callers that orchestrate them directly.
//!
//! ## Availability
//!
//! ```
//! use vms_broker::{Layer, LayerAvailability, LayerDependency, PublisherOffering};
//!
//! let a = Layer::new(1, 0, 0);
//! let b = Layer::new(2, 0, 0);
//!
//! let availability = LayerAvailability::new();
//! // A can be produced from B, or from nothing at all; B is never offered.
//! availability
//!     .set_offerings(&[PublisherOffering::new(
//!         1,
//!         vec![
//!             LayerDependency::with_dependencies(a, [b]),
//!             LayerDependency::leaf(a),
//!         ],
//!     )])
//!     .unwrap();
//!
//! assert!(availability.get_available_layers().contains_layer(&a));
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`VmsBroker`] plus the [`VmsSubscriberClient`] delivery contract
//! - Identity: publisher identity blobs to dense integer ids
//! - Availability: offering replacement and dependency resolution
//! - Routing: subscription index, routing lookups and subscription snapshots
//!
//! Each component owns its state behind a single lock held for the duration of
//! one call. Components are not transactional with each other; the availability
//! `generation` and subscription `sequence` counters let callers detect that a
//! snapshot went stale.
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not unconditionally initialize a global
//! subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod availability;
pub use availability::layer_availability::{
    AvailableLayers, LayerAvailability, LayerAvailabilityError,
};

mod broker;
pub use broker::{BrokerError, VmsBroker};

mod identity;
pub use identity::publisher_registry::{PublisherIdentityError, PublisherIdentityRegistry};

mod layer;
pub use layer::{AssociatedLayer, Layer, LayerDependency, PublisherOffering};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::subscription_router::{RoutingDecision, SubscriptionRouter, SubscriptionState};

mod subscriber;
pub use subscriber::{DeliveryError, SubscriberHandle, VmsSubscriberClient};
