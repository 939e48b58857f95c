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

//! Subscriber-side delivery contract and subscriber identity keying.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::availability::layer_availability::AvailableLayers;
use crate::layer::Layer;

/// Failure reported by a subscriber client while accepting a delivery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeliveryError {
    message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "delivery failed: {}", self.message)
    }
}

impl Error for DeliveryError {}

/// Receiving end of the broker.
///
/// Implementations wrap whatever channel reaches the actual consumer; the broker
/// treats a returned error as a failed delivery to that consumer only.
#[async_trait]
pub trait VmsSubscriberClient: Send + Sync {
    /// Delivers one payload published for `layer` by `publisher_id`.
    async fn on_vms_message(
        &self,
        layer: Layer,
        publisher_id: i32,
        payload: Arc<[u8]>,
    ) -> Result<(), DeliveryError>;

    /// Notifies the client that the set of available layers changed.
    async fn on_layers_availability_change(
        &self,
        _available_layers: &AvailableLayers,
    ) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Subscriber identity used as a routing-index key.
///
/// Two handles are equal only when they wrap the same client instance.
#[derive(Clone)]
pub struct SubscriberHandle {
    client: Arc<dyn VmsSubscriberClient>,
}

impl SubscriberHandle {
    pub fn new(client: Arc<dyn VmsSubscriberClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn VmsSubscriberClient> {
        &self.client
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.client) as *const ()
    }
}

impl Hash for SubscriberHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl PartialEq for SubscriberHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for SubscriberHandle {}

impl Debug for SubscriberHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SubscriberHandle")
            .field(&self.address())
            .finish()
    }
}

impl From<Arc<dyn VmsSubscriberClient>> for SubscriberHandle {
    fn from(client: Arc<dyn VmsSubscriberClient>) -> Self {
        Self::new(client)
    }
}
