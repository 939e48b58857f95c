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

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use vms_broker::{
    AvailableLayers, DeliveryError, Layer, SubscriberHandle, VmsSubscriberClient,
};

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ReceivedMessage {
    pub layer: Layer,
    pub publisher_id: i32,
    pub payload: Vec<u8>,
}

/// Client that records everything delivered to it.
#[derive(Default)]
pub(crate) struct RecordingClient {
    messages: Mutex<Vec<ReceivedMessage>>,
    availability: Mutex<Vec<AvailableLayers>>,
}

impl RecordingClient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) async fn messages(&self) -> Vec<ReceivedMessage> {
        self.messages.lock().await.clone()
    }

    pub(crate) async fn availability_updates(&self) -> Vec<AvailableLayers> {
        self.availability.lock().await.clone()
    }
}

#[async_trait]
impl VmsSubscriberClient for RecordingClient {
    async fn on_vms_message(
        &self,
        layer: Layer,
        publisher_id: i32,
        payload: Arc<[u8]>,
    ) -> Result<(), DeliveryError> {
        debug!("recording client received {layer} from {publisher_id}");
        self.messages.lock().await.push(ReceivedMessage {
            layer,
            publisher_id,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    async fn on_layers_availability_change(
        &self,
        available_layers: &AvailableLayers,
    ) -> Result<(), DeliveryError> {
        self.availability.lock().await.push(available_layers.clone());
        Ok(())
    }
}

/// Client whose channel is broken.
pub(crate) struct FailingClient;

#[async_trait]
impl VmsSubscriberClient for FailingClient {
    async fn on_vms_message(
        &self,
        _layer: Layer,
        _publisher_id: i32,
        _payload: Arc<[u8]>,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::new("channel closed"))
    }

    async fn on_layers_availability_change(
        &self,
        _available_layers: &AvailableLayers,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::new("channel closed"))
    }
}

pub(crate) fn handle_for(client: &Arc<RecordingClient>) -> SubscriberHandle {
    let client: Arc<dyn VmsSubscriberClient> = client.clone();
    SubscriberHandle::new(client)
}
