/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
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

//! Drives a [`VmsBroker`] through the steps described by a [`Config`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use vms_broker::{
    AvailableLayers, BrokerError, DeliveryError, Layer, PublisherOffering, SubscriberHandle,
    SubscriptionState, VmsBroker, VmsSubscriberClient,
};

use crate::config::{Config, SubscriptionConfig};

const HAL_CLIENT_NAME: &str = "hal";

/// Subscriber client that logs everything it receives.
pub(crate) struct LoggingClient {
    name: String,
    received: AtomicUsize,
}

impl LoggingClient {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            received: AtomicUsize::new(0),
        })
    }

    pub(crate) fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VmsSubscriberClient for LoggingClient {
    async fn on_vms_message(
        &self,
        layer: Layer,
        publisher_id: i32,
        payload: Arc<[u8]>,
    ) -> Result<(), DeliveryError> {
        self.received.fetch_add(1, Ordering::Relaxed);
        info!(
            subscriber = %self.name,
            layer = %layer,
            publisher_id,
            payload = %String::from_utf8_lossy(&payload),
            "received VMS message"
        );
        Ok(())
    }

    async fn on_layers_availability_change(
        &self,
        available_layers: &AvailableLayers,
    ) -> Result<(), DeliveryError> {
        info!(
            subscriber = %self.name,
            generation = available_layers.generation,
            layers = available_layers.layers.len(),
            "received availability change"
        );
        Ok(())
    }
}

#[derive(Debug)]
pub enum ScenarioError {
    Broker(BrokerError),
    UnknownPublisher(String),
}

impl Display for ScenarioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Broker(err) => write!(f, "broker rejected scenario step: {err}"),
            ScenarioError::UnknownPublisher(info) => {
                write!(f, "scenario references unknown publisher: {info}")
            }
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Broker(err) => Some(err),
            ScenarioError::UnknownPublisher(_) => None,
        }
    }
}

impl From<BrokerError> for ScenarioError {
    fn from(err: BrokerError) -> Self {
        ScenarioError::Broker(err)
    }
}

/// Outcome of a scenario run.
#[derive(Debug)]
pub struct ScenarioReport {
    pub(crate) available_layers: AvailableLayers,
    pub(crate) subscription_state: SubscriptionState,
    /// Successful deliveries per entry of `publishes`, in order.
    pub(crate) deliveries: Vec<usize>,
    /// Messages received per subscriber name, the HAL included.
    pub(crate) received: HashMap<String, usize>,
}

pub async fn run(config: Config) -> Result<ScenarioReport, ScenarioError> {
    let hal = LoggingClient::new(HAL_CLIENT_NAME);
    let hal_client: Arc<dyn VmsSubscriberClient> = hal.clone();
    let broker = VmsBroker::new(&config.broker.name).with_hal_client(hal_client);

    let mut publisher_ids = HashMap::new();
    for publisher in &config.publishers {
        let publisher_id = broker.register_publisher(publisher.info.as_bytes())?;
        info!(publisher = %publisher.info, publisher_id, "registered publisher");
        publisher_ids.insert(publisher.info.clone(), publisher_id);
    }
    let lookup = |info: &str| {
        publisher_ids
            .get(info)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownPublisher(info.to_string()))
    };

    for publisher in &config.publishers {
        if publisher.offerings.is_empty() {
            continue;
        }
        let offering =
            PublisherOffering::new(lookup(publisher.info.as_str())?, publisher.offerings.clone());
        broker.set_publisher_offering(offering).await?;
    }

    let available_layers = broker.available_layers();
    for layer in &available_layers.layers {
        info!(
            generation = available_layers.generation,
            layer = %layer.layer,
            publishers = ?layer.publisher_ids,
            "layer available"
        );
    }

    let mut clients = Vec::with_capacity(config.subscribers.len());
    for subscriber in &config.subscribers {
        let client = LoggingClient::new(&subscriber.name);
        let client_dyn: Arc<dyn VmsSubscriberClient> = client.clone();
        let handle = SubscriberHandle::new(client_dyn);
        for subscription in &subscriber.subscriptions {
            match subscription {
                SubscriptionConfig::All => {
                    broker.subscribe_all(&handle);
                }
                SubscriptionConfig::Layer { layer } => {
                    broker.subscribe_layer(&handle, *layer);
                }
                SubscriptionConfig::LayerFromPublisher { layer, publisher } => {
                    broker.subscribe_layer_from_publisher(
                        &handle,
                        *layer,
                        lookup(publisher.as_str())?,
                    );
                }
            }
        }
        clients.push(client);
    }

    for hal_subscription in &config.hal_subscriptions {
        match &hal_subscription.publisher {
            Some(publisher) => {
                broker.subscribe_hal_layer_from_publisher(
                    hal_subscription.layer,
                    lookup(publisher.as_str())?,
                );
            }
            None => {
                broker.subscribe_hal_layer(hal_subscription.layer);
            }
        }
    }

    let subscription_state = broker.subscription_state();
    info!(
        sequence = subscription_state.sequence,
        layers = subscription_state.layers.len(),
        associated_layers = subscription_state.associated_layers.len(),
        "subscriptions applied"
    );

    let mut deliveries = Vec::with_capacity(config.publishes.len());
    for publish in &config.publishes {
        let publisher_id = lookup(publish.publisher.as_str())?;
        if !available_layers.contains_layer(&publish.layer) {
            warn!(
                publisher = %publish.publisher,
                layer = %publish.layer,
                "publishing a layer that is not currently available"
            );
        }
        let delivered = broker
            .publish(publish.layer, publisher_id, publish.payload.as_bytes().to_vec())
            .await;
        info!(
            publisher = %publish.publisher,
            layer = %publish.layer,
            delivered,
            "replayed publish"
        );
        deliveries.push(delivered);
    }

    let mut received: HashMap<String, usize> = clients
        .iter()
        .map(|client| (client.name.clone(), client.received()))
        .collect();
    received.insert(HAL_CLIENT_NAME.to_string(), hal.received());

    Ok(ScenarioReport {
        available_layers,
        subscription_state,
        deliveries,
        received,
    })
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::config::Config;
    use vms_broker::Layer;

    const DEFAULT_CONFIG: &str = include_str!("../DEFAULT_CONFIG.json5");

    #[tokio::test]
    async fn default_scenario_routes_as_configured() {
        let config = Config::from_json5(DEFAULT_CONFIG).expect("default config is valid");

        let report = run(config).await.expect("scenario runs");

        assert!(report.available_layers.contains_layer(&Layer::new(10, 0, 1)));
        assert!(report.available_layers.contains_layer(&Layer::new(12, 0, 1)));
        assert!(!report.available_layers.contains_layer(&Layer::new(20, 1, 1)));

        // speed: trip-logger + dashboard; odometry: trip-logger + dashboard + hal
        assert_eq!(report.deliveries, vec![2, 3]);
        assert_eq!(report.received["trip-logger"], 2);
        assert_eq!(report.received["dashboard"], 2);
        assert_eq!(report.received["hal"], 1);
        assert_eq!(report.subscription_state.associated_layers.len(), 1);
    }

    #[tokio::test]
    async fn publisher_without_offerings_still_publishes() {
        let config = Config::from_json5(
            r#"{
                broker: { name: "bare" },
                publishers: [ { info: "silent" } ],
                subscribers: [ { name: "all", subscriptions: [ { kind: "all" } ] } ],
                publishes: [
                    { publisher: "silent", layer: { type: 3, subtype: 0, version: 0 }, payload: "x" },
                ],
            }"#,
        )
        .expect("valid config");

        let report = run(config).await.expect("scenario runs");

        assert!(report.available_layers.layers.is_empty());
        assert_eq!(report.deliveries, vec![1]);
    }
}
