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

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::availability::layer_availability::{
    AvailableLayers, LayerAvailability, LayerAvailabilityError,
};
use crate::identity::publisher_registry::{PublisherIdentityError, PublisherIdentityRegistry};
use crate::layer::{Layer, PublisherOffering};
use crate::observability::{events, fields};
use crate::routing::subscription_router::{
    RoutingDecision, SubscriptionRouter, SubscriptionState,
};
use crate::subscriber::{SubscriberHandle, VmsSubscriberClient};

const COMPONENT: &str = "vms_broker";

/// Failures surfaced by [`VmsBroker`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BrokerError {
    Availability(LayerAvailabilityError),
    Identity(PublisherIdentityError),
    /// An offering named a publisher id that was never registered.
    UnknownPublisher(i32),
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Availability(err) => write!(f, "availability update failed: {err}"),
            BrokerError::Identity(err) => write!(f, "publisher identity lookup failed: {err}"),
            BrokerError::UnknownPublisher(id) => {
                write!(f, "publisher {id} is not registered with this broker")
            }
        }
    }
}

impl Error for BrokerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BrokerError::Availability(err) => Some(err),
            BrokerError::Identity(err) => Some(err),
            BrokerError::UnknownPublisher(_) => None,
        }
    }
}

impl From<LayerAvailabilityError> for BrokerError {
    fn from(err: LayerAvailabilityError) -> Self {
        BrokerError::Availability(err)
    }
}

impl From<PublisherIdentityError> for BrokerError {
    fn from(err: PublisherIdentityError) -> Self {
        BrokerError::Identity(err)
    }
}

/// [`VmsBroker`] wires publisher identities, layer availability and the
/// subscription index together and fans published payloads out to subscribers.
///
/// Publishers update their own offering; the broker turns each update into a
/// full replacement of all offerings so availability is always computed from
/// the complete picture.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use vms_broker::{
///     DeliveryError, Layer, LayerDependency, PublisherOffering, SubscriberHandle, VmsBroker,
///     VmsSubscriberClient,
/// };
///
/// struct Printer;
///
/// #[async_trait]
/// impl VmsSubscriberClient for Printer {
///     async fn on_vms_message(
///         &self,
///         layer: Layer,
///         publisher_id: i32,
///         payload: Arc<[u8]>,
///     ) -> Result<(), DeliveryError> {
///         println!("{layer} from {publisher_id}: {} bytes", payload.len());
///         Ok(())
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let broker = VmsBroker::new("doc-broker");
/// let speed = Layer::new(1, 0, 0);
///
/// let publisher_id = broker.register_publisher(b"speed-sensor".to_vec()).unwrap();
/// broker
///     .set_publisher_offering(PublisherOffering::new(
///         publisher_id,
///         vec![LayerDependency::leaf(speed)],
///     ))
///     .await
///     .unwrap();
/// assert!(broker.available_layers().contains_layer(&speed));
///
/// let printer = SubscriberHandle::new(Arc::new(Printer));
/// broker.subscribe_layer(&printer, speed);
///
/// let delivered = broker.publish(speed, publisher_id, b"42".to_vec()).await;
/// assert_eq!(delivered, 1);
/// # });
/// ```
pub struct VmsBroker {
    name: String,
    publishers: PublisherIdentityRegistry,
    availability: LayerAvailability,
    router: SubscriptionRouter<SubscriberHandle>,
    offerings_by_publisher: Mutex<BTreeMap<i32, PublisherOffering>>,
    hal_client: Option<Arc<dyn VmsSubscriberClient>>,
}

impl VmsBroker {
    pub fn new(name: &str) -> Self {
        info!(
            event = events::BROKER_START,
            component = COMPONENT,
            broker = name,
            "VmsBroker started"
        );
        Self {
            name: name.to_string(),
            publishers: PublisherIdentityRegistry::new(),
            availability: LayerAvailability::new(),
            router: SubscriptionRouter::new(),
            offerings_by_publisher: Mutex::new(BTreeMap::new()),
            hal_client: None,
        }
    }

    /// Attaches the client that receives payloads for HAL-subscribed layers.
    pub fn with_hal_client(mut self, hal_client: Arc<dyn VmsSubscriberClient>) -> Self {
        self.hal_client = Some(hal_client);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the publisher id for an identity blob, assigning one on first sight.
    pub fn register_publisher(&self, info: impl Into<Vec<u8>>) -> Result<i32, BrokerError> {
        self.publishers
            .get_or_create_id(info)
            .map_err(BrokerError::Identity)
    }

    pub fn publisher_info(&self, publisher_id: i32) -> Result<Vec<u8>, BrokerError> {
        Ok(self.publishers.get_info(publisher_id)?)
    }

    /// Replaces the offering of one publisher and recomputes availability.
    ///
    /// Every subscriber is notified of the new availability. Returns the new
    /// availability generation.
    pub async fn set_publisher_offering(
        &self,
        offering: PublisherOffering,
    ) -> Result<u64, BrokerError> {
        let publisher_id = offering.publisher_id;
        if !self.publishers.contains_id(publisher_id) {
            warn!(
                event = events::OFFERING_REJECTED,
                component = COMPONENT,
                broker = %self.name,
                publisher_id,
                "offering from unregistered publisher"
            );
            return Err(BrokerError::UnknownPublisher(publisher_id));
        }

        let generation = {
            let mut offerings = self.offerings_by_publisher.lock();
            let mut updated = offerings.clone();
            updated.insert(publisher_id, offering);
            let generation = self.availability.set_offerings(updated.values())?;
            *offerings = updated;
            generation
        };

        debug!(
            event = events::OFFERING_UPDATE,
            component = COMPONENT,
            broker = %self.name,
            publisher_id,
            generation,
            "publisher offering updated"
        );

        self.notify_availability_change().await;
        Ok(generation)
    }

    /// Drops everything `publisher_id` offered, e.g. once the publisher is gone.
    pub async fn clear_publisher_offering(&self, publisher_id: i32) -> Result<u64, BrokerError> {
        let generation = {
            let mut offerings = self.offerings_by_publisher.lock();
            let mut updated = offerings.clone();
            updated.remove(&publisher_id);
            let generation = self.availability.set_offerings(updated.values())?;
            *offerings = updated;
            generation
        };

        debug!(
            event = events::OFFERING_UPDATE,
            component = COMPONENT,
            broker = %self.name,
            publisher_id,
            generation,
            "publisher offering cleared"
        );

        self.notify_availability_change().await;
        Ok(generation)
    }

    pub fn available_layers(&self) -> AvailableLayers {
        self.availability.get_available_layers()
    }

    pub fn subscribe_layer(
        &self,
        subscriber: &SubscriberHandle,
        layer: Layer,
    ) -> SubscriptionState {
        self.router
            .apply(|state| state.subscribe_layer(subscriber.clone(), layer))
    }

    pub fn unsubscribe_layer(
        &self,
        subscriber: &SubscriberHandle,
        layer: Layer,
    ) -> SubscriptionState {
        self.router
            .apply(|state| state.unsubscribe_layer(subscriber, &layer))
    }

    pub fn subscribe_layer_from_publisher(
        &self,
        subscriber: &SubscriberHandle,
        layer: Layer,
        publisher_id: i32,
    ) -> SubscriptionState {
        self.router.apply(|state| {
            state.subscribe_layer_from_publisher(subscriber.clone(), layer, publisher_id)
        })
    }

    pub fn unsubscribe_layer_from_publisher(
        &self,
        subscriber: &SubscriberHandle,
        layer: Layer,
        publisher_id: i32,
    ) -> SubscriptionState {
        self.router.apply(|state| {
            state.unsubscribe_layer_from_publisher(subscriber, &layer, publisher_id)
        })
    }

    pub fn subscribe_all(&self, subscriber: &SubscriberHandle) -> SubscriptionState {
        self.router
            .apply(|state| state.subscribe_all(subscriber.clone()))
    }

    pub fn unsubscribe_all(&self, subscriber: &SubscriberHandle) -> SubscriptionState {
        self.router.apply(|state| state.unsubscribe_all(subscriber))
    }

    pub fn subscribe_hal_layer(&self, layer: Layer) -> SubscriptionState {
        self.router.apply(|state| state.subscribe_hal_layer(layer))
    }

    pub fn unsubscribe_hal_layer(&self, layer: Layer) -> SubscriptionState {
        self.router.apply(|state| state.unsubscribe_hal_layer(&layer))
    }

    pub fn subscribe_hal_layer_from_publisher(
        &self,
        layer: Layer,
        publisher_id: i32,
    ) -> SubscriptionState {
        self.router
            .apply(|state| state.subscribe_hal_layer_from_publisher(layer, publisher_id))
    }

    pub fn unsubscribe_hal_layer_from_publisher(
        &self,
        layer: Layer,
        publisher_id: i32,
    ) -> SubscriptionState {
        self.router
            .apply(|state| state.unsubscribe_hal_layer_from_publisher(&layer, publisher_id))
    }

    /// Forgets every subscription of a subscriber whose channel is permanently gone.
    pub fn subscriber_disconnected(&self, subscriber: &SubscriberHandle) -> bool {
        self.router.remove_all_subscriptions_for(subscriber)
    }

    pub fn contains_subscriber(&self, subscriber: &SubscriberHandle) -> bool {
        self.router.contains_subscriber(subscriber)
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.router.get_subscription_state()
    }

    /// Delivers `payload` to everyone subscribed to `layer` from `publisher_id`.
    ///
    /// Returns the number of successful deliveries, the HAL included. A failed
    /// delivery is logged and does not affect the other recipients.
    pub async fn publish(
        &self,
        layer: Layer,
        publisher_id: i32,
        payload: impl Into<Arc<[u8]>>,
    ) -> usize {
        let payload: Arc<[u8]> = payload.into();
        let RoutingDecision { subscribers, hal } =
            self.router.get_routing_decision(&layer, publisher_id);
        let hal_client = self.hal_client.as_ref().filter(|_| hal);

        if subscribers.is_empty() && hal_client.is_none() {
            debug!(
                event = events::PUBLISH_NO_SUBSCRIBERS,
                component = COMPONENT,
                broker = %self.name,
                layer = %layer,
                publisher_id,
                "no subscribers for published layer"
            );
            return 0;
        }

        debug!(
            event = events::PUBLISH_ROUTE,
            component = COMPONENT,
            broker = %self.name,
            layer = %layer,
            publisher_id,
            subscribers = subscribers.len(),
            hal = hal_client.is_some(),
            "routing published payload"
        );

        let mut delivered = 0;
        for subscriber in &subscribers {
            match subscriber
                .client()
                .on_vms_message(layer, publisher_id, payload.clone())
                .await
            {
                Ok(()) => delivered += 1,
                Err(err) => warn!(
                    event = events::DELIVERY_FAILED,
                    component = COMPONENT,
                    broker = %self.name,
                    layer = %layer,
                    publisher_id,
                    subscriber = ?subscriber,
                    err = %err,
                    "unable to deliver payload to subscriber"
                ),
            }
        }

        if let Some(hal_client) = hal_client {
            match hal_client
                .on_vms_message(layer, publisher_id, payload.clone())
                .await
            {
                Ok(()) => delivered += 1,
                Err(err) => warn!(
                    event = events::DELIVERY_FAILED,
                    component = COMPONENT,
                    broker = %self.name,
                    layer = %layer,
                    publisher_id,
                    subscriber = fields::HAL,
                    err = %err,
                    "unable to deliver payload to HAL"
                ),
            }
        }

        delivered
    }

    async fn notify_availability_change(&self) {
        let available_layers = self.availability.get_available_layers();
        let mut clients: Vec<Arc<dyn VmsSubscriberClient>> = self
            .router
            .get_all_subscribers()
            .into_iter()
            .map(|subscriber| subscriber.client().clone())
            .collect();
        if let Some(hal_client) = &self.hal_client {
            clients.push(hal_client.clone());
        }

        for client in clients {
            if let Err(err) = client.on_layers_availability_change(&available_layers).await {
                warn!(
                    event = events::AVAILABILITY_NOTIFY_FAILED,
                    component = COMPONENT,
                    broker = %self.name,
                    generation = available_layers.generation,
                    err = %err,
                    "unable to notify client of availability change"
                );
            }
        }
    }
}
