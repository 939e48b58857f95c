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

//! Live subscription index and routing decisions for published payloads.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

use crate::layer::{AssociatedLayer, Layer};
use crate::observability::{events, fields};
use crate::routing::nested_index::{self, NestedSetIndex, SetIndex};

const COMPONENT: &str = "subscription_router";

/// Atomic view of everything currently subscribed, ordinary and HAL combined.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscriptionState {
    pub sequence: u64,
    /// Layers subscribed regardless of publisher.
    pub layers: BTreeSet<Layer>,
    /// Layers subscribed from specific publishers.
    pub associated_layers: BTreeSet<AssociatedLayer>,
}

/// Everyone a single published payload goes to, read under one lock.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoutingDecision<S: Eq + Hash> {
    pub subscribers: HashSet<S>,
    /// Whether the HAL subscribed to the layer, from any or from this publisher.
    pub hal: bool,
}

pub(crate) struct RouterState<S> {
    sequence: u64,
    by_layer: SetIndex<Layer, S>,
    by_layer_and_publisher: NestedSetIndex<Layer, i32, S>,
    promiscuous: HashSet<S>,
    hal_by_layer: HashSet<Layer>,
    hal_by_layer_and_publisher: SetIndex<Layer, i32>,
}

impl<S> Default for RouterState<S> {
    fn default() -> Self {
        Self {
            sequence: 0,
            by_layer: HashMap::new(),
            by_layer_and_publisher: HashMap::new(),
            promiscuous: HashSet::new(),
            hal_by_layer: HashSet::new(),
            hal_by_layer_and_publisher: HashMap::new(),
        }
    }
}

impl<S> RouterState<S>
where
    S: Clone + Debug + Eq + Hash,
{
    fn advance(&mut self) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    fn log_removal(
        removed: bool,
        sequence: u64,
        subscriber: &S,
        layer: Option<&Layer>,
        publisher_id: Option<i32>,
    ) {
        let layer = layer.map_or_else(|| fields::NONE.to_string(), Layer::to_string);
        if removed {
            debug!(
                event = events::SUBSCRIPTION_REMOVE,
                component = COMPONENT,
                sequence,
                layer = %layer,
                publisher_id = ?publisher_id,
                subscriber = ?subscriber,
                "subscription removed"
            );
        } else {
            debug!(
                event = events::SUBSCRIPTION_REMOVE_MISSING,
                component = COMPONENT,
                sequence,
                layer = %layer,
                publisher_id = ?publisher_id,
                subscriber = ?subscriber,
                "no such subscription to remove"
            );
        }
    }

    pub(crate) fn subscribe_layer(&mut self, subscriber: S, layer: Layer) -> u64 {
        let sequence = self.advance();
        debug!(
            event = events::SUBSCRIPTION_ADD,
            component = COMPONENT,
            sequence,
            layer = %layer,
            subscriber = ?subscriber,
            "layer subscription added"
        );
        nested_index::insert(&mut self.by_layer, layer, subscriber);
        sequence
    }

    pub(crate) fn unsubscribe_layer(&mut self, subscriber: &S, layer: &Layer) -> u64 {
        let sequence = self.advance();
        let removed = nested_index::remove(&mut self.by_layer, layer, subscriber);
        Self::log_removal(removed, sequence, subscriber, Some(layer), None);
        sequence
    }

    pub(crate) fn subscribe_layer_from_publisher(
        &mut self,
        subscriber: S,
        layer: Layer,
        publisher_id: i32,
    ) -> u64 {
        let sequence = self.advance();
        debug!(
            event = events::SUBSCRIPTION_ADD,
            component = COMPONENT,
            sequence,
            layer = %layer,
            publisher_id,
            subscriber = ?subscriber,
            "publisher-scoped layer subscription added"
        );
        nested_index::insert_nested(
            &mut self.by_layer_and_publisher,
            layer,
            publisher_id,
            subscriber,
        );
        sequence
    }

    pub(crate) fn unsubscribe_layer_from_publisher(
        &mut self,
        subscriber: &S,
        layer: &Layer,
        publisher_id: i32,
    ) -> u64 {
        let sequence = self.advance();
        let removed = nested_index::remove_nested(
            &mut self.by_layer_and_publisher,
            layer,
            &publisher_id,
            subscriber,
        );
        Self::log_removal(removed, sequence, subscriber, Some(layer), Some(publisher_id));
        sequence
    }

    pub(crate) fn subscribe_all(&mut self, subscriber: S) -> u64 {
        let sequence = self.advance();
        debug!(
            event = events::SUBSCRIPTION_ADD,
            component = COMPONENT,
            sequence,
            subscriber = ?subscriber,
            "promiscuous subscription added"
        );
        self.promiscuous.insert(subscriber);
        sequence
    }

    pub(crate) fn unsubscribe_all(&mut self, subscriber: &S) -> u64 {
        let sequence = self.advance();
        let removed = self.promiscuous.remove(subscriber);
        Self::log_removal(removed, sequence, subscriber, None, None);
        sequence
    }

    pub(crate) fn subscribe_hal_layer(&mut self, layer: Layer) -> u64 {
        let sequence = self.advance();
        self.hal_by_layer.insert(layer);
        sequence
    }

    pub(crate) fn unsubscribe_hal_layer(&mut self, layer: &Layer) -> u64 {
        let sequence = self.advance();
        if !self.hal_by_layer.remove(layer) {
            debug!(
                event = events::SUBSCRIPTION_REMOVE_MISSING,
                component = COMPONENT,
                sequence,
                layer = %layer,
                subscriber = fields::HAL,
                "no such subscription to remove"
            );
        }
        sequence
    }

    pub(crate) fn subscribe_hal_layer_from_publisher(
        &mut self,
        layer: Layer,
        publisher_id: i32,
    ) -> u64 {
        let sequence = self.advance();
        nested_index::insert(&mut self.hal_by_layer_and_publisher, layer, publisher_id);
        sequence
    }

    pub(crate) fn unsubscribe_hal_layer_from_publisher(
        &mut self,
        layer: &Layer,
        publisher_id: i32,
    ) -> u64 {
        let sequence = self.advance();
        if !nested_index::remove(&mut self.hal_by_layer_and_publisher, layer, &publisher_id) {
            debug!(
                event = events::SUBSCRIPTION_REMOVE_MISSING,
                component = COMPONENT,
                sequence,
                layer = %layer,
                publisher_id,
                subscriber = fields::HAL,
                "no such subscription to remove"
            );
        }
        sequence
    }

    fn remove_all_subscriptions_for(&mut self, subscriber: &S) -> bool {
        let sequence = self.advance();

        let mut removed = nested_index::remove_everywhere(&mut self.by_layer, subscriber);
        removed |=
            nested_index::remove_everywhere_nested(&mut self.by_layer_and_publisher, subscriber);
        removed |= self.promiscuous.remove(subscriber);

        if removed {
            debug!(
                event = events::SUBSCRIBER_REMOVE_ALL,
                component = COMPONENT,
                sequence,
                subscriber = ?subscriber,
                "removed all subscriptions for subscriber"
            );
        } else {
            debug!(
                event = events::SUBSCRIBER_REMOVE_ALL_MISSING,
                component = COMPONENT,
                sequence,
                subscriber = ?subscriber,
                "subscriber held no subscriptions"
            );
        }
        removed
    }

    fn subscribers_for_layer_from_publisher(&self, layer: &Layer, publisher_id: i32) -> HashSet<S> {
        let mut subscribers = self.promiscuous.clone();
        if let Some(layer_subscribers) = self.by_layer.get(layer) {
            subscribers.extend(layer_subscribers.iter().cloned());
        }
        if let Some(publisher_subscribers) = self
            .by_layer_and_publisher
            .get(layer)
            .and_then(|by_publisher| by_publisher.get(&publisher_id))
        {
            subscribers.extend(publisher_subscribers.iter().cloned());
        }
        subscribers
    }

    fn is_hal_subscribed(&self, layer: &Layer) -> bool {
        self.hal_by_layer.contains(layer)
    }

    fn is_hal_subscribed_from_publisher(&self, layer: &Layer, publisher_id: i32) -> bool {
        self.hal_by_layer_and_publisher
            .get(layer)
            .is_some_and(|publishers| publishers.contains(&publisher_id))
    }

    fn snapshot(&self) -> SubscriptionState {
        let layers = self
            .by_layer
            .keys()
            .chain(self.hal_by_layer.iter())
            .copied()
            .collect();

        let mut publishers_by_layer: HashMap<Layer, BTreeSet<i32>> = HashMap::new();
        for (layer, by_publisher) in &self.by_layer_and_publisher {
            publishers_by_layer
                .entry(*layer)
                .or_default()
                .extend(by_publisher.keys().copied());
        }
        for (layer, publishers) in &self.hal_by_layer_and_publisher {
            publishers_by_layer
                .entry(*layer)
                .or_default()
                .extend(publishers.iter().copied());
        }
        let associated_layers = publishers_by_layer
            .into_iter()
            .map(|(layer, publisher_ids)| AssociatedLayer {
                layer,
                publisher_ids,
            })
            .collect();

        SubscriptionState {
            sequence: self.sequence,
            layers,
            associated_layers,
        }
    }
}

/// Routing index for four subscription granularities:
///
/// - a layer from any publisher,
/// - a layer from one publisher,
/// - every layer from every publisher (promiscuous),
/// - the HAL shadow sets, which track membership only because the HAL is a
///   single fixed consumer.
///
/// Every mutating call advances the sequence number exactly once, including
/// requests that turn out to be no-ops.
pub struct SubscriptionRouter<S> {
    state: Mutex<RouterState<S>>,
}

impl<S> Default for SubscriptionRouter<S> {
    fn default() -> Self {
        Self {
            state: Mutex::new(RouterState::default()),
        }
    }
}

impl<S> SubscriptionRouter<S>
where
    S: Clone + Debug + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `change` and snapshots the result without releasing the lock,
    /// so the returned sequence is the one `change` produced.
    pub(crate) fn apply(
        &self,
        change: impl FnOnce(&mut RouterState<S>) -> u64,
    ) -> SubscriptionState {
        let mut state = self.state.lock();
        change(&mut state);
        state.snapshot()
    }

    /// Subscribes `subscriber` to `layer` from every publisher.
    pub fn subscribe_layer(&self, subscriber: S, layer: Layer) -> u64 {
        self.state.lock().subscribe_layer(subscriber, layer)
    }

    pub fn unsubscribe_layer(&self, subscriber: &S, layer: &Layer) -> u64 {
        self.state.lock().unsubscribe_layer(subscriber, layer)
    }

    /// Subscribes `subscriber` to `layer` as produced by `publisher_id` only.
    pub fn subscribe_layer_from_publisher(
        &self,
        subscriber: S,
        layer: Layer,
        publisher_id: i32,
    ) -> u64 {
        self.state
            .lock()
            .subscribe_layer_from_publisher(subscriber, layer, publisher_id)
    }

    pub fn unsubscribe_layer_from_publisher(
        &self,
        subscriber: &S,
        layer: &Layer,
        publisher_id: i32,
    ) -> u64 {
        self.state
            .lock()
            .unsubscribe_layer_from_publisher(subscriber, layer, publisher_id)
    }

    /// Subscribes `subscriber` to every layer from every publisher.
    pub fn subscribe_all(&self, subscriber: S) -> u64 {
        self.state.lock().subscribe_all(subscriber)
    }

    pub fn unsubscribe_all(&self, subscriber: &S) -> u64 {
        self.state.lock().unsubscribe_all(subscriber)
    }

    pub fn subscribe_hal_layer(&self, layer: Layer) -> u64 {
        self.state.lock().subscribe_hal_layer(layer)
    }

    pub fn unsubscribe_hal_layer(&self, layer: &Layer) -> u64 {
        self.state.lock().unsubscribe_hal_layer(layer)
    }

    pub fn subscribe_hal_layer_from_publisher(&self, layer: Layer, publisher_id: i32) -> u64 {
        self.state
            .lock()
            .subscribe_hal_layer_from_publisher(layer, publisher_id)
    }

    pub fn unsubscribe_hal_layer_from_publisher(&self, layer: &Layer, publisher_id: i32) -> u64 {
        self.state
            .lock()
            .unsubscribe_hal_layer_from_publisher(layer, publisher_id)
    }

    /// Drops every subscription held by `subscriber`, e.g. once its channel is gone.
    ///
    /// Returns `true` if the subscriber held any subscription.
    pub fn remove_all_subscriptions_for(&self, subscriber: &S) -> bool {
        self.state.lock().remove_all_subscriptions_for(subscriber)
    }

    /// Subscribers that should receive a payload for `layer` published by `publisher_id`.
    pub fn get_subscribers_for_layer_from_publisher(
        &self,
        layer: &Layer,
        publisher_id: i32,
    ) -> HashSet<S> {
        self.state
            .lock()
            .subscribers_for_layer_from_publisher(layer, publisher_id)
    }

    /// Ordinary subscribers and HAL membership for one published payload.
    pub fn get_routing_decision(&self, layer: &Layer, publisher_id: i32) -> RoutingDecision<S> {
        let state = self.state.lock();

        RoutingDecision {
            subscribers: state.subscribers_for_layer_from_publisher(layer, publisher_id),
            hal: state.is_hal_subscribed(layer)
                || state.is_hal_subscribed_from_publisher(layer, publisher_id),
        }
    }

    /// Subscribers of `layer` regardless of publisher, including promiscuous ones.
    pub fn get_subscribers_for_layer(&self, layer: &Layer) -> HashSet<S> {
        let state = self.state.lock();

        let mut subscribers = state.promiscuous.clone();
        if let Some(layer_subscribers) = state.by_layer.get(layer) {
            subscribers.extend(layer_subscribers.iter().cloned());
        }
        subscribers
    }

    /// Every ordinary subscriber with at least one subscription. The HAL is never included.
    pub fn get_all_subscribers(&self) -> HashSet<S> {
        let state = self.state.lock();

        let mut subscribers = state.promiscuous.clone();
        for layer_subscribers in state.by_layer.values() {
            subscribers.extend(layer_subscribers.iter().cloned());
        }
        for by_publisher in state.by_layer_and_publisher.values() {
            for publisher_subscribers in by_publisher.values() {
                subscribers.extend(publisher_subscribers.iter().cloned());
            }
        }
        subscribers
    }

    pub fn is_hal_subscribed(&self, layer: &Layer) -> bool {
        self.state.lock().is_hal_subscribed(layer)
    }

    pub fn is_hal_subscribed_from_publisher(&self, layer: &Layer, publisher_id: i32) -> bool {
        self.state
            .lock()
            .is_hal_subscribed_from_publisher(layer, publisher_id)
    }

    pub fn has_layer_subscriptions(&self, layer: &Layer) -> bool {
        self.state.lock().by_layer.contains_key(layer)
    }

    pub fn has_layer_from_publisher_subscriptions(&self, layer: &Layer, publisher_id: i32) -> bool {
        self.state
            .lock()
            .by_layer_and_publisher
            .get(layer)
            .is_some_and(|by_publisher| by_publisher.contains_key(&publisher_id))
    }

    pub fn contains_subscriber(&self, subscriber: &S) -> bool {
        let state = self.state.lock();

        state.promiscuous.contains(subscriber)
            || state
                .by_layer
                .values()
                .any(|subscribers| subscribers.contains(subscriber))
            || state.by_layer_and_publisher.values().any(|by_publisher| {
                by_publisher
                    .values()
                    .any(|subscribers| subscribers.contains(subscriber))
            })
    }

    /// Snapshot of all subscribed layers, merging ordinary and HAL subscriptions.
    pub fn get_subscription_state(&self) -> SubscriptionState {
        self.state.lock().snapshot()
    }

    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }
}

#[cfg(test)]
mod tests {
    use super::{RoutingDecision, SubscriptionRouter};
    use crate::layer::{AssociatedLayer, Layer};
    use std::collections::{BTreeSet, HashSet};

    const A: Layer = Layer::new(1, 0, 0);
    const B: Layer = Layer::new(2, 0, 0);

    fn router() -> SubscriptionRouter<&'static str> {
        SubscriptionRouter::new()
    }

    #[test]
    fn every_mutation_advances_sequence() {
        let router = router();

        assert_eq!(router.subscribe_layer("s1", A), 1);
        assert_eq!(router.unsubscribe_layer(&"s1", &A), 2);
        assert_eq!(router.unsubscribe_layer(&"s1", &A), 3);
        assert_eq!(router.subscribe_all("s2"), 4);
        assert_eq!(router.unsubscribe_all(&"nobody"), 5);
        assert_eq!(router.subscribe_hal_layer(A), 6);
        assert!(!router.remove_all_subscriptions_for(&"nobody"));
        assert_eq!(router.sequence(), 7);
    }

    #[test]
    fn last_unsubscribe_drops_layer_entry() {
        let router = router();
        router.subscribe_layer("s1", A);
        router.subscribe_layer("s2", A);

        router.unsubscribe_layer(&"s1", &A);
        assert!(router.has_layer_subscriptions(&A));

        router.unsubscribe_layer(&"s2", &A);
        assert!(!router.has_layer_subscriptions(&A));
        assert!(router.get_subscription_state().layers.is_empty());
    }

    #[test]
    fn last_publisher_unsubscribe_drops_nested_entries() {
        let router = router();
        router.subscribe_layer_from_publisher("s1", A, 7);
        router.subscribe_layer_from_publisher("s1", A, 8);

        router.unsubscribe_layer_from_publisher(&"s1", &A, 7);
        assert!(!router.has_layer_from_publisher_subscriptions(&A, 7));
        assert!(router.has_layer_from_publisher_subscriptions(&A, 8));

        router.unsubscribe_layer_from_publisher(&"s1", &A, 8);
        assert!(router.get_subscription_state().associated_layers.is_empty());
    }

    #[test]
    fn routing_unions_all_granularities() {
        let router = router();
        router.subscribe_layer("layer", A);
        router.subscribe_layer_from_publisher("from-7", A, 7);
        router.subscribe_layer_from_publisher("from-8", A, 8);
        router.subscribe_all("all");
        router.subscribe_layer("other-layer", B);

        assert_eq!(
            router.get_subscribers_for_layer_from_publisher(&A, 7),
            HashSet::from(["layer", "from-7", "all"])
        );
        assert_eq!(
            router.get_subscribers_for_layer_from_publisher(&B, 7),
            HashSet::from(["other-layer", "all"])
        );
        assert_eq!(
            router.get_subscribers_for_layer(&A),
            HashSet::from(["layer", "all"])
        );
    }

    #[test]
    fn routing_deduplicates_overlapping_subscriptions() {
        let router = router();
        router.subscribe_layer("s1", A);
        router.subscribe_layer_from_publisher("s1", A, 7);
        router.subscribe_all("s1");

        assert_eq!(
            router.get_subscribers_for_layer_from_publisher(&A, 7),
            HashSet::from(["s1"])
        );
    }

    #[test]
    fn remove_all_clears_every_structure() {
        let router = router();
        router.subscribe_layer("s1", A);
        router.subscribe_layer("s2", A);
        router.subscribe_layer_from_publisher("s1", B, 3);
        router.subscribe_all("s1");

        assert!(router.remove_all_subscriptions_for(&"s1"));

        assert!(!router.contains_subscriber(&"s1"));
        assert!(router.contains_subscriber(&"s2"));
        assert!(!router.has_layer_from_publisher_subscriptions(&B, 3));
        assert!(!router
            .get_subscribers_for_layer_from_publisher(&B, 3)
            .contains("s1"));
        assert_eq!(router.get_all_subscribers(), HashSet::from(["s2"]));
    }

    #[test]
    fn hal_is_tracked_by_membership_only() {
        let router = router();
        router.subscribe_hal_layer(A);
        router.subscribe_hal_layer_from_publisher(B, 4);

        assert!(router.is_hal_subscribed(&A));
        assert!(!router.is_hal_subscribed(&B));
        assert!(router.is_hal_subscribed_from_publisher(&B, 4));
        assert!(router.get_all_subscribers().is_empty());
        assert!(router.get_subscribers_for_layer_from_publisher(&A, 4).is_empty());
        assert!(!router.has_layer_subscriptions(&A));

        router.unsubscribe_hal_layer_from_publisher(&B, 4);
        assert!(!router.is_hal_subscribed_from_publisher(&B, 4));
    }

    #[test]
    fn subscription_state_merges_ordinary_and_hal() {
        let router = router();
        router.subscribe_layer("s1", A);
        router.subscribe_hal_layer(B);
        router.subscribe_layer_from_publisher("s1", A, 1);
        router.subscribe_hal_layer_from_publisher(A, 2);
        router.subscribe_hal_layer_from_publisher(B, 3);

        let state = router.get_subscription_state();

        assert_eq!(state.sequence, 5);
        assert_eq!(state.layers, BTreeSet::from([A, B]));
        assert_eq!(
            state.associated_layers,
            BTreeSet::from([
                AssociatedLayer::new(A, [1, 2]),
                AssociatedLayer::new(B, [3]),
            ])
        );
    }

    #[test]
    fn routing_decision_reports_hal_with_subscribers() {
        let router = router();
        router.subscribe_layer("s1", A);
        router.subscribe_hal_layer_from_publisher(A, 7);

        assert_eq!(
            router.get_routing_decision(&A, 7),
            RoutingDecision {
                subscribers: HashSet::from(["s1"]),
                hal: true,
            }
        );
        assert!(!router.get_routing_decision(&A, 8).hal);

        router.subscribe_hal_layer(B);
        let decision = router.get_routing_decision(&B, 8);
        assert!(decision.hal);
        assert!(decision.subscribers.is_empty());
    }

    #[test]
    fn applied_change_is_reflected_in_its_own_snapshot() {
        let router = router();
        router.subscribe_all("s0");

        let state = router.apply(|state| state.subscribe_layer("s1", A));

        assert_eq!(state.sequence, 2);
        assert_eq!(state.layers, BTreeSet::from([A]));
        assert_eq!(state, router.get_subscription_state());
    }
}
