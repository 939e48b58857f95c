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

mod support;

use std::collections::{BTreeSet, HashSet};
use support::init_logging;
use vms_broker::{AssociatedLayer, Layer, SubscriptionRouter};

const SPEED: Layer = Layer::new(10, 0, 1);
const GEAR: Layer = Layer::new(11, 0, 1);

#[test]
fn layer_subscribers_are_superset_of_promiscuous_subscribers() {
    init_logging();
    let router = SubscriptionRouter::new();
    router.subscribe_all("logger");
    router.subscribe_layer("dashboard", SPEED);
    router.subscribe_layer_from_publisher("adas", SPEED, 7);

    for (layer, publisher_id) in [(SPEED, 7), (SPEED, 8), (GEAR, 7)] {
        let subscribers = router.get_subscribers_for_layer_from_publisher(&layer, publisher_id);
        assert!(subscribers.contains("logger"));
    }

    assert_eq!(
        router.get_subscribers_for_layer_from_publisher(&SPEED, 7),
        HashSet::from(["logger", "dashboard", "adas"])
    );
    assert_eq!(
        router.get_subscribers_for_layer_from_publisher(&SPEED, 8),
        HashSet::from(["logger", "dashboard"])
    );
    assert_eq!(
        router.get_subscribers_for_layer_from_publisher(&GEAR, 7),
        HashSet::from(["logger"])
    );
}

#[test]
fn unsubscribing_last_subscriber_leaves_no_trace_in_state() {
    init_logging();
    let router = SubscriptionRouter::new();
    router.subscribe_layer("dashboard", SPEED);
    router.subscribe_layer_from_publisher("adas", GEAR, 3);

    router.unsubscribe_layer(&"dashboard", &SPEED);
    router.unsubscribe_layer_from_publisher(&"adas", &GEAR, 3);

    let state = router.get_subscription_state();
    assert!(state.layers.is_empty());
    assert!(state.associated_layers.is_empty());
    assert!(!router.has_layer_subscriptions(&SPEED));
    assert!(!router.has_layer_from_publisher_subscriptions(&GEAR, 3));
    assert!(!router.contains_subscriber(&"dashboard"));
    assert!(!router.contains_subscriber(&"adas"));
}

#[test]
fn subscription_state_merges_subscribers_and_hal() {
    init_logging();
    let router = SubscriptionRouter::new();
    router.subscribe_layer("dashboard", SPEED);
    router.subscribe_hal_layer(GEAR);
    router.subscribe_layer_from_publisher("adas", SPEED, 1);
    router.subscribe_hal_layer_from_publisher(SPEED, 2);

    let state = router.get_subscription_state();
    assert_eq!(state.sequence, 4);
    assert_eq!(state.layers, BTreeSet::from([SPEED, GEAR]));
    assert_eq!(
        state.associated_layers,
        BTreeSet::from([AssociatedLayer::new(SPEED, [1, 2])])
    );
}

#[test]
fn removing_all_subscriptions_keeps_other_subscribers() {
    init_logging();
    let router = SubscriptionRouter::new();
    router.subscribe_all("logger");
    router.subscribe_layer("logger", SPEED);
    router.subscribe_layer_from_publisher("logger", GEAR, 5);
    router.subscribe_layer("dashboard", SPEED);

    assert!(router.remove_all_subscriptions_for(&"logger"));
    assert!(!router.remove_all_subscriptions_for(&"logger"));

    assert!(!router.contains_subscriber(&"logger"));
    for (layer, publisher_id) in [(SPEED, 5), (GEAR, 5), (GEAR, 6)] {
        assert!(!router
            .get_subscribers_for_layer_from_publisher(&layer, publisher_id)
            .contains("logger"));
    }
    assert_eq!(router.get_all_subscribers(), HashSet::from(["dashboard"]));
    assert_eq!(
        router.get_subscription_state().layers,
        BTreeSet::from([SPEED])
    );
    assert!(router.get_subscription_state().associated_layers.is_empty());
}

#[test]
fn every_mutation_advances_sequence() {
    init_logging();
    let router = SubscriptionRouter::new();

    let first = router.subscribe_layer("dashboard", SPEED);
    let repeated = router.subscribe_layer("dashboard", SPEED);
    let missing = router.unsubscribe_layer(&"nobody", &GEAR);

    assert_eq!((first, repeated, missing), (1, 2, 3));
    assert_eq!(router.sequence(), 3);
}
