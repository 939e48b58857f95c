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

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use support::init_logging;
use vms_broker::{PublisherIdentityError, PublisherIdentityRegistry};

#[test]
fn identical_content_from_distinct_buffers_shares_an_id() {
    init_logging();
    let registry = PublisherIdentityRegistry::new();

    let first = registry.get_or_create_id(b"camera-front".to_vec()).unwrap();
    let second = registry
        .get_or_create_id(String::from("camera-front").into_bytes())
        .unwrap();
    let other = registry.get_or_create_id(b"camera-rear".to_vec()).unwrap();

    assert_eq!(first, second);
    assert!(other > first);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get_info(other), Ok(b"camera-rear".to_vec()));
}

#[test]
fn unknown_id_is_reported() {
    init_logging();
    let registry = PublisherIdentityRegistry::new();
    registry.get_or_create_id(b"lidar".to_vec()).unwrap();

    assert_eq!(
        registry.get_info(42),
        Err(PublisherIdentityError::UnknownPublisherId(42))
    );
}

#[test]
fn concurrent_callers_agree_on_ids() {
    init_logging();
    let registry = Arc::new(PublisherIdentityRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..16)
                    .map(|n| {
                        let name = format!("publisher-{}", (n + worker) % 16);
                        let id = registry.get_or_create_id(name.clone().into_bytes()).unwrap();
                        (name, id)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut assignments = HashSet::new();
    for handle in handles {
        for assignment in handle.join().expect("worker panicked") {
            assignments.insert(assignment);
        }
    }

    assert_eq!(registry.len(), 16);
    assert_eq!(assignments.len(), 16);
    let ids: HashSet<i32> = assignments.iter().map(|(_, id)| *id).collect();
    assert_eq!(ids.len(), 16);
}
