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

//! Content-addressed registry of publisher identities.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::observability::{events, fields};

const COMPONENT: &str = "publisher_registry";

/// Publisher identity blob compared by content rather than by reference.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct PublisherInfoKey(Arc<[u8]>);

impl From<Vec<u8>> for PublisherInfoKey {
    fn from(info: Vec<u8>) -> Self {
        Self(Arc::from(info))
    }
}

impl PublisherInfoKey {
    fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Lookup failures for publisher identities.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PublisherIdentityError {
    /// The id was never handed out by this registry.
    UnknownPublisherId(i32),
    /// Every non-negative `i32` id has been handed out.
    IdSpaceExhausted,
}

impl Display for PublisherIdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PublisherIdentityError::UnknownPublisherId(id) => {
                write!(f, "publisher id {id} was never assigned")
            }
            PublisherIdentityError::IdSpaceExhausted => {
                write!(f, "no publisher ids left to assign")
            }
        }
    }
}

impl Error for PublisherIdentityError {}

#[derive(Default)]
struct RegistryState {
    id_by_info: HashMap<PublisherInfoKey, i32>,
    info_by_id: HashMap<i32, PublisherInfoKey>,
    next_id: usize,
}

/// Deduplicates publisher identity blobs into small, stable integer ids.
///
/// Ids are assigned densely from `0` in first-seen order and are never reused.
#[derive(Default)]
pub struct PublisherIdentityRegistry {
    state: Mutex<RegistryState>,
}

impl PublisherIdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_next_id(next_id: usize) -> Self {
        let registry = Self::default();
        registry.state.lock().next_id = next_id;
        registry
    }

    /// Returns the id for `info`, assigning the next free id on first sight.
    ///
    /// Fails once `i32::MAX` has been assigned; known identities still resolve.
    pub fn get_or_create_id(
        &self,
        info: impl Into<Vec<u8>>,
    ) -> Result<i32, PublisherIdentityError> {
        let key = PublisherInfoKey::from(info.into());
        let mut state = self.state.lock();

        if let Some(id) = state.id_by_info.get(&key) {
            return Ok(*id);
        }

        let id = i32::try_from(state.next_id).map_err(|_| {
            error!(
                event = events::PUBLISHER_ID_EXHAUSTED,
                component = COMPONENT,
                publisher_info = %fields::format_publisher_info(&key.0),
                "publisher id space exhausted"
            );
            PublisherIdentityError::IdSpaceExhausted
        })?;
        state.next_id += 1;
        debug!(
            event = events::PUBLISHER_ID_ASSIGNED,
            component = COMPONENT,
            publisher_id = id,
            publisher_info = %fields::format_publisher_info(&key.0),
            "assigned new publisher id"
        );
        state.id_by_info.insert(key.clone(), id);
        state.info_by_id.insert(id, key);
        Ok(id)
    }

    /// Returns a copy of the identity blob behind `id`.
    pub fn get_info(&self, id: i32) -> Result<Vec<u8>, PublisherIdentityError> {
        let state = self.state.lock();
        match state.info_by_id.get(&id) {
            Some(info) => Ok(info.to_vec()),
            None => {
                warn!(
                    event = events::PUBLISHER_ID_UNKNOWN,
                    component = COMPONENT,
                    publisher_id = id,
                    "lookup of unassigned publisher id"
                );
                Err(PublisherIdentityError::UnknownPublisherId(id))
            }
        }
    }

    /// Returns `true` if `id` was handed out by this registry.
    pub fn contains_id(&self, id: i32) -> bool {
        self.state.lock().info_by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().info_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
