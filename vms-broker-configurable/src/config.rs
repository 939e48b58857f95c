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

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;
use vms_broker::{Layer, LayerDependency};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) broker: BrokerConfig,
    #[serde(default)]
    pub(crate) publishers: Vec<PublisherConfig>,
    #[serde(default)]
    pub(crate) subscribers: Vec<SubscriberConfig>,
    #[serde(default)]
    pub(crate) hal_subscriptions: Vec<HalSubscriptionConfig>,
    #[serde(default)]
    pub(crate) publishes: Vec<PublishConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub(crate) name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    /// Publisher identity; its UTF-8 bytes are what the broker keys on.
    pub(crate) info: String,
    #[serde(default)]
    pub(crate) offerings: Vec<LayerDependency>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SubscriberConfig {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) subscriptions: Vec<SubscriptionConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SubscriptionConfig {
    All,
    Layer { layer: Layer },
    LayerFromPublisher { layer: Layer, publisher: String },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct HalSubscriptionConfig {
    pub(crate) layer: Layer,
    #[serde(default)]
    pub(crate) publisher: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    pub(crate) publisher: String,
    pub(crate) layer: Layer,
    pub(crate) payload: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(json5::Error),
    DuplicatePublisher(String),
    DuplicateSubscriber(String),
    UnknownPublisher(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(err) => write!(f, "unable to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "unable to parse config file: {err}"),
            ConfigError::DuplicatePublisher(info) => {
                write!(f, "duplicate publisher info found: {info}")
            }
            ConfigError::DuplicateSubscriber(name) => {
                write!(f, "duplicate subscriber name found: {name}")
            }
            ConfigError::UnknownPublisher(info) => {
                write!(f, "reference to undeclared publisher: {info}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_json5(&contents)
    }

    pub fn from_json5(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = json5::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that names are unique and every publisher reference is declared.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut publishers = HashSet::new();
        for publisher in &self.publishers {
            if !publishers.insert(publisher.info.as_str()) {
                return Err(ConfigError::DuplicatePublisher(publisher.info.clone()));
            }
        }

        let require_publisher = |info: &str| {
            if publishers.contains(info) {
                Ok(())
            } else {
                Err(ConfigError::UnknownPublisher(info.to_string()))
            }
        };

        let mut subscribers = HashSet::new();
        for subscriber in &self.subscribers {
            if !subscribers.insert(subscriber.name.as_str()) {
                return Err(ConfigError::DuplicateSubscriber(subscriber.name.clone()));
            }
            for subscription in &subscriber.subscriptions {
                if let SubscriptionConfig::LayerFromPublisher { publisher, .. } = subscription {
                    require_publisher(publisher.as_str())?;
                }
            }
        }

        for hal_subscription in &self.hal_subscriptions {
            if let Some(publisher) = &hal_subscription.publisher {
                require_publisher(publisher.as_str())?;
            }
        }

        for publish in &self.publishes {
            require_publisher(publish.publisher.as_str())?;
        }

        Ok(())
    }
}
