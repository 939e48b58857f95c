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

//! Canonical structured field keys and value-format helpers.

use crate::layer::Layer;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const BROKER: &str = "broker";

pub const LAYER: &str = "layer";
pub const PUBLISHER_ID: &str = "publisher_id";
pub const PUBLISHER_INFO: &str = "publisher_info";
pub const GENERATION: &str = "generation";
pub const SEQUENCE: &str = "sequence";
pub const SUBSCRIBER: &str = "subscriber";
pub const SUBSCRIBERS: &str = "subscribers";
pub const CYCLE: &str = "cycle";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const HAL: &str = "hal";

/// Renders a dependency path such as a detected cycle as `a -> b -> a`.
pub fn format_layer_path<'a>(path: impl IntoIterator<Item = &'a Layer>) -> String {
    let rendered: Vec<String> = path.into_iter().map(Layer::to_string).collect();
    if rendered.is_empty() {
        NONE.to_string()
    } else {
        rendered.join(" -> ")
    }
}

/// Renders opaque publisher identity bytes for logs.
///
/// Printable UTF-8 is shown as-is; anything else is hex-encoded.
pub fn format_publisher_info(info: &[u8]) -> String {
    match std::str::from_utf8(info) {
        Ok(text) if !text.is_empty() && !text.chars().any(char::is_control) => text.to_string(),
        _ => info.iter().map(|byte| format!("{byte:02x}")).collect(),
    }
}
