// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event envelope decoding.
//!
//! Every event body published by the producer has the same outer shape:
//!
//! ```json
//! { "payload": { "id": 7, "info": { ... } }, "timestamp": 1700000000 }
//! ```
//!
//! [`Envelope::decode`] validates that outer shape. The action-specific
//! payload is then decoded into a typed struct with [`Envelope::payload_as`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::registry::DeviceInfo;

/// A decoded event body.
///
/// Built fresh for each inbound message and consumed by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Always a JSON object.
    payload: Value,
    timestamp: i64,
}

impl Envelope {
    /// Creates an envelope from an already decoded payload object.
    #[must_use]
    pub fn new(payload: Map<String, Value>, timestamp: i64) -> Self {
        Self {
            payload: Value::Object(payload),
            timestamp,
        }
    }

    /// Decodes a raw message body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the body is not JSON, is not an object, or
    /// lacks an object `payload` or an integer `timestamp`.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let Value::Object(mut outer) = serde_json::from_slice::<Value>(body)? else {
            return Err(DecodeError::InvalidField {
                field: "body",
                message: "expected a JSON object".to_string(),
            });
        };

        let payload = match outer.remove("payload") {
            None => return Err(DecodeError::MissingField("payload")),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(DecodeError::InvalidField {
                    field: "payload",
                    message: format!("expected an object, got {}", kind_of(&other)),
                });
            }
        };

        let timestamp = match outer.get("timestamp") {
            None => return Err(DecodeError::MissingField("timestamp")),
            Some(value) => value.as_i64().ok_or_else(|| DecodeError::InvalidField {
                field: "timestamp",
                message: format!("expected an integer, got {value}"),
            })?,
        };

        Ok(Self::new(payload, timestamp))
    }

    /// Returns the producer-assigned logical timestamp.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the raw payload object.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Decodes the payload into a typed action payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        T::deserialize(&self.payload).map_err(DecodeError::from)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Payload of node actions that only identify the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NodeRef {
    /// Raw device id; validated by the reconciler.
    pub id: i64,
}

/// Payload of the node `available` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeAvailable {
    /// Raw device id; validated by the reconciler.
    pub id: i64,
    /// Reported metadata; absent fields default to empty strings.
    #[serde(default, deserialize_with = "info_or_default")]
    pub info: DeviceInfo,
}

fn info_or_default<'de, D>(deserializer: D) -> Result<DeviceInfo, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<DeviceInfo>::deserialize(deserializer).map(Option::unwrap_or_default)
}
