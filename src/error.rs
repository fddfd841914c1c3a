// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for `nodewatch`.
//!
//! The hierarchy mirrors the life of an inbound event: routing the topic,
//! decoding the body, then applying it to the registry. Errors from those
//! three stages never escape the processing of a single event; they are
//! logged and the event is dropped. Only configuration, transport and
//! query errors reach callers.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::DeviceId;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The topic does not belong to this service.
    #[error("routing error: {0}")]
    Route(#[from] RouteError),

    /// The message body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The event was decoded but could not be applied.
    #[error("event rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport communication failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No record exists for the requested device.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    /// I/O failure outside of configuration loading (e.g. binding a socket).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while routing a topic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The topic is scoped under a different namespace.
    #[error("topic '{topic}' is outside namespace '{namespace}'")]
    OutsideNamespace {
        /// The full topic.
        topic: String,
        /// The namespace the router serves.
        namespace: String,
    },

    /// The topic is in our namespace but has no known entity prefix.
    #[error("unknown topic '{topic}'")]
    UnknownTopic {
        /// The topic with the namespace stripped.
        topic: String,
    },
}

/// Errors produced while decoding an event body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not valid JSON or does not match the expected shape.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong type.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Reasons a decoded event is not applied to the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The event carries a non-positive device id.
    #[error("invalid device id {0}")]
    InvalidId(i64),

    /// An add for a device we already track, at or below its last timestamp.
    #[error("duplicate add for device {id} (timestamp {timestamp} <= {last_applied})")]
    Duplicate {
        /// The device.
        id: DeviceId,
        /// Timestamp carried by the event.
        timestamp: i64,
        /// Most recent timestamp applied to the device.
        last_applied: i64,
    },

    /// The event is older than (or as old as) what was already applied.
    #[error("stale event for device {id} (timestamp {timestamp} <= {last_applied})")]
    Stale {
        /// The device.
        id: DeviceId,
        /// Timestamp carried by the event.
        timestamp: i64,
        /// Most recent timestamp applied to the device.
        last_applied: i64,
    },

    /// The event references a device with no live record.
    #[error("stray event for untracked device {id}")]
    Stray {
        /// The device.
        id: DeviceId,
    },

    /// The node action is not one we reconcile.
    #[error("unknown node action '{0}'")]
    UnknownAction(String),
}

impl Rejection {
    /// Returns `true` for rejections that are normal under an at-least-once,
    /// unordered transport (duplicates, stale replays and strays).
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Duplicate { .. } | Self::Stale { .. } | Self::Stray { .. }
        )
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Device ids must be positive and fit in 32 bits.
    #[error("invalid device id {0}")]
    InvalidDeviceId(i64),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found at '{}'", .0.display())]
    NotFound(PathBuf),

    /// The configuration file exists but is empty.
    #[error("config file at '{}' is empty", .0.display())]
    Empty(PathBuf),

    /// The configuration file could not be read.
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for our schema.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to transport communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_error_display() {
        let err = RouteError::OutsideNamespace {
            topic: "other/node/add".to_string(),
            namespace: "ozw".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "topic 'other/node/add' is outside namespace 'ozw'"
        );
    }

    #[test]
    fn rejection_display() {
        let id = DeviceId::new(7).unwrap();
        let err = Rejection::Stale {
            id,
            timestamp: 3,
            last_applied: 5,
        };
        assert_eq!(err.to_string(), "stale event for device 7 (timestamp 3 <= 5)");
    }

    #[test]
    fn expected_rejections() {
        let id = DeviceId::new(1).unwrap();
        assert!(Rejection::Stray { id }.is_expected());
        assert!(
            Rejection::Duplicate {
                id,
                timestamp: 1,
                last_applied: 1
            }
            .is_expected()
        );
        assert!(!Rejection::InvalidId(0).is_expected());
        assert!(!Rejection::UnknownAction("dead".to_string()).is_expected());
    }

    #[test]
    fn error_from_rejection() {
        let err: Error = Rejection::InvalidId(-4).into();
        assert!(matches!(err, Error::Rejected(Rejection::InvalidId(-4))));
    }

    #[test]
    fn not_found_display() {
        let err = Error::DeviceNotFound(DeviceId::new(42).unwrap());
        assert_eq!(err.to_string(), "device 42 not found");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::Empty(PathBuf::from("/etc/nodewatch.json"));
        assert_eq!(err.to_string(), "config file at '/etc/nodewatch.json' is empty");
    }
}
