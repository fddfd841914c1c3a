// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `nodewatch` - device lifecycle reconciliation over MQTT.
//!
//! A Z-Wave gateway publishes node lifecycle events (`add`, `available`,
//! `ready`, `remove`) under a topic namespace. Delivery is at-least-once and
//! unordered, so events can arrive twice, late, or for devices that are
//! already gone. This crate keeps an in-memory registry that converges on
//! the true device set anyway, and exposes it read-only.
//!
//! # Pipeline
//!
//! ```text
//! MqttTransport ─▶ NetworkService ─▶ TopicRouter ─▶ Envelope ─▶ Reconciler ─▶ Registry
//!                                                                                │
//!                                                          DeviceQuery / HTTP API ◀┘
//! ```
//!
//! Every event carries a timestamp. An event is applied only when its
//! timestamp is strictly newer than the last one applied to the same device;
//! everything else is logged and dropped.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use nodewatch::NetworkService;
//! use nodewatch::registry::{DeviceId, Registry};
//!
//! let service = NetworkService::new("ozw", Arc::new(Registry::new()));
//! let query = service.query();
//!
//! let _ = service.handle_message("ozw/node/add", br#"{"payload":{"id":3},"timestamp":10}"#);
//! let _ = service.handle_message("ozw/node/ready", br#"{"payload":{"id":3},"timestamp":11}"#);
//!
//! // A replay of the add is a duplicate and changes nothing.
//! let replay = service.handle_message("ozw/node/add", br#"{"payload":{"id":3},"timestamp":10}"#);
//! assert!(!replay.is_applied());
//!
//! let device = query.get_device(DeviceId::new(3).unwrap()).unwrap();
//! assert!(device.ready);
//! ```
//!
//! # Features
//!
//! - `mqtt`: the [`protocol::MqttTransport`] broker connection
//! - `http`: the [`api`] router
//! - `server`: the `nodewatch` binary (implies both)

#[cfg(feature = "http")]
pub mod api;
pub mod config;
pub mod error;
mod network;
pub mod protocol;
mod query;
pub mod reconcile;
pub mod registry;

pub use config::{Config, MqttConfig, RegistryConfig, ServerConfig};
pub use error::{
    ConfigError, DecodeError, Error, ProtocolError, Rejection, Result, RouteError, ValueError,
};
pub use network::NetworkService;
#[cfg(feature = "mqtt")]
pub use protocol::{MqttTransport, MqttTransportBuilder};
pub use protocol::{Envelope, EventHandler, InboundMessage, Outcome, TopicRouter};
pub use query::DeviceQuery;
pub use reconcile::{NodeAction, Reconciler};
pub use registry::{DeviceId, DeviceRecord, NodeState, Registry, RemovalPolicy};
