// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound message handling.
//!
//! This module turns transport messages into handler calls:
//!
//! - [`TopicRouter`]: namespace scoping and `node`/`value` classification
//! - [`Envelope`]: validation of the `{payload, timestamp}` body
//! - [`EventHandler`]: the seam implemented by the reconciler
//! - [`MqttTransport`]: the MQTT connection feeding [`InboundMessage`]s
//!   (feature `mqtt`)

mod envelope;
#[cfg(feature = "mqtt")]
mod mqtt_transport;
mod topic_router;

pub use envelope::{Envelope, NodeAvailable, NodeRef};
#[cfg(feature = "mqtt")]
pub use mqtt_transport::{MqttTransport, MqttTransportBuilder};
pub use topic_router::{EntityKind, Route, TopicRouter};

use crate::error::Error;

/// A raw message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full topic, namespace included.
    pub topic: String,
    /// Undecoded body.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a new inbound message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Result of processing one inbound message.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    /// The event changed the registry.
    Applied,
    /// The event was accepted but has no reconciliation rule yet.
    Deferred,
    /// The event was dropped; the error says why.
    Dropped(Error),
}

impl Outcome {
    /// Returns `true` if the event changed the registry.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Returns the reason the event was dropped, if it was.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Dropped(e) => Some(e),
            _ => None,
        }
    }
}

/// Receives routed events.
///
/// The [`TopicRouter`] calls exactly one of these per routable message, after
/// the namespace and entity segment have been stripped from the topic.
pub trait EventHandler {
    /// Handles a `<ns>/node/<action>` event.
    fn handle_node_event(&self, action: &str, envelope: &Envelope) -> Outcome;

    /// Handles a `<ns>/value/<action>` event.
    fn handle_value_event(&self, action: &str, envelope: &Envelope) -> Outcome;
}
