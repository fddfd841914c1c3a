// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Namespace-scoped topic routing.
//!
//! The [`TopicRouter`] turns an inbound `(topic, body)` pair into a call on an
//! [`EventHandler`]. Topics are scoped under a configurable namespace so the
//! same broker can carry several networks.
//!
//! # Architecture
//!
//! ```text
//! MQTT Message: ozw/node/available → {"payload": {...}, "timestamp": 42}
//!                     ↓
//!           TopicRouter.dispatch()
//!                     ↓
//!     strip "ozw/" → kind = Node, action = "available"
//!                     ↓
//!            Envelope::decode(body)
//!                     ↓
//!   handler.handle_node_event("available", &envelope)
//! ```

use super::{EventHandler, Outcome};
use crate::error::{Error, RouteError};
use crate::protocol::Envelope;

/// Entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Node lifecycle events (`<ns>/node/<action>`).
    Node,
    /// Value events (`<ns>/value/<action>`).
    Value,
}

impl EntityKind {
    /// Returns the topic segment for this kind, including the trailing slash.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Node => "node/",
            Self::Value => "value/",
        }
    }
}

/// A routed topic: entity kind plus the action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    /// The entity kind.
    pub kind: EntityKind,
    /// Everything after the kind segment.
    pub action: &'a str,
}

/// Routes namespaced topics to an [`EventHandler`].
///
/// # Examples
///
/// ```
/// use nodewatch::protocol::{EntityKind, TopicRouter};
///
/// let router = TopicRouter::new("ozw");
/// let route = router.route("ozw/node/add").unwrap();
/// assert_eq!(route.kind, EntityKind::Node);
/// assert_eq!(route.action, "add");
///
/// assert!(router.route("zigbee/node/add").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TopicRouter {
    namespace: String,
    /// `namespace` followed by `/`.
    prefix: String,
}

impl TopicRouter {
    /// Creates a router for the given namespace.
    ///
    /// A trailing `/` on the namespace is ignored.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        let mut namespace = namespace.into();
        while namespace.ends_with('/') {
            namespace.pop();
        }
        let prefix = format!("{namespace}/");
        Self { namespace, prefix }
    }

    /// Returns the namespace this router serves.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the wildcard topics the transport must subscribe to.
    #[must_use]
    pub fn subscriptions(&self) -> [String; 2] {
        [
            format!("{}{}#", self.prefix, EntityKind::Node.prefix()),
            format!("{}{}#", self.prefix, EntityKind::Value.prefix()),
        ]
    }

    /// Splits a topic into entity kind and action.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::OutsideNamespace`] if the topic is not under our
    /// namespace, and [`RouteError::UnknownTopic`] if it is but does not start
    /// with a known entity segment.
    pub fn route<'a>(&self, topic: &'a str) -> Result<Route<'a>, RouteError> {
        let Some(rest) = topic.strip_prefix(self.prefix.as_str()) else {
            return Err(RouteError::OutsideNamespace {
                topic: topic.to_string(),
                namespace: self.namespace.clone(),
            });
        };

        [EntityKind::Node, EntityKind::Value]
            .into_iter()
            .find_map(|kind| {
                rest.strip_prefix(kind.prefix())
                    .map(|action| Route { kind, action })
            })
            .ok_or_else(|| RouteError::UnknownTopic {
                topic: rest.to_string(),
            })
    }

    /// Routes, decodes and hands one message to `handler`.
    ///
    /// Nothing escapes this call: a message that cannot be routed, decoded or
    /// applied is logged and reported as [`Outcome::Dropped`].
    pub fn dispatch<H>(&self, topic: &str, body: &[u8], handler: &H) -> Outcome
    where
        H: EventHandler + ?Sized,
    {
        let outcome = self.dispatch_inner(topic, body, handler);
        if let Outcome::Dropped(error) = &outcome {
            log_dropped(topic, error);
        }
        outcome
    }

    fn dispatch_inner<H>(&self, topic: &str, body: &[u8], handler: &H) -> Outcome
    where
        H: EventHandler + ?Sized,
    {
        let route = match self.route(topic) {
            Ok(route) => route,
            Err(e) => return Outcome::Dropped(e.into()),
        };

        let envelope = match Envelope::decode(body) {
            Ok(envelope) => envelope,
            Err(e) => return Outcome::Dropped(e.into()),
        };

        tracing::debug!(
            topic = %topic,
            action = %route.action,
            timestamp = envelope.timestamp(),
            "Handling message"
        );

        match route.kind {
            EntityKind::Node => handler.handle_node_event(route.action, &envelope),
            EntityKind::Value => handler.handle_value_event(route.action, &envelope),
        }
    }
}

/// Logs a dropped message at the level its cause deserves.
fn log_dropped(topic: &str, error: &Error) {
    match error {
        Error::Route(RouteError::OutsideNamespace { namespace, .. }) => {
            tracing::debug!(
                topic = %topic,
                namespace = %namespace,
                "Dropping message outside namespace"
            );
        }
        Error::Route(e) => {
            tracing::warn!(topic = %topic, error = %e, "Dropping message on unknown topic");
        }
        Error::Decode(e) => {
            tracing::warn!(topic = %topic, error = %e, "Dropping malformed message");
        }
        Error::Rejected(rejection) if rejection.is_expected() => {
            tracing::debug!(topic = %topic, reason = %rejection, "Dropping event");
        }
        other => {
            tracing::warn!(topic = %topic, error = %other, "Dropping rejected event");
        }
    }
}
