// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network service: the event consumer.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::protocol::{InboundMessage, Outcome, TopicRouter};
use crate::query::DeviceQuery;
use crate::reconcile::Reconciler;
use crate::registry::Registry;

/// Consumes inbound messages for one namespace and keeps the registry current.
///
/// The service is built once at startup and shared by `Arc`. Messages are
/// processed one at a time, each running to completion before the next;
/// queries can run concurrently through [`DeviceQuery`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use nodewatch::NetworkService;
/// use nodewatch::registry::{DeviceId, Registry};
///
/// let service = NetworkService::new("ozw", Arc::new(Registry::new()));
///
/// let outcome = service.handle_message(
///     "ozw/node/add",
///     br#"{"payload": {"id": 7}, "timestamp": 1}"#,
/// );
/// assert!(outcome.is_applied());
///
/// let device = service.query().get_device(DeviceId::new(7).unwrap()).unwrap();
/// assert!(!device.ready);
/// ```
#[derive(Debug)]
pub struct NetworkService {
    router: TopicRouter,
    reconciler: Reconciler,
}

impl NetworkService {
    /// Creates a service for `namespace` writing into `registry`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, registry: Arc<Registry>) -> Self {
        let router = TopicRouter::new(namespace);
        tracing::info!(namespace = %router.namespace(), "Network service created");
        Self {
            router,
            reconciler: Reconciler::new(registry),
        }
    }

    /// Returns the namespace this service consumes.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.router.namespace()
    }

    /// Returns the wildcard topics the transport must subscribe to.
    #[must_use]
    pub fn subscriptions(&self) -> [String; 2] {
        self.router.subscriptions()
    }

    /// Returns a read-only view of the registry.
    #[must_use]
    pub fn query(&self) -> DeviceQuery {
        DeviceQuery::new(Arc::clone(self.reconciler.registry()))
    }

    /// Processes one message to completion.
    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> Outcome {
        tracing::debug!(topic = %topic, bytes = payload.len(), "Message received");
        self.router.dispatch(topic, payload, &self.reconciler)
    }

    /// Processes messages from `rx` until the channel closes.
    ///
    /// Returns the number of messages that changed the registry.
    pub async fn run(&self, mut rx: mpsc::Receiver<InboundMessage>) -> u64 {
        tracing::info!(namespace = %self.namespace(), "Consuming network events");

        let mut applied = 0;
        while let Some(message) = rx.recv().await {
            if self
                .handle_message(&message.topic, &message.payload)
                .is_applied()
            {
                applied += 1;
            }
        }

        tracing::info!(applied, "Event stream closed");
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceId;

    fn service() -> NetworkService {
        NetworkService::new("ozw", Arc::new(Registry::new()))
    }

    #[test]
    fn subscriptions_use_namespace() {
        let service = service();
        assert_eq!(service.namespace(), "ozw");
        assert_eq!(service.subscriptions()[0], "ozw/node/#");
    }

    #[test]
    fn handle_message_applies_to_shared_registry() {
        let service = service();
        let query = service.query();

        let outcome =
            service.handle_message("ozw/node/add", br#"{"payload":{"id":5},"timestamp":1}"#);
        assert!(outcome.is_applied());
        assert!(query.get_device(DeviceId::new(5).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn run_drains_channel_in_order() {
        let service = service();
        let (tx, rx) = mpsc::channel(8);

        for (action, timestamp) in [("add", 1), ("ready", 2), ("ready", 2), ("bogus", 3)] {
            let body = format!(r#"{{"payload":{{"id":4}},"timestamp":{timestamp}}}"#);
            tx.send(InboundMessage::new(format!("ozw/node/{action}"), body))
                .await
                .unwrap();
        }
        drop(tx);

        let applied = service.run(rx).await;
        assert_eq!(applied, 2);
        assert!(
            service
                .query()
                .get_device(DeviceId::new(4).unwrap())
                .unwrap()
                .ready
        );
    }
}
