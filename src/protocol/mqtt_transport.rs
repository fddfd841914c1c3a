// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport feeding the network service.
//!
//! The transport owns the broker connection. Every publish received on a
//! subscribed topic is forwarded, undecoded, as an [`InboundMessage`] on a
//! channel; the consumer decides what to do with it.
//!
//! # Examples
//!
//! ```no_run
//! use nodewatch::protocol::MqttTransport;
//!
//! # async fn example() -> nodewatch::Result<()> {
//! let (transport, mut messages) = MqttTransport::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .build()
//!     .await?;
//!
//! transport.subscribe("ozw/node/#").await?;
//!
//! while let Some(message) = messages.recv().await {
//!     println!("{}: {} bytes", message.topic, message.payload.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::InboundMessage;
use crate::config::MqttConfig;
use crate::error::ProtocolError;

/// Capacity of the inbound message channel.
const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// Connection settings for [`MqttTransport`].
#[derive(Debug, Clone)]
struct TransportConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// A connection to the MQTT broker.
///
/// Cheaply cloneable; all clones share the same connection.
#[derive(Clone)]
pub struct MqttTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: AsyncClient,
    config: TransportConfig,
    connected: AtomicBool,
}

impl MqttTransport {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::default()
    }

    /// Creates a builder preloaded from configuration.
    #[must_use]
    pub fn from_config(config: &MqttConfig) -> MqttTransportBuilder {
        let builder = Self::builder()
            .host(config.host.clone())
            .port(config.port)
            .keep_alive(config.keep_alive())
            .connection_timeout(config.connection_timeout());
        match config.credentials() {
            Some((user, pass)) => builder.credentials(user, pass),
            None => builder,
        }
    }

    /// Returns whether the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Subscribes to `topic` (wildcards allowed) at QoS 1.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription request cannot be queued.
    pub async fn subscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        self.inner
            .client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(ProtocolError::Mqtt)?;
        tracing::info!(topic = %topic, "Subscribed");
        Ok(())
    }

    /// Disconnects from the broker.
    ///
    /// The inbound channel closes once the event loop observes the disconnect.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );
        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;
        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for [`MqttTransport`].
#[derive(Debug, Default)]
pub struct MqttTransportBuilder {
    config: TransportConfig,
}

impl MqttTransportBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Connects to the broker.
    ///
    /// Waits for the broker to acknowledge the connection, then returns the
    /// transport and the receiving end of the inbound message channel.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(
        self,
    ) -> Result<(MqttTransport, mpsc::Receiver<InboundMessage>), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = format!("nodewatch-{}", Uuid::new_v4().simple());
        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let transport = MqttTransport {
            inner: Arc::new(TransportInner {
                client,
                config: self.config.clone(),
                connected: AtomicBool::new(false),
            }),
        };

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (connack_tx, connack_rx) = oneshot::channel();

        let transport_clone = transport.clone();
        tokio::spawn(async move {
            handle_transport_events(event_loop, transport_clone, inbound_tx, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
                Ok((transport, inbound_rx))
            }
            Ok(Err(_)) => Err(ProtocolError::ConnectionFailed(
                "MQTT event loop terminated before the broker acknowledged".to_string(),
            )),
            Err(_) => Err(ProtocolError::ConnectionFailed(format!(
                "MQTT connection timeout after {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Drives the rumqttc event loop until the connection ends.
///
/// Reconnection is not attempted: when the loop ends, `inbound` is dropped
/// and the consumer sees the channel close.
async fn handle_transport_events(
    mut event_loop: EventLoop,
    transport: MqttTransport,
    inbound: mpsc::Sender<InboundMessage>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                transport.inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                if inbound.send(message).await.is_err() {
                    tracing::debug!("Inbound consumer gone, stopping MQTT event loop");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                break;
            }
            Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect sent");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                break;
            }
        }
    }

    transport.inner.connected.store(false, Ordering::Release);
}
