// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `nodewatch` service entry point.
//!
//! Loads configuration, connects to the broker, consumes node events into
//! the registry and serves the read API until interrupted or until the
//! broker connection ends.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use nodewatch::api::{self, ApiState};
use nodewatch::{Config, MqttTransport, NetworkService, Registry};

#[derive(Parser, Debug)]
#[command(name = "nodewatch", version, about)]
struct Args {
    /// Path to a JSON configuration file. Defaults are used when omitted.
    #[arg(long, short, env = "NODEWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> nodewatch::Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = Arc::new(Config::load_or_default(args.config.as_deref())?);
    tracing::info!(config = ?config, "Using configuration");

    let registry = Arc::new(Registry::with_policy(config.registry.removal_policy));
    let service = Arc::new(NetworkService::new(
        config.mqtt.namespace.clone(),
        registry,
    ));

    tracing::info!(broker = %config.mqtt.uri(), "Connecting to MQTT broker");
    let (transport, inbound) = MqttTransport::from_config(&config.mqtt).build().await?;
    for topic in service.subscriptions() {
        transport.subscribe(&topic).await?;
    }

    let stream_closed = Arc::new(Notify::new());
    let consumer = {
        let service = Arc::clone(&service);
        let stream_closed = Arc::clone(&stream_closed);
        tokio::spawn(async move {
            let applied = service.run(inbound).await;
            stream_closed.notify_one();
            applied
        })
    };

    let app = api::build_router(ApiState::new(service.query(), Arc::clone(&config)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, shutting down");
                }
                () = stream_closed.notified() => {
                    tracing::warn!("Event stream ended, shutting down");
                }
            }
        })
        .await?;

    if transport.is_connected()
        && let Err(e) = transport.disconnect().await
    {
        tracing::warn!(error = %e, "Failed to disconnect cleanly");
        consumer.abort();
    }

    match consumer.await {
        Ok(applied) => tracing::info!(applied, "Consumer stopped"),
        Err(e) if e.is_cancelled() => tracing::info!("Consumer cancelled"),
        Err(e) => tracing::error!(error = %e, "Consumer task failed"),
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
