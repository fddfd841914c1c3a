// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP read API over the registry.
//!
//! [`build_router`] returns the bare router. Middleware (tracing, CORS) is
//! attached by the binary so tests can drive the router directly.
//!
//! | Route                  | Response                                  |
//! |------------------------|-------------------------------------------|
//! | `GET /api/nodes`       | every device record, ordered by id        |
//! | `GET /api/nodes/:id`   | one device record, or 404                 |
//! | `GET /api/config`      | the effective configuration, no secrets   |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::query::DeviceQuery;
use crate::registry::DeviceId;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    devices: DeviceQuery,
    config: Arc<Config>,
}

impl ApiState {
    /// Creates handler state.
    #[must_use]
    pub fn new(devices: DeviceQuery, config: Arc<Config>) -> Self {
        Self { devices, config }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: message })).into_response()
}

/// Builds the API router wired to `state`.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/nodes", get(list_nodes))
        .route("/api/nodes/:node_id", get(get_node))
        .route("/api/config", get(get_config))
        .with_state(state)
}

async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.devices.list_devices())
}

async fn get_node(State(state): State<ApiState>, Path(node_id): Path<u32>) -> Response {
    let Some(id) = DeviceId::new(node_id) else {
        return not_found(format!("device {node_id} not found"));
    };

    match state.devices.get_device(id) {
        Ok(record) => Json(record).into_response(),
        Err(e @ Error::DeviceNotFound(_)) => not_found(e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Device lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_config(State(state): State<ApiState>) -> impl IntoResponse {
    Json(Config::clone(&state.config))
}
