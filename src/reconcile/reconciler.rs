// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Applies routed events to the registry.

use std::sync::Arc;

use chrono::Utc;

use super::NodeAction;
use crate::error::{Error, Rejection};
use crate::protocol::{EntityKind, Envelope, EventHandler, NodeAvailable, NodeRef, Outcome};
use crate::registry::{DeviceId, DeviceInfo, DeviceRecord, Registry, RegistryWriter};

/// Reconciles node events into the [`Registry`].
///
/// The transport gives no ordering or delivery-count guarantee, so every
/// mutation is guarded by the device's last-applied logical timestamp: an
/// event whose timestamp is not strictly newer than what was already applied
/// to the same device has no effect. The check and the mutation happen under
/// a single write lock.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use nodewatch::protocol::{EntityKind, Envelope};
/// use nodewatch::reconcile::Reconciler;
/// use nodewatch::registry::{DeviceId, Registry};
///
/// let registry = Arc::new(Registry::new());
/// let reconciler = Reconciler::new(Arc::clone(&registry));
///
/// let add = Envelope::decode(br#"{"payload": {"id": 7}, "timestamp": 1}"#).unwrap();
/// assert!(reconciler.apply(EntityKind::Node, "add", &add).is_applied());
///
/// // Redelivery of the same event is a no-op.
/// assert!(!reconciler.apply(EntityKind::Node, "add", &add).is_applied());
/// assert!(registry.contains(DeviceId::new(7).unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler {
    registry: Arc<Registry>,
}

impl Reconciler {
    /// Creates a reconciler writing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this reconciler writes into.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Applies one routed event.
    pub fn apply(&self, kind: EntityKind, action: &str, envelope: &Envelope) -> Outcome {
        match kind {
            EntityKind::Node => match self.apply_node(action, envelope) {
                Ok(()) => Outcome::Applied,
                Err(e) => Outcome::Dropped(e),
            },
            EntityKind::Value => {
                // Value indexes are reserved but have no reconciliation rule yet.
                tracing::info!(
                    action = %action,
                    timestamp = envelope.timestamp(),
                    "Accepted value event"
                );
                Outcome::Deferred
            }
        }
    }

    fn apply_node(&self, action: &str, envelope: &Envelope) -> Result<(), Error> {
        let action: NodeAction = action.parse()?;
        let timestamp = envelope.timestamp();

        match action {
            NodeAction::Add => {
                let node: NodeRef = envelope.payload_as()?;
                self.add(device_id(node.id)?, timestamp)?;
            }
            NodeAction::Available => {
                let node: NodeAvailable = envelope.payload_as()?;
                self.available(device_id(node.id)?, timestamp, node.info)?;
            }
            NodeAction::Ready => {
                let node: NodeRef = envelope.payload_as()?;
                self.ready(device_id(node.id)?, timestamp)?;
            }
            NodeAction::Remove => {
                let node: NodeRef = envelope.payload_as()?;
                self.remove(device_id(node.id)?, timestamp)?;
            }
        }
        Ok(())
    }

    fn add(&self, id: DeviceId, timestamp: i64) -> Result<(), Rejection> {
        let mut registry = self.registry.write();

        if let Some(last_applied) = registry.last_applied(id)
            && timestamp <= last_applied
        {
            // A live record means redelivery; no record means a replay from
            // before the device was removed.
            return Err(if registry.contains(id) {
                Rejection::Duplicate {
                    id,
                    timestamp,
                    last_applied,
                }
            } else {
                Rejection::Stale {
                    id,
                    timestamp,
                    last_applied,
                }
            });
        }

        let replaced = registry.install(DeviceRecord::new(id, Utc::now()), timestamp);
        if replaced.is_some() {
            tracing::info!(device = %id, timestamp, "Device re-added, record reset");
        } else {
            tracing::debug!(device = %id, timestamp, "Device added");
        }
        Ok(())
    }

    fn available(&self, id: DeviceId, timestamp: i64, info: DeviceInfo) -> Result<(), Rejection> {
        let mut registry = self.registry.write();
        ensure_fresh(&registry, id, timestamp)?;

        let now = Utc::now();
        registry.update(id, timestamp, |record| {
            record.info = info;
            record.last_seen = now;
        });
        tracing::debug!(device = %id, timestamp, "Device available");
        Ok(())
    }

    fn ready(&self, id: DeviceId, timestamp: i64) -> Result<(), Rejection> {
        let mut registry = self.registry.write();
        ensure_fresh(&registry, id, timestamp)?;

        let now = Utc::now();
        registry.update(id, timestamp, |record| {
            record.ready = true;
            record.last_seen = now;
        });
        tracing::debug!(device = %id, timestamp, "Device ready");
        Ok(())
    }

    fn remove(&self, id: DeviceId, timestamp: i64) -> Result<(), Rejection> {
        let mut registry = self.registry.write();
        ensure_fresh(&registry, id, timestamp)?;

        registry.remove(id, timestamp);
        tracing::debug!(device = %id, timestamp, "Device removed");
        Ok(())
    }
}

impl EventHandler for Reconciler {
    fn handle_node_event(&self, action: &str, envelope: &Envelope) -> Outcome {
        self.apply(EntityKind::Node, action, envelope)
    }

    fn handle_value_event(&self, action: &str, envelope: &Envelope) -> Outcome {
        self.apply(EntityKind::Value, action, envelope)
    }
}

fn device_id(raw: i64) -> Result<DeviceId, Rejection> {
    DeviceId::try_from(raw).map_err(|_| Rejection::InvalidId(raw))
}

/// Requires a live record whose last-applied timestamp is older than `timestamp`.
fn ensure_fresh(
    registry: &RegistryWriter<'_>,
    id: DeviceId,
    timestamp: i64,
) -> Result<(), Rejection> {
    if !registry.contains(id) {
        return Err(Rejection::Stray { id });
    }
    match registry.last_applied(id) {
        Some(last_applied) if timestamp <= last_applied => Err(Rejection::Stale {
            id,
            timestamp,
            last_applied,
        }),
        _ => Ok(()),
    }
}
