// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-memory device registry.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use super::{DeviceId, DeviceRecord};

/// What happens to a device's last-applied timestamp when it is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Keep the timestamp so late replays of older events stay stale.
    #[default]
    Retain,
    /// Forget the timestamp together with the record.
    ///
    /// A replayed `add` older than the removal will then recreate the device.
    Purge,
}

/// In-memory store of device records.
///
/// Besides the records themselves the registry tracks, per device id, the
/// logical timestamp of the most recent event applied to it. Mutation is
/// reserved to the reconciler; everything public here is a read that copies
/// data out under the lock, so callers always see a consistent snapshot.
#[derive(Debug, Default)]
pub struct Registry {
    tables: RwLock<Tables>,
    policy: RemovalPolicy,
}

#[derive(Debug, Default)]
struct Tables {
    devices: HashMap<DeviceId, DeviceRecord>,
    last_applied: HashMap<DeviceId, i64>,
    values: ValueIndexes,
}

/// Value indexes, keyed per node, per command class and per value id.
///
/// Reserved for value events; nothing populates them yet.
#[derive(Debug, Default)]
struct ValueIndexes {
    per_node: HashMap<DeviceId, Vec<serde_json::Value>>,
    per_class: HashMap<u32, Vec<serde_json::Value>>,
    per_id: HashMap<String, serde_json::Value>,
}

impl ValueIndexes {
    fn len(&self) -> usize {
        self.per_node.values().map(Vec::len).sum::<usize>()
            + self.per_class.values().map(Vec::len).sum::<usize>()
            + self.per_id.len()
    }
}

impl Registry {
    /// Creates an empty registry that retains timestamps on removal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given removal policy.
    #[must_use]
    pub fn with_policy(policy: RemovalPolicy) -> Self {
        Self {
            tables: RwLock::default(),
            policy,
        }
    }

    /// Returns the removal policy.
    #[must_use]
    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    /// Returns the number of live device records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().devices.len()
    }

    /// Returns `true` if no device is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.read().devices.is_empty()
    }

    /// Returns `true` if a record exists for `id`.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.tables.read().devices.contains_key(&id)
    }

    /// Returns a copy of the record for `id`.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<DeviceRecord> {
        self.tables.read().devices.get(&id).cloned()
    }

    /// Returns a copy of every record, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        let mut records: Vec<_> = self.tables.read().devices.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Returns the logical timestamp of the last event applied to `id`.
    ///
    /// Under [`RemovalPolicy::Retain`] this survives the removal of the record.
    #[must_use]
    pub fn last_applied(&self, id: DeviceId) -> Option<i64> {
        self.tables.read().last_applied.get(&id).copied()
    }

    /// Returns the total number of entries across the value indexes.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.tables.read().values.len()
    }

    /// Locks the registry for a check-and-apply sequence.
    pub(crate) fn write(&self) -> RegistryWriter<'_> {
        RegistryWriter {
            tables: self.tables.write(),
            policy: self.policy,
        }
    }
}

/// Exclusive access to the registry for the duration of one event.
pub(crate) struct RegistryWriter<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    policy: RemovalPolicy,
}

impl RegistryWriter<'_> {
    pub(crate) fn contains(&self, id: DeviceId) -> bool {
        self.tables.devices.contains_key(&id)
    }

    pub(crate) fn last_applied(&self, id: DeviceId) -> Option<i64> {
        self.tables.last_applied.get(&id).copied()
    }

    /// Installs `record`, replacing any previous one, and records `timestamp`.
    ///
    /// Returns the replaced record.
    pub(crate) fn install(&mut self, record: DeviceRecord, timestamp: i64) -> Option<DeviceRecord> {
        let id = record.id;
        self.tables.last_applied.insert(id, timestamp);
        self.tables.devices.insert(id, record)
    }

    /// Mutates the record for `id` and records `timestamp`.
    ///
    /// Returns `false` without touching the timestamp if no record exists.
    pub(crate) fn update<F>(&mut self, id: DeviceId, timestamp: i64, f: F) -> bool
    where
        F: FnOnce(&mut DeviceRecord),
    {
        let Some(record) = self.tables.devices.get_mut(&id) else {
            return false;
        };
        f(record);
        self.tables.last_applied.insert(id, timestamp);
        true
    }

    /// Deletes the record for `id`, applying the removal policy to its timestamp.
    pub(crate) fn remove(&mut self, id: DeviceId, timestamp: i64) -> Option<DeviceRecord> {
        let removed = self.tables.devices.remove(&id)?;
        match self.policy {
            RemovalPolicy::Retain => {
                self.tables.last_applied.insert(id, timestamp);
            }
            RemovalPolicy::Purge => {
                self.tables.last_applied.remove(&id);
            }
        }
        Some(removed)
    }
}
