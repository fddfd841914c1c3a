// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only access to the registry.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::registry::{DeviceId, DeviceRecord, Registry};

/// Read-only view of the device registry for API consumers.
///
/// Cheap to clone; every clone observes the same registry. Reads copy
/// records out, so results never change after they are returned.
#[derive(Debug, Clone)]
pub struct DeviceQuery {
    registry: Arc<Registry>,
}

impl DeviceQuery {
    /// Creates a view over `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Returns every tracked device, ordered by id.
    #[must_use]
    pub fn list_devices(&self) -> Vec<DeviceRecord> {
        self.registry.snapshot()
    }

    /// Returns the device with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no record exists for `id`.
    pub fn get_device(&self, id: DeviceId) -> Result<DeviceRecord> {
        self.registry.get(id).ok_or(Error::DeviceNotFound(id))
    }

    /// Returns the number of tracked devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }
}
