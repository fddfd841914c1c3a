// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry.
//!
//! The [`Registry`] holds one [`DeviceRecord`] per tracked device together
//! with the logical timestamp of the last event applied to each id. It lives
//! for the whole process and is never persisted.
//!
//! # Examples
//!
//! ```
//! use nodewatch::registry::{Registry, RemovalPolicy};
//!
//! let registry = Registry::with_policy(RemovalPolicy::Retain);
//! assert!(registry.is_empty());
//! assert!(registry.snapshot().is_empty());
//! ```

mod device_id;
mod device_record;
mod store;

pub use device_id::DeviceId;
pub use device_record::{DeviceClass, DeviceInfo, DeviceRecord, NodeCapabilities, NodeState};
pub use store::{Registry, RemovalPolicy};

pub(crate) use store::RegistryWriter;
