// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Identifier of a tracked device, as assigned by the producer.
///
/// Ids are positive integers. A zero or negative id in an event is rejected
/// before it ever reaches the registry.
///
/// # Examples
///
/// ```
/// use nodewatch::registry::DeviceId;
///
/// let id = DeviceId::new(7).unwrap();
/// assert_eq!(id.get(), 7);
/// assert!(DeviceId::new(0).is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(NonZeroU32);

impl DeviceId {
    /// Creates a device identifier, returning `None` for zero.
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Returns the numeric id.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for DeviceId {
    type Error = ValueError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u32::try_from(raw)
            .ok()
            .and_then(Self::new)
            .ok_or(ValueError::InvalidDeviceId(raw))
    }
}

impl From<DeviceId> for u32 {
    fn from(id: DeviceId) -> Self {
        id.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_an_id() {
        assert!(DeviceId::new(0).is_none());
    }

    #[test]
    fn try_from_rejects_non_positive() {
        assert_eq!(DeviceId::try_from(0), Err(ValueError::InvalidDeviceId(0)));
        assert_eq!(
            DeviceId::try_from(-3),
            Err(ValueError::InvalidDeviceId(-3))
        );
    }

    #[test]
    fn try_from_rejects_overflow() {
        let raw = i64::from(u32::MAX) + 1;
        assert_eq!(
            DeviceId::try_from(raw),
            Err(ValueError::InvalidDeviceId(raw))
        );
    }

    #[test]
    fn try_from_accepts_positive() {
        let id = DeviceId::try_from(12).unwrap();
        assert_eq!(id.get(), 12);
    }

    #[test]
    fn debug_and_display() {
        let id = DeviceId::new(5).unwrap();
        assert_eq!(format!("{id:?}"), "DeviceId(5)");
        assert_eq!(id.to_string(), "5");
    }

    #[test]
    fn serializes_as_plain_number() {
        let id = DeviceId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let back: DeviceId = serde_json::from_str("9").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<DeviceId>("0").is_err());
    }

    #[test]
    fn ordered_by_number() {
        let mut ids = vec![DeviceId::new(3).unwrap(), DeviceId::new(1).unwrap()];
        ids.sort();
        assert_eq!(ids[0].get(), 1);
    }
}
