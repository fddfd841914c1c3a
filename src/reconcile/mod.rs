// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event reconciliation.
//!
//! | Action      | Precondition                                  | Effect                          |
//! |-------------|-----------------------------------------------|---------------------------------|
//! | `add`       | id > 0, timestamp newer than last applied     | fresh default record            |
//! | `available` | live record, timestamp newer than last applied| `info` replaced, `last_seen`    |
//! | `ready`     | live record, timestamp newer than last applied| `ready = true`, `last_seen`     |
//! | `remove`    | live record, timestamp newer than last applied| record deleted                  |
//!
//! Anything that fails its precondition is dropped and logged.

mod node_action;
mod reconciler;

pub use node_action::NodeAction;
pub use reconciler::Reconciler;
