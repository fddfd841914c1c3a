// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::str::FromStr;

use crate::error::Rejection;

/// Node lifecycle actions the reconciler knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAction {
    /// A device joined (or rejoined) the network.
    Add,
    /// The device's descriptive metadata is known.
    Available,
    /// The device finished its interview.
    Ready,
    /// The device left the network.
    Remove,
}

impl NodeAction {
    /// Returns the topic name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Available => "available",
            Self::Ready => "ready",
            Self::Remove => "remove",
        }
    }
}

impl FromStr for NodeAction {
    type Err = Rejection;

    /// Parses an action name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Add, Self::Available, Self::Ready, Self::Remove]
            .into_iter()
            .find(|action| s.eq_ignore_ascii_case(action.as_str()))
            .ok_or_else(|| Rejection::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for NodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_actions() {
        assert_eq!("add".parse::<NodeAction>(), Ok(NodeAction::Add));
        assert_eq!("available".parse::<NodeAction>(), Ok(NodeAction::Available));
        assert_eq!("ready".parse::<NodeAction>(), Ok(NodeAction::Ready));
        assert_eq!("remove".parse::<NodeAction>(), Ok(NodeAction::Remove));
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!("READY".parse::<NodeAction>(), Ok(NodeAction::Ready));
        assert_eq!("Remove".parse::<NodeAction>(), Ok(NodeAction::Remove));
    }

    #[test]
    fn parse_unknown_action() {
        assert_eq!(
            "dead".parse::<NodeAction>(),
            Err(Rejection::UnknownAction("dead".to_string()))
        );
        assert!("".parse::<NodeAction>().is_err());
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(NodeAction::Available.to_string(), "available");
    }
}
