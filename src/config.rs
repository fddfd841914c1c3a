// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service configuration.
//!
//! Configuration is a JSON document with three optional sections. Anything
//! left out keeps its default:
//!
//! ```json
//! {
//!   "mqtt": { "host": "localhost", "port": 1883, "namespace": "ozw" },
//!   "server": { "host": "0.0.0.0", "port": 1337 },
//!   "registry": { "removal_policy": "retain" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::RemovalPolicy;

/// Complete service configuration.
///
/// # Examples
///
/// ```
/// use nodewatch::config::Config;
///
/// let config = Config::from_json(r#"{"mqtt": {"namespace": "zwave"}}"#).unwrap();
/// assert_eq!(config.mqtt.namespace, "zwave");
/// assert_eq!(config.mqtt.port, 1883);
/// assert_eq!(config.server.port, 1337);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broker connection and topic namespace.
    pub mqtt: MqttConfig,
    /// HTTP API listener.
    pub server: ServerConfig,
    /// Registry behavior.
    pub registry: RegistryConfig,
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist,
    /// [`ConfigError::Empty`] if it has no content, [`ConfigError::Io`] if it
    /// cannot be read and [`ConfigError::Json`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        if raw.trim().is_empty() {
            return Err(ConfigError::Empty(path.to_path_buf()));
        }

        let config = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads configuration from `path`, or returns defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Config::load`] when a path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::info!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not a valid configuration.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::from)
    }
}

/// MQTT broker connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic namespace the service consumes.
    pub namespace: String,
    /// Optional username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional password; never serialized.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// MQTT keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// How long to wait for the broker to acknowledge the connection, in seconds.
    pub connection_timeout_secs: u64,
}

impl MqttConfig {
    /// Returns the broker URI, e.g. `mqtt://localhost:1883`.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the credentials when both username and password are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            namespace: "ozw".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            connection_timeout_secs: 10,
        }
    }
}

impl std::fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

/// HTTP API listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl ServerConfig {
    /// Returns `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1337,
        }
    }
}

/// Registry settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// What removal does to a device's last-applied timestamp.
    pub removal_policy: RemovalPolicy,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// Writes `contents` to a unique file in the temp directory.
    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "nodewatch-{}-{}-{name}",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.namespace, "ozw");
        assert_eq!(config.mqtt.uri(), "mqtt://localhost:1883");
        assert_eq!(config.mqtt.keep_alive(), Duration::from_secs(30));
        assert_eq!(config.mqtt.connection_timeout(), Duration::from_secs(10));
        assert_eq!(config.server.bind_addr(), "0.0.0.0:1337");
        assert_eq!(config.registry.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config =
            Config::from_json(r#"{"mqtt": {"host": "broker.lan"}, "server": {"port": 8080}}"#)
                .unwrap();
        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.namespace, "ozw");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn removal_policy_from_json() {
        let config = Config::from_json(r#"{"registry": {"removal_policy": "purge"}}"#).unwrap();
        assert_eq!(config.registry.removal_policy, RemovalPolicy::Purge);
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(matches!(
            Config::from_json(r#"{"mqtt": {"port": "high"}}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn credentials_need_both_parts() {
        let mut mqtt = MqttConfig {
            username: Some("user".to_string()),
            ..MqttConfig::default()
        };
        assert!(mqtt.credentials().is_none());

        mqtt.password = Some("secret".to_string());
        assert_eq!(mqtt.credentials(), Some(("user", "secret")));
    }

    #[test]
    fn password_is_never_exposed() {
        let config = Config::from_json(
            r#"{"mqtt": {"username": "user", "password": "hunter2"}}"#,
        )
        .unwrap();
        assert_eq!(config.mqtt.password.as_deref(), Some("hunter2"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"username\":\"user\""));

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn debug_shows_effective_settings() {
        let config = Config::from_json(
            r#"{"mqtt": {"namespace": "house", "password": "hunter2"}, "registry": {"removal_policy": "purge"}}"#,
        )
        .unwrap();

        let debug = format!("{config:?}");
        assert!(debug.contains("namespace: \"house\""));
        assert!(debug.contains("password: Some(\"***\")"));
        assert!(debug.contains("port: 1337"));
        assert!(debug.contains("Purge"));
    }

    #[test]
    fn load_from_file() {
        let path = temp_file("valid.json", r#"{"mqtt": {"namespace": "house"}}"#);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.mqtt.namespace, "house");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn load_missing_file() {
        let path = std::env::temp_dir().join("nodewatch-definitely-missing.json");
        assert!(matches!(Config::load(&path), Err(ConfigError::NotFound(p)) if p == path));
    }

    #[test]
    fn load_empty_file() {
        let path = temp_file("empty.json", "  \n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Empty(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn load_or_default_without_path() {
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
