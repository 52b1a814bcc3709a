//! Server settings: client version policy and caller security profiles.
//!
//! Settings are parsed from TOML:
//!
//! ```toml
//! [global]
//! update_app_url = "https://example.com/app"
//! version = { code = 42, name = "4.2" }
//!
//! [security.profiles.kiosk]
//! ips = ["10.0.0.7"]
//!
//! [security.profiles.legacy]
//! denied = true
//!
//! [security.actions]
//! Login = ["kiosk", "legacy"]
//! ```

use crate::entities::Version;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Settings error.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The document is not valid settings TOML.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// The settings file could not be read.
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Client version policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Minimum supported client version; `None` disables the check.
    #[serde(default)]
    pub version: Option<Version>,
    /// Where outdated clients should download the update.
    #[serde(default)]
    pub update_app_url: String,
}

/// A restricted caller profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// IPs allowed to use the profile. Empty allows every IP.
    #[serde(default)]
    pub ips: Vec<String>,
    /// Deny the profile outright.
    #[serde(default)]
    pub denied: bool,
}

/// Caller profiles and the actions they restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Profiles by caller type.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
    /// Restricted caller types by action name.
    #[serde(default)]
    pub actions: HashMap<String, Vec<String>>,
}

impl SecuritySettings {
    /// The profile restricting `caller_type` on `action`, if any.
    #[must_use]
    pub fn restriction(&self, action: &str, caller_type: &str) -> Option<&Profile> {
        self.actions
            .get(action)?
            .iter()
            .find(|p| *p == caller_type)
            .and_then(|p| self.profiles.get(p))
    }
}

/// Everything a [`SettingsProvider`] serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Version policy.
    #[serde(default)]
    pub global: GlobalSettings,
    /// Security profiles.
    #[serde(default)]
    pub security: SecuritySettings,
}

impl ServerSettings {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Source of the current server settings.
pub trait SettingsProvider: Send + Sync {
    /// Current settings snapshot.
    fn settings(&self) -> Arc<ServerSettings>;
}

/// In-memory provider whose snapshot can be swapped at runtime.
#[derive(Debug, Default)]
pub struct StaticSettingsProvider {
    current: RwLock<Arc<ServerSettings>>,
}

impl StaticSettingsProvider {
    /// Provider serving `settings`.
    #[must_use]
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Replace the snapshot. Readers holding the old one keep it.
    pub fn reload(&self, settings: ServerSettings) {
        *self.current.write() = Arc::new(settings);
    }

    /// Parse `s` and replace the snapshot. On error the old snapshot stays.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] on malformed input.
    pub fn reload_from_toml(&self, s: &str) -> Result<(), SettingsError> {
        let settings = ServerSettings::from_toml_str(s)?;
        self.reload(settings);
        Ok(())
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn settings(&self) -> Arc<ServerSettings> {
        Arc::clone(&self.current.read())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const DOC: &str = r#"
[global]
update_app_url = "https://example.com/app"
version = { code = 42, name = "4.2" }

[security.profiles.kiosk]
ips = ["10.0.0.7"]

[security.profiles.legacy]
denied = true

[security.actions]
Login = ["kiosk", "legacy"]
"#;

    #[test]
    fn test_parse() {
        let settings = ServerSettings::from_toml_str(DOC).unwrap();
        assert_eq!(settings.global.version, Some(Version::new(42, "4.2")));
        assert_eq!(settings.global.update_app_url, "https://example.com/app");
        assert!(settings.security.profiles["legacy"].denied);
        assert_eq!(settings.security.profiles["kiosk"].ips, vec!["10.0.0.7"]);
    }

    #[test]
    fn test_restriction_lookup() {
        let security = ServerSettings::from_toml_str(DOC).unwrap().security;
        assert!(security.restriction("Login", "kiosk").is_some());
        assert!(security.restriction("Login", "browser").is_none());
        assert!(security.restriction("Logout", "kiosk").is_none());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ServerSettings::from_toml_str("").unwrap(), ServerSettings::default());
    }

    #[test]
    fn test_reload_keeps_old_snapshot_on_error() {
        let provider = StaticSettingsProvider::default();
        let before = provider.settings();
        provider.reload_from_toml(DOC).unwrap();
        assert!(before.global.version.is_none());
        assert!(provider.settings().global.version.is_some());

        assert!(provider.reload_from_toml("[global").is_err());
        assert!(provider.settings().global.version.is_some());
    }
}
