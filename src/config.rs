//! Configuration file handling.
//!
//! The configuration is a JSON document:
//!
//! ```json
//! {
//!   "backend": "udisks2",
//!   "device": { "vendor": "SanDisk", "serial": "4C530001" }
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::device::DeviceDefinition;
use crate::matcher::Backend;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub device: DeviceDefinition,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config JSON")
    }

    /// Load from `path` when given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = Config::parse(
            r#"{"backend": "udisks1", "device": {"serial": "ABC123", "volume_uuid": "6f3a"}}"#,
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Udisks1);
        assert_eq!(config.device.serial.as_deref(), Some("ABC123"));
        assert_eq!(config.device.volume_uuid.as_deref(), Some("6f3a"));
    }

    #[test]
    fn test_parse_empty_object_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Udisks2);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Config::parse(r#"{"backend": "hal"}"#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::parse(r#"{"devices": {}}"#).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Config::load(Path::new("/nonexistent/usbmatch.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_no_path_gives_default() {
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
