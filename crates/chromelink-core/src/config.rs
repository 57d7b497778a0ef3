// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Handles below this value belong to the remote side's own allocator.
pub const DEFAULT_FIRST_HOST_HANDLE: u64 = 65_536;

/// First API level whose engine calls the request-shaped navigation hook.
pub const NAVIGATION_REQUEST_API_LEVEL: u32 = 24;

/// Bridge settings, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// First handle the registry hands out for host-created instances.
    pub first_host_handle: u64,
    /// API level at which the engine switches to request-shaped navigation
    /// callbacks.
    pub navigation_request_min_api: u32,
    /// API level reported by the host runtime.
    pub host_api_level: u32,
    /// Initial pre-decided return value for the file chooser.
    pub file_chooser_default_return: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            first_host_handle: DEFAULT_FIRST_HOST_HANDLE,
            navigation_request_min_api: NAVIGATION_REQUEST_API_LEVEL,
            host_api_level: 34,
            file_chooser_default_return: false,
            log_filter: "info".into(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_host_handle == 0 {
            return Err(BridgeError::Config(
                "first_host_handle must be greater than zero".into(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(BridgeError::Config("log_filter must not be empty".into()));
        }
        Ok(())
    }

    /// Whether the host engine uses the request-shaped navigation callback.
    pub fn uses_request_navigation(&self) -> bool {
        self.host_api_level >= self.navigation_request_min_api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_fills_defaults() {
        let config = BridgeConfig::from_json(r#"{ "host_api_level": 21 }"#).expect("parse");
        assert_eq!(config.host_api_level, 21);
        assert_eq!(config.first_host_handle, DEFAULT_FIRST_HOST_HANDLE);
        assert!(!config.uses_request_navigation());
        assert!(BridgeConfig::default().uses_request_navigation());
    }

    #[test]
    fn zero_first_handle_is_rejected() {
        let err = BridgeConfig::from_json(r#"{ "first_host_handle": 0 }"#)
            .expect_err("zero start must fail");
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "file_chooser_default_return": true, "log_filter": "debug" }}"#
        )
        .expect("write config");

        let config = BridgeConfig::load(file.path()).expect("load");
        assert!(config.file_chooser_default_return);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = BridgeConfig::load(dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
