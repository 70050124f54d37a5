//! Dashboard Configuration
//! Optional JSON settings file; every field has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "behaviour_dashboard.json";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "BEHAVIOUR_DASHBOARD_CONFIG";

/// How to read ambiguous numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// 03/04/2024 is 3 April
    DayFirst,
    /// 03/04/2024 is 4 March
    #[default]
    MonthFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Rows polars scans to infer CSV column types.
    #[serde(default = "default_infer_schema_length")]
    pub infer_schema_length: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub date_order: DateOrder,
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

fn default_infer_schema_length() -> usize {
    10_000
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_window_size() -> [f32; 2] {
    [1400.0, 800.0]
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            infer_schema_length: default_infer_schema_length(),
            http_timeout_secs: default_http_timeout_secs(),
            date_order: DateOrder::default(),
            window_size: default_window_size(),
        }
    }
}

impl DashboardConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid dashboard config")
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the config location and load it.
    ///
    /// An explicit `BEHAVIOUR_DASHBOARD_CONFIG` path must exist. The default
    /// file in the working directory is optional; defaults apply without it.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(&PathBuf::from(path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.date_order, DateOrder::MonthFirst);
    }

    #[test]
    fn overrides_selected_fields() {
        let config = DashboardConfig::from_json(
            r#"{"date_order": "day_first", "http_timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.date_order, DateOrder::DayFirst);
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.infer_schema_length, 10_000);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(DashboardConfig::from_json(r#"{"colour": "red"}"#).is_err());
    }
}
