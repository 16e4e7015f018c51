//! YAML configuration for the database target and inference defaults.
//!
//! ```yaml
//! database:
//!   path: warehouse.db
//! inference:
//!   sample_rows: 1
//!   varchar_limit: 254
//!   width_margin: 2
//!   row_policy: strict
//! ```
//!
//! Relative paths inside the file resolve against the file's own directory,
//! never against the process working directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify::{DEFAULT_VARCHAR_LIMIT, DEFAULT_WIDTH_MARGIN, TypeClassifier},
    error::{LoaderError, Result},
    infer::{InferOptions, RowPolicy},
};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub inference: InferenceConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    pub sample_rows: usize,
    pub varchar_limit: usize,
    pub width_margin: usize,
    pub row_policy: RowPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_rows: 1,
            varchar_limit: DEFAULT_VARCHAR_LIMIT,
            width_margin: DEFAULT_WIDTH_MARGIN,
            row_policy: RowPolicy::Strict,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let path = std::path::absolute(path)?;
        debug!("Read config file: {path:?}");
        let raw = fs::read_to_string(&path)
            .map_err(|err| LoaderError::config(&path, format!("cannot read file: {err}")))?;
        let mut config = Self::parse(&raw).map_err(|message| LoaderError::config(&path, message))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("Config: {config:?}");
        Ok(config)
    }

    /// Falls back to defaults when `path` does not exist and was not named
    /// explicitly by the caller.
    pub fn load_or_default(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            debug!("No config file at {path:?}; using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(raw).map_err(|err| err.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.inference.varchar_limit == 0 {
            return Err("inference.varchar_limit must be positive".to_string());
        }
        if let Some(path) = &self.database.path
            && path.as_os_str().is_empty()
        {
            return Err("database.path cannot be empty".to_string());
        }
        Ok(())
    }

    /// Absolute database path, resolved against the config file's directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = self.database.path.as_ref().ok_or_else(|| {
            LoaderError::config(
                self.base_dir.clone().unwrap_or_default(),
                "database.path is required to load data",
            )
        })?;
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.clone(),
        };
        Ok(std::path::absolute(resolved)?)
    }

    pub fn infer_options(&self) -> InferOptions {
        InferOptions {
            sample_rows: self.inference.sample_rows,
            width_margin: self.inference.width_margin,
            classifier: TypeClassifier::new(self.inference.varchar_limit),
            row_policy: self.inference.row_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse("").expect("parse");
        assert_eq!(config.infer_options(), InferOptions::default());
    }

    #[test]
    fn inference_overrides_are_applied() {
        let config = Config::parse(
            "inference:\n  sample_rows: 0\n  varchar_limit: 100\n  row_policy: lenient\n",
        )
        .expect("parse");
        let options = config.infer_options();
        assert_eq!(options.sample_rows, 0);
        assert_eq!(options.classifier.varchar_limit(), 100);
        assert_eq!(options.width_margin, DEFAULT_WIDTH_MARGIN);
        assert_eq!(options.row_policy, RowPolicy::Lenient);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse("mysql:\n  host: localhost\n").unwrap_err();
        assert!(err.contains("mysql"));
    }

    #[test]
    fn zero_varchar_limit_is_rejected() {
        assert!(Config::parse("inference:\n  varchar_limit: 0\n").is_err());
    }

    #[test]
    fn database_path_requires_value() {
        let err = Config::default().database_path().unwrap_err();
        assert!(matches!(err, LoaderError::Config { .. }));
    }
}
