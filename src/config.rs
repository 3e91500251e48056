//! Engine configuration.
//!
//! Values come from a JSON file (every field optional) and can be overridden
//! per process through environment variables:
//!
//! | variable                    | field                 |
//! |-----------------------------|-----------------------|
//! | `COMBISHIFT_TOP_K`          | `top_k`               |
//! | `COMBISHIFT_MAX_NODES`      | `search.max_nodes`    |
//! | `COMBISHIFT_TIME_LIMIT_MS`  | `search.time_limit_ms`|
//! | `COMBISHIFT_WORKERS`        | `search.workers`      |
//!
//! A `.env` file in the working directory is honoured.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::algorithm::budget::SearchBudget;
use crate::algorithm::scoring::ScoringConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {var}: '{value}'")]
    BadEnv { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Search limits as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_nodes: Option<u64>,
    pub time_limit_ms: Option<u64>,
    /// 0 = one worker per CPU.
    pub workers: usize,
    /// Try emptier sections first within each course.
    pub order_by_enrollment: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_nodes: None, time_limit_ms: None, workers: 1, order_by_enrollment: true }
    }
}

impl SearchConfig {
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_nodes: self.max_nodes,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            workers: self.workers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub top_k: usize,
    pub search: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { scoring: ScoringConfig::default(), top_k: 20, search: SearchConfig::default() }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// File (or defaults), then `.env`, then process environment. Validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        let _ = dotenv::dotenv();
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from `lookup` (normally `std::env::var`). Injected so
    /// tests never touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn num<T: std::str::FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
            raw.trim().parse().map_err(|_| ConfigError::BadEnv { var, value: raw })
        }

        if let Some(v) = lookup("COMBISHIFT_TOP_K") {
            self.top_k = num("COMBISHIFT_TOP_K", v)?;
        }
        if let Some(v) = lookup("COMBISHIFT_MAX_NODES") {
            self.search.max_nodes = Some(num("COMBISHIFT_MAX_NODES", v)?);
        }
        if let Some(v) = lookup("COMBISHIFT_TIME_LIMIT_MS") {
            self.search.time_limit_ms = Some(num("COMBISHIFT_TIME_LIMIT_MS", v)?);
        }
        if let Some(v) = lookup("COMBISHIFT_WORKERS") {
            self.search.workers = num("COMBISHIFT_WORKERS", v)?;
        }
        debug!(top_k = self.top_k, search = ?self.search, "config overrides applied");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be greater than zero".into()));
        }
        for (name, w) in self.scoring.weights.named() {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!("weight {} must be finite and non-negative, got {}", name, w)));
            }
        }
        if let Some(b) = &self.scoring.mandatory_break {
            if b.end <= b.start {
                return Err(ConfigError::Invalid("mandatory_break must end after it starts".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"top_k": 5, "scoring": {"weights": {"modality": 3}}}"#).unwrap();
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.scoring.weights.modality, 3.0);
        assert_eq!(cfg.scoring.weights.availability, 5.0);
        assert_eq!(cfg.scoring.gap_grace_minutes, 20);
        assert!(cfg.search.order_by_enrollment);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut cfg = EngineConfig::default();
        let err = cfg
            .apply_overrides(|k| (k == "COMBISHIFT_WORKERS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadEnv { var: "COMBISHIFT_WORKERS", .. }));
    }
}
