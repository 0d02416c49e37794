// ⚙️ Interpreter configuration
//
// Sources, highest priority first:
// 1. Environment (OCCURRENCE_DATE_ORDER, OCCURRENCE_CLUSTER_STRATEGY)
// 2. TOML file (explicit path, else OCCURRENCE_CONFIG)
// 3. Defaults
//
// Read once at startup. Interpreters take their section by value.

use crate::deduplication::ClusterStrategy;
use crate::error::Error;
use crate::temporal::DateOrder;
use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "OCCURRENCE_CONFIG";
pub const DATE_ORDER_ENV: &str = "OCCURRENCE_DATE_ORDER";
pub const CLUSTER_STRATEGY_ENV: &str = "OCCURRENCE_CLUSTER_STRATEGY";

const DEFAULT_MIN_YEAR: i32 = 1600;
const DEFAULT_CACHE_CAPACITY: usize = 100_000;

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Resolves numeric day/month order instead of flagging it
    pub date_order: Option<DateOrder>,
    pub min_year: i32,
    pub max_year: i32,
    pub memoize: bool,
    pub cache_capacity: usize,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        TemporalConfig {
            date_order: None,
            min_year: DEFAULT_MIN_YEAR,
            max_year: chrono::Utc::now().year() + 1,
            memoize: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Reference table overrides; built-in tables are used when unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub countries_file: Option<PathBuf>,
    pub bounds_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub strategy: ClusterStrategy,
}

// ============================================================================
// INTERPRETER CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub temporal: TemporalConfig,
    pub location: LocationConfig,
    pub clustering: ClusteringConfig,
}

impl InterpreterConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: InterpreterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Full resolution: file (explicit or from env), then env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading configuration");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from any key → value source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DATE_ORDER_ENV) {
            let order = DateOrder::from_name(&value).ok_or_else(|| {
                Error::Config(format!("{} must be dmy or mdy, got {:?}", DATE_ORDER_ENV, value))
            })?;
            self.temporal.date_order = Some(order);
        }

        if let Some(value) = lookup(CLUSTER_STRATEGY_ENV) {
            self.clustering.strategy = ClusterStrategy::from_name(&value).ok_or_else(|| {
                Error::Config(format!(
                    "{} must be first-match or transitive, got {:?}",
                    CLUSTER_STRATEGY_ENV, value
                ))
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.temporal.min_year > self.temporal.max_year {
            return Err(Error::Config(format!(
                "min_year {} is after max_year {}",
                self.temporal.min_year, self.temporal.max_year
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
