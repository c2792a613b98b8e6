use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::catalog::Catalog;
use crate::decode::{DecodeOptions, UnknownEntityPolicy, DEFAULT_SLACK_PREFIX};
use crate::error::{PlannerError, Result};

pub const DEFAULT_PORT: u16 = 8080;

/// Runtime settings: defaults, then `PLANNER_*` environment variables,
/// then command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub slack_prefix: String,
    pub unknown_entities: UnknownEntityPolicy,
    /// CSV catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    pub port: u16,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            slack_prefix: DEFAULT_SLACK_PREFIX.to_string(),
            unknown_entities: UnknownEntityPolicy::default(),
            catalog_path: None,
            port: DEFAULT_PORT,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PlannerConfig::default();

        if let Some(prefix) = lookup("PLANNER_SLACK_PREFIX") {
            config.slack_prefix = prefix;
        }
        if let Some(policy) = lookup("PLANNER_UNKNOWN_ENTITIES") {
            config.unknown_entities = policy.parse().map_err(PlannerError::Validation)?;
        }
        if let Some(path) = lookup("PLANNER_CATALOG").filter(|p| !p.trim().is_empty()) {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(port) = lookup("PLANNER_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| PlannerError::Validation(format!("PLANNER_PORT '{}' is not a port", port)))?;
        }

        Ok(config)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            slack_prefix: self.slack_prefix.clone(),
            unknown_entities: self.unknown_entities,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_csv(path),
            None => {
                info!("using built-in course catalog");
                Ok(Catalog::purdue_cs())
            }
        }
    }
}
