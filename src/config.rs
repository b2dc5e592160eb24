//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserialises into strongly-typed structs.
//! The bearer token is never stored here; it lives in the persisted
//! session and is resolved at the application boundary.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::types::BettingLimits;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub limits: LimitsConfig,
    pub shop: ShopConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Default stake bounds; per-user limits from the server override these.
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub min_stake: Decimal,
    pub max_stake: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShopConfig {
    pub currency: String,
    pub default_stake: Decimal,
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn betting_limits(&self) -> BettingLimits {
        BettingLimits {
            min_stake: self.limits.min_stake,
            max_stake: self.limits.max_stake,
        }
    }
}
