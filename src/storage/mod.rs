//! Persistence layer.
//!
//! Saves and loads the shop settings and the session record as JSON
//! files. Settings merge with defaults on load: fields missing from an
//! older file simply take their default values, so upgrades never
//! require a migration step.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::api::session::PersistedSession;

const DEFAULT_SETTINGS_FILE: &str = "shop_settings.json";
const DEFAULT_SESSION_FILE: &str = "shop_session.json";

// ---------------------------------------------------------------------------
// Shop settings
// ---------------------------------------------------------------------------

/// Cached application settings. Every field has a default so a partial
/// or empty file still loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShopSettings {
    pub printer_name: String,
    pub theme: String,
    pub default_stake: Decimal,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            printer_name: String::new(),
            theme: "light".to_string(),
            default_stake: dec!(200),
        }
    }
}

/// Save settings to a JSON file.
pub fn save_settings(settings: &ShopSettings, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_FILE);
    let json = serde_json::to_string_pretty(settings)
        .context("Failed to serialise shop settings")?;

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write settings to {path}"))?;

    debug!(path, "Settings saved");
    Ok(())
}

/// Load settings, merging with defaults. A missing file yields the
/// defaults outright.
pub fn load_settings(path: Option<&str>) -> Result<ShopSettings> {
    let path = path.unwrap_or(DEFAULT_SETTINGS_FILE);

    if !Path::new(path).exists() {
        info!(path, "No settings file found, using defaults");
        return Ok(ShopSettings::default());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {path}"))?;

    let settings: ShopSettings = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse settings from {path}"))?;

    debug!(path, "Settings loaded");
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Session record
// ---------------------------------------------------------------------------

/// Save the session record after login or refresh.
pub fn save_session(session: &PersistedSession, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SESSION_FILE);
    let json = serde_json::to_string_pretty(session)
        .context("Failed to serialise session")?;

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write session to {path}"))?;

    debug!(path, "Session saved");
    Ok(())
}

/// Load the persisted session. Returns None when no session file
/// exists (logged out).
pub fn load_session(path: Option<&str>) -> Result<Option<PersistedSession>> {
    let path = path.unwrap_or(DEFAULT_SESSION_FILE);

    if !Path::new(path).exists() {
        info!(path, "No session file found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {path}"))?;

    let session: PersistedSession = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse session from {path}"))?;

    Ok(Some(session))
}

/// Delete the session file (logout).
pub fn delete_session(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SESSION_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete session file {path}"))?;
        info!(path, "Session deleted");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
