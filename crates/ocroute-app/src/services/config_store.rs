// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `config.json` persistence for the operator's last-used folders.

use std::path::Path;

use ocroute_core::AppConfig;
use ocroute_core::error::Result;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.json";

/// Read the saved config. A missing or unreadable file yields `None`.
pub fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded saved configuration");
            Some(config)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring corrupt configuration file");
            None
        }
    }
}

pub fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
