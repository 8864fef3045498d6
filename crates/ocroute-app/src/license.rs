// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup gate: a local activation record that must exist and be unexpired
// before any document is touched.

use std::path::Path;

use chrono::NaiveDateTime;
use ocroute_core::error::{OcrouteError, Result};
use serde::{Deserialize, Serialize};

pub const LICENSE_FILE: &str = "license.json";

/// Contents of `license.json`, written at activation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub code: String,
    /// Installation identifier sent with the activation request.
    pub uuid: String,
    /// ISO-8601 local time, e.g. `2025-05-12T10:30:00.123456`.
    pub activation_date: NaiveDateTime,
    pub expires_on: NaiveDateTime,
}

impl LicenseRecord {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_on < now
    }
}

/// Load the record at `path` and check it against `now`.
pub fn check_license(path: &Path, now: NaiveDateTime) -> Result<LicenseRecord> {
    let data = std::fs::read_to_string(path).map_err(|err| {
        OcrouteError::License(format!("no activation record at {} ({err})", path.display()))
    })?;
    let record: LicenseRecord = serde_json::from_str(&data).map_err(|err| {
        OcrouteError::License(format!("activation record {} is unreadable: {err}", path.display()))
    })?;
    if record.code.trim().is_empty() {
        return Err(OcrouteError::License("activation record has no license code".into()));
    }
    if record.is_expired(now) {
        return Err(OcrouteError::License(format!(
            "license expired on {}",
            record.expires_on.format("%d-%m-%Y")
        )));
    }
    Ok(record)
}
