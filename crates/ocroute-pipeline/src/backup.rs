// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-of-batch backup: verbatim copies of every discovered original in
// `<output>/backup<YYYYMMDD_HHMM>/`, each verified by SHA-256.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ocroute_core::error::{OcrouteError, Result};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

/// What the backup step did.
#[derive(Debug, Default)]
pub struct BackupReport {
    pub folder: PathBuf,
    /// Verified copies inside `folder`.
    pub copied: Vec<PathBuf>,
    /// Originals that could not be copied or did not verify.
    pub failures: Vec<OcrouteError>,
}

/// Backup folder name for a batch finishing at `now`.
pub fn backup_folder_name(now: NaiveDateTime) -> String {
    format!("backup{}", now.format("%Y%m%d_%H%M"))
}

/// Copy `originals` into a timestamped folder under `output_dir`.
///
/// Only failing to create the folder is an error; per-file problems are
/// collected in the report. Existing copies with the same name are replaced.
#[instrument(skip(originals), fields(output = %output_dir.display(), files = originals.len()))]
pub fn create_backup(
    output_dir: &Path,
    originals: &[PathBuf],
    now: NaiveDateTime,
) -> Result<BackupReport> {
    let folder = output_dir.join(backup_folder_name(now));
    std::fs::create_dir_all(&folder).map_err(|err| OcrouteError::Backup {
        path: folder.display().to_string(),
        reason: err.to_string(),
    })?;

    let mut report = BackupReport {
        folder,
        ..BackupReport::default()
    };
    for original in originals {
        match copy_verified(original, &report.folder) {
            Ok(copy) => report.copied.push(copy),
            Err(err) => {
                warn!(file = %original.display(), error = %err, "Backup copy failed");
                report.failures.push(err);
            }
        }
    }

    info!(
        folder = %report.folder.display(),
        copied = report.copied.len(),
        failed = report.failures.len(),
        "Backup complete"
    );
    Ok(report)
}

fn copy_verified(original: &Path, folder: &Path) -> Result<PathBuf> {
    let backup_error = |reason: String| OcrouteError::Backup {
        path: original.display().to_string(),
        reason,
    };
    let name = original
        .file_name()
        .ok_or_else(|| backup_error("path has no file name".into()))?;
    let target = folder.join(name);

    std::fs::copy(original, &target).map_err(|err| backup_error(err.to_string()))?;

    let expected = hash_file(original).map_err(|err| backup_error(err.to_string()))?;
    let actual = hash_file(&target).map_err(|err| backup_error(err.to_string()))?;
    if expected != actual {
        return Err(backup_error(format!(
            "copy does not match original (expected {expected}, got {actual})"
        )));
    }
    Ok(target)
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
