// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact emission: one single-page PDF per confirmed code.
//
// Naming:
//   Plain        <output>/<CODE>.pdf
//   Timestamped  <output>/POD_<CODE>_<YYYYMMDDHHMM>.pdf
// With a per-document subfolder, <output> becomes <output>/<source stem>.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::RgbImage;
use ocroute_core::config::{NamingScheme, PipelineConfig};
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::ReviewedCode;
use ocroute_document::PdfWriter;
use tracing::{info, instrument, warn};

/// Outcome of emitting one document's artifacts.
#[derive(Debug, Default)]
pub struct EmissionReport {
    /// Artifacts written, in decision order.
    pub written: Vec<PathBuf>,
    /// Codes whose artifact could not be written.
    pub failures: Vec<OcrouteError>,
}

/// Writes output documents for confirmed codes.
pub struct ArtifactEmitter {
    output_dir: PathBuf,
    naming: NamingScheme,
    per_document_subfolder: bool,
}

impl ArtifactEmitter {
    pub fn new(output_dir: impl Into<PathBuf>, config: &PipelineConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            naming: config.naming,
            per_document_subfolder: config.per_document_subfolder,
        }
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    /// Folder that receives artifacts for `source_name`.
    pub fn target_dir(&self, source_name: &str) -> PathBuf {
        if !self.per_document_subfolder {
            return self.output_dir.clone();
        }
        let stem = Path::new(source_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_name.to_string());
        self.output_dir.join(stem)
    }

    /// Write one artifact per code from `page`.
    ///
    /// A failure affects only its own code: artifacts already written stay,
    /// and the remaining codes are still attempted.
    #[instrument(skip(self, page, codes), fields(codes = codes.len()))]
    pub fn emit(&self, source_name: &str, page: &RgbImage, codes: &[ReviewedCode]) -> EmissionReport {
        let mut report = EmissionReport::default();
        if codes.is_empty() {
            return report;
        }

        let dir = self.target_dir(source_name);
        if let Err(err) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %err, "Cannot create output folder");
            for _ in codes {
                report.failures.push(OcrouteError::ArtifactWrite {
                    path: dir.display().to_string(),
                    reason: err.to_string(),
                });
            }
            return report;
        }

        for entry in codes {
            let result = artifact_name(&entry.code, entry.captured_at, self.naming).and_then(|name| {
                let path = dir.join(name);
                let mut writer = PdfWriter::a4();
                writer.set_title(format!("POD {}", entry.code));
                writer.write_image_to_file(page, &path).map(|()| path)
            });
            match result {
                Ok(path) => report.written.push(path),
                Err(err) => {
                    warn!(code = %entry.code, error = %err, "Artifact not written");
                    report.failures.push(err);
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            "Artifacts emitted"
        );
        report
    }
}

/// Filename for one code under `naming`.
///
/// Codes that would escape the output folder are rejected, as is
/// `Timestamped` naming without a capture time.
pub fn artifact_name(
    code: &str,
    captured_at: Option<NaiveDateTime>,
    naming: NamingScheme,
) -> Result<String> {
    if code.is_empty()
        || code == "."
        || code == ".."
        || code.contains(['/', '\\', '\0'])
    {
        return Err(OcrouteError::ArtifactWrite {
            path: code.to_string(),
            reason: "code is not usable as a filename".into(),
        });
    }
    match naming {
        NamingScheme::Plain => Ok(format!("{code}.pdf")),
        NamingScheme::Timestamped => {
            let captured_at = captured_at.ok_or_else(|| OcrouteError::ArtifactWrite {
                path: format!("POD_{code}_?.pdf"),
                reason: "no capture date/time was given for this code".into(),
            })?;
            Ok(format!("POD_{code}_{}.pdf", captured_at.format("%Y%m%d%H%M")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::Rgb;

    fn page() -> RgbImage {
        RgbImage::from_pixel(40, 56, Rgb([255, 255, 255]))
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn plain_and_timestamped_names() {
        assert_eq!(
            artifact_name("0011223344", None, NamingScheme::Plain).expect("plain"),
            "0011223344.pdf"
        );
        assert_eq!(
            artifact_name("0011223344", Some(at(2024, 5, 12, 9, 5)), NamingScheme::Timestamped)
                .expect("timestamped"),
            "POD_0011223344_202405120905.pdf"
        );
    }

    #[test]
    fn timestamped_without_time_is_rejected() {
        let err = artifact_name("0011223344", None, NamingScheme::Timestamped).expect_err("no time");
        assert!(matches!(err, OcrouteError::ArtifactWrite { .. }));
    }

    #[test]
    fn path_like_codes_are_rejected() {
        for code in ["../etc", "a/b", "..", ""] {
            assert!(artifact_name(code, None, NamingScheme::Plain).is_err(), "{code:?}");
        }
    }

    #[test]
    fn one_artifact_per_code_in_created_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("out");
        let emitter = ArtifactEmitter::new(&output, &PipelineConfig::default());

        let codes = vec![ReviewedCode::new("0011223344"), ReviewedCode::new("5566778899")];
        let report = emitter.emit("cmr.pdf", &page(), &codes);

        assert!(report.failures.is_empty());
        assert_eq!(
            report.written,
            vec![output.join("0011223344.pdf"), output.join("5566778899.pdf")]
        );
        for path in &report.written {
            let doc = lopdf::Document::load(path).expect("valid pdf");
            assert_eq!(doc.get_pages().len(), 1);
        }
    }

    #[test]
    fn per_document_subfolder_uses_source_stem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig {
            per_document_subfolder: true,
            ..PipelineConfig::default()
        };
        let emitter = ArtifactEmitter::new(dir.path(), &config);
        let report = emitter.emit("Scan_07.PDF", &page(), &[ReviewedCode::new("0011223344")]);
        assert_eq!(report.written, vec![dir.path().join("Scan_07").join("0011223344.pdf")]);
    }

    #[test]
    fn failing_code_does_not_stop_the_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig {
            naming: NamingScheme::Timestamped,
            ..PipelineConfig::default()
        };
        let emitter = ArtifactEmitter::new(dir.path(), &config);
        let codes = vec![
            ReviewedCode::with_capture_time("0011223344", at(2024, 5, 12, 9, 30)),
            ReviewedCode::new("9999999999"),
            ReviewedCode::with_capture_time("5566778899", at(2024, 5, 12, 9, 31)),
        ];
        let report = emitter.emit("cmr.pdf", &page(), &codes);

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(dir.path().join("POD_0011223344_202405120930.pdf").exists());
        assert!(dir.path().join("POD_5566778899_202405120931.pdf").exists());
    }

    #[test]
    fn unwritable_output_fails_every_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("write");
        let emitter = ArtifactEmitter::new(blocker.join("out"), &PipelineConfig::default());

        let report = emitter.emit("cmr.pdf", &page(), &[ReviewedCode::new("0011223344")]);
        assert!(report.written.is_empty());
        assert_eq!(report.failures.len(), 1);
    }
}
