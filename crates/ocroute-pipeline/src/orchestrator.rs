// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestration: discovery, extraction of every document, one review
// session over the whole queue, then the end-of-batch backup.
//
// Everything runs on the calling thread. The only blocking point is the
// review collaborator.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use ocroute_core::config::PipelineConfig;
use ocroute_core::error::{OcrouteError, Result};
use ocroute_document::{OcrAdapter, Rasterizer};
use tracing::{info, instrument, warn};

use crate::backup::{BackupReport, create_backup};
use crate::document::{DocumentExtractor, SourceDocument};
use crate::emit::ArtifactEmitter;
use crate::extract::CodeMatcher;
use crate::queue::{ReviewOutcome, ReviewQueue};
use crate::review::ReviewCollaborator;

/// A document dropped before review.
#[derive(Debug)]
pub struct SkippedDocument {
    pub name: String,
    pub error: OcrouteError,
}

/// Summary of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Input files found.
    pub discovered: usize,
    /// One entry per reviewed document, in review order.
    pub outcomes: Vec<ReviewOutcome>,
    pub skipped: Vec<SkippedDocument>,
    /// `None` in single-file mode or when the backup folder could not be made.
    pub backup: Option<BackupReport>,
    pub backup_error: Option<OcrouteError>,
}

impl BatchReport {
    pub fn artifacts_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.artifacts.len()).sum()
    }
}

/// Drives a batch from discovery to backup.
pub struct BatchOrchestrator<'a, R: Rasterizer + ?Sized> {
    config: &'a PipelineConfig,
    rasterizer: &'a R,
    adapter: &'a OcrAdapter,
    matcher: &'a CodeMatcher,
}

impl<'a, R: Rasterizer + ?Sized> BatchOrchestrator<'a, R> {
    /// Fails on an invalid pipeline configuration, before any document is touched.
    pub fn new(
        config: &'a PipelineConfig,
        rasterizer: &'a R,
        adapter: &'a OcrAdapter,
        matcher: &'a CodeMatcher,
    ) -> Result<Self> {
        config.validate()?;
        if matcher.code_length() != config.code_length {
            return Err(OcrouteError::Config(format!(
                "matcher expects {}-character codes but the pipeline is configured for {}",
                matcher.code_length(),
                config.code_length
            )));
        }
        Ok(Self {
            config,
            rasterizer,
            adapter,
            matcher,
        })
    }

    /// Process every `.pdf` in `source`, review them all, then back up the
    /// originals into `output` once.
    #[instrument(skip_all, fields(source = %source.display(), output = %output.display()))]
    pub fn run_folder(
        &self,
        source: &Path,
        output: &Path,
        collaborator: &mut dyn ReviewCollaborator,
    ) -> Result<BatchReport> {
        self.run_folder_at(source, output, collaborator, Local::now().naive_local())
    }

    /// [`run_folder`](Self::run_folder) with the backup timestamp supplied.
    pub fn run_folder_at(
        &self,
        source: &Path,
        output: &Path,
        collaborator: &mut dyn ReviewCollaborator,
        now: NaiveDateTime,
    ) -> Result<BatchReport> {
        let originals = discover_documents(source)?;
        prepare_output(output)?;

        let mut report = self.process(&originals, output, collaborator)?;

        match create_backup(output, &originals, now) {
            Ok(backup) => report.backup = Some(backup),
            Err(err) => {
                warn!(error = %err, "Backup skipped");
                report.backup_error = Some(err);
            }
        }
        Ok(report)
    }

    /// Process one PDF or image file. No backup is made.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn run_single(
        &self,
        input: &Path,
        output: &Path,
        collaborator: &mut dyn ReviewCollaborator,
    ) -> Result<BatchReport> {
        if !input.is_file() {
            return Err(OcrouteError::Config(format!(
                "input file {} does not exist",
                input.display()
            )));
        }
        prepare_output(output)?;
        self.process(&[input.to_path_buf()], output, collaborator)
    }

    fn process(
        &self,
        paths: &[PathBuf],
        output: &Path,
        collaborator: &mut dyn ReviewCollaborator,
    ) -> Result<BatchReport> {
        let previews = tempfile::Builder::new().prefix("ocroute-preview-").tempdir()?;
        let extractor = DocumentExtractor::new(
            self.config,
            self.rasterizer,
            self.adapter,
            self.matcher,
            previews.path(),
        );

        let mut report = BatchReport {
            discovered: paths.len(),
            ..BatchReport::default()
        };
        let mut queue = ReviewQueue::new(self.config.review_threshold);
        for (index, path) in paths.iter().enumerate() {
            let source = SourceDocument::new(path);
            let name = source.name.clone();
            let admitted = extractor
                .extract(source)
                .and_then(|document| queue.admit(document));
            if let Err(error) = admitted {
                warn!(document = %name, %error, "Document skipped");
                report.skipped.push(SkippedDocument { name, error });
            }
            info!("processed {} / {}", index + 1, paths.len());
        }

        let emitter = ArtifactEmitter::new(output, self.config);
        report.outcomes = queue.drain(collaborator, &emitter)?;

        info!(
            reviewed = report.outcomes.len(),
            skipped = report.skipped.len(),
            artifacts = report.artifacts_written(),
            "Batch finished"
        );
        Ok(report)
    }
}

/// Files in `source` whose extension is `pdf` in any case, sorted by
/// case-insensitive filename.
///
/// Subfolders are not searched.
pub fn discover_documents(source: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(source).map_err(|err| {
        OcrouteError::Config(format!(
            "source folder {} cannot be read: {err}",
            source.display()
        ))
    })?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        })
        .collect();
    found.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.to_lowercase(), name)
    });
    info!(folder = %source.display(), documents = found.len(), "Discovery complete");
    Ok(found)
}

fn prepare_output(output: &Path) -> Result<()> {
    std::fs::create_dir_all(output).map_err(|err| {
        OcrouteError::Config(format!(
            "output folder {} cannot be created: {err}",
            output.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::{FakeRasterizer, pod_adapter};
    use crate::review::tests::ScriptedReviewer;
    use chrono::NaiveDate;
    use ocroute_core::types::{DocumentState, ReviewDecision};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 12)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn discovery_is_case_insensitive_and_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.PDF", "a.pdf", "C.Pdf", "notes.txt", "scan.png"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).expect("mkdir");

        let found = discover_documents(dir.path()).expect("discover");
        let names: Vec<_> = found
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF", "C.Pdf"]);
    }

    #[test]
    fn missing_source_folder_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = discover_documents(&dir.path().join("absent")).expect_err("missing");
        assert!(matches!(err, OcrouteError::Config(_)));
    }

    #[test]
    fn mismatched_code_length_is_refused() {
        let config = PipelineConfig::default();
        let rasterizer = FakeRasterizer { pages: 1 };
        let adapter = pod_adapter();
        let matcher = CodeMatcher::fixed(8).expect("matcher");
        assert!(BatchOrchestrator::new(&config, &rasterizer, &adapter, &matcher).is_err());
    }

    #[test]
    fn two_page_pod_end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&source).expect("mkdir");
        std::fs::write(source.join("cmr_0512.pdf"), b"%PDF-1.7 two pages").expect("write");

        let config = PipelineConfig::default();
        let rasterizer = FakeRasterizer { pages: 2 };
        let adapter = pod_adapter();
        let matcher = CodeMatcher::fixed(10).expect("matcher");
        let orchestrator =
            BatchOrchestrator::new(&config, &rasterizer, &adapter, &matcher).expect("orchestrator");

        let mut reviewer = ScriptedReviewer::new([ReviewDecision::confirm_codes(["0011223344"])]);
        let report = orchestrator
            .run_folder_at(&source, &output, &mut reviewer, noon())
            .expect("batch");

        assert_eq!(reviewer.seen.len(), 1);
        assert_eq!(reviewer.seen[0].1, vec!["0011223344"], "date line is not a code");
        assert!(reviewer.seen[0].2, "preview exists during review");

        assert_eq!(report.discovered, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.outcomes[0].final_state, DocumentState::Cleaned);
        assert!(output.join("0011223344.pdf").exists());
        assert!(report.outcomes[0].failures.is_empty(), "no write or cleanup failures");

        let backup = report.backup.expect("backup made");
        assert_eq!(backup.folder, output.join("backup20240512_1200"));
        assert_eq!(
            std::fs::read(backup.folder.join("cmr_0512.pdf")).expect("backup copy"),
            b"%PDF-1.7 two pages"
        );
    }

    #[test]
    fn unreadable_document_is_skipped_but_backed_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&source).expect("mkdir");
        std::fs::write(source.join("broken.pdf"), b"junk").expect("write");
        std::fs::write(source.join("good.pdf"), b"%PDF").expect("write");

        let config = PipelineConfig::default();
        let rasterizer = FakeRasterizer { pages: 1 };
        let adapter = pod_adapter();
        let matcher = CodeMatcher::fixed(10).expect("matcher");
        let orchestrator =
            BatchOrchestrator::new(&config, &rasterizer, &adapter, &matcher).expect("orchestrator");

        let mut reviewer = ScriptedReviewer::new([ReviewDecision::Cancelled]);
        let report = orchestrator
            .run_folder_at(&source, &output, &mut reviewer, noon())
            .expect("batch");

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "broken.pdf");
        assert!(matches!(report.skipped[0].error, OcrouteError::Render { .. }));
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.artifacts_written(), 0);
        assert_eq!(report.backup.expect("backup").copied.len(), 2);
    }

    #[test]
    fn single_file_mode_makes_no_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("scan.png");
        std::fs::write(&input, b"png").expect("write");
        let output = dir.path().join("out");

        let config = PipelineConfig::default();
        let rasterizer = FakeRasterizer { pages: 1 };
        let adapter = pod_adapter();
        let matcher = CodeMatcher::fixed(10).expect("matcher");
        let orchestrator =
            BatchOrchestrator::new(&config, &rasterizer, &adapter, &matcher).expect("orchestrator");

        let mut reviewer = ScriptedReviewer::new([ReviewDecision::confirm_codes(["0011223344"])]);
        let report = orchestrator
            .run_single(&input, &output, &mut reviewer)
            .expect("single");

        assert_eq!(report.artifacts_written(), 1);
        assert!(report.backup.is_none());
        let entries: Vec<_> = std::fs::read_dir(&output)
            .expect("output")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["0011223344.pdf"]);
    }
}
