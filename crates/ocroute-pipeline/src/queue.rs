// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review queue: holds extracted documents and hands them to the reviewer one
// at a time, ordered by case-insensitive filename.
//
// Each document walks `Extracted → UnderReview → {Confirmed, Cancelled} →
// Cleaned` exactly once. The queue never revisits a document.

use std::collections::HashMap;
use std::path::PathBuf;

use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::{DocumentId, DocumentState, ReviewDecision};
use tracing::{info, instrument, warn};

use crate::document::ExtractedDocument;
use crate::emit::ArtifactEmitter;
use crate::review::{ReviewCollaborator, ReviewRequest};

/// What happened to one reviewed document.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub id: DocumentId,
    pub document: String,
    /// Decision after normalization.
    pub decision: ReviewDecision,
    pub artifacts: Vec<PathBuf>,
    /// Artifact and cleanup problems. None of them stop the queue.
    pub failures: Vec<OcrouteError>,
    pub final_state: DocumentState,
}

/// FIFO of documents awaiting review.
#[derive(Debug)]
pub struct ReviewQueue {
    pending: Vec<ExtractedDocument>,
    review_threshold: f32,
    /// Last known state of every document ever admitted.
    ledger: HashMap<DocumentId, DocumentState>,
    reviewed: usize,
}

impl ReviewQueue {
    pub fn new(review_threshold: f32) -> Self {
        Self {
            pending: Vec::new(),
            review_threshold,
            ledger: HashMap::new(),
            reviewed: 0,
        }
    }

    // -- Admission ------------------------------------------------------------

    /// Add an extracted document in filename order.
    ///
    /// Documents that are not in the `Extracted` state are refused.
    pub fn admit(&mut self, document: ExtractedDocument) -> Result<()> {
        if document.state() != DocumentState::Extracted {
            return Err(OcrouteError::InvalidTransition {
                from: document.state(),
                to: DocumentState::UnderReview,
            });
        }
        let index = {
            let key = document.queue_key();
            self.pending.partition_point(|queued| queued.queue_key() <= key)
        };
        self.ledger.insert(document.id, DocumentState::Extracted);
        self.pending.insert(index, document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Filenames in the order they will be reviewed.
    pub fn order(&self) -> Vec<&str> {
        self.pending.iter().map(|doc| doc.name.as_str()).collect()
    }

    pub fn state_of(&self, id: DocumentId) -> Option<DocumentState> {
        self.ledger.get(&id).copied()
    }

    // -- Review ---------------------------------------------------------------

    /// Review every queued document in order until the queue is empty.
    ///
    /// Blocks on the collaborator for each document.
    #[instrument(skip_all, fields(queued = self.pending.len()))]
    pub fn drain(
        &mut self,
        collaborator: &mut dyn ReviewCollaborator,
        emitter: &ArtifactEmitter,
    ) -> Result<Vec<ReviewOutcome>> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            let document = self.pending.remove(0);
            outcomes.push(self.review_one(document, collaborator, emitter)?);
        }
        info!(reviewed = outcomes.len(), "Review queue empty");
        Ok(outcomes)
    }

    fn review_one(
        &mut self,
        mut document: ExtractedDocument,
        collaborator: &mut dyn ReviewCollaborator,
        emitter: &ArtifactEmitter,
    ) -> Result<ReviewOutcome> {
        self.transition(&mut document, DocumentState::UnderReview)?;
        self.reviewed += 1;

        let request = ReviewRequest {
            document: &document.name,
            position: self.reviewed,
            total: self.reviewed + self.pending.len(),
            candidates: &document.result.candidates,
            preview_path: document.preview_path.as_deref(),
            naming: emitter.naming(),
            review_threshold: self.review_threshold,
        };
        let decision = collaborator.review(&request).normalized();

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        match &decision {
            ReviewDecision::Confirmed(codes) => {
                self.transition(&mut document, DocumentState::Confirmed)?;
                if !codes.is_empty() {
                    match document.load_page() {
                        Ok(page) => {
                            let report = emitter.emit(&document.name, &page, codes);
                            artifacts = report.written;
                            failures = report.failures;
                        }
                        Err(err) => {
                            warn!(document = %document.name, error = %err, "Page raster unavailable");
                            failures = codes
                                .iter()
                                .map(|entry| OcrouteError::ArtifactWrite {
                                    path: entry.code.clone(),
                                    reason: err.to_string(),
                                })
                                .collect();
                        }
                    }
                }
            }
            ReviewDecision::Cancelled => {
                self.transition(&mut document, DocumentState::Cancelled)?;
                info!(document = %document.name, "Document cancelled, nothing written");
            }
        }

        for err in document.release() {
            warn!(document = %document.name, error = %err, "Cleanup failed");
            failures.push(err);
        }
        self.transition(&mut document, DocumentState::Cleaned)?;

        Ok(ReviewOutcome {
            id: document.id,
            document: document.name,
            decision,
            artifacts,
            failures,
            final_state: DocumentState::Cleaned,
        })
    }

    fn transition(&mut self, document: &mut ExtractedDocument, next: DocumentState) -> Result<()> {
        document.advance(next)?;
        self.ledger.insert(document.id, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::{FakeRasterizer, FixedLinesEngine, pod_adapter};
    use crate::document::{DocumentExtractor, SourceDocument};
    use crate::extract::CodeMatcher;
    use crate::review::tests::ScriptedReviewer;
    use ocroute_core::config::PipelineConfig;
    use ocroute_document::OcrAdapter;

    fn extract_all(adapter: &OcrAdapter, preview_dir: &std::path::Path, names: &[&str]) -> ReviewQueue {
        let rasterizer = FakeRasterizer { pages: 1 };
        let matcher = CodeMatcher::fixed(10).expect("matcher");
        let extractor = DocumentExtractor::new(
            &PipelineConfig::default(),
            &rasterizer,
            adapter,
            &matcher,
            preview_dir,
        );
        let mut queue = ReviewQueue::new(0.7);
        for name in names {
            let doc = extractor
                .extract(SourceDocument::new(format!("/in/{name}")))
                .expect("extract");
            queue.admit(doc).expect("admit");
        }
        queue
    }

    #[test]
    fn order_is_case_insensitive_by_filename() {
        let dir = tempfile::tempdir().expect("tempdir");
        let queue = extract_all(&pod_adapter(), dir.path(), &["b.pdf", "C.pdf", "a.PDF"]);
        assert_eq!(queue.order(), vec!["a.PDF", "b.pdf", "C.pdf"]);
    }

    #[test]
    fn confirmed_codes_become_artifacts_and_cancel_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let previews = dir.path().join("previews");
        std::fs::create_dir_all(&previews).expect("mkdir");
        let output = dir.path().join("out");
        let mut queue = extract_all(&pod_adapter(), &previews, &["first.pdf", "second.pdf"]);
        let emitter = ArtifactEmitter::new(&output, &PipelineConfig::default());

        let mut reviewer = ScriptedReviewer::new([
            ReviewDecision::confirm_codes(["0011223344", " 5566778899 ", "0011223344"]),
            ReviewDecision::Cancelled,
        ]);
        let outcomes = queue.drain(&mut reviewer, &emitter).expect("drain");

        assert!(queue.is_empty());
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].document, "first.pdf");
        assert_eq!(outcomes[0].artifacts.len(), 2);
        assert!(output.join("0011223344.pdf").exists());
        assert!(output.join("5566778899.pdf").exists());
        assert!(outcomes[1].artifacts.is_empty());
        assert_eq!(
            std::fs::read_dir(&output).expect("output").count(),
            2,
            "cancelled document adds nothing"
        );

        for outcome in &outcomes {
            assert_eq!(outcome.final_state, DocumentState::Cleaned);
            assert_eq!(queue.state_of(outcome.id), Some(DocumentState::Cleaned));
        }
        assert_eq!(
            std::fs::read_dir(&previews).expect("previews").count(),
            0,
            "previews are removed after review"
        );
        assert!(reviewer.seen.iter().all(|(_, _, preview)| *preview));
    }

    #[test]
    fn each_document_is_reviewed_once_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut queue = extract_all(&pod_adapter(), dir.path(), &["z.pdf", "M.pdf", "a.pdf"]);
        let emitter = ArtifactEmitter::new(dir.path().join("out"), &PipelineConfig::default());

        let mut reviewer = ScriptedReviewer::default();
        queue.drain(&mut reviewer, &emitter).expect("drain");
        let seen: Vec<_> = reviewer.seen.iter().map(|(name, _, _)| name.as_str()).collect();
        assert_eq!(seen, vec!["a.pdf", "M.pdf", "z.pdf"]);

        let again = queue.drain(&mut reviewer, &emitter).expect("second drain");
        assert!(again.is_empty());
        assert_eq!(reviewer.seen.len(), 3);
    }

    #[test]
    fn document_without_candidates_is_still_reviewed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = OcrAdapter::new(vec![Box::new(FixedLinesEngine {
            name: "fake",
            lines: vec![("firma illeggibile", 0.4)],
        })])
        .expect("adapter");
        let mut queue = extract_all(&adapter, dir.path(), &["blank.pdf"]);
        let emitter = ArtifactEmitter::new(dir.path().join("out"), &PipelineConfig::default());

        let mut reviewer = ScriptedReviewer::new([ReviewDecision::confirm_codes(["7777777777"])]);
        let outcomes = queue.drain(&mut reviewer, &emitter).expect("drain");

        assert!(reviewer.seen[0].1.is_empty(), "shown with no candidates");
        assert_eq!(outcomes[0].artifacts, vec![dir.path().join("out").join("7777777777.pdf")]);
    }

    #[test]
    fn lost_page_raster_fails_each_code_without_stopping_the_queue() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut queue = extract_all(&pod_adapter(), dir.path(), &["a.pdf", "b.pdf"]);
        let page = queue.pending[0].page_path.clone().expect("page written");
        std::fs::remove_file(&page).expect("remove page");
        let emitter = ArtifactEmitter::new(dir.path().join("out"), &PipelineConfig::default());

        let mut reviewer = ScriptedReviewer::new([
            ReviewDecision::confirm_codes(["0011223344", "5566778899"]),
            ReviewDecision::confirm_codes(["0011223344"]),
        ]);
        let outcomes = queue.drain(&mut reviewer, &emitter).expect("drain");

        assert!(outcomes[0].artifacts.is_empty());
        assert_eq!(outcomes[0].failures.len(), 2);
        assert!(
            outcomes[0]
                .failures
                .iter()
                .all(|err| matches!(err, OcrouteError::ArtifactWrite { .. }))
        );
        assert_eq!(outcomes[0].final_state, DocumentState::Cleaned);
        assert_eq!(outcomes[1].artifacts.len(), 1, "next document unaffected");
    }

    #[test]
    fn confirming_an_empty_list_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut queue = extract_all(&pod_adapter(), dir.path(), &["cmr.pdf"]);
        let emitter = ArtifactEmitter::new(dir.path().join("out"), &PipelineConfig::default());

        let mut reviewer = ScriptedReviewer::new([ReviewDecision::confirm_codes(["  ", ""])]);
        let outcomes = queue.drain(&mut reviewer, &emitter).expect("drain");
        assert_eq!(outcomes[0].decision, ReviewDecision::Confirmed(Vec::new()));
        assert!(outcomes[0].artifacts.is_empty());
    }

    #[test]
    fn documents_already_under_review_are_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rasterizer = FakeRasterizer { pages: 1 };
        let adapter = pod_adapter();
        let matcher = CodeMatcher::fixed(10).expect("matcher");
        let extractor = DocumentExtractor::new(
            &PipelineConfig::default(),
            &rasterizer,
            &adapter,
            &matcher,
            dir.path(),
        );
        let mut doc = extractor
            .extract(SourceDocument::new("/in/cmr.pdf"))
            .expect("extract");
        doc.advance(DocumentState::UnderReview).expect("advance");

        let mut queue = ReviewQueue::new(0.7);
        assert!(matches!(
            queue.admit(doc),
            Err(OcrouteError::InvalidTransition { .. })
        ));
        assert!(queue.is_empty());
    }
}
