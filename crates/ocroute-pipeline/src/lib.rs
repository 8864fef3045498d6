// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCRoute Pipeline: code extraction, cross-engine fusion, the review queue,
// artifact emission, end-of-batch backup, and the batch orchestrator that
// drives them in order.

pub mod backup;
pub mod document;
pub mod emit;
pub mod extract;
pub mod fusion;
pub mod orchestrator;
pub mod queue;
pub mod review;

pub use backup::{BackupReport, create_backup};
pub use document::{DocumentExtractor, ExtractedDocument, SourceDocument};
pub use emit::{ArtifactEmitter, EmissionReport};
pub use extract::CodeMatcher;
pub use fusion::ResultFuser;
pub use orchestrator::{BatchOrchestrator, BatchReport, SkippedDocument, discover_documents};
pub use queue::{ReviewOutcome, ReviewQueue};
pub use review::{AcceptAll, ReviewCollaborator, ReviewRequest};
