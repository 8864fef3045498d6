// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review collaborator seam: the human-facing component that inspects one
// document's candidates and returns a decision.

use std::path::Path;

use ocroute_core::config::NamingScheme;
use ocroute_core::types::{FusedCandidate, ReviewDecision};

/// Everything the reviewer sees for one document.
#[derive(Debug)]
pub struct ReviewRequest<'a> {
    /// Source filename.
    pub document: &'a str,
    /// 1-based position in this review session.
    pub position: usize,
    /// Documents in the session, including already-reviewed ones.
    pub total: usize,
    /// Fused candidates, ascending by code.
    pub candidates: &'a [FusedCandidate],
    /// Where the first page with highlighted code lines was written, if it could be.
    pub preview_path: Option<&'a Path>,
    /// Naming scheme in force; `Timestamped` needs capture times.
    pub naming: NamingScheme,
    /// Confidence below which a candidate is flagged.
    pub review_threshold: f32,
}

impl ReviewRequest<'_> {
    pub fn needs_capture_time(&self) -> bool {
        self.naming == NamingScheme::Timestamped
    }
}

/// Blocking review step. Called once per document, in queue order.
///
/// There is no timeout: the queue waits for the decision.
pub trait ReviewCollaborator {
    fn review(&mut self, request: &ReviewRequest<'_>) -> ReviewDecision;
}

/// Confirms every candidate unedited. For unattended runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ReviewCollaborator for AcceptAll {
    fn review(&mut self, request: &ReviewRequest<'_>) -> ReviewDecision {
        ReviewDecision::confirm_codes(request.candidates.iter().map(|c| c.code.clone()))
    }
}
