// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result fusion: merges candidates from every engine, page and line into one
// de-duplicated list per document.

use std::collections::BTreeMap;

use ocroute_core::types::{CandidateCode, FusedCandidate};
use tracing::debug;

/// Page whose raster is shown to the reviewer.
const PREVIEW_PAGE: usize = 0;

/// Groups candidates by code value and keeps the best confidence.
#[derive(Debug, Clone, Copy)]
pub struct ResultFuser {
    review_threshold: f32,
}

impl ResultFuser {
    pub fn new(review_threshold: f32) -> Self {
        Self { review_threshold }
    }

    /// Fuse candidates into a list ascending by code value.
    ///
    /// Each code appears once, with the maximum confidence over all its
    /// origins. The result does not depend on the order of `candidates`.
    pub fn fuse(&self, candidates: impl IntoIterator<Item = CandidateCode>) -> Vec<FusedCandidate> {
        let mut groups: BTreeMap<String, Vec<CandidateCode>> = BTreeMap::new();
        for candidate in candidates {
            groups.entry(candidate.code.clone()).or_default().push(candidate);
        }

        groups
            .into_iter()
            .map(|(code, mut origins)| {
                origins.sort_by(|a, b| {
                    (a.engine.as_str(), a.page, a.line).cmp(&(b.engine.as_str(), b.page, b.line))
                });

                // First origin with the maximum confidence wins ties.
                let mut best = 0;
                for (index, origin) in origins.iter().enumerate() {
                    if origin.confidence > origins[best].confidence {
                        best = index;
                    }
                }
                let confidence = origins[best].confidence;
                let polygon = origins[best].polygon.clone();

                let outlines = origins
                    .iter()
                    .filter(|origin| origin.page == PREVIEW_PAGE)
                    .filter_map(|origin| origin.polygon.clone())
                    .collect();

                let mut engines: Vec<String> =
                    origins.iter().map(|origin| origin.engine.clone()).collect();
                engines.dedup();

                debug!(%code, confidence, origins = origins.len(), "Code fused");
                FusedCandidate {
                    code,
                    confidence,
                    polygon,
                    outlines,
                    engines,
                    needs_review: confidence < self.review_threshold,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocroute_core::types::Polygon;

    fn candidate(code: &str, confidence: f32, engine: &str, page: usize, line: usize) -> CandidateCode {
        CandidateCode {
            code: code.into(),
            confidence,
            polygon: Some(Polygon::from_rect(line as f32, page as f32, 10.0, 5.0)),
            engine: engine.into(),
            page,
            line,
        }
    }

    #[test]
    fn duplicate_code_keeps_maximum_confidence() {
        let fused = ResultFuser::new(0.7).fuse(vec![
            candidate("0011223344", 0.62, "tesseract", 0, 3),
            candidate("0011223344", 0.91, "ocrs", 0, 1),
        ]);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].confidence - 0.91).abs() < f32::EPSILON);
        assert_eq!(fused[0].engines, vec!["ocrs", "tesseract"]);
        assert_eq!(fused[0].outlines.len(), 2);
        assert!(!fused[0].needs_review);
    }

    #[test]
    fn output_is_ascending_and_order_independent() {
        let inputs = vec![
            candidate("9000000000", 0.8, "a", 0, 0),
            candidate("1000000000", 0.5, "b", 0, 1),
            candidate("5000000000", 0.7, "a", 1, 2),
            candidate("1000000000", 0.6, "a", 0, 4),
        ];
        let fuser = ResultFuser::new(0.7);
        let forward = fuser.fuse(inputs.clone());
        let backward = fuser.fuse(inputs.into_iter().rev());

        assert_eq!(forward, backward);
        let codes: Vec<_> = forward.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["1000000000", "5000000000", "9000000000"]);
    }

    #[test]
    fn low_confidence_is_flagged_not_dropped() {
        let fused = ResultFuser::new(0.7).fuse(vec![
            candidate("0011223344", 0.45, "a", 0, 0),
            candidate("5566778899", 0.70, "a", 0, 1),
        ]);
        assert_eq!(fused.len(), 2);
        assert!(fused[0].needs_review);
        assert!(!fused[1].needs_review, "threshold itself is not below");
    }

    #[test]
    fn outlines_only_come_from_the_preview_page() {
        let fused = ResultFuser::new(0.7).fuse(vec![
            candidate("0011223344", 0.9, "a", 1, 0),
            candidate("0011223344", 0.8, "a", 0, 2),
        ]);
        assert_eq!(fused[0].outlines.len(), 1);
        assert_eq!(fused[0].polygon, Some(Polygon::from_rect(0.0, 1.0, 10.0, 5.0)));
    }

    #[test]
    fn no_candidates_fuse_to_empty_list() {
        assert!(ResultFuser::new(0.7).fuse(Vec::new()).is_empty());
    }
}
