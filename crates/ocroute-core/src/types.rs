// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the OCRoute extraction-and-review pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a source document within one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Bmp,
}

impl DocumentKind {
    /// Infer document kind from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Infer document kind from a path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the document is already a raster image (single "page").
    pub fn is_raster(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Closed polygon in image pixel coordinates, vertices in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon(pub Vec<(f32, f32)>);

impl Polygon {
    /// Axis-aligned rectangle as a four-vertex polygon (clockwise from top-left).
    pub fn from_rect(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self(vec![
            (left, top),
            (left + width, top),
            (left + width, top + height),
            (left, top + height),
        ])
    }

    /// Map every vertex through `x / scale + offset_x`, `y / scale + offset_y`.
    ///
    /// Used to move polygons found on a cropped, upscaled image back onto the
    /// original page raster.
    pub fn unscale(&self, scale: f32, offset_x: f32, offset_y: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self(
            self.0
                .iter()
                .map(|&(x, y)| (x / scale + offset_x, y / scale + offset_y))
                .collect(),
        )
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.0
    }
}

/// One text line as reported by a recognition engine, before validation.
///
/// Engines fill in what they have; anything missing or out of range makes the
/// record count as "no detection".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTextLine {
    pub text: Option<String>,
    pub confidence: Option<f32>,
    pub polygon: Option<Vec<(f32, f32)>>,
}

impl RawTextLine {
    /// Validate into a [`TextLine`].
    ///
    /// Returns `None` for empty text or a confidence that is missing, NaN, or
    /// outside `[0, 1]`. A polygon with fewer than three vertices is dropped but
    /// does not invalidate the line.
    pub fn validate(self) -> Option<TextLine> {
        let text = self.text?;
        if text.trim().is_empty() {
            return None;
        }
        let confidence = self.confidence?;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return None;
        }
        let polygon = self
            .polygon
            .filter(|points| points.len() >= 3)
            .map(Polygon);
        Some(TextLine {
            text,
            confidence,
            polygon,
        })
    }
}

/// A validated text line: recognised text, confidence in `[0, 1]`, optional outline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
    pub polygon: Option<Polygon>,
}

/// All lines one engine produced for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLines {
    /// Engine identity (e.g. `"tesseract"`).
    pub engine: String,
    /// Zero-based page index within the source document.
    pub page: usize,
    pub lines: Vec<TextLine>,
}

/// A code found in one text line by one engine. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCode {
    pub code: String,
    pub confidence: f32,
    pub polygon: Option<Polygon>,
    pub engine: String,
    pub page: usize,
    pub line: usize,
}

/// One entry of a fused, de-duplicated candidate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub code: String,
    /// Maximum confidence over every contributing (engine, line) origin.
    pub confidence: f32,
    /// Outline of the highest-confidence contributing line, if it had one.
    pub polygon: Option<Polygon>,
    /// Outlines of contributing lines on the preview (first) page, in page
    /// coordinates, for highlighting.
    pub outlines: Vec<Polygon>,
    /// Distinct engines that reported this code, sorted.
    pub engines: Vec<String>,
    /// Advisory flag: confidence is below the review threshold.
    pub needs_review: bool,
}

/// Fused extraction output for one source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source filename.
    pub document: String,
    /// De-duplicated candidates, ascending by code value.
    pub candidates: Vec<FusedCandidate>,
    /// Number of pages that went through recognition.
    pub pages_recognised: usize,
    /// Engines that failed on some page, with the failure message.
    pub engine_failures: Vec<String>,
}

impl ExtractionResult {
    pub fn codes(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.code.as_str()).collect()
    }
}

/// A code as finally accepted by the operator, with optional capture time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewedCode {
    pub code: String,
    pub captured_at: Option<NaiveDateTime>,
}

impl ReviewedCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            captured_at: None,
        }
    }

    pub fn with_capture_time(code: impl Into<String>, captured_at: NaiveDateTime) -> Self {
        Self {
            code: code.into(),
            captured_at: Some(captured_at),
        }
    }
}

/// The operator's terminal verdict on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    /// Emit one artifact per listed code.
    Confirmed(Vec<ReviewedCode>),
    /// Discard the document; nothing is written.
    Cancelled,
}

impl ReviewDecision {
    /// Confirm the given codes without capture-time metadata.
    pub fn confirm_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Confirmed(codes.into_iter().map(ReviewedCode::new).collect())
    }

    /// Trim codes, drop blank entries and exact duplicates, keep first-seen order.
    pub fn normalized(self) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            Self::Confirmed(codes) => {
                let mut seen = std::collections::HashSet::new();
                let kept = codes
                    .into_iter()
                    .filter_map(|entry| {
                        let code = entry.code.trim().to_string();
                        if code.is_empty() {
                            return None;
                        }
                        let normalized = ReviewedCode {
                            code,
                            captured_at: entry.captured_at,
                        };
                        seen.insert(normalized.clone()).then_some(normalized)
                    })
                    .collect();
                Self::Confirmed(kept)
            }
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Lifecycle of a source document through extraction and review.
///
/// `Pending → Extracted → UnderReview → {Confirmed, Cancelled} → Cleaned`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentState {
    /// Discovered, not yet run through extraction.
    Pending,
    /// Extraction finished (possibly with zero candidates); waiting in the queue.
    Extracted,
    /// Handed to the review collaborator.
    UnderReview,
    /// Operator confirmed a final code list.
    Confirmed,
    /// Operator discarded the document.
    Cancelled,
    /// Temporary state released. Terminal.
    Cleaned,
}

impl DocumentState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Pending, Extracted)
                | (Extracted, UnderReview)
                | (UnderReview, Confirmed)
                | (UnderReview, Cancelled)
                | (Confirmed, Cleaned)
                | (Cancelled, Cleaned)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == DocumentState::Cleaned
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Extracted => "extracted",
            Self::UnderReview => "under-review",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Cleaned => "cleaned",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn document_kind_from_extension_is_case_insensitive() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("Jpeg"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_extension("docx"), None);
        assert!(DocumentKind::Png.is_raster());
        assert!(!DocumentKind::Pdf.is_raster());
    }

    #[test]
    fn raw_line_with_valid_fields_validates() {
        let raw = RawTextLine {
            text: Some("0011223344".into()),
            confidence: Some(0.93),
            polygon: Some(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]),
        };
        let line = raw.validate().expect("valid line");
        assert_eq!(line.text, "0011223344");
        assert!(line.polygon.is_some());
    }

    #[test]
    fn malformed_raw_lines_count_as_no_detection() {
        let missing_text = RawTextLine {
            text: None,
            confidence: Some(0.9),
            polygon: None,
        };
        let blank_text = RawTextLine {
            text: Some("   ".into()),
            confidence: Some(0.9),
            polygon: None,
        };
        let missing_conf = RawTextLine {
            text: Some("abc".into()),
            confidence: None,
            polygon: None,
        };
        let nan_conf = RawTextLine {
            text: Some("abc".into()),
            confidence: Some(f32::NAN),
            polygon: None,
        };
        let out_of_range = RawTextLine {
            text: Some("abc".into()),
            confidence: Some(1.5),
            polygon: None,
        };
        for raw in [missing_text, blank_text, missing_conf, nan_conf, out_of_range] {
            assert!(raw.validate().is_none());
        }
    }

    #[test]
    fn degenerate_polygon_is_dropped_but_line_kept() {
        let raw = RawTextLine {
            text: Some("x".into()),
            confidence: Some(0.5),
            polygon: Some(vec![(1.0, 1.0), (2.0, 2.0)]),
        };
        let line = raw.validate().expect("line survives");
        assert!(line.polygon.is_none());
    }

    #[test]
    fn polygon_unscale_undoes_upscale_and_crop() {
        let poly = Polygon::from_rect(20.0, 40.0, 100.0, 10.0);
        let mapped = poly.unscale(2.0, 0.0, 300.0);
        assert_eq!(mapped.points()[0], (10.0, 320.0));
        assert_eq!(mapped.points()[2], (60.0, 325.0));
    }

    #[test]
    fn state_machine_allows_only_documented_transitions() {
        use DocumentState::*;
        assert!(Pending.can_transition_to(Extracted));
        assert!(Extracted.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Confirmed));
        assert!(UnderReview.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cleaned));
        assert!(Cancelled.can_transition_to(Cleaned));

        assert!(!Pending.can_transition_to(UnderReview));
        assert!(!Extracted.can_transition_to(Confirmed));
        assert!(!Cleaned.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(Cleaned.is_terminal());
    }

    #[test]
    fn normalized_decision_trims_and_drops_blanks_and_duplicates() {
        let decision = ReviewDecision::confirm_codes([" 0011223344 ", "", "   ", "0011223344", "5566778899"]);
        match decision.normalized() {
            ReviewDecision::Confirmed(codes) => {
                let values: Vec<_> = codes.iter().map(|c| c.code.as_str()).collect();
                assert_eq!(values, vec!["0011223344", "5566778899"]);
            }
            ReviewDecision::Cancelled => panic!("expected confirmed"),
        }
    }

    #[test]
    fn same_code_with_different_capture_times_is_kept_twice() {
        let t1 = NaiveDate::from_ymd_opt(2024, 5, 12)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date");
        let t2 = NaiveDate::from_ymd_opt(2024, 5, 13)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date");
        let decision = ReviewDecision::Confirmed(vec![
            ReviewedCode::with_capture_time("0011223344", t1),
            ReviewedCode::with_capture_time("0011223344", t2),
        ]);
        match decision.normalized() {
            ReviewDecision::Confirmed(codes) => assert_eq!(codes.len(), 2),
            ReviewDecision::Cancelled => panic!("expected confirmed"),
        }
    }
}
