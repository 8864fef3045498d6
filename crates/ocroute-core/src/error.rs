// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for OCRoute.

use thiserror::Error;

use crate::types::DocumentState;

/// Top-level error type for all OCRoute operations.
///
/// Per-document variants (`Render`, `Engine`, `ArtifactWrite`, `Cleanup`) are
/// recorded and the batch carries on. Only configuration-level variants stop a
/// batch, and they are raised before any document is touched.
#[derive(Debug, Error)]
pub enum OcrouteError {
    // -- Per-document errors --
    #[error("cannot rasterize {document}: {reason}")]
    Render { document: String, reason: String },

    #[error("OCR engine `{engine}` failed: {reason}")]
    Engine { engine: String, reason: String },

    #[error("cannot write artifact {path}: {reason}")]
    ArtifactWrite { path: String, reason: String },

    #[error("cleanup of {path} failed: {reason}")]
    Cleanup { path: String, reason: String },

    #[error("backup of {path} failed: {reason}")]
    Backup { path: String, reason: String },

    #[error("document cannot move from {from} to {to}")]
    InvalidTransition {
        from: DocumentState,
        to: DocumentState,
    },

    // -- Configuration errors (fatal before a batch starts) --
    #[error("invalid code pattern configuration: {0}")]
    PatternConfig(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("license check failed: {0}")]
    License(String),

    // -- Lower-level failures --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OcrouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_names_the_engine() {
        let err = OcrouteError::Engine {
            engine: "tesseract".into(),
            reason: "exit 1".into(),
        };
        assert_eq!(err.to_string(), "OCR engine `tesseract` failed: exit 1");
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = OcrouteError::InvalidTransition {
            from: DocumentState::Pending,
            to: DocumentState::Confirmed,
        };
        assert_eq!(err.to_string(), "document cannot move from pending to confirmed");
    }

    #[test]
    fn render_error_names_the_document() {
        let err = OcrouteError::Render {
            document: "scan_0042.pdf".into(),
            reason: "no pages".into(),
        };
        assert_eq!(err.to_string(), "cannot rasterize scan_0042.pdf: no pages");
    }
}
