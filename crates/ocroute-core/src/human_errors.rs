// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages.
//
// Every technical error is mapped to a short plain-language notice with a
// suggestion. The severity decides whether the batch can carry on.

use crate::error::OcrouteError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Affects one document or one artifact; the batch continues.
    DocumentSkipped,
    /// Operator must fix something (folder, prefix file, license) before starting.
    ActionRequired,
    /// Informational; nothing was lost.
    Ignorable,
}

/// A plain-language error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct OperatorNotice {
    /// One-line summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl OperatorNotice {
    /// Render as `<file>: <message> <suggestion>` for terminal output.
    pub fn for_file(&self, filename: &str) -> String {
        format!("{filename}: {} {}", self.message, self.suggestion)
    }
}

/// Convert an [`OcrouteError`] into an [`OperatorNotice`].
pub fn humanize_error(err: &OcrouteError) -> OperatorNotice {
    match err {
        OcrouteError::Render { reason, .. } => OperatorNotice {
            message: "This document could not be opened as pages.".into(),
            suggestion: format!(
                "The file may be damaged or password-protected; open it in a PDF viewer to check. ({reason})"
            ),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::Engine { engine, .. } => OperatorNotice {
            message: format!("Text recognition with `{engine}` failed on this page."),
            suggestion: "Other engines were still used; add any missing codes by hand during review.".into(),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::ArtifactWrite { path, .. } => OperatorNotice {
            message: format!("The output file {path} could not be written."),
            suggestion: "Check free disk space and write permission on the output folder.".into(),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::Cleanup { .. } => OperatorNotice {
            message: "A temporary preview file could not be removed.".into(),
            suggestion: "Nothing to do; it will be overwritten or can be deleted by hand.".into(),
            severity: Severity::Ignorable,
        },

        OcrouteError::Backup { path, .. } => OperatorNotice {
            message: format!("{path} was not archived in the backup folder."),
            suggestion: "The original is untouched; copy it to the backup folder by hand.".into(),
            severity: Severity::Ignorable,
        },

        OcrouteError::InvalidTransition { from, to } => OperatorNotice {
            message: format!("Internal queue error: a document moved from {from} to {to}."),
            suggestion: "Please report this; the document was left unprocessed.".into(),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::PatternConfig(detail) => OperatorNotice {
            message: "The prefix list cannot be used.".into(),
            suggestion: format!(
                "Put one prefix per line, each shorter than the code length. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        OcrouteError::Config(detail) => OperatorNotice {
            message: "The run is not configured correctly.".into(),
            suggestion: format!("Check the source and output folders. ({detail})"),
            severity: Severity::ActionRequired,
        },

        OcrouteError::License(detail) => OperatorNotice {
            message: "No valid license was found.".into(),
            suggestion: format!("Activate or renew the license, then start again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        OcrouteError::Image(_) => OperatorNotice {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as PNG first.".into(),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::Pdf(_) => OperatorNotice {
            message: "There's a problem writing this PDF.".into(),
            suggestion: "Try again; if it keeps happening, report the source file.".into(),
            severity: Severity::DocumentSkipped,
        },

        OcrouteError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => OperatorNotice {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted while the batch was running.".into(),
                severity: Severity::DocumentSkipped,
            },
            std::io::ErrorKind::PermissionDenied => OperatorNotice {
                message: "Permission denied.".into(),
                suggestion: "Check the folder permissions, or choose a different output folder.".into(),
                severity: Severity::ActionRequired,
            },
            _ => OperatorNotice {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::DocumentSkipped,
            },
        },

        OcrouteError::Serialization(_) => OperatorNotice {
            message: "A settings file could not be read.".into(),
            suggestion: "Delete config.json to start from defaults.".into(),
            severity: Severity::Ignorable,
        },
    }
}
