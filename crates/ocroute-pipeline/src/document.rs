// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document extraction: rasterize, preprocess, recognise, extract, fuse,
// and prepare the highlighted preview for review.
//
// Rasters do not stay in memory while a document waits in the queue. The clean
// first page and the preview are written to the batch's temporary folder and
// only their paths are kept.

use std::path::{Path, PathBuf};

use image::RgbImage;
use ocroute_core::config::PipelineConfig;
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::{DocumentId, DocumentState, ExtractionResult};
use ocroute_document::{OcrAdapter, Preprocessor, Rasterizer, highlight_outlines};
use tracing::{debug, info, instrument, warn};

use crate::extract::CodeMatcher;
use crate::fusion::ResultFuser;

// -- Source document ----------------------------------------------------------

/// A discovered input file, before extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    /// Filename used for ordering, messages and subfolder naming.
    pub name: String,
    pub state: DocumentState,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: DocumentId::new(),
            path,
            name,
            state: DocumentState::Pending,
        }
    }
}

// -- Extracted document -------------------------------------------------------

/// A document that finished extraction and waits for review.
#[derive(Debug)]
pub struct ExtractedDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    pub name: String,
    pub result: ExtractionResult,
    /// Temporary PNG of the clean first page; artifacts are built from it.
    pub page_path: Option<PathBuf>,
    /// Temporary PNG of the first page with candidate lines outlined.
    pub preview_path: Option<PathBuf>,
    state: DocumentState,
}

impl ExtractedDocument {
    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: DocumentState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(OcrouteError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(document = %self.name, from = %self.state, to = %next, "State change");
        self.state = next;
        Ok(())
    }

    /// Case-insensitive filename, then exact filename.
    pub fn queue_key(&self) -> (String, &str) {
        (self.name.to_lowercase(), self.name.as_str())
    }

    /// Read the clean first page back from its temporary file.
    pub fn load_page(&self) -> Result<RgbImage> {
        let path = self.page_path.as_ref().ok_or_else(|| {
            OcrouteError::Image(format!("page raster of {} was already released", self.name))
        })?;
        let page = image::open(path).map_err(|err| {
            OcrouteError::Image(format!("cannot read {}: {err}", path.display()))
        })?;
        Ok(page.into_rgb8())
    }

    /// Remove the temporary page and preview files.
    ///
    /// A missing file is not an error; other failures are returned for logging.
    pub fn release(&mut self) -> Vec<OcrouteError> {
        [self.page_path.take(), self.preview_path.take()]
            .into_iter()
            .flatten()
            .filter_map(|path| match std::fs::remove_file(&path) {
                Ok(()) => None,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
                Err(err) => Some(OcrouteError::Cleanup {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                }),
            })
            .collect()
    }
}

// -- Extractor ----------------------------------------------------------------

/// Rasterizes, recognises and fuses one document at a time.
pub struct DocumentExtractor<'a, R: Rasterizer + ?Sized> {
    rasterizer: &'a R,
    adapter: &'a OcrAdapter,
    matcher: &'a CodeMatcher,
    preprocessor: Preprocessor,
    fuser: ResultFuser,
    max_pages: Option<usize>,
    /// Folder for temporary page and preview images.
    preview_dir: PathBuf,
}

impl<'a, R: Rasterizer + ?Sized> DocumentExtractor<'a, R> {
    pub fn new(
        config: &PipelineConfig,
        rasterizer: &'a R,
        adapter: &'a OcrAdapter,
        matcher: &'a CodeMatcher,
        preview_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rasterizer,
            adapter,
            matcher,
            preprocessor: Preprocessor::from_config(config),
            fuser: ResultFuser::new(config.review_threshold),
            max_pages: config.max_pages,
            preview_dir: preview_dir.into(),
        }
    }

    /// Extract candidates from one document.
    ///
    /// Only rasterization failures are returned as errors. Engine failures are
    /// recorded in the result and the document still advances, even with zero
    /// candidates.
    #[instrument(skip_all, fields(document = %source.name))]
    pub fn extract(&self, mut source: SourceDocument) -> Result<ExtractedDocument> {
        let pages = self.rasterizer.rasterize(&source.path, self.max_pages)?;
        let Some(first_page) = pages.first() else {
            return Err(OcrouteError::Render {
                document: source.name.clone(),
                reason: "document has no pages".into(),
            });
        };

        let mut candidates = Vec::new();
        let mut engine_failures = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            let prepared = self.preprocessor.prepare(page);
            let recognition = self.adapter.recognize_page(&prepared.image, index);
            for lines in &recognition.lines {
                candidates.extend(
                    self.matcher
                        .extract(lines, |polygon| prepared.to_page_coordinates(polygon)),
                );
            }
            engine_failures.extend(recognition.failures.iter().map(ToString::to_string));
        }

        let fused = self.fuser.fuse(candidates);
        let page_path = self.write_temp(&source, "page", first_page);
        let mut preview = first_page.clone();
        for candidate in &fused {
            highlight_outlines(&mut preview, &candidate.outlines);
        }
        let preview_path = self.write_temp(&source, "preview", &preview);

        info!(
            pages = pages.len(),
            candidates = fused.len(),
            engine_failures = engine_failures.len(),
            "Extraction complete"
        );

        source.state = DocumentState::Extracted;
        Ok(ExtractedDocument {
            id: source.id,
            result: ExtractionResult {
                document: source.name.clone(),
                candidates: fused,
                pages_recognised: pages.len(),
                engine_failures,
            },
            path: source.path,
            name: source.name,
            page_path,
            preview_path,
            state: source.state,
        })
    }

    /// Best effort: review can proceed without either file. A missing page
    /// file surfaces later as an artifact failure for each confirmed code.
    fn write_temp(&self, source: &SourceDocument, kind: &str, raster: &RgbImage) -> Option<PathBuf> {
        let path = temp_file(&self.preview_dir, kind, source);
        match raster.save_with_format(&path, image::ImageFormat::Png) {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not write {kind} image");
                None
            }
        }
    }
}

fn temp_file(dir: &Path, kind: &str, source: &SourceDocument) -> PathBuf {
    dir.join(format!("{kind}-{}.png", source.id))
}
