// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line flags.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ocroute_core::config::{NamingScheme, PipelineConfig};
use ocroute_core::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "ocroute")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find shipment codes on scanned transport documents and file one PDF per code", long_about = None)]
pub struct Args {
    /// Folder of source PDFs. Remembered for the next run.
    #[arg(long, conflicts_with = "input")]
    pub source: Option<PathBuf>,

    /// Process a single PDF or image instead of a folder (no backup is made)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Folder for output PDFs and the backup. Remembered for the next run.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Prefix list, one per line. Switches to prefix-constrained matching.
    #[arg(long, conflicts_with = "no_prefixes")]
    pub prefixes: Option<PathBuf>,

    /// Forget a remembered prefix list and match plain digit runs
    #[arg(long)]
    pub no_prefixes: bool,

    /// Total code length
    #[arg(long, default_value_t = 10)]
    pub code_length: usize,

    #[arg(long, value_enum, default_value_t = Naming::Plain)]
    pub naming: Naming,

    /// Put each document's PDFs in a subfolder named after the source file
    #[arg(long)]
    pub per_document_folder: bool,

    /// Recognition engine; repeat to run several
    #[arg(long = "engine", value_enum)]
    pub engines: Vec<EngineKind>,

    /// Folder holding text-detection.rten and text-recognition.rten
    #[arg(long, env = "OCROUTE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Tesseract language list, e.g. `ita+eng`
    #[arg(long, default_value = "eng")]
    pub tesseract_lang: String,

    /// PDF zoom factor
    #[arg(long, default_value_t = 3.0)]
    pub scale: f32,

    /// Recognise every page, not only the first
    #[arg(long)]
    pub all_pages: bool,

    /// Candidates below this confidence are marked with `!`
    #[arg(long, default_value_t = 0.70)]
    pub review_threshold: f32,

    /// Activation record (default: license.json in the data directory)
    #[arg(long, env = "OCROUTE_LICENSE")]
    pub license: Option<PathBuf>,

    /// Confirm every candidate without prompting
    #[arg(long)]
    pub accept_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Naming {
    /// <CODE>.pdf
    Plain,
    /// POD_<CODE>_<YYYYMMDDHHMM>.pdf, date and time asked at review
    Timestamped,
}

impl From<Naming> for NamingScheme {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::Plain => NamingScheme::Plain,
            Naming::Timestamped => NamingScheme::Timestamped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    Ocrs,
    Tesseract,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            render_scale: self.scale,
            max_pages: if self.all_pages { None } else { Some(1) },
            code_length: self.code_length,
            review_threshold: self.review_threshold,
            naming: self.naming.into(),
            per_document_subfolder: self.per_document_folder,
            ..PipelineConfig::default()
        }
    }

    /// Fold the folders given on this run into the saved config.
    pub fn remember(&self, config: &mut AppConfig) {
        if let Some(source) = &self.source {
            config.source_folder = source.display().to_string();
        }
        if let Some(output) = &self.output {
            config.output_folder = output.display().to_string();
        }
        if let Some(prefixes) = &self.prefixes {
            config.preamble_file = prefixes.display().to_string();
        }
        if self.no_prefixes {
            config.preamble_file.clear();
        }
    }

    /// Engines to run, falling back to the build's default set.
    pub fn engine_kinds(&self) -> Vec<EngineKind> {
        if !self.engines.is_empty() {
            let mut kinds = Vec::with_capacity(self.engines.len());
            for kind in &self.engines {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
            return kinds;
        }
        if cfg!(feature = "ocrs") {
            vec![EngineKind::Ocrs, EngineKind::Tesseract]
        } else {
            vec![EngineKind::Tesseract]
        }
    }
}
