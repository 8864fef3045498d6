// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCRoute: shipment code extraction for scanned transport documents
//
// Entry point. Initialises logging, checks the activation record, builds the
// pipeline from flags and saved settings, then runs one batch with terminal
// review.

mod cli;
mod license;
mod review;
mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use ocroute_core::AppConfig;
use ocroute_core::config::{NamingScheme, PipelineConfig};
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::human_errors::{Severity, humanize_error};
use ocroute_document::{
    DocumentRasterizer, OcrAdapter, RecognitionEngine, TesseractConfig, TesseractEngine,
};
use ocroute_pipeline::{AcceptAll, BatchOrchestrator, BatchReport, CodeMatcher, ReviewCollaborator};
use tracing::{info, warn};

use cli::{Args, EngineKind};
use review::TerminalReviewer;
use services::{config_store, data_dir};

const DIGITS: &str = "0123456789";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            let notice = humanize_error(&err);
            eprintln!("{} {}", notice.message, notice.suggestion);
            tracing::error!(error = %err, "OCRoute stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    info!("OCRoute starting");
    let data_dir = data_dir::data_dir();

    let license_path = args
        .license
        .clone()
        .unwrap_or_else(|| data_dir.join(license::LICENSE_FILE));
    let record = license::check_license(&license_path, Local::now().naive_local())?;
    info!(expires_on = %record.expires_on, "License valid");

    let mut app_config = config_store::load_config(&data_dir).unwrap_or_default();
    args.remember(&mut app_config);
    if let Err(err) = config_store::persist_config(&data_dir, &app_config) {
        warn!(error = %err, "Could not save settings");
    }

    // Everything that can fail on configuration fails here, before any document is read.
    let pipeline = args.pipeline_config();
    pipeline.validate()?;
    check_review_mode(args.accept_all, &pipeline)?;
    let matcher = build_matcher(&app_config, pipeline.code_length)?;
    let adapter = build_adapter(args, &data_dir, matcher.prefixes().is_empty())?;
    let rasterizer = DocumentRasterizer::new(pipeline.render_scale);
    let orchestrator = BatchOrchestrator::new(&pipeline, &rasterizer, &adapter, &matcher)?;
    let output = required_folder(&app_config.output_folder, "output", "--output")?;

    let mut reviewer: Box<dyn ReviewCollaborator> = if args.accept_all {
        Box::new(AcceptAll)
    } else {
        Box::new(TerminalReviewer::new(std::io::stdin().lock(), std::io::stdout()))
    };

    let report = match &args.input {
        Some(input) => orchestrator.run_single(input, &output, reviewer.as_mut())?,
        None => {
            let source = required_folder(&app_config.source_folder, "source", "--source")?;
            orchestrator.run_folder(&source, &output, reviewer.as_mut())?
        }
    };

    Ok(print_report(&report))
}

fn build_matcher(app_config: &AppConfig, code_length: usize) -> Result<CodeMatcher> {
    if app_config.preamble_file.is_empty() {
        return CodeMatcher::fixed(code_length);
    }
    CodeMatcher::from_prefix_file(Path::new(&app_config.preamble_file), code_length)
}

fn build_adapter(args: &Args, data_dir: &Path, digits_only: bool) -> Result<OcrAdapter> {
    let mut engines: Vec<Box<dyn RecognitionEngine>> = Vec::new();
    for kind in args.engine_kinds() {
        match kind {
            EngineKind::Tesseract => {
                let engine = TesseractEngine::new(TesseractConfig {
                    languages: args.tesseract_lang.clone(),
                    char_whitelist: digits_only.then(|| DIGITS.to_string()),
                    ..TesseractConfig::default()
                });
                match engine.probe() {
                    Ok(version) => {
                        info!(%version, "Tesseract available");
                        engines.push(Box::new(engine));
                    }
                    Err(err) => warn!(error = %err, "Tesseract engine disabled"),
                }
            }
            EngineKind::Ocrs => engines.push(ocrs_engine(args, data_dir)?),
        }
    }
    OcrAdapter::new(engines)
}

#[cfg(feature = "ocrs")]
fn ocrs_engine(args: &Args, data_dir: &Path) -> Result<Box<dyn RecognitionEngine>> {
    let dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("models"));
    Ok(Box::new(ocroute_document::OcrsEngine::from_model_dir(dir)?))
}

#[cfg(not(feature = "ocrs"))]
fn ocrs_engine(_args: &Args, _data_dir: &Path) -> Result<Box<dyn RecognitionEngine>> {
    Err(OcrouteError::Config(
        "this build has no ocrs engine; rebuild with `--features ocrs` or pass `--engine tesseract`"
            .into(),
    ))
}

/// Timestamped names need a capture time per code, which only an operator can give.
fn check_review_mode(accept_all: bool, pipeline: &PipelineConfig) -> Result<()> {
    if accept_all && pipeline.naming == NamingScheme::Timestamped {
        return Err(OcrouteError::Config(
            "--accept-all cannot be combined with --naming timestamped; \
             timestamped names need a capture date and time for every code"
                .into(),
        ));
    }
    Ok(())
}

fn required_folder(saved: &str, what: &str, flag: &str) -> Result<PathBuf> {
    if saved.is_empty() {
        return Err(OcrouteError::Config(format!(
            "no {what} folder given; pass {flag} once and it will be remembered"
        )));
    }
    Ok(PathBuf::from(saved))
}

/// Print per-file problems and a summary. Non-zero exit when anything needs attention.
fn print_report(report: &BatchReport) -> ExitCode {
    let mut attention = false;

    for skipped in &report.skipped {
        attention = true;
        eprintln!("{}", humanize_error(&skipped.error).for_file(&skipped.name));
    }
    for outcome in &report.outcomes {
        for failure in &outcome.failures {
            let notice = humanize_error(failure);
            if notice.severity != Severity::Ignorable {
                attention = true;
                eprintln!("{}", notice.for_file(&outcome.document));
            }
        }
    }
    if let Some(err) = &report.backup_error {
        attention = true;
        let notice = humanize_error(err);
        eprintln!("{} {}", notice.message, notice.suggestion);
    }
    if let Some(backup) = &report.backup {
        for failure in &backup.failures {
            let notice = humanize_error(failure);
            eprintln!("{} {}", notice.message, notice.suggestion);
        }
        println!(
            "backup: {} ({} of {} files)",
            backup.folder.display(),
            backup.copied.len(),
            report.discovered
        );
    }

    println!(
        "{} reviewed, {} skipped, {} PDFs written",
        report.outcomes.len(),
        report.skipped.len(),
        report.artifacts_written()
    );

    if attention {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_matcher_without_prefix_file() {
        let matcher = build_matcher(&AppConfig::default(), 10).expect("matcher");
        assert!(matcher.prefixes().is_empty());
        assert_eq!(matcher.code_length(), 10);
    }

    #[test]
    fn prefix_file_problems_stop_before_processing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("prefixes.txt");
        std::fs::write(&empty, "\n  \n").expect("write");
        let config = AppConfig {
            preamble_file: empty.display().to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            build_matcher(&config, 10),
            Err(OcrouteError::PatternConfig(_))
        ));
    }

    #[test]
    fn unattended_review_refuses_timestamped_names() {
        let args = Args::try_parse_from(["ocroute", "--accept-all", "--naming", "timestamped"])
            .expect("parse");
        let err = check_review_mode(args.accept_all, &args.pipeline_config())
            .expect_err("no capture time without an operator");
        assert!(matches!(err, OcrouteError::Config(_)));
        assert!(err.to_string().contains("--accept-all"), "{err}");

        let plain = Args::try_parse_from(["ocroute", "--accept-all"]).expect("parse");
        check_review_mode(plain.accept_all, &plain.pipeline_config()).expect("plain names");
        let attended = Args::try_parse_from(["ocroute", "--naming", "timestamped"]).expect("parse");
        check_review_mode(attended.accept_all, &attended.pipeline_config())
            .expect("operator gives the time");
    }

    #[test]
    fn missing_folder_names_the_flag() {
        let err = required_folder("", "output", "--output").expect_err("missing");
        assert!(err.to_string().contains("--output"));
    }
}
