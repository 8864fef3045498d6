// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Code extraction: finds candidate codes in recognised text lines.
//
// Two modes:
// - fixed length: a word-bounded run of exactly N digits
// - prefix constrained: a token that starts with one configured prefix and is
//   exactly N characters long, the rest letters or digits

use std::path::Path;

use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::{CandidateCode, EngineLines, Polygon};
use regex::Regex;
use tracing::{debug, info, instrument};

/// Compiled matcher for one batch. Built once before processing starts.
#[derive(Debug, Clone)]
pub struct CodeMatcher {
    length: usize,
    mode: MatchMode,
}

#[derive(Debug, Clone)]
enum MatchMode {
    /// Unanchored `\b[0-9]{N}\b`, applied to the whole line.
    Fixed(Regex),
    /// Anchored union of `prefix[[:alnum:]]{N - len}`, applied per token.
    Prefixed { prefixes: Vec<String>, pattern: Regex },
}

impl CodeMatcher {
    /// Fixed-length digit codes.
    pub fn fixed(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(OcrouteError::PatternConfig("code length must be positive".into()));
        }
        let pattern = Regex::new(&format!(r"\b[0-9]{{{length}}}\b"))
            .map_err(|err| OcrouteError::PatternConfig(err.to_string()))?;
        Ok(Self {
            length,
            mode: MatchMode::Fixed(pattern),
        })
    }

    /// Prefix-constrained codes of total length `length`.
    ///
    /// Every prefix must be non-empty and strictly shorter than `length`.
    pub fn with_prefixes<I, S>(prefixes: I, length: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if length == 0 {
            return Err(OcrouteError::PatternConfig("code length must be positive".into()));
        }
        let mut seen = std::collections::HashSet::new();
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix: &String| seen.insert(prefix.clone()))
            .collect();
        if prefixes.is_empty() {
            return Err(OcrouteError::PatternConfig("no prefixes configured".into()));
        }

        let mut alternatives = Vec::with_capacity(prefixes.len());
        for prefix in &prefixes {
            let prefix_len = prefix.chars().count();
            if prefix_len == 0 {
                return Err(OcrouteError::PatternConfig("empty prefix".into()));
            }
            if prefix_len >= length {
                return Err(OcrouteError::PatternConfig(format!(
                    "prefix `{prefix}` has {prefix_len} characters; codes are {length} long"
                )));
            }
            alternatives.push(format!(
                r"{}[[:alnum:]]{{{}}}",
                regex::escape(prefix),
                length - prefix_len
            ));
        }

        let pattern = Regex::new(&format!("^(?:{})$", alternatives.join("|")))
            .map_err(|err| OcrouteError::PatternConfig(err.to_string()))?;
        Ok(Self {
            length,
            mode: MatchMode::Prefixed { prefixes, pattern },
        })
    }

    /// Load prefixes from a text file, one per line, blank lines ignored.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), length))]
    pub fn from_prefix_file(path: impl AsRef<Path>, length: usize) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            OcrouteError::PatternConfig(format!("cannot read {}: {}", path.display(), err))
        })?;
        let prefixes = parse_prefixes(&content);
        if prefixes.is_empty() {
            return Err(OcrouteError::PatternConfig(format!(
                "{} contains no prefixes",
                path.display()
            )));
        }
        info!(count = prefixes.len(), "Prefix list loaded");
        Self::with_prefixes(prefixes, length)
    }

    pub fn code_length(&self) -> usize {
        self.length
    }

    /// Configured prefixes; empty in fixed-length mode.
    pub fn prefixes(&self) -> &[String] {
        match &self.mode {
            MatchMode::Fixed(_) => &[],
            MatchMode::Prefixed { prefixes, .. } => prefixes,
        }
    }

    /// All codes in `text`, in order of appearance. Repeats are kept.
    pub fn find_codes(&self, text: &str) -> Vec<String> {
        match &self.mode {
            MatchMode::Fixed(pattern) => pattern
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            MatchMode::Prefixed { pattern, .. } => text
                .split_whitespace()
                .filter_map(|token| {
                    if pattern.is_match(token) {
                        return Some(token);
                    }
                    let trimmed = trim_token(token);
                    pattern.is_match(trimmed).then_some(trimmed)
                })
                .map(str::to_string)
                .collect(),
        }
    }

    /// Candidates for every line one engine produced on one page.
    ///
    /// `to_page` maps line polygons into page coordinates.
    pub fn extract(
        &self,
        lines: &EngineLines,
        to_page: impl Fn(&Polygon) -> Polygon,
    ) -> Vec<CandidateCode> {
        let mut candidates = Vec::new();
        for (index, line) in lines.lines.iter().enumerate() {
            for code in self.find_codes(&line.text) {
                debug!(engine = %lines.engine, page = lines.page, line = index, %code, "Candidate found");
                candidates.push(CandidateCode {
                    code,
                    confidence: line.confidence,
                    polygon: line.polygon.as_ref().map(&to_page),
                    engine: lines.engine.clone(),
                    page: lines.page,
                    line: index,
                });
            }
        }
        candidates
    }
}

/// Split a prefix file into trimmed, non-empty lines.
pub fn parse_prefixes(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip punctuation that OCR attaches to the ends of a token.
fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}
