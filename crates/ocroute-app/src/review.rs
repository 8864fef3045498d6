// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal review collaborator.
//
//   [Enter]  confirm the listed codes as they are
//   e        type a replacement list (comma or space separated)
//   c        cancel the document, nothing is written
//
// With timestamped naming, a capture date (DD-MM-YYYY) and time (HH:MM) are
// asked once per document and applied to every confirmed code.

use std::io::{self, BufRead, Write};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ocroute_core::types::{ReviewDecision, ReviewedCode};
use ocroute_pipeline::{ReviewCollaborator, ReviewRequest};
use tracing::warn;

pub struct TerminalReviewer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalReviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn decide(&mut self, request: &ReviewRequest<'_>) -> io::Result<ReviewDecision> {
        self.show(request)?;

        let codes = loop {
            let Some(choice) = self.ask("[Enter] confirm  [e] edit  [c] cancel > ")? else {
                return Ok(ReviewDecision::Cancelled);
            };
            match choice.to_ascii_lowercase().as_str() {
                "" => break request.candidates.iter().map(|c| c.code.clone()).collect::<Vec<_>>(),
                "c" => return Ok(ReviewDecision::Cancelled),
                "e" => {
                    let Some(line) = self.ask("codes > ")? else {
                        return Ok(ReviewDecision::Cancelled);
                    };
                    break split_codes(&line);
                }
                other => writeln!(self.output, "unknown choice `{other}`")?,
            }
        };

        if !request.needs_capture_time() || codes.is_empty() {
            return Ok(ReviewDecision::confirm_codes(codes));
        }
        let Some(captured_at) = self.ask_capture_time()? else {
            return Ok(ReviewDecision::Cancelled);
        };
        Ok(ReviewDecision::Confirmed(
            codes
                .into_iter()
                .map(|code| ReviewedCode::with_capture_time(code, captured_at))
                .collect(),
        ))
    }

    fn show(&mut self, request: &ReviewRequest<'_>) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "[{}/{}] {}",
            request.position, request.total, request.document
        )?;
        if let Some(path) = request.preview_path {
            writeln!(self.output, "  preview: {}", path.display())?;
        }
        if request.candidates.is_empty() {
            writeln!(self.output, "  no codes found, use [e] to type them")?;
        }
        if request.candidates.iter().any(|c| c.needs_review) {
            writeln!(
                self.output,
                "  ! = confidence below {:.2}",
                request.review_threshold
            )?;
        }
        for candidate in request.candidates {
            let marker = if candidate.needs_review { " !" } else { "" };
            writeln!(
                self.output,
                "  {}  {:.2}{marker}",
                candidate.code, candidate.confidence
            )?;
        }
        Ok(())
    }

    fn ask_capture_time(&mut self) -> io::Result<Option<NaiveDateTime>> {
        let date = loop {
            let Some(text) = self.ask("capture date (DD-MM-YYYY) > ")? else {
                return Ok(None);
            };
            match NaiveDate::parse_from_str(&text, "%d-%m-%Y") {
                Ok(date) => break date,
                Err(_) => writeln!(self.output, "invalid date `{text}`, use DD-MM-YYYY")?,
            }
        };
        let time = loop {
            let Some(text) = self.ask("capture time (HH:MM) > ")? else {
                return Ok(None);
            };
            match NaiveTime::parse_from_str(&text, "%H:%M") {
                Ok(time) => break time,
                Err(_) => writeln!(self.output, "invalid time `{text}`, use HH:MM (00:00-23:59)")?,
            }
        };
        Ok(Some(date.and_time(time)))
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> ReviewCollaborator for TerminalReviewer<R, W> {
    fn review(&mut self, request: &ReviewRequest<'_>) -> ReviewDecision {
        match self.decide(request) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(document = request.document, error = %err, "Terminal unavailable, cancelling");
                ReviewDecision::Cancelled
            }
        }
    }
}

fn split_codes(line: &str) -> Vec<String> {
    line.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocroute_core::config::NamingScheme;
    use ocroute_core::types::FusedCandidate;
    use std::io::Cursor;

    fn candidate(code: &str, confidence: f32) -> FusedCandidate {
        FusedCandidate {
            code: code.into(),
            confidence,
            polygon: None,
            outlines: Vec::new(),
            engines: vec!["tesseract".into()],
            needs_review: confidence < 0.7,
        }
    }

    fn run(input: &str, naming: NamingScheme, candidates: &[FusedCandidate]) -> (ReviewDecision, String) {
        let request = ReviewRequest {
            document: "cmr.pdf",
            position: 2,
            total: 5,
            candidates,
            preview_path: None,
            naming,
            review_threshold: 0.7,
        };
        let mut output = Vec::new();
        let decision = TerminalReviewer::new(Cursor::new(input.as_bytes()), &mut output).review(&request);
        (decision, String::from_utf8(output).expect("utf-8"))
    }

    #[test]
    fn enter_confirms_candidates_unedited() {
        let candidates = [candidate("0011223344", 0.91), candidate("5566778899", 0.42)];
        let (decision, shown) = run("\n", NamingScheme::Plain, &candidates);

        assert_eq!(decision, ReviewDecision::confirm_codes(["0011223344", "5566778899"]));
        assert!(shown.contains("[2/5] cmr.pdf"));
        assert!(shown.contains("5566778899  0.42 !"), "{shown}");
        assert!(!shown.contains("0011223344  0.91 !"));
        assert!(shown.contains("! = confidence below 0.70"), "{shown}");
    }

    #[test]
    fn threshold_legend_only_when_something_is_flagged() {
        let candidates = [candidate("0011223344", 0.91)];
        let (_, shown) = run("\n", NamingScheme::Plain, &candidates);
        assert!(!shown.contains("confidence below"), "{shown}");
    }

    #[test]
    fn edit_replaces_the_list() {
        let candidates = [candidate("0011223344", 0.91)];
        let (decision, _) = run("e\n0011223345, 7777777777 \n", NamingScheme::Plain, &candidates);
        assert_eq!(decision, ReviewDecision::confirm_codes(["0011223345", "7777777777"]));
    }

    #[test]
    fn cancel_and_end_of_input_both_cancel() {
        let candidates = [candidate("0011223344", 0.91)];
        assert_eq!(run("c\n", NamingScheme::Plain, &candidates).0, ReviewDecision::Cancelled);
        assert_eq!(run("", NamingScheme::Plain, &candidates).0, ReviewDecision::Cancelled);
    }

    #[test]
    fn unknown_choice_is_asked_again() {
        let candidates = [candidate("0011223344", 0.91)];
        let (decision, shown) = run("x\n\n", NamingScheme::Plain, &candidates);
        assert!(decision.is_confirmed());
        assert!(shown.contains("unknown choice `x`"));
    }

    #[test]
    fn timestamped_naming_asks_until_date_and_time_are_valid() {
        let candidates = [candidate("0011223344", 0.91)];
        let (decision, shown) = run(
            "\n2024-05-12\n12-05-2024\n24:10\n09:05\n",
            NamingScheme::Timestamped,
            &candidates,
        );

        let expected = NaiveDate::from_ymd_opt(2024, 5, 12)
            .and_then(|d| d.and_hms_opt(9, 5, 0))
            .expect("valid");
        assert_eq!(
            decision,
            ReviewDecision::Confirmed(vec![ReviewedCode::with_capture_time("0011223344", expected)])
        );
        assert!(shown.contains("invalid date `2024-05-12`"));
        assert!(shown.contains("invalid time `24:10`"));
    }

    #[test]
    fn empty_document_can_be_filled_by_hand() {
        let (decision, shown) = run("e\n1234567890\n", NamingScheme::Plain, &[]);
        assert_eq!(decision, ReviewDecision::confirm_codes(["1234567890"]));
        assert!(shown.contains("no codes found"));
    }
}
