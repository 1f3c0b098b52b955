//! Postprocessing of raw grader responses.
//!
//! The upstream model answers in free text. The only structure we rely on is
//! a `Total Score: <n>/20` line; everything before the first `Total Score:`
//! marker is the justification. Parsing is total: any input yields a
//! [`ParsedResponse`], with absent fields for whatever could not be found.

use regex::Regex;
use std::sync::OnceLock;

pub const SCORE_MARKER: &str = "Total Score:";

fn score_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Total Score:\s*([0-9]+(?:\.[0-9]+)?)\s*/\s*20\b").expect("valid score pattern")
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub score: Option<f64>,
    pub justification: Option<String>,
}

impl ParsedResponse {
    pub fn is_miss(&self) -> bool {
        self.score.is_none()
    }
}

pub fn parse(raw: &str) -> ParsedResponse {
    ParsedResponse {
        score: extract_score(raw),
        justification: extract_justification(raw),
    }
}

/// First `Total Score: <n>/20` wins. Range is not validated.
pub fn extract_score(raw: &str) -> Option<f64> {
    let caps = score_pattern().captures(raw)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

/// Text preceding the first score marker, trimmed. Empty text counts as absent.
pub fn extract_justification(raw: &str) -> Option<String> {
    let idx = raw.find(SCORE_MARKER)?;
    let text = raw[..idx].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
