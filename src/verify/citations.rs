//! Citation extraction from completion text.
//!
//! Matching is purely syntactic: a line "looks like" a citation when it has
//! the shape of one. Nothing here checks that a URL resolves, that a DOI is
//! registered, or that the cited work supports the answer.

use std::sync::LazyLock;

use regex::Regex;

use super::prompts::DELIMITER;

/// At most this many citations are kept per answer, first come first served.
pub const MAX_CITATIONS: usize = 3;

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]\n]+\]\(\s*[^)\s]+\s*\)").expect("valid regex")
});

// Host must end in .edu, .gov or .ac.<cc>; a following char has to end the host.
static ACADEMIC_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bhttps?://(?:[a-z0-9-]+\.)+(?:edu|gov|ac\.[a-z]{2})\.?(?:$|[/:?#\s)\]>,;"'])"#,
    )
    .expect("valid regex")
});

static DOI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdoi:\s*10\.\d{4,9}/[-._;()/:a-z0-9]+").expect("valid regex")
});

static ARXIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\barxiv:\s*\d+\.\d+(?:v\d+)?\b").expect("valid regex")
});

/// Which shape check a line passed. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationShape {
    MarkdownLink,
    AcademicUrl,
    Doi,
    Arxiv,
}

/// A source line that passed the shape check. Lines that fail are dropped,
/// so every `Citation` is a valid one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub text: String,
    pub shape: CitationShape,
}

/// Completion text split at the delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub answer_text: String,
    pub raw_source_block: Option<String>,
    /// Untouched completion text, replayed as the assistant turn on retry.
    pub raw: String,
}

pub fn looks_like_citation(line: &str) -> Option<CitationShape> {
    if MARKDOWN_LINK_RE.is_match(line) {
        Some(CitationShape::MarkdownLink)
    } else if ACADEMIC_URL_RE.is_match(line) {
        Some(CitationShape::AcademicUrl)
    } else if DOI_RE.is_match(line) {
        Some(CitationShape::Doi)
    } else if ARXIV_RE.is_match(line) {
        Some(CitationShape::Arxiv)
    } else {
        None
    }
}

pub fn split_answer(text: &str) -> CompletionResult {
    match text.find(DELIMITER) {
        Some(pos) => CompletionResult {
            answer_text: text[..pos].trim().to_string(),
            raw_source_block: Some(text[pos + DELIMITER.len()..].trim().to_string()),
            raw: text.to_string(),
        },
        None => CompletionResult {
            answer_text: text.trim().to_string(),
            raw_source_block: None,
            raw: text.to_string(),
        },
    }
}

/// Citation-shaped lines after the first delimiter, in order, capped at
/// [`MAX_CITATIONS`]. No delimiter means no citations.
pub fn extract_sources(text: &str) -> Vec<Citation> {
    let Some(pos) = text.find(DELIMITER) else {
        return Vec::new();
    };

    text[pos + DELIMITER.len()..]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            looks_like_citation(line).map(|shape| Citation {
                text: line.to_string(),
                shape,
            })
        })
        .take(MAX_CITATIONS)
        .collect()
}
