//! Regex-driven fallback scan used when the engine's parser rejects a source.
//!
//! Every `{{ ... }}` region is inspected on its own. The scan cannot tell
//! all helper and argument shapes apart, so its answers are approximate,
//! but it never fails.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::path::{base_variable, is_literal};

static REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("region pattern is valid"));

static INDEXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_$][\w$-]*)\[").expect("index pattern is valid"));

/// Markers that open non-reference regions: block open, block close,
/// inverse, partial, comment.
const SKIPPED_MARKERS: &[char] = &['#', '/', '^', '>', '!'];

/// Result of a lexical scan.
#[derive(Debug, Default)]
pub(crate) struct LexicalScan {
    pub variables: IndexSet<String>,
    /// Number of `{{ ... }}` regions found, skipped ones included.
    pub regions: usize,
}

pub(crate) fn scan(source: &str) -> LexicalScan {
    let mut result = LexicalScan::default();

    for capture in REGION.captures_iter(source) {
        result.regions += 1;
        let content = clean_region(&capture[1]);

        if content.is_empty() || content.starts_with(SKIPPED_MARKERS) || content == "else" {
            continue;
        }
        // `{{else if cond}}` carries a condition worth reading.
        let content = content.strip_prefix("else ").unwrap_or(content).trim();

        for candidate in candidates(&tokenize(content)) {
            if let Some(name) = candidate_variable(candidate) {
                result.variables.insert(name);
            }
        }
    }

    result
}

/// Strips triple-stash braces, whitespace control and the unescape marker.
fn clean_region(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('{')
        .trim_start_matches('~')
        .trim_end_matches('~')
        .trim_start_matches('&')
        .trim()
}

/// Picks the tokens that may name variables.
///
/// More than one token with a plain first token reads as a helper call:
/// only the arguments are candidates. Otherwise the first token is the
/// expression itself.
fn candidates<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    match tokens {
        [] => Vec::new(),
        [first, rest @ ..] if !rest.is_empty() && !first.contains(['.', '[']) => rest.to_vec(),
        [first, ..] => vec![*first],
    }
}

fn candidate_variable(token: &str) -> Option<String> {
    // A token opening a sub-expression names its helper.
    if token.starts_with('(') {
        return None;
    }
    let token = token.trim_end_matches(')');
    // Hash arguments: only the value side can reference data.
    let token = match token.split_once('=') {
        Some((_, value)) if !token.starts_with(['"', '\'']) => value,
        _ => token,
    };

    if token.is_empty() || is_literal(token) {
        return None;
    }
    if let Some(capture) = INDEXED.captures(token) {
        return base_variable(&capture[1]);
    }
    base_variable(token)
}

/// Splits on whitespace, keeping quoted strings together.
fn tokenize(content: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (i, c) in content.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&content[s..i]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
    }
    if let Some(s) = start {
        tokens.push(&content[s..]);
    }

    tokens
}
