//! Syntax error diagnostics.
//!
//! The engine reports compile failures as free text. [`SyntaxError::diagnose`]
//! recovers what it can from that text: a line and column when the message
//! carries one, a small window of surrounding source lines, and advisory
//! suggestions keyed on phrases in the message. None of this is guaranteed
//! to succeed; the original message is always kept.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines shown on each side of the offending line.
const CONTEXT_RADIUS: usize = 2;

static LINE_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)line\s*(\d+)\s*[,:]?\s*col(?:umn)?\s*(\d+)").expect("line pattern is valid")
});

static POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":(\d+):(\d+)").expect("position pattern is valid"));

/// A template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The engine's own description of the problem.
    pub message: String,
    /// Human-readable template name, when one was configured.
    pub template: Option<String>,
    /// 1-based line of the error, when derivable.
    pub line: Option<usize>,
    /// 1-based column of the error, when derivable.
    pub column: Option<usize>,
    /// `(line number, text)` pairs around the offending line.
    pub context: Vec<(usize, String)>,
    /// Advisory hints; may be empty.
    pub suggestions: Vec<String>,
}

impl SyntaxError {
    /// Builds a diagnostic from an engine compile error.
    ///
    /// The position the engine reports wins; the error text is only searched
    /// when the engine has none.
    pub fn from_engine(err: &handlebars::TemplateError, source: &str, template: Option<&str>) -> Self {
        let mut diagnostic = Self::diagnose(&err.to_string(), source, template);
        diagnostic.message = err.reason().to_string();
        if let Some((line, column)) = err.pos() {
            diagnostic.line = Some(line);
            diagnostic.column = Some(column);
            diagnostic.context = excerpt(source, line);
        }
        diagnostic
    }

    /// Builds a diagnostic from raw error text.
    pub fn diagnose(message: &str, source: &str, template: Option<&str>) -> Self {
        let (line, column) = locate(message);
        let context = line.map(|line| excerpt(source, line)).unwrap_or_default();
        Self {
            message: message.trim().to_string(),
            template: template.map(str::to_string),
            line,
            column,
            context,
            suggestions: suggest(message),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("template syntax error")?;
        if let Some(name) = &self.template {
            write!(f, " in '{}'", name)?;
        }
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, " at line {}, column {}", line, column)?,
            (Some(line), None) => write!(f, " at line {}", line)?,
            _ => {}
        }
        write!(f, ": {}", self.message)?;

        if !self.context.is_empty() {
            let width = self
                .context
                .last()
                .map_or(1, |(number, _)| number.to_string().len());
            f.write_str("\n")?;
            for (number, text) in &self.context {
                let marker = if Some(*number) == self.line { '>' } else { ' ' };
                write!(f, "\n{} {:>width$} | {}", marker, number, text, width = width)?;
            }
        }

        if !self.suggestions.is_empty() {
            f.write_str("\n\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

fn locate(message: &str) -> (Option<usize>, Option<usize>) {
    let captures = LINE_COLUMN
        .captures(message)
        .or_else(|| POSITION.captures(message));
    match captures {
        Some(c) => (c[1].parse().ok(), c[2].parse().ok()),
        None => (None, None),
    }
}

fn excerpt(source: &str, line: usize) -> Vec<(usize, String)> {
    let first = line.saturating_sub(CONTEXT_RADIUS).max(1);
    let last = line + CONTEXT_RADIUS;
    source
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text))
        .filter(|(number, _)| (first..=last).contains(number))
        .map(|(number, text)| (number, text.to_string()))
        .collect()
}

fn suggest(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut hints = Vec::new();
    if lower.contains("closing") || lower.contains("unclosed") {
        hints.push("Check that every block tag ({{#if}}, {{#each}}, ...) has a matching closing tag.".to_string());
    }
    if lower.contains("mismatch") || lower.contains("was opened") {
        hints.push("A block was closed with a different name than it was opened with.".to_string());
    }
    if lower.contains("helper") && lower.contains("not found") {
        hints.push("Make sure the helper is registered and its name is spelled correctly.".to_string());
    }
    if lower.contains("partial") {
        hints.push("Make sure the partial is registered before the template that includes it.".to_string());
    }
    if lower.contains("expected") || lower.contains("parse") || lower.contains("invalid") {
        hints.push("Check for unbalanced braces or stray characters inside {{ }}.".to_string());
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "line one\nline two\nline three\nline four\nline five\nline six";

    #[test]
    fn test_locates_line_and_column() {
        let err = SyntaxError::diagnose("error at line 4, col 7: bad", SOURCE, None);
        assert_eq!(err.line, Some(4));
        assert_eq!(err.column, Some(7));
        let lines: Vec<usize> = err.context.iter().map(|(n, _)| *n).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_locates_colon_position() {
        let err = SyntaxError::diagnose("Template error in \"main\":1:3", SOURCE, Some("main"));
        assert_eq!((err.line, err.column), (Some(1), Some(3)));
        let lines: Vec<usize> = err.context.iter().map(|(n, _)| *n).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_no_location_no_context() {
        let err = SyntaxError::diagnose("something broke", SOURCE, None);
        assert_eq!(err.line, None);
        assert!(err.context.is_empty());
        assert!(err.suggestions.is_empty());
    }

    #[test]
    fn test_suggestions_by_phrase() {
        let closing = SyntaxError::diagnose("helper \"if\" was opened, but \"each\" is closing", "", None);
        assert!(closing.suggestions.iter().any(|s| s.contains("matching closing tag")));

        let helper = SyntaxError::diagnose("Helper not found: shout", "", None);
        assert!(helper.suggestions.iter().any(|s| s.contains("registered")));
    }

    #[test]
    fn test_display_includes_everything() {
        let err = SyntaxError::diagnose("unclosed block at line 2, column 1", SOURCE, Some("greeting"));
        let text = err.to_string();
        assert!(text.contains("in 'greeting'"));
        assert!(text.contains("at line 2, column 1"));
        assert!(text.contains("> 2 | line two"));
        assert!(text.contains("Suggestions:"));
    }

    #[test]
    fn test_from_engine_error() {
        let err = handlebars::Template::compile("{{#if a}}x{{/each}}").unwrap_err();
        let diagnostic = SyntaxError::from_engine(&err, "{{#if a}}x{{/each}}", None);
        assert!(!diagnostic.message.is_empty());
        assert!(!diagnostic.suggestions.is_empty());
    }

    #[test]
    fn test_from_engine_uses_reported_position() {
        let source = "one\ntwo\n{{#if a}}\nfour\n{{/each}}\nsix";
        let err = handlebars::Template::compile(source).unwrap_err();
        let diagnostic = SyntaxError::from_engine(&err, source, Some("pos"));
        let (line, column) = err.pos().unwrap();
        assert_eq!(diagnostic.line, Some(line));
        assert_eq!(diagnostic.column, Some(column));
        assert!(diagnostic.context.iter().any(|(n, _)| *n == line));
    }
}
