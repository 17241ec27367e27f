//! Fluent construction of template sources.
//!
//! [`TemplateBuilder`] accumulates markdown-flavored fragments into sections.
//! Fragments within a section are joined with a newline; sections are joined
//! with a blank line. A section ends when [`section`](TemplateBuilder::section)
//! is called or a heading starts while content is pending.
//!
//! Output is exactly what the calls produce; nothing is validated or escaped.
//!
//! ```rust
//! use quill::TemplateBuilder;
//!
//! let source = TemplateBuilder::new()
//!     .heading(1, "Report")
//!     .text("Prepared for ")
//!     .variable("customer")
//!     .heading(2, "Items")
//!     .list(["one", "two"])
//!     .build();
//!
//! assert_eq!(source, "# Report\nPrepared for \n{{customer}}\n\n## Items\n- one\n- two");
//! ```

use std::fmt::Debug;

use serde::Serialize;

use crate::error::Result;
use crate::template::{Template, TemplateOptions};

const MIN_HEADING: usize = 1;
const MAX_HEADING: usize = 6;

/// Accumulates fragments into a template source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateBuilder {
    sections: Vec<String>,
    pending: Vec<String>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, fragment: impl Into<String>) -> Self {
        self.pending.push(fragment.into());
        self
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.sections.push(self.pending.join("\n"));
            self.pending.clear();
        }
    }

    /// Ends the current section.
    pub fn section(mut self) -> Self {
        self.flush();
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.push(text)
    }

    /// Verbatim text, for template syntax the builder has no method for.
    pub fn raw(self, text: impl Into<String>) -> Self {
        self.push(text)
    }

    /// A heading; starts a new section. `level` is clamped to 1..=6.
    pub fn heading(mut self, level: usize, text: impl AsRef<str>) -> Self {
        self.flush();
        let level = level.clamp(MIN_HEADING, MAX_HEADING);
        self.push(format!("{} {}", "#".repeat(level), text.as_ref()))
    }

    /// A fenced code block with an optional language tag.
    pub fn code(self, code: impl AsRef<str>, language: Option<&str>) -> Self {
        let fence = format!("```{}\n{}\n```", language.unwrap_or(""), code.as_ref());
        self.push(fence)
    }

    pub fn list<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = items
            .into_iter()
            .map(|item| format!("- {}", item.as_ref()))
            .collect();
        self.push(lines.join("\n"))
    }

    pub fn ordered_list<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
            .collect();
        self.push(lines.join("\n"))
    }

    /// A pipe table: header row, dash separator row, then one row per entry.
    pub fn table<H, R, S>(self, headers: H, rows: R) -> Self
    where
        H: IntoIterator<Item = S>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers.into_iter().map(|h| h.as_ref().to_string()).collect();
        let mut lines = vec![
            table_row(headers.iter()),
            table_row(headers.iter().map(|_| "---")),
        ];
        for row in rows {
            let cells: Vec<String> = row.into_iter().map(|c| c.as_ref().to_string()).collect();
            lines.push(table_row(cells.iter()));
        }
        self.push(lines.join("\n"))
    }

    /// A block quote, one marker per line.
    pub fn quote(self, text: impl AsRef<str>) -> Self {
        let lines: Vec<String> = text
            .as_ref()
            .lines()
            .map(|line| format!("> {}", line))
            .collect();
        self.push(lines.join("\n"))
    }

    pub fn when(self, condition: bool, text: impl Into<String>) -> Self {
        if condition {
            self.push(text)
        } else {
            self
        }
    }

    pub fn when_else(self, condition: bool, then: impl Into<String>, otherwise: impl Into<String>) -> Self {
        if condition {
            self.push(then)
        } else {
            self.push(otherwise)
        }
    }

    /// Formats every item with `format(item, index)`; one line per item.
    pub fn each<I, F>(self, items: I, mut format: F) -> Self
    where
        I: IntoIterator,
        F: FnMut(I::Item, usize) -> String,
    {
        let lines: Vec<String> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| format(item, i))
            .collect();
        if lines.is_empty() {
            return self;
        }
        self.push(lines.join("\n"))
    }

    /// A horizontal rule.
    pub fn separator(self) -> Self {
        self.push("---")
    }

    /// A fenced JSON block; falls back to the `Debug` form if the value
    /// cannot be serialized.
    pub fn json<T: Serialize + Debug + ?Sized>(self, value: &T) -> Self {
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{:?}", value));
        self.push(format!("```json\n{}\n```", body))
    }

    pub fn link(self, text: impl AsRef<str>, url: impl AsRef<str>) -> Self {
        self.push(format!("[{}]({})", text.as_ref(), url.as_ref()))
    }

    pub fn image(self, alt: impl AsRef<str>, url: impl AsRef<str>) -> Self {
        self.push(format!("![{}]({})", alt.as_ref(), url.as_ref()))
    }

    pub fn checkbox(self, text: impl AsRef<str>, checked: bool) -> Self {
        self.push(checkbox_line(text.as_ref(), checked))
    }

    pub fn checkboxes<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = items
            .into_iter()
            .map(|(text, checked)| checkbox_line(text.as_ref(), checked))
            .collect();
        self.push(lines.join("\n"))
    }

    /// A `{{name}}` substitution.
    pub fn variable(self, name: impl AsRef<str>) -> Self {
        self.push(format!("{{{{{}}}}}", name.as_ref()))
    }

    /// A `{{> name}}` partial inclusion.
    pub fn partial(self, name: impl AsRef<str>) -> Self {
        self.push(format!("{{{{> {}}}}}", name.as_ref()))
    }

    /// Joins every section, including pending content, with blank lines.
    pub fn build(&self) -> String {
        let mut sections: Vec<&str> = self.sections.iter().map(String::as_str).collect();
        let pending = self.pending.join("\n");
        if !self.pending.is_empty() {
            sections.push(&pending);
        }
        sections.join("\n\n")
    }

    /// Discards everything accumulated so far.
    pub fn clear(mut self) -> Self {
        self.sections.clear();
        self.pending.clear();
        self
    }

    /// Builds the source and constructs a [`Template`] from it.
    pub fn to_template(&self, options: TemplateOptions) -> Result<Template> {
        Template::new(self.build(), options)
    }
}

fn table_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut row = String::from("|");
    for cell in cells {
        row.push(' ');
        row.push_str(cell.as_ref());
        row.push_str(" |");
    }
    row
}

fn checkbox_line(text: &str, checked: bool) -> String {
    format!("- [{}] {}", if checked { 'x' } else { ' ' }, text)
}
