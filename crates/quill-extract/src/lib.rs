//! Introspection for Handlebars templates.
//!
//! Given raw template source, this crate reports which top-level variables the
//! template expects in its input data, which helpers it calls and which
//! partials it includes. It never renders anything.
//!
//! # Extraction
//!
//! ```rust
//! use quill_extract::extract_variables;
//!
//! let vars = extract_variables("{{#if user.admin}}{{upper user.name}} ({{@index}}){{/if}} {{title}}");
//! let vars: Vec<_> = vars.into_iter().collect();
//! assert_eq!(vars, vec!["user", "title"]);
//! ```
//!
//! Only the first segment of a path is kept (`user.profile.name` → `user`).
//! Helper names, block names, `this` and `@`-prefixed context variables are
//! never reported.
//!
//! # Two Paths
//!
//! Extraction first parses the source with the engine's parser and walks the
//! tree. When the parser rejects the source, a lexical scan over the
//! `{{ ... }}` regions recovers what it can. Extraction itself never fails;
//! [`extract`] reports which path produced the answer through [`Precision`]:
//!
//! | Precision | Meaning |
//! |-----------|---------|
//! | `Precise` | The source parsed; every reference was classified from the tree |
//! | `Approximate` | Parsing failed; the lexical scan found template regions |
//! | `Unknown` | Parsing failed and no template regions were found |
//!
//! # Metadata
//!
//! [`metadata`] bundles variables with helper and partial names. Helper and
//! partial names are matched textually, independent of the extraction path.

mod ast;
mod lexical;
mod metadata;
mod path;
mod shape;

use indexmap::IndexSet;
use tracing::{debug, trace};

pub use indexmap;
pub use metadata::{helper_names, metadata, partial_names, TemplateMetadata, BUILTIN_CONTROL};
pub use path::{base_variable, CONTEXT_PREFIX, SELF_REFERENCE};
pub use shape::{infer_shapes, Inference, Shape};

/// Unique variable names in order of first occurrence.
pub type Variables = IndexSet<String>;

/// How reliable an extraction result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Produced by walking the parse tree.
    Precise,
    /// Produced by the lexical fallback.
    Approximate,
    /// The source could not be parsed and held nothing recognizable.
    Unknown,
}

/// Variables referenced by a template, with the precision of the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub variables: Variables,
    pub precision: Precision,
}

/// Extracts the top-level variables referenced by `source`.
///
/// Never fails: sources the engine cannot parse go through the lexical
/// fallback instead.
pub fn extract(source: &str) -> Extraction {
    match ast::parse(source) {
        Ok(template) => {
            let mut collector = NameCollector::default();
            ast::walk(&template, &mut collector);
            trace!(count = collector.names.len(), "structural extraction");
            Extraction {
                variables: collector.names,
                precision: Precision::Precise,
            }
        }
        Err(err) => {
            debug!(error = %err, "template did not parse, using lexical extraction");
            let scan = lexical::scan(source);
            let precision = if scan.regions > 0 {
                Precision::Approximate
            } else {
                Precision::Unknown
            };
            Extraction {
                variables: scan.variables,
                precision,
            }
        }
    }
}

/// Extracts the top-level variable names referenced by `source`.
///
/// Shorthand for `extract(source).variables`.
pub fn extract_variables(source: &str) -> Variables {
    extract(source).variables
}

#[derive(Default)]
struct NameCollector {
    names: Variables,
}

impl ast::Visitor for NameCollector {
    fn reference(&mut self, reference: ast::Reference<'_>) {
        if let Some(name) = base_variable(reference.raw) {
            self.names.insert(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<String> {
        extract_variables(source).into_iter().collect()
    }

    #[test]
    fn precise_for_valid_source() {
        let result = extract("{{a}} {{b.c}}");
        assert_eq!(result.precision, Precision::Precise);
        assert_eq!(names("{{a}} {{b.c}}"), vec!["a", "b"]);
    }

    #[test]
    fn approximate_for_broken_source() {
        let result = extract("{{#if a}}{{b}}{{/each}}");
        assert_eq!(result.precision, Precision::Approximate);
        assert!(result.variables.contains("b"));
    }

    #[test]
    fn empty_source_is_precise_and_empty() {
        let result = extract("");
        assert_eq!(result.precision, Precision::Precise);
        assert!(result.variables.is_empty());
    }

    #[test]
    fn first_occurrence_order() {
        assert_eq!(names("{{z}} {{a}} {{z.y}} {{m}}"), vec!["z", "a", "m"]);
    }

    #[test]
    fn subexpression_arguments() {
        assert_eq!(names("{{#if (gt count limit)}}x{{/if}}"), vec!["count", "limit"]);
    }

    #[test]
    fn hash_arguments() {
        assert_eq!(names("{{truncate text length=max}}"), vec!["text", "max"]);
    }

    #[test]
    fn literals_are_not_variables() {
        assert_eq!(names(r#"{{pad name 10 "x" true}}"#), vec!["name"]);
    }

    #[test]
    fn parent_references_resolve_to_base() {
        assert_eq!(
            names("{{#each items}}{{../title}}{{/each}}"),
            vec!["items", "title"]
        );
    }
}
