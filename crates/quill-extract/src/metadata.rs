//! Template metadata: variables, helpers and partials.
//!
//! Helper and partial names come from plain pattern matching over the
//! source, independent of which extraction path produced the variables.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// An opener whose first token is followed by at least one argument:
/// `{{name arg}}` or `{{#name arg}}`.
static HELPER_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{~?#?\s*([A-Za-z_][\w-]*)\s+[^\s}~]").expect("helper pattern is valid")
});

static PARTIAL_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{~?#?>\s*([\w./-]+)").expect("partial pattern is valid")
});

/// Block and lookup helpers built into the engine; never reported as
/// helpers. Built-in comparison helpers (`eq`, `gt`, ...) are not listed:
/// the catalog replaces them, so they are reported like any other helper.
pub const BUILTIN_CONTROL: &[&str] = &["if", "unless", "each", "with", "else", "lookup", "log", "raw"];

/// A read-only snapshot of what a template references.
///
/// All lists hold unique entries in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMetadata {
    pub variables: Vec<String>,
    pub helpers: Vec<String>,
    pub partials: Vec<String>,
}

/// Computes metadata for a template source.
///
/// # Example
///
/// ```rust
/// use quill_extract::metadata;
///
/// let meta = metadata("{{> header}}{{#if admin}}{{upper name}}{{/if}}");
/// assert_eq!(meta.variables, vec!["admin", "name"]);
/// assert_eq!(meta.helpers, vec!["upper"]);
/// assert_eq!(meta.partials, vec!["header"]);
/// ```
pub fn metadata(source: &str) -> TemplateMetadata {
    TemplateMetadata {
        variables: crate::extract_variables(source).into_iter().collect(),
        helpers: helper_names(source),
        partials: partial_names(source),
    }
}

/// Names of helpers invoked in the source, built-in control constructs excluded.
pub fn helper_names(source: &str) -> Vec<String> {
    let names: IndexSet<String> = HELPER_CALL
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .filter(|name| !BUILTIN_CONTROL.contains(&name.as_str()))
        .collect();
    names.into_iter().collect()
}

/// Names of partials referenced with `{{> name}}`.
pub fn partial_names(source: &str) -> Vec<String> {
    let names: IndexSet<String> = PARTIAL_REF
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect();
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_exclude_control_constructs() {
        let source = "{{#if a}}{{#each items}}{{#with b}}{{/with}}{{/each}}{{else if c}}{{/if}}";
        assert!(helper_names(source).is_empty());
    }

    #[test]
    fn helpers_exclude_engine_builtins() {
        let source = "{{#unless a}}{{lookup items 0}}{{/unless}}{{log x}}{{#raw x}}{{/raw}}{{shout y}}{{eq a b}}";
        assert_eq!(helper_names(source), vec!["shout", "eq"]);
    }

    #[test]
    fn helpers_need_an_argument() {
        assert!(helper_names("{{name}} {{ user.name }}").is_empty());
        assert_eq!(helper_names("{{upper name}} {{ lower  x }}"), vec!["upper", "lower"]);
    }

    #[test]
    fn block_helpers_are_collected() {
        assert_eq!(helper_names("{{#repeat 3}}x{{/repeat}}"), vec!["repeat"]);
    }

    #[test]
    fn helpers_are_unique_in_first_occurrence_order() {
        assert_eq!(
            helper_names("{{b x}}{{a y}}{{b z}}"),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn partials_are_collected() {
        assert_eq!(
            partial_names("{{> header}} {{>footer ctx}} {{#> layout}}x{{/layout}} {{> header}}"),
            vec!["header", "footer", "layout"]
        );
    }

    #[test]
    fn nested_partial_paths() {
        assert_eq!(partial_names("{{> shared/card.v2}}"), vec!["shared/card.v2"]);
    }

    #[test]
    fn metadata_on_empty_source() {
        assert_eq!(metadata(""), TemplateMetadata::default());
    }
}
