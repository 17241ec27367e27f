//! Structural traversal over the engine's parse tree.
//!
//! The walker visits every substitution and every block opener, reporting
//! each argument path it finds to a [`Visitor`]. Helper and block names are
//! never reported. Block parameters (`as |item idx|`) open a scope; paths
//! rooted at a block parameter are local and are not reported either.

use std::collections::{HashMap, HashSet};

use handlebars::template::{BlockParam, HelperTemplate, Parameter, Template, TemplateElement};
use handlebars::{Path, TemplateError};

/// Where a reference appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role<'a> {
    /// A bare substitution: `{{user.name}}`.
    Value,
    /// An argument (positional or hash) of an inline helper call.
    Argument,
    /// An argument of a block opener, with the block's name.
    BlockArgument(&'a str),
}

/// A path expression found in the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reference<'a> {
    pub raw: &'a str,
    pub role: Role<'a>,
    /// True when the reference sits inside an `each`/`with` body, where the
    /// context no longer is the template root.
    pub shifted: bool,
}

pub(crate) trait Visitor {
    fn reference(&mut self, reference: Reference<'_>);
}

/// Parses source with the engine's own parser.
pub(crate) fn parse(source: &str) -> Result<Template, TemplateError> {
    Template::compile(source)
}

/// Walks a parsed template, reporting references to `visitor`.
pub(crate) fn walk<V: Visitor>(template: &Template, visitor: &mut V) {
    let mut walker = Walker {
        visitor,
        scopes: Vec::new(),
        shifted: 0,
    };
    walker.template(template);
}

/// Returns the textual form of a name or path parameter.
pub(crate) fn parameter_text(param: &Parameter) -> Option<&str> {
    match param {
        Parameter::Name(name) => Some(name.as_str()),
        Parameter::Path(Path::Relative((_, raw))) => Some(raw.as_str()),
        Parameter::Path(Path::Local((_, _, raw))) => Some(raw.as_str()),
        _ => None,
    }
}

const SHIFTING_BLOCKS: &[&str] = &["each", "with"];

struct Walker<'v, V: Visitor> {
    visitor: &'v mut V,
    scopes: Vec<HashSet<String>>,
    shifted: usize,
}

impl<V: Visitor> Walker<'_, V> {
    fn template(&mut self, template: &Template) {
        for element in &template.elements {
            self.element(element);
        }
    }

    fn element(&mut self, element: &TemplateElement) {
        match element {
            TemplateElement::Expression(helper) | TemplateElement::HtmlExpression(helper) => {
                self.expression(helper)
            }
            TemplateElement::HelperBlock(helper) => self.block(helper),
            TemplateElement::PartialBlock(decorator)
            | TemplateElement::DecoratorBlock(decorator) => {
                if let Some(body) = &decorator.template {
                    self.template(body);
                }
            }
            _ => {}
        }
    }

    fn expression(&mut self, helper: &HelperTemplate) {
        if helper.params.is_empty() && helper.hash.is_empty() {
            if let Some(raw) = parameter_text(&helper.name) {
                self.report(raw, Role::Value);
            }
            return;
        }
        self.arguments(helper, Role::Argument);
    }

    fn block(&mut self, helper: &HelperTemplate) {
        let name = parameter_text(&helper.name).unwrap_or_default();
        self.arguments(helper, Role::BlockArgument(name));

        let shifts = SHIFTING_BLOCKS.contains(&name);
        let locals = block_locals(helper.block_param.as_ref());
        let scoped = !locals.is_empty();
        if scoped {
            self.scopes.push(locals);
        }
        if shifts {
            self.shifted += 1;
        }

        if let Some(body) = &helper.template {
            self.template(body);
        }

        if shifts {
            self.shifted -= 1;
        }
        if scoped {
            self.scopes.pop();
        }

        // `{{else}}` bodies (including chained `else if`) run in the outer context.
        if let Some(inverse) = &helper.inverse {
            self.template(inverse);
        }
    }

    fn arguments(&mut self, helper: &HelperTemplate, role: Role<'_>) {
        for param in &helper.params {
            self.parameter(param, role);
        }
        for param in sorted_values(&helper.hash) {
            self.parameter(param, role);
        }
    }

    fn parameter(&mut self, param: &Parameter, role: Role<'_>) {
        match param {
            Parameter::Subexpression(sub) => {
                if let Some(params) = sub.params() {
                    for inner in params {
                        self.parameter(inner, Role::Argument);
                    }
                }
                if let Some(hash) = sub.hash() {
                    for inner in sorted_values(hash) {
                        self.parameter(inner, Role::Argument);
                    }
                }
            }
            other => {
                if let Some(raw) = parameter_text(other) {
                    self.report(raw, role);
                }
            }
        }
    }

    fn report(&mut self, raw: &str, role: Role<'_>) {
        if self.is_local(raw) {
            return;
        }
        self.visitor.reference(Reference {
            raw,
            role,
            shifted: self.shifted > 0,
        });
    }

    fn is_local(&self, raw: &str) -> bool {
        if self.scopes.is_empty() {
            return false;
        }
        match crate::path::base_variable(raw) {
            Some(base) => self.scopes.iter().any(|scope| scope.contains(&base)),
            None => false,
        }
    }
}

/// Hash arguments in key order, so traversal order is stable.
fn sorted_values(hash: &HashMap<String, Parameter>) -> Vec<&Parameter> {
    let mut entries: Vec<_> = hash.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter().map(|(_, param)| param).collect()
}

fn block_locals(param: Option<&BlockParam>) -> HashSet<String> {
    let mut locals = HashSet::new();
    match param {
        Some(BlockParam::Single(p)) => {
            locals.extend(parameter_text(p).map(str::to_string));
        }
        Some(BlockParam::Pair((first, second))) => {
            locals.extend(parameter_text(first).map(str::to_string));
            locals.extend(parameter_text(second).map(str::to_string));
        }
        // `BlockParam` is `#[non_exhaustive]` upstream.
        Some(_) => {}
        None => {}
    }
    locals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, bool, bool)>,
    }

    impl Visitor for Recorder {
        fn reference(&mut self, reference: Reference<'_>) {
            let is_value = reference.role == Role::Value;
            self.seen
                .push((reference.raw.to_string(), is_value, reference.shifted));
        }
    }

    fn record(source: &str) -> Vec<(String, bool, bool)> {
        let template = parse(source).unwrap();
        let mut recorder = Recorder::default();
        walk(&template, &mut recorder);
        recorder.seen
    }

    #[test]
    fn bare_substitution_is_a_value() {
        let seen = record("{{user.name}}");
        assert_eq!(seen, vec![("user.name".to_string(), true, false)]);
    }

    #[test]
    fn helper_arguments_are_reported_but_not_the_helper() {
        let seen = record("{{format price currency}}");
        let raws: Vec<_> = seen.iter().map(|(r, _, _)| r.as_str()).collect();
        assert_eq!(raws, vec!["price", "currency"]);
        assert!(seen.iter().all(|(_, is_value, _)| !is_value));
    }

    #[test]
    fn each_body_is_shifted() {
        let seen = record("{{#each items}}{{title}}{{/each}}{{after}}");
        assert_eq!(
            seen,
            vec![
                ("items".to_string(), false, false),
                ("title".to_string(), true, true),
                ("after".to_string(), true, false),
            ]
        );
    }

    #[test]
    fn block_params_are_local() {
        let seen = record("{{#each users as |u|}}{{u.name}}{{other}}{{/each}}");
        let raws: Vec<_> = seen.iter().map(|(r, _, _)| r.as_str()).collect();
        assert_eq!(raws, vec!["users", "other"]);
    }

    #[test]
    fn inverse_is_walked() {
        let seen = record("{{#if a}}{{b}}{{else}}{{c}}{{/if}}");
        let raws: Vec<_> = seen.iter().map(|(r, _, _)| r.as_str()).collect();
        assert_eq!(raws, vec!["a", "b", "c"]);
    }
}
