//! The handlebars engine wrapper.
//!
//! An [`Engine`] owns one `handlebars::Handlebars` instance together with the
//! set of helper names bound to it. Compiled templates, partials and helpers
//! all live inside an engine; templates render by name through it.
//!
//! There is one process-wide default engine ([`Engine::default_engine`]),
//! used by the global [`HelperRegistry`](crate::HelperRegistry). Every scoped
//! registry gets a fresh engine of its own, which is what keeps helpers
//! registered in one registry invisible to templates built on another.
//!
//! The engine never HTML-escapes output: templates produce plain text.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use once_cell::sync::{Lazy, OnceCell};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::helpers::{self, HelperContext};
use crate::registry::Transformer;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static DEFAULT_ENGINE: Lazy<Arc<Engine>> = Lazy::new(|| Arc::new(Engine::new()));

/// Identifies an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(u64);

struct Inner {
    handlebars: Handlebars<'static>,
    helpers: HashSet<String>,
}

/// A template engine instance.
pub struct Engine {
    id: EngineId,
    inner: RwLock<Inner>,
    catalog: OnceCell<()>,
}

impl Engine {
    /// Creates an engine with no helpers beyond the engine's built-ins.
    ///
    /// The catalog is installed on first use by a template or registry, or
    /// explicitly with [`install_catalog`](Self::install_catalog).
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Self {
            id: EngineId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            inner: RwLock::new(Inner {
                handlebars,
                helpers: HashSet::new(),
            }),
            catalog: OnceCell::new(),
        }
    }

    /// The process-wide default engine.
    pub fn default_engine() -> Arc<Engine> {
        Arc::clone(&DEFAULT_ENGINE)
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Installs the helper catalog, at most once per engine.
    ///
    /// Returns `true` only for the call that performed the installation.
    pub fn install_catalog(&self) -> bool {
        let mut installed = false;
        self.catalog.get_or_init(|| {
            let mut inner = self.write();
            for entry in helpers::catalog() {
                let call = entry.call;
                let handler: Transformer = Arc::new(call);
                inner.bind(entry.name, handler);
            }
            debug!(engine = self.id.0, count = inner.helpers.len(), "installed helper catalog");
            installed = true;
        });
        installed
    }

    /// Registers (or replaces) a helper.
    pub fn register_helper(&self, name: &str, handler: Transformer) {
        trace!(engine = self.id.0, helper = name, "binding helper");
        self.write().bind(name, handler);
    }

    /// True if a catalog or user helper is bound under `name`.
    pub fn has_helper(&self, name: &str) -> bool {
        self.read().helpers.contains(name)
    }

    /// Names of all bound helpers, sorted.
    pub fn helper_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().helpers.iter().cloned().collect();
        names.sort();
        names
    }

    /// Registers a compiled template (or partial) under `name`.
    pub(crate) fn register_template(&self, name: &str, template: handlebars::Template) {
        self.write().handlebars.register_template(name, template);
    }

    pub(crate) fn unregister_template(&self, name: &str) {
        self.write().handlebars.unregister_template(name);
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.read().handlebars.has_template(name)
    }

    /// Renders the template registered under `name`.
    pub fn render(&self, name: &str, data: &Value) -> Result<String, RenderError> {
        self.read().handlebars.render(name, data)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("catalog", &self.catalog.get().is_some())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn bind(&mut self, name: &str, handler: Transformer) {
        self.handlebars.register_helper(
            name,
            Box::new(HelperAdapter {
                handler,
            }),
        );
        self.helpers.insert(name.to_string());
    }
}

/// Bridges a [`Transformer`] to the engine's helper interface.
///
/// Returning a derived JSON value (rather than writing output) lets every
/// helper double as a sub-expression.
struct HelperAdapter {
    handler: Transformer,
}

impl HelperDef for HelperAdapter {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let args: Vec<Value> = h.params().iter().map(|p| p.value().clone()).collect();
        let hash: Map<String, Value> = h
            .hash()
            .iter()
            .map(|(key, value)| (key.to_string(), value.value().clone()))
            .collect();
        let context = HelperContext::with_hash(h.name(), hash);
        match (self.handler)(&args, &context) {
            Ok(value) => Ok(ScopedJson::Derived(value)),
            Err(err) => Err(RenderErrorReason::Other(err.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(source: &str) -> handlebars::Template {
        handlebars::Template::compile(source).unwrap()
    }

    #[test]
    fn test_catalog_installs_once() {
        let engine = Engine::new();
        assert!(!engine.has_helper("add"));
        assert!(engine.install_catalog());
        assert!(!engine.install_catalog());
        assert!(engine.has_helper("add"));
        assert!(engine.has_helper("slugify"));
    }

    #[test]
    fn test_render_with_catalog() {
        let engine = Engine::new();
        engine.install_catalog();
        engine.register_template("t", compile("{{add a 2}} {{uppercase name}}"));
        let out = engine.render("t", &json!({"a": 1, "name": "bo"})).unwrap();
        assert_eq!(out, "3 BO");
    }

    #[test]
    fn test_helpers_compose_as_subexpressions() {
        let engine = Engine::new();
        engine.install_catalog();
        engine.register_template("t", compile("{{#if (gt (length items) 1)}}many{{else}}few{{/if}}"));
        assert_eq!(engine.render("t", &json!({"items": [1, 2]})).unwrap(), "many");
        assert_eq!(engine.render("t", &json!({"items": [1]})).unwrap(), "few");
    }

    #[test]
    fn test_output_is_not_escaped() {
        let engine = Engine::new();
        engine.register_template("t", compile("{{html}}"));
        let out = engine.render("t", &json!({"html": "<b>&</b>"})).unwrap();
        assert_eq!(out, "<b>&</b>");
    }

    #[test]
    fn test_helper_error_becomes_render_error() {
        let engine = Engine::new();
        engine.install_catalog();
        engine.register_template("t", compile("{{divide 1 0}}"));
        let err = engine.render("t", &json!({})).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_hash_options_reach_helper() {
        let engine = Engine::new();
        engine.install_catalog();
        engine.register_template("t", compile(r#"{{switch s "a" "A" default="?"}}"#));
        assert_eq!(engine.render("t", &json!({"s": "z"})).unwrap(), "?");
        assert_eq!(engine.render("t", &json!({"s": "a"})).unwrap(), "A");
    }

    #[test]
    fn test_unregister_template() {
        let engine = Engine::new();
        engine.register_template("gone", compile("x"));
        assert!(engine.has_template("gone"));
        engine.unregister_template("gone");
        assert!(!engine.has_template("gone"));
        assert!(engine.render("gone", &json!({})).is_err());
    }

    #[test]
    fn test_engines_are_distinct() {
        let a = Engine::new();
        let b = Engine::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(Engine::default_engine().id(), Engine::default_engine().id());
    }
}
