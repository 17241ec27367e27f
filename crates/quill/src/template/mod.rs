//! The template facade.
//!
//! [`Template`] ties the pieces together: it resolves and checks the source,
//! installs the helper catalog, binds a custom registry, registers partials,
//! compiles (through the [cache](crate::cache)) and renders, optionally
//! validating input against a schema first.
//!
//! ## Construction
//!
//! [`Template::new`] runs these steps in order and stops at the first error:
//!
//! | Step | Error |
//! |------|-------|
//! | Resolve the source (string or [`SourceModule`]); reject `""` | [`Error::EmptySource`] |
//! | Check the schema option against the protocol | [`Error::InvalidSchema`] |
//! | Install the catalog into the engine (once per engine) | |
//! | Bind a non-global registry's helpers | |
//! | Compile and register each partial | [`Error::Partial`] |
//! | Compile the source | [`Error::Syntax`] |
//!
//! ## Which Render Method?
//!
//! | Method | Schema | On validation failure |
//! |--------|--------|-----------------------|
//! | [`render`](Template::render) / [`format`](Template::format) | if configured | `Err(Error::Validation)` |
//! | [`render_async`](Template::render_async) / [`format_async`](Template::format_async) | if configured, awaited | `Err(Error::Validation)` |
//! | [`format_with_schema`](Template::format_with_schema) | required | `Err(Error::Validation)` |
//! | [`try_format_with_schema`](Template::try_format_with_schema) | required | `Ok(None)` |
//!
//! Only validation failures are turned into `Ok(None)`; render errors, such
//! as calling a helper that is not registered, still come back as errors.
//!
//! ## Example
//!
//! ```rust
//! use quill::{Template, TemplateOptions};
//! use serde_json::json;
//!
//! let template = Template::new(
//!     "{{> greeting}}, you have {{length items}} new {{ifThen (eq (length items) 1) \"item\" \"items\"}}.",
//!     TemplateOptions::new().partial("greeting", "Hello {{titleCase name}}"),
//! )
//! .unwrap();
//!
//! let out = template.render(&json!({"name": "ada lovelace", "items": [1, 2]})).unwrap();
//! assert_eq!(out, "Hello Ada Lovelace, you have 2 new items.");
//! ```

mod diagnostics;
mod options;
mod source;

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quill_extract::{Extraction, Inference, TemplateMetadata, Variables};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub use diagnostics::SyntaxError;
pub use options::TemplateOptions;
pub use source::{SourceModule, TemplateSource};

use crate::cache;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::registry::HelperRegistry;
use crate::schema::{self, StandardSchema, ValidationResult};

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// Separator used by [`Template::compose`] when none is given.
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// A compiled, renderable template.
#[derive(Clone)]
pub struct Template {
    source: String,
    name: Option<String>,
    registration: Arc<Registration>,
    schema: Option<Arc<dyn StandardSchema>>,
    cache: bool,
}

impl Template {
    /// Builds a template from a source string or [`SourceModule`].
    pub fn new(source: impl Into<TemplateSource>, options: TemplateOptions) -> Result<Self> {
        let source = source.into().into_string();
        if source.is_empty() {
            return Err(Error::EmptySource);
        }

        if let Some(schema) = &options.schema {
            check_schema(schema.as_ref())?;
        }

        let registry = options.registry.unwrap_or_else(HelperRegistry::global);
        let engine = Arc::clone(registry.engine());
        engine.install_catalog();
        if !registry.is_global() {
            registry.bind();
        }

        for (name, partial) in &options.partials {
            register_partial(&engine, name, partial, options.cache)?;
        }

        let compiled = cache::compile(&source, options.cache)
            .map_err(|err| SyntaxError::from_engine(&err, &source, options.name.as_deref()))?;
        let registration = Registration::new(engine, &source, compiled);
        debug!(
            template = options.name.as_deref().unwrap_or(""),
            partials = options.partials.len(),
            cache = options.cache,
            "template compiled"
        );

        Ok(Self {
            source,
            name: options.name,
            registration: Arc::new(registration),
            schema: options.schema,
            cache: options.cache,
        })
    }

    /// Reads the source from a file, then behaves as [`Template::new`].
    pub fn from_file(path: impl AsRef<Path>, options: TemplateOptions) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(source, options)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Renders `data`, validating it first if a schema is configured.
    pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let value = match &self.schema {
            Some(schema) => schema::parse(schema.as_ref(), value)?,
            None => value,
        };
        self.execute(&value)
    }

    /// Like [`render`](Self::render), awaiting a deferred schema result.
    pub async fn render_async<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let value = match &self.schema {
            Some(schema) => schema::parse_async(schema.as_ref(), value).await?,
            None => value,
        };
        self.execute(&value)
    }

    /// Alias of [`render`](Self::render).
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        self.render(data)
    }

    /// Alias of [`render_async`](Self::render_async).
    pub async fn format_async<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        self.render_async(data).await
    }

    /// Renders `data` after validating it; fails with [`Error::NoSchema`]
    /// if no schema is configured.
    pub fn format_with_schema<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        self.require_schema()?;
        self.render(data)
    }

    /// Like [`format_with_schema`](Self::format_with_schema), but a
    /// validation failure yields `Ok(None)`. Every other error is returned.
    pub fn try_format_with_schema<T: Serialize + ?Sized>(&self, data: &T) -> Result<Option<String>> {
        swallow_validation(self.format_with_schema(data))
    }

    pub async fn format_with_schema_async<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        self.require_schema()?;
        self.render_async(data).await
    }

    pub async fn try_format_with_schema_async<T: Serialize + ?Sized>(
        &self,
        data: &T,
    ) -> Result<Option<String>> {
        swallow_validation(self.format_with_schema_async(data).await)
    }

    /// Validates `data` without rendering.
    pub fn validate_against_schema<T: Serialize + ?Sized>(&self, data: &T) -> Result<ValidationResult> {
        let schema = self.require_schema()?;
        schema::validate(schema, serde_json::to_value(data)?)
    }

    pub async fn validate_against_schema_async<T: Serialize + ?Sized>(
        &self,
        data: &T,
    ) -> Result<ValidationResult> {
        let schema = self.require_schema()?;
        let value = serde_json::to_value(data)?;
        Ok(schema::validate_async(schema, value).await)
    }

    /// Top-level variables the template references.
    pub fn variables(&self) -> Variables {
        quill_extract::extract_variables(&self.source)
    }

    /// Variables together with how they were found.
    pub fn extraction(&self) -> Extraction {
        quill_extract::extract(&self.source)
    }

    /// Variables, helpers and partials the template references.
    pub fn metadata(&self) -> TemplateMetadata {
        quill_extract::metadata(&self.source)
    }

    /// Best-effort shape of each variable.
    pub fn shapes(&self) -> indexmap::IndexMap<String, Inference> {
        quill_extract::infer_shapes(&self.source)
    }

    /// Registers a partial in this template's engine.
    ///
    /// Partials are shared by every template rendering through the same
    /// engine.
    pub fn register_partial(&self, name: &str, source: &str) -> Result<()> {
        register_partial(&self.registration.engine, name, source, self.cache)
    }

    /// Joins sources with `separator` (default [`DEFAULT_SEPARATOR`]).
    ///
    /// ```rust
    /// use quill::Template;
    ///
    /// assert_eq!(Template::compose(["X", "Y"], Some("-")), "X-Y");
    /// assert_eq!(Template::compose(["X", "Y"], None), "X\n\nY");
    /// ```
    pub fn compose<I, S>(sources: I, separator: Option<&str>) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let separator = separator.unwrap_or(DEFAULT_SEPARATOR);
        let mut out = String::new();
        for (index, source) in sources.into_iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }
            out.push_str(source.as_ref());
        }
        out
    }

    /// [`compose`](Self::compose) with the default separator, then [`new`](Self::new).
    pub fn compose_and_create<I, S>(sources: I, options: TemplateOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Self::compose(sources, None), options)
    }

    fn execute(&self, data: &Value) -> Result<String> {
        let registration = &self.registration;
        Ok(registration.engine.render(&registration.key, data)?)
    }

    fn require_schema(&self) -> Result<&dyn StandardSchema> {
        self.schema.as_deref().ok_or(Error::NoSchema)
    }
}

/// A compiled template registered in an engine under a unique key.
///
/// Shared by every clone of a [`Template`]; the engine entry is removed when
/// the last clone is dropped.
struct Registration {
    engine: Arc<Engine>,
    key: String,
}

impl Registration {
    fn new(engine: Arc<Engine>, source: &str, compiled: handlebars::Template) -> Self {
        let key = format!(
            "quill:{}:{}",
            cache::digest(source),
            NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed)
        );
        engine.register_template(&key, compiled);
        Self { engine, key }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.engine.unregister_template(&self.key);
    }
}

impl AsRef<str> for Template {
    fn as_ref(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("engine", &self.registration.engine.id())
            .field("schema", &self.schema.is_some())
            .field("cache", &self.cache)
            .field("source", &self.source)
            .finish()
    }
}

/// Extracts the top-level variables from a source string or a [`Template`].
///
/// ```rust
/// use quill::{extract_variables, Template, TemplateOptions};
///
/// let template = Template::new("{{a.b}} {{c}}", TemplateOptions::default()).unwrap();
/// assert_eq!(extract_variables(&template), extract_variables("{{a.b}} {{c}}"));
/// ```
pub fn extract_variables<S: AsRef<str> + ?Sized>(source: &S) -> Variables {
    quill_extract::extract_variables(source.as_ref())
}

fn check_schema(schema: &dyn StandardSchema) -> Result<()> {
    match schema.standard() {
        None => Err(Error::InvalidSchema {
            reason: "schema does not expose standard schema properties".into(),
        }),
        Some(props) if props.version != schema::STANDARD_SCHEMA_VERSION => Err(Error::InvalidSchema {
            reason: format!(
                "unsupported standard schema version {} (expected {})",
                props.version,
                schema::STANDARD_SCHEMA_VERSION
            ),
        }),
        Some(_) => Ok(()),
    }
}

fn register_partial(engine: &Engine, name: &str, source: &str, use_cache: bool) -> Result<()> {
    let compiled = cache::compile(source, use_cache).map_err(|err| Error::Partial {
        name: name.to_string(),
        source: Box::new(SyntaxError::from_engine(&err, source, Some(name))),
    })?;
    engine.register_template(name, compiled);
    Ok(())
}

fn swallow_validation(result: Result<String>) -> Result<Option<String>> {
    match result {
        Ok(output) => Ok(Some(output)),
        Err(err) if err.is_validation() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FnSchema, Issue, Outcome, SchemaProps, Validation};
    use serde_json::json;

    fn options() -> TemplateOptions {
        TemplateOptions::default()
    }

    struct Unversioned;

    impl StandardSchema for Unversioned {
        fn standard(&self) -> Option<SchemaProps<'_>> {
            Some(SchemaProps {
                version: 2,
                vendor: "future",
            })
        }

        fn validate(&self, value: Value) -> Validation {
            Outcome::Valid(value).into()
        }
    }

    #[test]
    fn test_render_plain() {
        let template = Template::new("Hi {{name}}!", options()).unwrap();
        assert_eq!(template.render(&json!({"name": "Bo"})).unwrap(), "Hi Bo!");
    }

    #[test]
    fn test_missing_variables_render_empty() {
        let template = Template::new("[{{nothing}}]", options()).unwrap();
        assert_eq!(template.render(&json!({})).unwrap(), "[]");
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(Template::new("", options()), Err(Error::EmptySource)));
        let module = SourceModule::default();
        assert!(matches!(Template::new(module, options()), Err(Error::EmptySource)));
    }

    #[test]
    fn test_source_module() {
        let template = Template::new(SourceModule::new("{{x}}"), options()).unwrap();
        assert_eq!(template.render(&json!({"x": 1})).unwrap(), "1");
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let err = Template::new("{{x}}", options().schema(Unversioned)).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_syntax_error_is_descriptive() {
        let err = Template::new("line\n{{#if a}}\n{{/each}}", options().name("broken")).unwrap_err();
        match err {
            Error::Syntax(syntax) => {
                assert_eq!(syntax.template.as_deref(), Some("broken"));
                assert!(!syntax.suggestions.is_empty());
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_partial_names_partial() {
        let err = Template::new("{{> p}}", options().partial("p", "{{#if}}{{/each}}")).unwrap_err();
        assert!(matches!(err, Error::Partial { ref name, .. } if name == "p"));
    }

    #[test]
    fn test_schema_transforms_input() {
        let schema = FnSchema::new("upper", |value: Value| {
            let name = value["name"].as_str().unwrap_or_default().to_uppercase();
            Outcome::Valid(json!({ "name": name }))
        });
        let template = Template::new("{{name}}", options().schema(schema)).unwrap();
        assert_eq!(template.render(&json!({"name": "x"})).unwrap(), "X");
    }

    #[test]
    fn test_schema_methods_require_schema() {
        let template = Template::new("{{x}}", options()).unwrap();
        assert!(matches!(template.format_with_schema(&json!({})), Err(Error::NoSchema)));
        assert!(matches!(template.try_format_with_schema(&json!({})), Err(Error::NoSchema)));
        assert!(matches!(template.validate_against_schema(&json!({})), Err(Error::NoSchema)));
    }

    #[test]
    fn test_try_format_swallows_only_validation() {
        let strict = FnSchema::new("strict", |_| Outcome::Invalid(vec![Issue::new("no")]));
        let template = Template::new("{{x}}", options().schema(strict)).unwrap();
        assert_eq!(template.try_format_with_schema(&json!({"x": 1})).unwrap(), None);
        assert!(template.format_with_schema(&json!({"x": 1})).unwrap_err().is_validation());
    }

    #[test]
    fn test_validate_against_schema() {
        let schema = FnSchema::new("id", Outcome::Valid);
        let template = Template::new("{{x}}", options().schema(schema)).unwrap();
        let result = template.validate_against_schema(&json!({"x": 1})).unwrap();
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&json!({"x": 1})));
    }

    #[test]
    fn test_introspection() {
        let template = Template::new("{{> head}}{{upper title}} {{#each rows}}{{this}}{{/each}}", options().partial("head", "H"))
            .unwrap();
        let vars: Vec<_> = template.variables().into_iter().collect();
        assert_eq!(vars, vec!["title", "rows"]);
        let meta = template.metadata();
        assert_eq!(meta.helpers, vec!["upper"]);
        assert_eq!(meta.partials, vec!["head"]);
        assert!(template.shapes()["rows"].is_precise());
    }

    #[test]
    fn test_register_partial_later() {
        let template = Template::new("[{{> late_partial_unit}}]", options()).unwrap();
        template.register_partial("late_partial_unit", "{{x}}").unwrap();
        assert_eq!(template.render(&json!({"x": "ok"})).unwrap(), "[ok]");
    }

    #[test]
    fn test_dropping_last_clone_unregisters() {
        let template = Template::new("dropped {{x}}", options().cache(false)).unwrap();
        let engine = Arc::clone(&template.registration.engine);
        let key = template.registration.key.clone();
        assert!(engine.has_template(&key));

        let clone = template.clone();
        drop(template);
        assert!(engine.has_template(&key));
        assert_eq!(clone.render(&json!({"x": 1})).unwrap(), "dropped 1");

        drop(clone);
        assert!(!engine.has_template(&key));
    }

    #[test]
    fn test_same_source_templates_are_independent() {
        let first = Template::new("shared {{x}}", options()).unwrap();
        let second = Template::new("shared {{x}}", options()).unwrap();
        assert_ne!(first.registration.key, second.registration.key);
        drop(first);
        assert_eq!(second.render(&json!({"x": 2})).unwrap(), "shared 2");
    }

    #[test]
    fn test_compose() {
        assert_eq!(Template::compose(["X", "Y"], Some("-")), "X-Y");
        assert_eq!(Template::compose(["X", "Y"], None), "X\n\nY");
        assert_eq!(Template::compose(Vec::<String>::new(), None), "");
        let template = Template::compose_and_create(["{{a}}", "{{b}}"], options()).unwrap();
        assert_eq!(template.render(&json!({"a": 1, "b": 2})).unwrap(), "1\n\n2");
    }

    #[test]
    fn test_serializable_structs() {
        #[derive(Serialize)]
        struct Order {
            id: u32,
            items: Vec<&'static str>,
        }
        let template = Template::new("#{{id}}: {{join items \"/\"}}", options()).unwrap();
        let out = template
            .render(&Order {
                id: 7,
                items: vec!["a", "b"],
            })
            .unwrap();
        assert_eq!(out, "#7: a/b");
    }
}
