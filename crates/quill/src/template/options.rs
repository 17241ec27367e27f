//! Template construction options.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::registry::HelperRegistry;
use crate::schema::StandardSchema;

/// Options for [`Template::new`](crate::Template::new).
///
/// | Option | Default |
/// |--------|---------|
/// | `registry` | The global registry |
/// | `partials` | None |
/// | `schema` | None |
/// | `cache` | `true` |
/// | `name` | None (diagnostics say "template syntax error") |
///
/// ```rust
/// use quill::schema::RequiredFields;
/// use quill::TemplateOptions;
///
/// let options = TemplateOptions::new()
///     .partial("footer", "-- {{team}}")
///     .schema(RequiredFields::new(["team"]))
///     .name("signature")
///     .cache(false);
/// ```
#[derive(Clone)]
pub struct TemplateOptions {
    pub(crate) registry: Option<Arc<HelperRegistry>>,
    pub(crate) partials: IndexMap<String, String>,
    pub(crate) schema: Option<Arc<dyn StandardSchema>>,
    pub(crate) cache: bool,
    pub(crate) name: Option<String>,
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders through `registry`'s engine instead of the default one.
    pub fn registry(mut self, registry: Arc<HelperRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a partial, compiled and registered before the template itself.
    pub fn partial(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.partials.insert(name.into(), source.into());
        self
    }

    pub fn partials<I, K, V>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.partials
            .extend(partials.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Validates render input against `schema`.
    pub fn schema(self, schema: impl StandardSchema + 'static) -> Self {
        self.shared_schema(Arc::new(schema))
    }

    pub fn shared_schema(mut self, schema: Arc<dyn StandardSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Enables or disables the compiled template cache.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// A name shown in syntax error messages.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            registry: None,
            partials: IndexMap::new(),
            schema: None,
            cache: true,
            name: None,
        }
    }
}

impl fmt::Debug for TemplateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateOptions")
            .field("registry", &self.registry)
            .field("partials", &self.partials.keys().collect::<Vec<_>>())
            .field("schema", &self.schema.as_ref().map(|s| crate::schema::vendor_of(s.as_ref())))
            .field("cache", &self.cache)
            .field("name", &self.name)
            .finish()
    }
}
