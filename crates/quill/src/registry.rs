//! Helper registries.
//!
//! A [`HelperRegistry`] maps helper names to [`Transformer`]s (plus optional
//! [`HelperMetadata`]) and binds them into an [`Engine`].
//!
//! # Two Lifecycles
//!
//! | Registry | Obtained with | Engine |
//! |----------|---------------|--------|
//! | Global | [`HelperRegistry::global`] | [`Engine::default_engine`] |
//! | Scoped | [`HelperRegistry::scoped`] | A fresh engine owned by the registry |
//!
//! The global registry is created lazily on first access and lives for the
//! process. Scoped registries are independent: their entries are invisible to
//! the global registry and to templates built without them, and helpers
//! registered globally are invisible to templates built on a scoped registry.
//!
//! # Registration and Binding
//!
//! [`register`](HelperRegistry::register) only records an entry. Entries reach
//! an engine through [`bind_to_engine`](HelperRegistry::bind_to_engine), which
//! binds each entry at most once per engine. Re-registering a name replaces
//! the entry (last write wins, silently) and makes it eligible for binding
//! again.
//!
//! [`register_transformer`] is the single-instance shortcut: it registers into
//! the global registry and binds to the default engine immediately.
//!
//! ```rust
//! use quill::{register_transformer, Template, TemplateOptions};
//! use serde_json::{json, Value};
//!
//! register_transformer("shout", |args, cx| {
//!     let text = cx.text(args, 0)?;
//!     Ok(Value::String(format!("{}!", text.to_uppercase())))
//! });
//!
//! let template = Template::new("{{shout name}}", TemplateOptions::default()).unwrap();
//! assert_eq!(template.render(&json!({"name": "hey"})).unwrap(), "HEY!");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::engine::{Engine, EngineId};
use crate::helpers::{HelperContext, HelperError};

/// A helper function as stored in a registry and bound into an engine.
pub type Transformer =
    Arc<dyn Fn(&[Value], &HelperContext) -> Result<Value, HelperError> + Send + Sync>;

/// Wraps a closure as a [`Transformer`].
pub fn transformer<F>(f: F) -> Transformer
where
    F: Fn(&[Value], &HelperContext) -> Result<Value, HelperError> + Send + Sync + 'static,
{
    Arc::new(f)
}

static GLOBAL: Lazy<Arc<HelperRegistry>> =
    Lazy::new(|| Arc::new(HelperRegistry::with_engine(Engine::default_engine())));

/// Optional descriptive data attached to a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperMetadata {
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub version: Option<String>,
}

impl HelperMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Clone)]
struct Entry {
    handler: Transformer,
    metadata: Option<HelperMetadata>,
}

/// A named collection of helpers.
pub struct HelperRegistry {
    engine: Arc<Engine>,
    entries: RwLock<IndexMap<String, Entry>>,
    bound: RwLock<HashSet<(EngineId, String)>>,
}

impl HelperRegistry {
    /// The process-wide registry, bound to the default engine.
    pub fn global() -> Arc<HelperRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// A new, empty registry with its own engine.
    pub fn scoped() -> Arc<HelperRegistry> {
        Arc::new(HelperRegistry::new())
    }

    /// A new, empty registry with its own engine.
    pub fn new() -> Self {
        Self::with_engine(Arc::new(Engine::new()))
    }

    /// A new, empty registry whose templates render through `engine`.
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            entries: RwLock::new(IndexMap::new()),
            bound: RwLock::new(HashSet::new()),
        }
    }

    /// True for the process-wide registry.
    pub fn is_global(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(&*GLOBAL))
    }

    /// The engine templates built on this registry render through.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Inserts or replaces the helper `name`.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[Value], &HelperContext) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(handler), None);
    }

    /// Inserts or replaces the helper `name`, with metadata.
    pub fn register_with_metadata<F>(&self, name: impl Into<String>, handler: F, metadata: HelperMetadata)
    where
        F: Fn(&[Value], &HelperContext) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(handler), Some(metadata));
    }

    /// Registers every `(name, transformer)` pair.
    pub fn register_many<I, S>(&self, helpers: I)
    where
        I: IntoIterator<Item = (S, Transformer)>,
        S: Into<String>,
    {
        for (name, handler) in helpers {
            self.insert(name.into(), handler, None);
        }
    }

    fn insert(&self, name: String, handler: Transformer, metadata: Option<HelperMetadata>) {
        self.bound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, bound)| bound != &name);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Entry { handler, metadata });
    }

    /// Binds every entry not yet bound to `engine`. Returns how many were bound.
    ///
    /// The catalog is installed first if the engine does not have it yet.
    pub fn bind_to_engine(&self, engine: &Engine) -> usize {
        engine.install_catalog();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut bound = self.bound.write().unwrap_or_else(PoisonError::into_inner);
        let mut count = 0;
        for (name, entry) in entries.iter() {
            if bound.insert((engine.id(), name.clone())) {
                engine.register_helper(name, Arc::clone(&entry.handler));
                count += 1;
            }
        }
        if count > 0 {
            debug!(count, global = self.is_global(), "bound helpers to engine");
        }
        count
    }

    /// Binds every pending entry to this registry's own engine.
    pub fn bind(&self) -> usize {
        self.bind_to_engine(&self.engine)
    }

    pub fn get(&self, name: &str) -> Option<Transformer> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| Arc::clone(&entry.handler))
    }

    pub fn metadata(&self, name: &str) -> Option<HelperMetadata> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|entry| entry.metadata.clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and forgets what was bound.
    ///
    /// Helpers already bound stay in their engines until replaced.
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.bound.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("engine", &self.engine.id())
            .field("helpers", &self.names())
            .finish()
    }
}

/// Registers a helper globally and binds it to the default engine at once.
pub fn register_transformer<F>(name: impl Into<String>, handler: F)
where
    F: Fn(&[Value], &HelperContext) -> Result<Value, HelperError> + Send + Sync + 'static,
{
    let registry = HelperRegistry::global();
    registry.register(name, handler);
    registry.bind();
}
