//! # Quill - Handlebars Templates with Batteries
//!
//! `quill` wraps the Handlebars engine with a catalog of ready-made helpers,
//! helper registries with isolated scopes, schema-validated rendering, a
//! compiled template cache and a builder for assembling template sources.
//!
//! Variable extraction lives in the companion `quill-extract` crate and is
//! re-exported here.
//!
//! ## Core Concepts
//!
//! - [`Template`]: A compiled template plus its options; renders JSON-like data
//! - [`TemplateOptions`]: Registry, partials, schema, caching and name
//! - [`HelperRegistry`]: Global or scoped collections of custom helpers
//! - [`helpers`]: The built-in catalog (`uppercase`, `formatDate`, `add`, ...)
//! - [`schema`]: The validation protocol templates check input against
//! - [`TemplateBuilder`]: Fluent construction of markdown-flavored sources
//!
//! ## Quick Start
//!
//! ```rust
//! use quill::{Template, TemplateOptions};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Order {
//!     customer: String,
//!     total: f64,
//! }
//!
//! let template = Template::new(
//!     "Order for {{titleCase customer}}: {{formatNumber total 2}}",
//!     TemplateOptions::default(),
//! )
//! .unwrap();
//!
//! let out = template
//!     .render(&Order { customer: "grace hopper".into(), total: 1234.5 })
//!     .unwrap();
//! assert_eq!(out, "Order for Grace Hopper: 1,234.50");
//! ```
//!
//! ## Scoped Helpers
//!
//! Helpers registered on a scoped registry are only visible to templates
//! built with that registry:
//!
//! ```rust
//! use quill::{HelperRegistry, Template, TemplateOptions};
//! use serde_json::{json, Value};
//!
//! let registry = HelperRegistry::scoped();
//! registry.register("stars", |args, cx| {
//!     let n = cx.integer(args, 0)?;
//!     Ok(Value::String("*".repeat(n.max(0) as usize)))
//! });
//!
//! let template = Template::new("{{stars rating}}", TemplateOptions::new().registry(registry)).unwrap();
//! assert_eq!(template.render(&json!({"rating": 3})).unwrap(), "***");
//! ```
//!
//! ## Validated Input
//!
//! ```rust
//! use quill::schema::RequiredFields;
//! use quill::{Template, TemplateOptions};
//! use serde_json::json;
//!
//! let template = Template::new(
//!     "Hi {{name}}",
//!     TemplateOptions::new().schema(RequiredFields::new(["name"])),
//! )
//! .unwrap();
//!
//! assert_eq!(template.format(&json!({"name": "Lin"})).unwrap(), "Hi Lin");
//! assert!(template.format(&json!({})).unwrap_err().is_validation());
//! assert_eq!(template.try_format_with_schema(&json!({})).unwrap(), None);
//! ```
//!
//! ## Introspection
//!
//! ```rust
//! use quill::extract_variables;
//!
//! let vars = extract_variables("{{#each items}}{{name}}{{/each}} {{uppercase title}}");
//! assert_eq!(vars.into_iter().collect::<Vec<_>>(), vec!["items", "name", "title"]);
//! ```

mod builder;
pub mod cache;
pub mod engine;
mod error;
pub mod helpers;
pub mod prelude;
mod registry;
pub mod schema;
mod template;

// Error type
pub use error::{Error, Result};

// Engine and registries
pub use engine::{Engine, EngineId};
pub use registry::{register_transformer, transformer, HelperMetadata, HelperRegistry, Transformer};

// Helper authoring
pub use helpers::{HelperContext, HelperError};

// Templates
pub use template::{
    extract_variables, SourceModule, SyntaxError, Template, TemplateOptions, TemplateSource,
    DEFAULT_SEPARATOR,
};

// Builder
pub use builder::TemplateBuilder;

// Schema protocol
pub use schema::{Issue, StandardSchema, ValidationError, ValidationResult};

// Introspection
pub use quill_extract::{
    extract, infer_shapes, metadata, Extraction, Inference, Precision, Shape, TemplateMetadata,
    Variables,
};
