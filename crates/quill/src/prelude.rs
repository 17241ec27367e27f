//! Convenient imports for template users.
//!
//! ```rust
//! use quill::prelude::*;
//! use serde_json::json;
//!
//! let template = Template::new("{{uppercase name}}", TemplateOptions::default())?;
//! assert_eq!(template.render(&json!({"name": "ok"}))?, "OK");
//! # Ok::<(), quill::Error>(())
//! ```

// Templates
pub use crate::{Template, TemplateBuilder, TemplateOptions};

// Helpers
pub use crate::{register_transformer, HelperContext, HelperError, HelperRegistry};

// Schema
pub use crate::schema::{RequiredFields, StandardSchema};

// Errors
pub use crate::{Error, Result};
