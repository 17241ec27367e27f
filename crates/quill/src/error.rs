//! Error types for template construction and rendering.
//!
//! [`Error`] is the error type for every fallible public operation. Its
//! variants fall into four groups:
//!
//! - Configuration errors ([`Error::EmptySource`], [`Error::InvalidSchema`],
//!   [`Error::NoSchema`]): raised at the point of misuse.
//! - Syntax errors ([`Error::Syntax`], [`Error::Partial`]): raised at
//!   construction, with location, context and suggestions attached.
//! - Validation errors ([`Error::Validation`], [`Error::AsyncValidationRequired`]):
//!   raised by schema checks. [`Error::is_validation`] lets callers single
//!   these out.
//! - Render errors ([`Error::Render`]): passed through from the engine as-is.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::ValidationError;
use crate::template::SyntaxError;

/// Error type for template operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved template source was empty.
    #[error("template source is empty")]
    EmptySource,

    /// A schema was supplied that does not satisfy the standard schema protocol.
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// A schema-requiring operation was called on a template without a schema.
    #[error("no schema configured for this template")]
    NoSchema,

    /// The template source failed to compile.
    #[error("{0}")]
    Syntax(Box<SyntaxError>),

    /// A partial's source failed to compile.
    #[error("partial '{name}': {source}")]
    Partial {
        name: String,
        #[source]
        source: Box<SyntaxError>,
    },

    /// Input data failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A schema returned a deferred result on the synchronous path.
    #[error("schema '{vendor}' validates asynchronously; use the async variant")]
    AsyncValidationRequired { vendor: String },

    /// The engine failed while rendering.
    #[error(transparent)]
    Render(#[from] handlebars::RenderError),

    /// Input data could not be converted to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A template file could not be read.
    #[error("failed to read template '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns true for schema validation failures.
    ///
    /// Only these are swallowed by
    /// [`Template::try_format_with_schema`](crate::Template::try_format_with_schema).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(Box::new(err))
    }
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Issue;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidSchema {
            reason: "missing version".into(),
        };
        assert!(err.to_string().contains("invalid schema"));
        assert!(err.to_string().contains("missing version"));
        assert_eq!(Error::EmptySource.to_string(), "template source is empty");
    }

    #[test]
    fn test_validation_is_distinguished() {
        let err: Error = ValidationError::new(vec![Issue::new("bad")], "test").into();
        assert!(err.is_validation());
        assert!(err.as_validation().is_some());
        assert!(!Error::NoSchema.is_validation());
        assert!(!Error::AsyncValidationRequired { vendor: "x".into() }.is_validation());
    }

    #[test]
    fn test_io_error_names_path() {
        let err = Error::Io {
            path: PathBuf::from("/tmp/missing.hbs"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing.hbs"));
    }
}
