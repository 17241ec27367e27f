//! Schema validation adapter.
//!
//! Any validator can guard template input as long as it implements
//! [`StandardSchema`]: it advertises a protocol version and vendor name, and
//! validates a JSON value either immediately or through a deferred future.
//!
//! # Protocol
//!
//! | Property | Requirement |
//! |----------|-------------|
//! | `standard()` | Returns `Some(SchemaProps)` |
//! | `version` | Equal to [`STANDARD_SCHEMA_VERSION`] (`1`) |
//! | `vendor` | Free-form library name, echoed in results and errors |
//!
//! [`is_standard_schema`] performs this capability check. Anything that fails
//! it is rejected by [`Template::new`](crate::Template::new) with
//! [`Error::InvalidSchema`].
//!
//! # Entry Points
//!
//! | Function | On failure | Deferred result |
//! |----------|------------|-----------------|
//! | [`validate`] | `ValidationResult::Failure` | [`Error::AsyncValidationRequired`] |
//! | [`validate_async`] | `ValidationResult::Failure` | awaited |
//! | [`parse`] / [`parse_async`] | [`Error::Validation`] | as above |
//! | [`safe_parse`] / [`safe_parse_async`] | `None` | as above |
//!
//! # Example
//!
//! ```rust
//! use quill::schema::{validate, FnSchema, Issue, Outcome};
//! use serde_json::json;
//!
//! let adults = FnSchema::new("ages", |value| match value["age"].as_u64() {
//!     Some(age) if age >= 18 => Outcome::Valid(value),
//!     _ => Outcome::Invalid(vec![Issue::new("must be an adult").at("age")]),
//! });
//!
//! assert!(validate(&adults, json!({"age": 30})).unwrap().is_success());
//! assert!(!validate(&adults, json!({"age": 9})).unwrap().is_success());
//! ```

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// The only protocol version this adapter understands.
pub const STANDARD_SCHEMA_VERSION: u32 = 1;

/// One step of the path to an offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Appends a path segment.
    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// The path joined with dots (`items.0.name`), or `None` for root issues.
    pub fn dotted_path(&self) -> Option<String> {
        if self.path.is_empty() {
            return None;
        }
        let segments: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        Some(segments.join("."))
    }
}

/// The protocol properties a schema advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaProps<'a> {
    pub version: u32,
    pub vendor: &'a str,
}

/// The settled result of a validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The input is valid; carries the (possibly transformed) value.
    Valid(Value),
    /// The input is invalid.
    Invalid(Vec<Issue>),
}

/// What a schema returns from [`StandardSchema::validate`].
pub enum Validation {
    Ready(Outcome),
    Deferred(BoxFuture<'static, Outcome>),
}

impl From<Outcome> for Validation {
    fn from(outcome: Outcome) -> Self {
        Validation::Ready(outcome)
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Validation::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A validator usable as a template input guard.
pub trait StandardSchema: Send + Sync {
    /// Protocol properties, or `None` if this value does not speak the protocol.
    fn standard(&self) -> Option<SchemaProps<'_>>;

    fn validate(&self, value: Value) -> Validation;
}

/// Returns true when `schema` advertises protocol version 1.
pub fn is_standard_schema(schema: &dyn StandardSchema) -> bool {
    matches!(
        schema.standard(),
        Some(props) if props.version == STANDARD_SCHEMA_VERSION
    )
}

pub(crate) fn vendor_of(schema: &dyn StandardSchema) -> String {
    schema
        .standard()
        .map(|props| props.vendor.to_string())
        .unwrap_or_default()
}

/// The uniform shape of a validation result.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Success { value: Value, vendor: String },
    Failure { issues: Vec<Issue>, vendor: String },
}

impl ValidationResult {
    fn from_outcome(outcome: Outcome, vendor: String) -> Self {
        match outcome {
            Outcome::Valid(value) => ValidationResult::Success { value, vendor },
            Outcome::Invalid(issues) => ValidationResult::Failure { issues, vendor },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success { .. })
    }

    /// The validated value, present iff successful.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ValidationResult::Success { value, .. } => Some(value),
            ValidationResult::Failure { .. } => None,
        }
    }

    /// The reported issues, present iff unsuccessful.
    pub fn issues(&self) -> Option<&[Issue]> {
        match self {
            ValidationResult::Success { .. } => None,
            ValidationResult::Failure { issues, .. } => Some(issues),
        }
    }

    pub fn vendor(&self) -> &str {
        match self {
            ValidationResult::Success { vendor, .. } | ValidationResult::Failure { vendor, .. } => {
                vendor
            }
        }
    }

    /// Converts a failure into a [`ValidationError`].
    pub fn into_result(self) -> std::result::Result<Value, ValidationError> {
        match self {
            ValidationResult::Success { value, .. } => Ok(value),
            ValidationResult::Failure { issues, vendor } => {
                Err(ValidationError::new(issues, vendor))
            }
        }
    }
}

/// Input data failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
    pub vendor: String,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>, vendor: impl Into<String>) -> Self {
        Self {
            issues,
            vendor: vendor.into(),
        }
    }

    /// Multi-line report: a header, then one bullet per issue.
    ///
    /// ```text
    /// Validation failed (zod):
    ///   - Expected string (at user.name)
    ///   - Required
    /// ```
    pub fn format(&self) -> String {
        let mut out = if self.vendor.is_empty() {
            "Validation failed:".to_string()
        } else {
            format!("Validation failed ({}):", self.vendor)
        };
        for issue in &self.issues {
            out.push_str("\n  - ");
            out.push_str(&issue.message);
            if let Some(path) = issue.dotted_path() {
                out.push_str(" (at ");
                out.push_str(&path);
                out.push(')');
            }
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::error::Error for ValidationError {}

/// Validates `value`, failing if the schema defers its answer.
pub fn validate(schema: &dyn StandardSchema, value: Value) -> Result<ValidationResult> {
    let vendor = vendor_of(schema);
    match schema.validate(value) {
        Validation::Ready(outcome) => Ok(settle(outcome, vendor)),
        Validation::Deferred(_) => Err(Error::AsyncValidationRequired { vendor }),
    }
}

/// Validates `value`, awaiting a deferred answer if there is one.
pub async fn validate_async(schema: &dyn StandardSchema, value: Value) -> ValidationResult {
    let vendor = vendor_of(schema);
    let outcome = match schema.validate(value) {
        Validation::Ready(outcome) => outcome,
        Validation::Deferred(future) => future.await,
    };
    settle(outcome, vendor)
}

fn settle(outcome: Outcome, vendor: String) -> ValidationResult {
    let result = ValidationResult::from_outcome(outcome, vendor);
    debug!(
        vendor = result.vendor(),
        success = result.is_success(),
        issues = result.issues().map_or(0, <[Issue]>::len),
        "schema validation"
    );
    result
}

/// Validates `value` and returns the validated value, or [`Error::Validation`].
pub fn parse(schema: &dyn StandardSchema, value: Value) -> Result<Value> {
    Ok(validate(schema, value)?.into_result()?)
}

pub async fn parse_async(schema: &dyn StandardSchema, value: Value) -> Result<Value> {
    Ok(validate_async(schema, value).await.into_result()?)
}

/// Like [`parse`], but any failure yields `None`.
pub fn safe_parse(schema: &dyn StandardSchema, value: Value) -> Option<Value> {
    parse(schema, value).ok()
}

pub async fn safe_parse_async(schema: &dyn StandardSchema, value: Value) -> Option<Value> {
    parse_async(schema, value).await.ok()
}

// ============================================================================
// Built-in schemas
// ============================================================================

/// A schema backed by a synchronous closure.
pub struct FnSchema<F> {
    vendor: String,
    check: F,
}

impl<F> FnSchema<F>
where
    F: Fn(Value) -> Outcome + Send + Sync,
{
    pub fn new(vendor: impl Into<String>, check: F) -> Self {
        Self {
            vendor: vendor.into(),
            check,
        }
    }
}

impl<F> StandardSchema for FnSchema<F>
where
    F: Fn(Value) -> Outcome + Send + Sync,
{
    fn standard(&self) -> Option<SchemaProps<'_>> {
        Some(SchemaProps {
            version: STANDARD_SCHEMA_VERSION,
            vendor: &self.vendor,
        })
    }

    fn validate(&self, value: Value) -> Validation {
        Validation::Ready((self.check)(value))
    }
}

/// A schema backed by a closure returning a future.
///
/// Always answers with [`Validation::Deferred`], so only the async entry
/// points accept it.
pub struct AsyncFnSchema<F> {
    vendor: String,
    check: F,
}

impl<F, Fut> AsyncFnSchema<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    pub fn new(vendor: impl Into<String>, check: F) -> Self {
        Self {
            vendor: vendor.into(),
            check,
        }
    }
}

impl<F, Fut> StandardSchema for AsyncFnSchema<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn standard(&self) -> Option<SchemaProps<'_>> {
        Some(SchemaProps {
            version: STANDARD_SCHEMA_VERSION,
            vendor: &self.vendor,
        })
    }

    fn validate(&self, value: Value) -> Validation {
        Validation::Deferred((self.check)(value).boxed())
    }
}

/// Requires the input to be an object carrying every listed key with a
/// non-null value. Passes the input through unchanged.
#[derive(Debug, Clone, Default)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl StandardSchema for RequiredFields {
    fn standard(&self) -> Option<SchemaProps<'_>> {
        Some(SchemaProps {
            version: STANDARD_SCHEMA_VERSION,
            vendor: "quill",
        })
    }

    fn validate(&self, value: Value) -> Validation {
        let Some(object) = value.as_object() else {
            return Outcome::Invalid(vec![Issue::new("expected an object")]).into();
        };
        let issues: Vec<Issue> = self
            .fields
            .iter()
            .filter(|field| object.get(field.as_str()).map_or(true, Value::is_null))
            .map(|field| Issue::new("required").at(field.as_str()))
            .collect();
        if issues.is_empty() {
            Outcome::Valid(value).into()
        } else {
            Outcome::Invalid(issues).into()
        }
    }
}
