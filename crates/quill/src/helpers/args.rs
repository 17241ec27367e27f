//! Helper calling convention.
//!
//! Every helper receives its positional arguments as JSON values plus a
//! [`HelperContext`] holding the helper's name and any `key=value` hash
//! options. The context also carries the argument accessors, so error
//! messages name the helper that failed.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Error returned by a helper. Surfaces as a render error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error("{helper}: missing argument #{position}")]
    MissingArgument { helper: String, position: usize },

    #[error("{helper}: {reason}")]
    InvalidArgument { helper: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

/// The invocation context passed to every helper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelperContext {
    name: String,
    hash: Map<String, Value>,
}

impl HelperContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: Map::new(),
        }
    }

    /// Adds a hash option, as if written `key=value` in the template.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.hash.insert(key.into(), value);
        self
    }

    pub(crate) fn with_hash(name: impl Into<String>, hash: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            hash,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.hash.get(key)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.hash
    }

    pub fn invalid(&self, reason: impl Into<String>) -> HelperError {
        HelperError::InvalidArgument {
            helper: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// The argument at `index`, or [`HelperError::MissingArgument`].
    pub fn arg<'v>(&self, args: &'v [Value], index: usize) -> Result<&'v Value, HelperError> {
        args.get(index).ok_or_else(|| HelperError::MissingArgument {
            helper: self.name.clone(),
            position: index + 1,
        })
    }

    pub fn text(&self, args: &[Value], index: usize) -> Result<String, HelperError> {
        self.arg(args, index).map(to_text)
    }

    pub fn number(&self, args: &[Value], index: usize) -> Result<f64, HelperError> {
        let value = self.arg(args, index)?;
        to_number(value).ok_or_else(|| self.invalid(format!("expected a number, got {}", value)))
    }

    pub fn integer(&self, args: &[Value], index: usize) -> Result<i64, HelperError> {
        let number = self.number(args, index)?;
        if number.fract() != 0.0 {
            return Err(self.invalid(format!("expected an integer, got {}", number)));
        }
        Ok(number as i64)
    }

    /// Like [`integer`](Self::integer), but an absent or null argument is `None`.
    pub fn optional_integer(&self, args: &[Value], index: usize) -> Result<Option<i64>, HelperError> {
        match args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.integer(args, index).map(Some),
        }
    }

    pub fn array<'v>(&self, args: &'v [Value], index: usize) -> Result<&'v Vec<Value>, HelperError> {
        let value = self.arg(args, index)?;
        value
            .as_array()
            .ok_or_else(|| self.invalid(format!("expected an array, got {}", type_name(value))))
    }

    /// The array at `index`, treating null as empty.
    pub fn array_or_empty(&self, args: &[Value], index: usize) -> Result<Vec<Value>, HelperError> {
        match self.arg(args, index)? {
            Value::Null => Ok(Vec::new()),
            _ => self.array(args, index).cloned(),
        }
    }

    pub fn object<'v>(
        &self,
        args: &'v [Value],
        index: usize,
    ) -> Result<&'v Map<String, Value>, HelperError> {
        let value = self.arg(args, index)?;
        value
            .as_object()
            .ok_or_else(|| self.invalid(format!("expected an object, got {}", type_name(value))))
    }
}

/// Renders a value the way the engine would print it.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Numeric view of a value: numbers, numeric strings and booleans.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Builds a JSON number, keeping integers integral when exact.
pub fn number_value(number: f64) -> Value {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 9.0e15 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number).map_or(Value::Null, Value::Number)
    }
}

/// Template truthiness: null, false, 0, "" and [] are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
