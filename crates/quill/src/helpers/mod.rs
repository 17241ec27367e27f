//! The built-in helper catalog.
//!
//! Every template engine gets these helpers installed once, the first time a
//! template or registry uses it. They are plain functions over JSON values
//! and compose as sub-expressions:
//!
//! ```handlebars
//! {{#if (gt (length items) 0)}}{{join (pluck items "name") ", "}}{{/if}}
//! ```
//!
//! | Group | Helpers |
//! |-------|---------|
//! | String | `uppercase` `lowercase` `capitalize` `titleCase` `camelCase` `pascalCase` `snakeCase` `kebabCase` `trim` `truncate` `padStart` `padEnd` `repeat` `replace` `split` `concat` `substring` `startsWith` `endsWith` `slugify` |
//! | Date | `now` `formatDate` `addDays` `addHours` `addMinutes` `diffDays` `isBefore` `isAfter` |
//! | Math | `add` `subtract` `multiply` `divide` `mod` `abs` `round` `floor` `ceil` `min` `max` `clamp` `sum` `avg` `formatNumber` `percent` |
//! | Collection | `join` `first` `last` `length` `reverse` `sort` `unique` `slice` `includes` `pluck` `filterBy` `chunk` `flatten` `range` `compact` `isEmpty` |
//! | Object | `get` `keys` `values` `entries` `has` `pick` `omit` `merge` `json` `yaml` `default` |
//! | Logic | `eq` `ne` `gt` `gte` `lt` `lte` `and` `or` `not` `typeOf` |
//! | Conditional | `ifThen` `switch` `coalesce` |
//!
//! `includes` works on both strings and arrays.
//!
//! Helpers are called with their positional arguments and a
//! [`HelperContext`]; named `key=value` options (such as `switch`'s
//! `default=`) arrive through the context, never mixed into the arguments.

mod args;
mod collection;
mod conditional;
mod date;
mod logic;
mod math;
mod object;
mod string;

use serde_json::Value;

pub use args::{number_value, to_number, to_text, truthy, type_name, HelperContext, HelperError};

use crate::engine::Engine;

/// Signature shared by all catalog helpers.
pub type Call = fn(&[Value], &HelperContext) -> Result<Value, HelperError>;

/// A named helper in the catalog.
#[derive(Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub(crate) call: Call,
}

impl CatalogEntry {
    const fn new(name: &'static str, description: &'static str, call: Call) -> Self {
        Self {
            name,
            description,
            call,
        }
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

const GROUPS: &[&[CatalogEntry]] = &[
    string::HELPERS,
    date::HELPERS,
    math::HELPERS,
    collection::HELPERS,
    object::HELPERS,
    logic::HELPERS,
    conditional::HELPERS,
];

/// Every catalog entry, grouped as in the table above.
pub fn catalog() -> impl Iterator<Item = &'static CatalogEntry> {
    GROUPS.iter().flat_map(|group| group.iter())
}

/// Names of all catalog helpers.
pub fn names() -> Vec<&'static str> {
    catalog().map(|entry| entry.name).collect()
}

/// One-line description of a catalog helper.
pub fn describe(name: &str) -> Option<&'static str> {
    catalog()
        .find(|entry| entry.name == name)
        .map(|entry| entry.description)
}

/// Installs the catalog into the default engine.
///
/// Idempotent: returns `true` only for the call that actually installed it.
/// Templates call this themselves; explicit calls are only needed to use the
/// default engine directly.
pub fn register_catalog() -> bool {
    Engine::default_engine().install_catalog()
}

/// Calls a catalog helper directly, outside any template.
///
/// ```rust
/// use quill::helpers::call;
/// use serde_json::json;
///
/// assert_eq!(call("snakeCase", &[json!("Hello World")]).unwrap(), json!("hello_world"));
/// ```
pub fn call(name: &str, args: &[Value]) -> Result<Value, HelperError> {
    let entry = catalog()
        .find(|entry| entry.name == name)
        .ok_or_else(|| HelperError::Custom(format!("unknown helper '{}'", name)))?;
    (entry.call)(args, &HelperContext::new(name))
}
