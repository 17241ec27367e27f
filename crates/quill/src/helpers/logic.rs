//! Comparison and boolean helpers.
//!
//! These shadow the engine's own `eq`/`ne`/`gt`/... so that numbers compare
//! numerically across integer and float forms (`1` equals `1.0`) and strings
//! order lexicographically.

use std::cmp::Ordering;

use serde_json::Value;

use super::args::{to_number, truthy, type_name, HelperContext, HelperError};
use super::collection::loosely_equal;
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("eq", "True if both values are equal", eq),
    CatalogEntry::new("ne", "True if the values differ", ne),
    CatalogEntry::new("gt", "True if a > b", gt),
    CatalogEntry::new("gte", "True if a >= b", gte),
    CatalogEntry::new("lt", "True if a < b", lt),
    CatalogEntry::new("lte", "True if a <= b", lte),
    CatalogEntry::new("and", "True if every argument is truthy", and),
    CatalogEntry::new("or", "True if any argument is truthy", or),
    CatalogEntry::new("not", "Negates truthiness", not),
    CatalogEntry::new("typeOf", "JSON type name: null, boolean, number, string, array or object", type_of),
];

fn eq(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(loosely_equal(cx.arg(args, 0)?, cx.arg(args, 1)?)))
}

fn ne(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(!loosely_equal(cx.arg(args, 0)?, cx.arg(args, 1)?)))
}

fn gt(args: &[Value], cx: &HelperContext) -> Result {
    ordered(args, cx, Ordering::is_gt)
}

fn gte(args: &[Value], cx: &HelperContext) -> Result {
    ordered(args, cx, Ordering::is_ge)
}

fn lt(args: &[Value], cx: &HelperContext) -> Result {
    ordered(args, cx, Ordering::is_lt)
}

fn lte(args: &[Value], cx: &HelperContext) -> Result {
    ordered(args, cx, Ordering::is_le)
}

/// Numbers (or numeric strings paired with numbers) compare numerically,
/// two strings lexicographically. Anything else is never ordered.
fn ordered(args: &[Value], cx: &HelperContext, test: fn(Ordering) -> bool) -> Result {
    let a = cx.arg(args, 0)?;
    let b = cx.arg(args, 1)?;
    let ordering = match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) if !a.is_boolean() && !b.is_boolean() => x.partial_cmp(&y),
            _ => None,
        },
    };
    Ok(Value::Bool(ordering.is_some_and(test)))
}

fn and(args: &[Value], _cx: &HelperContext) -> Result {
    Ok(Value::Bool(!args.is_empty() && args.iter().all(truthy)))
}

fn or(args: &[Value], _cx: &HelperContext) -> Result {
    Ok(Value::Bool(args.iter().any(truthy)))
}

fn not(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(!truthy(cx.arg(args, 0)?)))
}

fn type_of(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(type_name(cx.arg(args, 0)?).to_string()))
}
