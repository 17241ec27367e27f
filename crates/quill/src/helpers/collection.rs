//! Collection helpers.

use std::cmp::Ordering;

use serde_json::Value;

use super::args::{to_number, to_text, truthy, HelperContext, HelperError};
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

/// Upper bound on the number of items `range` will produce.
const MAX_RANGE: usize = 100_000;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("join", "Joins array items with a separator (default ', ')", join),
    CatalogEntry::new("first", "First item, or the first n items", first),
    CatalogEntry::new("last", "Last item, or the last n items", last),
    CatalogEntry::new("length", "Length of an array, string or object", length),
    CatalogEntry::new("reverse", "Reverses an array or string", reverse),
    CatalogEntry::new("sort", "Sorts an array, optionally by a field", sort),
    CatalogEntry::new("unique", "Removes duplicate items, keeping the first", unique),
    CatalogEntry::new("slice", "Items from start up to (not including) end", slice),
    CatalogEntry::new("includes", "True if an array holds a value or a string holds a substring", includes),
    CatalogEntry::new("pluck", "Collects one field from every object in an array", pluck),
    CatalogEntry::new("filterBy", "Keeps objects whose field equals a value", filter_by),
    CatalogEntry::new("chunk", "Splits an array into arrays of a given size", chunk),
    CatalogEntry::new("flatten", "Flattens nested arrays by one level", flatten),
    CatalogEntry::new("range", "Integers from start up to (not including) end", range),
    CatalogEntry::new("compact", "Removes falsy items", compact),
    CatalogEntry::new("isEmpty", "True for null, empty strings, arrays and objects", is_empty),
];

fn join(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let separator = match args.get(1) {
        Some(value) => to_text(value),
        None => ", ".to_string(),
    };
    let parts: Vec<String> = items.iter().map(to_text).collect();
    Ok(Value::String(parts.join(&separator)))
}

fn first(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    match count_arg(args, cx)? {
        None => Ok(items.first().cloned().unwrap_or(Value::Null)),
        Some(n) => Ok(Value::Array(items.into_iter().take(n).collect())),
    }
}

fn last(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    match count_arg(args, cx)? {
        None => Ok(items.last().cloned().unwrap_or(Value::Null)),
        Some(n) => {
            let skip = items.len().saturating_sub(n);
            Ok(Value::Array(items.into_iter().skip(skip).collect()))
        }
    }
}

fn count_arg(args: &[Value], cx: &HelperContext) -> std::result::Result<Option<usize>, HelperError> {
    match cx.optional_integer(args, 1)? {
        None => Ok(None),
        Some(n) => usize::try_from(n)
            .map(Some)
            .map_err(|_| cx.invalid("count must not be negative")),
    }
}

fn length(args: &[Value], cx: &HelperContext) -> Result {
    let len = match cx.arg(args, 0)? {
        Value::Array(items) => items.len(),
        Value::String(s) => s.chars().count(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        other => return Err(cx.invalid(format!("has no length: {}", other))),
    };
    Ok(Value::from(len))
}

fn reverse(args: &[Value], cx: &HelperContext) -> Result {
    match cx.arg(args, 0)? {
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        _ => {
            let mut items = cx.array_or_empty(args, 0)?;
            items.reverse();
            Ok(Value::Array(items))
        }
    }
}

fn sort(args: &[Value], cx: &HelperContext) -> Result {
    let mut items = cx.array_or_empty(args, 0)?;
    match args.get(1) {
        Some(Value::String(key)) => {
            items.sort_by(|a, b| compare(a.get(key).unwrap_or(&Value::Null), b.get(key).unwrap_or(&Value::Null)))
        }
        _ => items.sort_by(compare),
    }
    Ok(Value::Array(items))
}

fn unique(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let mut seen: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    Ok(Value::Array(seen))
}

fn slice(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let len = items.len() as i64;
    let resolve = |index: i64| if index < 0 { (len + index).max(0) } else { index.min(len) };
    let start = resolve(cx.optional_integer(args, 1)?.unwrap_or(0));
    let end = resolve(cx.optional_integer(args, 2)?.unwrap_or(len));
    if start >= end {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(Value::Array(items[start as usize..end as usize].to_vec()))
}

fn includes(args: &[Value], cx: &HelperContext) -> Result {
    let needle = cx.arg(args, 1)?;
    let found = match cx.arg(args, 0)? {
        Value::String(haystack) => haystack.contains(&to_text(needle)),
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, needle)),
        Value::Null => false,
        other => return Err(cx.invalid(format!("cannot search in {}", other))),
    };
    Ok(Value::Bool(found))
}

fn pluck(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let key = cx.text(args, 1)?;
    Ok(Value::Array(
        items
            .iter()
            .filter_map(|item| item.get(&key).cloned())
            .collect(),
    ))
}

fn filter_by(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let key = cx.text(args, 1)?;
    let expected = cx.arg(args, 2)?;
    Ok(Value::Array(
        items
            .into_iter()
            .filter(|item| item.get(&key).is_some_and(|value| loosely_equal(value, expected)))
            .collect(),
    ))
}

fn chunk(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let size = cx.integer(args, 1)?;
    if size < 1 {
        return Err(cx.invalid("chunk size must be at least 1"));
    }
    Ok(Value::Array(
        items
            .chunks(size as usize)
            .map(|chunk| Value::Array(chunk.to_vec()))
            .collect(),
    ))
}

fn flatten(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    Ok(Value::Array(out))
}

fn range(args: &[Value], cx: &HelperContext) -> Result {
    let (start, end) = match cx.optional_integer(args, 1)? {
        Some(end) => (cx.integer(args, 0)?, end),
        None => (0, cx.integer(args, 0)?),
    };
    let step = cx.optional_integer(args, 2)?.unwrap_or(1);
    if step == 0 {
        return Err(cx.invalid("step must not be zero"));
    }
    let span = (i128::from(end) - i128::from(start)) / i128::from(step);
    if span > MAX_RANGE as i128 {
        return Err(cx.invalid(format!("range exceeds {} items", MAX_RANGE)));
    }
    let mut out = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        out.push(Value::from(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::Array(out))
}

fn compact(args: &[Value], cx: &HelperContext) -> Result {
    let items = cx.array_or_empty(args, 0)?;
    Ok(Value::Array(items.into_iter().filter(truthy).collect()))
}

fn is_empty(args: &[Value], cx: &HelperContext) -> Result {
    let empty = match cx.arg(args, 0)? {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    Ok(Value::Bool(empty))
}

/// Equality that treats numerically equal numbers as equal (`1 == 1.0`).
pub(super) fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// A total order over JSON values: null < booleans < numbers < strings <
/// everything else, with like values compared naturally.
pub(super) fn compare(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(_), Value::Number(_)) => {
            let (x, y) = (to_number(a).unwrap_or(0.0), to_number(b).unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
