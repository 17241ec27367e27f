//! Object helpers.

use serde_json::{Map, Value};

use super::args::{to_text, HelperContext, HelperError};
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("get", "Value at a dotted path (a.b.0.c), with an optional fallback", get),
    CatalogEntry::new("keys", "Keys of an object", keys),
    CatalogEntry::new("values", "Values of an object", values),
    CatalogEntry::new("entries", "Array of {key, value} pairs", entries),
    CatalogEntry::new("has", "True if an object has a key", has),
    CatalogEntry::new("pick", "Object with only the listed keys", pick),
    CatalogEntry::new("omit", "Object without the listed keys", omit),
    CatalogEntry::new("merge", "Shallow merge; later objects win", merge),
    CatalogEntry::new("json", "Serializes a value as JSON (pass true to pretty-print)", json),
    CatalogEntry::new("yaml", "Serializes a value as YAML", yaml),
    CatalogEntry::new("default", "The value, or a fallback when it is null, missing or empty", default),
];

fn get(args: &[Value], cx: &HelperContext) -> Result {
    let target = cx.arg(args, 0)?;
    let path = cx.text(args, 1)?;
    let found = lookup(target, &path).cloned();
    Ok(found.unwrap_or_else(|| args.get(2).cloned().unwrap_or(Value::Null)))
}

/// Resolves a dotted path; numeric segments index into arrays.
pub(crate) fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn keys(args: &[Value], cx: &HelperContext) -> Result {
    let object = object_or_empty(args, cx)?;
    Ok(Value::Array(object.keys().cloned().map(Value::String).collect()))
}

fn values(args: &[Value], cx: &HelperContext) -> Result {
    let object = object_or_empty(args, cx)?;
    Ok(Value::Array(object.values().cloned().collect()))
}

fn entries(args: &[Value], cx: &HelperContext) -> Result {
    let object = object_or_empty(args, cx)?;
    Ok(Value::Array(
        object
            .iter()
            .map(|(key, value)| serde_json::json!({ "key": key, "value": value }))
            .collect(),
    ))
}

fn has(args: &[Value], cx: &HelperContext) -> Result {
    let key = cx.text(args, 1)?;
    Ok(Value::Bool(match cx.arg(args, 0)? {
        Value::Object(map) => map.contains_key(&key),
        _ => false,
    }))
}

fn pick(args: &[Value], cx: &HelperContext) -> Result {
    let object = cx.object(args, 0)?;
    let wanted = key_list(&args[1..]);
    let picked: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| wanted.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(Value::Object(picked))
}

fn omit(args: &[Value], cx: &HelperContext) -> Result {
    let object = cx.object(args, 0)?;
    let unwanted = key_list(&args[1..]);
    let kept: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !unwanted.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(Value::Object(kept))
}

/// Keys given either as separate arguments or as one array.
fn key_list(args: &[Value]) -> Vec<String> {
    match args {
        [Value::Array(items)] => items.iter().map(to_text).collect(),
        _ => args.iter().map(to_text).collect(),
    }
}

fn merge(args: &[Value], cx: &HelperContext) -> Result {
    let mut merged = Map::new();
    for (index, value) in args.iter().enumerate() {
        match value {
            Value::Object(map) => merged.extend(map.clone()),
            Value::Null => {}
            other => {
                return Err(cx.invalid(format!(
                    "argument #{} is not an object: {}",
                    index + 1,
                    other
                )))
            }
        }
    }
    Ok(Value::Object(merged))
}

fn json(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.arg(args, 0)?;
    let pretty = matches!(args.get(1), Some(Value::Bool(true)))
        || matches!(cx.option("pretty"), Some(Value::Bool(true)));
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map(Value::String)
        .map_err(|err| HelperError::Custom(format!("json: {}", err)))
}

fn yaml(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.arg(args, 0)?;
    serde_yaml::to_string(value)
        .map(|text| Value::String(text.trim_end().to_string()))
        .map_err(|err| HelperError::Custom(format!("yaml: {}", err)))
}

fn default(args: &[Value], cx: &HelperContext) -> Result {
    let fallback = cx.arg(args, 1)?;
    let value = &args[0];
    let missing = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    Ok(if missing { fallback.clone() } else { value.clone() })
}

fn object_or_empty(args: &[Value], cx: &HelperContext) -> std::result::Result<Map<String, Value>, HelperError> {
    match cx.arg(args, 0)? {
        Value::Null => Ok(Map::new()),
        _ => cx.object(args, 0).cloned(),
    }
}
