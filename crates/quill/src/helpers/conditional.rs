//! Conditional helpers usable inline, without block syntax.

use serde_json::Value;

use super::args::{truthy, HelperContext, HelperError};
use super::collection::loosely_equal;
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("ifThen", "The second argument if the first is truthy, else the third", if_then),
    CatalogEntry::new("switch", "Matches a value against case/result pairs; falls back to default=", switch),
    CatalogEntry::new("coalesce", "First argument that is neither null nor an empty string", coalesce),
];

fn if_then(args: &[Value], cx: &HelperContext) -> Result {
    let condition = cx.arg(args, 0)?;
    let then = cx.arg(args, 1)?;
    if truthy(condition) {
        Ok(then.clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Null))
    }
}

/// `{{switch status "open" "Open" "closed" "Closed" default="Unknown"}}`
///
/// A trailing unpaired argument also acts as the default.
fn switch(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.arg(args, 0)?;
    let mut pairs = args[1..].chunks_exact(2);
    for pair in pairs.by_ref() {
        if loosely_equal(value, &pair[0]) {
            return Ok(pair[1].clone());
        }
    }
    let trailing = pairs.remainder().first();
    Ok(cx
        .option("default")
        .or(trailing)
        .cloned()
        .unwrap_or(Value::Null))
}

fn coalesce(args: &[Value], _cx: &HelperContext) -> Result {
    Ok(args
        .iter()
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_if_then() {
        let cx = HelperContext::new("ifThen");
        assert_eq!(if_then(&[json!(true), json!("y"), json!("n")], &cx).unwrap(), json!("y"));
        assert_eq!(if_then(&[json!(0), json!("y"), json!("n")], &cx).unwrap(), json!("n"));
        assert_eq!(if_then(&[json!(0), json!("y")], &cx).unwrap(), json!(null));
    }

    #[test]
    fn test_switch() {
        let args = [json!("closed"), json!("open"), json!("Open"), json!("closed"), json!("Closed")];
        let cx = HelperContext::new("switch");
        assert_eq!(switch(&args, &cx).unwrap(), json!("Closed"));

        let cx = HelperContext::new("switch").with_option("default", json!("Unknown"));
        assert_eq!(switch(&[json!("x"), json!("a"), json!("A")], &cx).unwrap(), json!("Unknown"));

        let cx = HelperContext::new("switch");
        assert_eq!(switch(&[json!("x"), json!("a"), json!("A"), json!("other")], &cx).unwrap(), json!("other"));
        assert_eq!(switch(&[json!("x")], &cx).unwrap(), json!(null));
    }

    #[test]
    fn test_coalesce() {
        let cx = HelperContext::new("coalesce");
        assert_eq!(coalesce(&[json!(null), json!(""), json!(0), json!(1)], &cx).unwrap(), json!(0));
        assert_eq!(coalesce(&[], &cx).unwrap(), json!(null));
    }
}
