//! Math helpers.
//!
//! Arguments are coerced with [`to_number`](super::to_number); results stay
//! integers when they are exact.

use serde_json::Value;

use super::args::{number_value, to_number, HelperContext, HelperError};
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("add", "Sum of two numbers", add),
    CatalogEntry::new("subtract", "Difference of two numbers", subtract),
    CatalogEntry::new("multiply", "Product of two numbers", multiply),
    CatalogEntry::new("divide", "Quotient of two numbers; dividing by zero is an error", divide),
    CatalogEntry::new("mod", "Remainder of a division; zero divisor is an error", modulo),
    CatalogEntry::new("abs", "Absolute value", abs),
    CatalogEntry::new("round", "Rounds to a number of decimals (default 0)", round),
    CatalogEntry::new("floor", "Rounds down", floor),
    CatalogEntry::new("ceil", "Rounds up", ceil),
    CatalogEntry::new("min", "Smallest of the arguments (or of one array)", min),
    CatalogEntry::new("max", "Largest of the arguments (or of one array)", max),
    CatalogEntry::new("clamp", "Limits a number to [min, max]", clamp),
    CatalogEntry::new("sum", "Sum of an array", sum),
    CatalogEntry::new("avg", "Mean of an array; empty arrays give 0", avg),
    CatalogEntry::new("formatNumber", "Thousands separators and fixed decimals", format_number),
    CatalogEntry::new("percent", "Formats a ratio (or value/total) as a percentage", percent),
];

fn add(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)? + cx.number(args, 1)?))
}

fn subtract(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)? - cx.number(args, 1)?))
}

fn multiply(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)? * cx.number(args, 1)?))
}

fn divide(args: &[Value], cx: &HelperContext) -> Result {
    let divisor = cx.number(args, 1)?;
    if divisor == 0.0 {
        return Err(cx.invalid("division by zero"));
    }
    Ok(number_value(cx.number(args, 0)? / divisor))
}

fn modulo(args: &[Value], cx: &HelperContext) -> Result {
    let divisor = cx.number(args, 1)?;
    if divisor == 0.0 {
        return Err(cx.invalid("division by zero"));
    }
    Ok(number_value(cx.number(args, 0)? % divisor))
}

fn abs(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)?.abs()))
}

fn round(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.number(args, 0)?;
    let decimals = cx.optional_integer(args, 1)?.unwrap_or(0).clamp(0, 15) as i32;
    let factor = 10f64.powi(decimals);
    Ok(number_value((value * factor).round() / factor))
}

fn floor(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)?.floor()))
}

fn ceil(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(cx.number(args, 0)?.ceil()))
}

fn min(args: &[Value], cx: &HelperContext) -> Result {
    extreme(args, cx, f64::min)
}

fn max(args: &[Value], cx: &HelperContext) -> Result {
    extreme(args, cx, f64::max)
}

fn extreme(args: &[Value], cx: &HelperContext, pick: fn(f64, f64) -> f64) -> Result {
    let numbers = numbers(args, cx)?;
    numbers
        .into_iter()
        .reduce(pick)
        .map(number_value)
        .ok_or_else(|| cx.invalid("needs at least one number"))
}

fn clamp(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.number(args, 0)?;
    let low = cx.number(args, 1)?;
    let high = cx.number(args, 2)?;
    if low > high {
        return Err(cx.invalid(format!("min {} is greater than max {}", low, high)));
    }
    Ok(number_value(value.clamp(low, high)))
}

fn sum(args: &[Value], cx: &HelperContext) -> Result {
    Ok(number_value(numbers(args, cx)?.iter().sum()))
}

fn avg(args: &[Value], cx: &HelperContext) -> Result {
    let numbers = numbers(args, cx)?;
    if numbers.is_empty() {
        return Ok(Value::from(0));
    }
    Ok(number_value(numbers.iter().sum::<f64>() / numbers.len() as f64))
}

fn format_number(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.number(args, 0)?;
    let decimals = cx.optional_integer(args, 1)?.unwrap_or(0).clamp(0, 15) as usize;
    let separator = cx
        .option("separator")
        .map(super::to_text)
        .unwrap_or_else(|| ",".to_string());
    Ok(Value::String(group_thousands(value, decimals, &separator)))
}

fn percent(args: &[Value], cx: &HelperContext) -> Result {
    let value = cx.number(args, 0)?;
    let ratio = match args.get(1) {
        Some(Value::Null) | None => value,
        Some(_) => {
            let total = cx.number(args, 1)?;
            if total == 0.0 {
                return Err(cx.invalid("total is zero"));
            }
            value / total
        }
    };
    let decimals = cx.optional_integer(args, 2)?.unwrap_or(0).clamp(0, 15) as usize;
    Ok(Value::String(format!("{:.*}%", decimals, ratio * 100.0)))
}

/// Numbers from either the argument list or a single array argument.
fn numbers(args: &[Value], cx: &HelperContext) -> std::result::Result<Vec<f64>, HelperError> {
    let values = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };
    values
        .iter()
        .map(|value| to_number(value).ok_or_else(|| cx.invalid(format!("not a number: {}", value))))
        .collect()
}

fn group_thousands(value: f64, decimals: usize, separator: &str) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(f: fn(&[Value], &HelperContext) -> Result, args: &[Value]) -> Value {
        f(args, &HelperContext::new("test")).unwrap()
    }

    #[test]
    fn test_arithmetic_keeps_integers() {
        assert_eq!(run(add, &[json!(1), json!(2)]), json!(3));
        assert_eq!(run(add, &[json!("1.5"), json!(2)]), json!(3.5));
        assert_eq!(run(subtract, &[json!(1), json!(3)]), json!(-2));
        assert_eq!(run(multiply, &[json!(4), json!(2.5)]), json!(10));
        assert_eq!(run(divide, &[json!(7), json!(2)]), json!(3.5));
        assert_eq!(run(modulo, &[json!(7), json!(3)]), json!(1));
    }

    #[test]
    fn test_division_by_zero() {
        let cx = HelperContext::new("divide");
        assert!(divide(&[json!(1), json!(0)], &cx).is_err());
        assert!(modulo(&[json!(1), json!(0)], &cx).is_err());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(run(round, &[json!(2.567), json!(2)]), json!(2.57));
        assert_eq!(run(round, &[json!(2.5)]), json!(3));
        assert_eq!(run(floor, &[json!(-1.5)]), json!(-2));
        assert_eq!(run(ceil, &[json!(1.1)]), json!(2));
        assert_eq!(run(abs, &[json!(-4)]), json!(4));
    }

    #[test]
    fn test_extremes() {
        assert_eq!(run(min, &[json!(3), json!(1), json!(2)]), json!(1));
        assert_eq!(run(max, &[json!([3, 9, 2])]), json!(9));
        assert!(min(&[], &HelperContext::new("min")).is_err());
        assert_eq!(run(clamp, &[json!(15), json!(0), json!(10)]), json!(10));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(run(sum, &[json!([1, 2, 3])]), json!(6));
        assert_eq!(run(avg, &[json!([1, 2])]), json!(1.5));
        assert_eq!(run(avg, &[json!([])]), json!(0));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(run(format_number, &[json!(1234567.891), json!(2)]), json!("1,234,567.89"));
        assert_eq!(run(format_number, &[json!(999)]), json!("999"));
        assert_eq!(run(format_number, &[json!(-1000)]), json!("-1,000"));
        let cx = HelperContext::new("formatNumber").with_option("separator", json!("."));
        assert_eq!(format_number(&[json!(1234)], &cx).unwrap(), json!("1.234"));
    }

    #[test]
    fn test_percent() {
        assert_eq!(run(percent, &[json!(0.256)]), json!("26%"));
        assert_eq!(run(percent, &[json!(1), json!(3), json!(1)]), json!("33.3%"));
    }
}
