//! String helpers.

use deunicode::deunicode;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use super::args::{HelperContext, HelperError};
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

/// Upper bound, in bytes or columns, on text that `repeat` and the padding
/// helpers will produce.
const MAX_OUTPUT: usize = 1_000_000;

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("uppercase", "Converts text to upper case", uppercase),
    CatalogEntry::new("lowercase", "Converts text to lower case", lowercase),
    CatalogEntry::new("capitalize", "Upper-cases the first character", capitalize),
    CatalogEntry::new("titleCase", "Capitalizes every word", title_case),
    CatalogEntry::new("camelCase", "Converts to camelCase", camel_case),
    CatalogEntry::new("pascalCase", "Converts to PascalCase", pascal_case),
    CatalogEntry::new("snakeCase", "Converts to snake_case", snake_case),
    CatalogEntry::new("kebabCase", "Converts to kebab-case", kebab_case),
    CatalogEntry::new("trim", "Strips leading and trailing whitespace", trim),
    CatalogEntry::new("truncate", "Shortens text to a length, appending a suffix (default '...')", truncate),
    CatalogEntry::new("padStart", "Pads on the left to a display width", pad_start),
    CatalogEntry::new("padEnd", "Pads on the right to a display width", pad_end),
    CatalogEntry::new("repeat", "Repeats text n times", repeat),
    CatalogEntry::new("replace", "Replaces every occurrence of a substring", replace),
    CatalogEntry::new("split", "Splits text into an array on a separator", split),
    CatalogEntry::new("concat", "Joins all arguments as text", concat),
    CatalogEntry::new("substring", "Characters from start up to (not including) end", substring),
    CatalogEntry::new("startsWith", "True if text starts with a prefix", starts_with),
    CatalogEntry::new("endsWith", "True if text ends with a suffix", ends_with),
    CatalogEntry::new("slugify", "URL-safe ASCII slug", slugify),
];

fn uppercase(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(cx.text(args, 0)?.to_uppercase()))
}

fn lowercase(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(cx.text(args, 0)?.to_lowercase()))
}

fn capitalize(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(capitalize_first(&cx.text(args, 0)?)))
}

fn title_case(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    Ok(Value::String(out))
}

fn camel_case(args: &[Value], cx: &HelperContext) -> Result {
    let words = words(&cx.text(args, 0)?);
    let out: String = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                word.to_lowercase()
            } else {
                capitalize_first(&word.to_lowercase())
            }
        })
        .collect();
    Ok(Value::String(out))
}

fn pascal_case(args: &[Value], cx: &HelperContext) -> Result {
    let out: String = words(&cx.text(args, 0)?)
        .iter()
        .map(|word| capitalize_first(&word.to_lowercase()))
        .collect();
    Ok(Value::String(out))
}

fn snake_case(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(joined_lower(&cx.text(args, 0)?, "_")))
}

fn kebab_case(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(joined_lower(&cx.text(args, 0)?, "-")))
}

fn trim(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::String(cx.text(args, 0)?.trim().to_string()))
}

fn truncate(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let length = usize::try_from(cx.integer(args, 1)?).map_err(|_| cx.invalid("length must not be negative"))?;
    let suffix = match args.get(2) {
        Some(value) => super::to_text(value),
        None => "...".to_string(),
    };
    if text.chars().count() <= length {
        return Ok(Value::String(text));
    }
    let mut out: String = text.chars().take(length).collect();
    out.push_str(&suffix);
    Ok(Value::String(out))
}

fn pad_start(args: &[Value], cx: &HelperContext) -> Result {
    let (text, fill) = padding(args, cx)?;
    Ok(Value::String(fill + &text))
}

fn pad_end(args: &[Value], cx: &HelperContext) -> Result {
    let (text, fill) = padding(args, cx)?;
    Ok(Value::String(text + &fill))
}

/// Returns the text and the fill needed to reach the requested width.
fn padding(args: &[Value], cx: &HelperContext) -> std::result::Result<(String, String), HelperError> {
    let text = cx.text(args, 0)?;
    let width = usize::try_from(cx.integer(args, 1)?).map_err(|_| cx.invalid("width must not be negative"))?;
    if width > MAX_OUTPUT {
        return Err(cx.invalid(format!("width exceeds {}", MAX_OUTPUT)));
    }
    let pad = match args.get(2) {
        Some(value) => super::to_text(value),
        None => " ".to_string(),
    };
    let current = text.width();
    if current >= width || pad.is_empty() {
        return Ok((text, String::new()));
    }
    let mut fill = String::new();
    let mut fill_width = 0;
    'outer: while fill_width < width - current {
        for c in pad.chars() {
            let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if fill_width + w > width - current {
                break 'outer;
            }
            fill.push(c);
            fill_width += w;
        }
        if pad.width() == 0 {
            break;
        }
    }
    Ok((text, fill))
}

fn repeat(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let count = usize::try_from(cx.integer(args, 1)?).map_err(|_| cx.invalid("count must not be negative"))?;
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_OUTPUT => Ok(Value::String(text.repeat(count))),
        _ => Err(cx.invalid(format!("output exceeds {} bytes", MAX_OUTPUT))),
    }
}

fn replace(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let from = cx.text(args, 1)?;
    let to = cx.text(args, 2)?;
    if from.is_empty() {
        return Ok(Value::String(text));
    }
    Ok(Value::String(text.replace(&from, &to)))
}

fn split(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let separator = match args.get(1) {
        Some(value) => super::to_text(value),
        None => ",".to_string(),
    };
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Ok(Value::Array(parts))
}

fn concat(args: &[Value], _cx: &HelperContext) -> Result {
    Ok(Value::String(args.iter().map(super::to_text).collect()))
}

fn substring(args: &[Value], cx: &HelperContext) -> Result {
    let text = cx.text(args, 0)?;
    let len = text.chars().count() as i64;
    let start = cx.optional_integer(args, 1)?.unwrap_or(0).clamp(0, len);
    let end = cx.optional_integer(args, 2)?.unwrap_or(len).clamp(0, len);
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let out: String = text
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect();
    Ok(Value::String(out))
}

fn starts_with(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(cx.text(args, 0)?.starts_with(&cx.text(args, 1)?)))
}

fn ends_with(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(cx.text(args, 0)?.ends_with(&cx.text(args, 1)?)))
}

fn slugify(args: &[Value], cx: &HelperContext) -> Result {
    let ascii = deunicode(&cx.text(args, 0)?).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    Ok(Value::String(slug))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Splits identifiers and prose into words: on any non-alphanumeric
/// character and at lower-to-upper case boundaries (`fooBar` → `foo`, `Bar`).
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn joined_lower(text: &str, separator: &str) -> String {
    words(text)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}
