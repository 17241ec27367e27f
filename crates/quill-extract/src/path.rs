//! Base-variable resolution for path expressions.
//!
//! Both extraction strategies funnel every candidate expression through
//! [`base_variable`], so the rules for what counts as a top-level variable
//! live in one place.

/// The self-reference keyword. Never a variable on its own.
pub const SELF_REFERENCE: &str = "this";

/// Prefix marking engine-provided context variables (`@index`, `@key`, ...).
pub const CONTEXT_PREFIX: char = '@';

/// Returns the first path segment of a template expression.
///
/// - `user.profile.name` → `user`
/// - `items[0].title` → `items`
/// - `../parent` → `parent`
/// - `this.name` → `name`
/// - `this`, `@index`, `.`, `..` → `None`
///
/// # Example
///
/// ```rust
/// use quill_extract::base_variable;
///
/// assert_eq!(base_variable("user.profile.name").as_deref(), Some("user"));
/// assert_eq!(base_variable("items[0]").as_deref(), Some("items"));
/// assert_eq!(base_variable("@index"), None);
/// assert_eq!(base_variable("this"), None);
/// ```
pub fn base_variable(expression: &str) -> Option<String> {
    let mut expr = expression.trim();

    loop {
        if let Some(rest) = expr.strip_prefix("../") {
            expr = rest;
        } else if let Some(rest) = expr.strip_prefix("./") {
            expr = rest;
        } else {
            break;
        }
    }

    if let Some(rest) = expr
        .strip_prefix("this.")
        .or_else(|| expr.strip_prefix("this/"))
    {
        expr = rest;
    }

    if expr.starts_with(CONTEXT_PREFIX) {
        return None;
    }

    let end = expr.find(['.', '/', '[']).unwrap_or(expr.len());
    let base = &expr[..end];

    match base {
        "" | "." | ".." | SELF_REFERENCE => None,
        _ => Some(base.to_string()),
    }
}

/// Returns true for tokens that are literal values rather than references:
/// quoted strings (either quote style), numbers, and the keyword literals.
pub(crate) fn is_literal(token: &str) -> bool {
    if token.starts_with('"') || token.starts_with('\'') {
        return true;
    }
    if matches!(token, "true" | "false" | "null" | "undefined") {
        return true;
    }
    token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
        && token.parse::<f64>().is_ok()
}
