//! Date helpers.
//!
//! Dates are accepted as RFC 3339 strings, `YYYY-MM-DD` dates (midnight
//! UTC), `YYYY-MM-DDTHH:MM:SS` local-less timestamps (taken as UTC) or epoch
//! milliseconds. Computed dates are returned as RFC 3339 strings in UTC.
//! Formats are strftime strings; an invalid format is a helper error rather
//! than a panic.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use super::args::{HelperContext, HelperError};
use super::CatalogEntry;

type Result = std::result::Result<Value, HelperError>;

const DEFAULT_FORMAT: &str = "%Y-%m-%d";

pub(super) const HELPERS: &[CatalogEntry] = &[
    CatalogEntry::new("now", "Current UTC time, RFC 3339 or formatted", now),
    CatalogEntry::new("formatDate", "Formats a date with a strftime pattern (default %Y-%m-%d)", format_date),
    CatalogEntry::new("addDays", "Adds (or subtracts) days", add_days),
    CatalogEntry::new("addHours", "Adds (or subtracts) hours", add_hours),
    CatalogEntry::new("addMinutes", "Adds (or subtracts) minutes", add_minutes),
    CatalogEntry::new("diffDays", "Whole days from the first date to the second", diff_days),
    CatalogEntry::new("isBefore", "True if the first date is earlier", is_before),
    CatalogEntry::new("isAfter", "True if the first date is later", is_after),
];

fn now(args: &[Value], cx: &HelperContext) -> Result {
    let now = Utc::now();
    match args.first() {
        Some(Value::String(format)) => format_with(&now, format, cx).map(Value::String),
        _ => Ok(Value::String(iso(&now))),
    }
}

fn format_date(args: &[Value], cx: &HelperContext) -> Result {
    let date = date_arg(args, 0, cx)?;
    let format = match args.get(1) {
        Some(Value::String(format)) => format.as_str(),
        _ => DEFAULT_FORMAT,
    };
    format_with(&date, format, cx).map(Value::String)
}

fn add_days(args: &[Value], cx: &HelperContext) -> Result {
    shift(args, cx, Duration::try_days)
}

fn add_hours(args: &[Value], cx: &HelperContext) -> Result {
    shift(args, cx, Duration::try_hours)
}

fn add_minutes(args: &[Value], cx: &HelperContext) -> Result {
    shift(args, cx, Duration::try_minutes)
}

fn shift(args: &[Value], cx: &HelperContext, unit: fn(i64) -> Option<Duration>) -> Result {
    let date = date_arg(args, 0, cx)?;
    let amount = cx.integer(args, 1)?;
    let shifted = unit(amount)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| cx.invalid("date out of range"))?;
    Ok(Value::String(iso(&shifted)))
}

fn diff_days(args: &[Value], cx: &HelperContext) -> Result {
    let from = date_arg(args, 0, cx)?;
    let to = date_arg(args, 1, cx)?;
    Ok(Value::from((to - from).num_days()))
}

fn is_before(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(date_arg(args, 0, cx)? < date_arg(args, 1, cx)?))
}

fn is_after(args: &[Value], cx: &HelperContext) -> Result {
    Ok(Value::Bool(date_arg(args, 0, cx)? > date_arg(args, 1, cx)?))
}

fn date_arg(args: &[Value], index: usize, cx: &HelperContext) -> std::result::Result<DateTime<Utc>, HelperError> {
    let value = cx.arg(args, index)?;
    parse_date(value).ok_or_else(|| cx.invalid(format!("not a date: {}", value)))
}

pub(crate) fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(date) = DateTime::parse_from_rfc3339(s) {
                return Some(date.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

fn iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_with(date: &DateTime<Utc>, format: &str, cx: &HelperContext) -> std::result::Result<String, HelperError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(cx.invalid(format!("invalid date format '{}'", format)));
    }
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.iter()))
        .map_err(|_| cx.invalid(format!("cannot format date with '{}'", format)))?;
    Ok(out)
}
