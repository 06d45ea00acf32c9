//! Storage path templates
//!
//! `store_path` and `store_name` are expanded against each record before it
//! is written:
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `{{field}}` | the field's value (strings unquoted) |
//! | `{{field\|int}}` | the field as an integer, `0` if not numeric |
//! | `{{field\|yyyy}}` | 4-digit local year of the field's timestamp |
//! | `{{field\|MM}}` | 2-digit local month |
//! | `{{field\|dd}}` | 2-digit local day of month |
//!
//! Timestamps are Unix seconds, or RFC 3339 strings. Placeholders do not
//! nest. A placeholder with an unrecognised function expands to its own
//! inner text, so `{{ts|foo}}` becomes `ts|foo`.
//!
//! ```
//! use civic_transform::expand;
//!
//! let record = serde_json::json!({ "module_id": "vix", "ts": 1580132048.7 });
//! let record = record.as_object().unwrap();
//! assert_eq!(expand("{{module_id}}_{{ts|int}}.json", record), "vix_1580132048.json");
//! ```

use chrono::{DateTime, Local, TimeZone, Utc};
use civic_protocol::Document;
use serde_json::Value;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const FUNCTION_SEPARATOR: char = '|';

/// Expand every `{{...}}` placeholder in `pattern`
///
/// An unterminated `{{` and everything after it is copied as-is.
pub fn expand(pattern: &str, record: &Document) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start + OPEN.len()..].find(CLOSE) else {
            break;
        };
        let inner = &rest[start + OPEN.len()..start + OPEN.len() + len];

        out.push_str(&rest[..start]);
        out.push_str(&fill(inner, record));
        rest = &rest[start + OPEN.len() + len + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Value for the inner text of one placeholder
fn fill(inner: &str, record: &Document) -> String {
    let Some(sep) = inner.find(FUNCTION_SEPARATOR) else {
        return field_text(record.get(inner));
    };

    let field = &inner[..sep];
    let function = inner
        .rsplit_once(FUNCTION_SEPARATOR)
        .map_or("", |(_, f)| f);
    let value = record.get(field);

    match function {
        "int" => as_int(value).to_string(),
        "yyyy" => to_local(value).format("%Y").to_string(),
        "MM" => to_local(value).format("%m").to_string(),
        "dd" => to_local(value).format("%d").to_string(),
        _ => {
            tracing::debug!(placeholder = inner, "unknown template function");
            inner.to_string()
        }
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

/// Integer view of a field: floats truncate, anything else is 0
fn as_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Point in time held by a field, in local time
///
/// Numbers are Unix seconds; strings are RFC 3339. Anything else is the epoch.
fn to_local(value: Option<&Value>) -> DateTime<Local> {
    let utc = match value {
        Some(Value::Number(_)) => Utc.timestamp_opt(as_int(value), 0).single(),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        _ => None,
    };

    utc.unwrap_or_default().with_timezone(&Local)
}
