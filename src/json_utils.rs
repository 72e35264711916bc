//! Loose JSON helpers for embedded storefront data.
//!
//! Embedded page state is not a stable API: the same field may arrive as a
//! number, a numeric string or `null` between deployments. These helpers read
//! such values the permissive way the page scripts do, and report decode
//! failures with enough context to find the bad fragment in the page.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// JSON decode error with detailed context
#[derive(Debug)]
pub enum JsonError {
    /// Syntax error during parsing (line/column info)
    Syntax { msg: String, line: usize, column: usize },
    /// Data validation error (type mismatch)
    Data(String),
    /// Unexpected EOF, typically a fragment cut off by a naive capture
    UnexpectedEof(String),
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonError::Syntax { msg, line, column } => {
                write!(f, "JSON syntax error at line {}, column {}: {}", line, column, msg)
            }
            JsonError::Data(msg) => write!(f, "JSON validation error: {}", msg),
            JsonError::UnexpectedEof(msg) => write!(f, "Incomplete JSON: {}", msg),
        }
    }
}

impl std::error::Error for JsonError {}

impl From<serde_json::Error> for JsonError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() {
            JsonError::Syntax {
                msg: e.to_string(),
                line: e.line(),
                column: e.column(),
            }
        } else if e.is_eof() {
            JsonError::UnexpectedEof(e.to_string())
        } else {
            JsonError::Data(e.to_string())
        }
    }
}

/// Deserialize a fragment, rejecting empty and `null` input up front.
pub fn safe_deserialize<'a, T>(json: &'a str) -> Result<T, JsonError>
where
    T: Deserialize<'a>,
{
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Err(JsonError::Data("Empty JSON input".to_string()));
    }
    if trimmed == "null" {
        return Err(JsonError::Data("Null JSON input".to_string()));
    }

    serde_json::from_str(json).map_err(JsonError::from)
}

/// Follow a path of object keys.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Truthiness as the storefront scripts see it: `0`, `""`, `false`, `null`,
/// `[]` and `{}` are all "no value".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Non-negative integer from a number (floats truncated) or a numeric string.
pub fn as_u64_loose(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        _ => None,
    }
}

/// Signed integer from a number or numeric string.
pub fn as_i64_loose(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    }
}

/// Float from a number or numeric string.
pub fn as_f64_loose(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// String field of an object; empty strings count as absent.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Render a scalar the way it reads on the page (`"Хіт"` → `Хіт`, `3` → `3`).
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
