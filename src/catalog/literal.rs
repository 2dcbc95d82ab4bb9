//! Lenient object-literal decoder.
//!
//! The embed player inlines state as JavaScript object literals rather than
//! JSON. The dialect we accept beyond strict JSON is narrow:
//!
//! - string keys and values may be single-quoted (`'token'` for `"token"`),
//! - one trailing comma may appear immediately before the closing brace.
//!
//! Normalization strips that trailing comma, then substitutes double quotes
//! for single quotes, and hands the result to a strict JSON parser. Anything
//! still malformed after normalization is a decode error; callers treat it
//! as a resolution failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjectLiteralError {
    #[error("Not a brace-delimited object literal")]
    NotAnObject,

    #[error("Invalid object literal: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Decodes a `{ ... }` fragment in the lenient dialect described above.
pub fn decode_object_literal(fragment: &str) -> Result<serde_json::Value, ObjectLiteralError> {
    let trimmed = fragment.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return Err(ObjectLiteralError::NotAnObject);
    }

    let normalized = strip_trailing_comma(trimmed).replace('\'', "\"");
    let value = serde_json::from_str(&normalized)?;
    Ok(value)
}

/// Removes one comma sitting directly before the closing brace, tolerating
/// whitespace between the two.
fn strip_trailing_comma(literal: &str) -> String {
    let inner = &literal[..literal.len() - 1];
    match inner.trim_end().strip_suffix(',') {
        Some(stripped) => format!("{stripped}}}"),
        None => literal.to_string(),
    }
}
