//! Text family conversions.

use crate::error::ConvertResult;
use bytes::Bytes;
use pulldown_cmark::{Parser, html};
use serde_json::{Map, Number, Value};

/// Re-serialize JSON compactly and drop every quote character.
///
/// Keys and nested strings lose their quotes too:
/// `{"content":"x"}` becomes `{content:x}`. Output follows ECMAScript
/// `JSON.stringify`: integral numbers print without a fraction and
/// array-index keys come first in ascending order, other keys keep their
/// input order.
pub(crate) fn json_to_text(content: &[u8]) -> ConvertResult<Bytes> {
    let value: Value = serde_json::from_slice(content)?;
    let serialized = serde_json::to_string(&canonicalize(value))?;
    let stripped: String = serialized
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    Ok(Bytes::from(stripped))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(integral(n)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let (mut indexed, named): (Vec<_>, Vec<_>) = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .partition(|(k, _)| array_index(k).is_some());
            indexed.sort_by_key(|(k, _)| array_index(k));
            Value::Object(indexed.into_iter().chain(named).collect::<Map<_, _>>())
        }
        other => other,
    }
}

/// `1.0` and `1e2` as the integers `1` and `100`.
fn integral(n: Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f < 0.0 && f >= -(2f64.powi(63)) => Number::from(f as i64),
        // Negative zero lands here and prints as `0`.
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < 2f64.powi(64) => Number::from(f as u64),
        _ => n,
    }
}

/// Canonical array index (`0`..`2^32 - 2`), which objects order first.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}

/// Render CommonMark source to HTML.
pub(crate) fn markdown_to_html(content: &[u8]) -> ConvertResult<Bytes> {
    let source = std::str::from_utf8(content)?;
    let mut rendered = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut rendered, Parser::new(source));
    Ok(Bytes::from(rendered))
}
