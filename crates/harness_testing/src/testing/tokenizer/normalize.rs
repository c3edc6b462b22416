//! Turns captured tokenizer output and fixture expectations into comparable token arrays.
//!
//! Fixtures marked `doubleEscaped` store their strings with one extra level of `\uXXXX`
//! escaping. The tokenizer only ever sees and emits single-escaped text, so the extra level is
//! removed from the expected tokens. The actual output is used exactly as decoded.

use crate::testing::tokenizer::fixture::SubTest;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("output is not a token array: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the stdout of the tokenizer into a token array
pub fn decode_output(stdout: &[u8]) -> Result<Vec<Value>, OutputError> {
    let text = std::str::from_utf8(stdout)?;
    Ok(serde_json::from_str(text)?)
}

/// Returns the tokens the sub-test expects, with the double escaping removed when needed
pub fn expected_tokens(subtest: &SubTest) -> Vec<Value> {
    if subtest.double_escaped {
        subtest
            .expected_output
            .iter()
            .cloned()
            .map(unescape_value)
            .collect()
    } else {
        subtest.expected_output.clone()
    }
}

/// Decodes stdout and pairs it with the expected tokens as `(actual, expected)`
pub fn normalize(
    stdout: &[u8],
    subtest: &SubTest,
) -> Result<(Vec<Value>, Vec<Value>), OutputError> {
    let actual = decode_output(stdout)?;
    Ok((actual, expected_tokens(subtest)))
}

/// Applies `unescape` to every string in the value, including object keys (attribute names)
pub fn unescape_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(unescape(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(unescape_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (unescape(&key), unescape_value(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Removes one level of escaping: `\uXXXX` becomes the code point (surrogate pairs are combined)
/// and `\\` becomes a single backslash. Lone surrogates cannot be represented and are left
/// untouched, as is any other backslash sequence.
pub fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find('\\') {
        result.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let consumed = match decode_escape(rest) {
            Some((c, len)) => {
                result.push(c);
                len
            }
            None => {
                result.push('\\');
                1
            }
        };
        rest = &rest[consumed..];
    }

    result.push_str(rest);
    result
}

/// Decodes the escape sequence `s` starts with. Returns the character and the number of bytes
/// the sequence occupies.
fn decode_escape(s: &str) -> Option<(char, usize)> {
    let body = s.strip_prefix('\\')?;
    if body.starts_with('\\') {
        return Some(('\\', 2));
    }

    let code = hex_code_unit(body.strip_prefix('u')?)?;
    if (0xD800..0xDC00).contains(&code) {
        let low = s
            .get(6..)
            .and_then(|next| next.strip_prefix("\\u"))
            .and_then(hex_code_unit)
            .filter(|low| (0xDC00..0xE000).contains(low))?;
        let c = char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))?;
        return Some((c, 12));
    }

    char::from_u32(code).map(|c| (c, 6))
}

fn hex_code_unit(s: &str) -> Option<u32> {
    let digits = s.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(digits, 16).ok()
}

/// Escaped form of a tokenizer input, used when printing diagnostics
pub fn escape_input(input: &str) -> String {
    input.escape_default().to_string()
}
