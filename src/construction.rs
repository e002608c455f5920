//! Normalising submitted constructions into JSON values.
//!
//! Submissions arrive as text that is usually JSON but may be wrapped in a
//! Markdown code fence or written with Python literal syntax (tuples, single
//! quotes). Everything is funnelled into a [`serde_json::Value`] and the unit
//! parsers take it from there.

use std::str::FromStr;

use num_bigint::BigInt;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::VerifyError;

/// Largest magnitude at which an `f64` still represents every integer exactly.
const EXACT_F64_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Drop a surrounding ```` ``` ```` fence (with or without a language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return "",
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Rewrite Python literal syntax into JSON: tuples become arrays, single
/// quoted strings become double quoted, the Python constants are lowered and
/// trailing commas dropped. String contents are copied untouched.
///
/// Returns `None` for an unterminated string.
fn python_literal_to_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '+') {
            word.push(ch);
            continue;
        }
        flush_word(&mut word, &mut out);
        match ch {
            '\'' | '"' => {
                if !copy_string(ch, &mut chars, &mut out) {
                    return None;
                }
            }
            '(' => out.push('['),
            ')' | ']' | '}' => {
                // Python allows a trailing comma before a closing bracket
                let kept = out.trim_end().len();
                out.truncate(kept);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(if ch == ')' { ']' } else { ch });
            }
            _ => out.push(ch),
        }
    }
    flush_word(&mut word, &mut out);
    Some(out)
}

fn flush_word(word: &mut String, out: &mut String) {
    match word.as_str() {
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" => out.push_str("null"),
        _ => out.push_str(word),
    }
    word.clear();
}

/// Copy the body of a string opened by `quote` as a JSON string, consuming
/// the closing quote. False if the input ends first.
fn copy_string(quote: char, chars: &mut std::str::Chars<'_>, out: &mut String) -> bool {
    out.push('"');
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => return false,
            },
            c if c == quote => {
                out.push('"');
                return true;
            }
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    false
}

/// Parse submission text into a JSON value.
pub fn parse_text(text: &str) -> Result<Value, VerifyError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(VerifyError::malformed("empty construction"));
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(json_err) => python_literal_to_json(body)
            .and_then(|rewritten| serde_json::from_str::<Value>(&rewritten).ok())
            .ok_or_else(|| VerifyError::malformed(format!("not JSON or a Python literal: {json_err}"))),
    }
}

/// Read an integer, accepting floats with an integral value but never booleans.
pub fn as_integer(value: &Value) -> Option<i64> {
    let number = number_of(value)?;
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    let f = number.as_f64()?;
    (f.fract() == 0.0 && f.abs() < EXACT_F64_LIMIT).then_some(f as i64)
}

/// Read an arbitrary-precision integer with the same float tolerance as [`as_integer`].
pub fn as_bigint(value: &Value) -> Option<BigInt> {
    number_to_bigint(number_of(value)?)
}

fn number_to_bigint(number: &Number) -> Option<BigInt> {
    if let Ok(big) = BigInt::from_str(&number.to_string()) {
        return Some(big);
    }
    let f = number.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < EXACT_F64_LIMIT).then(|| BigInt::from(f as i64))
}

/// Read a finite real number.
pub fn as_real(value: &Value) -> Option<f64> {
    number_of(value)?.as_f64().filter(|f| f.is_finite())
}

fn number_of(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(number) => Some(number),
        _ => None,
    }
}

/// Describe a JSON value briefly for error messages
pub fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 40 {
        format!("{}...", text.chars().take(37).collect::<String>())
    } else {
        text
    }
}

/// Serialise big integers as plain JSON numbers rather than digit arrays.
pub mod json_bigint {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        Number::from_str(&value.to_string())
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let number = Number::deserialize(deserializer)?;
        number_to_bigint(&number)
            .ok_or_else(|| D::Error::custom(format!("{number} is not an integer")))
    }
}

/// [`json_bigint`] for sequences.
pub mod json_bigint_vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
        let numbers = values
            .iter()
            .map(|v| Number::from_str(&v.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(S::Error::custom)?;
        numbers.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigInt>, D::Error> {
        Vec::<Number>::deserialize(deserializer)?
            .iter()
            .map(|n| number_to_bigint(n).ok_or_else(|| D::Error::custom(format!("{n} is not an integer"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(parse_text(" [[0, 1], [1, 0]] ").unwrap(), json!([[0, 1], [1, 0]]));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let text = "```json\n[3, 2, 4, 1]\n```";
        assert_eq!(parse_text(text).unwrap(), json!([3, 2, 4, 1]));
    }

    #[test]
    fn test_python_literal_fallback() {
        let text = "[(0, 0), (1, 0), (1, 1),]";
        assert_eq!(parse_text(text).unwrap(), json!([[0, 0], [1, 0], [1, 1]]));

        let text = "{'V': [0, 1], 'E': [(0, 1)], 'ok': True}";
        assert_eq!(
            parse_text(text).unwrap(),
            json!({"V": [0, 1], "E": [[0, 1]], "ok": true})
        );
    }

    #[test]
    fn test_python_strings_keep_quotes_and_commas() {
        let text = r#"{'V': ["it's", 'a,]b'], 'E': [("it's", 'a,]b'),]}"#;
        assert_eq!(
            parse_text(text).unwrap(),
            json!({"V": ["it's", "a,]b"], "E": [["it's", "a,]b"]]})
        );

        let text = r#"['say "None"', 'don\'t', None]"#;
        assert_eq!(parse_text(text).unwrap(), json!(["say \"None\"", "don't", null]));
    }

    #[test]
    fn test_unterminated_python_string_is_malformed() {
        assert!(matches!(parse_text("['abc"), Err(VerifyError::Malformed(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(parse_text("not a list"), Err(VerifyError::Malformed(_))));
        assert!(matches!(parse_text("```\n```"), Err(VerifyError::Malformed(_))));
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(as_integer(&json!(4)), Some(4));
        assert_eq!(as_integer(&json!(4.0)), Some(4));
        assert_eq!(as_integer(&json!(4.5)), None);
        assert_eq!(as_integer(&json!(true)), None);
        assert_eq!(as_integer(&json!("4")), None);
    }

    #[test]
    fn test_bigint_roundtrip_through_json_number() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Wrapper {
            #[serde(with = "json_bigint")]
            n: BigInt,
        }

        let big = BigInt::from_str("123456789012345678901234567890").unwrap();
        let text = serde_json::to_string(&Wrapper { n: big.clone() }).unwrap();
        assert_eq!(text, r#"{"n":123456789012345678901234567890}"#);

        let back: Wrapper = serde_json::from_str(&text).unwrap();
        assert_eq!(back.n, big);
        assert_eq!(as_bigint(&json!(8.0)), Some(BigInt::from(8)));
    }
}
