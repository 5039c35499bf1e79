//! Conversion of bare words into typed values.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::node::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Convert a decoded word into a value.
///
/// A word may carry an explicit type prefix such as `date:2014-01-01` or
/// `string:10`; otherwise literals and numbers are recognised and anything
/// else stays a string. The error is a message describing an invalid
/// prefixed value.
pub fn convert(word: &str) -> Result<Value, String> {
    if let Some((prefix, rest)) = word.split_once(':') {
        if let Some(value) = convert_prefixed(prefix, rest) {
            return value;
        }
    }
    Ok(auto_convert(word))
}

/// Would `text` come back as exactly this string when read as a bare word?
pub fn reads_as_string(text: &str) -> bool {
    matches!(convert(text), Ok(Value::String(ref value)) if value == text)
}

/// Recognise a numeric literal.
pub fn parse_number(text: &str) -> Option<Value> {
    if is_integer_literal(text) {
        text.parse::<i64>()
            .ok()
            .map(Value::Integer)
            .or_else(|| Decimal::from_str(text).ok().map(Value::Decimal))
    } else if is_float_literal(text) {
        text.parse::<f64>()
            .ok()
            .filter(|float| float.is_finite())
            .map(Value::Float)
    } else {
        None
    }
}

fn auto_convert(word: &str) -> Value {
    match word {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "none" => Value::Null,
        _ => parse_number(word).unwrap_or_else(|| Value::String(word.to_string())),
    }
}

fn convert_prefixed(prefix: &str, rest: &str) -> Option<Result<Value, String>> {
    let converted = match prefix {
        "string" => Ok(Value::String(rest.to_string())),
        "number" => parse_number(rest).ok_or_else(|| format!("invalid number '{rest}'")),
        "boolean" => match rest {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("invalid boolean '{rest}'")),
        },
        "decimal" => Decimal::from_str(rest)
            .map(Value::Decimal)
            .map_err(|err| format!("invalid decimal '{rest}': {err}")),
        "date" => NaiveDate::parse_from_str(rest, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|err| format!("invalid date '{rest}': {err}")),
        "datetime" => parse_datetime(rest)
            .map(Value::DateTime)
            .map_err(|err| format!("invalid datetime '{rest}': {err}")),
        "time" => NaiveTime::parse_from_str(rest, TIME_FORMAT)
            .map(Value::Time)
            .map_err(|err| format!("invalid time '{rest}': {err}")),
        _ => return None,
    };
    Some(converted)
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
}

fn unsigned(text: &str) -> &str {
    text.strip_prefix(['-', '+']).unwrap_or(text)
}

fn is_integer_literal(text: &str) -> bool {
    let digits = unsigned(text);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

fn is_float_literal(text: &str) -> bool {
    let body = unsigned(text);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.bytes().any(|byte| byte.is_ascii_digit())
        && body
            .bytes()
            .all(|byte| byte.is_ascii_digit() || matches!(byte, b'.' | b'e' | b'E' | b'+' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(convert("true"), Ok(Value::Bool(true)));
        assert_eq!(convert("false"), Ok(Value::Bool(false)));
        assert_eq!(convert("null"), Ok(Value::Null));
        assert_eq!(convert("none"), Ok(Value::Null));
    }

    #[test]
    fn numbers() {
        assert_eq!(convert("42"), Ok(Value::Integer(42)));
        assert_eq!(convert("-18"), Ok(Value::Integer(-18)));
        assert_eq!(convert("-18.4"), Ok(Value::Float(-18.4)));
        assert_eq!(convert("1e3"), Ok(Value::Float(1000.0)));
        assert_eq!(
            convert("99999999999999999999"),
            Ok(Value::Decimal(Decimal::from_str("99999999999999999999").unwrap()))
        );
    }

    #[test]
    fn words_that_only_look_numeric_stay_strings() {
        assert_eq!(convert("inf"), Ok(Value::String("inf".to_string())));
        assert_eq!(convert("NaN"), Ok(Value::String("NaN".to_string())));
        assert_eq!(convert("1.2.3"), Ok(Value::String("1.2.3".to_string())));
        assert_eq!(convert("e10"), Ok(Value::String("e10".to_string())));
        assert_eq!(convert("besto.com"), Ok(Value::String("besto.com".to_string())));
    }

    #[test]
    fn prefixes() {
        assert_eq!(convert("string:10"), Ok(Value::String("10".to_string())));
        assert_eq!(convert("number:10"), Ok(Value::Integer(10)));
        assert_eq!(convert("boolean:0"), Ok(Value::Bool(false)));
        assert_eq!(
            convert("decimal:10.50"),
            Ok(Value::Decimal(Decimal::new(1050, 2)))
        );
        assert_eq!(
            convert("date:2014-01-31"),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2014, 1, 31).unwrap()))
        );
        assert_eq!(
            convert("datetime:2014-01-31T10:30:00"),
            Ok(Value::DateTime(
                NaiveDate::from_ymd_opt(2014, 1, 31)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap()
            ))
        );
        assert_eq!(
            convert("time:10:30:15"),
            Ok(Value::Time(NaiveTime::from_hms_opt(10, 30, 15).unwrap()))
        );
    }

    #[test]
    fn unknown_prefixes_are_plain_strings() {
        assert_eq!(
            convert("https://example.org"),
            Ok(Value::String("https://example.org".to_string()))
        );
    }

    #[test]
    fn invalid_prefixed_values_are_errors() {
        assert!(convert("date:yesterday").is_err());
        assert!(convert("number:ten").is_err());
    }

    #[test]
    fn reads_as_string_detects_ambiguity() {
        assert!(reads_as_string("FL"));
        assert!(!reads_as_string("10"));
        assert!(!reads_as_string("true"));
        assert!(!reads_as_string("date:2014-01-01"));
        assert!(!reads_as_string("string:x"));
    }
}
