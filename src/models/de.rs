//! Lenient deserializers for form-style payloads
//!
//! The admin panel and the public forms send numbers and flags as either
//! JSON scalars or strings, and blank strings for untouched fields.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Parse a yes/no flag as written in query strings and forms.
///
/// Accepts `true/false`, `1/0`, `si/sí/no`, `yes`. Anything else is `None`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "si" | "sí" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// `Option<i32>` from a number, a numeric string, a blank string or null
pub fn optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let out_of_range = || de::Error::custom("must be a whole number");
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => i32::try_from(n).map(Some).map_err(|_| out_of_range()),
        Some(Scalar::Float(f)) if f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => {
            Ok(Some(f as i32))
        }
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s.trim().parse::<i32>().map(Some).map_err(|_| out_of_range()),
        Some(_) => Err(out_of_range()),
    }
}

/// `Option<bool>` from a bool, `0/1`, a flag string or null
pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let invalid = || de::Error::custom("must be true or false");
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Bool(b)) => Ok(Some(b)),
        Some(Scalar::Int(0)) => Ok(Some(false)),
        Some(Scalar::Int(1)) => Ok(Some(true)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => parse_flag(&s).map(Some).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "optional_i32")]
        age: Option<i32>,
        #[serde(default, deserialize_with = "optional_flag")]
        active: Option<bool>,
    }

    fn probe(json: &str) -> Result<Probe, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" si "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn test_optional_i32_accepts_numbers_and_strings() {
        assert_eq!(probe(r#"{"age": 24}"#).unwrap().age, Some(24));
        assert_eq!(probe(r#"{"age": "24"}"#).unwrap().age, Some(24));
        assert_eq!(probe(r#"{"age": 24.0}"#).unwrap().age, Some(24));
        assert_eq!(probe(r#"{"age": ""}"#).unwrap().age, None);
        assert_eq!(probe(r#"{"age": null}"#).unwrap().age, None);
        assert_eq!(probe(r#"{}"#).unwrap().age, None);
    }

    #[test]
    fn test_optional_i32_rejects_garbage() {
        assert!(probe(r#"{"age": "twenty"}"#).is_err());
        assert!(probe(r#"{"age": 24.5}"#).is_err());
        assert!(probe(r#"{"age": true}"#).is_err());
    }

    #[test]
    fn test_optional_flag() {
        assert_eq!(probe(r#"{"active": false}"#).unwrap().active, Some(false));
        assert_eq!(probe(r#"{"active": 1}"#).unwrap().active, Some(true));
        assert_eq!(probe(r#"{"active": "si"}"#).unwrap().active, Some(true));
        assert_eq!(probe(r#"{}"#).unwrap().active, None);
        assert!(probe(r#"{"active": "perhaps"}"#).is_err());
    }
}
