//! Forgiving field decoders for hand-edited alarm documents.
//!
//! Each decoder accepts any JSON value. A value of the wrong type decodes
//! to the field's zero value instead of failing the whole record.

use serde::de::{Deserializer, IgnoredAny};
use serde::Deserialize;

use super::WeekdayMask;

/// Any scalar the document might carry where another type was expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// `true`/`false`, or a number where non-zero means true.
pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Bool(value) => value,
        Loose::Number(value) => value != 0.0,
        Loose::Text(_) | Loose::Other(_) => false,
    })
}

/// Whole numbers, with floats truncated. Negative or oversized values are 0.
pub(super) fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Number(value) if (0.0..=f64::from(u32::MAX)).contains(&value) => value as u32,
        _ => 0,
    })
}

/// Strings as-is, numbers as their decimal text, anything else empty.
pub(super) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(value) => value,
        Loose::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        Loose::Number(value) => value.to_string(),
        Loose::Bool(_) | Loose::Other(_) => String::new(),
    })
}

/// The repeat array, or an empty mask when the value is not an array.
pub(super) fn repeat_mask<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<WeekdayMask, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseMask {
        Mask(WeekdayMask),
        Other(IgnoredAny),
    }

    Ok(match LooseMask::deserialize(deserializer)? {
        LooseMask::Mask(mask) => mask,
        LooseMask::Other(_) => WeekdayMask::empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Fields {
        #[serde(deserialize_with = "flag")]
        flag: bool,
        #[serde(deserialize_with = "whole_number")]
        count: u32,
        #[serde(deserialize_with = "text")]
        name: String,
        #[serde(deserialize_with = "repeat_mask")]
        days: WeekdayMask,
    }

    fn fields(value: serde_json::Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_bool_accepts_numbers() {
        assert!(fields(json!({"flag": true})).flag);
        assert!(fields(json!({"flag": 1})).flag);
        assert!(!fields(json!({"flag": 0})).flag);
        assert!(!fields(json!({"flag": "yes"})).flag);
        assert!(!fields(json!({"flag": null})).flag);
    }

    #[test]
    fn test_u32_truncates_and_rejects_out_of_range() {
        assert_eq!(fields(json!({"count": 7})).count, 7);
        assert_eq!(fields(json!({"count": 7.0})).count, 7);
        assert_eq!(fields(json!({"count": 7.9})).count, 7);
        assert_eq!(fields(json!({"count": -3})).count, 0);
        assert_eq!(fields(json!({"count": 1e12})).count, 0);
        assert_eq!(fields(json!({"count": "8"})).count, 0);
        assert_eq!(fields(json!({"count": [1]})).count, 0);
    }

    #[test]
    fn test_string_accepts_numbers_and_null() {
        assert_eq!(fields(json!({"name": "wake"})).name, "wake");
        assert_eq!(fields(json!({"name": 42})).name, "42");
        assert_eq!(fields(json!({"name": 1.5})).name, "1.5");
        assert_eq!(fields(json!({"name": null})).name, "");
        assert_eq!(fields(json!({"name": {"nested": true}})).name, "");
    }

    #[test]
    fn test_repeat_falls_back_to_empty() {
        assert!(fields(json!({"days": [1, 1, 1, 1, 1, 1, 1]})).days.is_full());
        assert!(fields(json!({"days": "weekdays"})).days.is_empty());
        assert!(fields(json!({"days": null})).days.is_empty());
        assert_eq!(fields(json!({"days": ["x", 1]})).days.len(), 1);
    }

    #[test]
    fn test_missing_fields_stay_default() {
        let parsed = fields(json!({}));
        assert!(!parsed.flag);
        assert_eq!(parsed.count, 0);
        assert!(parsed.name.is_empty());
        assert!(parsed.days.is_empty());
    }
}
