//! Descriptor schemas and the validator operations built on them
//!
//! Every schema type is a `serde` struct that also derives
//! [`validator::Validate`]. Deserializing strips unknown keys, `validate`
//! checks the field-level constraints, so [`validate`] yields a normalized
//! copy or a descriptive error.

mod field;
mod kind;
mod props;

pub use field::{DataDetectorType, DateTimeStyle, Field, NumberStyle, TextAlignment};
pub use kind::{PassKind, TransitType};
pub use props::{
    Barcode, BarcodeFormat, Beacon, Location, Nfc, OverridableProps, Personalization,
    PersonalizationField, DEFAULT_BARCODE_ENCODING,
};

use crate::error::{PassError, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;
use validator::{Validate, ValidationError};

static RGB_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)\s*$")
        .expect("valid color pattern")
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid pattern")
});

/// Validate `value` against schema `T`, returning the normalized copy
pub fn validate<T>(value: &Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T =
        serde_json::from_value(value.clone()).map_err(|e| PassError::Schema(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Check whether `value` satisfies schema `T`
pub fn is_valid<T>(value: &Value) -> bool
where
    T: DeserializeOwned + Validate,
{
    validate::<T>(value).is_ok()
}

/// Keep only the elements that satisfy their schema, logging each rejection
pub fn filter_valid<T, I>(items: I) -> Vec<T>
where
    T: Validate,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping invalid {}: {}", short_type_name::<T>(), e);
                false
            }
        })
        .collect()
}

/// Like [`filter_valid`] for untyped JSON array elements
pub fn filter_valid_values<T>(values: &[Value]) -> Vec<T>
where
    T: DeserializeOwned + Validate,
{
    values
        .iter()
        .filter_map(|value| match validate::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Dropping invalid {}: {}", short_type_name::<T>(), e);
                None
            }
        })
        .collect()
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Colors are `rgb(r, g, b)` strings with channels in 0..=255
pub(crate) fn validate_rgb_color(color: &str) -> std::result::Result<(), ValidationError> {
    let captures = RGB_COLOR
        .captures(color)
        .ok_or_else(|| ValidationError::new("rgb_color"))?;

    for channel in captures.iter().skip(1).flatten() {
        let value: u16 = channel
            .as_str()
            .parse()
            .map_err(|_| ValidationError::new("rgb_color"))?;
        if value > 255 {
            return Err(ValidationError::new("rgb_color"));
        }
    }
    Ok(())
}

pub(crate) fn validate_uuid(uuid: &str) -> std::result::Result<(), ValidationError> {
    if UUID.is_match(uuid) {
        Ok(())
    } else {
        Err(ValidationError::new("uuid"))
    }
}

/// Field values are strings or numbers
pub(crate) fn validate_field_value(value: &Value) -> std::result::Result<(), ValidationError> {
    match value {
        Value::String(_) | Value::Number(_) => Ok(()),
        _ => Err(ValidationError::new("field_value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rgb_color() {
        assert!(validate_rgb_color("rgb(255, 0, 10)").is_ok());
        assert!(validate_rgb_color("rgb(0,0,0)").is_ok());
        assert!(validate_rgb_color("rgb(256, 0, 0)").is_err());
        assert!(validate_rgb_color("#ffffff").is_err());
    }

    #[test]
    fn test_uuid() {
        assert!(validate_uuid("E2C56DB5-DFFB-48D2-B060-D0F5A71096E0").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_strips_unknown_keys() {
        let nfc: Nfc = validate(&json!({
            "message": "hello",
            "unknownKey": true
        }))
        .unwrap();

        let back = serde_json::to_value(&nfc).unwrap();
        assert_eq!(back, json!({ "message": "hello" }));
    }

    #[test]
    fn test_is_valid_and_filter() {
        assert!(is_valid::<Location>(&json!({ "latitude": 45.0, "longitude": 9.0 })));
        assert!(!is_valid::<Location>(&json!({ "latitude": 145.0, "longitude": 9.0 })));

        let values = vec![
            json!({ "latitude": 45.0, "longitude": 9.0 }),
            json!({ "latitude": "north" }),
            json!({ "latitude": 10.0, "longitude": 200.0 }),
        ];
        let locations: Vec<Location> = filter_valid_values(&values);
        assert_eq!(locations.len(), 1);
    }
}
