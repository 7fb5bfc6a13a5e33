//! Core data types shared across the store, sync and lifecycle layers

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ids, labels, layout};

/// Canonical button identifier
///
/// The only key shape used by the store. Legacy `dynamic-button-<n>` keys are
/// normalised to `<n>` when parsed and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ButtonId(u64);

impl ButtonId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a key could not be turned into a `ButtonId`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid button id '{0}'")]
pub struct InvalidButtonId(pub String);

impl FromStr for ButtonId {
    type Err = InvalidButtonId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(ids::LEGACY_PREFIX).unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(ButtonId)
            .map_err(|_| InvalidButtonId(s.to_string()))
    }
}

impl Serialize for ButtonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ButtonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ButtonId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a button id as integer or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ButtonId, E> {
                Ok(ButtonId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ButtonId, E> {
                u64::try_from(v)
                    .map(ButtonId)
                    .map_err(|_| E::custom(format!("negative button id {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ButtonId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A positioned, sized, labelled marker on the map
///
/// Every field has a default so records written by older versions (or with
/// fields missing) still load; saves always write all six fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Button {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    #[serde(rename = "additionalText", alias = "additional_text")]
    pub additional_text: String,
}

impl Button {
    /// Button spawned by the "Create Button" action
    pub fn spawned(id: ButtonId) -> Self {
        Self {
            x: layout::SPAWN_X,
            y: id.get() as f64 * layout::SPAWN_Y_STEP,
            width: layout::DEFAULT_WIDTH,
            height: layout::DEFAULT_HEIGHT,
            text: placeholder_label(id),
            additional_text: String::new(),
        }
    }
}

/// Label shown on a button that was never renamed
pub fn placeholder_label(id: ButtonId) -> String {
    format!("{} {}", labels::PLACEHOLDER_PREFIX, id)
}

/// Partial update: `None` means "leave this field alone"
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ButtonPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
    pub additional_text: Option<String>,
}

impl ButtonPatch {
    /// Label and annotation only
    #[cfg(test)]
    pub fn text(text: impl Into<String>, additional_text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            additional_text: Some(additional_text.into()),
            ..Self::default()
        }
    }

    /// Full record, used when a button is created
    pub fn full(button: Button) -> Self {
        Self {
            x: Some(button.x),
            y: Some(button.y),
            width: Some(button.width),
            height: Some(button.height),
            text: Some(button.text),
            additional_text: Some(button.additional_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_id() {
        assert_eq!("42".parse::<ButtonId>(), Ok(ButtonId::new(42)));
        assert_eq!(" 7 ".parse::<ButtonId>(), Ok(ButtonId::new(7)));
    }

    #[test]
    fn test_parse_legacy_prefixed_id() {
        assert_eq!("dynamic-button-3".parse::<ButtonId>(), Ok(ButtonId::new(3)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("button".parse::<ButtonId>().is_err());
        assert!("-1".parse::<ButtonId>().is_err());
        assert!("dynamic-button-".parse::<ButtonId>().is_err());
    }

    #[test]
    fn test_spawned_button_layout() {
        let button = Button::spawned(ButtonId::new(3));
        assert_eq!(button.x, 50.0);
        assert_eq!(button.y, 150.0);
        assert_eq!(button.width, 100.0);
        assert_eq!(button.height, 50.0);
        assert_eq!(button.text, "Drag/Resize 3");
        assert!(button.additional_text.is_empty());
    }

    #[test]
    fn test_button_accepts_legacy_field_name() {
        let json = r#"{"x":1,"y":2,"width":3,"height":4,"text":"a","additional_text":"b"}"#;
        let button: Button = serde_json::from_str(json).unwrap();
        assert_eq!(button.additional_text, "b");

        let out = serde_json::to_value(&button).unwrap();
        assert_eq!(out["additionalText"], "b");
        assert!(out.get("additional_text").is_none());
    }

    #[test]
    fn test_button_missing_fields_default() {
        let button: Button = serde_json::from_str(r#"{"x":5}"#).unwrap();
        assert_eq!(button.x, 5.0);
        assert_eq!(button.width, 0.0);
        assert_eq!(button.text, "");
    }
}
