use crate::schema::validate_field_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// One entry of a descriptor field group
///
/// `key` and `value` are mandatory; everything else is formatting metadata.
/// `row` is only meaningful in the auxiliary fields of an event ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[validate(length(min = 1))]
    pub key: String,

    #[validate(custom(function = "validate_field_value"))]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_detector_types: Option<Vec<DataDetectorType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<TextAlignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<DateTimeStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_style: Option<DateTimeStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores_time_zone: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_relative: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,

    #[validate(length(equal = 3))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<Value>,

    #[validate(range(max = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
}

impl Field {
    /// Create a field with just a key and a value
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label: None,
            attributed_value: None,
            change_message: None,
            data_detector_types: None,
            text_alignment: None,
            date_style: None,
            time_style: None,
            ignores_time_zone: None,
            is_relative: None,
            number_style: None,
            currency_code: None,
            semantics: None,
            row: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_text_alignment(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = Some(alignment);
        self
    }

    pub fn with_change_message(mut self, message: impl Into<String>) -> Self {
        self.change_message = Some(message.into());
        self
    }

    pub fn with_row(mut self, row: u8) -> Self {
        self.row = Some(row);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    #[serde(rename = "PKTextAlignmentLeft")]
    Left,
    #[serde(rename = "PKTextAlignmentCenter")]
    Center,
    #[serde(rename = "PKTextAlignmentRight")]
    Right,
    #[serde(rename = "PKTextAlignmentNatural")]
    Natural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataDetectorType {
    #[serde(rename = "PKDataDetectorTypePhoneNumber")]
    PhoneNumber,
    #[serde(rename = "PKDataDetectorTypeLink")]
    Link,
    #[serde(rename = "PKDataDetectorTypeAddress")]
    Address,
    #[serde(rename = "PKDataDetectorTypeCalendarEvent")]
    CalendarEvent,
}

/// Shared by `dateStyle` and `timeStyle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTimeStyle {
    #[serde(rename = "PKDateStyleNone")]
    None,
    #[serde(rename = "PKDateStyleShort")]
    Short,
    #[serde(rename = "PKDateStyleMedium")]
    Medium,
    #[serde(rename = "PKDateStyleLong")]
    Long,
    #[serde(rename = "PKDateStyleFull")]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberStyle {
    #[serde(rename = "PKNumberStyleDecimal")]
    Decimal,
    #[serde(rename = "PKNumberStylePercent")]
    Percent,
    #[serde(rename = "PKNumberStyleScientific")]
    Scientific,
    #[serde(rename = "PKNumberStyleSpellOut")]
    SpellOut,
}
