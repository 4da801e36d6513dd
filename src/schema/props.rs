use crate::schema::{validate_rgb_color, validate_uuid};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Encoding used for barcode messages unless told otherwise
pub const DEFAULT_BARCODE_ENCODING: &str = "iso-8859-1";

/// iBeacon that makes the pass relevant when nearby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    #[serde(rename = "proximityUUID")]
    #[validate(custom(function = "validate_uuid"))]
    pub proximity_uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Beacon {
    pub fn new(proximity_uuid: impl Into<String>) -> Self {
        Self {
            proximity_uuid: proximity_uuid.into(),
            major: None,
            minor: None,
            relevant_text: None,
        }
    }
}

/// Geographic location that makes the pass relevant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            relevant_text: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 4] = [
        BarcodeFormat::Qr,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
        BarcodeFormat::Code128,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,

    #[validate(length(min = 1))]
    pub message: String,

    #[serde(default = "default_barcode_encoding")]
    #[validate(length(min = 1))]
    pub message_encoding: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    pub fn new(format: BarcodeFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: default_barcode_encoding(),
            alt_text: None,
        }
    }
}

fn default_barcode_encoding() -> String {
    DEFAULT_BARCODE_ENCODING.to_string()
}

/// Near-field communication payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Nfc {
    #[validate(length(min = 1, max = 64))]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_public_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_authentication: Option<bool>,
}

impl Nfc {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            encryption_public_key: None,
            requires_authentication: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonalizationField {
    #[serde(rename = "PKPassPersonalizationFieldName")]
    Name,
    #[serde(rename = "PKPassPersonalizationFieldPostalCode")]
    PostalCode,
    #[serde(rename = "PKPassPersonalizationFieldEmailAddress")]
    EmailAddress,
    #[serde(rename = "PKPassPersonalizationFieldPhoneNumber")]
    PhoneNumber,
}

/// Content of `personalization.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Personalization {
    #[validate(length(min = 1))]
    pub required_personalization_fields: Vec<PersonalizationField>,

    #[validate(length(min = 1))]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
}

/// Top-level properties a caller may override when creating a pass
///
/// Keys not listed here are dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OverridableProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_type_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_identifier: Option<String>,

    #[validate(custom(function = "validate_rgb_color"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[validate(custom(function = "validate_rgb_color"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,

    #[validate(custom(function = "validate_rgb_color"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,

    #[serde(
        rename = "appLaunchURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub app_launch_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_store_identifiers: Option<Vec<u64>>,

    #[serde(
        rename = "webServiceURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub web_service_url: Option<String>,

    #[validate(length(min = 16))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_prohibited: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_strip_shine: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<Value>,
}
