use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::schema::PassKind;

/// Result type for pass building operations
pub type Result<T> = std::result::Result<T, PassError>;

/// Unified error type for all pass building operations
///
/// Only fatal conditions surface here. Per-item validation problems (invalid
/// fields, repeated keys, malformed personalization or translation files) are
/// reported through `tracing` and the offending item is dropped.
#[derive(Debug, Error)]
pub enum PassError {
    // Bundle lifecycle errors
    #[error("Bundle is frozen, cannot {0}")]
    Closed(&'static str),

    #[error("Bundle mime type is required")]
    MissingMimeType,

    // Descriptor errors
    #[error("Cannot finalize pass: no pass kind has been set")]
    MissingKind,

    #[error("Cannot finalize boarding pass: transit type is missing")]
    MissingTransitType,

    #[error("Invalid pass kind: {0}")]
    InvalidKind(String),

    #[error("Invalid transit type: {0}")]
    InvalidTransitType(String),

    #[error("Transit type is only allowed on boarding passes (current kind: {0})")]
    TransitTypeNotAllowed(PassKind),

    #[error("Invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("Schema validation failed: {0}")]
    Schema(String),

    // Certificate and signature errors
    #[error("Cannot finalize pass: certificates are missing")]
    MissingCertificates,

    #[error("Invalid certificates: {0}")]
    InvalidCertificates(String),

    #[error("Signature creation failed: {0}")]
    SignatureFailed(String),

    // Model errors
    #[error("Model not found at path: {0}")]
    ModelNotFound(PathBuf),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    // Archive errors
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("File not found in archive: {0}")]
    FileNotFound(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("CRC mismatch: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("Path error: {0}")]
    PathError(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(String),
}

impl From<toml::de::Error> for PassError {
    fn from(err: toml::de::Error) -> Self {
        PassError::TomlError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for PassError {
    fn from(err: validator::ValidationErrors) -> Self {
        PassError::Schema(err.to_string())
    }
}
