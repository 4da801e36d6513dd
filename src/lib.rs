//! pkpass-rs: build and sign wallet passes
//!
//! This library assembles `.pkpass` archives:
//! - A hand-written ZIP container (stored and deflated entries)
//! - The `pass.json` descriptor with typed, validated properties
//! - Ordered field lists sharing one key pool per pass kind
//! - `pass.strings` localization tables
//! - A SHA-1 manifest signed as a detached CMS/PKCS#7 structure
//! - Multi-pass `.pkpasses` bundles
//!
//! # Example
//!
//! ```no_run
//! use pkpass_rs::{CertificateMaterial, Field, FieldGroup, Pass, Template};
//!
//! let certificates = CertificateMaterial::from_toml_file("certs/certificates.toml")?;
//! let template = Template::new("models/coupon.pass").with_certificates(certificates);
//!
//! let mut pass = Pass::from_template(&template, None)?;
//! pass.fields_mut(FieldGroup::Primary)?
//!     .push([Field::new("offer", "20% off").with_label("OFFER")]);
//! pass.set_barcode_message("COUPON-0001")?;
//!
//! std::fs::write("coupon.pkpass", pass.export_bytes()?)?;
//! # Ok::<(), pkpass_rs::PassError>(())
//! ```

// Core modules
pub mod archive;
pub mod bundle;
pub mod certificates;
pub mod error;
pub mod fields;
pub mod manifest;
pub mod model;
pub mod pack;
pub mod pass;
pub mod schema;
pub mod signature;
pub mod strings;

// Re-export commonly used types
pub use archive::{ArchiveReader, ArchiveWriter, CompressionMethod, EntryInfo};
pub use bundle::{Bundle, PASSES_MIME_TYPE, PASS_MIME_TYPE};
pub use certificates::{CertificateMaterial, Certificates, PemSource};
pub use error::{PassError, Result};
pub use fields::{FieldGroup, FieldListMut};
pub use manifest::Manifest;
pub use model::{load_model, Template};
pub use pack::pack;
pub use pass::Pass;
pub use schema::{
    Barcode, BarcodeFormat, Beacon, Field, Location, Nfc, OverridableProps, PassKind,
    Personalization, PersonalizationField, TransitType,
};
pub use signature::create_signature;
