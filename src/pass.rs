//! The pass descriptor state machine
//!
//! A [`Pass`] owns a [`Bundle`] and layers the `pass.json` semantics on top
//! of it: a property bag, the active [`PassKind`] with its five field lists,
//! localization tables and the special file names. Any export closes the
//! pass exactly once: the descriptor, translation files, manifest and
//! signature are generated and the bundle is frozen.
//!
//! # Example
//!
//! ```no_run
//! use pkpass_rs::{Certificates, Field, FieldGroup, Pass, PassKind};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! # fn main() -> pkpass_rs::Result<()> {
//! let certificates = Arc::new(Certificates::from_pem(
//!     &std::fs::read("certs/wwdr.pem")?,
//!     &std::fs::read("certs/signerCert.pem")?,
//!     &std::fs::read("certs/signerKey.pem")?,
//!     None,
//! )?);
//!
//! let mut pass = Pass::new(BTreeMap::new(), Some(certificates), None)?;
//! pass.set_kind(PassKind::StoreCard)?;
//! pass.fields_mut(FieldGroup::Primary)?
//!     .push([Field::new("balance", "21.75 EUR").with_label("BALANCE")]);
//!
//! let pkpass = pass.export_bytes()?;
//! # Ok(())
//! # }
//! ```

use crate::archive::normalize_path;
use crate::bundle::{Bundle, PASS_MIME_TYPE};
use crate::certificates::{CertificateMaterial, Certificates};
use crate::error::{PassError, Result};
use crate::fields::{FieldGroup, FieldListMut, FieldLists};
use crate::manifest::{is_reserved, Manifest, MANIFEST_FILE_NAME, SIGNATURE_FILE_NAME};
use crate::model::{load_model, Template};
use crate::schema::{
    self, Barcode, BarcodeFormat, Beacon, Field, Location, Nfc, OverridableProps, PassKind,
    Personalization, TransitType,
};
use crate::signature::create_signature;
use crate::strings;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};
use validator::Validate;

/// File name of the pass descriptor
pub const PASS_FILE_NAME: &str = "pass.json";

/// File name of the personalization descriptor
pub const PERSONALIZATION_FILE_NAME: &str = "personalization.json";

/// Substring shared by every personalization-related file
const PERSONALIZATION_MARKER: &str = "personalization";

static ICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_-]+\.lproj/)?icon(?:@\dx)?\.png$").expect("valid icon pattern")
});

static PERSONALIZATION_LOGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^personalizationLogo(?:@\dx)?\.png$").expect("valid logo pattern")
});

/// A wallet pass being assembled
#[derive(Debug, Clone)]
pub struct Pass {
    bundle: Bundle,
    certificates: Option<Arc<Certificates>>,
    props: Map<String, Value>,
    fields: Option<FieldLists>,
    transit_type: Option<TransitType>,
    localizations: BTreeMap<String, BTreeMap<String, String>>,
    descriptor_received: bool,
}

impl Pass {
    /// Create a pass from an initial set of files
    ///
    /// Files go through [`Pass::add_buffer`], so a `pass.json` among them is
    /// imported and `<lang>.lproj/pass.strings` files become localization
    /// tables. `props` are merged over whatever `pass.json` provided.
    pub fn new<I>(
        buffers: I,
        certificates: Option<Arc<Certificates>>,
        props: Option<OverridableProps>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut pass = Self {
            bundle: Bundle::new(PASS_MIME_TYPE)?,
            certificates,
            props: Map::new(),
            fields: None,
            transit_type: None,
            localizations: BTreeMap::new(),
            descriptor_received: false,
        };

        for (path, data) in buffers {
            pass.add_buffer(&path, data)?;
        }

        if let Some(props) = props {
            pass.merge_overrides(props)?;
        }

        Ok(pass)
    }

    /// Create an independent copy of `source`
    ///
    /// Every file is copied, the current property bag becomes the new
    /// `pass.json`, pending localizations are carried over and the
    /// certificates are shared. Works on frozen and unfrozen sources alike.
    pub fn from_pass(source: &Pass, props: Option<OverridableProps>) -> Result<Self> {
        let mut buffers: BTreeMap<String, Vec<u8>> = source
            .bundle
            .files()
            .iter()
            .filter(|(path, _)| !is_reserved(path))
            .map(|(path, data)| (path.clone(), data.clone()))
            .collect();

        for (lang, translations) in &source.localizations {
            if !translations.is_empty() {
                buffers.insert(strings::strings_path(lang), strings::serialize(translations));
            }
        }

        buffers.insert(PASS_FILE_NAME.to_string(), source.descriptor_bytes()?);

        debug!("Cloning pass with {} files", buffers.len());
        Self::new(buffers, source.certificates.clone(), props)
    }

    /// Create a pass from a model directory
    pub fn from_template(template: &Template, props: Option<OverridableProps>) -> Result<Self> {
        let buffers = load_model(&template.model)?;
        let certificates = template
            .certificates
            .as_ref()
            .map(Certificates::load)
            .transpose()?
            .map(Arc::new);

        Self::new(buffers, certificates, props)
    }

    /// Mime type of the exported archive
    pub fn mime_type(&self) -> &str {
        self.bundle.mime_type()
    }

    pub fn is_frozen(&self) -> bool {
        self.bundle.is_frozen()
    }

    /// Files currently stored; `pass.json` and translations only appear after close
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        self.bundle.files()
    }

    pub fn certificates(&self) -> Option<&Arc<Certificates>> {
        self.certificates.as_ref()
    }

    pub fn kind(&self) -> Option<PassKind> {
        self.fields.as_ref().map(FieldLists::kind)
    }

    pub fn transit_type(&self) -> Option<TransitType> {
        self.transit_type
    }

    /// Snapshot of the descriptor: property bag plus the kind sub-object
    pub fn props(&self) -> Map<String, Value> {
        let mut props = self.props.clone();
        if let Some(fields) = &self.fields {
            props.insert(fields.kind().as_str().to_string(), self.kind_object(fields));
        }
        props
    }

    /// Fields of `group`, empty while no kind is set
    pub fn fields(&self, group: FieldGroup) -> &[Field] {
        self.fields
            .as_ref()
            .map(|fields| fields.get(group))
            .unwrap_or_default()
    }

    /// Mutable view over the fields of `group`
    pub fn fields_mut(&mut self, group: FieldGroup) -> Result<FieldListMut<'_>> {
        self.bundle.ensure_unfrozen("modify fields")?;
        self.fields
            .as_mut()
            .map(|fields| fields.get_mut(group))
            .ok_or(PassError::MissingKind)
    }

    pub fn localizations(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.localizations
    }

    pub fn languages(&self) -> Vec<&str> {
        self.localizations.keys().map(String::as_str).collect()
    }

    /// Assign already validated certificates
    pub fn set_certificates(&mut self, certificates: Arc<Certificates>) -> Result<()> {
        self.bundle.ensure_unfrozen("set certificates")?;
        self.certificates = Some(certificates);
        Ok(())
    }

    /// Load, validate and assign certificates
    pub fn load_certificates(&mut self, material: &CertificateMaterial) -> Result<()> {
        self.bundle.ensure_unfrozen("set certificates")?;
        let certificates = Certificates::load(material)?;
        self.certificates = Some(Arc::new(certificates));
        Ok(())
    }

    /// Switch the pass kind, discarding every field and reserved key
    pub fn set_kind(&mut self, kind: PassKind) -> Result<()> {
        self.bundle.ensure_unfrozen("change pass kind")?;
        self.install_kind(kind);
        Ok(())
    }

    /// Set or clear the transit type; only boarding passes accept one
    pub fn set_transit_type(&mut self, transit_type: Option<TransitType>) -> Result<()> {
        self.bundle.ensure_unfrozen("set transit type")?;
        match self.kind() {
            Some(PassKind::BoardingPass) => {
                self.transit_type = transit_type;
                Ok(())
            }
            Some(kind) => Err(PassError::TransitTypeNotAllowed(kind)),
            None => Err(PassError::MissingKind),
        }
    }

    /// Add a file, routing special names to their handlers
    ///
    /// - `manifest.json` and `signature` are ignored (regenerated at close)
    /// - the first `pass.json` is imported, later ones are ignored
    /// - `personalization.json` is kept only if it matches its schema
    /// - `<lang>.lproj/pass.strings` is merged into the localization table
    /// - everything else is stored as is
    pub fn add_buffer(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        self.bundle.ensure_unfrozen("add a buffer")?;

        let path = normalize_path(path);
        let data = data.into();

        if is_reserved(&path) {
            debug!("Ignoring {}, it is generated when the pass is closed", path);
            return Ok(());
        }

        if path == PASS_FILE_NAME {
            if self.descriptor_received {
                debug!("Ignoring repeated {}", PASS_FILE_NAME);
            } else {
                self.descriptor_received = true;
                self.import_descriptor(&data);
            }
            return Ok(());
        }

        if path == PERSONALIZATION_FILE_NAME {
            let valid = serde_json::from_slice::<Value>(&data)
                .map_err(|e| e.to_string())
                .and_then(|value| {
                    schema::validate::<Personalization>(&value).map_err(|e| e.to_string())
                });
            if let Err(e) = valid {
                warn!("Ignoring invalid {}: {}", PERSONALIZATION_FILE_NAME, e);
                return Ok(());
            }
            return self.bundle.add_buffer(&path, data);
        }

        if let Some(lang) = strings::language_of(&path) {
            let translations = strings::parse(&data);
            if translations.is_empty() {
                debug!("Dropping {}: no translations found", path);
            } else {
                self.localizations
                    .entry(lang.to_string())
                    .or_default()
                    .extend(translations);
            }
            return Ok(());
        }

        self.bundle.add_buffer(&path, data)
    }

    /// Merge translations for `lang`, or remove the language with `None`
    ///
    /// Removing a language also deletes every file under `<lang>.lproj/`.
    /// An empty map changes nothing.
    pub fn localize(
        &mut self,
        lang: &str,
        translations: Option<BTreeMap<String, String>>,
    ) -> Result<()> {
        self.bundle.ensure_unfrozen("localize")?;

        if !strings::is_valid_language(lang) {
            return Err(PassError::InvalidLanguage(lang.to_string()));
        }

        match translations {
            None => {
                self.localizations.remove(lang);
                let folder = strings::lproj_folder(lang);
                let removed = self.bundle.remove_where(|path| path.starts_with(&folder));
                debug!("Removed language {} and {} files", lang, removed.len());
            }
            Some(translations) if translations.is_empty() => {
                warn!("No translations supplied for {}, nothing to do", lang);
            }
            Some(translations) => {
                self.localizations
                    .entry(lang.to_string())
                    .or_default()
                    .extend(translations);
            }
        }

        Ok(())
    }

    /// Set or clear the iBeacons; invalid entries are dropped
    pub fn set_beacons(&mut self, beacons: Option<Vec<Beacon>>) -> Result<()> {
        self.set_list("beacons", beacons)
    }

    /// Set or clear the locations; invalid entries are dropped
    pub fn set_locations(&mut self, locations: Option<Vec<Location>>) -> Result<()> {
        self.set_list("locations", locations)
    }

    /// Set or clear the barcodes; invalid entries are dropped
    pub fn set_barcodes(&mut self, barcodes: Option<Vec<Barcode>>) -> Result<()> {
        self.set_list("barcodes", barcodes)
    }

    /// Generate one barcode per supported format for `message`
    pub fn set_barcode_message(&mut self, message: &str) -> Result<()> {
        if message.is_empty() {
            return self.set_barcodes(None);
        }

        let barcodes = BarcodeFormat::ALL
            .into_iter()
            .map(|format| Barcode::new(format, message))
            .collect();
        self.set_barcodes(Some(barcodes))
    }

    /// Set or clear the NFC payload
    pub fn set_nfc(&mut self, nfc: Option<Nfc>) -> Result<()> {
        self.bundle.ensure_unfrozen("set nfc")?;
        if let Some(nfc) = &nfc {
            nfc.validate()?;
        }
        self.set_prop("nfc", nfc.as_ref())
    }

    pub fn set_relevant_date(&mut self, date: Option<DateTime<Utc>>) -> Result<()> {
        self.set_prop("relevantDate", date.map(format_date).as_ref())
    }

    pub fn set_expiration_date(&mut self, date: Option<DateTime<Utc>>) -> Result<()> {
        self.set_prop("expirationDate", date.map(format_date).as_ref())
    }

    /// Finalize the pass: write descriptor, translations, manifest and
    /// signature, then freeze
    ///
    /// Closing a frozen pass does nothing. On error the pass stays unfrozen.
    pub fn close(&mut self) -> Result<()> {
        if self.is_frozen() {
            return Ok(());
        }

        let kind = self.kind().ok_or(PassError::MissingKind)?;
        if kind == PassKind::BoardingPass && self.transit_type.is_none() {
            return Err(PassError::MissingTransitType);
        }
        let certificates = self
            .certificates
            .clone()
            .ok_or(PassError::MissingCertificates)?;

        let descriptor = self.descriptor_bytes()?;
        self.bundle.add_buffer(PASS_FILE_NAME, descriptor)?;

        if !self.bundle.files().keys().any(|path| ICON.is_match(path)) {
            warn!("No icon file found, the pass will not be accepted by wallets");
        }

        for (lang, translations) in &self.localizations {
            let data = strings::serialize(translations);
            if data.is_empty() {
                continue;
            }
            self.bundle.add_buffer(&strings::strings_path(lang), data)?;
        }

        self.check_personalization();

        let manifest = Manifest::from_files(self.bundle.files()).to_json()?;
        let signature = create_signature(&manifest, &certificates)?;

        self.bundle.add_buffer(MANIFEST_FILE_NAME, manifest)?;
        self.bundle.add_buffer(SIGNATURE_FILE_NAME, signature)?;
        self.bundle.freeze()?;

        info!(
            "Closed {} pass with {} files",
            kind,
            self.bundle.files().len()
        );
        Ok(())
    }

    /// Close the pass and return the `.pkpass` bytes
    pub fn export_bytes(&mut self) -> Result<Vec<u8>> {
        self.close()?;
        self.bundle.export_bytes()
    }

    /// Close the pass and return a reader over the `.pkpass` bytes
    pub fn export_stream(&mut self) -> Result<impl Read> {
        self.close()?;
        self.bundle.export_stream()
    }

    /// Close the pass and return its final files
    pub fn export_raw(&mut self) -> Result<BTreeMap<String, Vec<u8>>> {
        self.close()?;
        self.bundle.export_raw()
    }

    /// Close the pass and write the `.pkpass` bytes to `writer`
    pub fn write_to<W: Write>(&mut self, writer: W) -> Result<()> {
        self.close()?;
        self.bundle.write_to(writer)
    }

    fn install_kind(&mut self, kind: PassKind) {
        if let Some(previous) = self.kind() {
            debug!("Replacing pass kind {} with {}", previous, kind);
        }
        self.fields = Some(FieldLists::new(kind));
        self.transit_type = None;
    }

    fn import_descriptor(&mut self, data: &[u8]) {
        let mut object = match serde_json::from_slice::<Value>(data) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!("Ignoring {}: not a JSON object", PASS_FILE_NAME);
                return;
            }
            Err(e) => {
                warn!("Ignoring {}: {}", PASS_FILE_NAME, e);
                return;
            }
        };

        let kind = PassKind::ALL
            .into_iter()
            .find(|kind| object.contains_key(kind.as_str()));

        let mut kind_object = Map::new();
        for candidate in PassKind::ALL {
            if let Some(value) = object.remove(candidate.as_str()) {
                match (Some(candidate) == kind, value) {
                    (true, Value::Object(inner)) => kind_object = inner,
                    (true, _) => warn!("Kind {} in {} is not an object", candidate, PASS_FILE_NAME),
                    (false, _) => warn!(
                        "Ignoring extra kind {} in {}, already found {:?}",
                        candidate, PASS_FILE_NAME, kind
                    ),
                }
            }
        }

        sanitize_list::<Beacon>(&mut object, "beacons");
        sanitize_list::<Location>(&mut object, "locations");
        sanitize_list::<Barcode>(&mut object, "barcodes");
        if let Some(nfc) = object.get("nfc") {
            if let Err(e) = schema::validate::<Nfc>(nfc) {
                warn!("Dropping invalid nfc from {}: {}", PASS_FILE_NAME, e);
                object.remove("nfc");
            }
        }

        if !self.props.is_empty() {
            warn!(
                "Importing {} over existing properties, they may be overwritten",
                PASS_FILE_NAME
            );
        }
        self.props.extend(object);

        let Some(kind) = kind else {
            if self.fields.is_none() {
                warn!(
                    "No pass kind found in {}, set one before exporting",
                    PASS_FILE_NAME
                );
            }
            return;
        };

        self.install_kind(kind);
        if let Some(fields) = self.fields.as_mut() {
            for group in FieldGroup::ALL {
                if let Some(Value::Array(values)) = kind_object.get(group.as_str()) {
                    fields.import(group, values);
                }
            }
        }

        if kind == PassKind::BoardingPass {
            match kind_object.get("transitType").and_then(Value::as_str) {
                Some(value) => match value.parse() {
                    Ok(transit_type) => self.transit_type = Some(transit_type),
                    Err(e) => warn!("{}", e),
                },
                None => debug!("Boarding pass imported without transit type"),
            }
        }
    }

    fn merge_overrides(&mut self, props: OverridableProps) -> Result<()> {
        props.validate()?;
        match serde_json::to_value(&props)? {
            Value::Object(overrides) => {
                debug!("Applying {} property overrides", overrides.len());
                self.props.extend(overrides);
                Ok(())
            }
            _ => Err(PassError::Schema("overrides must be an object".to_string())),
        }
    }

    fn set_list<T>(&mut self, key: &str, items: Option<Vec<T>>) -> Result<()>
    where
        T: Serialize + Validate,
    {
        self.bundle.ensure_unfrozen("set properties")?;
        let items = items.map(schema::filter_valid).filter(|items| !items.is_empty());
        self.set_prop(key, items.as_ref())
    }

    fn set_prop<T: Serialize>(&mut self, key: &str, value: Option<&T>) -> Result<()> {
        self.bundle.ensure_unfrozen("set properties")?;
        match value {
            Some(value) => {
                self.props.insert(key.to_string(), serde_json::to_value(value)?);
            }
            None => {
                self.props.remove(key);
            }
        }
        Ok(())
    }

    fn kind_object(&self, fields: &FieldLists) -> Value {
        let mut object = fields.to_json();
        if let Some(transit_type) = self.transit_type {
            object.insert(
                "transitType".to_string(),
                Value::String(transit_type.as_str().to_string()),
            );
        }
        Value::Object(object)
    }

    fn descriptor_bytes(&self) -> Result<Vec<u8>> {
        let mut descriptor = self.props();
        descriptor
            .entry("formatVersion")
            .or_insert_with(|| Value::from(1));
        Ok(serde_json::to_vec(&descriptor)?)
    }

    /// Personalization needs its descriptor, a logo and an NFC payload;
    /// without all three every personalization file is dropped
    fn check_personalization(&mut self) {
        let files = self.bundle.files();
        let has_descriptor = files.contains_key(PERSONALIZATION_FILE_NAME);
        let has_logo = files.keys().any(|path| PERSONALIZATION_LOGO.is_match(path));
        let has_nfc = self.props.contains_key("nfc");

        if has_descriptor && has_logo && has_nfc {
            return;
        }

        for path in self
            .bundle
            .remove_where(|path| path.contains(PERSONALIZATION_MARKER))
        {
            warn!(
                "Removing {}: personalization requires {}, a personalizationLogo and nfc",
                path, PERSONALIZATION_FILE_NAME
            );
        }
    }
}

/// Filter a typed array property in place, dropping it if nothing survives
fn sanitize_list<T>(object: &mut Map<String, Value>, key: &str)
where
    T: serde::de::DeserializeOwned + Serialize + Validate,
{
    let Some(value) = object.remove(key) else {
        return;
    };

    let Value::Array(values) = value else {
        warn!("Dropping {} from {}: not an array", key, PASS_FILE_NAME);
        return;
    };

    let valid: Vec<T> = schema::filter_valid_values(&values);
    if valid.is_empty() {
        return;
    }
    match serde_json::to_value(valid) {
        Ok(value) => {
            object.insert(key.to_string(), value);
        }
        Err(e) => warn!("Dropping {} from {}: {}", key, PASS_FILE_NAME, e),
    }
}

/// W3C date with second precision, e.g. `2025-03-01T18:30:00Z`
fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
