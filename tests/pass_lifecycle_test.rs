//! Integration tests for building, closing and exporting a single pass

use pkpass_rs::{
    ArchiveReader, CertificateMaterial, Certificates, Field, FieldGroup, Manifest,
    OverridableProps, Pass, PassError, PassKind, PemSource, Template, TransitType,
    PASS_MIME_TYPE,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn material() -> CertificateMaterial {
    let certs = fixtures().join("certs");
    CertificateMaterial {
        wwdr: Some(PemSource::Path(certs.join("wwdr.pem"))),
        signer_cert: Some(PemSource::Path(certs.join("signerCert.pem"))),
        signer_key: Some(PemSource::Path(certs.join("signerKey.pem"))),
        signer_key_passphrase: None,
    }
}

fn certificates() -> Arc<Certificates> {
    Arc::new(Certificates::load(&material()).unwrap())
}

fn template() -> Template {
    Template::new(fixtures().join("models/example.pass")).with_certificates(material())
}

fn descriptor(raw: &BTreeMap<String, Vec<u8>>) -> Value {
    serde_json::from_slice(&raw["pass.json"]).unwrap()
}

#[test]
fn test_basic_single_pass() {
    let mut pass = Pass::new(BTreeMap::new(), Some(certificates()), None).unwrap();
    pass.set_kind(PassKind::StoreCard).unwrap();

    let admitted = pass
        .fields_mut(FieldGroup::Primary)
        .unwrap()
        .push([Field::new("a", "1")]);
    assert_eq!(admitted, 1);

    let raw = pass.export_raw().unwrap();
    assert!(raw.contains_key("manifest.json"));
    assert!(raw.contains_key("signature"));

    let descriptor = descriptor(&raw);
    assert_eq!(
        descriptor["storeCard"]["primaryFields"],
        json!([{ "key": "a", "value": "1" }])
    );
    for group in FieldGroup::ALL {
        assert!(descriptor["storeCard"][group.as_str()].is_array());
    }
}

#[test]
fn test_duplicate_key_dropped_across_groups() {
    let mut pass = Pass::new(BTreeMap::new(), Some(certificates()), None).unwrap();
    pass.set_kind(PassKind::StoreCard).unwrap();

    let first = pass
        .fields_mut(FieldGroup::Header)
        .unwrap()
        .push([Field::new("a", "1")]);
    let second = pass
        .fields_mut(FieldGroup::Primary)
        .unwrap()
        .push([Field::new("a", "2")]);

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert!(pass.fields(FieldGroup::Primary).is_empty());
    assert_eq!(pass.fields(FieldGroup::Header)[0].value, json!("1"));
}

#[test]
fn test_kind_switch_resets_fields() {
    let mut pass = Pass::new(BTreeMap::new(), Some(certificates()), None).unwrap();
    pass.set_kind(PassKind::Coupon).unwrap();
    pass.fields_mut(FieldGroup::Header)
        .unwrap()
        .push([Field::new("a", "1"), Field::new("b", "2")]);

    pass.set_kind(PassKind::EventTicket).unwrap();
    for group in FieldGroup::ALL {
        assert!(pass.fields(group).is_empty());
    }

    let admitted = pass
        .fields_mut(FieldGroup::Primary)
        .unwrap()
        .push([Field::new("a", "3"), Field::new("b", "4")]);
    assert_eq!(admitted, 2);

    let props = pass.props();
    assert!(props.get("coupon").is_none());
    assert!(props["eventTicket"].is_object());
}

#[test]
fn test_boarding_pass_requires_transit_type() {
    let mut pass = Pass::new(BTreeMap::new(), Some(certificates()), None).unwrap();
    pass.set_kind(PassKind::BoardingPass).unwrap();

    assert!(matches!(
        pass.export_bytes(),
        Err(PassError::MissingTransitType)
    ));
    assert!(!pass.is_frozen());

    pass.set_transit_type(Some(TransitType::Air)).unwrap();
    let raw = pass.export_raw().unwrap();
    assert_eq!(
        descriptor(&raw)["boardingPass"]["transitType"],
        "PKTransitTypeAir"
    );
}

#[test]
fn test_idempotent_exports() {
    let mut pass = Pass::from_template(&template(), None).unwrap();

    let first = pass.export_bytes().unwrap();
    let second = pass.export_bytes().unwrap();
    assert_eq!(first, second);

    let mut streamed = Vec::new();
    pass.export_stream()
        .unwrap()
        .read_to_end(&mut streamed)
        .unwrap();
    assert_eq!(first, streamed);

    let raw_first = pass.export_raw().unwrap();
    let raw_second = pass.export_raw().unwrap();
    assert_eq!(raw_first, raw_second);
}

#[test]
fn test_template_export_archive_contents() {
    let props = OverridableProps {
        serial_number: Some("0042".to_string()),
        ..Default::default()
    };
    let mut pass = Pass::from_template(&template(), Some(props)).unwrap();
    assert_eq!(pass.mime_type(), PASS_MIME_TYPE);
    assert_eq!(pass.kind(), Some(PassKind::StoreCard));
    assert_eq!(pass.languages(), ["en", "it"]);

    let temp_file = NamedTempFile::new().unwrap();
    pass.write_to(temp_file.reopen().unwrap()).unwrap();

    let bytes = std::fs::read(temp_file.path()).unwrap();
    let reader = ArchiveReader::from_bytes(bytes).unwrap();

    // Hidden files never make it in, stale manifest and signature are replaced
    assert!(!reader.contains(".DS_Store"));
    assert!(reader.contains("icon.png"));
    assert!(reader.contains("it.lproj/logo.png"));
    assert!(reader.contains("en.lproj/pass.strings"));
    assert!(reader.contains("it.lproj/pass.strings"));
    assert_ne!(reader.read_file("signature").unwrap(), b"stale-signature");

    let files = reader.read_all().unwrap();
    let manifest = Manifest::from_json(&files["manifest.json"]).unwrap();
    let checked: BTreeMap<String, Vec<u8>> = files
        .into_iter()
        .filter(|(path, _)| path != "manifest.json" && path != "signature")
        .collect();
    assert_eq!(manifest.len(), checked.len());
    manifest.verify(&checked).unwrap();

    let descriptor: Value = serde_json::from_slice(&checked["pass.json"]).unwrap();
    assert_eq!(descriptor["serialNumber"], "0042");
    assert_eq!(descriptor["organizationName"], "Example Coffee");
    assert_eq!(descriptor["formatVersion"], 1);
    assert_eq!(descriptor["storeCard"]["headerFields"][0]["value"], 120);
}

#[test]
fn test_clone_round_trip() {
    let mut source = Pass::from_template(&template(), None).unwrap();
    source
        .fields_mut(FieldGroup::Auxiliary)
        .unwrap()
        .push([Field::new("tier", "Gold")]);
    let source_raw = source.export_raw().unwrap();

    let props = OverridableProps {
        serial_number: Some("clone-1".to_string()),
        ..Default::default()
    };
    let mut clone = Pass::from_pass(&source, Some(props)).unwrap();
    assert!(!clone.is_frozen());
    assert_eq!(clone.fields(FieldGroup::Auxiliary).len(), 1);

    let clone_raw = clone.export_raw().unwrap();
    assert_eq!(
        source_raw.keys().collect::<Vec<_>>(),
        clone_raw.keys().collect::<Vec<_>>()
    );
    for (path, data) in &source_raw {
        if matches!(path.as_str(), "manifest.json" | "signature" | "pass.json") {
            continue;
        }
        assert_eq!(data, &clone_raw[path], "{} differs", path);
    }

    assert_eq!(descriptor(&clone_raw)["serialNumber"], "clone-1");
    assert_eq!(descriptor(&source_raw)["serialNumber"], "model-0000");
}

#[test]
fn test_clone_of_unfrozen_pass_is_independent() {
    let mut source = Pass::new(BTreeMap::new(), Some(certificates()), None).unwrap();
    source.set_kind(PassKind::Generic).unwrap();
    source.add_buffer("icon.png", vec![1, 2, 3]).unwrap();

    let mut clone = Pass::from_pass(&source, None).unwrap();
    clone.add_buffer("logo.png", vec![4]).unwrap();
    clone
        .fields_mut(FieldGroup::Primary)
        .unwrap()
        .push([Field::new("name", "clone")]);

    assert!(!source.files().contains_key("logo.png"));
    assert!(source.fields(FieldGroup::Primary).is_empty());
    assert_eq!(clone.kind(), Some(PassKind::Generic));
}

#[test]
fn test_missing_model() {
    let template = Template::new(fixtures().join("models/missing.pass"));
    assert!(matches!(
        Pass::from_template(&template, None),
        Err(PassError::ModelNotFound(_))
    ));
}

#[test]
fn test_repeated_descriptor_ignored() {
    let mut pass = Pass::from_template(&template(), None).unwrap();
    pass.add_buffer(
        "pass.json",
        serde_json::to_vec(&json!({ "coupon": {}, "serialNumber": "other" })).unwrap(),
    )
    .unwrap();

    assert_eq!(pass.kind(), Some(PassKind::StoreCard));
    assert_eq!(pass.props()["serialNumber"], "model-0000");
}
