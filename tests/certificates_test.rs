//! Loading signing material from TOML descriptions

use pkpass_rs::{CertificateMaterial, Certificates, PassError, PemSource};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn certs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/certs")
}

/// Helper: copy the fixture PEM files into a fresh directory
fn staged_certs() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["wwdr.pem", "signerCert.pem", "signerKey.pem", "signerKey-encrypted.pem"] {
        fs::copy(certs_dir().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

#[test]
fn test_toml_relative_paths() {
    let dir = staged_certs();
    let config = dir.path().join("certificates.toml");
    fs::write(
        &config,
        r#"
wwdr = { path = "wwdr.pem" }
signer_cert = { path = "signerCert.pem" }
signer_key = { path = "signerKey-encrypted.pem" }
signer_key_passphrase = "pass-fixture"
"#,
    )
    .unwrap();

    let material = CertificateMaterial::from_toml_file(&config).unwrap();
    match &material.wwdr {
        Some(PemSource::Path(path)) => assert!(path.starts_with(dir.path())),
        other => panic!("Expected resolved path, got: {:?}", other),
    }

    let certificates = Certificates::load(&material).unwrap();
    assert_eq!(
        certificates.signer_cert().tbs_certificate.issuer,
        certificates.wwdr().tbs_certificate.subject
    );
}

#[test]
fn test_toml_inline_pem() {
    let wwdr = fs::read_to_string(certs_dir().join("wwdr.pem")).unwrap();
    let dir = staged_certs();
    let config = dir.path().join("inline.toml");
    fs::write(
        &config,
        format!(
            "wwdr = {{ pem = {:?} }}\nsigner_cert = {{ path = \"signerCert.pem\" }}\nsigner_key = {{ path = \"signerKey.pem\" }}\n",
            wwdr
        ),
    )
    .unwrap();

    let material = CertificateMaterial::from_toml_file(&config).unwrap();
    assert!(matches!(material.wwdr, Some(PemSource::Pem(_))));
    assert!(Certificates::load(&material).is_ok());
}

#[test]
fn test_wrong_passphrase() {
    let dir = staged_certs();
    let material = CertificateMaterial {
        wwdr: Some(PemSource::Path(dir.path().join("wwdr.pem"))),
        signer_cert: Some(PemSource::Path(dir.path().join("signerCert.pem"))),
        signer_key: Some(PemSource::Path(dir.path().join("signerKey-encrypted.pem"))),
        signer_key_passphrase: Some("not the passphrase".to_string()),
    };

    assert!(matches!(
        Certificates::load(&material),
        Err(PassError::InvalidCertificates(_))
    ));
}

#[test]
fn test_incomplete_material() {
    let dir = staged_certs();
    let material = CertificateMaterial {
        wwdr: Some(PemSource::Path(dir.path().join("wwdr.pem"))),
        signer_cert: Some(PemSource::Path(dir.path().join("signerCert.pem"))),
        ..Default::default()
    };

    match Certificates::load(&material) {
        Err(PassError::InvalidCertificates(message)) => assert!(message.contains("signerKey")),
        other => panic!("Expected missing key error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "wwdr = { path = ").unwrap();

    assert!(matches!(
        CertificateMaterial::from_toml_file(&config),
        Err(PassError::TomlError(_))
    ));
}
