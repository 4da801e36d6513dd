/// Bundle example: stamp several passes from one model and pack them
///
/// Run with: cargo run --example bundle
use anyhow::Result;
use pkpass_rs::{
    pack, ArchiveReader, CertificateMaterial, OverridableProps, Pass, PemSource, Template,
};
use std::path::Path;

fn main() -> Result<()> {
    println!("=== pkpass-rs Bundle Example ===\n");

    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let certs = fixtures.join("certs");
    let material = CertificateMaterial {
        wwdr: Some(PemSource::Path(certs.join("wwdr.pem"))),
        signer_cert: Some(PemSource::Path(certs.join("signerCert.pem"))),
        signer_key: Some(PemSource::Path(certs.join("signerKey-encrypted.pem"))),
        signer_key_passphrase: Some("pass-fixture".to_string()),
    };
    let template = Template::new(fixtures.join("models/example.pass")).with_certificates(material);

    // Load the model once, then clone it per customer
    println!("1. Loading model...");
    let base = Pass::from_template(&template, None)?;
    println!("   ✓ Kind: {:?}, languages: {:?}", base.kind(), base.languages());

    println!("\n2. Stamping passes...");
    let mut passes = Vec::new();
    for (serial, member) in [("0001", "Ada"), ("0002", "Grace"), ("0003", "Linus")] {
        let props = OverridableProps {
            serial_number: Some(serial.to_string()),
            logo_text: Some(format!("Welcome, {}", member)),
            ..Default::default()
        };
        let mut pass = Pass::from_pass(&base, Some(props))?;
        pass.set_barcode_message(&format!("MEMBER-{}", serial))?;
        passes.push(pass);
        println!("   ✓ Pass {} for {}", serial, member);
    }

    println!("\n3. Packing...");
    let mut bundle = pack(&mut passes)?;
    let bytes = bundle.export_bytes()?;
    std::fs::write("example_bundle.pkpasses", &bytes)?;
    println!("   ✓ Bundle written: example_bundle.pkpasses ({})", bundle.mime_type());

    let reader = ArchiveReader::from_bytes(bytes)?;
    for filename in reader.list_files() {
        println!("     - {}", filename);
    }

    println!("\n✓ Example complete!");
    Ok(())
}
