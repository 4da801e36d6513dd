/// Basic example: build, sign and inspect a single store card
///
/// Run with: cargo run --example basic
use anyhow::{Context, Result};
use pkpass_rs::{
    ArchiveReader, Barcode, BarcodeFormat, Certificates, Field, FieldGroup, Location, Pass,
    PassKind,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== pkpass-rs Basic Example ===\n");

    println!("1. Loading certificates...");
    let certificates = load_certificates()?;

    println!("\n2. Building pass...");
    let mut pass = build_pass(certificates)?;

    println!("\n3. Exporting...");
    pass.write_to(std::fs::File::create("example_basic.pkpass")?)?;
    println!("   ✓ Pass written: example_basic.pkpass");

    println!("\n4. Inspecting archive...");
    inspect("example_basic.pkpass")?;

    println!("\n✓ Example complete!");
    Ok(())
}

fn load_certificates() -> Result<Arc<Certificates>> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/certs");
    let read = |name: &str| {
        std::fs::read(dir.join(name)).with_context(|| format!("reading {}", name))
    };

    let certificates = Certificates::from_pem(
        &read("wwdr.pem")?,
        &read("signerCert.pem")?,
        &read("signerKey.pem")?,
        None,
    )?;
    println!("   ✓ Signer: {}", certificates.signer_cert().tbs_certificate.subject);

    Ok(Arc::new(certificates))
}

fn build_pass(certificates: Arc<Certificates>) -> Result<Pass> {
    let mut pass = Pass::new(BTreeMap::new(), Some(certificates), None)?;
    pass.set_kind(PassKind::StoreCard)?;

    // Images are stored as given
    pass.add_buffer("icon.png", include_bytes!("../tests/fixtures/models/example.pass/icon.png").to_vec())?;

    let header = pass
        .fields_mut(FieldGroup::Header)?
        .push([Field::new("points", 120).with_label("POINTS")]);
    let primary = pass.fields_mut(FieldGroup::Primary)?.push([
        Field::new("balance", "21.75 EUR").with_label("BALANCE"),
        // Repeated key, dropped with a warning
        Field::new("points", 0),
    ]);
    println!("   Header fields admitted: {}", header);
    println!("   Primary fields admitted: {}", primary);

    pass.set_barcodes(Some(vec![Barcode::new(BarcodeFormat::Qr, "CARD-0001")]))?;
    pass.set_locations(Some(vec![Location::new(45.4642, 9.19)]))?;

    let mut italian = BTreeMap::new();
    italian.insert("BALANCE".to_string(), "Saldo".to_string());
    italian.insert("POINTS".to_string(), "Punti".to_string());
    pass.localize("it", Some(italian))?;

    Ok(pass)
}

fn inspect(path: &str) -> Result<()> {
    let reader = ArchiveReader::from_bytes(std::fs::read(path)?)?;

    println!("   Files in archive:");
    for filename in reader.list_files() {
        let entry = reader
            .get_entry(filename)
            .context("entry listed but missing")?;
        println!(
            "     - {} ({} bytes, {:?})",
            filename, entry.uncompressed_size, entry.compression
        );
    }

    let manifest = reader.read_file("manifest.json")?;
    println!("\n   manifest.json:\n   {}", String::from_utf8_lossy(&manifest));

    Ok(())
}
