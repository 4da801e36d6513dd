//! Generate seed corpus for fuzzing

use pkpass_rs::{strings, ArchiveWriter, CompressionMethod};
use std::collections::BTreeMap;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let archive_dir = "fuzz/corpus/fuzz_archive_parse";
    let strings_dir = "fuzz/corpus/fuzz_strings_parse";
    fs::create_dir_all(archive_dir)?;
    fs::create_dir_all(strings_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: Empty archive (no files)
    {
        let path = format!("{}/seed_empty.zip", archive_dir);
        fs::write(&path, ArchiveWriter::in_memory().finish()?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 2: Pass-like layout, deflated descriptor and stored image
    {
        let path = format!("{}/seed_pass_layout.zip", archive_dir);
        let mut writer = ArchiveWriter::in_memory();
        writer.add_file("pass.json", br#"{"formatVersion":1,"generic":{}}"#)?;
        writer.add_file("icon.png", &[0x89, b'P', b'N', b'G'])?;
        writer.add_file("it.lproj/pass.strings", b"\"A\" = \"B\";\n")?;
        fs::write(&path, writer.finish()?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 3: Stored-only archive
    {
        let path = format!("{}/seed_stored.zip", archive_dir);
        let mut writer = ArchiveWriter::in_memory().with_compression(CompressionMethod::Stored);
        writer.add_file("a.txt", b"Hello, World!")?;
        writer.add_file("b/c.txt", &[0u8; 256])?;
        fs::write(&path, writer.finish()?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 4: Translations with escapes and comments
    {
        let path = format!("{}/seed_escapes.strings", strings_dir);
        let mut translations = BTreeMap::new();
        translations.insert("QUOTE".to_string(), "say \"hi\"".to_string());
        translations.insert("PATH".to_string(), "C:\\passes".to_string());
        translations.insert("LINES".to_string(), "one\ntwo".to_string());
        let mut data = b"/* seed */\n".to_vec();
        data.extend(strings::serialize(&translations));
        fs::write(&path, data)?;
        println!("✓ Generated: {}", path);
    }

    println!("\n✅ Seed corpus generated");
    Ok(())
}
