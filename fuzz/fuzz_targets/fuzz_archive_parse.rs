#![no_main]

use libfuzzer_sys::fuzz_target;
use pkpass_rs::ArchiveReader;

fuzz_target!(|data: &[u8]| {
    // Skip inputs smaller than an end record
    if data.len() < 22 {
        return;
    }

    // Parsing should never panic
    let reader = match ArchiveReader::from_bytes(data) {
        Ok(r) => r,
        Err(_) => return, // Expected for invalid data
    };

    // Try to read each file - should never panic
    let files: Vec<String> = reader.list_files().to_vec();
    for file in &files {
        let _ = reader.read_file(file);
    }

    let _ = reader.entry_count();
    let _ = reader.contains("pass.json");
    let _ = reader.contains("");
    let _ = reader.contains("../../../etc/passwd");
});
