//! Archive container tests: round trips, compression and corruption detection

use pkpass_rs::{ArchiveReader, ArchiveWriter, CompressionMethod, PassError};

/// Helper: Create a valid test archive
fn create_test_archive() -> Vec<u8> {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("test.txt", b"Hello, World!").unwrap();
    writer.add_file("data.bin", &vec![0xAB; 1024]).unwrap();
    writer.finish().unwrap()
}

#[test]
fn test_basic_archive_roundtrip() {
    let data = create_test_archive();
    assert_eq!(&data[..4], b"PK\x03\x04");

    let reader = ArchiveReader::from_bytes(data).unwrap();
    assert_eq!(reader.entry_count(), 2);
    assert!(reader.contains("test.txt"));
    assert!(reader.contains("data.bin"));

    assert_eq!(reader.read_file("test.txt").unwrap(), b"Hello, World!");
    assert_eq!(reader.read_file("data.bin").unwrap(), vec![0xAB; 1024]);
}

#[test]
fn test_compression_methods() {
    let test_data = b"This is test data that should compress well. ".repeat(100);

    let mut writer = ArchiveWriter::in_memory();
    writer
        .add_file_with_compression("stored.txt", &test_data, CompressionMethod::Stored)
        .unwrap();
    writer
        .add_file_with_compression("deflated.txt", &test_data, CompressionMethod::Deflate)
        .unwrap();
    let reader = ArchiveReader::from_bytes(writer.finish().unwrap()).unwrap();

    let stored = reader.get_entry("stored.txt").unwrap();
    let deflated = reader.get_entry("deflated.txt").unwrap();
    assert_eq!(stored.compression, CompressionMethod::Stored);
    assert_eq!(deflated.compression, CompressionMethod::Deflate);
    assert!(deflated.compressed_size < stored.compressed_size);

    assert_eq!(reader.read_file("stored.txt").unwrap(), test_data);
    assert_eq!(reader.read_file("deflated.txt").unwrap(), test_data);
}

#[test]
fn test_highly_compressible_data() {
    let data = vec![0u8; 4 * 1024 * 1024];

    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("zeros.bin", &data).unwrap();
    let archive = writer.finish().unwrap();

    // 4MB of zeros should deflate to a few KB
    assert!(archive.len() < 64 * 1024, "archive is {} bytes", archive.len());

    let reader = ArchiveReader::from_bytes(archive).unwrap();
    assert_eq!(reader.read_file("zeros.bin").unwrap(), data);
}

#[test]
fn test_images_are_stored() {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("icon.png", &[0x89; 512]).unwrap();
    writer.add_file("pass.json", &[b' '; 512]).unwrap();
    let reader = ArchiveReader::from_bytes(writer.finish().unwrap()).unwrap();

    assert_eq!(
        reader.get_entry("icon.png").unwrap().compression,
        CompressionMethod::Stored
    );
    assert_eq!(
        reader.get_entry("pass.json").unwrap().compression,
        CompressionMethod::Deflate
    );
}

#[test]
fn test_duplicate_paths_rejected() {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("a/b.txt", b"1").unwrap();
    assert!(writer.add_file("a\\b.txt", b"2").is_err());
    assert_eq!(writer.entry_count(), 1);
}

#[test]
fn test_corrupted_file_data() {
    let mut data = create_test_archive();

    // Local header (30 bytes) + "test.txt" precede the payload
    let payload = 30 + "test.txt".len();
    data[payload] ^= 0xFF;

    let reader = ArchiveReader::from_bytes(data).unwrap();
    match reader.read_file("test.txt") {
        Err(PassError::CrcMismatch { .. }) | Err(PassError::DecompressionFailed(_)) => {}
        other => panic!("Expected corruption error, got: {:?}", other),
    }
    assert!(reader.read_file("data.bin").is_ok());
}

#[test]
fn test_oversized_declared_length() {
    let mut writer = ArchiveWriter::in_memory();
    writer.add_file("data.bin", &vec![0xAB; 1024]).unwrap();
    let mut data = writer.finish().unwrap();

    // Central directory offset sits 16 bytes into the trailing end record
    let end_record = data.len() - 22;
    let cd_offset =
        u32::from_le_bytes(data[end_record + 16..end_record + 20].try_into().unwrap()) as usize;
    // Uncompressed size sits 24 bytes into the central directory entry
    data[cd_offset + 24..cd_offset + 28].copy_from_slice(&u32::MAX.to_le_bytes());

    let reader = ArchiveReader::from_bytes(data).unwrap();
    assert_eq!(reader.get_entry("data.bin").unwrap().uncompressed_size, u32::MAX);
    assert!(matches!(
        reader.read_file("data.bin"),
        Err(PassError::DecompressionFailed(_))
    ));
}

#[test]
fn test_truncated_archive() {
    let data = create_test_archive();

    for len in [0, 10, data.len() / 2, data.len() - 1] {
        assert!(
            ArchiveReader::from_bytes(data[..len].to_vec()).is_err(),
            "truncation at {} should fail",
            len
        );
    }
}

#[test]
fn test_garbage_input() {
    assert!(ArchiveReader::from_bytes(b"definitely not a zip archive".to_vec()).is_err());
    assert!(ArchiveReader::from_bytes(vec![0u8; 4096]).is_err());
}

#[test]
fn test_missing_file() {
    let reader = ArchiveReader::from_bytes(create_test_archive()).unwrap();
    assert!(matches!(
        reader.read_file("missing.txt"),
        Err(PassError::FileNotFound(_))
    ));
}
