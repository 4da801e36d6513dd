use crate::archive::format::{
    read_u16, read_u32, CompressionMethod, DosDateTime, MAX_PATH_LENGTH, VERSION_NEEDED,
};
use crate::error::{PassError, Result};
use std::io::{Read, Write};

/// Local file header signature ("PK\x03\x04")
pub const LOCAL_ENTRY_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Fixed part of a local file header in bytes
pub const LOCAL_ENTRY_SIZE: usize = 30;

/// Local File Header
///
/// Precedes each file's compressed data in the archive, enabling sequential
/// streaming reads without consulting the central directory.
///
/// Structure (30 bytes + path + extra):
/// - Signature: "PK\x03\x04" (4 bytes)
/// - Version needed: uint16
/// - Flags: uint16
/// - Compression Method: uint16
/// - Modified time / date: 2 x uint16 (MS-DOS)
/// - CRC32: uint32
/// - Compressed Size: uint32
/// - Uncompressed Size: uint32
/// - Path Length: uint16
/// - Extra Length: uint16
/// - File Path: variable (UTF-8, not terminated)
#[derive(Debug, Clone)]
pub struct LocalEntryHeader {
    pub flags: u16,
    pub compression: CompressionMethod,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub path: String,
    /// Length of the extra field, only meaningful when read back
    pub extra_len: u16,
}

impl LocalEntryHeader {
    /// Create a new local entry header
    pub fn new(
        uncompressed_size: u32,
        compressed_size: u32,
        crc32: u32,
        modified: DosDateTime,
        compression: CompressionMethod,
        flags: u16,
        path: String,
    ) -> Self {
        Self {
            flags,
            compression,
            modified,
            crc32,
            compressed_size,
            uncompressed_size,
            path,
            extra_len: 0,
        }
    }

    /// Size of this header on disk
    pub fn encoded_len(&self) -> usize {
        LOCAL_ENTRY_SIZE + self.path.len() + self.extra_len as usize
    }

    /// Write local entry header to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        let path_bytes = self.path.as_bytes();
        if path_bytes.len() > MAX_PATH_LENGTH {
            return Err(PassError::PathError(format!(
                "Path too long: {} bytes (max {})",
                path_bytes.len(),
                MAX_PATH_LENGTH
            )));
        }

        writer.write_all(&LOCAL_ENTRY_SIGNATURE)?;
        writer.write_all(&VERSION_NEEDED.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&(self.compression as u16).to_le_bytes())?;
        writer.write_all(&self.modified.time.to_le_bytes())?;
        writer.write_all(&self.modified.date.to_le_bytes())?;
        writer.write_all(&self.crc32.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        writer.write_all(&self.uncompressed_size.to_le_bytes())?;
        writer.write_all(&(path_bytes.len() as u16).to_le_bytes())?;
        // No extra field
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(path_bytes)?;

        Ok(LOCAL_ENTRY_SIZE + path_bytes.len())
    }

    /// Read local entry header from a reader
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut sig = [0u8; 4];
        reader.read_exact(&mut sig)?;
        if sig != LOCAL_ENTRY_SIGNATURE {
            return Err(PassError::InvalidFormat(
                "Invalid local entry signature".to_string(),
            ));
        }

        let _version_needed = read_u16(&mut reader)?;
        let flags = read_u16(&mut reader)?;
        let compression = CompressionMethod::from_u16(read_u16(&mut reader)?)?;
        let time = read_u16(&mut reader)?;
        let date = read_u16(&mut reader)?;
        let crc32 = read_u32(&mut reader)?;
        let compressed_size = read_u32(&mut reader)?;
        let uncompressed_size = read_u32(&mut reader)?;
        let path_len = read_u16(&mut reader)? as usize;
        let extra_len = read_u16(&mut reader)?;

        let mut path_bytes = vec![0u8; path_len];
        reader.read_exact(&mut path_bytes)?;
        let path = String::from_utf8(path_bytes)
            .map_err(|_| PassError::InvalidFormat("Invalid UTF-8 in entry path".to_string()))?;

        let mut extra = vec![0u8; extra_len as usize];
        reader.read_exact(&mut extra)?;

        Ok(Self {
            flags,
            compression,
            modified: DosDateTime { time, date },
            crc32,
            compressed_size,
            uncompressed_size,
            path,
            extra_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::FLAG_UTF8;

    #[test]
    fn test_local_entry_roundtrip() {
        let header = LocalEntryHeader::new(
            1000,
            500,
            0x12345678,
            DosDateTime::EPOCH,
            CompressionMethod::Deflate,
            FLAG_UTF8,
            "pass.json".to_string(),
        );

        let mut buf = Vec::new();
        let written = header.write_to(&mut buf).unwrap();
        assert_eq!(written, LOCAL_ENTRY_SIZE + 9);
        assert_eq!(written, buf.len());
        assert_eq!(&buf[..4], b"PK\x03\x04");

        let parsed = LocalEntryHeader::read_from(&buf[..]).unwrap();
        assert_eq!(parsed.uncompressed_size, 1000);
        assert_eq!(parsed.compressed_size, 500);
        assert_eq!(parsed.crc32, 0x12345678);
        assert_eq!(parsed.compression, CompressionMethod::Deflate);
        assert_eq!(parsed.path, "pass.json");
        assert_eq!(parsed.encoded_len(), written);
    }

    #[test]
    fn test_invalid_signature() {
        let buf = vec![0u8; 64];
        assert!(LocalEntryHeader::read_from(&buf[..]).is_err());
    }
}
