use crate::archive::format::{read_u16, read_u32};
use crate::error::{PassError, Result};
use std::io::{Read, Write};

/// End of central directory signature ("PK\x05\x06")
pub const END_RECORD_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

/// End record size in bytes (without trailing comment)
pub const END_RECORD_SIZE: usize = 22;

/// End of Central Directory Record
///
/// Located at the end of the archive, optionally followed by a comment of up
/// to 64 KiB. Readers locate the central directory through it without
/// scanning from the beginning.
///
/// Structure (22 bytes + comment):
/// - Signature: "PK\x05\x06" (4 bytes)
/// - Disk number / disk with central directory: 2 x uint16
/// - Entries on this disk / total entries: 2 x uint16
/// - Central Directory Size: uint32
/// - Central Directory Offset: uint32
/// - Comment Length: uint16
#[derive(Debug, Clone)]
pub struct EndRecord {
    pub entry_count: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
}

impl EndRecord {
    /// Create a new end record
    pub fn new(entry_count: u16, central_directory_size: u32, central_directory_offset: u32) -> Self {
        Self {
            entry_count,
            central_directory_size,
            central_directory_offset,
        }
    }

    /// Write end record to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        writer.write_all(&END_RECORD_SIGNATURE)?;
        // Single-disk archive
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.central_directory_size.to_le_bytes())?;
        writer.write_all(&self.central_directory_offset.to_le_bytes())?;
        // No comment
        writer.write_all(&0u16.to_le_bytes())?;

        Ok(END_RECORD_SIZE)
    }

    /// Read end record from a reader positioned at its signature
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut sig = [0u8; 4];
        reader.read_exact(&mut sig)?;
        if sig != END_RECORD_SIGNATURE {
            return Err(PassError::InvalidFormat(
                "Invalid end record signature".to_string(),
            ));
        }

        let disk = read_u16(&mut reader)?;
        let cd_disk = read_u16(&mut reader)?;
        let entries_on_disk = read_u16(&mut reader)?;
        let entry_count = read_u16(&mut reader)?;
        if disk != 0 || cd_disk != 0 || entries_on_disk != entry_count {
            return Err(PassError::InvalidFormat(
                "Multi-disk archives are not supported".to_string(),
            ));
        }

        let central_directory_size = read_u32(&mut reader)?;
        let central_directory_offset = read_u32(&mut reader)?;
        let _comment_len = read_u16(&mut reader)?;

        Ok(Self {
            entry_count,
            central_directory_size,
            central_directory_offset,
        })
    }

    /// Find the end record by scanning backwards from the end of the archive
    pub fn locate(data: &[u8]) -> Result<Self> {
        if data.len() < END_RECORD_SIZE {
            return Err(PassError::InvalidFormat(format!(
                "Archive too small: {} bytes",
                data.len()
            )));
        }

        let lowest = data.len().saturating_sub(END_RECORD_SIZE + u16::MAX as usize);
        let mut pos = data.len() - END_RECORD_SIZE;
        loop {
            if data[pos..pos + 4] == END_RECORD_SIGNATURE {
                return Self::read_from(&data[pos..]);
            }
            if pos == lowest {
                break;
            }
            pos -= 1;
        }

        Err(PassError::InvalidFormat(
            "End of central directory record not found".to_string(),
        ))
    }

    /// Validate that the central directory lies within the archive
    pub fn validate(&self, archive_len: usize) -> Result<()> {
        let end = self.central_directory_offset as u64 + self.central_directory_size as u64;
        if end > archive_len as u64 {
            return Err(PassError::InvalidFormat(format!(
                "Central directory out of bounds: ends at {}, archive is {} bytes",
                end, archive_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_record_roundtrip() {
        let record = EndRecord::new(3, 150, 4096);

        let mut buf = Vec::new();
        let written = record.write_to(&mut buf).unwrap();
        assert_eq!(written, END_RECORD_SIZE);
        assert_eq!(buf.len(), END_RECORD_SIZE);

        let parsed = EndRecord::read_from(&buf[..]).unwrap();
        assert_eq!(parsed.entry_count, 3);
        assert_eq!(parsed.central_directory_size, 150);
        assert_eq!(parsed.central_directory_offset, 4096);
    }

    #[test]
    fn test_locate_behind_payload() {
        let mut buf = vec![0xAAu8; 300];
        EndRecord::new(1, 10, 200).write_to(&mut buf).unwrap();

        let located = EndRecord::locate(&buf).unwrap();
        assert_eq!(located.entry_count, 1);
        assert_eq!(located.central_directory_offset, 200);
        assert!(located.validate(buf.len()).is_ok());
        assert!(located.validate(205).is_err());
    }

    #[test]
    fn test_locate_missing() {
        let buf = vec![0u8; 100];
        assert!(EndRecord::locate(&buf).is_err());
        assert!(EndRecord::locate(&buf[..10]).is_err());
    }
}
