use crate::error::{PassError, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{Read, Write};

/// Central directory file header signature ("PK\x01\x02")
pub const CENTRAL_ENTRY_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];

/// Version needed to extract: 2.0 (deflate)
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: 2.0, MS-DOS attribute compatibility
pub const VERSION_MADE_BY: u16 = 20;

/// General purpose flag bit 11: file names are UTF-8
pub const FLAG_UTF8: u16 = 1 << 11;

/// Fixed part of a central directory entry in bytes
pub const CD_ENTRY_SIZE: usize = 46;

/// Maximum path length in bytes (UTF-8)
pub const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// Compression methods supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionMethod {
    Stored = 0,
    Deflate = 8,
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Result<Self> {
        match value {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflate),
            _ => Err(PassError::InvalidFormat(format!(
                "Unsupported compression method: {}",
                value
            ))),
        }
    }

    /// Choose compression based on file type and size
    pub fn choose_for_file(path: &str, size: usize) -> Self {
        if size == 0 {
            return Self::Stored;
        }

        let extension = path.rsplit('.').next().unwrap_or("").to_lowercase();

        match extension.as_str() {
            // Already compressed formats
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "zip" | "gz" | "pkpass" => Self::Stored,
            _ => Self::Deflate,
        }
    }
}

/// MS-DOS date and time as stored in ZIP headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// Earliest representable timestamp (1980-01-01 00:00:00)
    pub const EPOCH: Self = Self {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// Convert a calendar timestamp, clamping to the DOS range (1980..=2107)
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let year = dt.year();
        if year < 1980 {
            return Self::EPOCH;
        }
        let year = year.min(2107) as u16;

        let time =
            ((dt.hour() as u16) << 11) | ((dt.minute() as u16) << 5) | (dt.second() as u16 / 2);
        let date = ((year - 1980) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;

        Self { time, date }
    }

    /// Timestamp for the current wall-clock time (UTC)
    pub fn now() -> Self {
        Self::from_datetime(chrono::Utc::now().naive_utc())
    }
}

/// Central Directory entry metadata
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub path: String,
    /// Offset of the entry's local header from the start of the archive
    pub local_header_offset: u32,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub crc32: u32,
    pub modified: DosDateTime,
    pub compression: CompressionMethod,
    pub flags: u16,
}

impl EntryInfo {
    /// Write entry to central directory, returning bytes written
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        let path_bytes = self.path.as_bytes();
        if path_bytes.len() > MAX_PATH_LENGTH {
            return Err(PassError::PathError(format!(
                "Path too long: {} bytes (max {})",
                path_bytes.len(),
                MAX_PATH_LENGTH
            )));
        }

        writer.write_all(&CENTRAL_ENTRY_SIGNATURE)?;
        writer.write_all(&VERSION_MADE_BY.to_le_bytes())?;
        writer.write_all(&VERSION_NEEDED.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&(self.compression as u16).to_le_bytes())?;
        writer.write_all(&self.modified.time.to_le_bytes())?;
        writer.write_all(&self.modified.date.to_le_bytes())?;
        writer.write_all(&self.crc32.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        writer.write_all(&self.uncompressed_size.to_le_bytes())?;
        writer.write_all(&(path_bytes.len() as u16).to_le_bytes())?;
        // Extra field length, comment length, disk number start
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;
        // Internal and external attributes
        writer.write_all(&0u16.to_le_bytes())?;
        writer.write_all(&0u32.to_le_bytes())?;
        writer.write_all(&self.local_header_offset.to_le_bytes())?;
        writer.write_all(path_bytes)?;

        Ok(CD_ENTRY_SIZE + path_bytes.len())
    }

    /// Read entry from central directory
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut sig = [0u8; 4];
        reader.read_exact(&mut sig)?;
        if sig != CENTRAL_ENTRY_SIGNATURE {
            return Err(PassError::InvalidFormat(
                "Invalid central directory entry signature".to_string(),
            ));
        }

        let _version_made_by = read_u16(&mut reader)?;
        let _version_needed = read_u16(&mut reader)?;
        let flags = read_u16(&mut reader)?;
        let compression = CompressionMethod::from_u16(read_u16(&mut reader)?)?;
        let time = read_u16(&mut reader)?;
        let date = read_u16(&mut reader)?;
        let crc32 = read_u32(&mut reader)?;
        let compressed_size = read_u32(&mut reader)?;
        let uncompressed_size = read_u32(&mut reader)?;
        let path_len = read_u16(&mut reader)? as usize;
        let extra_len = read_u16(&mut reader)? as usize;
        let comment_len = read_u16(&mut reader)? as usize;
        let _disk_start = read_u16(&mut reader)?;
        let _internal_attrs = read_u16(&mut reader)?;
        let _external_attrs = read_u32(&mut reader)?;
        let local_header_offset = read_u32(&mut reader)?;

        let mut path_bytes = vec![0u8; path_len];
        reader.read_exact(&mut path_bytes)?;
        let path = String::from_utf8(path_bytes)
            .map_err(|_| PassError::InvalidFormat("Invalid UTF-8 in entry path".to_string()))?;

        // Skip extra field and comment
        let mut skip = vec![0u8; extra_len + comment_len];
        reader.read_exact(&mut skip)?;

        Ok(Self {
            path,
            local_header_offset,
            uncompressed_size,
            compressed_size,
            crc32,
            modified: DosDateTime { time, date },
            compression,
            flags,
        })
    }
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
