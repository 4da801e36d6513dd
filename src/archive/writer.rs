use crate::archive::end_record::EndRecord;
use crate::archive::format::{CompressionMethod, DosDateTime, EntryInfo, FLAG_UTF8};
use crate::archive::local_entry::LocalEntryHeader;
use crate::error::{PassError, Result};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

/// Normalize path to forward slashes (cross-platform compatibility)
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// ZIP archive writer
///
/// Entries are written sequentially (local header followed by data); the
/// central directory and end record are appended by [`ArchiveWriter::finish`].
pub struct ArchiveWriter<W: Write> {
    writer: W,
    entries: Vec<EntryInfo>,
    current_offset: u64,
    compression: Option<CompressionMethod>,
    modified: DosDateTime,
}

impl ArchiveWriter<Vec<u8>> {
    /// Create a writer that accumulates the archive in memory
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }
}

impl<W: Write> ArchiveWriter<W> {
    /// Create a new archive writer over any byte sink
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            entries: Vec::new(),
            current_offset: 0,
            compression: None,
            modified: DosDateTime::now(),
        }
    }

    /// Force a compression method for every entry instead of choosing per file
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Stamp every entry with a fixed modification time
    pub fn with_modified_time(mut self, modified: DosDateTime) -> Self {
        self.modified = modified;
        self
    }

    /// Number of entries written so far
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Add a file to the archive with automatic compression selection
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let compression = self
            .compression
            .unwrap_or_else(|| CompressionMethod::choose_for_file(path, data.len()));
        self.add_file_with_compression(path, data, compression)
    }

    /// Add a file with specific compression method
    pub fn add_file_with_compression(
        &mut self,
        path: &str,
        data: &[u8],
        compression: CompressionMethod,
    ) -> Result<()> {
        let normalized_path = normalize_path(path);

        if self.entries.iter().any(|e| e.path == normalized_path) {
            return Err(PassError::PathError(format!(
                "Duplicate archive entry: {}",
                normalized_path
            )));
        }

        let (payload, actual_compression) = Self::compress_data(data, compression)?;

        let uncompressed_size = to_u32(data.len() as u64, "entry size")?;
        let compressed_size = to_u32(payload.len() as u64, "compressed entry size")?;
        let local_header_offset = to_u32(self.current_offset, "entry offset")?;
        let crc32 = crc32fast::hash(data);

        let local_header = LocalEntryHeader::new(
            uncompressed_size,
            compressed_size,
            crc32,
            self.modified,
            actual_compression,
            FLAG_UTF8,
            normalized_path.clone(),
        );

        let header_bytes_written = local_header.write_to(&mut self.writer)?;
        self.current_offset += header_bytes_written as u64;

        self.writer.write_all(&payload)?;
        self.current_offset += payload.len() as u64;

        self.entries.push(EntryInfo {
            path: normalized_path,
            local_header_offset,
            uncompressed_size,
            compressed_size,
            crc32,
            modified: self.modified,
            compression: actual_compression,
            flags: FLAG_UTF8,
        });

        Ok(())
    }

    /// Write central directory and end record, returning the inner sink
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = self.current_offset;

        for entry in &self.entries {
            let written = entry.write_to(&mut self.writer)?;
            self.current_offset += written as u64;
        }

        let cd_size = self.current_offset - cd_offset;
        let entry_count = u16::try_from(self.entries.len()).map_err(|_| {
            PassError::InvalidFormat(format!(
                "Too many archive entries: {} (max {})",
                self.entries.len(),
                u16::MAX
            ))
        })?;

        let end_record = EndRecord::new(
            entry_count,
            to_u32(cd_size, "central directory size")?,
            to_u32(cd_offset, "central directory offset")?,
        );
        end_record.write_to(&mut self.writer)?;

        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Compress data with fallback to stored if not beneficial
    fn compress_data(
        data: &[u8],
        compression: CompressionMethod,
    ) -> Result<(Vec<u8>, CompressionMethod)> {
        let compressed = match compression {
            CompressionMethod::Stored => return Ok((data.to_vec(), CompressionMethod::Stored)),
            CompressionMethod::Deflate => Self::compress_deflate(data)?,
        };

        if compressed.len() < data.len() {
            Ok((compressed, compression))
        } else {
            Ok((data.to_vec(), CompressionMethod::Stored))
        }
    }

    /// Raw deflate stream, as ZIP method 8 expects (no zlib header)
    fn compress_deflate(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| PassError::CompressionFailed(format!("Deflate failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| PassError::CompressionFailed(format!("Deflate failed: {}", e)))
    }
}

/// ZIP without ZIP64 extensions caps sizes and offsets at 4 GiB
fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        PassError::InvalidFormat(format!("{} exceeds 4 GiB limit: {}", what, value))
    })
}
