use crate::archive::end_record::EndRecord;
use crate::archive::format::{CompressionMethod, EntryInfo};
use crate::archive::local_entry::LocalEntryHeader;
use crate::archive::writer::normalize_path;
use crate::error::{PassError, Result};
use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::io::Read;

/// Upper bound on the inflate buffer preallocation, as a multiple of the compressed size
const MAX_PREALLOC_RATIO: usize = 4;

/// In-memory ZIP archive reader with O(1) file lookup
pub struct ArchiveReader {
    data: Vec<u8>,
    entries: HashMap<String, EntryInfo>,
    entry_list: Vec<String>,
}

impl ArchiveReader {
    /// Parse an archive held in memory
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();

        let end_record = EndRecord::locate(&data)?;
        end_record.validate(data.len())?;

        let start = end_record.central_directory_offset as usize;
        let end = start + end_record.central_directory_size as usize;
        let mut cursor = &data[start..end];

        let mut entries = HashMap::with_capacity(end_record.entry_count as usize);
        let mut entry_list = Vec::with_capacity(end_record.entry_count as usize);

        for _ in 0..end_record.entry_count {
            let entry = EntryInfo::read_from(&mut cursor)?;
            entry_list.push(entry.path.clone());
            entries.insert(entry.path.clone(), entry);
        }

        Ok(Self {
            data,
            entries,
            entry_list,
        })
    }

    /// Get number of entries in archive
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// List all file paths in the archive, in central directory order
    pub fn list_files(&self) -> &[String] {
        &self.entry_list
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    /// Get entry information without reading data
    pub fn get_entry(&self, path: &str) -> Option<&EntryInfo> {
        self.entries.get(&normalize_path(path))
    }

    /// Read a file from the archive
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .get_entry(path)
            .ok_or_else(|| PassError::FileNotFound(path.to_string()))?;

        let header_start = entry.local_header_offset as usize;
        if header_start >= self.data.len() {
            return Err(PassError::InvalidFormat(format!(
                "Local header offset out of bounds for {}",
                entry.path
            )));
        }
        let local_header = LocalEntryHeader::read_from(&self.data[header_start..])?;

        let data_start = header_start + local_header.encoded_len();
        let data_end = data_start + entry.compressed_size as usize;
        if data_end > self.data.len() {
            return Err(PassError::InvalidFormat(format!(
                "Entry data out of bounds for {}",
                entry.path
            )));
        }
        let raw = &self.data[data_start..data_end];

        let decompressed = match entry.compression {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => Self::decompress_deflate(raw, entry)?,
        };

        let computed_crc = crc32fast::hash(&decompressed);
        if computed_crc != entry.crc32 {
            return Err(PassError::CrcMismatch {
                expected: entry.crc32,
                actual: computed_crc,
            });
        }

        Ok(decompressed)
    }

    /// Read every entry into a path → bytes map
    pub fn read_all(&self) -> Result<HashMap<String, Vec<u8>>> {
        self.entry_list
            .iter()
            .map(|path| Ok((path.clone(), self.read_file(path)?)))
            .collect()
    }

    /// Extract all entries with a given prefix
    pub fn list_prefix(&self, prefix: &str) -> Vec<&String> {
        self.entry_list
            .iter()
            .filter(|path| path.starts_with(prefix))
            .collect()
    }

    /// Decompress a raw deflate stream, bounded by the declared size
    fn decompress_deflate(data: &[u8], entry: &EntryInfo) -> Result<Vec<u8>> {
        let expected = entry.uncompressed_size as usize;
        // Declared size comes from the archive, so preallocation is capped
        let capacity = expected.min(data.len().saturating_mul(MAX_PREALLOC_RATIO));
        let mut out = Vec::with_capacity(capacity);
        DeflateDecoder::new(data)
            .take(expected as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| {
                PassError::DecompressionFailed(format!("Inflate failed for {}: {}", entry.path, e))
            })?;

        if out.len() != expected {
            return Err(PassError::DecompressionFailed(format!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.path,
                expected,
                out.len()
            )));
        }

        Ok(out)
    }
}
