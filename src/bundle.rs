//! In-memory archive container
//!
//! A [`Bundle`] accumulates named byte buffers until it is frozen. Freezing
//! serializes the buffers into a ZIP archive exactly once; every export after
//! that returns a view of the same frozen state.

use crate::archive::{normalize_path, ArchiveWriter};
use crate::error::{PassError, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use tracing::debug;

/// Mime type of a single signed pass
pub const PASS_MIME_TYPE: &str = "application/vnd.apple.pkpass";

/// Mime type of a bundle of several signed passes
pub const PASSES_MIME_TYPE: &str = "application/vnd.apple.pkpasses";

/// Freeze-once collection of files exported as a ZIP archive
#[derive(Debug, Clone)]
pub struct Bundle {
    mime_type: String,
    files: BTreeMap<String, Vec<u8>>,
    archive: Option<Vec<u8>>,
}

impl Bundle {
    /// Create an empty bundle for the given mime type
    pub fn new(mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            return Err(PassError::MissingMimeType);
        }

        Ok(Self {
            mime_type,
            files: BTreeMap::new(),
            archive: None,
        })
    }

    /// Mime type the exported archive should be served with
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the bundle accepts no more files
    pub fn is_frozen(&self) -> bool {
        self.archive.is_some()
    }

    /// Files currently held by the bundle
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// Store a buffer under `path`, replacing any previous content
    ///
    /// Empty buffers are ignored.
    pub fn add_buffer(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        self.ensure_unfrozen("add a buffer")?;

        let data = data.into();
        if data.is_empty() {
            debug!("Skipping empty buffer for {}", path);
            return Ok(());
        }

        self.files.insert(normalize_path(path), data);
        Ok(())
    }

    /// Fail with [`PassError::Closed`] if the bundle is frozen
    pub(crate) fn ensure_unfrozen(&self, operation: &'static str) -> Result<()> {
        if self.is_frozen() {
            return Err(PassError::Closed(operation));
        }
        Ok(())
    }

    /// Remove every file matching `predicate`, returning the removed paths
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .files
            .keys()
            .filter(|path| predicate(path.as_str()))
            .cloned()
            .collect();

        for path in &doomed {
            self.files.remove(path);
        }

        doomed
    }

    /// Freeze the bundle, serializing its files into the archive
    ///
    /// Calling this on a frozen bundle does nothing.
    pub fn freeze(&mut self) -> Result<()> {
        if self.is_frozen() {
            return Ok(());
        }

        let mut writer = ArchiveWriter::in_memory();
        for (path, data) in &self.files {
            writer.add_file(path, data)?;
        }
        let archive = writer.finish()?;

        debug!(
            "Froze {} bundle: {} files, {} bytes",
            self.mime_type,
            self.files.len(),
            archive.len()
        );
        self.archive = Some(archive);
        Ok(())
    }

    /// Freeze and return the archive bytes
    pub fn export_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.frozen_archive()?.to_vec())
    }

    /// Freeze and return a reader over the archive bytes
    pub fn export_stream(&mut self) -> Result<impl Read> {
        Ok(Cursor::new(self.export_bytes()?))
    }

    /// Freeze and return a copy of the raw path → bytes map
    pub fn export_raw(&mut self) -> Result<BTreeMap<String, Vec<u8>>> {
        self.freeze()?;
        Ok(self.files.clone())
    }

    /// Freeze and write the archive to `writer`
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        writer.write_all(self.frozen_archive()?)?;
        writer.flush()?;
        Ok(())
    }

    fn frozen_archive(&mut self) -> Result<&[u8]> {
        self.freeze()?;
        self.archive
            .as_deref()
            .ok_or_else(|| PassError::InvalidFormat("Archive missing after freeze".to_string()))
    }
}
