//! Pass manifest support
//!
//! The manifest (`manifest.json`) maps every file of a pass to the SHA-1 hex
//! digest of its content. It covers every file except itself and the
//! `signature`, and is rebuilt from scratch whenever a pass is finalized.
//!
//! # Example
//!
//! ```
//! use pkpass_rs::manifest::Manifest;
//! use std::collections::BTreeMap;
//!
//! let mut files = BTreeMap::new();
//! files.insert("pass.json".to_string(), b"{}".to_vec());
//!
//! let manifest = Manifest::from_files(&files);
//! assert!(manifest.verify(&files).is_ok());
//! ```

use crate::error::{PassError, Result};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// File name of the manifest inside a pass
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// File name of the detached signature inside a pass
pub const SIGNATURE_FILE_NAME: &str = "signature";

/// Whether `path` is regenerated at finalization and never taken from input
pub fn is_reserved(path: &str) -> bool {
    path == MANIFEST_FILE_NAME || path == SIGNATURE_FILE_NAME
}

/// Flat path → hex digest map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: BTreeMap<String, String>,
}

impl Manifest {
    /// Digest every file except the manifest and signature themselves
    pub fn from_files(files: &BTreeMap<String, Vec<u8>>) -> Self {
        let mut manifest = Self::default();
        for (path, data) in files {
            if !is_reserved(path) {
                manifest.add_file(path.clone(), data);
            }
        }
        manifest
    }

    /// Add a file entry to the manifest
    pub fn add_file(&mut self, path: String, data: &[u8]) {
        self.files.insert(path, digest(data));
    }

    /// Digest recorded for `path`
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over `(path, digest)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, d)| (p.as_str(), d.as_str()))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(PassError::from)
    }

    /// Parse from JSON
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(PassError::from)
    }

    /// Check that `files` is exactly the set of files the manifest describes
    pub fn verify(&self, files: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        for (path, data) in files {
            if is_reserved(path) {
                continue;
            }
            match self.files.get(path) {
                Some(expected) if *expected == digest(data) => {}
                Some(_) => {
                    return Err(PassError::InvalidFormat(format!(
                        "Digest mismatch for {}",
                        path
                    )))
                }
                None => {
                    return Err(PassError::InvalidFormat(format!(
                        "File missing from manifest: {}",
                        path
                    )))
                }
            }
        }

        if let Some(missing) = self.files.keys().find(|path| !files.contains_key(*path)) {
            return Err(PassError::FileNotFound(missing.clone()));
        }

        Ok(())
    }
}

/// Lowercase hex SHA-1 of `data`
pub fn digest(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        files.insert("pass.json".to_string(), b"{}".to_vec());
        files.insert("icon.png".to_string(), vec![0x89, 0x50, 0x4E, 0x47]);
        files.insert(MANIFEST_FILE_NAME.to_string(), b"old".to_vec());
        files.insert(SIGNATURE_FILE_NAME.to_string(), b"old".to_vec());
        files
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(digest(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_excludes_reserved_files() {
        let manifest = Manifest::from_files(&files());
        assert_eq!(manifest.len(), 2);
        assert!(manifest.get(MANIFEST_FILE_NAME).is_none());
        assert!(manifest.get(SIGNATURE_FILE_NAME).is_none());
        assert_eq!(manifest.get("pass.json"), Some(digest(b"{}").as_str()));
    }

    #[test]
    fn test_json_is_flat_map() {
        let manifest = Manifest::from_files(&files());
        let json: serde_json::Value = serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();
        assert!(json.is_object());
        assert_eq!(json["pass.json"], digest(b"{}"));

        let parsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut files = files();
        let manifest = Manifest::from_files(&files);
        assert!(manifest.verify(&files).is_ok());

        files.insert("pass.json".to_string(), b"{\"tampered\":true}".to_vec());
        assert!(manifest.verify(&files).is_err());

        let mut extra = self::files();
        extra.insert("logo.png".to_string(), vec![1, 2, 3]);
        assert!(manifest.verify(&extra).is_err());

        let mut missing = self::files();
        missing.remove("icon.png");
        assert!(matches!(
            manifest.verify(&missing),
            Err(PassError::FileNotFound(_))
        ));
    }
}
