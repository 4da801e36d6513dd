//! Template model loading
//!
//! A model is a directory (conventionally named `*.pass`) holding
//! `pass.json`, images and `<lang>.lproj` folders. Loading flattens it into
//! a relative path → bytes map suitable for [`crate::Pass::new`].

use crate::certificates::CertificateMaterial;
use crate::error::{PassError, Result};
use crate::manifest::is_reserved;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// A model directory plus the certificates passes built from it are signed with
#[derive(Debug, Clone)]
pub struct Template {
    pub model: PathBuf,
    pub certificates: Option<CertificateMaterial>,
}

impl Template {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            certificates: None,
        }
    }

    pub fn with_certificates(mut self, certificates: CertificateMaterial) -> Self {
        self.certificates = Some(certificates);
        self
    }
}

/// Read every non-hidden file under `model`, keyed by forward-slash relative path
///
/// `manifest.json` and `signature` at the model root are skipped, since both
/// are regenerated for every pass.
pub fn load_model<P: AsRef<Path>>(model: P) -> Result<BTreeMap<String, Vec<u8>>> {
    let model = model.as_ref();
    if !model.is_dir() {
        return Err(PassError::ModelNotFound(model.to_path_buf()));
    }

    let mut files = BTreeMap::new();

    let walker = WalkDir::new(model)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| {
            PassError::InvalidModel(format!("cannot read {}: {}", model.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(model).map_err(|e| {
            PassError::InvalidModel(format!("{}: {}", entry.path().display(), e))
        })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if is_reserved(&name) {
            debug!("Skipping {} from model", name);
            continue;
        }

        let data = std::fs::read(entry.path()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PassError::ModelNotFound(entry.path().to_path_buf())
            } else {
                PassError::Io(e)
            }
        })?;
        files.insert(name, data);
    }

    debug!("Loaded {} files from model {}", files.len(), model.display());
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
