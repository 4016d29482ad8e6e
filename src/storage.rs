// src/storage.rs
// Upload intake: validates names and sizes, writes files into the upload dir.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("Only .pdf files are accepted, got {0:?}")]
    UnsupportedType(String),
    #[error("File exceeds the {limit} byte upload limit")]
    TooLarge { limit: u64 },
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// On-disk upload directory. Same filename overwrites; no locking.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Reduces a client-declared name to its final path component.
    pub fn sanitize_filename(declared: &str) -> Result<String, StorageError> {
        // Windows-style paths from browsers on that platform
        let unix = declared.trim().rsplit('\\').next().unwrap_or_default();
        Path::new(unix)
            .file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidFilename(declared.to_string()))
    }

    /// Checks a declared filename for an upload and returns the stored name.
    pub fn validate_upload_name(declared: &str) -> Result<String, StorageError> {
        let name = Self::sanitize_filename(declared)?;
        let is_pdf = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(StorageError::UnsupportedType(name));
        }
        Ok(name)
    }

    pub fn check_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.max_bytes {
            return Err(StorageError::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Path a stored document would live at. The name is sanitized, so this
    /// never points outside the upload dir.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        Ok(self.dir.join(Self::sanitize_filename(filename)?))
    }

    /// Writes the bytes, replacing any file of the same name. Blocking.
    pub fn save(&self, declared: &str, bytes: &[u8]) -> Result<UploadedFile, StorageError> {
        let filename = Self::validate_upload_name(declared)?;
        self.check_size(bytes.len() as u64)?;
        self.ensure_dir()?;

        let path = self.dir.join(&filename);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };
        let mut file = fs::File::create(&path).map_err(write_err)?;
        file.write_all(bytes).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        info!(filename = %filename, size_bytes = bytes.len(), "Stored upload");
        Ok(UploadedFile {
            filename,
            path,
            size_bytes: bytes.len() as u64,
        })
    }
}
