//! On-disk document file with self-healing load and atomic save

use super::document::Document;
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for shared::AppError {
    fn from(err: StoreError) -> Self {
        shared::AppError::store(err.to_string())
    }
}

/// The document file on disk
///
/// # Durability
///
/// `save` writes the full document to `<path>.tmp` and renames it over
/// the live file, so a crash mid-write leaves either the old or the new
/// document, never a torn one.
///
/// # Self-healing
///
/// `load` never fails on bad content: an unparseable file is copied to
/// `<path>.corrupt.<timestamp>.bak` and a fresh empty document is seeded
/// in its place. The quarantine is logged so operators can recover data
/// from the backup.
#[derive(Debug)]
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_document(&self, doc: &Document) -> StoreResult<()> {
        self.ensure_parent_dir()?;
        let json = serde_json::to_string_pretty(doc)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load the document, seeding or self-healing as needed
    pub fn load(&self) -> StoreResult<Document> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let seed = Document::seed();
                self.write_document(&seed)?;
                return Ok(seed);
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(doc),
            Err(err) => {
                // Corrupt content (e.g. abrupt shutdown mid-write on an old
                // deployment): quarantine the file and reseed.
                let stamp = Utc::now()
                    .format("%Y-%m-%dT%H-%M-%S%.3f")
                    .to_string();
                let backup = self
                    .path
                    .with_extension(format!("json.corrupt.{}.bak", stamp));
                if let Err(copy_err) = fs::copy(&self.path, &backup) {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %copy_err,
                        "Failed to back up corrupt store file"
                    );
                } else {
                    tracing::warn!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        error = %err,
                        "Store file was corrupt; quarantined and reseeded"
                    );
                }
                let seed = Document::seed();
                self.write_document(&seed)?;
                Ok(seed)
            }
        }
    }

    /// Atomically persist the whole document
    pub fn save(&self, doc: &Document) -> StoreResult<()> {
        self.write_document(doc)
    }
}
