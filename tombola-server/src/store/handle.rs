//! Mutex-guarded store handle and transactions

use super::document::Document;
use super::file::{DocumentFile, StoreResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Clonable handle to the document store
///
/// All writers funnel through one async mutex, making the engine's
/// single-writer assumption explicit: while a [`StoreTxn`] is alive no
/// other task can load or save the document through this handle.
#[derive(Clone)]
pub struct Store {
    file: Arc<DocumentFile>,
    lock: Arc<Mutex<()>>,
}

impl Store {
    /// Open a store at the given path
    ///
    /// The file is created (or self-healed) lazily on first access.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            file: Arc::new(DocumentFile::new(path.as_ref().to_path_buf())),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Begin a read-modify-write transaction
    ///
    /// Loads the current document under the writer lock. Mutations are
    /// discarded unless [`StoreTxn::commit`] is called.
    pub async fn begin(&self) -> StoreResult<StoreTxn> {
        let guard = self.lock.clone().lock_owned().await;
        let doc = self.file.load()?;
        Ok(StoreTxn {
            _guard: guard,
            file: self.file.clone(),
            doc,
        })
    }

    /// Read-only copy of the current document
    pub async fn snapshot(&self) -> StoreResult<Document> {
        let _guard = self.lock.lock().await;
        self.file.load()
    }
}

/// An in-flight read-modify-write transaction
///
/// Owns the writer lock and an in-memory copy of the document. Dropping
/// the transaction without committing discards every mutation.
pub struct StoreTxn {
    _guard: OwnedMutexGuard<()>,
    file: Arc<DocumentFile>,
    doc: Document,
}

impl StoreTxn {
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Atomically persist the whole mutated document
    pub fn commit(self) -> StoreResult<()> {
        self.file.save(&self.doc)
    }
}
