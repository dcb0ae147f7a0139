//! Durable license catalog backed by a single JSON document.
//!
//! Every read and write goes through [`RecordStore::transaction`], which
//! holds an exclusive lock across load, mutate, and persist. Commits are
//! atomic: the new document is written to a temporary file in the same
//! directory, flushed, then renamed over the old one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LicenseError, LicenseResult};
use crate::record::Catalog;

/// Race-safe key/value store for license records.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RecordStore {
    /// Opens a store at `path`. The file is created on first commit.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the catalog file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads a snapshot of the catalog under the store lock.
    pub fn load(&self) -> LicenseResult<Catalog> {
        self.transaction(|catalog| catalog.clone())
    }

    /// Runs `f` as one exclusive load, mutate, persist cycle.
    ///
    /// The catalog is only rewritten if `f` changed it. Domain outcomes
    /// belong in `T`; the outer error is reserved for storage failures, so
    /// an operation may both mutate the catalog and report a rejection.
    pub fn transaction<T, F>(&self, f: F) -> LicenseResult<T>
    where
        F: FnOnce(&mut Catalog) -> T,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LicenseError::Storage("record store lock poisoned".to_string()))?;

        let original = self.read_catalog()?;
        let mut catalog = original.clone();
        let output = f(&mut catalog);

        if catalog != original {
            self.write_catalog(&catalog)?;
            debug!(records = catalog.len(), "catalog committed");
        }
        Ok(output)
    }

    fn read_catalog(&self) -> LicenseResult<Catalog> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Catalog::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Catalog::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_catalog(&self, catalog: &Catalog) -> LicenseResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, catalog)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| LicenseError::Storage(format!("failed to replace catalog: {}", e.error)))?;
        Ok(())
    }
}
