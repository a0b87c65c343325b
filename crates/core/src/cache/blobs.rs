//! Blob directory for document content.
//!
//! Files are named by a random UUID, never by URL or content hash, so the
//! store knows nothing about what it holds. All operations are blocking and
//! run on the index connection thread.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::FILES_DIR_NAME;
use crate::Error;

/// Attempts at finding an unused file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 8;

fn random_name() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A directory of opaque byte payloads.
#[derive(Debug, Clone)]
pub struct BlobStore {
    file_dir: PathBuf,
    name_source: fn() -> String,
}

impl PartialEq for BlobStore {
    fn eq(&self, other: &Self) -> bool {
        self.file_dir == other.file_dir
    }
}

impl Eq for BlobStore {}

impl BlobStore {
    /// Create `root_dir` and its `files` subdirectory if missing.
    pub fn ensure_ready(root_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let file_dir = root_dir.as_ref().join(FILES_DIR_NAME);

        if file_dir.exists() && !file_dir.is_dir() {
            return Err(Error::storage(
                &file_dir,
                std::io::Error::new(ErrorKind::AlreadyExists, "blob path exists and is not a directory"),
            ));
        }

        fs::create_dir_all(&file_dir).map_err(|e| Error::storage(&file_dir, e))?;

        Ok(Self { file_dir, name_source: random_name })
    }

    #[cfg(test)]
    fn with_name_source(mut self, name_source: fn() -> String) -> Self {
        self.name_source = name_source;
        self
    }

    pub fn file_dir(&self) -> &Path {
        &self.file_dir
    }

    /// Produce a path inside the blob directory that no file occupies yet.
    pub fn generate_path(&self) -> Result<PathBuf, Error> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let path = self.file_dir.join((self.name_source)());
            if !path.exists() {
                return Ok(path);
            }
            tracing::warn!(path = %path.display(), attempt, "generated blob name already in use");
        }

        Err(Error::BlobNameExhausted { attempts: MAX_NAME_ATTEMPTS })
    }

    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        fs::write(path, bytes).map_err(|e| Error::storage(path, e))
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        fs::read(path).map_err(|e| Error::storage(path, e))
    }

    /// Remove a file; a file that is already gone is not an error.
    pub fn delete(&self, path: &Path) -> Result<(), Error> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(path, e)),
        }
    }

    /// Number of files currently in the blob directory.
    pub fn file_count(&self) -> Result<usize, Error> {
        let entries = fs::read_dir(&self.file_dir).map_err(|e| Error::storage(&self.file_dir, e))?;
        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| Error::storage(&self.file_dir, e))?;
            if entry.path().is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}
