use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::repository::{LibraryRecord, ProgressRepository, Storage, StorageError, has_content};

/// Progress stored as a single pretty-printed JSON document.
///
/// Writes go to a temporary file next to the target which is then renamed
/// over it, so the document on disk is always either the old or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable document is copied before it gets overwritten.
    #[must_use]
    pub fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "library.json".into());
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<LibraryRecord, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no progress file yet");
                return Ok(LibraryRecord::default());
            }
            Err(err) => return Err(io_error(&self.path, &err)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(LibraryRecord::default());
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| StorageError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    fn copy_aside(&self) -> Result<Option<PathBuf>, StorageError> {
        if !has_content(&self.path) {
            return Ok(None);
        }
        let backup = self.corrupt_backup_path();
        fs::copy(&self.path, &backup).map_err(|err| io_error(&backup, &err))?;
        tracing::warn!(backup = %backup.display(), "copied progress file aside");
        Ok(Some(backup))
    }

    fn write(&self, record: &LibraryRecord) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| io_error(&dir, &err))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".library-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|err| io_error(&dir, &err))?;

        serde_json::to_writer_pretty(&mut tmp, record)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        finish(&mut tmp).map_err(|err| io_error(tmp.path(), &err))?;

        tmp.persist(&self.path)
            .map_err(|err| io_error(&self.path, &err.error))?;

        tracing::debug!(
            path = %self.path.display(),
            courses = record.courses.len(),
            "progress saved"
        );
        Ok(())
    }
}

fn finish(tmp: &mut tempfile::NamedTempFile) -> io::Result<()> {
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}

fn io_error(path: &Path, err: &io::Error) -> StorageError {
    StorageError::Io(format!("{}: {err}", path.display()))
}

#[async_trait]
impl ProgressRepository for JsonFileRepository {
    async fn load(&self) -> Result<LibraryRecord, StorageError> {
        self.read()
    }

    async fn save(&self, record: &LibraryRecord) -> Result<(), StorageError> {
        self.write(record)
    }

    async fn preserve_copy(&self) -> Result<Option<PathBuf>, StorageError> {
        self.copy_aside()
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file at `path`.
    #[must_use]
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self {
            progress: Arc::new(JsonFileRepository::new(path)),
        }
    }
}
