use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use gwn_core::errors::{ErrorInfo, NestError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::record::CheckpointRecord;

/// Durable storage for checkpoint records.
pub trait CheckpointStore {
    /// True iff an artifact is present at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Reads the artifact at `path`; `Ok(None)` when there is none. An
    /// artifact that cannot be decoded is a [`NestError::Corruption`].
    fn load(&self, path: &Path) -> Result<Option<CheckpointRecord>, NestError>;

    /// Replaces the artifact at `path` with `record`. Readers never observe a
    /// partial write; on failure the previous artifact is left intact.
    fn save(&self, path: &Path, record: &CheckpointRecord) -> Result<(), NestError>;

    /// Removes the artifact at `path`; absent artifacts are not an error.
    fn delete(&self, path: &Path) -> Result<(), NestError>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn load(&self, path: &Path) -> Result<Option<CheckpointRecord>, NestError> {
        (**self).load(path)
    }

    fn save(&self, path: &Path, record: &CheckpointRecord) -> Result<(), NestError> {
        (**self).save(path, record)
    }

    fn delete(&self, path: &Path) -> Result<(), NestError> {
        (**self).delete(path)
    }
}

fn storage_error(code: &str, err: impl ToString, path: &Path) -> NestError {
    NestError::Storage(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// JSON checkpoints on the local filesystem, written through a temporary file
/// in the same directory and renamed into place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCheckpointStore;

impl CheckpointStore for FileCheckpointStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path) -> Result<Option<CheckpointRecord>, NestError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(storage_error("checkpoint-read", err, path)),
        };
        let record: CheckpointRecord = serde_json::from_str(&contents).map_err(|err| {
            NestError::Corruption(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string())
                    .with_hint("move the file aside to start the run from scratch"),
            )
        })?;
        record.validate().map_err(|err| {
            NestError::Corruption(
                err.info()
                    .clone()
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(Some(record))
    }

    fn save(&self, path: &Path, record: &CheckpointRecord) -> Result<(), NestError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|err| storage_error("checkpoint-mkdir", err, parent))?;
        let json = serde_json::to_vec(record)
            .map_err(|err| storage_error("checkpoint-serialize", err, path))?;
        let mut staged =
            NamedTempFile::new_in(parent).map_err(|err| storage_error("checkpoint-stage", err, parent))?;
        staged
            .write_all(&json)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|err| storage_error("checkpoint-write", err, path))?;
        staged
            .persist(path)
            .map_err(|err| storage_error("checkpoint-rename", err.error, path))?;
        debug!(path = %path.display(), bytes = json.len(), "checkpoint written");
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<(), NestError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error("checkpoint-remove", err, path)),
        }
    }
}
