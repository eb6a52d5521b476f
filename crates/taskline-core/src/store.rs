//! Durable persistence of the task collection.
//!
//! A single JSON file holds the whole collection, next to one backup
//! generation (`tasks.json.bak`). Every successful save overwrites the
//! backup with the previous primary bytes, so only the immediately
//! preceding state is ever recoverable. Concurrent modification of the
//! primary file by another process between a load and the following save
//! is undefined behavior; no inter-process locking is provided.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::task::TaskCollection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize task collection: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(
        "task data is corrupt: neither {} nor {} could be parsed; repair or delete them manually",
        .primary.display(),
        .backup.display()
    )]
    Corrupt { primary: PathBuf, backup: PathBuf },
}

/// Storage capability the lifecycle manager depends on.
pub trait TaskStore {
    fn load(&self) -> Result<TaskCollection, StoreError>;
    fn save(&self, collection: &TaskCollection) -> Result<(), StoreError>;
    fn exists(&self) -> bool;
}

/// File-backed store with a one-generation backup.
///
/// Saves are atomic from the caller's perspective: the new collection is
/// written to a temp sibling and renamed over the primary, so a crash
/// mid-save leaves either the old or the new content, never a partial
/// file. On Unix the primary is restricted to owner read/write; elsewhere
/// the containing directory's default ACL is the only guard.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn recover_from_backup(&self) -> Result<TaskCollection, StoreError> {
        let backup = self.backup_path();
        let raw = match fs::read_to_string(&backup) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Corrupt {
                    primary: self.path.clone(),
                    backup,
                });
            }
            Err(source) => return Err(StoreError::Read { path: backup, source }),
        };
        let collection: TaskCollection =
            serde_json::from_str(&raw).map_err(|_| StoreError::Corrupt {
                primary: self.path.clone(),
                backup: backup.clone(),
            })?;
        fs::copy(&backup, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        warn!(
            primary = %self.path.display(),
            backup = %backup.display(),
            "restored primary task file from backup"
        );
        Ok(collection)
    }
}

impl TaskStore for JsonTaskStore {
    fn load(&self) -> Result<TaskCollection, StoreError> {
        if !self.path.exists() {
            let collection = TaskCollection::default();
            self.save(&collection)?;
            debug!(path = %self.path.display(), "initialized empty task file");
            return Ok(collection);
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        match serde_json::from_str::<TaskCollection>(&raw) {
            Ok(collection) => Ok(collection),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "primary task file is unparsable, trying backup"
                );
                self.recover_from_backup()
            }
        }
    }

    fn save(&self, collection: &TaskCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        if self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)
                .map_err(|source| StoreError::Write { path: backup, source })?;
        }
        let body = serde_json::to_string_pretty(collection)?;
        let tmp = self.temp_path();
        fs::write(&tmp, body).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        restrict_permissions(&self.path)?;
        debug!(
            path = %self.path.display(),
            tasks = collection.tasks.len(),
            "saved task collection"
        );
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|source| {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
