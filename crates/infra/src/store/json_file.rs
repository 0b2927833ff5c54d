//! JSON-file store: one file per entity kind inside a data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use rolegate_access::{AuditLogEntry, User};
use rolegate_core::Entity;

use super::r#trait::{ConsoleStore, StoreError, StoredState};

const USERS_FILE: &str = "users.json";
const AUDIT_FILE: &str = "audit.json";

/// Durable store backed by `users.json` and `audit.json`.
///
/// Each save rewrites both files through temporary siblings and renames, so a
/// crash mid-write never leaves a truncated file behind. Saves merge by id with
/// what is already on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), "opened json store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization { path, source })
    }

    fn tmp_path(&self, file: &str) -> PathBuf {
        self.dir.join(format!(".{file}.tmp"))
    }

    /// Serialize `items` into the temporary sibling of `file`.
    fn stage<T: Serialize>(&self, file: &str, items: &[T]) -> Result<PathBuf, StoreError> {
        let tmp = self.tmp_path(file);
        let bytes = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialization {
            path: self.dir.join(file),
            source,
        })?;
        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        Ok(tmp)
    }

    fn publish(&self, tmp: &Path, file: &str) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        fs::rename(tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn discard(&self, tmp: &Path) {
        if let Err(e) = fs::remove_file(tmp) {
            tracing::warn!(path = %tmp.display(), error = %e, "failed to remove staged file");
        }
    }
}

/// Upsert `items` into `stored`, matching by entity id.
fn merged<T: Entity + Clone>(mut stored: Vec<T>, items: &[T]) -> Vec<T> {
    for item in items {
        match stored.iter_mut().find(|s| s.same_entity(item)) {
            Some(slot) => *slot = item.clone(),
            None => stored.push(item.clone()),
        }
    }
    stored
}

impl ConsoleStore for JsonFileStore {
    fn load_all(&self) -> Result<StoredState, StoreError> {
        Ok(StoredState {
            users: self.read_list(USERS_FILE)?,
            audit: self.read_list(AUDIT_FILE)?,
        })
    }

    /// Both files are staged before either is renamed into place. If the second
    /// rename fails the first file is rolled back to its previous contents.
    fn save(&self, users: &[User], audit: &[AuditLogEntry]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let previous_users: Vec<User> = self.read_list(USERS_FILE)?;
        let next_users = merged(previous_users.clone(), users);
        let next_audit = merged(self.read_list(AUDIT_FILE)?, audit);

        let users_tmp = self.stage(USERS_FILE, &next_users)?;
        let audit_tmp = match self.stage(AUDIT_FILE, &next_audit) {
            Ok(tmp) => tmp,
            Err(e) => {
                self.discard(&users_tmp);
                return Err(e);
            }
        };

        if let Err(e) = self.publish(&users_tmp, USERS_FILE) {
            self.discard(&audit_tmp);
            return Err(e);
        }
        if let Err(e) = self.publish(&audit_tmp, AUDIT_FILE) {
            tracing::error!(error = %e, "audit rename failed; restoring users file");
            self.discard(&audit_tmp);
            let restored = self
                .stage(USERS_FILE, &previous_users)
                .and_then(|tmp| self.publish(&tmp, USERS_FILE));
            if let Err(restore) = restored {
                tracing::error!(error = %restore, "failed to restore users file");
            }
            return Err(e);
        }

        Ok(())
    }
}
