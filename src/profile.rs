//! Per-user profile store: free-form string variables keyed by username.
//!
//! Profiles live in memory behind one `RwLock`; `flush()` checkpoints them
//! to `users.json`. Writes between checkpoints are at risk on abnormal
//! termination — the engine flushes on graceful shutdown and callers can
//! flush at any point they care about. Lookups never fail: an unknown
//! username is lazily created and an unknown variable is simply absent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ProfileError, ProfileResult};

type ProfileMap = HashMap<String, HashMap<String, String>>;

/// Durable-at-checkpoints key-value store of user variables.
pub struct ProfileStore {
    path: Option<PathBuf>,
    users: RwLock<ProfileMap>,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("path", &self.path)
            .field("users", &self.users.read().expect("users lock poisoned").len())
            .finish()
    }
}

impl ProfileStore {
    /// Open the store backed by a checkpoint file.
    ///
    /// A missing file starts empty; an unreadable or corrupt file is fatal
    /// (better to refuse startup than silently discard every profile).
    pub fn open(path: PathBuf) -> ProfileResult<Self> {
        let users = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ProfileError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            if content.trim().is_empty() {
                ProfileMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| ProfileError::Corrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
        } else {
            ProfileMap::new()
        };

        Ok(Self {
            path: Some(path),
            users: RwLock::new(users),
        })
    }

    /// In-memory store with no checkpoint file (tests, ephemeral sessions).
    pub fn memory_only() -> Self {
        Self {
            path: None,
            users: RwLock::new(ProfileMap::new()),
        }
    }

    /// Read a variable for a user.
    ///
    /// First reference to a username creates its record, seeded with
    /// `username` so `{{user,username}}` always renders.
    pub fn get(&self, username: &str, variable: &str) -> Option<String> {
        let mut users = self.users.write().expect("users lock poisoned");
        let record = users
            .entry(username.to_string())
            .or_insert_with(|| HashMap::from([("username".to_string(), username.to_string())]));
        record.get(variable).cloned()
    }

    /// Write a variable for a user. An empty value deletes the variable.
    ///
    /// The whole read-modify-write happens under one lock guard, so slot
    /// updates from overlapping sessions cannot interleave.
    pub fn set(&self, username: &str, variable: &str, value: &str) {
        let mut users = self.users.write().expect("users lock poisoned");
        let record = users
            .entry(username.to_string())
            .or_insert_with(|| HashMap::from([("username".to_string(), username.to_string())]));
        if value.is_empty() {
            record.remove(variable);
        } else {
            record.insert(variable.to_string(), value.to_string());
        }
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.users.read().expect("users lock poisoned").len()
    }

    /// Whether any user has been seen.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checkpoint the store to its backing file (no-op when memory-only).
    pub fn flush(&self) -> ProfileResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let users = self.users.read().expect("users lock poisoned");
        let json = serde_json::to_string_pretty(&*users).map_err(|e| ProfileError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| ProfileError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

impl Drop for ProfileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to checkpoint profiles on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unknown_user_is_seeded_with_username() {
        let store = ProfileStore::memory_only();
        assert_eq!(store.get("ada", "username"), Some("ada".into()));
        assert_eq!(store.get("ada", "name"), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = ProfileStore::memory_only();
        store.set("ada", "name", "Ada");
        assert_eq!(store.get("ada", "name"), Some("Ada".into()));
    }

    #[test]
    fn empty_value_deletes_the_variable() {
        let store = ProfileStore::memory_only();
        store.set("ada", "city", "London");
        store.set("ada", "city", "");
        assert_eq!(store.get("ada", "city"), None);
    }

    #[test]
    fn checkpoint_round_trips_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        {
            let store = ProfileStore::open(path.clone()).unwrap();
            store.set("ada", "name", "Ada");
            store.flush().unwrap();
        }

        let store = ProfileStore::open(path).unwrap();
        assert_eq!(store.get("ada", "name"), Some("Ada".into()));
    }

    #[test]
    fn corrupt_checkpoint_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "}}not json{{").unwrap();
        let result = ProfileStore::open(path);
        assert!(matches!(result, Err(ProfileError::Corrupt { .. })));
    }

    #[test]
    fn empty_checkpoint_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "").unwrap();
        let store = ProfileStore::open(path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn drop_writes_the_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        {
            let store = ProfileStore::open(path.clone()).unwrap();
            store.set("ada", "name", "Ada");
        }
        let reopened = ProfileStore::open(path).unwrap();
        assert_eq!(reopened.get("ada", "name"), Some("Ada".into()));
    }
}
