// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value persistence for the session.
//!
//! The store holds plain strings under fixed keys. It is backed by a JSON
//! file on disk, or by an in-memory map for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key names as constants.
pub mod keys {
    pub const TOKEN: &str = "gymbuddy_token";
    pub const EMAIL: &str = "gymbuddy_email";
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Corrupt session file {path}: {message}")]
    Corrupt { path: String, message: String },
}

type Entries = BTreeMap<String, String>;

#[derive(Clone)]
enum Backend {
    File { path: PathBuf, lock: Arc<Mutex<()>> },
    Memory(Arc<Mutex<Entries>>),
}

/// Session key-value store.
#[derive(Clone)]
pub struct SessionStore {
    backend: Backend,
}

impl SessionStore {
    /// Create a store persisted as a JSON object at `path`.
    ///
    /// The file and its parent directory are created on first write.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File {
                path: path.into(),
                lock: Arc::new(Mutex::new(())),
            },
        }
    }

    /// Create an in-memory store for testing.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(Entries::new()))),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match &self.backend {
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                Ok(read_entries(path).await?.remove(key))
            }
            Backend::Memory(entries) => Ok(entries.lock().await.get(key).cloned()),
        }
    }

    /// Write several keys in one update.
    pub async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
        .await
    }

    /// Remove several keys in one update. Missing keys are ignored.
    pub async fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
        .await
    }

    async fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Entries),
    {
        match &self.backend {
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                let mut entries = read_entries(path).await?;
                apply(&mut entries);
                write_entries(path, &entries).await
            }
            Backend::Memory(entries) => {
                apply(&mut *entries.lock().await);
                Ok(())
            }
        }
    }
}

async fn read_entries(path: &Path) -> Result<Entries, StoreError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(io_error(path, e)),
    };

    if raw.trim().is_empty() {
        return Ok(Entries::new());
    }

    serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

async fn write_entries(path: &Path, entries: &Entries) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let json = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    // Write to a sibling file and rename so a crash never leaves half a file.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
