// src/store.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{error::AppError, models::attempt::StoredAttempt};

/// Durable home of the current attempt record.
///
/// The record is always read and written as a whole; there are no partial
/// updates, so a reader can never observe half of a transition.
///
/// The last login identifier is kept apart from the record and survives
/// `clear`, so the next login can be pre-filled.
pub trait SessionStore {
    fn load(&self) -> Result<Option<StoredAttempt>, AppError>;
    fn save(&self, record: &StoredAttempt) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;

    fn last_identifier(&self) -> Result<Option<String>, AppError>;
    fn remember_identifier(&self, identifier: &str) -> Result<(), AppError>;
}

/// Keeps the record as a JSON file, and the last identifier in a plain text
/// file next to it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn identifier_path(&self) -> PathBuf {
        self.sibling(".last-login")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<StoredAttempt>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(format!("corrupt record: {}", e)))?;
        Ok(Some(record))
    }

    fn save(&self, record: &StoredAttempt) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(record)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        // Write then rename so the file always holds a complete record.
        let tmp = self.temp_path();
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn last_identifier(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.identifier_path()) {
            Ok(raw) => {
                let identifier = raw.trim();
                Ok((!identifier.is_empty()).then(|| identifier.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remember_identifier(&self, identifier: &str) -> Result<(), AppError> {
        fs::write(self.identifier_path(), identifier)?;
        Ok(())
    }
}

/// In-process store. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    record: Option<StoredAttempt>,
    identifier: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: StoredAttempt) -> Self {
        let store = Self::default();
        store.lock().record = Some(record);
        store
    }

    /// Current record, if any.
    pub fn snapshot(&self) -> Option<StoredAttempt> {
        self.lock().record.clone()
    }

    /// Number of save/clear operations performed so far.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock still holds a whole record.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredAttempt>, AppError> {
        Ok(self.lock().record.clone())
    }

    fn save(&self, record: &StoredAttempt) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.record = Some(record.clone());
        inner.writes += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.record = None;
        inner.writes += 1;
        Ok(())
    }

    fn last_identifier(&self) -> Result<Option<String>, AppError> {
        Ok(self.lock().identifier.clone())
    }

    fn remember_identifier(&self, identifier: &str) -> Result<(), AppError> {
        self.lock().identifier = Some(identifier.to_string());
        Ok(())
    }
}
