//! Durable key-value storage for telemetry aggregates.
//!
//! # Responsibilities
//! - `get`/`set`/`delete` JSON values by key
//! - In-memory implementation for tests and ephemeral hosts
//! - JSON file implementation that survives restarts
//!
//! # Design Decisions
//! - Synchronous API; callers on async paths move work to a blocking thread
//! - The file store rewrites the whole document through a temp file and rename

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::TelemetryError;

/// Persistent key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, TelemetryError>;

    fn set(&self, key: &str, value: Value) -> Result<(), TelemetryError>;

    fn delete(&self, key: &str) -> Result<(), TelemetryError>;

    /// `get`, falling back to `default` when the key is absent.
    fn get_or(&self, key: &str, default: Value) -> Result<Value, TelemetryError> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, TelemetryError> {
        Ok(self.inner.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), TelemetryError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), TelemetryError> {
        self.inner.remove(key);
        Ok(())
    }
}

/// All keys kept in one JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, TelemetryError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_all(&self, doc: &BTreeMap<String, Value>) -> Result<(), TelemetryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, doc)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, TelemetryError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), TelemetryError> {
        let _guard = self.lock.lock();
        let mut doc = self.read_all()?;
        doc.insert(key.to_string(), value);
        self.write_all(&doc)
    }

    fn delete(&self, key: &str) -> Result<(), TelemetryError> {
        let _guard = self.lock.lock();
        let mut doc = self.read_all()?;
        if doc.remove(key).is_some() {
            self.write_all(&doc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.get_or("k", json!({})).unwrap(), json!({}));
        store.set("k", json!({"a": 1})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"a": 1})));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("telemetry.json");

        let store = JsonFileStore::new(&path);
        store.set("stats", json!({"old/v1/events": 3})).unwrap();
        store.set("other", json!(true)).unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("stats").unwrap(), Some(json!({"old/v1/events": 3})));

        reopened.delete("stats").unwrap();
        assert_eq!(JsonFileStore::new(&path).get("stats").unwrap(), None);
        assert_eq!(JsonFileStore::new(&path).get("other").unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.json");
        fs::write(&path, b"not json").unwrap();

        let err = JsonFileStore::new(&path).get("stats").unwrap_err();
        assert!(matches!(err, TelemetryError::Serialize(_)));
    }
}
