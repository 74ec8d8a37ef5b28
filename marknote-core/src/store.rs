//! Durable mapping between local note paths and remote guids.
//!
//! A small versioned JSON document, rewritten whole on save. The store is a
//! process-local cache of remote truth: remote is authoritative, records
//! here only save a lookup call per publish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

const STORE_VERSION: &str = "1";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read mapping store {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write mapping store {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping store {path:?} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("mapping store {path:?} has unsupported version {found:?}")]
    Version { path: PathBuf, found: String },

    #[error("a mapping record already exists for {path:?}")]
    Duplicate { path: String },
}

/// One published note: remote guid keyed by workspace-relative path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteRecord {
    pub guid: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: String,
    notes: Vec<NoteRecord>,
}

#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
    notes: Vec<NoteRecord>,
}

impl MappingStore {
    /// Open the store at `path`, starting empty when the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = ?path, "starting fresh mapping store");
            return Ok(Self {
                path,
                notes: Vec::new(),
            });
        }

        let data = fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let document: StoreDocument =
            serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        if document.version != STORE_VERSION {
            return Err(StoreError::Version {
                path,
                found: document.version,
            });
        }

        Ok(Self {
            path,
            notes: document.notes,
        })
    }

    pub fn find_by_path(&self, relative_path: &str) -> Option<&NoteRecord> {
        self.notes.iter().find(|r| r.path == relative_path)
    }

    /// Insert a new record. At most one record may exist per relative path.
    pub fn insert(&mut self, guid: &str, relative_path: &str) -> Result<(), StoreError> {
        if self.find_by_path(relative_path).is_some() {
            return Err(StoreError::Duplicate {
                path: relative_path.to_string(),
            });
        }

        self.notes.push(NoteRecord {
            guid: guid.to_string(),
            path: relative_path.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// Overwrite the guid of an existing record in place. Returns whether a
    /// record was found.
    pub fn update_guid(&mut self, relative_path: &str, guid: &str) -> bool {
        match self.notes.iter_mut().find(|r| r.path == relative_path) {
            Some(record) => {
                record.guid = guid.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove the record for a path. Returns whether one existed.
    pub fn remove(&mut self, relative_path: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|r| r.path != relative_path);
        self.notes.len() != before
    }

    /// Durability flush: rewrite the whole document. Call after every
    /// mutating batch.
    pub fn save(&self) -> Result<(), StoreError> {
        let document = StoreDocument {
            version: STORE_VERSION.to_string(),
            notes: self.notes.clone(),
        };
        let json = serde_json::to_string_pretty(&document).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn round_trips_records() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("map.db");

        let mut store = MappingStore::open(&db).unwrap();
        assert!(store.is_empty());
        store.insert("guid-1", "notes/a.md").unwrap();
        store.save().unwrap();

        let reopened = MappingStore::open(&db).unwrap();
        assert_eq!(reopened.len(), 1);
        let record = reopened.find_by_path("notes/a.md").unwrap();
        assert_eq!(record.guid, "guid-1");
    }

    #[test]
    fn rejects_duplicate_paths() {
        let dir = TempDir::new().unwrap();
        let mut store = MappingStore::open(dir.path().join("map.db")).unwrap();

        store.insert("guid-1", "notes/a.md").unwrap();
        let err = store.insert("guid-2", "notes/a.md").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_guid_overwrites_in_place() {
        let dir = TempDir::new().unwrap();
        let mut store = MappingStore::open(dir.path().join("map.db")).unwrap();

        store.insert("old", "notes/a.md").unwrap();
        assert!(store.update_guid("notes/a.md", "new"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_path("notes/a.md").unwrap().guid, "new");

        assert!(!store.update_guid("notes/missing.md", "x"));
    }

    #[test]
    fn remove_reports_existence() {
        let dir = TempDir::new().unwrap();
        let mut store = MappingStore::open(dir.path().join("map.db")).unwrap();

        store.insert("guid-1", "notes/a.md").unwrap();
        assert!(store.remove("notes/a.md"));
        assert!(!store.remove("notes/a.md"));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("map.db");
        std::fs::write(&db, "not json at all").unwrap();

        let err = MappingStore::open(&db).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn version_mismatch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("map.db");
        std::fs::write(&db, r#"{"version": "99", "notes": []}"#).unwrap();

        let err = MappingStore::open(&db).unwrap_err();
        assert!(matches!(err, StoreError::Version { .. }));
    }
}
