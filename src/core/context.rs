//! Context store - remembered export settings per design

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::DesignIdentity;

/// File name of the store inside the data directory
pub const STORE_FILE: &str = "contexts.json";

/// Remembered export settings for one design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignContext {
    /// Display name; doubles as the redundant lookup key
    pub project_name: String,

    /// Project root folder the design exports into
    pub root: PathBuf,

    /// Fingerprint of the last complete snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Highest version number written so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_version: Option<u32>,

    /// When the last export ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_export: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContextTable {
    /// Store format version
    #[serde(default = "ContextTable::current_version")]
    version: u32,

    /// Design key (host id or base name) -> context
    #[serde(default)]
    designs: BTreeMap<String, DesignContext>,

    /// Project name -> design key
    #[serde(default)]
    names: BTreeMap<String, String>,
}

impl ContextTable {
    fn current_version() -> u32 {
        1
    }
}

impl Default for ContextTable {
    fn default() -> Self {
        Self {
            version: Self::current_version(),
            designs: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }
}

/// On-disk table of design contexts
///
/// A flat JSON file, loaded whole, mutated in memory and written back
/// whole. Records are tiny and the table rarely holds more than a few
/// dozen designs, so there is no point in anything cleverer.
pub struct ContextStore {
    path: PathBuf,
    table: ContextTable,
}

impl ContextStore {
    /// Open the store at `path`, starting empty if the file is missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ContextError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                table: ContextTable::default(),
            });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| ContextError::ReadError {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let table = serde_json::from_str(&contents).map_err(|e| ContextError::ParseError {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { path, table })
    }

    /// Where this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.table.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.designs.is_empty()
    }

    /// Exact record lookup by store key
    pub fn get(&self, key: &str) -> Option<&DesignContext> {
        self.table.designs.get(key)
    }

    /// Find the record for an open design, trying its candidate keys in order
    ///
    /// Returns the key the record was actually found under, which may be
    /// the name-derived fallback when the host id changed since setup.
    pub fn lookup(&self, identity: &DesignIdentity) -> Option<(String, &DesignContext)> {
        identity
            .candidate_keys()
            .into_iter()
            .find_map(|key| self.table.designs.get(&key).map(|ctx| (key, ctx)))
    }

    /// Resolve a user-supplied key: exact design key first, then project name
    pub fn resolve_key(&self, raw: &str) -> Option<String> {
        if self.table.designs.contains_key(raw) {
            return Some(raw.to_string());
        }
        self.table.names.get(raw).cloned()
    }

    /// Insert or update a record, keeping the name index in step
    pub fn upsert(&mut self, key: &str, context: DesignContext) {
        self.table.names.retain(|_, k| k != key);
        self.table
            .names
            .insert(context.project_name.clone(), key.to_string());
        self.table.designs.insert(key.to_string(), context);
    }

    /// Drop a record by design key or project name
    pub fn forget(&mut self, raw: &str) -> Option<DesignContext> {
        let key = self.resolve_key(raw)?;
        let removed = self.table.designs.remove(&key)?;
        self.table.names.retain(|_, k| *k != key);
        Some(removed)
    }

    /// All records, ordered by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DesignContext)> {
        self.table.designs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write the table back to disk, creating parent directories as needed
    pub fn save(&self) -> Result<(), ContextError> {
        let write_err = |e: &dyn std::fmt::Display| ContextError::WriteError {
            path: self.path.clone(),
            reason: e.to_string(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
        }
        let contents = serde_json::to_string_pretty(&self.table).map_err(|e| write_err(&e))?;
        std::fs::write(&self.path, contents).map_err(|e| write_err(&e))?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not read context store {path:?}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("context store {path:?} is not valid JSON: {reason}. Fix or delete the file to start over.")]
    ParseError { path: PathBuf, reason: String },

    #[error("could not write context store {path:?}: {reason}")]
    WriteError { path: PathBuf, reason: String },
}
