//! Key-value stores backing the session.
//!
//! `JsonFileStore` keeps one JSON object on disk (default `~/.ipsift/session.json`) and
//! rewrites it on every change. `MemoryStore` is the same thing without the file.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Minimal key-value contract, shaped after browser extension storage.
pub trait KvStore {
    /// Values for whichever of `keys` are present.
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;
    fn set(&mut self, items: Map<String, Value>) -> Result<()>;
    fn remove(&mut self, keys: &[&str]) -> Result<()>;
}

/// File-backed store holding a single JSON object.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at a specific path. A missing or unreadable file starts empty.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = match Self::read_file(&path) {
            Ok(entries) => entries,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable session store {}: {:#}", path.display(), e);
                }
                Map::new()
            }
        };
        Self { path, entries }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ipsift")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<Map<String, Value>> {
        let data = fs::read_to_string(path).context("failed to read session store")?;
        serde_json::from_str(&data).context("failed to parse session store")
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create session store directory")?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("failed to serialize session store")?;
        fs::write(&self.path, json).context("failed to write session store")?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(pick(&self.entries, keys))
    }

    fn set(&mut self, items: Map<String, Value>) -> Result<()> {
        self.entries.extend(items);
        self.persist()
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        self.persist()
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        Ok(keys
            .iter()
            .filter_map(|k| self.entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set(&mut self, items: Map<String, Value>) -> Result<()> {
        self.entries.extend(items);
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }
}

fn pick(entries: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}
