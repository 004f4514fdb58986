//! The portable backup document: namespace name -> resolved item name -> lowercase hex.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::Error;
use crate::persist::write_atomic;

/// A snapshot of an NVRAM store that is safe to diff, keep under version control and
/// restore onto another device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupDocument {
    namespaces: BTreeMap<String, BTreeMap<String, String>>,
}

impl BackupDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON backup. Anything other than an object of objects of strings is
    /// rejected as [`Error::MalformedBackup`].
    pub fn from_json(content: &str) -> Result<Self, Error> {
        serde_json::from_str(content).map_err(|e| Error::MalformedBackup(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the backup to `path`. The file only appears once it is complete.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut content = self.to_json()?;
        content.push('\n');
        write_atomic(path, content.as_bytes())
    }

    /// Make sure a namespace object exists, even if it stays empty.
    pub fn add_namespace(&mut self, namespace: &str) {
        self.namespaces.entry(namespace.to_string()).or_default();
    }

    /// Record `value` under `namespace`/`name`, replacing any previous value.
    pub fn insert(&mut self, namespace: &str, name: impl Into<String>, value: impl Into<String>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.into(), value.into());
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&str> {
        self.namespaces
            .get(namespace)
            .and_then(|items| items.get(name))
            .map(String::as_str)
    }

    pub fn namespace(&self, namespace: &str) -> Option<&BTreeMap<String, String>> {
        self.namespaces.get(namespace)
    }

    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Every `(namespace, name, hex value)` triple.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.namespaces.iter().flat_map(|(namespace, items)| {
            items
                .iter()
                .map(move |(name, value)| (namespace.as_str(), name.as_str(), value.as_str()))
        })
    }

    /// Number of items over all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
