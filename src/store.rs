//! Local key-value storage for the session.
//!
//! The file format matches the other config files of the app: one
//! `key = value` entry per line, `#` comments, and only the first `=` splits
//! so JSON values survive unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Box<K> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Volatile store, handy for tests and for running without a session file.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store; the whole file is rewritten on every change.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        use std::fmt::Write as _;
        let mut buf = String::from("# user-directory session\n");
        for (k, v) in &self.entries {
            let _ = writeln!(&mut buf, "{k} = {v}");
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StoreError::Write { path: self.path.clone(), source })?;
        }
        std::fs::write(&self.path, buf).map_err(|source| StoreError::Write { path: self.path.clone(), source })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // values are single-line; a newline would split the entry on reload
        let value = value.replace(['\r', '\n'], " ");
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn parse_entries(contents: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts.next().map(|s| s.trim()).unwrap_or("");
        let val = parts.next().map(|s| s.trim()).unwrap_or("");
        if key.is_empty() || val.is_empty() {
            continue;
        }
        entries.insert(key.to_string(), val.to_string());
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_keeps_equals_in_values() {
        let entries = parse_entries("# header\n\nauth_token = abc\nauth_user = {\"a\":\"b=c\"}\nbroken\n");
        assert_eq!(entries.get("auth_token").map(String::as_str), Some("abc"));
        assert_eq!(entries.get("auth_user").map(String::as_str), Some("{\"a\":\"b=c\"}"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.conf");

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("auth_token"), None);
        store.set("auth_token", "mock_user_token_456").unwrap();
        store.set("auth_user", "{\"id\":2}").unwrap();

        let mut reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("auth_token").as_deref(), Some("mock_user_token_456"));
        assert_eq!(reopened.get("auth_user").as_deref(), Some("{\"id\":2}"));

        reopened.remove("auth_token").unwrap();
        let again = FileStore::open(&path).unwrap();
        assert_eq!(again.get("auth_token"), None);
        assert!(again.get("auth_user").is_some());
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }
}
