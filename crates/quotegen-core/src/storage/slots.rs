//! Key-value slot stores
//!
//! A slot is a named string value. The durable slot store is file backed
//! (one file per key, written atomically); the session slot store is an
//! in-memory map that lives as long as the process.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// A string key-value store backing one slot lifetime
pub trait SlotStore: Send {
    /// Read the value stored under `key`, `None` if the slot is absent
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn write(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// File-backed slots, one file per key inside a directory
///
/// Writes go through a temp file and a rename so a slot is never left
/// half-written.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Create slots rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.slot", sanitize_key(key)))
    }

    fn ensure_dir(&self) -> StorageResult<()> {
        if self.dir.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDirectory {
            path: self.dir.clone(),
            source,
        })
    }
}

impl SlotStore for FileSlots {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_dir()?;
        atomic_write(&self.slot_path(key), value.as_bytes())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }
}

/// Volatile slots held in memory
///
/// An optional byte quota makes writes fail once the total stored size
/// would exceed it.
#[derive(Debug, Default, Clone)]
pub struct MemorySlots {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemorySlots {
    /// Create an empty, unbounded slot map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot map that rejects writes beyond `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn used_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl SlotStore for MemorySlots {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::Unavailable {
                    key: key.to_string(),
                    reason: format!("quota exceeded ({} of {} bytes)", needed, quota),
                });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Map a slot key onto a safe file name
///
/// Letters, digits, `_` and `-` are kept; every other byte becomes `%XX`,
/// so distinct keys always get distinct names.
fn sanitize_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_slots_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut slots = FileSlots::new(temp_dir.path().join("slots"));

        assert!(slots.read("app_quotes").unwrap().is_none());

        slots.write("app_quotes", "[]").unwrap();
        assert_eq!(slots.read("app_quotes").unwrap().as_deref(), Some("[]"));

        slots.write("app_quotes", "[1]").unwrap();
        assert_eq!(slots.read("app_quotes").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_file_slots_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut slots = FileSlots::new(temp_dir.path());

        slots.write("k", "v").unwrap();
        slots.remove("k").unwrap();
        assert!(slots.read("k").unwrap().is_none());

        // Removing again is fine
        slots.remove("k").unwrap();
    }

    #[test]
    fn test_file_slots_sanitize_key() {
        let temp_dir = TempDir::new().unwrap();
        let slots = FileSlots::new(temp_dir.path());
        let path = slots.slot_path("../etc/passwd");
        assert_eq!(path.parent().unwrap(), temp_dir.path());
        assert!(path.ends_with("%2E%2E%2Fetc%2Fpasswd.slot"));
    }

    #[test]
    fn test_file_slots_keep_similar_keys_apart() {
        let temp_dir = TempDir::new().unwrap();
        let mut slots = FileSlots::new(temp_dir.path());
        assert_ne!(slots.slot_path("a.b_quotes"), slots.slot_path("a_b_quotes"));
        assert_ne!(slots.slot_path("a%2Eb"), slots.slot_path("a.b"));

        slots.write("a.b_quotes", "dotted").unwrap();
        slots.write("a_b_quotes", "plain").unwrap();
        assert_eq!(slots.read("a.b_quotes").unwrap().as_deref(), Some("dotted"));
        assert_eq!(slots.read("a_b_quotes").unwrap().as_deref(), Some("plain"));
    }

    #[test]
    fn test_file_slots_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let mut slots = FileSlots::new(temp_dir.path());
        slots.write("k", "v").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["k.slot".to_string()]);
    }

    #[test]
    fn test_memory_slots() {
        let mut slots = MemorySlots::new();
        assert!(slots.is_empty());

        slots.write("a", "1").unwrap();
        slots.write("b", "2").unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.read("a").unwrap().as_deref(), Some("1"));

        slots.remove("a").unwrap();
        assert!(slots.read("a").unwrap().is_none());
    }

    #[test]
    fn test_memory_slots_quota() {
        let mut slots = MemorySlots::with_quota(8);
        slots.write("k", "1234").unwrap();

        // Replacing a value only counts the new size
        slots.write("k", "1234567").unwrap();

        let err = slots.write("k", "12345678").unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert_eq!(slots.read("k").unwrap().as_deref(), Some("1234567"));
    }
}
