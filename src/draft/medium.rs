//! Key-value storage media for drafts

use crate::error::PersistenceError;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Best-effort key-value storage, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
pub trait StorageMedium: Send {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove `key`. Removing a missing key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl StorageMedium for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.dir.is_file() {
            return Err(PersistenceError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage; contents vanish with the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageMedium for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_storage() -> FileStorage {
        FileStorage::new(std::env::temp_dir().join(format!("consular-test-{}", Uuid::new_v4())))
    }

    mod file_storage {
        use super::*;

        #[test]
        fn test_get_missing_key_is_none() {
            let storage = temp_storage();
            assert!(storage.get("registration-draft.u1").unwrap().is_none());
        }

        #[test]
        fn test_set_then_get() {
            let mut storage = temp_storage();
            storage.set("registration-draft.u1", "{\"a\":1}").unwrap();
            assert_eq!(
                storage.get("registration-draft.u1").unwrap().as_deref(),
                Some("{\"a\":1}")
            );
            fs::remove_dir_all(storage.dir()).unwrap();
        }

        #[test]
        fn test_set_overwrites() {
            let mut storage = temp_storage();
            storage.set("k", "first").unwrap();
            storage.set("k", "second").unwrap();
            assert_eq!(storage.get("k").unwrap().as_deref(), Some("second"));
            fs::remove_dir_all(storage.dir()).unwrap();
        }

        #[test]
        fn test_remove_missing_key_succeeds() {
            let mut storage = temp_storage();
            assert!(storage.remove("never-written").is_ok());
        }

        #[test]
        fn test_remove_deletes_value() {
            let mut storage = temp_storage();
            storage.set("k", "v").unwrap();
            storage.remove("k").unwrap();
            assert!(storage.get("k").unwrap().is_none());
            fs::remove_dir_all(storage.dir()).unwrap();
        }

        #[test]
        fn test_file_in_place_of_dir_is_unavailable() {
            let path = std::env::temp_dir().join(format!("consular-file-{}", Uuid::new_v4()));
            fs::write(&path, "not a dir").unwrap();
            let mut storage = FileStorage::new(&path);
            assert!(matches!(
                storage.set("k", "v"),
                Err(PersistenceError::Unavailable(_))
            ));
            fs::remove_file(path).unwrap();
        }

        #[test]
        fn test_keys_are_sanitized_into_file_names() {
            let storage = FileStorage::new("/tmp/drafts");
            assert_eq!(
                storage.path_for("registration-draft.user/../x"),
                PathBuf::from("/tmp/drafts/registration-draft.user_.._x.json")
            );
        }
    }

    mod memory_storage {
        use super::*;

        #[test]
        fn test_roundtrip_and_remove() {
            let mut storage = MemoryStorage::new();
            storage.set("k", "v").unwrap();
            assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
            storage.remove("k").unwrap();
            assert!(storage.get("k").unwrap().is_none());
        }
    }
}
