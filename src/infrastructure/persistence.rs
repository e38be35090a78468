//! Key-value backends for the state store.

use crate::domain::CheckInError;
use fs2::FileExt;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Name of the lock file inside a `FileStore` directory.
pub const LOCK_FILE: &str = ".lock";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("corrupt record '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not lock the data directory: {source}")]
    Lock {
        #[source]
        source: io::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StorageError> for CheckInError {
    fn from(err: StorageError) -> Self {
        CheckInError::StorageFailure(err.to_string())
    }
}

/// Exclusive hold on a backend shared with other processes.
///
/// Released when dropped.
#[derive(Debug, Default)]
pub struct BackendLock {
    // Unlock is automatic when the file handle is closed.
    _file: Option<File>,
}

/// A string-keyed, string-valued persistent medium.
pub trait KeyValueStore: Send + fmt::Debug {
    /// `Ok(None)` when the key has never been written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Blocks until no other handle on the same medium holds the lock.
    /// Media private to one value need no lock.
    fn acquire_lock(&self) -> Result<BackendLock, StorageError> {
        Ok(BackendLock::default())
    }
}

/// Volatile backend; state lives as long as the value.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
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

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
///
/// Writes go to a uniquely named sibling temp file that is then renamed
/// over the target, so a reader never sees a half-written record. Handles
/// in other processes are kept out by an exclusive lock on `.lock`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn io_error(key: &str, source: io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(key, e))?;
        let target = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| Self::io_error(key, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Self::io_error(key, e))?;
        tmp.persist(&target).map_err(|e| Self::io_error(key, e.error))?;
        debug!(key, path = %target.display(), bytes = value.len(), "wrote record");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn acquire_lock(&self) -> Result<BackendLock, StorageError> {
        let lock_error = |source| StorageError::Lock { source };
        fs::create_dir_all(&self.dir).map_err(lock_error)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))
            .map_err(lock_error)?;
        FileExt::lock_exclusive(&file).map_err(lock_error)?;
        Ok(BackendLock { _file: Some(file) })
    }
}

/// Backends for exercising failure paths.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory backend whose writes can be switched to fail. Clones share
    /// state, so a test can keep one to flip the switch.
    #[derive(Debug, Clone, Default)]
    pub struct FlakyStore {
        inner: Arc<Mutex<MemoryStore>>,
        failing: Arc<AtomicBool>,
    }

    impl FlakyStore {
        pub fn fail_writes(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self, key: &str) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StorageError::Io {
                    key: key.to_string(),
                    source: io::Error::other("disk full"),
                })
            } else {
                Ok(())
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.lock().unwrap().get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.lock().unwrap().set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.check(key)?;
            self.inner.lock().unwrap().remove(key)
        }
    }
}
