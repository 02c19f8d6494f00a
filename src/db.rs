use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::KeyValueStore;
use crate::error::{storage_error, Error};

/// Volatile storage. Clones share the same entries, which lets a caller keep
/// a handle on what the app wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, Error> {
        self.entries.lock().map_err(storage_error)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries()?.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Local storage kept in a single JSON object file, one string value per key.
/// Every write rewrites the file synchronously.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    #[tracing::instrument(name = "FileStorage::open", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!("storage file does not exist yet, starting empty");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;

        tracing::debug!("flushed {} key(s) to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.into(), value.into());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }

        Ok(())
    }
}
