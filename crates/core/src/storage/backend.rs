use std::collections::HashMap;

use crate::errors::CoreError;

/// Minimal string key-value storage, the shape of browser `localStorage`.
///
/// Values are JSON text; typed access goes through
/// [`StorageManager`](super::manager::StorageManager).
pub trait KeyValueStore {
    /// Raw value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String) -> Result<(), CoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;
}

/// In-memory backend. Nothing survives the process.
#[derive(Debug, Clone, Default)]
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

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), CoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::BTreeMap;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    use super::KeyValueStore;
    use crate::errors::CoreError;

    /// Native backend: all keys live in one JSON object file.
    ///
    /// Every `set`/`remove` rewrites the file atomically (temp file + rename),
    /// so readers never observe a half-written file.
    #[derive(Debug)]
    pub struct FileStore {
        path: PathBuf,
        entries: BTreeMap<String, String>,
    }

    impl FileStore {
        /// Open (or lazily create) the store at `path`.
        ///
        /// A missing file starts empty. An unreadable or corrupted file also
        /// starts empty; the bad file is left in place until the next write.
        pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
            let path = path.as_ref().to_path_buf();
            let entries = match fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str(&text) {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!("Ignoring corrupted store file {}: {e}", path.display());
                        BTreeMap::new()
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
                Err(e) => return Err(e.into()),
            };
            Ok(Self { path, entries })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| {
                        CoreError::Storage(format!(
                            "Failed to create directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let temp_path = self.path.with_extension("json.tmp");
            let file = File::create(&temp_path)
                .map_err(|e| CoreError::Storage(format!("Failed to create temp file: {e}")))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entries)
                .map_err(|e| CoreError::Serialization(format!("Failed to serialize store: {e}")))?;
            writer
                .flush()
                .map_err(|e| CoreError::Storage(format!("Failed to flush store: {e}")))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| CoreError::Storage(format!("Failed to sync store: {e}")))?;

            fs::rename(&temp_path, &self.path).map_err(|e| {
                let _ = fs::remove_file(&temp_path);
                CoreError::Storage(format!("Failed to replace {}: {e}", self.path.display()))
            })
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
            Ok(self.entries.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), CoreError> {
            let mut next = self.entries.clone();
            next.insert(key.to_string(), value);
            self.flush(&next)?;
            self.entries = next;
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), CoreError> {
            if !self.entries.contains_key(key) {
                return Ok(());
            }
            let mut next = self.entries.clone();
            next.remove(key);
            self.flush(&next)?;
            self.entries = next;
            Ok(())
        }
    }
}
