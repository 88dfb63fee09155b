use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Store, StoreError};

/// Store persisted as a single JSON object mapping keys to records.
///
/// The whole document is cached in memory and rewritten atomically after
/// every change. The cache only reflects a change once the write succeeded.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open the document at `path`, starting empty when it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
                    key: path.display().to_string(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        info!(path = %path.display(), records = records.len(), "opened store");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, records: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|source| StoreError::Malformed {
            key: self.path.display().to_string(),
            source,
        })?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|err| StoreError::Unavailable(format!("store writer failed: {err}")))?
    }
}

impl Store for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.insert(key.to_string(), value);
        self.write(&next).await?;
        *records = next;
        debug!(key, "file store put");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if !records.contains_key(key) {
            return Ok(());
        }
        let mut next = records.clone();
        next.remove(key);
        self.write(&next).await?;
        *records = next;
        debug!(key, "file store delete");
        Ok(())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
