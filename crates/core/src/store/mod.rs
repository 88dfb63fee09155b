//! Key-value persistence for tab records.
//!
//! A store maps string keys to JSON values. Game data lives under the tab
//! name; the ordered tab list lives under the reserved [`TABS_KEY`].

use std::{future::Future, path::PathBuf};

use serde_json::Value;
use thiserror::Error;

/// JSON document backend.
pub mod file;
/// In-process backend.
pub mod memory;
mod records;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use records::{load_game, load_tabs, save_game, save_tabs, GameEntry, TabsRecord, TABS_KEY};

/// Failures raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A stored value did not match the expected shape.
    #[error("malformed record '{key}': {source}")]
    Malformed {
        /// Key of the offending record.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// The backend refused the operation.
    #[error("{0}")]
    Unavailable(String),
}

/// Asynchronous string-keyed record storage.
///
/// `put` is an upsert. Deleting a missing key is not an error.
pub trait Store {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Insert or replace the value under `key`.
    fn put(&self, key: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove the value under `key`.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
