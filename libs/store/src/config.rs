//! Event store configuration.

use std::path::{Path, PathBuf};

/// Where the engine keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Volatile storage, discarded when the store is closed.
    InMemory,
    /// A database file on disk.
    File(PathBuf),
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::InMemory => write!(f, "memory"),
            StorageMode::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Event store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backing storage.
    pub storage: StorageMode,

    /// Engine page cache size; the engine default is used when unset.
    pub cache_size_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageMode::InMemory,
            cache_size_bytes: None,
        }
    }
}

impl StoreConfig {
    /// Configuration for a memory-only store.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration for a store persisted at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            storage: StorageMode::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Sets the engine cache size.
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size_bytes = Some(bytes);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `EVSTORE_PATH`: database file; in-memory when unset or empty
    /// - `EVSTORE_CACHE_SIZE_BYTES`: engine cache size
    pub fn from_env() -> Self {
        let storage = std::env::var("EVSTORE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(|path| StorageMode::File(PathBuf::from(path)))
            .unwrap_or(StorageMode::InMemory);

        let cache_size_bytes = std::env::var("EVSTORE_CACHE_SIZE_BYTES")
            .ok()
            .and_then(|s| s.parse().ok());

        Self {
            storage,
            cache_size_bytes,
        }
    }

    /// Returns true if the store does not persist across restarts.
    pub fn is_in_memory(&self) -> bool {
        matches!(self.storage, StorageMode::InMemory)
    }
}
