#![forbid(unsafe_code)]

//! Settings persistence: key-value port and backends.
//!
//! The governor persists its toggles through the [`SettingsStore`] port.
//! Two backends:
//!
//! - [`MemoryStore`]: in-memory (testing, ephemeral), always available.
//! - [`FileStore`]: JSON file with atomic write-rename (requires the
//!   `file-store` feature).
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: store failures never panic; operations
//!    return `Result` and callers keep operating on in-memory state.
//! 2. **Atomic writes**: file storage writes to a temp file and renames.
//! 3. **First-run tolerance**: a missing file or key reads as absent, not
//!    as an error.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

// ─────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────

/// Errors that can occur during settings storage operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    #[cfg(feature = "file-store")]
    Serialization(String),
    /// Stored data is corrupted or in an unknown format.
    Corruption(String),
    /// Backend is not available.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "file-store")]
            StoreError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StoreError::Corruption(msg) => write!(f, "store corruption: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────
// Settings Store Trait
// ─────────────────────────────────────────────────────────────────────────

/// Synchronous key-value persistence port.
///
/// Both operations are synchronous and side-effect-free beyond the store
/// itself. Implementations must be thread-safe (`Send + Sync`) so a store
/// can be shared behind an `Arc` by non-governor consumers.
pub trait SettingsStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Read the value for `key`; `None` when never written.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────

/// In-memory store for testing and ephemeral settings.
///
/// Values are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    #[must_use]
    pub fn with_entries(
        entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            data: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStore").field("entries", &count).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────
// File Store (requires file-store feature)
// ─────────────────────────────────────────────────────────────────────────

#[cfg(feature = "file-store")]
mod file_store {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// File format for stored settings (JSON).
    #[derive(Serialize, Deserialize)]
    struct SettingsFile {
        /// Format version for future migrations.
        format_version: u32,
        /// Map of key -> value.
        entries: HashMap<String, String>,
    }

    impl SettingsFile {
        const FORMAT_VERSION: u32 = 1;

        fn new() -> Self {
            Self {
                format_version: Self::FORMAT_VERSION,
                entries: HashMap::new(),
            }
        }
    }

    /// File-based settings store using JSON.
    ///
    /// # Atomic Writes
    ///
    /// Writes use a temporary file + rename pattern to prevent corruption:
    /// 1. Write to `{path}.tmp`
    /// 2. Flush and sync
    /// 3. Rename `{path}.tmp` -> `{path}`
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        /// Create a file store at the given path.
        ///
        /// The file does not need to exist; it is created on first write.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn read_entries(&self) -> StoreResult<HashMap<String, String>> {
            if !self.path.exists() {
                // First run, nothing stored yet.
                return Ok(HashMap::new());
            }

            let file = File::open(&self.path)?;
            let reader = BufReader::new(file);
            let settings: SettingsFile = serde_json::from_reader(reader).map_err(|e| {
                StoreError::Serialization(format!("failed to parse settings file: {e}"))
            })?;

            if settings.format_version != SettingsFile::FORMAT_VERSION {
                tracing::warn!(
                    stored = settings.format_version,
                    expected = SettingsFile::FORMAT_VERSION,
                    "settings file format version mismatch, ignoring stored settings"
                );
                return Ok(HashMap::new());
            }

            Ok(settings.entries)
        }

        fn write_entries(&self, entries: HashMap<String, String>) -> StoreResult<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut settings = SettingsFile::new();
            settings.entries = entries;

            let tmp_path = self.temp_path();
            {
                let file = File::create(&tmp_path)?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, &settings).map_err(|e| {
                    StoreError::Serialization(format!("failed to serialize settings: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;

            tracing::debug!(path = %self.path.display(), "saved settings");
            Ok(())
        }
    }

    impl SettingsStore for FileStore {
        fn name(&self) -> &str {
            "FileStore"
        }

        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            Ok(self.read_entries()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            let mut entries = self.read_entries()?;
            entries.insert(key.to_string(), value.to_string());
            self.write_entries(entries)
        }
    }

    impl fmt::Debug for FileStore {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStore").field("path", &self.path).finish()
        }
    }
}

#[cfg(feature = "file-store")]
pub use file_store::FileStore;
