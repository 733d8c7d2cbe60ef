use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::collection::{FilterConfig, SortConfig, SortDirection, SortKey};
use super::data::RecordId;
use crate::error::{GalleryError, Result};

/// Keys used in the preference store
pub mod keys {
    pub const SORT: &str = "sortConfig";
    pub const FILTER: &str = "filterConfig";
    pub const FAVOURITES: &str = "favourites";
    pub const LOGIN: &str = "login";
    /// Flag object written by older viewer versions
    pub const LEGACY_SORT: &str = "sortingState";
}

/// Durable key -> value storage for sort/filter state, favorites and identity.
/// A missing key reads as `None`.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// The SqlitePreferenceStore keeps preferences in a small SQLite database.
pub struct SqlitePreferenceStore {
    conn: Connection,
    db_path: PathBuf,
}

impl SqlitePreferenceStore {
    /// Open the store at the default location and initialize the schema.
    ///
    /// The database file is created in the user's data directory:
    /// - Linux: ~/.local/share/media-gallery/preferences.db
    /// - macOS: ~/Library/Application Support/media-gallery/preferences.db
    /// - Windows: %APPDATA%\media-gallery\preferences.db
    pub fn new() -> Result<Self> {
        let db_path = Self::default_db_path().ok_or_else(|| {
            GalleryError::Preferences(rusqlite::Error::InvalidPath(PathBuf::from(
                "media-gallery/preferences.db",
            )))
        })?;
        Self::open(&db_path)
    }

    /// Open (or create) the store at an explicit path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create {}: {}", parent.display(), err);
            }
        }

        let conn = Connection::open(db_path)?;
        let store = SqlitePreferenceStore {
            conn,
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;

        tracing::info!("Preferences opened at {}", db_path.display());
        Ok(store)
    }

    fn default_db_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("media-gallery");
        path.push("preferences.db");
        Some(path)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqlitePreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePreferenceStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Volatile store, used when the database cannot be opened and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Flags written by the old single-toggle sort buttons
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacySortState {
    newer_first: bool,
    older_first: bool,
    bigger_first: bool,
    smaller_first: bool,
    longer_first: bool,
    shorter_first: bool,
}

impl LegacySortState {
    fn into_sort_config(self) -> SortConfig {
        let flags = [
            (self.newer_first, SortKey::Date, SortDirection::Descending),
            (self.older_first, SortKey::Date, SortDirection::Ascending),
            (self.bigger_first, SortKey::Size, SortDirection::Descending),
            (self.smaller_first, SortKey::Size, SortDirection::Ascending),
            (self.longer_first, SortKey::Duration, SortDirection::Descending),
            (self.shorter_first, SortKey::Duration, SortDirection::Ascending),
        ];
        flags
            .into_iter()
            .find(|(set, _, _)| *set)
            .map(|(_, key, direction)| SortConfig {
                key: Some(key),
                direction,
                favorites_first: false,
            })
            .unwrap_or_default()
    }
}

/// Favorites may have been stored as strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Text(String),
    Number(i64),
}

impl From<StoredId> for RecordId {
    fn from(value: StoredId) -> Self {
        match value {
            StoredId::Text(text) => RecordId::from(text),
            StoredId::Number(number) => RecordId::from(number.to_string()),
        }
    }
}

/// Typed accessors over a raw preference store.
///
/// Reads never fail: missing or corrupt values fall back to documented
/// defaults (default sort, no filter, no favorites, no identity).
#[derive(Debug)]
pub struct Preferences<S> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Failed to read preference {}: {}", key, err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring corrupt preference {}: {}", key, err);
                None
            }
        }
    }

    fn write_json<T: serde::Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    /// Stored sort configuration, migrating the legacy flag object if needed
    pub fn sort_config(&self) -> SortConfig {
        if let Some(config) = self.read_json::<SortConfig>(keys::SORT) {
            return config;
        }
        self.read_json::<LegacySortState>(keys::LEGACY_SORT)
            .map(LegacySortState::into_sort_config)
            .unwrap_or_default()
    }

    pub fn save_sort_config(&mut self, config: &SortConfig) -> Result<()> {
        self.write_json(keys::SORT, config)
    }

    pub fn filter_config(&self) -> FilterConfig {
        self.read_json(keys::FILTER).unwrap_or_default()
    }

    pub fn save_filter_config(&mut self, config: &FilterConfig) -> Result<()> {
        self.write_json(keys::FILTER, config)
    }

    /// Favorite ids; a value that is not an array reads as empty
    pub fn favorites(&self) -> BTreeSet<RecordId> {
        self.read_json::<Vec<StoredId>>(keys::FAVOURITES)
            .map(|ids| ids.into_iter().map(RecordId::from).collect())
            .unwrap_or_default()
    }

    /// Flip membership of `id` and persist. Returns the new favorite status.
    pub fn toggle_favorite(&mut self, id: &RecordId) -> Result<bool> {
        let mut favorites = self.favorites();
        let now_favorite = if favorites.remove(id) {
            false
        } else {
            favorites.insert(id.clone());
            true
        };
        let ids: Vec<&str> = favorites.iter().map(RecordId::as_str).collect();
        self.write_json(keys::FAVOURITES, &ids)?;
        Ok(now_favorite)
    }

    pub fn identity(&self) -> Option<String> {
        match self.store.get(keys::LOGIN) {
            Ok(value) => value.filter(|name| !name.trim().is_empty()),
            Err(err) => {
                tracing::warn!("Failed to read identity: {}", err);
                None
            }
        }
    }

    /// Store a new identity, rejecting empty or unchanged names
    pub fn set_identity(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || self.identity().as_deref() == Some(name) {
            return Err(GalleryError::InvalidIdentity);
        }
        self.store.set(keys::LOGIN, name)
    }
}
