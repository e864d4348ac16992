pub mod database;
pub mod json_file;
pub mod queries;
pub mod repositories;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{LibrisError, Result};
use crate::models::{Book, BookKey, LibraryStats, SearchField, StoredBook};

pub use database::SqliteStore;
pub use json_file::JsonFileStore;

/// The record store contract both backends implement.
///
/// Every call is one synchronous read or write against storage. Reads
/// return records in storage order together with their backend id.
pub trait BookStore {
    /// All records in storage order.
    fn list_all(&self) -> Result<Vec<StoredBook>>;

    /// Validate and persist one book. Duplicates are allowed.
    fn add(&mut self, book: Book) -> Result<StoredBook>;

    /// Delete matching records and return how many were removed.
    /// Nothing matching is not an error.
    fn remove(&mut self, key: &BookKey) -> Result<usize>;

    /// Case-insensitive substring search over one field.
    fn search(&self, field: SearchField, term: &str) -> Result<Vec<StoredBook>>;

    fn statistics(&self) -> Result<LibraryStats>;

    fn backend(&self) -> Backend;
}

/// Which storage mechanism holds the library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "sqlite" | "db" => Ok(Self::Sqlite),
            _ => Err(LibrisError::UnknownBackend(s.to_string())),
        }
    }
}

/// Open the store `backend` points at, using the paths from `config`.
pub fn open_backend(config: &AppConfig, backend: Backend) -> Result<Box<dyn BookStore>> {
    std::fs::create_dir_all(config.library_path())?;
    let store: Box<dyn BookStore> = match backend {
        Backend::Json => Box::new(JsonFileStore::open(config.library_file())?),
        Backend::Sqlite => Box::new(SqliteStore::open(&config.database_path())?),
    };
    Ok(store)
}

/// Open the configured store.
pub fn open_store(config: &AppConfig) -> Result<Box<dyn BookStore>> {
    open_backend(config, config.core.backend)
}

/// Append every record of `from` to `to`, in storage order.
pub fn transfer(from: &dyn BookStore, to: &mut dyn BookStore) -> Result<usize> {
    let books = from.list_all()?;
    let count = books.len();
    for stored in books {
        to.add(stored.book)?;
    }
    tracing::info!(from = %from.backend(), to = %to.backend(), count, "transferred books");
    Ok(count)
}
