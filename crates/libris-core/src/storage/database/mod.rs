mod connection;
mod schema;

pub use connection::{UNICODE_LOWER, open_connection, open_in_memory_connection};
pub use schema::init_schema;

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{Book, BookKey, LibraryStats, SearchField, StoredBook};

use super::queries::{BookSearchQuery, LibraryStatsQuery};
use super::repositories::{BookRepository, Repository, SqliteBookRepository};
use super::{Backend, BookStore};

/// Relational backend: one `books` table, rows mutated in place.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        tracing::debug!(path = %path.display(), "opened library database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_in_memory_connection()?,
        })
    }

    fn books(&self) -> SqliteBookRepository<'_> {
        SqliteBookRepository::new(&self.conn)
    }
}

impl BookStore for SqliteStore {
    fn list_all(&self) -> Result<Vec<StoredBook>> {
        self.books().list_all()
    }

    fn add(&mut self, book: Book) -> Result<StoredBook> {
        book.validate()?;
        let id = self.books().insert(&book)?;
        tracing::info!(id, title = %book.title, "added book");
        Ok(StoredBook::new(id, book))
    }

    fn remove(&mut self, key: &BookKey) -> Result<usize> {
        let repo = self.books();
        let removed = match key {
            BookKey::Id(id) => usize::from(repo.delete(id)?),
            BookKey::Title(title) => repo.delete_by_title(title)?,
        };

        if removed > 0 {
            tracing::info!(%key, removed, "removed books");
        } else {
            tracing::debug!(%key, "nothing to remove");
        }
        Ok(removed)
    }

    fn search(&self, field: SearchField, term: &str) -> Result<Vec<StoredBook>> {
        tracing::debug!(%field, term, "searching books");
        BookSearchQuery::new(&self.conn).by_field(field, term)
    }

    fn statistics(&self) -> Result<LibraryStats> {
        LibraryStatsQuery::new(&self.conn).get_stats()
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}
