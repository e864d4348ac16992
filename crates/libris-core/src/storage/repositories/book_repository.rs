use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::{Book, BookId, DEFAULT_RATING, StoredBook};

use super::Repository;

/// Column list matching `row_to_stored`. NULLs in hand-edited rows read as
/// the field's default.
pub(crate) const BOOK_COLUMNS: &str =
    "id, title, author, year, genre, read_status, rating, favorite, cover_image";

pub(crate) fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredBook> {
    Ok(StoredBook {
        id: row.get(0)?,
        book: Book {
            title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            author: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            year: row.get::<_, Option<i32>>(3)?.unwrap_or_default(),
            genre: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            read_status: row.get::<_, Option<bool>>(5)?.unwrap_or_default(),
            rating: row.get::<_, Option<u8>>(6)?.unwrap_or(DEFAULT_RATING),
            favorite: row.get::<_, Option<bool>>(7)?.unwrap_or_default(),
            cover_image: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        },
    })
}

pub trait BookRepository: Repository<Entity = Book, Id = BookId> {
    fn list_all(&self) -> Result<Vec<StoredBook>>;
    fn delete_by_title(&self, title: &str) -> Result<usize>;
}

pub struct SqliteBookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteBookRepository<'_> {
    type Entity = Book;
    type Id = BookId;

    fn insert(&self, book: &Self::Entity) -> Result<Self::Id> {
        self.conn.execute(
            "INSERT INTO books
                (title, author, year, genre, read_status, rating, favorite, cover_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                book.title,
                book.author,
                book.year,
                book.genre,
                book.read_status,
                book.rating,
                book.favorite,
                book.cover_image,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn list_all(&self) -> Result<Vec<StoredBook>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_by_title(&self, title: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE title = ?1", params![title])?;
        Ok(deleted)
    }
}
