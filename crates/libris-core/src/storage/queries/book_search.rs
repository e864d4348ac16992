use rusqlite::{Connection, params};

use crate::error::Result;
use crate::models::{SearchField, StoredBook};
use crate::storage::database::UNICODE_LOWER;
use crate::storage::repositories::{BOOK_COLUMNS, row_to_stored};

pub struct BookSearchQuery<'a> {
    conn: &'a Connection,
}

impl<'a> BookSearchQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Substring match on one column, in id order. Both sides are folded with
    /// Rust's Unicode lowercase so results agree with the file backend.
    pub fn by_field(&self, field: SearchField, term: &str) -> Result<Vec<StoredBook>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE ?1 = '' OR instr({UNICODE_LOWER}({column}), ?1) > 0
             ORDER BY id",
            column = field.column(),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![term.to_lowercase()], row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
