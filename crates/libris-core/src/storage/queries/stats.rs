use rusqlite::Connection;

use crate::error::Result;
use crate::models::LibraryStats;

pub struct LibraryStatsQuery<'a> {
    conn: &'a Connection,
}

impl<'a> LibraryStatsQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get_stats(&self) -> Result<LibraryStats> {
        let (total, read, favorites) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(read_status != 0), 0),
                    COALESCE(SUM(favorite != 0), 0)
             FROM books",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;

        Ok(LibraryStats::from_counts(
            total as usize,
            read as usize,
            favorites as usize,
        ))
    }
}
