use std::path::Path;

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

use super::schema::{apply_pragmas, init_schema};
use crate::error::Result;

/// SQL name of the Unicode-aware lowercase function; the built-in `lower()`
/// only folds ASCII.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Open (or create) the database file and make sure the `books` table exists.
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    Ok(conn)
}

pub fn open_in_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    apply_pragmas(conn)?;
    register_functions(conn)?;
    init_schema(conn)?;
    Ok(())
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}
