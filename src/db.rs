// Persistence gateway - owns the SQLite file and the schema
// One embedded database file, three tables. Every statement elsewhere
// in the crate goes through bound parameters; user input is never
// spliced into SQL text.

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::ShopResult;

/// Default database file, relative to the working directory.
pub const DATABASE_FILE: &str = "bookshop.db";

// ============================================================================
// CONNECTION LIFECYCLE
// ============================================================================

/// Opens (or creates) the bookshop database and prepares the schema.
///
/// This is the only fatal failure point in the crate: if the file
/// cannot be opened or created nothing else can proceed. Schema
/// statements after a successful open are tolerant (see
/// [`setup_database`]).
pub fn open_database<P: AsRef<Path>>(path: P) -> ShopResult<Connection> {
    let conn = Connection::open(path.as_ref())?;

    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    setup_database(&conn)?;

    debug!(path = %path.as_ref().display(), "database ready");
    Ok(conn)
}

/// Creates the three tables if they are missing. Idempotent, run once
/// per process start.
///
/// A failing CREATE on an already-open database is logged and
/// tolerated: duplicate initialization against a half-created file
/// must not crash the program.
pub fn setup_database(conn: &Connection) -> ShopResult<()> {
    const TABLES: [(&str, &str); 3] = [
        (
            "books",
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                genre TEXT,
                price REAL,
                quantity_available INTEGER,
                quantity_rented INTEGER,
                quantity_sold INTEGER,
                quantity_rented_all INTEGER,
                quantity_rented_days INTEGER
            )",
        ),
        (
            "users",
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                password TEXT NOT NULL,
                email TEXT NOT NULL,
                role INTEGER NOT NULL
            )",
        ),
        (
            "rents",
            "CREATE TABLE IF NOT EXISTS rents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                Name TEXT NOT NULL,
                Phone TEXT NOT NULL,
                quantity_rented INTEGER,
                rented_for_days INTEGER,
                rent_date TEXT NOT NULL,
                return_date TEXT
            )",
        ),
    ];

    for (name, ddl) in TABLES {
        if let Err(e) = conn.execute(ddl, []) {
            warn!(table = name, error = %e, "schema creation failed; continuing");
        }
    }

    Ok(())
}

/// Opens an isolated in-memory database with the full schema.
/// Test fixture; also handy for scratch sessions.
pub fn open_in_memory() -> ShopResult<Connection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(conn)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_creates_all_tables() {
        let conn = open_in_memory().unwrap();
        let names = table_names(&conn);

        assert!(names.contains(&"books".to_string()));
        assert!(names.contains(&"users".to_string()));
        assert!(names.contains(&"rents".to_string()));
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = open_in_memory().unwrap();
        // Running schema creation again must not fail or duplicate tables.
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='books'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
