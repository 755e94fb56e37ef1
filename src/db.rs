use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the ledger database and initialize its schema.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    init_schema(&conn)?;
    Ok(conn)
}

/// Create the two ledger tables and their indexes.
///
/// Dates are ISO `YYYY-MM-DD` TEXT and timestamps RFC 3339 TEXT, so both
/// order lexicographically. The CHECK and UNIQUE constraints are backstops;
/// the stores validate before writing.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            icon        TEXT NOT NULL,
            type        TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            sort_order  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL,
            UNIQUE (name, type)
        );

        CREATE TABLE IF NOT EXISTS records (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            amount      REAL NOT NULL CHECK (amount > 0),
            type        TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            category_id INTEGER NOT NULL,
            note        TEXT NOT NULL DEFAULT '',
            date        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories (id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_date ON records (date);
        CREATE INDEX IF NOT EXISTS idx_records_category ON records (category_id);",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('categories', 'records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn schema_rejects_unknown_type_literal() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO categories (name, icon, type, sort_order, created_at)
             VALUES ('Misc', 'x', 'transfer', 0, '2024-01-01T00:00:00+00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
