use crate::category::CategoryStore;
use crate::error::{LedgerError, Result};
use crate::model::{month_bounds, parse_date, validate_amount, Category, Record, RecordKind};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

/// Record columns joined with the owning category.
const SELECT_JOINED: &str = "SELECT r.id, r.amount, r.type, r.category_id, r.note, r.date,
            r.created_at,
            c.id, c.name, c.icon, c.type, c.sort_order, c.created_at
     FROM records r
     JOIN categories c ON r.category_id = c.id";

/// Owns transactions: creation, deletion and the listing queries.
///
/// Every listing attaches the resolved category, matching what the
/// presentation layer renders.
pub struct RecordStore<'c> {
    conn: &'c Connection,
}

impl<'c> RecordStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        RecordStore { conn }
    }

    /// Create a record after checking every invariant: positive amount with
    /// at most 2 decimals, valid calendar date, resolvable category, and
    /// record kind equal to the category's kind.
    pub fn create(
        &self,
        amount: f64,
        kind: RecordKind,
        category_id: i64,
        note: &str,
        date: &str,
    ) -> Result<Record> {
        validate_amount(amount)?;
        let date = parse_date(date)?;

        let category = match CategoryStore::new(self.conn).get(category_id) {
            Ok(category) => category,
            Err(LedgerError::NotFound { .. }) => {
                return Err(LedgerError::Validation(format!(
                    "category id {category_id} does not exist"
                )))
            }
            Err(other) => return Err(other),
        };
        if category.kind != kind {
            return Err(LedgerError::TypeMismatch {
                record: kind,
                category: category.kind,
            });
        }

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO records (amount, type, category_id, note, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![amount, kind, category_id, note, date, created_at],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, amount, %kind, category_id, %date, "record created");

        Ok(Record {
            id,
            amount,
            kind,
            category_id,
            note: note.to_string(),
            date,
            created_at,
            category: Some(category),
        })
    }

    /// Hard delete; there is no soft-delete or undo.
    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(LedgerError::NotFound {
                entity: "record",
                id,
            });
        }
        debug!(id, "record deleted");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Record> {
        let query = format!("{SELECT_JOINED} WHERE r.id = ?1");
        self.conn
            .query_row(&query, params![id], record_from_row)
            .optional()?
            .ok_or(LedgerError::NotFound {
                entity: "record",
                id,
            })
    }

    /// All records of one calendar month, newest date first, then newest id.
    pub fn list_by_month(&self, year: i32, month: u32) -> Result<Vec<Record>> {
        let (start, end) = month_bounds(year, month)?;
        let query = format!(
            "{SELECT_JOINED} WHERE r.date >= ?1 AND r.date < ?2
             ORDER BY r.date DESC, r.id DESC"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![start, end], record_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// The `limit` most recent records across all time. A non-positive
    /// limit yields an empty list, never a SQL no-limit query.
    pub fn list_recent(&self, limit: i64) -> Result<Vec<Record>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let query = format!("{SELECT_JOINED} ORDER BY r.date DESC, r.created_at DESC LIMIT ?1");
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![limit], record_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Full snapshot, used by export.
    pub fn list_all(&self) -> Result<Vec<Record>> {
        let query = format!("{SELECT_JOINED} ORDER BY r.date DESC, r.id DESC");
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], record_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        amount: row.get(1)?,
        kind: row.get(2)?,
        category_id: row.get(3)?,
        note: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
        category: Some(Category {
            id: row.get(7)?,
            name: row.get(8)?,
            icon: row.get(9)?,
            kind: row.get(10)?,
            sort_order: row.get(11)?,
            created_at: row.get(12)?,
        }),
    })
}
