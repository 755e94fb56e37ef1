use crate::error::{LedgerError, Result};
use crate::model::{validate_category_name, Category, RecordKind};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

const SELECT_CATEGORY: &str =
    "SELECT id, name, icon, type, sort_order, created_at FROM categories";

/// Owns category definitions: creation and ordered listing.
///
/// Categories are append-only here: no update, delete or reorder. Names are
/// unique per kind (case-sensitive), and each new category takes the next
/// `sort_order` slot within its kind.
pub struct CategoryStore<'c> {
    conn: &'c Connection,
}

impl<'c> CategoryStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        CategoryStore { conn }
    }

    pub fn create(&self, name: &str, icon: &str, kind: RecordKind) -> Result<Category> {
        validate_category_name(name)?;
        if icon.is_empty() {
            return Err(LedgerError::Validation(
                "category icon must not be empty".to_string(),
            ));
        }
        if self.find_by_name(kind, name)?.is_some() {
            return Err(LedgerError::Validation(format!(
                "category {name:?} already exists for type {kind}"
            )));
        }

        // Append to the end of this kind's display ordering.
        let sort_order: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM categories WHERE type = ?1",
            params![kind],
            |row| row.get(0),
        )?;

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO categories (name, icon, type, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, icon, kind, sort_order, created_at],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name, %kind, sort_order, "category created");

        Ok(Category {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            kind,
            sort_order,
            created_at,
        })
    }

    /// All categories, or only those of one kind, ascending by `sort_order`.
    pub fn list(&self, kind: Option<RecordKind>) -> Result<Vec<Category>> {
        let mut out = Vec::new();
        match kind {
            Some(kind) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, icon, type, sort_order, created_at FROM categories
                     WHERE type = ?1 ORDER BY sort_order ASC",
                )?;
                let rows = stmt.query_map(params![kind], category_from_row)?;
                for category in rows {
                    out.push(category?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, name, icon, type, sort_order, created_at FROM categories
                     ORDER BY sort_order ASC",
                )?;
                let rows = stmt.query_map([], category_from_row)?;
                for category in rows {
                    out.push(category?);
                }
            }
        }
        Ok(out)
    }

    pub fn get(&self, id: i64) -> Result<Category> {
        let query = format!("{SELECT_CATEGORY} WHERE id = ?1");
        self.conn
            .query_row(&query, params![id], category_from_row)
            .optional()?
            .ok_or(LedgerError::NotFound {
                entity: "category",
                id,
            })
    }

    /// Exact-name lookup within one kind; used by record validation and
    /// import reconciliation.
    pub fn find_by_name(&self, kind: RecordKind, name: &str) -> Result<Option<Category>> {
        let query = format!("{SELECT_CATEGORY} WHERE type = ?1 AND name = ?2");
        Ok(self
            .conn
            .query_row(&query, params![kind, name], category_from_row)
            .optional()?)
    }
}

pub(crate) fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        kind: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn create_assigns_sequential_sort_order_per_kind() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);

        let dining = store.create("Dining", "🍜", RecordKind::Expense).unwrap();
        let transit = store.create("Transit", "🚇", RecordKind::Expense).unwrap();
        let salary = store.create("Salary", "💼", RecordKind::Income).unwrap();

        assert_eq!(dining.sort_order, 0);
        assert_eq!(transit.sort_order, 1);
        // Income ordering is independent of expense ordering.
        assert_eq!(salary.sort_order, 0);
        assert_ne!(dining.id, transit.id);
    }

    #[test]
    fn duplicate_name_rejected_within_kind_only() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);

        store.create("Bonus", "🎁", RecordKind::Income).unwrap();
        let err = store.create("Bonus", "🎉", RecordKind::Income).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // Same name under the other kind is fine.
        store.create("Bonus", "🎁", RecordKind::Expense).unwrap();
    }

    #[test]
    fn name_matching_is_case_sensitive() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);

        store.create("Rent", "🏠", RecordKind::Expense).unwrap();
        store.create("rent", "🏠", RecordKind::Expense).unwrap();
        assert_eq!(store.list(Some(RecordKind::Expense)).unwrap().len(), 2);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);

        assert!(matches!(
            store.create("", "🍜", RecordKind::Expense),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            store.create(&"x".repeat(33), "🍜", RecordKind::Expense),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            store.create("Dining", "", RecordKind::Expense),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn list_filters_by_kind_and_orders_by_sort_order() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);

        store.create("Dining", "🍜", RecordKind::Expense).unwrap();
        store.create("Salary", "💼", RecordKind::Income).unwrap();
        store.create("Transit", "🚇", RecordKind::Expense).unwrap();

        let expenses = store.list(Some(RecordKind::Expense)).unwrap();
        let names: Vec<&str> = expenses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Dining", "Transit"]);

        let all = store.list(None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let conn = test_conn();
        let store = CategoryStore::new(&conn);
        assert!(matches!(
            store.get(42),
            Err(LedgerError::NotFound { entity: "category", id: 42 })
        ));
    }
}
