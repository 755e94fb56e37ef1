// Full-ledger serialization: CSV and JSON snapshots of every record, and
// the atomic import path that reconciles category names back into the
// stores.

use crate::category::CategoryStore;
use crate::error::{LedgerError, Result};
use crate::model::{parse_date, validate_amount, validate_category_name, RecordKind};
use crate::record::RecordStore;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Shared CSV/JSON schema: `date,type,category,amount,note`.
pub const CSV_HEADER: [&str; 5] = ["date", "type", "category", "amount", "note"];

/// Icon given to categories auto-provisioned during import.
pub const DEFAULT_IMPORT_ICON: &str = "📦";

/// One serialized row. CSV and JSON carry the same five fields; `amount`
/// stays numeric in JSON and is formatted to 2 decimals in CSV.
#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    date: String,
    #[serde(rename = "type")]
    kind: String,
    category: String,
    amount: f64,
    #[serde(default)]
    note: String,
}

/// A fully validated row, ready to commit.
struct ImportRow {
    date: String,
    kind: RecordKind,
    category: String,
    amount: f64,
    note: String,
}

/// Serializes and deserializes the whole ledger.
///
/// Export is a plain snapshot; import is two-phase: parse and validate every
/// row up front (any bad row rejects the whole file), then commit all rows
/// inside a single transaction so a failure rolls back records and
/// auto-created categories alike.
pub struct ImportExportEngine<'c> {
    conn: &'c Connection,
}

impl<'c> ImportExportEngine<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        ImportExportEngine { conn }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    pub fn export_csv(&self, path: &Path) -> Result<PathBuf> {
        let records = RecordStore::new(self.conn).list_all()?;

        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        writer.write_record(&CSV_HEADER)?;
        for record in &records {
            let date = record.date.to_string();
            let amount = format!("{:.2}", record.amount);
            let category = record
                .category
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or("");
            writer.write_record([
                date.as_str(),
                record.kind.as_str(),
                category,
                amount.as_str(),
                record.note.as_str(),
            ])?;
        }
        writer.flush()?;

        info!(count = records.len(), path = %path.display(), "exported CSV");
        Ok(path.to_path_buf())
    }

    pub fn export_json(&self, path: &Path) -> Result<PathBuf> {
        let records = RecordStore::new(self.conn).list_all()?;
        let rows: Vec<ExportRow> = records
            .iter()
            .map(|record| ExportRow {
                date: record.date.to_string(),
                kind: record.kind.as_str().to_string(),
                category: record
                    .category
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                amount: record.amount,
                note: record.note.clone(),
            })
            .collect();

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &rows)?;
        writer.flush()?;

        info!(count = rows.len(), path = %path.display(), "exported JSON");
        Ok(path.to_path_buf())
    }

    // ========================================================================
    // IMPORT
    // ========================================================================

    pub fn import_csv(&self, path: &Path) -> Result<usize> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let line = index + 2; // line 1 is the header
            let raw = result
                .map_err(|e| LedgerError::Validation(format!("row {line}: malformed CSV: {e}")))?;
            if raw.len() < 4 {
                return Err(LedgerError::Validation(format!(
                    "row {line}: expected at least 4 fields, got {}",
                    raw.len()
                )));
            }
            let amount_field = &raw[3];
            let amount: f64 = amount_field.trim().parse().map_err(|_| {
                LedgerError::Validation(format!("row {line}: invalid amount {amount_field:?}"))
            })?;
            let row = validated_row(&raw[0], &raw[1], &raw[2], amount, raw.get(4).unwrap_or(""))
                .map_err(|e| at_row(line, e))?;
            rows.push(row);
        }

        self.commit(&rows)
    }

    pub fn import_json(&self, path: &Path) -> Result<usize> {
        let file = File::open(path)?;
        let raw: Vec<ExportRow> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LedgerError::Validation(format!("not a valid JSON export: {e}")))?;

        let mut rows = Vec::with_capacity(raw.len());
        for (index, entry) in raw.iter().enumerate() {
            let row = validated_row(
                &entry.date,
                &entry.kind,
                &entry.category,
                entry.amount,
                &entry.note,
            )
            .map_err(|e| at_row(index + 1, e))?;
            rows.push(row);
        }

        self.commit(&rows)
    }

    /// Commit validated rows in one transaction, reconciling category names
    /// against existing categories of the row's kind and auto-provisioning
    /// the missing ones.
    fn commit(&self, rows: &[ImportRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let categories = CategoryStore::new(&tx);
            let records = RecordStore::new(&tx);
            for row in rows {
                let category = match categories.find_by_name(row.kind, &row.category)? {
                    Some(existing) => existing,
                    None => categories.create(&row.category, DEFAULT_IMPORT_ICON, row.kind)?,
                };
                records.create(row.amount, row.kind, category.id, &row.note, &row.date)?;
            }
        }
        tx.commit()?;

        info!(count = rows.len(), "import committed");
        Ok(rows.len())
    }
}

fn validated_row(
    date: &str,
    kind: &str,
    category: &str,
    amount: f64,
    note: &str,
) -> Result<ImportRow> {
    let kind = RecordKind::from_str(kind)?;
    parse_date(date)?;
    validate_amount(amount)?;
    validate_category_name(category)?;
    Ok(ImportRow {
        date: date.to_string(),
        kind,
        category: category.to_string(),
        amount,
        note: note.to_string(),
    })
}

/// Prefix validation failures with the offending row for reject-all
/// diagnostics.
fn at_row(line: usize, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Validation(msg) => LedgerError::Validation(format!("row {line}: {msg}")),
        other => other,
    }
}
