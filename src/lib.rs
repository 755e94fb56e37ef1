// Pennybook - personal bookkeeping ledger engine
// Owns category and transaction data, computes monthly/annual aggregates,
// and round-trips the full ledger through CSV/JSON.

pub mod category;
pub mod db;
pub mod error;
pub mod export;
pub mod model;
pub mod record;
pub mod stats;

// Re-export commonly used types
pub use category::CategoryStore;
pub use db::{init_schema, open};
pub use error::{LedgerError, Result};
pub use export::ImportExportEngine;
pub use model::{
    Category, CategoryStat, CategoryStatsResponse, MonthSummary, MonthTrend, Record, RecordKind,
};
pub use record::RecordStore;
pub use stats::AggregationEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
