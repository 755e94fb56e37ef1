use crate::error::Result;
use crate::model::{month_bounds, CategoryStat, CategoryStatsResponse, MonthSummary, MonthTrend, RecordKind};
use rusqlite::{params, Connection};

/// Read-only aggregate computations over the record store.
///
/// Everything here is a SQL aggregate; nothing mutates, and empty months
/// come back as zeroed structures rather than errors.
pub struct AggregationEngine<'c> {
    conn: &'c Connection,
}

impl<'c> AggregationEngine<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        AggregationEngine { conn }
    }

    /// Income/expense totals and balance for one calendar month.
    pub fn month_summary(&self, year: i32, month: u32) -> Result<MonthSummary> {
        let (start, end) = month_bounds(year, month)?;
        let (total_income, total_expense) = self.sums_in_range(&start.to_string(), &end.to_string())?;
        Ok(MonthSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        })
    }

    /// Per-category shares of one month, split by kind.
    pub fn category_stats(&self, year: i32, month: u32) -> Result<CategoryStatsResponse> {
        Ok(CategoryStatsResponse {
            income_stats: self.stats_for_kind(RecordKind::Income, year, month)?,
            expense_stats: self.stats_for_kind(RecordKind::Expense, year, month)?,
        })
    }

    /// Exactly 12 entries, `year-01` through `year-12`, zero-filled for
    /// months without records.
    pub fn trend_stats(&self, year: i32) -> Result<Vec<MonthTrend>> {
        let mut trends = Vec::with_capacity(12);
        for month in 1..=12 {
            let (start, end) = month_bounds(year, month)?;
            let (income, expense) = self.sums_in_range(&start.to_string(), &end.to_string())?;
            trends.push(MonthTrend {
                month: format!("{year:04}-{month:02}"),
                income,
                expense,
            });
        }
        Ok(trends)
    }

    fn sums_in_range(&self, start: &str, end: &str) -> Result<(f64, f64)> {
        let sums = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0),
                    COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0)
             FROM records WHERE date >= ?1 AND date < ?2",
            params![start, end],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(sums)
    }

    fn stats_for_kind(
        &self,
        kind: RecordKind,
        year: i32,
        month: u32,
    ) -> Result<Vec<CategoryStat>> {
        let (start, end) = month_bounds(year, month)?;
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.icon, SUM(r.amount) AS total
             FROM records r
             JOIN categories c ON r.category_id = c.id
             WHERE r.type = ?1 AND r.date >= ?2 AND r.date < ?3
             GROUP BY c.id, c.name, c.icon
             ORDER BY total DESC, c.id ASC",
        )?;
        let rows = stmt.query_map(params![kind, start, end], |row| {
            Ok(CategoryStat {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                category_icon: row.get(2)?,
                amount: row.get(3)?,
                percentage: 0.0,
            })
        })?;
        let mut stats = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        let kind_total: f64 = stats.iter().map(|s| s.amount).sum();
        if kind_total > 0.0 {
            for stat in &mut stats {
                stat.percentage = stat.amount / kind_total * 100.0;
            }
        }
        Ok(stats)
    }
}
