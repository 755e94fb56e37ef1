use anyhow::{bail, Context, Result};
use pennybook::{
    AggregationEngine, CategoryStore, ImportExportEngine, Record, RecordKind, RecordStore,
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    let conn = pennybook::open(&db_path()?)?;
    let rest = &args[2..];

    match command.as_str() {
        "categories" => {
            let kind = match rest.first() {
                Some(k) => Some(k.parse::<RecordKind>()?),
                None => None,
            };
            for c in CategoryStore::new(&conn).list(kind)? {
                println!("{:>3}. {} {}  [{}]  (id {})", c.sort_order, c.icon, c.name, c.kind, c.id);
            }
        }
        "add-category" => {
            let [name, icon, kind] = required(rest, "add-category <name> <icon> <type>")?;
            let category = CategoryStore::new(&conn).create(name, icon, kind.parse()?)?;
            println!("created category {} {} (id {})", category.icon, category.name, category.id);
        }
        "add" => {
            if rest.len() < 4 {
                bail!("usage: add <amount> <type> <category-id> <date> [note]");
            }
            let amount: f64 = rest[0].parse().context("amount must be a number")?;
            let kind: RecordKind = rest[1].parse()?;
            let category_id: i64 = rest[2].parse().context("category id must be an integer")?;
            let note = rest.get(4).map(String::as_str).unwrap_or("");
            let record = RecordStore::new(&conn).create(amount, kind, category_id, note, &rest[3])?;
            println!("recorded {} {:.2} on {} (id {})", record.kind, record.amount, record.date, record.id);
        }
        "delete" => {
            let [id] = required(rest, "delete <record-id>")?;
            RecordStore::new(&conn).delete(id.parse().context("record id must be an integer")?)?;
            println!("deleted");
        }
        "month" => {
            let [year, month] = required(rest, "month <year> <month>")?;
            let (year, month) = (year.parse()?, month.parse()?);
            for record in RecordStore::new(&conn).list_by_month(year, month)? {
                print_record(&record);
            }
            let summary = AggregationEngine::new(&conn).month_summary(year, month)?;
            println!(
                "income {:.2}  expense {:.2}  balance {:.2}",
                summary.total_income, summary.total_expense, summary.balance
            );
        }
        "recent" => {
            let limit: i64 = match rest.first() {
                Some(n) => n.parse().context("limit must be an integer")?,
                None => 10,
            };
            for record in RecordStore::new(&conn).list_recent(limit)? {
                print_record(&record);
            }
        }
        "stats" => {
            let [year, month] = required(rest, "stats <year> <month>")?;
            let stats = AggregationEngine::new(&conn).category_stats(year.parse()?, month.parse()?)?;
            for (label, entries) in [("income", &stats.income_stats), ("expense", &stats.expense_stats)] {
                println!("{label}:");
                for s in entries {
                    println!(
                        "  {} {}  {:.2} ({:.1}%)",
                        s.category_icon, s.category_name, s.amount, s.percentage
                    );
                }
            }
        }
        "trend" => {
            let [year] = required(rest, "trend <year>")?;
            for t in AggregationEngine::new(&conn).trend_stats(year.parse()?)? {
                println!("{}  income {:>10.2}  expense {:>10.2}", t.month, t.income, t.expense);
            }
        }
        "export-csv" | "export-json" | "import-csv" | "import-json" => {
            let [path] = required(rest, &format!("{command} <path>"))?;
            let engine = ImportExportEngine::new(&conn);
            match command.as_str() {
                "export-csv" => println!("exported to {}", engine.export_csv(Path::new(path))?.display()),
                "export-json" => println!("exported to {}", engine.export_json(Path::new(path))?.display()),
                "import-csv" => println!("imported {} records", engine.import_csv(Path::new(path))?),
                _ => println!("imported {} records", engine.import_json(Path::new(path))?),
            }
        }
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }

    Ok(())
}

fn required<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    if args.len() < N {
        bail!("usage: {usage}");
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

fn print_record(record: &Record) {
    let category = record
        .category
        .as_ref()
        .map(|c| format!("{} {}", c.icon, c.name))
        .unwrap_or_default();
    let sign = match record.kind {
        RecordKind::Income => '+',
        RecordKind::Expense => '-',
    };
    println!(
        "{}  {}{:>10.2}  {}  {}  (id {})",
        record.date, sign, record.amount, category, record.note, record.id
    );
}

fn db_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("PENNYBOOK_DB") {
        return Ok(PathBuf::from(path));
    }
    let dirs = directories::ProjectDirs::from("", "", "pennybook")
        .context("cannot determine a data directory for this platform")?;
    std::fs::create_dir_all(dirs.data_dir())?;
    Ok(dirs.data_dir().join("ledger.db"))
}

fn print_usage() {
    println!("pennybook {}", pennybook::VERSION);
    println!();
    println!("usage: pennybook <command> [args]");
    println!();
    println!("  categories [type]                        list categories");
    println!("  add-category <name> <icon> <type>        create a category");
    println!("  add <amount> <type> <cat-id> <date> [note]");
    println!("  delete <record-id>");
    println!("  month <year> <month>                     records + summary for a month");
    println!("  recent [limit]                           most recent records");
    println!("  stats <year> <month>                     per-category shares");
    println!("  trend <year>                             12-month income/expense trend");
    println!("  export-csv|export-json <path>");
    println!("  import-csv|import-json <path>");
    println!();
    println!("database: $PENNYBOOK_DB or the platform data directory");
}
