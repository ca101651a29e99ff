// Dev utility: import master production schedule rows from CSV into the work order store.
//
// Usage:
//   cargo run --bin seed_schedule_catalog -- <csv_path> [db_path]
//
// CSV header: mps_id,product_name,date_start,date_end,quantity

use std::path::PathBuf;

use anyhow::{bail, Context};
use mes_work_order::app::{get_default_db_path, AppState};
use mes_work_order::importer::ScheduleCsvImporter;
use mes_work_order::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let csv_path = match args.next() {
        Some(p) => PathBuf::from(p),
        None => bail!("usage: seed_schedule_catalog <csv_path> [db_path]"),
    };
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    let (items, summary) = ScheduleCsvImporter::parse_file(&csv_path)
        .with_context(|| format!("failed to parse {}", csv_path.display()))?;

    let state = AppState::new(db_path.clone()).map_err(anyhow::Error::msg)?;
    let imported = ScheduleCsvImporter::import(&state.work_order_api, &items)?;

    println!(
        "db={} rows={} imported={} skipped_blank={}",
        db_path, summary.total_rows, imported, summary.skipped_blank
    );
    Ok(())
}
