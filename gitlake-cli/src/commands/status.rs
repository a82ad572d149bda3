use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use gitlake_core::store::{RecordStore, SqliteStore};
use gitlake_core::types::RecordKind;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to the gitlake database
    #[arg(long, default_value = "gitlake.db")]
    db: PathBuf,

    /// Emit machine-readable JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let store: Arc<dyn RecordStore> =
        Arc::new(SqliteStore::open(&args.db).context("Cannot open database")?);
    let stats = store.stats().await?;

    if args.json {
        let mut rows = serde_json::Map::new();
        for kind in RecordKind::ALL {
            rows.insert(kind.as_str().to_string(), stats.rows(kind).into());
        }
        let payload = serde_json::json!({
            "db": args.db.display().to_string(),
            "rows": rows,
            "total": stats.total_rows(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("gitlake store: {}", args.db.display());
    for kind in RecordKind::ALL {
        println!("  {:<22} {:>10}", kind.as_str(), stats.rows(kind));
    }
    println!("  {:<22} {:>10}", "total", stats.total_rows());
    Ok(())
}
