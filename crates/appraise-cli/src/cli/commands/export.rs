use super::exit_codes;
use super::{load_config_or_default, open_store};
use crate::cli::args::ExportArgs;
use appraise_core::export::export_table;
use std::path::PathBuf;

pub fn cmd_export(args: ExportArgs) -> anyhow::Result<i32> {
    let cfg = load_config_or_default(&args.config)?;
    let store = open_store(&cfg, args.store.as_ref())?;
    let table = store.table();

    let bytes = export_table(&table, args.format)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("evaluations.{}", args.format.extension())));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&out, bytes)?;

    eprintln!(
        "exported {} rows from {} to {}",
        table.len(),
        store.describe(),
        out.display()
    );
    Ok(exit_codes::OK)
}
