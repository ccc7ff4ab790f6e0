//! Tier rebalancing command handler

use crate::cli::BatchArgs;
use crate::config::Config;
use crate::file_utils::collect_drop_files;
use anyhow::Result;
use droptree::{run_batch, Pass};

/// Handle the rebalance command
pub fn handle(batch: &BatchArgs, filter: Option<&str>, config: &Config) -> Result<()> {
    let table = config.weight_table();
    for violation in table.contract_violations() {
        tracing::warn!("Weight table: {}", violation);
    }

    let files = collect_drop_files(&batch.dir, filter)?;
    tracing::info!(
        "Rebalancing {} files under {}",
        files.len(),
        batch.dir.display()
    );

    let summary = run_batch(&files, Pass::Rebalance { table: &table }, batch.options());

    print!("{}", summary);
    Ok(())
}
