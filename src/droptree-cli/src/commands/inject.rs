//! Quality injection command handler

use crate::cli::BatchArgs;
use crate::config::Config;
use crate::file_utils::collect_drop_files;
use anyhow::Result;
use droptree::{run_batch, Pass, Quality};
use std::path::Path;

/// Handle the inject command
pub fn handle(
    batch: &BatchArgs,
    items: Option<&Path>,
    skip_prefixes: &[String],
    qualities: &[Quality],
    config: &Config,
) -> Result<()> {
    let files = collect_drop_files(&batch.dir, None)?;
    let options = config.inject_options(skip_prefixes, qualities);
    let resolver = config.resolver(items);

    tracing::info!(
        "Injecting {} quality variants into {} files under {}",
        options.qualities.len(),
        files.len(),
        batch.dir.display()
    );

    let summary = run_batch(
        &files,
        Pass::Inject {
            resolver: &*resolver,
            options: &options,
        },
        batch.options(),
    );

    print!("{}", summary);
    Ok(())
}
