//! Arguments shared by the batch commands

use clap::Args;
use droptree::BatchOptions;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory of drop files (searched recursively for *.json)
    pub dir: PathBuf,

    /// Report what would change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Keep a pristine <name>.json.bak copy of each rewritten file
    #[arg(short, long)]
    pub backup: bool,
}

impl BatchArgs {
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            dry_run: self.dry_run,
            backup: self.backup,
        }
    }
}
