//! Core CLI definitions

use clap::{Parser, Subcommand};
use droptree::Quality;
use std::path::PathBuf;

use super::batch::BatchArgs;

#[derive(Parser)]
#[command(name = "droptree")]
#[command(about = "Loot drop tree editor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wrap base weapon/armor/tool drops in a choice over their quality variants
    #[command(visible_alias = "i")]
    Inject {
        #[command(flatten)]
        batch: BatchArgs,

        /// Item registry directory holding <ItemId>.json definitions
        /// (uses configured default if not provided)
        #[arg(long, env = "DROPTREE_ITEMS_DIR")]
        items: Option<PathBuf>,

        /// Additional item id prefix to leave alone (repeatable)
        #[arg(long)]
        skip_prefix: Vec<String>,

        /// Qualities to generate, in order (repeatable; defaults to all six)
        #[arg(long)]
        quality: Vec<Quality>,
    },

    /// Set quality-variant weights from the tier in each file name
    #[command(visible_alias = "r")]
    Rebalance {
        #[command(flatten)]
        batch: BatchArgs,

        /// Only process files whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show tree statistics and expected drops for one file
    Inspect {
        /// Path to a drop file
        file: PathBuf,
    },

    /// Evaluate a drop file repeatedly and tally what drops
    Roll {
        /// Path to a drop file
        file: PathBuf,

        /// Number of evaluations
        #[arg(short, long, default_value_t = 1000)]
        count: u32,

        /// Seed for reproducible rolls
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print the quality weight tables in effect
    #[command(visible_alias = "t")]
    Tables {
        /// Verify better qualities never lose weight as the tier rises
        #[arg(long)]
        check: bool,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default item registry directory
        #[arg(long)]
        items_dir: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
