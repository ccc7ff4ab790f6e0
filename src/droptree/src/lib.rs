//! # droptree
//!
//! Loot container tree engine - quality injection, tier rebalancing, and
//! weighted selection over game drop files.
//!
//! This library provides functionality to:
//! - Parse and serialize drop container trees (`Single`, `Choice`, `Multiple`)
//! - Replace base weapon/armor/tool drops with a choice over quality variants
//! - Rebalance quality-variant weights from an encounter tier's table
//! - Evaluate a tree the way the game does, or compute expected drops
//! - Run either pass over a directory of drop files with backups
//!
//! ## Example
//!
//! ```
//! use droptree::{inject_quality_choices, AssumeAllResolver, DropFile, InjectOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = DropFile::from_json(
//!     r#"{ "Container": { "Type": "Single", "Item": { "ItemId": "Weapon_Sword" } } }"#,
//! )?;
//! let tree = file.container.ok_or("no container")?;
//!
//! let (tree, report) =
//!     inject_quality_choices(tree, &AssumeAllResolver, &InjectOptions::default())?;
//! assert_eq!(report.replaced, 1);
//! assert_eq!(tree.children().len(), 6);
//!
//! let expected = droptree::expected_drops(&tree)?;
//! assert_eq!(expected["Weapon_Sword_Common"], 0.4);
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod batch;
pub mod container;
pub mod drop_file;
pub mod quality;
pub mod resolver;
pub mod selector;
pub mod tables;
pub mod transform;

// Re-export commonly used items
#[doc(inline)]
pub use backup::{ensure_backup, BackupError};
#[doc(inline)]
pub use batch::{
    process_file, run_batch, BatchOptions, BatchSummary, FileError, FileOutcome, Pass, SkipReason,
};
#[doc(inline)]
pub use container::{
    Composite, Container, ContainerKind, ItemRef, Malformation, MalformedTreeError, Single,
    TreePath, TreeStats, Visit,
};
#[doc(inline)]
pub use drop_file::{DropFile, DropFileError};
#[doc(inline)]
pub use quality::{split_quality_suffix, Quality, CATEGORY_PREFIXES, QUALITIES};
#[doc(inline)]
pub use resolver::{
    AssetResolutionUnavailable, AssetResolver, AssumeAllResolver, ItemDirectoryResolver,
    KnownItemsResolver,
};
#[doc(inline)]
pub use selector::{expected_drops, select, EmptyCompositeError, Outcome};
#[doc(inline)]
pub use tables::{
    default_quality_weight, InvalidQualityWeightError, QualityWeights, Tier, TierOutOfRangeError,
    TierWeights, UnknownTierError, WeightTable, DEFAULT_QUALITY_WEIGHTS,
};
#[doc(inline)]
pub use transform::{
    inject_quality_choices, rebalance_weights, InjectOptions, InjectReport, RebalanceReport,
    TransformError, DEFAULT_SKIP_PREFIXES,
};
