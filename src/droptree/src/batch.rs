//! Batch driver
//!
//! Applies one transformation pass to each drop file in a list. Per-file
//! problems are logged and collected into a [`BatchSummary`]; they never stop
//! the batch. A file is only rewritten when the pass changed its tree.

use crate::backup::{ensure_backup, BackupError, BackupSlot};
use crate::container::Container;
use crate::drop_file::{DropFile, DropFileError};
use crate::resolver::AssetResolver;
use crate::tables::{Tier, WeightTable};
use crate::transform::{inject_quality_choices, rebalance_weights, InjectOptions, TransformError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Transformation applied to every file in a batch
#[derive(Clone, Copy)]
pub enum Pass<'a> {
    Inject {
        resolver: &'a dyn AssetResolver,
        options: &'a InjectOptions,
    },
    Rebalance {
        table: &'a WeightTable,
    },
}

impl Pass<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Pass::Inject { .. } => "inject",
            Pass::Rebalance { .. } => "rebalance",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Report what would change without writing
    pub dry_run: bool,
    /// Keep a pristine `.bak` copy of each rewritten file
    pub backup: bool,
}

/// Why a file was left alone without being an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `Tier<N>` in the file name
    NoTier,
    /// `Tier<N>` in the file name with `N` too large for a tier number
    TierOutOfRange,
    /// The tier has no row in the weight table
    UnknownTier(Tier),
    /// The document has no `Container`
    NoContainer,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTier => write!(f, "no tier in file name"),
            SkipReason::TierOutOfRange => write!(f, "tier in file name is out of range"),
            SkipReason::UnknownTier(tier) => write!(f, "no weights configured for tier {}", tier),
            SkipReason::NoContainer => write!(f, "no Container"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The tree changed (and was written unless this is a dry run)
    Changed { changes: usize },
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    DropFile(#[from] DropFileError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("backup failed: {0}")]
    Backup(#[from] BackupError),
}

/// Run `pass` over one file
pub fn process_file(
    path: &Path,
    pass: Pass<'_>,
    options: BatchOptions,
) -> Result<FileOutcome, FileError> {
    match pass {
        Pass::Inject {
            resolver,
            options: inject,
        } => update_file(path, options, |tree| {
            let (tree, report) = inject_quality_choices(tree, resolver, inject)?;
            if report.skipped > 0 || report.missing_variants > 0 {
                tracing::debug!(
                    "{}: {} skip-listed, {} without variants",
                    path.display(),
                    report.skipped,
                    report.missing_variants
                );
            }
            Ok((tree, report.replaced))
        }),
        Pass::Rebalance { table } => {
            // Tier comes from the name, so unsupported files are skipped unread
            let tier = match tier_for(path, table) {
                Ok(tier) => tier,
                Err(reason) => return Ok(FileOutcome::Skipped(reason)),
            };
            update_file(path, options, |tree| {
                let (tree, report) = rebalance_weights(tree, tier, table)?;
                Ok((tree, report.changed))
            })
        }
    }
}

fn tier_for(path: &Path, table: &WeightTable) -> Result<Tier, SkipReason> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let tier = Tier::from_file_name(name)
        .map_err(|_| SkipReason::TierOutOfRange)?
        .ok_or(SkipReason::NoTier)?;
    if table.contains(tier) {
        Ok(tier)
    } else {
        Err(SkipReason::UnknownTier(tier))
    }
}

/// Load, transform, and write back only if `apply` reports changes
fn update_file<F>(path: &Path, options: BatchOptions, apply: F) -> Result<FileOutcome, FileError>
where
    F: FnOnce(Container) -> Result<(Container, usize), TransformError>,
{
    let mut file = DropFile::load(path)?;
    let Some(tree) = file.container.take() else {
        return Ok(FileOutcome::Skipped(SkipReason::NoContainer));
    };

    let (tree, changes) = apply(tree)?;
    if changes == 0 {
        return Ok(FileOutcome::Unchanged);
    }

    if options.dry_run {
        tracing::info!("Would update {} ({} changes)", path.display(), changes);
        return Ok(FileOutcome::Changed { changes });
    }

    if options.backup && ensure_backup(path)? {
        tracing::info!("Created backup of {}", path.display());
    }

    file.container = Some(tree);
    file.save_atomic(path)?;

    if options.backup {
        BackupSlot::for_file(path).record_write()?;
    }

    tracing::info!("Updated {} ({} changes)", path.display(), changes);
    Ok(FileOutcome::Changed { changes })
}

/// Per-file results of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub changed: Vec<(PathBuf, usize)>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub failed: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

impl BatchSummary {
    /// Files that were parsed and transformed (changed or not)
    pub fn processed(&self) -> usize {
        self.changed.len() + self.unchanged.len()
    }

    pub fn total_changes(&self) -> usize {
        self.changed.iter().map(|(_, n)| n).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would change" } else { "changed" };
        writeln!(
            f,
            "{} files processed: {} {} ({} edits), {} unchanged",
            self.processed(),
            self.changed.len(),
            verb,
            self.total_changes(),
            self.unchanged.len()
        )?;

        if !self.skipped.is_empty() {
            writeln!(f, "{} skipped:", self.skipped.len())?;
            for (path, reason) in &self.skipped {
                writeln!(f, "  {}: {}", path.display(), reason)?;
            }
        }

        if !self.failed.is_empty() {
            writeln!(f, "{} failed:", self.failed.len())?;
            for (path, error) in &self.failed {
                writeln!(f, "  {}: {}", path.display(), error)?;
            }
        }

        Ok(())
    }
}

/// Run `pass` over every file, collecting outcomes
pub fn run_batch<I, P>(files: I, pass: Pass<'_>, options: BatchOptions) -> BatchSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = BatchSummary {
        dry_run: options.dry_run,
        ..BatchSummary::default()
    };

    for file in files {
        let path = file.as_ref();
        match process_file(path, pass, options) {
            Ok(FileOutcome::Changed { changes }) => {
                summary.changed.push((path.to_path_buf(), changes));
            }
            Ok(FileOutcome::Unchanged) => summary.unchanged.push(path.to_path_buf()),
            Ok(FileOutcome::Skipped(reason)) => {
                tracing::warn!("Skipping {}: {}", path.display(), reason);
                summary.skipped.push((path.to_path_buf(), reason));
            }
            Err(err) => {
                tracing::warn!("Failed to {} {}: {}", pass.name(), path.display(), err);
                summary.failed.push((path.to_path_buf(), err.to_string()));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AssumeAllResolver;
    use std::fs;

    const SWORD: &str = r#"{ "Container": { "Type": "Single", "Item": { "ItemId": "Weapon_Sword" } } }"#;

    #[test]
    fn test_rebalance_skips_before_reading() {
        let temp_dir = tempfile::tempdir().unwrap();
        let table = WeightTable::shipped();
        let pass = Pass::Rebalance { table: &table };

        // neither file exists; a read would fail
        let no_tier = temp_dir.path().join("Drops_Chest.json");
        let tier_nine = temp_dir.path().join("Drops_Tier9.json");
        let oversized = temp_dir.path().join("Drops_Tier99999999999.json");
        assert_eq!(
            process_file(&no_tier, pass, BatchOptions::default()).unwrap(),
            FileOutcome::Skipped(SkipReason::NoTier)
        );
        assert_eq!(
            process_file(&tier_nine, pass, BatchOptions::default()).unwrap(),
            FileOutcome::Skipped(SkipReason::UnknownTier(Tier(9)))
        );
        assert_eq!(
            process_file(&oversized, pass, BatchOptions::default()).unwrap(),
            FileOutcome::Skipped(SkipReason::TierOutOfRange)
        );
        assert_eq!(
            SkipReason::TierOutOfRange.to_string(),
            "tier in file name is out of range"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Drops_Goblin.json");
        fs::write(&path, SWORD).unwrap();

        let options = InjectOptions::default();
        let pass = Pass::Inject {
            resolver: &AssumeAllResolver,
            options: &options,
        };
        let outcome = process_file(
            &path,
            pass,
            BatchOptions {
                dry_run: true,
                backup: true,
            },
        )
        .unwrap();

        assert_eq!(outcome, FileOutcome::Changed { changes: 1 });
        assert_eq!(fs::read_to_string(&path).unwrap(), SWORD);
        assert!(!BackupSlot::for_file(&path).backup.exists());
    }

    #[test]
    fn test_foreign_backup_left_untracked() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Drops_Goblin.json");
        fs::write(&path, SWORD).unwrap();
        let slot = BackupSlot::for_file(&path);
        fs::write(&slot.backup, "hand-made backup").unwrap();

        let options = InjectOptions::default();
        let pass = Pass::Inject {
            resolver: &AssumeAllResolver,
            options: &options,
        };
        let batch = BatchOptions {
            dry_run: false,
            backup: true,
        };
        let outcome = process_file(&path, pass, batch).unwrap();

        assert_eq!(outcome, FileOutcome::Changed { changes: 1 });
        assert_eq!(fs::read_to_string(&slot.backup).unwrap(), "hand-made backup");
        assert!(!slot.metadata.exists());
    }

    #[test]
    fn test_no_container_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Drops_Tier1.json");
        fs::write(&path, r#"{ "Comment": "empty" }"#).unwrap();

        let table = WeightTable::shipped();
        let outcome =
            process_file(&path, Pass::Rebalance { table: &table }, BatchOptions::default()).unwrap();
        assert_eq!(outcome, FileOutcome::Skipped(SkipReason::NoContainer));
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary {
            changed: vec![(PathBuf::from("a.json"), 3)],
            unchanged: vec![PathBuf::from("b.json")],
            skipped: vec![(PathBuf::from("c.json"), SkipReason::NoTier)],
            failed: vec![(PathBuf::from("d.json"), "bad".into())],
            dry_run: false,
        };
        let text = summary.to_string();
        assert!(text.starts_with("2 files processed: 1 changed (3 edits), 1 unchanged"));
        assert!(text.contains("c.json: no tier in file name"));
        assert!(text.contains("d.json: bad"));
        assert!(summary.has_failures());
    }
}
