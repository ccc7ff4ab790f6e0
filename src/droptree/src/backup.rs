//! Pristine backups of drop files.
//!
//! Before a drop file is rewritten for the first time it is copied to
//! `<name>.json.bak`. A sidecar `<name>.json.bak.meta` records the SHA-256
//! of the pristine copy and of our last write, so later runs can tell their
//! own output apart from a file someone replaced by hand.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Hashes stored in the `.bak.meta` sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Hash of the file when it was backed up
    pub pristine_hash: String,

    /// Hash of the file after our most recent rewrite
    pub last_written_hash: String,
}

impl BackupMetadata {
    pub fn new(hash: String) -> Self {
        Self {
            pristine_hash: hash.clone(),
            last_written_hash: hash,
        }
    }

    /// Whether `hash` is a state we know about
    pub fn tracks(&self, hash: &str) -> bool {
        hash == self.pristine_hash || hash == self.last_written_hash
    }
}

/// Compute the SHA-256 of a file as lowercase hex
pub fn hash_file(path: &Path) -> Result<String, BackupError> {
    let data = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&data)))
}

/// Backup and sidecar locations for one drop file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSlot {
    pub target: PathBuf,
    pub backup: PathBuf,
    pub metadata: PathBuf,
}

impl BackupSlot {
    /// `Drops_Tier1.json` -> `Drops_Tier1.json.bak` + `Drops_Tier1.json.bak.meta`
    pub fn for_file(target: &Path) -> Self {
        let mut backup = target.as_os_str().to_owned();
        backup.push(".bak");
        let mut metadata = backup.clone();
        metadata.push(".meta");

        Self {
            target: target.to_path_buf(),
            backup: backup.into(),
            metadata: metadata.into(),
        }
    }

    pub fn read_metadata(&self) -> Result<Option<BackupMetadata>, BackupError> {
        if !self.metadata.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.metadata)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn write_metadata(&self, metadata: &BackupMetadata) -> Result<(), BackupError> {
        fs::write(&self.metadata, serde_json::to_string_pretty(metadata)?)?;
        Ok(())
    }

    /// Whether the target's current contents should be copied to the backup
    ///
    /// A backup without a sidecar is never overwritten. With a sidecar, a new
    /// backup is taken only when the target matches neither tracked hash,
    /// i.e. it was replaced outside this tool.
    pub fn needs_backup(&self) -> Result<bool, BackupError> {
        if !self.backup.exists() {
            return Ok(true);
        }

        let Some(metadata) = self.read_metadata()? else {
            return Ok(false);
        };

        Ok(!metadata.tracks(&hash_file(&self.target)?))
    }

    /// Copy the target to the backup and start a fresh sidecar
    pub fn create(&self) -> Result<(), BackupError> {
        fs::copy(&self.target, &self.backup)?;
        self.write_metadata(&BackupMetadata::new(hash_file(&self.target)?))
    }

    /// Record the target's new hash after a rewrite
    ///
    /// Only backups this tool created have a sidecar. A backup without one
    /// stays untracked, so it is never considered ours to replace.
    pub fn record_write(&self) -> Result<(), BackupError> {
        let Some(mut metadata) = self.read_metadata()? else {
            tracing::debug!(
                "Not tracking {}: backup was not created by droptree",
                self.target.display()
            );
            return Ok(());
        };
        metadata.last_written_hash = hash_file(&self.target)?;
        self.write_metadata(&metadata)
    }
}

/// Back up `target` if needed; returns true when a new backup was written
pub fn ensure_backup(target: &Path) -> Result<bool, BackupError> {
    let slot = BackupSlot::for_file(target);

    if slot.needs_backup()? {
        slot.create()?;
        tracing::debug!("Backed up {} to {}", target.display(), slot.backup.display());
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_with(content: &str) -> (tempfile::TempDir, BackupSlot) {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("Drops_Tier2.json");
        fs::write(&target, content).unwrap();
        let slot = BackupSlot::for_file(&target);
        (temp_dir, slot)
    }

    #[test]
    fn test_hash_file() {
        let (_dir, slot) = slot_with("abc");
        assert_eq!(
            hash_file(&slot.target).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_slot_paths() {
        let slot = BackupSlot::for_file(Path::new("/data/Drops_Tier1.json"));
        assert_eq!(slot.backup, PathBuf::from("/data/Drops_Tier1.json.bak"));
        assert_eq!(slot.metadata, PathBuf::from("/data/Drops_Tier1.json.bak.meta"));
    }

    #[test]
    fn test_first_backup() {
        let (_dir, slot) = slot_with("{}");
        assert!(slot.needs_backup().unwrap());
        assert!(ensure_backup(&slot.target).unwrap());
        assert_eq!(fs::read_to_string(&slot.backup).unwrap(), "{}");

        let metadata = slot.read_metadata().unwrap().unwrap();
        assert_eq!(metadata.pristine_hash, metadata.last_written_hash);
    }

    #[test]
    fn test_own_rewrite_keeps_pristine_backup() {
        let (_dir, slot) = slot_with("pristine");
        ensure_backup(&slot.target).unwrap();

        fs::write(&slot.target, "rewritten").unwrap();
        slot.record_write().unwrap();

        assert!(!ensure_backup(&slot.target).unwrap());
        assert_eq!(fs::read_to_string(&slot.backup).unwrap(), "pristine");
    }

    #[test]
    fn test_replaced_file_gets_new_backup() {
        let (_dir, slot) = slot_with("pristine");
        ensure_backup(&slot.target).unwrap();

        fs::write(&slot.target, "replaced by hand").unwrap();
        assert!(slot.needs_backup().unwrap());
        assert!(ensure_backup(&slot.target).unwrap());
        assert_eq!(fs::read_to_string(&slot.backup).unwrap(), "replaced by hand");
    }

    #[test]
    fn test_backup_without_sidecar_is_kept() {
        let (_dir, slot) = slot_with("current");
        fs::write(&slot.backup, "someone else's backup").unwrap();
        assert!(!slot.needs_backup().unwrap());
    }

    #[test]
    fn test_foreign_backup_survives_rewrite_and_replacement() {
        let (_dir, slot) = slot_with("current");
        fs::write(&slot.backup, "someone else's backup").unwrap();

        assert!(!ensure_backup(&slot.target).unwrap());
        fs::write(&slot.target, "rewritten").unwrap();
        slot.record_write().unwrap();
        assert!(!slot.metadata.exists());

        fs::write(&slot.target, "replaced by hand").unwrap();
        assert!(!ensure_backup(&slot.target).unwrap());
        assert_eq!(
            fs::read_to_string(&slot.backup).unwrap(),
            "someone else's backup"
        );
    }
}
