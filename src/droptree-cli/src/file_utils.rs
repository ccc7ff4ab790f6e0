//! File system utilities for collecting drop files

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Walk files in a directory tree, filtering by extension
///
/// Extension should not include the dot (e.g., "json" not ".json").
pub fn walk_files_with_extension<F>(path: &Path, extensions: &[&str], mut handler: F)
where
    F: FnMut(&Path),
{
    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_path = entry.path();

        let matches = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);

        if matches {
            handler(file_path);
        }
    }
}

/// Collect `*.json` drop files under `dir`, optionally keeping only names
/// that contain `name_filter`
pub fn collect_drop_files(dir: &Path, name_filter: Option<&str>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut files = Vec::new();
    walk_files_with_extension(dir, &["json"], |file_path| {
        let keep = match name_filter {
            Some(filter) => file_path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(filter)),
            None => true,
        };
        if keep {
            files.push(file_path.to_path_buf());
        }
    });

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_drop_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("Encounters");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Drops_Goblin_Tier2.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("Drops_Chest_Tier1.JSON"), "{}").unwrap();
        fs::write(temp_dir.path().join("Drops_Chest_Tier1.json.bak"), "{}").unwrap();
        fs::write(temp_dir.path().join("Drops_Chest_Tier1.json.bak.meta"), "{}").unwrap();

        let all = collect_drop_files(temp_dir.path(), None).unwrap();
        assert_eq!(all.len(), 2);

        let goblins = collect_drop_files(temp_dir.path(), Some("Goblin")).unwrap();
        assert_eq!(goblins, vec![nested.join("Drops_Goblin_Tier2.json")]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(collect_drop_files(&temp_dir.path().join("missing"), None).is_err());
    }
}
