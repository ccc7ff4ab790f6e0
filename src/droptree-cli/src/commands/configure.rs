//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up droptree defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `items_dir` - Optional item registry directory to set as default
/// * `show` - If true, show current configuration
pub fn handle(items_dir: Option<PathBuf>, show: bool, config: &Config) -> Result<()> {
    if show {
        show_config(config)?;
        return Ok(());
    }

    if let Some(dir) = items_dir {
        let mut config = config.clone();
        set_items_dir(&mut config, dir)?;
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    match &config.items_dir {
        Some(dir) => println!("Item directory: {}", dir.display()),
        None => println!("No item directory configured"),
    }

    let options = config.inject_options(&[], &[]);
    let qualities: Vec<_> = options.qualities.iter().map(|q| q.label()).collect();
    println!("Qualities: {}", qualities.join(", "));
    println!("Category prefixes: {}", options.category_prefixes.join(", "));
    println!("Skip prefixes: {}", options.skip_prefixes.join(", "));
    println!("Tier overrides: {}", config.tiers.len());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }

    Ok(())
}

/// Set the item registry directory in configuration
fn set_items_dir(config: &mut Config, dir: PathBuf) -> Result<()> {
    println!("Item directory configured: {}", dir.display());
    if !dir.is_dir() {
        println!("Warning: {} does not exist yet", dir.display());
    }

    config.items_dir = Some(dir);
    config.save()?;

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: droptree configure --items-dir Server/Item/Items");
    println!("   or: droptree configure --show");
    println!();
    println!("Weights, prefixes, and tier rows can be edited directly in the config file.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_usage_does_not_panic() {
        show_usage();
    }

    #[test]
    fn test_show_config() {
        let config = Config {
            items_dir: Some(PathBuf::from("items")),
            ..Config::default()
        };
        assert!(handle(None, true, &config).is_ok());
    }
}
