//! Configuration management for droptree CLI

use anyhow::{Context, Result};
use droptree::{
    AssetResolver, AssumeAllResolver, InjectOptions, ItemDirectoryResolver, Quality,
    QualityWeights, TierWeights, WeightTable,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`
///
/// Every field is optional; anything unset falls back to the shipped
/// defaults. Tier rows replace the shipped row for the same tier.
///
/// ```toml
/// items_dir = "Server/Item/Items"
/// skip_prefixes = ["Weapon_Arrow", "Tool_Repair_Kit", "Weapon_Bomb"]
///
/// [default_weights]
/// Poor = 25
/// Common = 40
/// Uncommon = 20
/// Rare = 10
/// Epic = 4
/// Legendary = 1
///
/// [[tier]]
/// tier = 5
/// Poor = 2
/// Common = 10
/// Uncommon = 20
/// Rare = 33
/// Epic = 25
/// Legendary = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_prefixes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_prefixes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualities: Option<Vec<Quality>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_weights: Option<QualityWeights>,

    #[serde(default, rename = "tier", skip_serializing_if = "Vec::is_empty")]
    pub tiers: Vec<TierWeights>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("droptree");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid weights in config file {}", config_path.display()))?;

        Ok(config)
    }

    /// Reject negative or non-finite weights before they reach a drop file
    pub fn validate(&self) -> Result<()> {
        if let Some(weights) = &self.default_weights {
            weights.validate().context("in default_weights")?;
        }
        for row in &self.tiers {
            row.weights
                .validate()
                .with_context(|| format!("in tier {}", row.tier))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Shipped tier table with configured rows applied
    pub fn weight_table(&self) -> WeightTable {
        WeightTable::shipped().with_overrides(self.tiers.iter().copied())
    }

    /// Injection settings, with command-line values taking precedence
    pub fn inject_options(&self, extra_skips: &[String], qualities: &[Quality]) -> InjectOptions {
        let mut options = InjectOptions::default();

        if let Some(prefixes) = &self.category_prefixes {
            options.category_prefixes = prefixes.clone();
        }
        if let Some(prefixes) = &self.skip_prefixes {
            options.skip_prefixes = prefixes.clone();
        }
        options.skip_prefixes.extend(extra_skips.iter().cloned());

        if !qualities.is_empty() {
            options.qualities = qualities.to_vec();
        } else if let Some(configured) = &self.qualities {
            options.qualities = configured.clone();
        }

        if let Some(weights) = self.default_weights {
            options.weights = weights;
        }

        options
    }

    /// Item lookup for injection
    ///
    /// `items_dir` overrides the configured directory. With neither, every
    /// quality variant is assumed to exist.
    pub fn resolver(&self, items_dir: Option<&Path>) -> Box<dyn AssetResolver> {
        match items_dir.or(self.items_dir.as_deref()) {
            Some(dir) => Box::new(ItemDirectoryResolver::open(dir)),
            None => {
                tracing::info!("No item directory configured; assuming all quality variants exist");
                Box::new(AssumeAllResolver)
            }
        }
    }
}
