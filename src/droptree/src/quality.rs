//! Item quality definitions
//!
//! A quality-bound item variant is spelled `<BaseId>_<Quality>`, for example
//! `Weapon_Sword_Iron_Legendary`. Ids without a recognized suffix are base
//! (quality-less) references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality of an item variant, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quality {
    Poor,
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// All qualities in canonical order
pub const QUALITIES: [Quality; 6] = [
    Quality::Poor,
    Quality::Common,
    Quality::Uncommon,
    Quality::Rare,
    Quality::Epic,
    Quality::Legendary,
];

/// Id prefixes of equipment categories that come in quality variants
pub const CATEGORY_PREFIXES: &[&str] = &["Weapon_", "Armor_", "Tool_"];

/// Suffix labels some item registries use in place of the canonical name
const ALIASES: &[(&str, Quality)] = &[("Junk", Quality::Poor)];

impl Quality {
    /// Canonical label used in item id suffixes
    pub const fn label(self) -> &'static str {
        match self {
            Quality::Poor => "Poor",
            Quality::Common => "Common",
            Quality::Uncommon => "Uncommon",
            Quality::Rare => "Rare",
            Quality::Epic => "Epic",
            Quality::Legendary => "Legendary",
        }
    }

    /// Look up a quality by suffix label (canonical or alias, case-sensitive)
    pub fn from_label(label: &str) -> Option<Quality> {
        QUALITIES
            .iter()
            .copied()
            .find(|q| q.label() == label)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == label)
                    .map(|(_, q)| *q)
            })
    }

    /// Build the variant id for a base item, e.g. `Weapon_Sword` -> `Weapon_Sword_Rare`
    pub fn variant_id(self, base_id: &str) -> String {
        format!("{}_{}", base_id, self.label())
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::from_label(s).ok_or_else(|| {
            format!(
                "unknown quality '{}' (expected one of: {})",
                s,
                QUALITIES.map(Quality::label).join(", ")
            )
        })
    }
}

/// Split a quality-bound id into its base id and quality
///
/// Returns `None` when the id carries no recognized quality suffix.
pub fn split_quality_suffix(item_id: &str) -> Option<(&str, Quality)> {
    let (base, label) = item_id.rsplit_once('_')?;
    Quality::from_label(label).map(|quality| (base, quality))
}

/// Check whether an id already names a quality variant
pub fn has_quality_suffix(item_id: &str) -> bool {
    split_quality_suffix(item_id).is_some()
}
