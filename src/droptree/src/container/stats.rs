//! Summary counts over a drop tree

use super::Container;
use crate::quality::CATEGORY_PREFIXES;

/// Node counts for a drop tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub singles: usize,
    pub choices: usize,
    pub multiples: usize,
    /// Leaves whose id carries a quality suffix
    pub quality_variants: usize,
    /// Weapon/armor/tool leaves without a quality suffix
    pub base_equipment: usize,
    /// Leaves with a weight of exactly 0
    pub disabled: usize,
    /// Longest root-to-leaf edge count
    pub max_depth: usize,
}

impl TreeStats {
    pub fn nodes(&self) -> usize {
        self.singles + self.choices + self.multiples
    }
}

impl Container {
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();

        self.walk(&mut |node, path| {
            stats.max_depth = stats.max_depth.max(path.depth());
            match node {
                Container::Single(single) => {
                    stats.singles += 1;
                    if single.weight == Some(0.0) {
                        stats.disabled += 1;
                    }
                    let id = single.item.item_id.as_str();
                    if single.item.quality().is_some() {
                        stats.quality_variants += 1;
                    } else if CATEGORY_PREFIXES.iter().any(|p| id.starts_with(p)) {
                        stats.base_equipment += 1;
                    }
                }
                Container::Choice(_) => stats.choices += 1,
                Container::Multiple(_) => stats.multiples += 1,
            }
        });

        stats
    }
}
