//! Quality weight tables
//!
//! Two read-only tables drive the transformer:
//! - the default distribution written into freshly injected quality choices
//! - the per-tier table used when rebalancing an encounter's drop file
//!
//! Both are plain values passed into the transformer, never globals.

use crate::quality::{Quality, QUALITIES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Encounter/zone difficulty band, encoded in drop file names as `Tier<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(pub u32);

impl Tier {
    /// Extract the tier from a file name (first `Tier<digits>` occurrence)
    ///
    /// `Drops_Encounters_Tier3.json` -> `Ok(Some(Tier(3)))`. Names without a
    /// digit run after `Tier` yield `Ok(None)`; a digit run too large for a
    /// tier number is an error rather than a missing tier.
    pub fn from_file_name(name: &str) -> Result<Option<Tier>, TierOutOfRangeError> {
        for (idx, marker) in name.match_indices("Tier") {
            let digits: String = name[idx + marker.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if digits.is_empty() {
                continue;
            }
            return digits
                .parse()
                .map(|n| Some(Tier(n)))
                .map_err(|_| TierOutOfRangeError(digits));
        }
        Ok(None)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no quality weights configured for tier {0}")]
pub struct UnknownTierError(pub Tier);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tier {0} is out of range")]
pub struct TierOutOfRangeError(pub String);

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{quality} weight {weight} is negative or not finite")]
pub struct InvalidQualityWeightError {
    pub quality: Quality,
    pub weight: f64,
}

/// One weight per quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    #[serde(rename = "Poor")]
    pub poor: f64,
    #[serde(rename = "Common")]
    pub common: f64,
    #[serde(rename = "Uncommon")]
    pub uncommon: f64,
    #[serde(rename = "Rare")]
    pub rare: f64,
    #[serde(rename = "Epic")]
    pub epic: f64,
    #[serde(rename = "Legendary")]
    pub legendary: f64,
}

/// Distribution written into newly injected quality choices (not tier-aware)
pub const DEFAULT_QUALITY_WEIGHTS: QualityWeights = QualityWeights {
    poor: 25.0,
    common: 40.0,
    uncommon: 20.0,
    rare: 10.0,
    epic: 4.0,
    legendary: 1.0,
};

impl Default for QualityWeights {
    fn default() -> Self {
        DEFAULT_QUALITY_WEIGHTS
    }
}

impl QualityWeights {
    pub const fn new(
        poor: f64,
        common: f64,
        uncommon: f64,
        rare: f64,
        epic: f64,
        legendary: f64,
    ) -> Self {
        Self {
            poor,
            common,
            uncommon,
            rare,
            epic,
            legendary,
        }
    }

    /// Weight for a quality
    pub fn get(&self, quality: Quality) -> f64 {
        match quality {
            Quality::Poor => self.poor,
            Quality::Common => self.common,
            Quality::Uncommon => self.uncommon,
            Quality::Rare => self.rare,
            Quality::Epic => self.epic,
            Quality::Legendary => self.legendary,
        }
    }

    /// Sum of the weights of the given qualities
    pub fn total_of(&self, qualities: &[Quality]) -> f64 {
        qualities.iter().map(|q| self.get(*q)).sum()
    }

    /// Sum of all six weights
    pub fn total(&self) -> f64 {
        self.total_of(&QUALITIES)
    }

    /// Check that every weight is finite and non-negative
    pub fn validate(&self) -> Result<(), InvalidQualityWeightError> {
        match QUALITIES
            .into_iter()
            .find(|q| !self.get(*q).is_finite() || self.get(*q) < 0.0)
        {
            Some(quality) => Err(InvalidQualityWeightError {
                quality,
                weight: self.get(quality),
            }),
            None => Ok(()),
        }
    }

    /// Chance of drawing `quality` from a choice over all six qualities
    pub fn probability(&self, quality: Quality) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.get(quality) / total
        } else {
            0.0
        }
    }
}

/// Default distribution lookup
pub fn default_quality_weight(quality: Quality) -> f64 {
    DEFAULT_QUALITY_WEIGHTS.get(quality)
}

/// A tier's row as it appears in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub tier: Tier,
    #[serde(flatten)]
    pub weights: QualityWeights,
}

/// Shipped tier table: higher tiers shift weight toward better qualities
pub const SHIPPED_TIERS: &[TierWeights] = &[
    TierWeights {
        tier: Tier(1),
        weights: QualityWeights::new(30.0, 40.0, 20.0, 8.0, 2.0, 0.5),
    },
    TierWeights {
        tier: Tier(2),
        weights: QualityWeights::new(20.0, 35.0, 25.0, 15.0, 4.0, 1.0),
    },
    TierWeights {
        tier: Tier(3),
        weights: QualityWeights::new(10.0, 25.0, 30.0, 25.0, 8.0, 2.0),
    },
    TierWeights {
        tier: Tier(4),
        weights: QualityWeights::new(5.0, 15.0, 25.0, 30.0, 20.0, 5.0),
    },
];

/// Tier -> quality -> weight
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    rows: BTreeMap<Tier, QualityWeights>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::shipped()
    }
}

impl WeightTable {
    /// The table shipped with the mod
    pub fn shipped() -> Self {
        Self::from_rows(SHIPPED_TIERS.iter().copied())
    }

    /// Build from rows; a later row for the same tier replaces an earlier one
    pub fn from_rows<I: IntoIterator<Item = TierWeights>>(rows: I) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.tier, r.weights)).collect(),
        }
    }

    /// Replace or add rows, keeping the rest of the table
    pub fn with_overrides<I: IntoIterator<Item = TierWeights>>(mut self, rows: I) -> Self {
        for row in rows {
            self.rows.insert(row.tier, row.weights);
        }
        self
    }

    /// Weights configured for a tier
    pub fn row(&self, tier: Tier) -> Result<&QualityWeights, UnknownTierError> {
        self.rows.get(&tier).ok_or(UnknownTierError(tier))
    }

    /// Weight of `quality` at `tier`
    pub fn tier_weight_of(&self, tier: Tier, quality: Quality) -> Result<f64, UnknownTierError> {
        self.row(tier).map(|w| w.get(quality))
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.rows.contains_key(&tier)
    }

    /// Rows in ascending tier order
    pub fn rows(&self) -> impl Iterator<Item = TierWeights> + '_ {
        self.rows.iter().map(|(tier, weights)| TierWeights {
            tier: *tier,
            weights: *weights,
        })
    }

    /// Tier steps where a Rare-or-better quality loses weight
    ///
    /// Tables are expected to bias toward better qualities as the tier rises,
    /// so for Rare, Epic and Legendary the weight must not decrease from one
    /// configured tier to the next. The transformer does not enforce this.
    pub fn contract_violations(&self) -> Vec<ContractViolation> {
        let mut violations = Vec::new();
        let rows: Vec<_> = self.rows().collect();

        for pair in rows.windows(2) {
            let (lower, higher) = (&pair[0], &pair[1]);
            for quality in [Quality::Rare, Quality::Epic, Quality::Legendary] {
                let from_weight = lower.weights.get(quality);
                let to_weight = higher.weights.get(quality);
                if to_weight < from_weight {
                    violations.push(ContractViolation {
                        quality,
                        from: lower.tier,
                        to: higher.tier,
                        from_weight,
                        to_weight,
                    });
                }
            }
        }

        violations
    }
}

/// A tier step where a quality's weight moves the wrong way
#[derive(Debug, Clone, PartialEq)]
pub struct ContractViolation {
    pub quality: Quality,
    pub from: Tier,
    pub to: Tier,
    pub from_weight: f64,
    pub to_weight: f64,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} drops from {} at tier {} to {} at tier {}",
            self.quality, self.from_weight, self.from, self.to_weight, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_distribution() {
        assert_eq!(default_quality_weight(Quality::Common), 40.0);
        assert_eq!(default_quality_weight(Quality::Poor), 25.0);
        assert_eq!(default_quality_weight(Quality::Uncommon), 20.0);
        assert_eq!(default_quality_weight(Quality::Rare), 10.0);
        assert_eq!(default_quality_weight(Quality::Epic), 4.0);
        assert_eq!(default_quality_weight(Quality::Legendary), 1.0);
        assert_eq!(DEFAULT_QUALITY_WEIGHTS.total(), 100.0);
    }

    #[test]
    fn test_tier_lookup() {
        let table = WeightTable::shipped();
        assert_eq!(table.tier_weight_of(Tier(4), Quality::Legendary), Ok(5.0));
        assert_eq!(table.tier_weight_of(Tier(1), Quality::Legendary), Ok(0.5));
        assert_eq!(table.tier_weight_of(Tier(3), Quality::Uncommon), Ok(30.0));
    }

    #[test]
    fn test_unknown_tier() {
        let table = WeightTable::shipped();
        assert_eq!(
            table.tier_weight_of(Tier(5), Quality::Common),
            Err(UnknownTierError(Tier(5)))
        );
        assert!(!table.contains(Tier(0)));
    }

    #[test]
    fn test_legendary_non_decreasing() {
        let table = WeightTable::shipped();
        let legendary: Vec<f64> = (1..=4)
            .map(|t| table.tier_weight_of(Tier(t), Quality::Legendary).unwrap())
            .collect();
        assert!(legendary.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_shipped_table_satisfies_contract() {
        assert!(WeightTable::shipped().contract_violations().is_empty());
    }

    #[test]
    fn test_contract_violation_reported() {
        let table = WeightTable::shipped().with_overrides([TierWeights {
            tier: Tier(4),
            weights: QualityWeights::new(5.0, 15.0, 25.0, 30.0, 20.0, 0.1),
        }]);
        let violations = table.contract_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].quality, Quality::Legendary);
        assert_eq!(violations[0].from, Tier(3));
        assert_eq!(violations[0].to, Tier(4));
    }

    #[test]
    fn test_tier_from_file_name() {
        assert_eq!(
            Tier::from_file_name("Drops_Encounters_Tier3.json"),
            Ok(Some(Tier(3)))
        );
        assert_eq!(Tier::from_file_name("Tier12_Boss.json"), Ok(Some(Tier(12))));
        assert_eq!(Tier::from_file_name("TierX_Tier2.json"), Ok(Some(Tier(2))));
        assert_eq!(Tier::from_file_name("Drops_Chest.json"), Ok(None));
        assert_eq!(Tier::from_file_name("Drops_Tier_2.json"), Ok(None));
    }

    #[test]
    fn test_tier_out_of_range() {
        let err = Tier::from_file_name("Drops_Tier99999999999.json").unwrap_err();
        assert_eq!(err, TierOutOfRangeError("99999999999".into()));
        assert_eq!(err.to_string(), "tier 99999999999 is out of range");
        assert_eq!(
            Tier::from_file_name("Drops_Tier4294967295.json"),
            Ok(Some(Tier(u32::MAX)))
        );
    }

    #[test]
    fn test_validate_weights() {
        assert!(DEFAULT_QUALITY_WEIGHTS.validate().is_ok());
        assert!(SHIPPED_TIERS.iter().all(|row| row.weights.validate().is_ok()));
        assert!(QualityWeights::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0).validate().is_ok());

        let negative = QualityWeights::new(25.0, 40.0, 20.0, 10.0, 4.0, -3.0);
        assert_eq!(
            negative.validate(),
            Err(InvalidQualityWeightError {
                quality: Quality::Legendary,
                weight: -3.0
            })
        );

        let err = QualityWeights::new(25.0, f64::NAN, 20.0, 10.0, 4.0, 1.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.quality, Quality::Common);
        assert_eq!(err.to_string(), "Common weight NaN is negative or not finite");

        let infinite = QualityWeights::new(f64::INFINITY, 40.0, 20.0, 10.0, 4.0, 1.0);
        assert_eq!(infinite.validate().unwrap_err().quality, Quality::Poor);
    }

    #[test]
    fn test_probability() {
        let p = DEFAULT_QUALITY_WEIGHTS.probability(Quality::Common);
        assert!((p - 0.4).abs() < 1e-12);
        let zero = QualityWeights::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(zero.probability(Quality::Rare), 0.0);
    }

    #[test]
    fn test_tier_weights_json_shape() {
        let row: TierWeights = serde_json::from_str(
            r#"{"tier": 2, "Poor": 1, "Common": 2, "Uncommon": 3, "Rare": 4, "Epic": 5, "Legendary": 6}"#,
        )
        .unwrap();
        assert_eq!(row.tier, Tier(2));
        assert_eq!(row.weights.get(Quality::Legendary), 6.0);
    }
}
