//! Weight table display

use crate::config::Config;
use anyhow::{bail, Result};
use droptree::{QualityWeights, WeightTable, QUALITIES};

fn header() {
    print!("{:<10}", "");
    for quality in QUALITIES {
        print!("{:>11}", quality.label());
    }
    println!();
    println!("{}", "-".repeat(10 + 11 * QUALITIES.len()));
}

fn row(label: &str, weights: &QualityWeights) {
    print!("{:<10}", label);
    for quality in QUALITIES {
        print!("{:>11}", weights.get(quality));
    }
    println!();

    print!("{:<10}", "");
    for quality in QUALITIES {
        print!("{:>10.1}%", weights.probability(quality) * 100.0);
    }
    println!();
}

/// Handle the tables command
pub fn handle(check: bool, config: &Config) -> Result<()> {
    let defaults = config.inject_options(&[], &[]).weights;
    let table = config.weight_table();

    println!("Injection weights:\n");
    header();
    row("default", &defaults);

    println!("\nTier weights:\n");
    header();
    for tier_row in table.rows() {
        row(&format!("tier {}", tier_row.tier), &tier_row.weights);
    }

    if check {
        check_table(&table)?;
    }

    Ok(())
}

fn check_table(table: &WeightTable) -> Result<()> {
    let violations = table.contract_violations();
    println!();

    if violations.is_empty() {
        println!("OK: Rare and better never lose weight as the tier rises");
        return Ok(());
    }

    for violation in &violations {
        println!("  {}", violation);
    }
    bail!("{} tier table violations", violations.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use droptree::{Tier, TierWeights};

    #[test]
    fn test_shipped_tables_pass_check() {
        assert!(handle(true, &Config::default()).is_ok());
    }

    #[test]
    fn test_bad_override_fails_check() {
        let config = Config {
            tiers: vec![TierWeights {
                tier: Tier(3),
                weights: QualityWeights::new(10.0, 25.0, 30.0, 25.0, 8.0, 9.0),
            }],
            ..Config::default()
        };
        assert!(handle(true, &config).is_err());
        assert!(handle(false, &config).is_ok());
    }
}
