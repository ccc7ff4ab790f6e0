//! Drop file inspection and simulation handlers

use anyhow::{bail, Context, Result};
use droptree::{expected_drops, select, Container, DropFile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::Path;

fn load_tree(path: &Path) -> Result<Container> {
    let file = DropFile::load(path)
        .with_context(|| format!("Failed to load drop file {}", path.display()))?;

    match file.container {
        Some(tree) => Ok(tree),
        None => bail!("{} has no Container", path.display()),
    }
}

/// Handle the inspect command
pub fn inspect(path: &Path) -> Result<()> {
    let tree = load_tree(path)?;
    let stats = tree.stats();

    println!("{}", path.display());
    println!("  Root:             {}", tree.kind());
    println!(
        "  Nodes:            {} ({} Single, {} Choice, {} Multiple)",
        stats.nodes(),
        stats.singles,
        stats.choices,
        stats.multiples
    );
    println!("  Max depth:        {}", stats.max_depth);
    println!("  Quality variants: {}", stats.quality_variants);
    println!("  Base equipment:   {}", stats.base_equipment);
    println!("  Zero weight:      {}", stats.disabled);

    if let Err(err) = tree.validate() {
        println!("\n  Invalid: {}", err);
        return Ok(());
    }

    let mut expected: Vec<_> = expected_drops(&tree)?.into_iter().collect();
    expected.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!("\nExpected drops per roll:\n");
    println!("{:<48} {:>10}", "Item", "Expected");
    println!("{}", "-".repeat(59));
    for (item_id, count) in expected {
        println!("{:<48} {:>10.4}", item_id, count);
    }

    Ok(())
}

/// Tally of one item across many rolls
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    rolls: u32,
    quantity: u64,
}

fn roll_tally(tree: &Container, count: u32, rng: &mut StdRng) -> Result<BTreeMap<String, Tally>> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();

    for _ in 0..count {
        for outcome in select(tree, rng)? {
            let tally = tallies.entry(outcome.item_id).or_default();
            tally.rolls += 1;
            tally.quantity += outcome.quantity;
        }
    }

    Ok(tallies)
}

/// Handle the roll command
pub fn roll(path: &Path, count: u32, seed: Option<u64>) -> Result<()> {
    let tree = load_tree(path)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let tallies = roll_tally(&tree, count, &mut rng)?;
    let mut rows: Vec<_> = tallies.into_iter().collect();
    rows.sort_by(|a, b| b.1.rolls.cmp(&a.1.rolls).then_with(|| a.0.cmp(&b.0)));

    println!("{} rolls of {}\n", count, path.display());
    println!("{:<48} {:>8} {:>8} {:>10}", "Item", "Drops", "Rate", "Quantity");
    println!("{}", "-".repeat(77));
    for (item_id, tally) in rows {
        let rate = if count > 0 {
            f64::from(tally.rolls) / f64::from(count) * 100.0
        } else {
            0.0
        };
        println!(
            "{:<48} {:>8} {:>7.2}% {:>10}",
            item_id, tally.rolls, rate, tally.quantity
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CHEST: &str = r#"{
        "Container": {
            "Type": "Multiple",
            "Containers": [
                { "Type": "Single", "Item": { "ItemId": "Ingredient_Bone", "QuantityMin": 2, "QuantityMax": 2 } },
                { "Type": "Choice", "Containers": [
                    { "Type": "Single", "Weight": 0, "Item": { "ItemId": "Weapon_Sword_Legendary" } },
                    { "Type": "Single", "Weight": 3, "Item": { "ItemId": "Weapon_Sword_Common" } }
                ] }
            ]
        }
    }"#;

    #[test]
    fn test_roll_tally() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Drops_Chest.json");
        fs::write(&path, CHEST).unwrap();

        let tree = load_tree(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let tallies = roll_tally(&tree, 10, &mut rng).unwrap();

        assert_eq!(
            tallies["Ingredient_Bone"],
            Tally {
                rolls: 10,
                quantity: 20
            }
        );
        assert_eq!(tallies["Weapon_Sword_Common"].rolls, 10);
        assert!(!tallies.contains_key("Weapon_Sword_Legendary"));
    }

    #[test]
    fn test_inspect_and_roll_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Drops_Chest.json");
        fs::write(&path, CHEST).unwrap();

        inspect(&path).unwrap();
        roll(&path, 5, Some(3)).unwrap();
    }

    #[test]
    fn test_missing_container_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("notes.json");
        fs::write(&path, r#"{ "Comment": "none" }"#).unwrap();
        assert!(inspect(&path).is_err());
    }
}
