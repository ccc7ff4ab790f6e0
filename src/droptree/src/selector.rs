//! Weighted selection over a drop tree
//!
//! This is what the `Weight` field means when the game evaluates a drop:
//! a `Choice` draws one child proportionally to the children's weights, a
//! `Multiple` evaluates every child, a `Single` yields its item.

use crate::container::{Container, ContainerKind, ItemRef, TreePath};
use rand::Rng;
use serde_json::Number;
use std::collections::BTreeMap;
use thiserror::Error;

/// Weight assumed for a child with no `Weight` field
pub const DEFAULT_SELECTION_WEIGHT: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {path} has no children to select from")]
pub struct EmptyCompositeError {
    pub path: String,
    pub kind: ContainerKind,
}

/// One item yielded by a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub item_id: String,
    pub quantity: u64,
}

/// A weight that fails validation never gets selected
fn selection_weight(node: &Container) -> f64 {
    match node.weight() {
        Some(weight) if weight.is_finite() && weight >= 0.0 => weight,
        Some(_) => 0.0,
        None => DEFAULT_SELECTION_WEIGHT,
    }
}

/// Selection weights of `children` and their finite sum
///
/// Weights whose sum overflows are divided by the largest one first, which
/// keeps every ratio between siblings.
fn child_weights(children: &[Container]) -> (Vec<f64>, f64) {
    let mut weights: Vec<f64> = children.iter().map(selection_weight).collect();
    let mut total: f64 = weights.iter().sum();

    if total.is_infinite() {
        let largest = weights.iter().copied().fold(0.0, f64::max);
        for weight in &mut weights {
            *weight /= largest;
        }
        total = weights.iter().sum();
    }

    (weights, total)
}

/// Evaluate the tree once
pub fn select<R: Rng + ?Sized>(
    tree: &Container,
    rng: &mut R,
) -> Result<Vec<Outcome>, EmptyCompositeError> {
    let mut outcomes = Vec::new();
    let mut path = TreePath::root();
    select_into(tree, rng, &mut path, &mut outcomes)?;
    Ok(outcomes)
}

fn select_into<R: Rng + ?Sized>(
    node: &Container,
    rng: &mut R,
    path: &mut TreePath,
    outcomes: &mut Vec<Outcome>,
) -> Result<(), EmptyCompositeError> {
    match node {
        Container::Single(single) => {
            outcomes.push(Outcome {
                item_id: single.item.item_id.clone(),
                quantity: roll_quantity(&single.item, rng),
            });
        }
        Container::Choice(choice) => {
            if choice.children.is_empty() {
                return Err(empty(node, path));
            }

            let (weights, total) = child_weights(&choice.children);
            if total <= 0.0 {
                return Ok(());
            }

            let mut roll = rng.gen_range(0.0..total);
            let mut picked = choice.children.len() - 1;
            for (i, &weight) in weights.iter().enumerate() {
                if roll < weight {
                    picked = i;
                    break;
                }
                roll -= weight;
            }

            path.push(picked);
            select_into(&choice.children[picked], rng, path, outcomes)?;
            path.pop();
        }
        Container::Multiple(multiple) => {
            if multiple.children.is_empty() {
                return Err(empty(node, path));
            }

            for (i, child) in multiple.children.iter().enumerate() {
                path.push(i);
                select_into(child, rng, path, outcomes)?;
                path.pop();
            }
        }
    }

    Ok(())
}

fn empty(node: &Container, path: &TreePath) -> EmptyCompositeError {
    EmptyCompositeError {
        path: path.to_string(),
        kind: node.kind(),
    }
}

fn quantity_bound(n: &Number) -> u64 {
    n.as_u64()
        .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))
        .unwrap_or(0)
}

/// Quantity bounds of an item: missing min is 1, missing max is min
pub fn quantity_range(item: &ItemRef) -> (u64, u64) {
    let min = item.quantity_min.as_ref().map(quantity_bound).unwrap_or(1);
    let max = item.quantity_max.as_ref().map(quantity_bound).unwrap_or(min);
    (min.min(max), min.max(max))
}

fn roll_quantity<R: Rng + ?Sized>(item: &ItemRef, rng: &mut R) -> u64 {
    let (min, max) = quantity_range(item);
    if min == max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Expected number of times each item id is yielded per selection
///
/// Quantities are ignored; a zero-weight choice contributes nothing.
pub fn expected_drops(tree: &Container) -> Result<BTreeMap<String, f64>, EmptyCompositeError> {
    let mut expected = BTreeMap::new();
    let mut path = TreePath::root();
    accumulate_expected(tree, 1.0, &mut path, &mut expected)?;
    Ok(expected)
}

fn accumulate_expected(
    node: &Container,
    probability: f64,
    path: &mut TreePath,
    expected: &mut BTreeMap<String, f64>,
) -> Result<(), EmptyCompositeError> {
    match node {
        Container::Single(single) => {
            *expected.entry(single.item.item_id.clone()).or_insert(0.0) += probability;
        }
        Container::Choice(c) | Container::Multiple(c) => {
            if c.children.is_empty() {
                return Err(empty(node, path));
            }

            let (weights, total) = child_weights(&c.children);
            for (i, child) in c.children.iter().enumerate() {
                let share = match node {
                    Container::Choice(_) if total > 0.0 => weights[i] / total,
                    Container::Choice(_) => 0.0,
                    _ => 1.0,
                };
                path.push(i);
                accumulate_expected(child, probability * share, path, expected)?;
                path.pop();
            }
        }
    }

    Ok(())
}
