//! JSON form of drop containers
//!
//! ```json
//! { "Type": "Choice", "Weight": 10,
//!   "Containers": [
//!     { "Type": "Single", "Weight": 40,
//!       "Item": { "ItemId": "Weapon_Sword_Common", "QuantityMin": 1, "QuantityMax": 1 } }
//!   ] }
//! ```
//!
//! Unknown keys are kept in each node's `extra` map and written back after
//! the modelled fields. `null` for an optional field reads as absent.
//!
//! Weights are held as `f64`. Integral weights are written back as integers,
//! and integer weights above [`MAX_EXACT_WEIGHT`] are rejected on read since
//! they would not come back unchanged.

use super::{Composite, Container, ContainerKind, Extra, ItemRef, Single, TreePath};
use serde_json::{Map, Number, Value};
use thiserror::Error;

const NODE_KEYS: &[&str] = &["Type", "Weight", "Containers", "Item"];
const ITEM_KEYS: &[&str] = &["ItemId", "QuantityMin", "QuantityMax"];

/// Largest integer weight stored exactly (2^53)
pub const MAX_EXACT_WEIGHT: u64 = 1 << 53;

/// Structural schema violation in a drop tree
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed drop tree at {path}: {reason}")]
pub struct MalformedTreeError {
    /// Location of the offending node, e.g. `Container.Containers[2].Item`
    pub path: String,
    pub reason: Malformation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Malformation {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing `Type`")]
    MissingType,

    #[error("unrecognized container type {0}")]
    UnknownType(String),

    #[error("{0} node is missing `Containers`")]
    MissingContainers(ContainerKind),

    #[error("`Containers` is not an array")]
    ContainersNotArray,

    #[error("Single node is missing `Item`")]
    MissingItem,

    #[error("`ItemId` is missing or not a string")]
    MissingItemId,

    #[error("`{0}` is not a number")]
    NotANumber(&'static str),

    #[error("weight {0} is negative or not finite")]
    InvalidWeight(f64),

    #[error("integer weight {0} is larger than 2^53")]
    WeightTooLarge(u64),

    #[error("{0} node has no children")]
    EmptyComposite(ContainerKind),
}

impl MalformedTreeError {
    pub(crate) fn at(path: &TreePath, reason: Malformation) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }

    fn at_field(path: &TreePath, field: &str, reason: Malformation) -> Self {
        Self {
            path: format!("{}.{}", path, field),
            reason,
        }
    }
}

impl Container {
    /// Parse a node (and its subtree) from JSON
    pub fn from_value(value: &Value) -> Result<Container, MalformedTreeError> {
        let mut path = TreePath::root();
        parse_node(value, &mut path)
    }

    /// Serialize the subtree to JSON
    pub fn to_value(&self) -> Value {
        let (weight, extra) = match self {
            Container::Single(s) => (s.weight, &s.extra),
            Container::Choice(c) | Container::Multiple(c) => (c.weight, &c.extra),
        };

        let mut obj = Map::new();
        obj.insert("Type".into(), Value::from(self.kind().tag()));
        if let Some(weight) = weight {
            obj.insert("Weight".into(), weight_value(weight));
        }

        match self {
            Container::Single(s) => {
                obj.insert("Item".into(), item_value(&s.item));
            }
            Container::Choice(c) | Container::Multiple(c) => {
                let children = c.children.iter().map(Container::to_value).collect();
                obj.insert("Containers".into(), Value::Array(children));
            }
        }

        append_extra(&mut obj, extra);
        Value::Object(obj)
    }
}

fn parse_node(value: &Value, path: &mut TreePath) -> Result<Container, MalformedTreeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| MalformedTreeError::at(path, Malformation::NotAnObject))?;

    let kind = match obj.get("Type") {
        None | Some(Value::Null) => {
            return Err(MalformedTreeError::at(path, Malformation::MissingType))
        }
        Some(Value::String(tag)) => ContainerKind::from_tag(tag).ok_or_else(|| {
            MalformedTreeError::at(path, Malformation::UnknownType(format!("\"{}\"", tag)))
        })?,
        Some(other) => {
            return Err(MalformedTreeError::at(
                path,
                Malformation::UnknownType(other.to_string()),
            ))
        }
    };

    let weight = parse_weight(obj, path)?;
    let extra = collect_extra(obj, NODE_KEYS);

    match kind {
        ContainerKind::Single => {
            let item = match obj.get("Item") {
                None | Some(Value::Null) => {
                    return Err(MalformedTreeError::at(path, Malformation::MissingItem))
                }
                Some(item) => parse_item(item, path)?,
            };
            Ok(Container::Single(Single {
                item,
                weight,
                extra,
            }))
        }
        ContainerKind::Choice | ContainerKind::Multiple => {
            let list = match obj.get("Containers") {
                None | Some(Value::Null) => {
                    return Err(MalformedTreeError::at(
                        path,
                        Malformation::MissingContainers(kind),
                    ))
                }
                Some(Value::Array(list)) => list,
                Some(_) => {
                    return Err(MalformedTreeError::at_field(
                        path,
                        "Containers",
                        Malformation::ContainersNotArray,
                    ))
                }
            };

            let mut children = Vec::with_capacity(list.len());
            for (i, child) in list.iter().enumerate() {
                path.push(i);
                let node = parse_node(child, path);
                path.pop();
                children.push(node?);
            }

            let body = Composite {
                children,
                weight,
                extra,
            };
            Ok(match kind {
                ContainerKind::Choice => Container::Choice(body),
                _ => Container::Multiple(body),
            })
        }
    }
}

fn parse_weight(obj: &Map<String, Value>, path: &TreePath) -> Result<Option<f64>, MalformedTreeError> {
    match obj.get("Weight") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            let weight = n.as_f64().unwrap_or(f64::NAN);
            if weight < 0.0 || !weight.is_finite() {
                return Err(MalformedTreeError::at_field(
                    path,
                    "Weight",
                    Malformation::InvalidWeight(weight),
                ));
            }
            match n.as_u64() {
                Some(whole) if whole > MAX_EXACT_WEIGHT => Err(MalformedTreeError::at_field(
                    path,
                    "Weight",
                    Malformation::WeightTooLarge(whole),
                )),
                _ => Ok(Some(weight)),
            }
        }
        Some(_) => Err(MalformedTreeError::at_field(
            path,
            "Weight",
            Malformation::NotANumber("Weight"),
        )),
    }
}

fn parse_item(value: &Value, path: &TreePath) -> Result<ItemRef, MalformedTreeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| MalformedTreeError::at_field(path, "Item", Malformation::NotAnObject))?;

    let item_id = obj
        .get("ItemId")
        .and_then(Value::as_str)
        .ok_or_else(|| MalformedTreeError::at_field(path, "Item", Malformation::MissingItemId))?;

    Ok(ItemRef {
        item_id: item_id.to_string(),
        quantity_min: parse_quantity(obj, "QuantityMin", path)?,
        quantity_max: parse_quantity(obj, "QuantityMax", path)?,
        extra: collect_extra(obj, ITEM_KEYS),
    })
}

fn parse_quantity(
    obj: &Map<String, Value>,
    key: &'static str,
    path: &TreePath,
) -> Result<Option<Number>, MalformedTreeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(MalformedTreeError::at_field(
            path,
            "Item",
            Malformation::NotANumber(key),
        )),
    }
}

fn item_value(item: &ItemRef) -> Value {
    let mut obj = Map::new();
    obj.insert("ItemId".into(), Value::from(item.item_id.as_str()));
    if let Some(min) = &item.quantity_min {
        obj.insert("QuantityMin".into(), Value::Number(min.clone()));
    }
    if let Some(max) = &item.quantity_max {
        obj.insert("QuantityMax".into(), Value::Number(max.clone()));
    }
    append_extra(&mut obj, &item.extra);
    Value::Object(obj)
}

/// Integral weights are written as integers (`40`, not `40.0`)
pub(crate) fn weight_value(weight: f64) -> Value {
    if weight.fract() == 0.0 && weight.abs() <= MAX_EXACT_WEIGHT as f64 {
        Value::from(weight as i64)
    } else {
        Number::from_f64(weight).map_or(Value::Null, Value::Number)
    }
}

fn collect_extra(obj: &Map<String, Value>, known: &[&str]) -> Extra {
    obj.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn append_extra(obj: &mut Map<String, Value>, extra: &Extra) {
    for (key, value) in extra {
        obj.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single() {
        let tree = Container::from_value(&json!({
            "Type": "Single",
            "Weight": 40,
            "Item": { "ItemId": "Weapon_Sword_Common", "QuantityMin": 1, "QuantityMax": 2 }
        }))
        .unwrap();

        let Container::Single(single) = tree else {
            panic!("expected Single");
        };
        assert_eq!(single.weight, Some(40.0));
        assert_eq!(single.item.item_id, "Weapon_Sword_Common");
        assert_eq!(single.item.quantity_min, Some(Number::from(1)));
        assert_eq!(single.item.quantity_max, Some(Number::from(2)));
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let source = json!({
            "Type": "Multiple",
            "Containers": [
                { "Type": "Single", "Weight": 0.5,
                  "Item": { "ItemId": "Ore_Copper", "QuantityMin": 2, "QuantityMax": 6 } },
                { "Type": "Choice", "Weight": 12,
                  "Containers": [
                    { "Type": "Single", "Weight": 0,
                      "Item": { "ItemId": "Weapon_Sword_Rare", "Metadata": { "Durability": 0.75 } } }
                  ] }
            ]
        });

        let tree = Container::from_value(&source).unwrap();
        assert_eq!(tree.to_value(), source);
    }

    #[test]
    fn test_round_trip_keeps_unknown_keys() {
        let source = json!({
            "Type": "Choice",
            "RollsMin": 1,
            "Containers": [
                { "Type": "Single", "Item": { "ItemId": "Food_Bread" }, "Comment": "filler" }
            ]
        });
        let tree = Container::from_value(&source).unwrap();
        assert_eq!(tree.to_value(), source);
    }

    #[test]
    fn test_null_weight_reads_as_absent() {
        let tree = Container::from_value(&json!({
            "Type": "Single", "Weight": null, "Item": { "ItemId": "Food_Bread" }
        }))
        .unwrap();
        assert_eq!(tree.weight(), None);
        assert!(tree.to_value().get("Weight").is_none());
    }

    #[test]
    fn test_unknown_type() {
        let err = Container::from_value(&json!({
            "Type": "Multiple",
            "Containers": [ { "Type": "Droplist", "DroplistId": "Zone1" } ]
        }))
        .unwrap_err();
        assert_eq!(err.path, "Container.Containers[0]");
        assert_eq!(err.reason, Malformation::UnknownType("\"Droplist\"".into()));
    }

    #[test]
    fn test_missing_containers() {
        let err = Container::from_value(&json!({ "Type": "Choice", "Weight": 3 })).unwrap_err();
        assert_eq!(err.path, "Container");
        assert_eq!(
            err.reason,
            Malformation::MissingContainers(ContainerKind::Choice)
        );
    }

    #[test]
    fn test_missing_item() {
        let err = Container::from_value(&json!({
            "Type": "Choice",
            "Containers": [
                { "Type": "Single", "Item": { "ItemId": "Food_Bread" } },
                { "Type": "Single", "Weight": 1 }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.path, "Container.Containers[1]");
        assert_eq!(err.reason, Malformation::MissingItem);
    }

    #[test]
    fn test_missing_item_id() {
        let err = Container::from_value(&json!({
            "Type": "Single", "Item": { "QuantityMin": 1 }
        }))
        .unwrap_err();
        assert_eq!(err.path, "Container.Item");
        assert_eq!(err.reason, Malformation::MissingItemId);
    }

    #[test]
    fn test_bad_weight() {
        let err = Container::from_value(&json!({
            "Type": "Single", "Weight": "heavy", "Item": { "ItemId": "Food_Bread" }
        }))
        .unwrap_err();
        assert_eq!(err.path, "Container.Weight");
        assert_eq!(err.reason, Malformation::NotANumber("Weight"));

        let err = Container::from_value(&json!({
            "Type": "Single", "Weight": -2, "Item": { "ItemId": "Food_Bread" }
        }))
        .unwrap_err();
        assert_eq!(err.reason, Malformation::InvalidWeight(-2.0));
    }

    #[test]
    fn test_large_integer_weight() {
        let err = Container::from_value(&json!({
            "Type": "Choice",
            "Containers": [
                { "Type": "Single", "Weight": 9007199254740993_u64, "Item": { "ItemId": "Food_Bread" } }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.path, "Container.Containers[0].Weight");
        assert_eq!(err.reason, Malformation::WeightTooLarge(9007199254740993));
        assert_eq!(
            err.to_string(),
            "malformed drop tree at Container.Containers[0].Weight: \
             integer weight 9007199254740993 is larger than 2^53"
        );

        for weight in [json!(MAX_EXACT_WEIGHT), json!(1e300), json!(1e16)] {
            let source = json!({
                "Type": "Single", "Weight": weight, "Item": { "ItemId": "Food_Bread" }
            });
            let tree = Container::from_value(&source).unwrap();
            assert_eq!(tree.to_value(), source);
        }
    }

    #[test]
    fn test_empty_composite_parses() {
        // parsing keeps it so the file can be reported; validate() rejects it
        let tree = Container::from_value(&json!({ "Type": "Choice", "Containers": [] })).unwrap();
        assert!(tree.children().is_empty());
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_error_message() {
        let err = Container::from_value(&json!({ "Type": "Single" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed drop tree at Container: Single node is missing `Item`"
        );
    }

    #[test]
    fn test_weight_value() {
        assert_eq!(weight_value(40.0), json!(40));
        assert_eq!(weight_value(0.5), json!(0.5));
        assert_eq!(weight_value(0.0), json!(0));
        assert_eq!(weight_value(9007199254740992.0), json!(9007199254740992_u64));
        assert_eq!(weight_value(1e16), json!(1e16));
    }
}
