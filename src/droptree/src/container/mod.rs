//! Drop container trees
//!
//! A drop tree is built from three node types:
//! - `Single`: a leaf yielding one item reference
//! - `Choice`: exactly one child is drawn, weighted by the children's weights
//! - `Multiple`: every child is evaluated independently
//!
//! Trees are parsed from and serialized to the JSON shape used by the game's
//! drop files (see [`wire`]). Transformations are pure: they consume a tree
//! and return a new one.

mod stats;
mod wire;

pub use stats::TreeStats;
pub use wire::{Malformation, MalformedTreeError, MAX_EXACT_WEIGHT};

use crate::quality::{split_quality_suffix, Quality};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Keys a node or item carried that the engine does not model
pub type Extra = Map<String, Value>;

/// Node type tag as written in the `Type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Single,
    Choice,
    Multiple,
}

impl ContainerKind {
    pub const fn tag(self) -> &'static str {
        match self {
            ContainerKind::Single => "Single",
            ContainerKind::Choice => "Choice",
            ContainerKind::Multiple => "Multiple",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ContainerKind> {
        match tag {
            "Single" => Some(ContainerKind::Single),
            "Choice" => Some(ContainerKind::Choice),
            "Multiple" => Some(ContainerKind::Multiple),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Item reference held by a `Single` node
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRef {
    pub item_id: String,
    /// Copied verbatim from the source document
    pub quantity_min: Option<Number>,
    pub quantity_max: Option<Number>,
    pub extra: Extra,
}

impl ItemRef {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            quantity_min: None,
            quantity_max: None,
            extra: Extra::new(),
        }
    }

    pub fn with_quantity(mut self, min: impl Into<Number>, max: impl Into<Number>) -> Self {
        self.quantity_min = Some(min.into());
        self.quantity_max = Some(max.into());
        self
    }

    /// Quality encoded in the id suffix, if any
    pub fn quality(&self) -> Option<Quality> {
        split_quality_suffix(&self.item_id).map(|(_, q)| q)
    }

    /// Same reference pointing at another id, keeping quantities and extras
    pub fn retarget(&self, item_id: String) -> Self {
        Self {
            item_id,
            quantity_min: self.quantity_min.clone(),
            quantity_max: self.quantity_max.clone(),
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Single {
    pub item: ItemRef,
    pub weight: Option<f64>,
    pub extra: Extra,
}

impl Single {
    pub fn new(item: ItemRef, weight: Option<f64>) -> Self {
        Self {
            item,
            weight,
            extra: Extra::new(),
        }
    }
}

/// Body shared by `Choice` and `Multiple`
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub children: Vec<Container>,
    pub weight: Option<f64>,
    pub extra: Extra,
}

impl Composite {
    pub fn new(children: Vec<Container>, weight: Option<f64>) -> Self {
        Self {
            children,
            weight,
            extra: Extra::new(),
        }
    }
}

/// A node in a drop tree
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Single(Single),
    Choice(Composite),
    Multiple(Composite),
}

/// Position of a node, as child indices from the root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePath(Vec<usize>);

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Number of edges from the root
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Container")?;
        for index in &self.0 {
            write!(f, ".Containers[{}]", index)?;
        }
        Ok(())
    }
}

/// What [`Container::transform`] does after visiting a node
#[derive(Debug)]
pub enum Visit {
    /// Keep this node and continue into its children
    Descend(Container),
    /// Use this node as the result; its subtree is not visited
    Replace(Container),
}

impl Container {
    pub fn single(item: ItemRef, weight: Option<f64>) -> Self {
        Container::Single(Single::new(item, weight))
    }

    pub fn choice(children: Vec<Container>, weight: Option<f64>) -> Self {
        Container::Choice(Composite::new(children, weight))
    }

    pub fn multiple(children: Vec<Container>, weight: Option<f64>) -> Self {
        Container::Multiple(Composite::new(children, weight))
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Single(_) => ContainerKind::Single,
            Container::Choice(_) => ContainerKind::Choice,
            Container::Multiple(_) => ContainerKind::Multiple,
        }
    }

    pub fn weight(&self) -> Option<f64> {
        match self {
            Container::Single(s) => s.weight,
            Container::Choice(c) | Container::Multiple(c) => c.weight,
        }
    }

    /// Children of a composite; empty for `Single`
    pub fn children(&self) -> &[Container] {
        match self {
            Container::Single(_) => &[],
            Container::Choice(c) | Container::Multiple(c) => &c.children,
        }
    }

    /// Item of a `Single`
    pub fn item(&self) -> Option<&ItemRef> {
        match self {
            Container::Single(s) => Some(&s.item),
            _ => None,
        }
    }

    /// Rebuild the tree top-down
    ///
    /// `visit` sees every original node before its children. Returning
    /// [`Visit::Replace`] installs the returned node without visiting it, so
    /// a freshly built subtree is never treated as source data.
    pub fn transform<E, F>(self, visit: &mut F) -> Result<Container, E>
    where
        F: FnMut(Container, &TreePath) -> Result<Visit, E>,
    {
        let mut path = TreePath::root();
        self.transform_at(&mut path, visit)
    }

    fn transform_at<E, F>(self, path: &mut TreePath, visit: &mut F) -> Result<Container, E>
    where
        F: FnMut(Container, &TreePath) -> Result<Visit, E>,
    {
        match visit(self, path)? {
            Visit::Replace(node) => Ok(node),
            Visit::Descend(Container::Choice(c)) => {
                Ok(Container::Choice(c.transform_children(path, visit)?))
            }
            Visit::Descend(Container::Multiple(c)) => {
                Ok(Container::Multiple(c.transform_children(path, visit)?))
            }
            Visit::Descend(single) => Ok(single),
        }
    }

    /// Visit every node in pre-order
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Container, &TreePath),
    {
        let mut path = TreePath::root();
        self.walk_at(&mut path, visit);
    }

    fn walk_at<F>(&self, path: &mut TreePath, visit: &mut F)
    where
        F: FnMut(&Container, &TreePath),
    {
        visit(self, path);
        for (i, child) in self.children().iter().enumerate() {
            path.push(i);
            child.walk_at(path, visit);
            path.pop();
        }
    }

    /// Check the structural invariants transformations rely on
    ///
    /// Composites must have at least one child and weights must be
    /// non-negative. Parsing accepts trees that break these rules so they can
    /// be round-tripped; transformations refuse them.
    pub fn validate(&self) -> Result<(), MalformedTreeError> {
        let mut path = TreePath::root();
        self.validate_at(&mut path)
    }

    fn validate_at(&self, path: &mut TreePath) -> Result<(), MalformedTreeError> {
        if let Some(weight) = self.weight() {
            if weight < 0.0 || !weight.is_finite() {
                return Err(MalformedTreeError::at(
                    path,
                    Malformation::InvalidWeight(weight),
                ));
            }
        }

        if let Container::Choice(c) | Container::Multiple(c) = self {
            if c.children.is_empty() {
                return Err(MalformedTreeError::at(
                    path,
                    Malformation::EmptyComposite(self.kind()),
                ));
            }
        }

        for (i, child) in self.children().iter().enumerate() {
            path.push(i);
            child.validate_at(path)?;
            path.pop();
        }

        Ok(())
    }
}

impl Composite {
    fn transform_children<E, F>(self, path: &mut TreePath, visit: &mut F) -> Result<Composite, E>
    where
        F: FnMut(Container, &TreePath) -> Result<Visit, E>,
    {
        let Composite {
            children,
            weight,
            extra,
        } = self;

        let mut rebuilt = Vec::with_capacity(children.len());
        for (i, child) in children.into_iter().enumerate() {
            path.push(i);
            let node = child.transform_at(path, visit);
            path.pop();
            rebuilt.push(node?);
        }

        Ok(Composite {
            children: rebuilt,
            weight,
            extra,
        })
    }
}
