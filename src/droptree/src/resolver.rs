//! Item asset lookup
//!
//! Injection only wraps a base item in a quality choice when at least one of
//! its quality variants is defined. The resolver answers that question; the
//! transformer treats it as an opaque oracle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The resolver's backing store could not be consulted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("asset resolution unavailable: {reason}")]
pub struct AssetResolutionUnavailable {
    pub reason: String,
}

/// Answers whether an item definition exists
pub trait AssetResolver {
    /// Check whether `item_id` is defined
    ///
    /// Errors mean the answer is unknown, not that the item is missing.
    /// Callers fail open on error.
    fn exists(&self, item_id: &str) -> Result<bool, AssetResolutionUnavailable>;
}

impl<R: AssetResolver + ?Sized> AssetResolver for &R {
    fn exists(&self, item_id: &str) -> Result<bool, AssetResolutionUnavailable> {
        (**self).exists(item_id)
    }
}

impl<R: AssetResolver + ?Sized> AssetResolver for Box<R> {
    fn exists(&self, item_id: &str) -> Result<bool, AssetResolutionUnavailable> {
        (**self).exists(item_id)
    }
}

/// Reports every item as existing
///
/// Used when no item registry is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeAllResolver;

impl AssetResolver for AssumeAllResolver {
    fn exists(&self, _item_id: &str) -> Result<bool, AssetResolutionUnavailable> {
        Ok(true)
    }
}

/// Resolver over a fixed set of item ids
#[derive(Debug, Clone, Default)]
pub struct KnownItemsResolver {
    items: HashSet<String>,
}

impl KnownItemsResolver {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl AssetResolver for KnownItemsResolver {
    fn exists(&self, item_id: &str) -> Result<bool, AssetResolutionUnavailable> {
        Ok(self.items.contains(item_id))
    }
}

/// Item registry laid out as `<ItemId>.json` files
///
/// The directory is indexed once (recursively) when opened. If it does not
/// exist every lookup reports [`AssetResolutionUnavailable`].
#[derive(Debug, Clone)]
pub struct ItemDirectoryResolver {
    root: PathBuf,
    index: Option<KnownItemsResolver>,
}

impl ItemDirectoryResolver {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();

        if !root.is_dir() {
            tracing::warn!(
                "Item directory {} not found; assuming all quality variants exist",
                root.display()
            );
            return Self { root, index: None };
        }

        let index = KnownItemsResolver::new(index_item_ids(&root));
        tracing::debug!(
            "Indexed {} item definitions under {}",
            index.len(),
            root.display()
        );

        Self {
            root,
            index: Some(index),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of indexed definitions, `None` when the directory is missing
    pub fn indexed(&self) -> Option<usize> {
        self.index.as_ref().map(KnownItemsResolver::len)
    }
}

impl AssetResolver for ItemDirectoryResolver {
    fn exists(&self, item_id: &str) -> Result<bool, AssetResolutionUnavailable> {
        match &self.index {
            Some(index) => index.exists(item_id),
            None => Err(AssetResolutionUnavailable {
                reason: format!("item directory {} does not exist", self.root.display()),
            }),
        }
    }
}

/// File stems of every `*.json` under `root`
fn index_item_ids(root: &Path) -> Vec<String> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            e.path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect()
}
