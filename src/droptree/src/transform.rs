//! Drop tree transformations
//!
//! Two independent passes, both idempotent:
//! - [`inject_quality_choices`] wraps base weapon/armor/tool leaves in a
//!   `Choice` over their quality variants
//! - [`rebalance_weights`] rewrites the weight of every quality-variant leaf
//!   from a tier's row in the [`WeightTable`]
//!
//! Both validate the tree before and after the pass and fail the whole tree
//! on a structural problem, so callers never write out a half-transformed
//! file or one carrying a weight the parser would reject.

use crate::container::{Composite, Container, MalformedTreeError, Single, TreePath, Visit};
use crate::quality::{has_quality_suffix, Quality, CATEGORY_PREFIXES, QUALITIES};
use crate::resolver::AssetResolver;
use crate::tables::{QualityWeights, Tier, UnknownTierError, WeightTable, DEFAULT_QUALITY_WEIGHTS};
use std::collections::HashMap;
use thiserror::Error;

/// Ids that match a category prefix but never get quality variants
/// (ammunition, repair kits)
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &["Weapon_Arrow", "Tool_Repair_Kit"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error(transparent)]
    Malformed(#[from] MalformedTreeError),

    #[error(transparent)]
    UnknownTier(#[from] UnknownTierError),

    #[error("quality list is empty; injection would produce empty choices")]
    EmptyQualityList,
}

/// Settings for [`inject_quality_choices`]
#[derive(Debug, Clone, PartialEq)]
pub struct InjectOptions {
    /// Variants to generate, in child order
    pub qualities: Vec<Quality>,
    /// Weight given to each generated variant
    pub weights: QualityWeights,
    /// Only ids starting with one of these are candidates
    pub category_prefixes: Vec<String>,
    /// Candidates starting with one of these are left alone
    pub skip_prefixes: Vec<String>,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            qualities: QUALITIES.to_vec(),
            weights: DEFAULT_QUALITY_WEIGHTS,
            category_prefixes: CATEGORY_PREFIXES.iter().map(|s| s.to_string()).collect(),
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What an injection pass did to one tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectReport {
    /// Leaves replaced by quality choices
    pub replaced: usize,
    /// Candidate leaves excluded by the skip list
    pub skipped: usize,
    /// Candidate leaves with no quality variant defined
    pub missing_variants: usize,
    /// The resolver could not be consulted and the pass failed open
    pub resolver_unavailable: bool,
}

impl InjectReport {
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

/// What a rebalance pass did to one tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceReport {
    /// Quality-variant leaves visited
    pub variants: usize,
    /// Leaves whose weight actually changed
    pub changed: usize,
}

impl RebalanceReport {
    pub fn changed(&self) -> bool {
        self.changed > 0
    }
}

/// Why a leaf was or was not injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eligibility {
    Inject,
    NotEquipment,
    AlreadyQualified,
    Skipped,
    NoVariants,
}

struct Injector<'a, R: ?Sized> {
    resolver: &'a R,
    options: &'a InjectOptions,
    /// variant id -> exists
    known: HashMap<String, bool>,
    report: InjectReport,
}

impl<R: AssetResolver + ?Sized> Injector<'_, R> {
    fn visit(&mut self, node: Container, path: &TreePath) -> Visit {
        let Container::Single(single) = node else {
            return Visit::Descend(node);
        };

        match self.eligibility(&single.item.item_id) {
            Eligibility::Inject => {
                tracing::debug!(
                    "{}: {} -> {} quality variants",
                    path,
                    single.item.item_id,
                    self.options.qualities.len()
                );
                self.report.replaced += 1;
                Visit::Replace(self.quality_choice(single))
            }
            Eligibility::Skipped => {
                self.report.skipped += 1;
                Visit::Replace(Container::Single(single))
            }
            Eligibility::NoVariants => {
                tracing::debug!("{}: no quality variants for {}", path, single.item.item_id);
                self.report.missing_variants += 1;
                Visit::Replace(Container::Single(single))
            }
            Eligibility::NotEquipment | Eligibility::AlreadyQualified => {
                Visit::Replace(Container::Single(single))
            }
        }
    }

    fn eligibility(&mut self, item_id: &str) -> Eligibility {
        let options = self.options;

        if !options
            .category_prefixes
            .iter()
            .any(|p| item_id.starts_with(p.as_str()))
        {
            return Eligibility::NotEquipment;
        }
        if has_quality_suffix(item_id) {
            return Eligibility::AlreadyQualified;
        }
        if options
            .skip_prefixes
            .iter()
            .any(|p| item_id.starts_with(p.as_str()))
        {
            return Eligibility::Skipped;
        }

        let has_variant = options
            .qualities
            .iter()
            .any(|q| self.variant_exists(&q.variant_id(item_id)));

        if has_variant {
            Eligibility::Inject
        } else {
            Eligibility::NoVariants
        }
    }

    fn variant_exists(&mut self, variant_id: &str) -> bool {
        if let Some(&exists) = self.known.get(variant_id) {
            return exists;
        }

        let exists = match self.resolver.exists(variant_id) {
            Ok(exists) => exists,
            Err(err) => {
                if !self.report.resolver_unavailable {
                    tracing::warn!("{}; assuming quality variants exist", err);
                }
                self.report.resolver_unavailable = true;
                true
            }
        };

        self.known.insert(variant_id.to_string(), exists);
        exists
    }

    /// Replacement for an eligible leaf
    ///
    /// The leaf's weight moves to the new choice; each variant gets the
    /// configured quality weight and the leaf's quantities.
    fn quality_choice(&self, single: Single) -> Container {
        let Single {
            item,
            weight,
            extra,
        } = single;

        let children = self
            .options
            .qualities
            .iter()
            .map(|q| {
                let variant = item.retarget(q.variant_id(&item.item_id));
                Container::single(variant, Some(self.options.weights.get(*q)))
            })
            .collect();

        Container::Choice(Composite {
            children,
            weight,
            extra,
        })
    }
}

/// Replace eligible base-item leaves with a `Choice` over their quality variants
///
/// A `Single` leaf is replaced when its id starts with a category prefix,
/// has no quality suffix yet, is not on the skip list, and the resolver
/// reports at least one of its variants. Generated children already carry
/// a quality suffix, so running the pass again changes nothing.
pub fn inject_quality_choices<R: AssetResolver + ?Sized>(
    tree: Container,
    resolver: &R,
    options: &InjectOptions,
) -> Result<(Container, InjectReport), TransformError> {
    if options.qualities.is_empty() {
        return Err(TransformError::EmptyQualityList);
    }
    tree.validate()?;

    let mut injector = Injector {
        resolver,
        options,
        known: HashMap::new(),
        report: InjectReport::default(),
    };

    let tree = tree.transform(&mut |node, path| {
        Ok::<_, TransformError>(injector.visit(node, path))
    })?;
    tree.validate()?;

    Ok((tree, injector.report))
}

/// Overwrite every quality-variant leaf's weight with the tier's table value
///
/// Composite weights are left alone. The result depends only on the tier and
/// each leaf's quality, never on the previous weight.
pub fn rebalance_weights(
    tree: Container,
    tier: Tier,
    table: &WeightTable,
) -> Result<(Container, RebalanceReport), TransformError> {
    let row = table.row(tier)?;
    tree.validate()?;

    let mut report = RebalanceReport::default();
    let tree = tree.transform(&mut |node, _path| {
        Ok::<_, TransformError>(match node {
            Container::Single(mut single) => {
                if let Some(quality) = single.item.quality() {
                    let weight = row.get(quality);
                    report.variants += 1;
                    if single.weight != Some(weight) {
                        report.changed += 1;
                        single.weight = Some(weight);
                    }
                }
                Visit::Replace(Container::Single(single))
            }
            composite => Visit::Descend(composite),
        })
    })?;
    tree.validate()?;

    Ok((tree, report))
}
