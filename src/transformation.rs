//! Value transformations attached to an attribute.
//!
//! An attribute's chain is applied oldest first when a value is read and
//! inverted newest first when a value is written. Transformations never
//! fail: an undefined mapping degrades to the missing value (NaN).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use crate::mapping::NominalMapping;

/// Per-attribute replacement values, keyed by attribute name.
pub type ReplacementTable = BTreeMap<String, f64>;

/// A caller-supplied value function applied by a model view.
///
/// `attribute_names` lists the attributes the model rewrites. A model that
/// cannot be inverted keeps the defaults: writes pass the value through.
pub trait ViewModel: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn attribute_names(&self) -> Vec<String>;

    fn transform(&self, attribute: &Attribute, value: f64) -> f64;

    fn is_reversible(&self) -> bool {
        false
    }

    fn inverse_transform(&self, _attribute: &Attribute, value: f64) -> f64 {
        value
    }
}

/// One step of an attribute's transformation chain.
///
/// Remapping steps carry both dictionaries they translate between, so a
/// step keeps its meaning when a later step replaces the attribute's
/// dictionary.
#[derive(Debug, Clone)]
pub enum AttributeTransformation {
    /// Re-express an index of `base` as the index of the same string in `overlay`.
    Remapping {
        base: NominalMapping,
        overlay: NominalMapping,
    },
    /// The attribute's dictionary was replaced; incoming values index
    /// `old_mapping` and are translated into `new_mapping`.
    FullRemapping {
        old_mapping: NominalMapping,
        new_mapping: NominalMapping,
    },
    /// Substitute missing values with the attribute's entry in the table.
    ReplaceMissing { replacements: Arc<ReplacementTable> },
    /// Scale numeric values by a per-attribute weight.
    Weighting { weight: f64 },
    /// Apply a [`ViewModel`].
    Model { model: Arc<dyn ViewModel> },
}

impl AttributeTransformation {
    pub fn remapping(base: NominalMapping, overlay: NominalMapping) -> Self {
        AttributeTransformation::Remapping { base, overlay }
    }

    pub fn full_remapping(old_mapping: NominalMapping, new_mapping: NominalMapping) -> Self {
        AttributeTransformation::FullRemapping {
            old_mapping,
            new_mapping,
        }
    }

    pub fn replace_missing(replacements: Arc<ReplacementTable>) -> Self {
        AttributeTransformation::ReplaceMissing { replacements }
    }

    pub fn weighting(weight: f64) -> Self {
        AttributeTransformation::Weighting { weight }
    }

    pub fn model(model: Arc<dyn ViewModel>) -> Self {
        AttributeTransformation::Model { model }
    }

    /// Short name used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeTransformation::Remapping { .. } => "remapping",
            AttributeTransformation::FullRemapping { .. } => "full remapping",
            AttributeTransformation::ReplaceMissing { .. } => "replace missing",
            AttributeTransformation::Weighting { .. } => "weighting",
            AttributeTransformation::Model { .. } => "model",
        }
    }

    pub fn is_reversible(&self) -> bool {
        match self {
            AttributeTransformation::ReplaceMissing { .. } => false,
            AttributeTransformation::Model { model } => model.is_reversible(),
            _ => true,
        }
    }

    /// Check that this transformation may be attached to `attribute`.
    pub(crate) fn check_compatible(&self, attribute: &Attribute) -> Result<()> {
        let reason = match self {
            AttributeTransformation::Remapping { .. }
            | AttributeTransformation::FullRemapping { .. }
                if !attribute.is_nominal() =>
            {
                Some("remapping needs a nominal index domain")
            }
            AttributeTransformation::Weighting { .. } if !attribute.is_numerical() => {
                Some("only numerical attributes can be weighted")
            }
            _ => None,
        };
        match reason {
            Some(reason) => Err(Error::InvalidTransformation {
                transformation: self.kind(),
                attribute: attribute.name().to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Map a stored (or partially transformed) value to the value seen by readers.
    pub fn transform(&self, attribute: &Attribute, value: f64) -> f64 {
        match self {
            AttributeTransformation::Remapping { base, overlay } => translate(value, base, overlay),
            AttributeTransformation::FullRemapping {
                old_mapping,
                new_mapping,
            } => translate(value, old_mapping, new_mapping),
            AttributeTransformation::ReplaceMissing { replacements } => {
                if value.is_nan() {
                    replacements
                        .get(attribute.name())
                        .copied()
                        .unwrap_or(value)
                } else {
                    value
                }
            }
            AttributeTransformation::Weighting { weight } => {
                if attribute.is_numerical() {
                    value * weight
                } else {
                    value
                }
            }
            AttributeTransformation::Model { model } => model.transform(attribute, value),
        }
    }

    /// Undo [`transform`](Self::transform). Irreversible steps return `value` unchanged.
    pub fn inverse_transform(&self, attribute: &Attribute, value: f64) -> f64 {
        match self {
            AttributeTransformation::Remapping { base, overlay } => translate(value, overlay, base),
            AttributeTransformation::FullRemapping {
                old_mapping,
                new_mapping,
            } => translate(value, new_mapping, old_mapping),
            AttributeTransformation::ReplaceMissing { .. } => value,
            AttributeTransformation::Weighting { weight } => {
                if !attribute.is_numerical() {
                    value
                } else if *weight == 0.0 {
                    f64::NAN
                } else {
                    value / weight
                }
            }
            AttributeTransformation::Model { model } => model.inverse_transform(attribute, value),
        }
    }
}

impl PartialEq for AttributeTransformation {
    fn eq(&self, other: &Self) -> bool {
        use AttributeTransformation::*;
        match (self, other) {
            (Remapping { base: a, overlay: b }, Remapping { base: c, overlay: d }) => a == c && b == d,
            (
                FullRemapping {
                    old_mapping: a,
                    new_mapping: b,
                },
                FullRemapping {
                    old_mapping: c,
                    new_mapping: d,
                },
            ) => a == c && b == d,
            (ReplaceMissing { replacements: a }, ReplaceMissing { replacements: b }) => a == b,
            (Weighting { weight: a }, Weighting { weight: b }) => a == b,
            (Model { model: a }, Model { model: b }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Look up the string behind `value` in `from` and return its index in `to`.
fn translate(value: f64, from: &NominalMapping, to: &NominalMapping) -> f64 {
    from.map_value(value)
        .and_then(|s| to.index_of(s))
        .map_or(f64::NAN, |index| index as f64)
}
