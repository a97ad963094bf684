/// Row conditions for filtering example sets
///
/// A [`Condition`] decides, per example, whether a row belongs to a
/// [`ConditionedExampleSet`](crate::view::ConditionedExampleSet). Conditions
/// are built against an example set (so attribute names are resolved up
/// front) and are immutable afterwards.
///
/// Construction problems (unknown attributes, malformed parameter strings)
/// fail when the condition is built. A row that cannot be evaluated returns
/// [`Error::Evaluation`](crate::Error::Evaluation) from `condition_ok`.
use std::fmt;

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use crate::example::Example;
use crate::example_set::ExampleSet;

mod expression;
mod filter;
mod registry;

pub use expression::{parse_expression, CompareOp, Expr, ExpressionCondition, Literal};
pub use filter::{
    AttributeValueFilter, AttributeValueFilterSingleCondition, Combinator, FilterOperator,
    ValueMatchesCondition,
};
pub use registry::{ConditionFactory, ConditionRegistry};

/// A per-row predicate.
pub trait Condition: fmt::Debug + Send + Sync {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool>;
}

/// Accepts every row.
#[derive(Debug, Clone, Default)]
pub struct AcceptAllCondition;

impl Condition for AcceptAllCondition {
    fn condition_ok(&self, _example: &Example<'_>) -> Result<bool> {
        Ok(true)
    }
}

/// Rows with a missing value in any regular attribute, or (inverted) rows without one.
#[derive(Debug, Clone)]
pub struct MissingAttributesCondition {
    attributes: Vec<Attribute>,
    expect_missing: bool,
}

impl MissingAttributesCondition {
    /// Accepts rows where at least one regular attribute is missing.
    pub fn missing(set: &dyn ExampleSet) -> Self {
        Self::build(set, true)
    }

    /// Accepts rows where no regular attribute is missing.
    pub fn no_missing(set: &dyn ExampleSet) -> Self {
        Self::build(set, false)
    }

    fn build(set: &dyn ExampleSet, expect_missing: bool) -> Self {
        MissingAttributesCondition {
            attributes: set.attributes().regular().cloned().collect(),
            expect_missing,
        }
    }
}

impl Condition for MissingAttributesCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        let any_missing = self.attributes.iter().any(|a| example.is_missing(a));
        Ok(any_missing == self.expect_missing)
    }
}

/// Rows whose label is missing, or (inverted) present.
#[derive(Debug, Clone)]
pub struct MissingLabelCondition {
    label: Attribute,
    expect_missing: bool,
}

impl MissingLabelCondition {
    pub fn missing(set: &dyn ExampleSet) -> Result<Self> {
        Self::build(set, true)
    }

    pub fn no_missing(set: &dyn ExampleSet) -> Result<Self> {
        Self::build(set, false)
    }

    fn build(set: &dyn ExampleSet, expect_missing: bool) -> Result<Self> {
        let label = set
            .attributes()
            .label()
            .cloned()
            .ok_or_else(|| Error::invalid_condition("example set has no label attribute"))?;
        Ok(MissingLabelCondition {
            label,
            expect_missing,
        })
    }
}

impl Condition for MissingLabelCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        Ok(example.is_missing(&self.label) == self.expect_missing)
    }
}

/// Rows whose prediction matches the label, or (inverted) differs from it.
///
/// Rows with a missing label or prediction satisfy neither variant.
#[derive(Debug, Clone)]
pub struct PredictionCondition {
    label: Attribute,
    prediction: Attribute,
    expect_correct: bool,
}

impl PredictionCondition {
    pub fn correct(set: &dyn ExampleSet) -> Result<Self> {
        Self::build(set, true)
    }

    pub fn wrong(set: &dyn ExampleSet) -> Result<Self> {
        Self::build(set, false)
    }

    fn build(set: &dyn ExampleSet, expect_correct: bool) -> Result<Self> {
        let attributes = set.attributes();
        let label = attributes
            .label()
            .cloned()
            .ok_or_else(|| Error::invalid_condition("example set has no label attribute"))?;
        let prediction = attributes.predicted_label().cloned().ok_or_else(|| {
            Error::invalid_condition("example set has no predicted label attribute")
        })?;
        Ok(PredictionCondition {
            label,
            prediction,
            expect_correct,
        })
    }
}

impl Condition for PredictionCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        let label = example.value(&self.label);
        let prediction = example.value(&self.prediction);
        if label.is_nan() || prediction.is_nan() {
            return Ok(false);
        }
        let correct = if self.label.is_nominal() {
            example.nominal_value(&self.label) == example.nominal_value(&self.prediction)
        } else {
            label == prediction
        };
        Ok(correct == self.expect_correct)
    }
}

/// All inner conditions must hold.
#[derive(Debug, Default)]
pub struct AndCondition {
    conditions: Vec<Box<dyn Condition>>,
}

impl AndCondition {
    pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
        AndCondition { conditions }
    }
}

impl Condition for AndCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        for condition in &self.conditions {
            if !condition.condition_ok(example)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// At least one inner condition must hold.
#[derive(Debug, Default)]
pub struct OrCondition {
    conditions: Vec<Box<dyn Condition>>,
}

impl OrCondition {
    pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
        OrCondition { conditions }
    }
}

impl Condition for OrCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        for condition in &self.conditions {
            if condition.condition_ok(example)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
