//! Named condition factories.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::example_set::ExampleSet;

use super::{
    AcceptAllCondition, AttributeValueFilter, Condition, ExpressionCondition,
    MissingAttributesCondition, MissingLabelCondition, PredictionCondition, ValueMatchesCondition,
};

/// Builds a condition for an example set from a parameter string.
pub type ConditionFactory = fn(&dyn ExampleSet, &str) -> Result<Box<dyn Condition>>;

/// Maps condition tags to factories.
///
/// There is no global registry; callers create one (usually
/// [`ConditionRegistry::with_builtin`]) and add their own factories.
#[derive(Clone)]
pub struct ConditionRegistry {
    factories: BTreeMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    /// A registry without any factories.
    pub fn new() -> Self {
        ConditionRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the built-in conditions:
    ///
    /// | tag | parameter |
    /// |-----|-----------|
    /// | `all` | ignored |
    /// | `missing_attributes`, `no_missing_attributes` | ignored |
    /// | `missing_labels`, `no_missing_labels` | ignored |
    /// | `correct_predictions`, `wrong_predictions` | ignored |
    /// | `attribute_value_filter` | `age > 30 && city = Bonn` |
    /// | `value_matches` | `city:B.*` |
    /// | `expression` | `age > 30 AND NOT city = 'Bonn'` |
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("all", |_, _| Ok(Box::new(AcceptAllCondition)));
        registry.register("missing_attributes", |set, _| {
            Ok(Box::new(MissingAttributesCondition::missing(set)))
        });
        registry.register("no_missing_attributes", |set, _| {
            Ok(Box::new(MissingAttributesCondition::no_missing(set)))
        });
        registry.register("missing_labels", |set, _| {
            Ok(Box::new(MissingLabelCondition::missing(set)?))
        });
        registry.register("no_missing_labels", |set, _| {
            Ok(Box::new(MissingLabelCondition::no_missing(set)?))
        });
        registry.register("correct_predictions", |set, _| {
            Ok(Box::new(PredictionCondition::correct(set)?))
        });
        registry.register("wrong_predictions", |set, _| {
            Ok(Box::new(PredictionCondition::wrong(set)?))
        });
        registry.register("attribute_value_filter", |set, parameter| {
            Ok(Box::new(AttributeValueFilter::parse(set, parameter)?))
        });
        registry.register("value_matches", |set, parameter| {
            Ok(Box::new(ValueMatchesCondition::parse(set, parameter)?))
        });
        registry.register("expression", |set, parameter| {
            Ok(Box::new(ExpressionCondition::new(set, parameter)?))
        });
        registry
    }

    /// Register `factory` under `tag`, returning any factory it replaces.
    pub fn register(&mut self, tag: &str, factory: ConditionFactory) -> Option<ConditionFactory> {
        self.factories.insert(tag.to_string(), factory)
    }

    /// Build the condition registered under `tag`.
    pub fn create(
        &self,
        tag: &str,
        set: &dyn ExampleSet,
        parameter: &str,
    ) -> Result<Box<dyn Condition>> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| Error::UnknownCondition {
                tag: tag.to_string(),
            })?;
        factory(set, parameter)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("tags", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::builder::ExampleSetBuilder;
    use crate::example::{Example, Value};

    #[derive(Debug)]
    struct EvenRows;

    impl Condition for EvenRows {
        fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
            Ok(example.data_row().index() % 2 == 0)
        }
    }

    fn ages() -> Box<dyn ExampleSet> {
        Box::new(
            ExampleSetBuilder::new()
                .regular(Attribute::numeric("age"))
                .rows([20.0, 35.0, f64::NAN].map(|v| vec![Value::from(v)]))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_builtin_tags() {
        let registry = ConditionRegistry::with_builtin();
        assert!(registry.contains("expression"));
        assert_eq!(registry.tags().count(), 10);

        let set = ages();
        let condition = registry
            .create("attribute_value_filter", set.as_ref(), "age > 30")
            .unwrap();
        let results: Vec<bool> = set
            .examples()
            .map(|e| condition.condition_ok(&e).unwrap())
            .collect();
        assert_eq!(results, vec![false, true, false]);
    }

    #[test]
    fn test_unknown_tag() {
        let registry = ConditionRegistry::with_builtin();
        let err = registry.create("sometimes", ages().as_ref(), "").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownCondition {
                tag: "sometimes".to_string()
            }
        );
    }

    #[test]
    fn test_factory_errors_propagate() {
        let registry = ConditionRegistry::default();
        let set = ages();
        assert!(registry.create("no_missing_labels", set.as_ref(), "").is_err());
        assert!(registry.create("expression", set.as_ref(), "age >").is_err());
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = ConditionRegistry::new();
        assert!(registry
            .register("even_rows", |_, _| Ok(Box::new(EvenRows)))
            .is_none());
        let set = ages();
        let condition = registry.create("even_rows", set.as_ref(), "").unwrap();
        assert!(condition.condition_ok(&set.example(2)).unwrap());
        assert!(!condition.condition_ok(&set.example(1)).unwrap());
    }
}
