use std::hash::{Hash, Hasher};

use log::debug;

use crate::attribute::Attributes;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

/// A view hiding some of the parent's regular attributes.
#[derive(Debug, Clone)]
pub struct AttributeSelectionExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    state: ViewState,
}

impl AttributeSelectionExampleSet {
    /// Keep the `i`-th regular attribute of `parent` iff `mask[i]`.
    ///
    /// `mask` must have one entry per regular attribute. Special attributes
    /// are always kept.
    pub fn new(parent: &dyn ExampleSet, mask: &[bool]) -> Result<Self> {
        let regular = parent.attributes().regular_count();
        if mask.len() != regular {
            return Err(Error::length_mismatch("attribute selection mask", regular, mask.len()));
        }
        let mut attributes = parent.attributes().clone();
        attributes.retain_regular_by_mask(mask);
        debug!(
            "attribute selection: {} of {} regular attributes kept",
            attributes.regular_count(),
            regular
        );
        Ok(AttributeSelectionExampleSet {
            parent: parent.clone_box(),
            attributes,
            state: ViewState::new(),
        })
    }
}

impl PartialEq for AttributeSelectionExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Hash for AttributeSelectionExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
    }
}

impl ExampleSet for AttributeSelectionExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.parent.size()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        self.parent.data_row(index)
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        self.parent.data_rows()
    }

    fn is_thread_safe_view(&self) -> bool {
        self.parent.is_thread_safe_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::builder::ExampleSetBuilder;
    use crate::example::Value;

    fn wide() -> Box<dyn ExampleSet> {
        Box::new(
            ExampleSetBuilder::new()
                .regular(Attribute::numeric("a"))
                .regular(Attribute::numeric("b"))
                .regular(Attribute::numeric("c"))
                .label(Attribute::nominal("y"))
                .row(vec![1.0.into(), 2.0.into(), 3.0.into(), Value::from("yes")])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_mask_selects_regulars() {
        let parent = wide();
        let view = AttributeSelectionExampleSet::new(parent.as_ref(), &[true, false, true]).unwrap();
        let names: Vec<&str> = view.attributes().regular().map(|a| a.name()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(view.attributes().label().is_some());
        assert_eq!(view.size(), 1);

        let c = view.attributes().get("c").unwrap();
        assert_eq!(view.example(0).value(c), 3.0);
        assert_eq!(parent.attributes().regular_count(), 3);
    }

    #[test]
    fn test_mask_length_checked() {
        let parent = wide();
        let err = AttributeSelectionExampleSet::new(parent.as_ref(), &[true, false]).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                what: "attribute selection mask".to_string(),
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn test_selection_over_weighted_keeps_weights_and_thread_safety() {
        let parent = wide();
        assert!(AttributeSelectionExampleSet::new(parent.as_ref(), &[true, true, true])
            .unwrap()
            .is_thread_safe_view());

        let weights = std::collections::BTreeMap::from([("c".to_string(), 2.0)]);
        let weighted =
            crate::view::AttributeWeightedExampleSet::new(parent.as_ref(), Some(&weights)).unwrap();
        let view = AttributeSelectionExampleSet::new(&weighted, &[false, true, true]).unwrap();
        let c = view.attributes().get("c").unwrap();
        assert_eq!(view.example(0).value(c), 6.0);
        assert!(!view.is_thread_safe_view());
    }
}

