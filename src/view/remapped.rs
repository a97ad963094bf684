use std::hash::{Hash, Hasher};

use log::debug;

use crate::attribute::{Attribute, Attributes};
use crate::error::Result;
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};
use crate::transformation::AttributeTransformation;

use super::view_plumbing;

/// A view aligning the parent's attributes with another example set.
///
/// Regular attributes are reordered to follow the mapping set. With
/// `transform_mappings`, nominal attributes adopt the mapping set's
/// dictionaries and read indices into them; strings unknown to the new
/// dictionary read as missing. Writing through a remapped attribute is not
/// supported.
#[derive(Debug, Clone)]
pub struct RemappedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    state: ViewState,
}

impl RemappedExampleSet {
    /// Align `parent` with `mapping_set`.
    ///
    /// Regular attributes of `mapping_set` that `parent` lacks are skipped.
    /// With `keep_additional`, parent regulars unknown to `mapping_set` are
    /// appended in parent order; otherwise they are dropped.
    pub fn new(
        parent: &dyn ExampleSet,
        mapping_set: &dyn ExampleSet,
        keep_additional: bool,
        transform_mappings: bool,
    ) -> Result<Self> {
        let mut attributes = parent.attributes().clone();
        let source = parent.attributes();

        let mut regular: Vec<Attribute> = mapping_set
            .attributes()
            .regular()
            .filter_map(|wanted| source.get_regular(wanted.name()).cloned())
            .collect();
        if keep_additional {
            regular.extend(
                source
                    .regular()
                    .filter(|a| mapping_set.attributes().get_regular(a.name()).is_none())
                    .cloned(),
            );
        }
        attributes.replace_regular(regular);

        let mut remapped = 0;
        if transform_mappings {
            for attribute in attributes.all_mut() {
                let target = match mapping_set.attributes().get(attribute.name()) {
                    Some(target) if attribute.is_nominal() && target.is_nominal() => target,
                    _ => continue,
                };
                let Some(mapping) = target.mapping().cloned() else {
                    continue;
                };
                if attribute.mapping() == Some(&mapping) {
                    continue;
                }
                let old = attribute.set_mapping(mapping.clone())?;
                attribute.add_transformation(AttributeTransformation::full_remapping(old, mapping))?;
                remapped += 1;
            }
        }
        debug!(
            "remapped view: {} regular attributes, {} dictionaries replaced",
            attributes.regular_count(),
            remapped
        );

        Ok(RemappedExampleSet {
            parent: parent.clone_box(),
            attributes,
            state: ViewState::new(),
        })
    }
}

impl PartialEq for RemappedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Hash for RemappedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
    }
}

impl ExampleSet for RemappedExampleSet {
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
    use crate::builder::ExampleSetBuilder;
    use crate::example::Value;

    fn training() -> Box<dyn ExampleSet> {
        Box::new(
            ExampleSetBuilder::new()
                .regular(Attribute::nominal_with_values("colour", ["red", "green", "blue"]))
                .regular(Attribute::numeric("size"))
                .build()
                .unwrap(),
        )
    }

    fn scoring() -> Box<dyn ExampleSet> {
        let mut builder = ExampleSetBuilder::new()
            .regular(Attribute::numeric("extra"))
            .regular(Attribute::numeric("size"))
            .regular(Attribute::nominal("colour"));
        for (size, colour) in [(1.0, "blue"), (2.0, "purple"), (3.0, "red")] {
            builder = builder.row(vec![Value::Numeric(0.0), Value::Numeric(size), Value::from(colour)]);
        }
        Box::new(builder.build().unwrap())
    }

    fn names(set: &dyn ExampleSet) -> Vec<String> {
        set.attributes().regular().map(|a| a.name().to_string()).collect()
    }

    #[test]
    fn test_reorders_and_keeps_additional() {
        let parent = scoring();
        let mapping = training();
        let view = RemappedExampleSet::new(parent.as_ref(), mapping.as_ref(), true, false).unwrap();
        assert_eq!(names(&view), vec!["colour", "size", "extra"]);

        let trimmed =
            RemappedExampleSet::new(parent.as_ref(), mapping.as_ref(), false, false).unwrap();
        assert_eq!(names(&trimmed), vec!["colour", "size"]);
        assert_eq!(names(parent.as_ref()), vec!["extra", "size", "colour"]);
    }

    #[test]
    fn test_transform_mappings_reads_target_indices() {
        let parent = scoring();
        let mapping = training();
        let view = RemappedExampleSet::new(parent.as_ref(), mapping.as_ref(), false, true).unwrap();
        let colour = view.attributes().get("colour").unwrap().clone();
        assert_eq!(colour.mapping(), mapping.attributes().get("colour").unwrap().mapping());

        let indices: Vec<f64> = view.examples().map(|e| e.value(&colour)).collect();
        assert_eq!(indices[0], 2.0);
        assert!(indices[1].is_nan());
        assert_eq!(indices[2], 0.0);

        let strings: Vec<String> = view.examples().map(|e| e.value_as_string(&colour)).collect();
        assert_eq!(strings, vec!["blue", "?", "red"]);
    }

    fn letters(values: [&str; 3]) -> Box<dyn ExampleSet> {
        Box::new(
            ExampleSetBuilder::new()
                .regular(Attribute::nominal_with_values("letter", values))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_remapping_a_remapped_view() {
        let mut builder =
            ExampleSetBuilder::new().regular(Attribute::nominal_with_values("letter", ["a", "b", "c"]));
        for letter in ["a", "b", "c"] {
            builder = builder.row(vec![Value::from(letter)]);
        }
        let parent = builder.build().unwrap();

        let first = RemappedExampleSet::new(&parent, letters(["c", "b", "a"]).as_ref(), false, true)
            .unwrap();
        let second = RemappedExampleSet::new(&first, letters(["b", "a", "c"]).as_ref(), false, true)
            .unwrap();

        let letter = first.attributes().get("letter").unwrap().clone();
        let read: Vec<String> = first.examples().map(|e| e.value_as_string(&letter)).collect();
        assert_eq!(read, vec!["a", "b", "c"]);

        let letter = second.attributes().get("letter").unwrap().clone();
        let read: Vec<String> = second.examples().map(|e| e.value_as_string(&letter)).collect();
        assert_eq!(read, vec!["a", "b", "c"]);
        let indices: Vec<f64> = second.examples().map(|e| e.value(&letter)).collect();
        assert_eq!(indices, vec![1.0, 0.0, 2.0]);
        assert_eq!(letter.transformations().len(), 2);
    }

    #[test]
    fn test_thread_safety_follows_parent() {
        let parent = scoring();
        let mapping = training();
        let view = RemappedExampleSet::new(parent.as_ref(), mapping.as_ref(), true, true).unwrap();
        assert!(view.is_thread_safe_view());

        let split = crate::view::SplittedExampleSet::new(
            parent.as_ref(),
            crate::partition::Partition::new(vec![0, 1, 0], 2).unwrap(),
        )
        .unwrap();
        let over_split = RemappedExampleSet::new(&split, mapping.as_ref(), true, true).unwrap();
        assert!(!over_split.is_thread_safe_view());
    }
}
