use std::hash::{Hash, Hasher};

use crate::attribute::Attributes;
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

/// Attribute metadata without data.
///
/// Describes the shape of an example set: attributes, roles and nominal
/// dictionaries. It has no rows and no table; every row accessor panics.
#[derive(Debug, Clone)]
pub struct HeaderExampleSet {
    attributes: Attributes,
    state: ViewState,
}

impl HeaderExampleSet {
    pub fn new(parent: &dyn ExampleSet) -> Self {
        Self::from_attributes(parent.attributes().clone())
    }

    pub fn from_attributes(attributes: Attributes) -> Self {
        HeaderExampleSet {
            attributes,
            state: ViewState::new(),
        }
    }
}

impl PartialEq for HeaderExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Hash for HeaderExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
    }
}

impl ExampleSet for HeaderExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        0
    }

    fn example_table(&self) -> &dyn ExampleTable {
        panic!("header example set has no example table")
    }

    fn data_row(&self, index: usize) -> DataRow {
        panic!("header example set has no rows (requested row {index})")
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        panic!("header example set has no rows")
    }

    fn is_thread_safe_view(&self) -> bool {
        false
    }
}
