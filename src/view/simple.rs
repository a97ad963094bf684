use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::attribute::Attributes;
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

/// The base example set: an attribute collection over a physical table.
#[derive(Debug, Clone)]
pub struct SimpleExampleSet {
    table: Arc<dyn ExampleTable>,
    attributes: Attributes,
    state: ViewState,
}

impl SimpleExampleSet {
    pub fn new(table: Arc<dyn ExampleTable>, attributes: Attributes) -> Self {
        SimpleExampleSet {
            table,
            attributes,
            state: ViewState::new(),
        }
    }

    /// Shared handle to the physical table.
    pub fn table(&self) -> &Arc<dyn ExampleTable> {
        &self.table
    }
}

impl PartialEq for SimpleExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Hash for SimpleExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
    }
}

impl ExampleSet for SimpleExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.table.size()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.table.as_ref()
    }

    fn data_row(&self, index: usize) -> DataRow {
        self.table.data_row(index)
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        self.table.data_rows()
    }

    fn is_thread_safe_view(&self) -> bool {
        true
    }
}
