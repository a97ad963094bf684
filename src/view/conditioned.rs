use std::hash::{Hash, Hasher};

use log::{debug, info};

use crate::attribute::Attributes;
use crate::condition::{Condition, ConditionRegistry};
use crate::error::Result;
use crate::example_set::{ExampleSet, ViewState};
use crate::monitor::ScanMonitor;
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::mapped::AscendingRowReader;
use super::view_plumbing;

/// A view holding the parent rows that satisfy a condition.
///
/// The accepted rows are collected once at construction, in parent order.
#[derive(Debug, Clone)]
pub struct ConditionedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    view_to_parent: Vec<usize>,
    inverted: bool,
    state: ViewState,
}

impl ConditionedExampleSet {
    /// Rows of `parent` for which `condition` holds (or fails, if `inverted`).
    ///
    /// The first row that cannot be evaluated aborts construction with its
    /// error. Cancellation returns [`Error::Stopped`](crate::Error::Stopped).
    pub fn new(
        parent: &dyn ExampleSet,
        condition: &dyn Condition,
        inverted: bool,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let total = parent.size();
        let mut view_to_parent = Vec::new();
        for (position, example) in parent.examples().enumerate() {
            let accepted = condition
                .condition_ok(&example)
                .map_err(|err| err.at_row(position))?;
            if accepted != inverted {
                view_to_parent.push(position);
            }
            if let Err(err) = monitor.checkpoint(position + 1, total) {
                info!("condition scan cancelled after {} of {} rows", position + 1, total);
                return Err(err);
            }
        }
        monitor.finish(total);
        debug!(
            "conditioned view: {} of {} rows accepted by {:?} (inverted: {})",
            view_to_parent.len(),
            total,
            condition,
            inverted
        );

        Ok(ConditionedExampleSet {
            parent: parent.clone_box(),
            attributes: parent.attributes().clone(),
            view_to_parent,
            inverted,
            state: ViewState::new(),
        })
    }

    /// Build the condition registered as `tag` with `parameter` and filter by it.
    pub fn from_registry(
        parent: &dyn ExampleSet,
        registry: &ConditionRegistry,
        tag: &str,
        parameter: &str,
        inverted: bool,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let condition = registry.create(tag, parent, parameter)?;
        Self::new(parent, condition.as_ref(), inverted, monitor)
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Accepted parent positions, ascending.
    pub fn mapping(&self) -> &[usize] {
        &self.view_to_parent
    }
}

impl PartialEq for ConditionedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.view_to_parent == other.view_to_parent
    }
}

impl Hash for ConditionedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        self.view_to_parent.hash(state);
    }
}

impl ExampleSet for ConditionedExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.view_to_parent.len()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        let size = self.view_to_parent.len();
        assert!(index < size, "index {index} out of range for conditioned view of {size} rows");
        self.parent.data_row(self.view_to_parent[index])
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        Box::new(AscendingRowReader::new(
            self.parent.data_rows(),
            &self.view_to_parent,
        ))
    }

    fn is_thread_safe_view(&self) -> bool {
        self.parent.is_thread_safe_view()
    }
}
