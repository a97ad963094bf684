use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, info};

use crate::attribute::Attributes;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::monitor::{ScanMonitor, ScanOutcome};
use crate::statistics::{AVERAGE, MODE};
use crate::table::{DataRow, DataRowReader, ExampleTable};
use crate::transformation::{AttributeTransformation, ReplacementTable};

use super::view_plumbing;

/// A view reading missing values as a per-attribute replacement.
///
/// Every attribute shares one replacement table. Attributes without an
/// entry keep reading missing values as missing.
#[derive(Debug, Clone)]
pub struct ReplaceMissingExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    replacements: Arc<ReplacementTable>,
    state: ViewState,
}

impl ReplaceMissingExampleSet {
    /// Replace missing values with the mode (nominal) or the average
    /// (numerical and date-time) of each attribute.
    ///
    /// The averages come from one statistics scan over a copy of `parent`;
    /// `parent`'s own cache is left alone. Attributes with no present value
    /// get no replacement.
    pub fn new(parent: &dyn ExampleSet, monitor: &mut ScanMonitor<'_>) -> Result<Self> {
        let mut scratch = parent.clone_box();
        if scratch.recalculate_all_statistics(monitor)? == ScanOutcome::Cancelled {
            info!("replace missing cancelled while computing replacements");
            return Err(Error::Stopped);
        }

        let mut replacements = ReplacementTable::new();
        for attribute in scratch.attributes().all() {
            let name = if attribute.is_nominal() { MODE } else { AVERAGE };
            let value = scratch.statistic(attribute, name, None);
            if !value.is_nan() {
                replacements.insert(attribute.name().to_string(), value);
            }
        }
        Self::with_replacements(parent, replacements)
    }

    /// Replace missing values using an explicit table keyed by attribute name.
    pub fn with_replacements(parent: &dyn ExampleSet, replacements: ReplacementTable) -> Result<Self> {
        let mut attributes = parent.attributes().clone();
        if let Some(unknown) = replacements.keys().find(|name| !attributes.contains(name)) {
            return Err(Error::attribute_not_found(unknown.as_str()));
        }

        let replacements = Arc::new(replacements);
        for attribute in attributes.all_mut() {
            attribute.add_transformation(AttributeTransformation::replace_missing(Arc::clone(
                &replacements,
            )))?;
        }
        debug!("replace missing view with {} replacements", replacements.len());

        Ok(ReplaceMissingExampleSet {
            parent: parent.clone_box(),
            attributes,
            replacements,
            state: ViewState::new(),
        })
    }

    pub fn replacements(&self) -> &ReplacementTable {
        &self.replacements
    }
}

impl PartialEq for ReplaceMissingExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.replacements == other.replacements
    }
}

impl Hash for ReplaceMissingExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        for (name, value) in self.replacements.iter() {
            name.hash(state);
            value.to_bits().hash(state);
        }
    }
}

impl ExampleSet for ReplaceMissingExampleSet {
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
