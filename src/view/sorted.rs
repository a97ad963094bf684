use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, Attributes};
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::monitor::ScanMonitor;
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

/// Sort direction for [`SortedExampleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Increasing,
    Decreasing,
}

/// Rows sorted between two cancellation checks.
const SORT_CHUNK: usize = 1 << 16;

/// Sort key of one row. Missing keys order after every present key.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    fn read(attribute: &Attribute, value: f64) -> SortKey {
        if value.is_nan() {
            return SortKey::Missing;
        }
        match attribute.mapping() {
            Some(mapping) => mapping
                .map_value(value)
                .map_or(SortKey::Missing, |s| SortKey::Text(s.to_string())),
            None => SortKey::Number(value),
        }
    }
}

/// Compare two keys in `direction`. Missing keys sort last in both directions.
fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (SortKey::Missing, SortKey::Missing) => return Ordering::Equal,
        (SortKey::Missing, _) => return Ordering::Greater,
        (_, SortKey::Missing) => return Ordering::Less,
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    };
    match direction {
        SortDirection::Increasing => ordering,
        SortDirection::Decreasing => ordering.reverse(),
    }
}

/// A view presenting the parent's rows in a stable sorted order.
#[derive(Debug, Clone)]
pub struct SortedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    view_to_parent: Vec<usize>,
    state: ViewState,
}

impl SortedExampleSet {
    /// Sort `parent` by the attribute called `sort_attribute`.
    ///
    /// Numeric and date-time values sort by value, nominal values by their
    /// string. Ties keep parent order. The monitor is polled while reading
    /// keys and while sorting; cancellation returns [`Error::Stopped`].
    pub fn new(
        parent: &dyn ExampleSet,
        sort_attribute: &str,
        direction: SortDirection,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let attribute = parent
            .attributes()
            .get(sort_attribute)
            .cloned()
            .ok_or_else(|| Error::attribute_not_found(sort_attribute))?;

        let total = parent.size();
        let mut keys = Vec::with_capacity(total);
        for (position, example) in parent.examples().enumerate() {
            keys.push((SortKey::read(&attribute, example.value(&attribute)), position));
            if let Err(err) = monitor.checkpoint(position + 1, total) {
                info!("sort cancelled while reading keys at row {}", position + 1);
                return Err(err);
            }
        }

        // Sorted runs are checked for cancellation between chunks; the final
        // stable pass only merges them.
        for chunk in keys.chunks_mut(SORT_CHUNK) {
            if monitor.is_cancelled() {
                info!("sort cancelled while ordering {} rows", total);
                return Err(Error::Stopped);
            }
            chunk.sort_by(|(a, _), (b, _)| compare_keys(a, b, direction));
        }
        if monitor.is_cancelled() {
            info!("sort cancelled while ordering {} rows", total);
            return Err(Error::Stopped);
        }
        keys.sort_by(|(a, _), (b, _)| compare_keys(a, b, direction));
        monitor.finish(total);
        debug!("sorted {} rows by '{}' ({:?})", total, sort_attribute, direction);

        let mapping = keys.into_iter().map(|(_, position)| position).collect();
        Ok(Self::assemble(parent, mapping))
    }

    /// View `parent` through a precomputed permutation of its rows.
    pub fn from_mapping(parent: &dyn ExampleSet, mapping: Vec<usize>) -> Result<Self> {
        let size = parent.size();
        if mapping.len() != size {
            return Err(Error::length_mismatch("sort permutation", size, mapping.len()));
        }
        let mut seen = vec![false; size];
        for &index in &mapping {
            if index >= size {
                return Err(Error::IndexOutOfRange { index, len: size });
            }
            if std::mem::replace(&mut seen[index], true) {
                return Err(Error::invalid_argument(format!(
                    "sort permutation repeats row {index}"
                )));
            }
        }
        Ok(Self::assemble(parent, mapping))
    }

    fn assemble(parent: &dyn ExampleSet, mapping: Vec<usize>) -> Self {
        SortedExampleSet {
            parent: parent.clone_box(),
            attributes: parent.attributes().clone(),
            view_to_parent: mapping,
            state: ViewState::new(),
        }
    }

    /// Parent positions in view order.
    pub fn mapping(&self) -> &[usize] {
        &self.view_to_parent
    }
}

impl PartialEq for SortedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.view_to_parent == other.view_to_parent
    }
}

impl Hash for SortedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        self.view_to_parent.hash(state);
    }
}

impl ExampleSet for SortedExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.view_to_parent.len()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        let size = self.view_to_parent.len();
        assert!(index < size, "index {index} out of range for sorted view of {size} rows");
        self.parent.data_row(self.view_to_parent[index])
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        Box::new(
            self.view_to_parent
                .iter()
                .map(move |&index| self.parent.data_row(index)),
        )
    }

    fn is_thread_safe_view(&self) -> bool {
        self.parent.is_thread_safe_view()
    }
}
