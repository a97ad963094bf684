use std::hash::{Hash, Hasher};

use log::debug;
use rand::Rng;

use crate::attribute::Attributes;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::partition::seeded_rng;
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

/// A view selecting parent rows through an index array.
///
/// The array may repeat indices (bootstrap samples). When it is ascending,
/// iteration walks the parent reader once and skips unmapped rows.
#[derive(Debug, Clone)]
pub struct MappedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    view_to_parent: Vec<usize>,
    ascending: bool,
    state: ViewState,
}

impl MappedExampleSet {
    /// View of `parent` rows listed in `mapping`, sorted ascending.
    pub fn new(parent: &dyn ExampleSet, mapping: Vec<usize>) -> Result<Self> {
        Self::with_options(parent, mapping, true, true)
    }

    /// Full constructor.
    ///
    /// With `use_mapped_examples = false` the view holds every parent row
    /// *not* listed in `mapping` instead. `sort` only applies otherwise.
    pub fn with_options(
        parent: &dyn ExampleSet,
        mut mapping: Vec<usize>,
        sort: bool,
        use_mapped_examples: bool,
    ) -> Result<Self> {
        let parent_size = parent.size();
        if let Some(&index) = mapping.iter().find(|&&index| index >= parent_size) {
            return Err(Error::IndexOutOfRange {
                index,
                len: parent_size,
            });
        }

        if !use_mapped_examples {
            mapping = complement(mapping, parent_size);
        } else if sort {
            mapping.sort_unstable();
        }
        let ascending = mapping.windows(2).all(|w| w[0] <= w[1]);
        debug!(
            "mapped view: {} of {} parent rows (ascending: {})",
            mapping.len(),
            parent_size,
            ascending
        );

        Ok(MappedExampleSet {
            parent: parent.clone_box(),
            attributes: parent.attributes().clone(),
            view_to_parent: mapping,
            ascending,
            state: ViewState::new(),
        })
    }

    /// Random sample of `size` distinct parent rows, in parent order.
    pub fn create_sampled(parent: &dyn ExampleSet, size: usize, seed: Option<u64>) -> Result<Self> {
        let parent_size = parent.size();
        if size > parent_size {
            return Err(Error::invalid_argument(format!(
                "cannot sample {size} rows without replacement from {parent_size}"
            )));
        }
        let mut rng = seeded_rng(seed);
        let mapping = rand::seq::index::sample(&mut rng, parent_size, size).into_vec();
        Self::new(parent, mapping)
    }

    /// Bootstrap sample of `size` parent rows drawn with replacement.
    pub fn create_bootstrap(parent: &dyn ExampleSet, size: usize, seed: Option<u64>) -> Result<Self> {
        let parent_size = parent.size();
        if parent_size == 0 && size > 0 {
            return Err(Error::invalid_argument(
                "cannot draw a bootstrap sample from an empty example set",
            ));
        }
        let mut rng = seeded_rng(seed);
        let mapping = (0..size).map(|_| rng.gen_range(0..parent_size)).collect();
        Self::new(parent, mapping)
    }

    /// Parent positions in view order.
    pub fn mapping(&self) -> &[usize] {
        &self.view_to_parent
    }

    pub fn parent(&self) -> &dyn ExampleSet {
        self.parent.as_ref()
    }
}

/// Ascending positions in `0..size` absent from `mapping`.
fn complement(mut mapping: Vec<usize>, size: usize) -> Vec<usize> {
    mapping.sort_unstable();
    mapping.dedup();
    let mut excluded = mapping.into_iter().peekable();
    let mut result = Vec::with_capacity(size);
    for index in 0..size {
        if excluded.peek() == Some(&index) {
            excluded.next();
        } else {
            result.push(index);
        }
    }
    result
}

/// Forward-only merge of an ascending index list against a parent reader.
///
/// The parent is advanced only as far as the next wanted position; a
/// repeated position re-delivers the row last read.
pub(crate) struct AscendingRowReader<'a> {
    parent: DataRowReader<'a>,
    positions: std::slice::Iter<'a, usize>,
    next_parent_position: usize,
    current: Option<(usize, DataRow)>,
}

impl<'a> AscendingRowReader<'a> {
    pub(crate) fn new(parent: DataRowReader<'a>, positions: &'a [usize]) -> Self {
        AscendingRowReader {
            parent,
            positions: positions.iter(),
            next_parent_position: 0,
            current: None,
        }
    }
}

impl Iterator for AscendingRowReader<'_> {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        let target = *self.positions.next()?;
        if let Some((position, row)) = self.current {
            if position == target {
                return Some(row);
            }
        }
        while self.next_parent_position <= target {
            let position = self.next_parent_position;
            let row = self.parent.next()?;
            self.next_parent_position += 1;
            if position == target {
                self.current = Some((position, row));
                return Some(row);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.positions.len()))
    }
}

impl PartialEq for MappedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.view_to_parent == other.view_to_parent
    }
}

impl Hash for MappedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        self.view_to_parent.hash(state);
    }
}

impl ExampleSet for MappedExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.view_to_parent.len()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        let size = self.view_to_parent.len();
        assert!(index < size, "index {index} out of range for mapped view of {size} rows");
        self.parent.data_row(self.view_to_parent[index])
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        if self.ascending {
            Box::new(AscendingRowReader::new(
                self.parent.data_rows(),
                &self.view_to_parent,
            ))
        } else {
            Box::new(
                self.view_to_parent
                    .iter()
                    .map(move |&index| self.parent.data_row(index)),
            )
        }
    }

    fn is_thread_safe_view(&self) -> bool {
        self.parent.is_thread_safe_view()
    }
}
