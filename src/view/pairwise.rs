use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::debug;

use crate::attribute::{Attribute, Attributes, ValueType};
use crate::error::{Error, Result};
use crate::example::Example;
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::view_plumbing;

pub const FIRST_ID_NAME: &str = "first_id";
pub const SECOND_ID_NAME: &str = "second_id";
pub const PAIR_VALUE_NAME: &str = "value";

/// Scores one unordered pair of examples.
pub trait PairMeasure: fmt::Debug + Send + Sync {
    fn measure(&self, first: &Example<'_>, second: &Example<'_>) -> f64;
}

/// Euclidean distance over the numerical regular attributes.
/// Any missing coordinate makes the distance missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl PairMeasure for EuclideanDistance {
    fn measure(&self, first: &Example<'_>, second: &Example<'_>) -> f64 {
        first
            .attributes()
            .regular()
            .filter(|a| a.is_numerical())
            .map(|a| {
                let d = first.value(a) - second.value(a);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

/// Virtual table of all pairs `i < j` of the parent's rows, in
/// lexicographic order. Cells are computed on access.
#[derive(Debug)]
struct PairTable {
    parent: Box<dyn ExampleSet>,
    measure: Arc<dyn PairMeasure>,
    examples: usize,
    rows: usize,
}

impl PairTable {
    /// First row of the block of pairs starting with example `i`.
    fn block_start(&self, i: usize) -> usize {
        i * (2 * self.examples - i - 1) / 2
    }

    fn pair_at(&self, row: usize) -> (usize, usize) {
        let b = (2 * self.examples - 1) as f64;
        let estimate = (b - (b * b - 8.0 * row as f64).max(0.0).sqrt()) / 2.0;
        let mut i = (estimate.floor() as usize).min(self.examples - 2);
        while i > 0 && self.block_start(i) > row {
            i -= 1;
        }
        while i + 2 < self.examples && self.block_start(i + 1) <= row {
            i += 1;
        }
        (i, row - self.block_start(i) + i + 1)
    }

    fn id_of(&self, position: usize) -> f64 {
        match self.parent.attributes().id() {
            Some(id) => self.parent.example(position).value(id),
            None => position as f64,
        }
    }
}

impl ExampleTable for PairTable {
    fn size(&self) -> usize {
        self.rows
    }

    fn column_count(&self) -> usize {
        3
    }

    fn get(&self, row: usize, column: usize) -> f64 {
        if row >= self.rows {
            return f64::NAN;
        }
        let (first, second) = self.pair_at(row);
        match column {
            0 => self.id_of(first),
            1 => self.id_of(second),
            2 => self
                .measure
                .measure(&self.parent.example(first), &self.parent.example(second)),
            _ => f64::NAN,
        }
    }
}

/// De-duplicated pairwise view: one row per unordered pair of parent rows.
///
/// Rows carry the two ids (special roles `first_id` and `second_id`) and
/// the measure of the pair as the regular attribute `value`. Without an id
/// attribute the parent positions serve as ids. Nothing is materialised;
/// each cell reads the parent on access.
#[derive(Debug, Clone)]
pub struct PairwiseExampleSet {
    table: Arc<PairTable>,
    attributes: Attributes,
    state: ViewState,
}

impl PairwiseExampleSet {
    pub fn new(parent: &dyn ExampleSet, measure: Arc<dyn PairMeasure>) -> Result<Self> {
        let examples = parent.size();
        let rows = examples
            .checked_mul(examples.saturating_sub(1))
            .map(|twice| twice / 2)
            .ok_or_else(|| Error::invalid_argument(format!("too many pairs for {examples} rows")))?;

        let id_attribute = |name: &str, column: usize| {
            let mut attribute = match parent.attributes().id() {
                Some(id) => {
                    let mut copy = id.clone();
                    copy.clear_transformations();
                    copy.set_name(name);
                    copy
                }
                None => Attribute::new(name, ValueType::Integer),
            };
            attribute.set_table_index(column);
            attribute
        };
        let mut value = Attribute::numeric(PAIR_VALUE_NAME);
        value.set_table_index(2);

        let mut attributes = Attributes::new();
        attributes.add_regular(value);
        attributes.set_special(id_attribute(FIRST_ID_NAME, 0), FIRST_ID_NAME);
        attributes.set_special(id_attribute(SECOND_ID_NAME, 1), SECOND_ID_NAME);
        debug!("pairwise view: {} pairs over {} rows ({:?})", rows, examples, measure);

        Ok(PairwiseExampleSet {
            table: Arc::new(PairTable {
                parent: parent.clone_box(),
                measure,
                examples,
                rows,
            }),
            attributes,
            state: ViewState::new(),
        })
    }

    /// Parent positions `(i, j)`, `i < j`, of pair `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    pub fn pair(&self, index: usize) -> (usize, usize) {
        assert!(index < self.table.rows, "pair {index} out of range");
        self.table.pair_at(index)
    }
}

impl PartialEq for PairwiseExampleSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table.measure, &other.table.measure)
            && self.table.parent.dyn_eq(other.table.parent.as_ref())
            && self.attributes == other.attributes
    }
}

impl Hash for PairwiseExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.rows.hash(state);
        self.attributes.hash(state);
    }
}

impl ExampleSet for PairwiseExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.table.rows
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
        self.table.parent.is_thread_safe_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExampleSetBuilder;
    use crate::example::Value;
    use crate::view::SortedExampleSet;

    fn points() -> Box<dyn ExampleSet> {
        let mut builder = ExampleSetBuilder::new()
            .regular(Attribute::numeric("x"))
            .regular(Attribute::numeric("y"))
            .id(Attribute::nominal("name"));
        for (x, y, name) in [(0.0, 0.0, "p"), (3.0, 4.0, "q"), (6.0, 8.0, "r"), (0.0, 1.0, "s")] {
            builder = builder.row(vec![Value::Numeric(x), Value::Numeric(y), Value::from(name)]);
        }
        Box::new(builder.build().unwrap())
    }

    fn column(set: &dyn ExampleSet, name: &str) -> Vec<String> {
        let attribute = set.attributes().get(name).unwrap().clone();
        set.examples().map(|e| e.value_as_string(&attribute)).collect()
    }

    #[test]
    fn test_pairs_are_unique_and_ordered() {
        let parent = points();
        let pairs = PairwiseExampleSet::new(parent.as_ref(), Arc::new(EuclideanDistance)).unwrap();
        assert_eq!(pairs.size(), 6);
        let all: Vec<(usize, usize)> = (0..pairs.size()).map(|i| pairs.pair(i)).collect();
        assert_eq!(all, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);

        assert_eq!(column(&pairs, FIRST_ID_NAME), vec!["p", "p", "p", "q", "q", "r"]);
        assert_eq!(column(&pairs, SECOND_ID_NAME), vec!["q", "r", "s", "r", "s", "s"]);
        assert_eq!(column(&pairs, PAIR_VALUE_NAME)[..4], ["5", "10", "1", "5"]);
        assert_eq!(pairs.attributes().regular_count(), 1);
        assert!(pairs.is_thread_safe_view());
    }

    #[test]
    fn test_pair_decoding_covers_every_pair() {
        let rows = (0..41).map(|i| vec![Value::Numeric(i as f64)]);
        let parent = ExampleSetBuilder::new()
            .regular(Attribute::numeric("x"))
            .rows(rows)
            .build()
            .unwrap();
        let pairs = PairwiseExampleSet::new(&parent, Arc::new(EuclideanDistance)).unwrap();
        let expected: Vec<(usize, usize)> = (0..41)
            .flat_map(|i| ((i + 1)..41).map(move |j| (i, j)))
            .collect();
        let decoded: Vec<(usize, usize)> = (0..pairs.size()).map(|i| pairs.pair(i)).collect();
        assert_eq!(decoded, expected);

        // positions stand in for ids
        let first = pairs.attributes().special(FIRST_ID_NAME).unwrap().clone();
        let second = pairs.attributes().special(SECOND_ID_NAME).unwrap().clone();
        let last = pairs.example(pairs.size() - 1);
        assert_eq!((last.value(&first), last.value(&second)), (39.0, 40.0));
    }

    #[test]
    fn test_small_parents_have_no_pairs() {
        for n in [0, 1] {
            let parent = ExampleSetBuilder::new()
                .regular(Attribute::numeric("x"))
                .rows((0..n).map(|i| vec![Value::Numeric(i as f64)]))
                .build()
                .unwrap();
            let pairs = PairwiseExampleSet::new(&parent, Arc::new(EuclideanDistance)).unwrap();
            assert!(pairs.is_empty());
            assert_eq!(pairs.examples().count(), 0);
        }
    }

    #[test]
    fn test_pairs_follow_parent_view_order() {
        let parent = points();
        let sorted = SortedExampleSet::from_mapping(parent.as_ref(), vec![3, 2, 1, 0]).unwrap();
        let pairs = PairwiseExampleSet::new(&sorted, Arc::new(EuclideanDistance)).unwrap();
        assert_eq!(column(&pairs, FIRST_ID_NAME)[0], "s");
        assert_eq!(column(&pairs, SECOND_ID_NAME)[0], "r");

        let copy = pairs.clone_box();
        assert!(copy.dyn_eq(&pairs));
        let other = PairwiseExampleSet::new(&sorted, Arc::new(EuclideanDistance)).unwrap();
        assert!(!other.dyn_eq(&pairs));
    }
}
