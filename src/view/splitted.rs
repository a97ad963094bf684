use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use log::debug;

use crate::attribute::Attributes;
use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::monitor::ScanMonitor;
use crate::partition::{Partition, PartitionBuilder};
use crate::table::{DataRow, DataRowReader, ExampleTable};

use super::mapped::AscendingRowReader;
use super::view_plumbing;

/// A view over the selected groups of a [`Partition`] of its parent.
///
/// Selection changes only touch the partition; the parent is never
/// rebuilt. Use [`SplittedExampleSet::split_selected`] to split again
/// instead of stacking splitted views.
#[derive(Debug, Clone)]
pub struct SplittedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    partition: Partition,
    state: ViewState,
}

impl SplittedExampleSet {
    /// Wrap `parent` with a partition covering exactly its rows.
    pub fn new(parent: &dyn ExampleSet, partition: Partition) -> Result<Self> {
        Self::assemble(parent.clone_box(), parent.attributes().clone(), partition)
    }

    fn assemble(
        parent: Box<dyn ExampleSet>,
        attributes: Attributes,
        partition: Partition,
    ) -> Result<Self> {
        if partition.total_size() != parent.size() {
            return Err(Error::length_mismatch(
                "partition",
                parent.size(),
                partition.total_size(),
            ));
        }
        debug!(
            "splitted view: {} groups over {} rows, {} selected",
            partition.number_of_subsets(),
            partition.total_size(),
            partition.selection_size()
        );
        Ok(SplittedExampleSet {
            parent,
            attributes,
            partition,
            state: ViewState::new(),
        })
    }

    /// Partition `parent` into one group per ratio using `config`.
    pub fn split(
        parent: &dyn ExampleSet,
        ratios: &[f64],
        config: &SamplingConfig,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let builder = PartitionBuilder::for_example_set(parent, config, monitor)?;
        let partition = Partition::from_builder(&builder, ratios, parent.size())?;
        Self::new(parent, partition)
    }

    /// One group per distinct value of `attribute_name`, in value order.
    ///
    /// Nominal values are ordered by string. Rows with a missing value go to
    /// a hidden group and never show up in any selection.
    pub fn split_by_attribute(parent: &dyn ExampleSet, attribute_name: &str) -> Result<Self> {
        let attribute = parent
            .attributes()
            .get(attribute_name)
            .cloned()
            .ok_or_else(|| Error::attribute_not_found(attribute_name))?;

        let mut keys = Vec::with_capacity(parent.size());
        for example in parent.examples() {
            let value = example.value(&attribute);
            let key = if value.is_nan() {
                None
            } else if attribute.is_nominal() {
                Some(GroupKey::Text(example.value_as_string(&attribute)))
            } else {
                Some(GroupKey::Number(value.to_bits()))
            };
            keys.push(key);
        }

        let mut ordered: Vec<GroupKey> = keys.iter().flatten().cloned().collect();
        ordered.sort_by(GroupKey::compare);
        ordered.dedup();
        if ordered.is_empty() {
            return Err(Error::invalid_argument(format!(
                "attribute '{attribute_name}' has no values to split by"
            )));
        }
        let distinct: BTreeMap<GroupKey, usize> = ordered
            .into_iter()
            .enumerate()
            .map(|(group, key)| (key, group))
            .collect();

        let groups = distinct.len();
        let elements = keys
            .iter()
            .map(|key| key.as_ref().map_or(groups, |key| distinct[key]))
            .collect();
        Self::new(parent, Partition::with_hidden_group(elements, groups)?)
    }

    /// Split the currently selected rows again.
    ///
    /// The result wraps the same parent with a single partition: rows
    /// selected here are distributed over `ratios`, every other row is
    /// hidden for good. All new groups start selected.
    pub fn split_selected(
        &self,
        ratios: &[f64],
        config: &SamplingConfig,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let builder = PartitionBuilder::for_example_set(self, config, monitor)?;
        let inner = builder.create_partition(ratios, self.size())?;
        let partition = self.partition.compose(&inner, ratios.len())?;
        Self::assemble(self.parent.clone(), self.attributes.clone(), partition)
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn number_of_subsets(&self) -> usize {
        self.partition.number_of_subsets()
    }

    pub fn select_single_subset(&mut self, group: usize) -> Result<()> {
        self.partition.select_single_subset(group)
    }

    pub fn select_all_subsets_but(&mut self, group: usize) -> Result<()> {
        self.partition.select_all_subsets_but(group)
    }

    pub fn select_additional_subset(&mut self, group: usize) -> Result<()> {
        self.partition.select_subset(group)
    }

    pub fn deselect_subset(&mut self, group: usize) -> Result<()> {
        self.partition.deselect_subset(group)
    }

    pub fn select_all_subsets(&mut self) {
        self.partition.select_all_subsets();
    }

    pub fn clear_selection(&mut self) {
        self.partition.clear_selection();
    }

    pub fn invert_selection(&mut self) {
        self.partition.invert_selection();
    }

    /// Parent position of the `index`-th row of this view.
    pub fn parent_index(&self, index: usize) -> usize {
        self.partition.map_index(index)
    }
}

/// Distinct value of the split attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Number(u64),
    Text(String),
}

impl GroupKey {
    fn compare(a: &GroupKey, b: &GroupKey) -> std::cmp::Ordering {
        match (a, b) {
            (GroupKey::Number(a), GroupKey::Number(b)) => {
                f64::from_bits(*a).total_cmp(&f64::from_bits(*b))
            }
            _ => a.cmp(b),
        }
    }
}

impl PartialEq for SplittedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.partition == other.partition
    }
}

impl Hash for SplittedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        self.partition.hash(state);
    }
}

impl ExampleSet for SplittedExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.partition.selection_size()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        self.parent.data_row(self.partition.map_index(index))
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        Box::new(AscendingRowReader::new(
            self.parent.data_rows(),
            self.partition.selected_indices(),
        ))
    }

    fn is_thread_safe_view(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::builder::ExampleSetBuilder;
    use crate::config::SamplingType;
    use crate::example::Value;

    fn labelled(n: usize) -> Box<dyn ExampleSet> {
        let rows = (0..n).map(|i| {
            vec![
                Value::Numeric(i as f64),
                Value::from(if i % 2 == 0 { "even" } else { "odd" }),
            ]
        });
        Box::new(
            ExampleSetBuilder::new()
                .regular(Attribute::numeric("x"))
                .label(Attribute::nominal("parity"))
                .rows(rows)
                .build()
                .unwrap(),
        )
    }

    fn xs(set: &dyn ExampleSet) -> Vec<f64> {
        let x = set.attributes().get("x").unwrap().clone();
        set.examples().map(|e| e.value(&x)).collect()
    }

    #[test]
    fn test_linear_split_selection() {
        let parent = labelled(10);
        let config = SamplingConfig::seeded(SamplingType::Linear, 0);
        let mut view =
            SplittedExampleSet::split(parent.as_ref(), &[0.3, 0.7], &config, &mut ScanMonitor::new())
                .unwrap();
        assert_eq!(view.size(), 10);

        view.select_single_subset(0).unwrap();
        assert_eq!(xs(&view), vec![0.0, 1.0, 2.0]);

        view.invert_selection();
        assert_eq!(view.size(), 7);
        let x = view.attributes().get("x").unwrap();
        assert_eq!(view.example(0).value(x), 3.0);
        assert_eq!(view.parent_index(6), 9);

        view.clear_selection();
        assert!(view.is_empty());
        view.select_additional_subset(1).unwrap();
        view.deselect_subset(1).unwrap();
        assert!(view.is_empty());
        assert!(view.select_single_subset(2).is_err());
        assert!(!view.is_thread_safe_view());
    }

    #[test]
    fn test_partition_length_checked() {
        let parent = labelled(4);
        let partition = Partition::new(vec![0, 1, 0], 2).unwrap();
        assert!(matches!(
            SplittedExampleSet::new(parent.as_ref(), partition),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_stratified_split_balances_classes() {
        let parent = labelled(1000);
        let config = SamplingConfig::seeded(SamplingType::Stratified, 1992);
        let mut view =
            SplittedExampleSet::split(parent.as_ref(), &[0.5, 0.5], &config, &mut ScanMonitor::new())
                .unwrap();
        for group in 0..2 {
            view.select_single_subset(group).unwrap();
            let label = view.attributes().label().unwrap().clone();
            let even = view
                .examples()
                .filter(|e| e.value_as_string(&label) == "even")
                .count();
            assert_eq!(view.size(), 500);
            assert_eq!(even, 250);
        }
    }

    #[test]
    fn test_clone_selection_is_independent() {
        let parent = labelled(10);
        let config = SamplingConfig::seeded(SamplingType::Shuffled, 4);
        let view =
            SplittedExampleSet::split(parent.as_ref(), &[0.5, 0.5], &config, &mut ScanMonitor::new())
                .unwrap();
        let mut copy = view.clone();
        copy.select_single_subset(1).unwrap();
        assert_eq!(view.size(), 10);
        assert_eq!(copy.size(), 5);
        assert_ne!(view, copy);
    }

    #[test]
    fn test_split_selected_composes() {
        let parent = labelled(10);
        let linear = SamplingConfig::seeded(SamplingType::Linear, 0);
        let mut outer =
            SplittedExampleSet::split(parent.as_ref(), &[0.4, 0.6], &linear, &mut ScanMonitor::new())
                .unwrap();
        outer.select_single_subset(1).unwrap();
        assert_eq!(xs(&outer), vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

        let mut inner = outer
            .split_selected(&[0.5, 0.5], &linear, &mut ScanMonitor::new())
            .unwrap();
        assert_eq!(inner.number_of_subsets(), 2);
        assert_eq!(inner.size(), 6);

        inner.select_single_subset(0).unwrap();
        assert_eq!(xs(&inner), vec![4.0, 5.0, 6.0]);
        inner.invert_selection();
        assert_eq!(xs(&inner), vec![7.0, 8.0, 9.0]);
        inner.select_all_subsets();
        assert_eq!(inner.size(), 6);
    }

    #[test]
    fn test_split_by_attribute() {
        let set = ExampleSetBuilder::new()
            .regular(Attribute::nominal("city"))
            .rows(
                ["Bonn", "Aachen", "Bonn", "?", "Celle"]
                    .map(|c| vec![if c == "?" { Value::Missing } else { Value::from(c) }]),
            )
            .build()
            .unwrap();
        let mut view = SplittedExampleSet::split_by_attribute(&set, "city").unwrap();
        assert_eq!(view.number_of_subsets(), 3);
        assert_eq!(view.size(), 4);

        view.select_single_subset(0).unwrap();
        assert_eq!(view.partition().selected_indices(), &[1]);
        view.select_single_subset(1).unwrap();
        assert_eq!(view.partition().selected_indices(), &[0, 2]);

        assert!(SplittedExampleSet::split_by_attribute(&set, "town").is_err());
    }
}
