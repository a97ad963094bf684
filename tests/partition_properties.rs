//! Property-based tests for partitioning and index-mapping views.
//!
//! Uses proptest to check that every partition builder covers each row
//! exactly once and that selections and complements stay consistent.

use proptest::prelude::*;

use exampleset::{
    Attribute, ExampleSet, ExampleSetBuilder, ImmutablePartition, MappedExampleSet, Partition,
    PartitionBuilder, Value,
};

/// Ratios summing to one, built from positive integer weights.
fn ratios_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1u32..100, 1..6).prop_map(|weights| {
        let total: u32 = weights.iter().sum();
        weights.iter().map(|w| *w as f64 / total as f64).collect()
    })
}

fn group_sizes(groups: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0; k];
    for &g in groups {
        sizes[g] += 1;
    }
    sizes
}

fn numbers(n: usize) -> Box<dyn ExampleSet> {
    Box::new(
        ExampleSetBuilder::new()
            .regular(Attribute::numeric("x"))
            .rows((0..n).map(|i| vec![Value::Numeric(i as f64)]))
            .build()
            .unwrap(),
    )
}

proptest! {
    /// Linear partitions assign every row to a valid group.
    #[test]
    fn prop_linear_covers_rows(ratios in ratios_strategy(), extra in 0usize..200) {
        let size = ratios.len() + extra;
        let groups = PartitionBuilder::Linear.create_partition(&ratios, size).unwrap();
        prop_assert_eq!(groups.len(), size);
        prop_assert!(groups.iter().all(|g| *g < ratios.len()));
        prop_assert!(groups.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Shuffling permutes the linear solution.
    #[test]
    fn prop_shuffled_keeps_group_sizes(
        ratios in ratios_strategy(),
        extra in 0usize..200,
        seed in any::<u64>(),
    ) {
        let size = ratios.len() + extra;
        let k = ratios.len();
        let linear = PartitionBuilder::Linear.create_partition(&ratios, size).unwrap();
        let shuffled = PartitionBuilder::Shuffled { seed: Some(seed) }
            .create_partition(&ratios, size)
            .unwrap();
        prop_assert_eq!(group_sizes(&linear, k), group_sizes(&shuffled, k));
    }

    /// Stratified partitions stay close to the linear group sizes.
    #[test]
    fn prop_stratified_group_sizes(
        ratios in ratios_strategy(),
        labels in prop::collection::vec(0u8..4, 1..300),
        seed in any::<u64>(),
    ) {
        prop_assume!(labels.len() >= ratios.len());
        let size = labels.len();
        let k = ratios.len();
        let classes = {
            let mut distinct = labels.clone();
            distinct.sort_unstable();
            distinct.dedup();
            distinct.len()
        };
        let builder = PartitionBuilder::Stratified {
            labels: labels.iter().map(|l| *l as f64).collect(),
            seed: Some(seed),
        };
        let groups = builder.create_partition(&ratios, size).unwrap();
        prop_assert_eq!(groups.len(), size);

        let linear = group_sizes(&PartitionBuilder::Linear.create_partition(&ratios, size).unwrap(), k);
        let stratified = group_sizes(&groups, k);
        prop_assert_eq!(stratified.iter().sum::<usize>(), size);
        for (a, b) in linear.iter().zip(&stratified) {
            prop_assert!(a.abs_diff(*b) <= classes + 1, "linear {:?} vs stratified {:?}", linear, stratified);
        }
    }

    /// Selecting every group yields each row once, ascending.
    #[test]
    fn prop_select_all_round_trip(ratios in ratios_strategy(), extra in 0usize..200, seed in any::<u64>()) {
        let size = ratios.len() + extra;
        let builder = PartitionBuilder::Shuffled { seed: Some(seed) };
        let mut partition = Partition::from_builder(&builder, &ratios, size).unwrap();
        partition.clear_selection();
        partition.select_all_subsets();
        let expected_all: Vec<usize> = (0..size).collect();
        prop_assert_eq!(partition.selected_indices(), expected_all.as_slice());

        let immutable = ImmutablePartition::new(partition.elements().to_vec(), ratios.len()).unwrap();
        let all: Vec<usize> = (0..ratios.len()).collect();
        prop_assert_eq!(immutable.select(&all).unwrap(), (0..size).collect::<Vec<_>>());
    }

    /// A single-group selection lists exactly that group's rows, ascending.
    #[test]
    fn prop_single_selection_matches_groups(
        ratios in ratios_strategy(),
        extra in 0usize..100,
        seed in any::<u64>(),
        pick in any::<prop::sample::Index>(),
    ) {
        let size = ratios.len() + extra;
        let group = pick.index(ratios.len());
        let builder = PartitionBuilder::Shuffled { seed: Some(seed) };
        let mut partition = Partition::from_builder(&builder, &ratios, size).unwrap();
        partition.select_single_subset(group).unwrap();
        let expected: Vec<usize> = (0..size)
            .filter(|row| partition.group_of(*row) == Some(group))
            .collect();
        prop_assert_eq!(partition.selected_indices(), expected.as_slice());

        partition.invert_selection();
        prop_assert_eq!(partition.selection_size(), size - expected.len());
    }

    /// The inverted mapped view is the sorted complement of its mapping.
    #[test]
    fn prop_inverted_mapping_is_complement(
        size in 0usize..60,
        mapping in prop::collection::vec(any::<prop::sample::Index>(), 0..80),
    ) {
        prop_assume!(size > 0 || mapping.is_empty());
        let parent = numbers(size);
        let mapping: Vec<usize> = mapping.iter().map(|i| i.index(size.max(1))).collect();
        let view = MappedExampleSet::with_options(parent.as_ref(), mapping.clone(), true, false).unwrap();
        let expected: Vec<usize> = (0..size).filter(|i| !mapping.contains(i)).collect();
        prop_assert_eq!(view.mapping(), expected.as_slice());
        prop_assert_eq!(view.size(), expected.len());
        prop_assert_eq!(view.examples().count(), expected.len());
    }
}
