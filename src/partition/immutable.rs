use std::sync::Arc;

use crate::error::{Error, Result};

use super::PartitionBuilder;

/// A fixed row → group assignment.
///
/// Selections never modify the partition; each returns a fresh ascending
/// row list. Clones share the assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImmutablePartition {
    elements: Arc<[usize]>,
    number_of_groups: usize,
}

impl ImmutablePartition {
    pub fn new(elements: Vec<usize>, number_of_groups: usize) -> Result<Self> {
        if number_of_groups == 0 {
            return Err(Error::invalid_argument("a partition needs at least one group"));
        }
        if let Some(&group) = elements.iter().find(|&&g| g >= number_of_groups) {
            return Err(Error::IndexOutOfRange {
                index: group,
                len: number_of_groups,
            });
        }
        Ok(ImmutablePartition {
            elements: elements.into(),
            number_of_groups,
        })
    }

    pub fn from_builder(builder: &PartitionBuilder, ratios: &[f64], size: usize) -> Result<Self> {
        Self::new(builder.create_partition(ratios, size)?, ratios.len())
    }

    /// Rows belonging to any of `groups`, ascending.
    pub fn select(&self, groups: &[usize]) -> Result<Vec<usize>> {
        let mut mask = vec![false; self.number_of_groups];
        for &group in groups {
            *mask.get_mut(group).ok_or(Error::IndexOutOfRange {
                index: group,
                len: self.number_of_groups,
            })? = true;
        }
        Ok(self.rows_where(|g| mask[g]))
    }

    pub fn select_single(&self, group: usize) -> Result<Vec<usize>> {
        self.select(&[group])
    }

    /// Rows of every group except `group`, ascending.
    pub fn select_all_but(&self, group: usize) -> Result<Vec<usize>> {
        if group >= self.number_of_groups {
            return Err(Error::IndexOutOfRange {
                index: group,
                len: self.number_of_groups,
            });
        }
        Ok(self.rows_where(|g| g != group))
    }

    fn rows_where(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, &g)| keep(g))
            .map(|(row, _)| row)
            .collect()
    }

    pub fn group_of(&self, row: usize) -> Option<usize> {
        self.elements.get(row).copied()
    }

    pub fn number_of_groups(&self) -> usize {
        self.number_of_groups
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.number_of_groups];
        for &group in self.elements.iter() {
            sizes[group] += 1;
        }
        sizes
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_returns_fresh_arrays() {
        let partition = ImmutablePartition::new(vec![1, 0, 1, 2, 0], 3).unwrap();
        assert_eq!(partition.select_single(0).unwrap(), vec![1, 4]);
        assert_eq!(partition.select(&[2, 1]).unwrap(), vec![0, 2, 3]);
        assert_eq!(partition.select_all_but(1).unwrap(), vec![1, 3, 4]);
        assert_eq!(partition.select(&[]).unwrap(), Vec::<usize>::new());
        assert_eq!(partition.group_sizes(), vec![2, 2, 1]);
    }

    #[test]
    fn test_out_of_range_groups() {
        let partition = ImmutablePartition::new(vec![0, 1], 2).unwrap();
        assert!(partition.select(&[2]).is_err());
        assert!(partition.select_all_but(5).is_err());
        assert!(ImmutablePartition::new(vec![0, 2], 2).is_err());
    }

    #[test]
    fn test_cross_validation_folds_cover_rows() {
        let folds = 4;
        let partition = ImmutablePartition::from_builder(
            &PartitionBuilder::Shuffled { seed: Some(11) },
            &[0.25; 4],
            21,
        )
        .unwrap();
        for fold in 0..folds {
            let mut rows = partition.select_single(fold).unwrap();
            rows.extend(partition.select_all_but(fold).unwrap());
            rows.sort_unstable();
            assert_eq!(rows, (0..21).collect::<Vec<_>>());
        }
    }
}
