/// Row partitions for splitting and cross-validation
///
/// A partition assigns every row of a parent example set to one of a fixed
/// number of groups. [`Partition`] keeps a selection mask and mutates it in
/// place, recomputing the ascending list of selected rows on every change.
/// [`ImmutablePartition`] never changes and hands out fresh index arrays.
/// Both are built by the algorithms in [`builder`].
use crate::error::{Error, Result};

pub mod builder;
mod immutable;

pub use builder::{check_ratios, seeded_rng, PartitionBuilder, RATIO_TOLERANCE};
pub use immutable::ImmutablePartition;

/// A row → group assignment with a mutable group selection.
///
/// Groups `0..number_of_subsets()` are visible. A partition built with
/// [`Partition::with_hidden_group`] carries one extra group after them that
/// can never be selected; it holds rows hidden by an enclosing selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    elements: Vec<usize>,
    mask: Vec<bool>,
    visible_groups: usize,
    selected: Vec<usize>,
}

impl Partition {
    /// Partition with `number_of_groups` groups, all selected.
    pub fn new(elements: Vec<usize>, number_of_groups: usize) -> Result<Self> {
        Self::build(elements, number_of_groups, number_of_groups)
    }

    /// Partition with `visible_groups` selectable groups plus one hidden group
    /// with index `visible_groups`.
    pub fn with_hidden_group(elements: Vec<usize>, visible_groups: usize) -> Result<Self> {
        Self::build(elements, visible_groups + 1, visible_groups)
    }

    /// Run `builder` over `size` rows with one group per ratio.
    pub fn from_builder(builder: &PartitionBuilder, ratios: &[f64], size: usize) -> Result<Self> {
        let elements = builder.create_partition(ratios, size)?;
        Self::new(elements, ratios.len())
    }

    fn build(elements: Vec<usize>, total_groups: usize, visible_groups: usize) -> Result<Self> {
        if visible_groups == 0 {
            return Err(Error::invalid_argument("a partition needs at least one group"));
        }
        if let Some(&group) = elements.iter().find(|&&g| g >= total_groups) {
            return Err(Error::IndexOutOfRange {
                index: group,
                len: total_groups,
            });
        }
        let mut mask = vec![true; total_groups];
        if total_groups > visible_groups {
            mask[visible_groups] = false;
        }
        let mut partition = Partition {
            elements,
            mask,
            visible_groups,
            selected: Vec::new(),
        };
        partition.update_selection();
        Ok(partition)
    }

    fn update_selection(&mut self) {
        let mask = &self.mask;
        self.selected = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, &group)| mask[group])
            .map(|(row, _)| row)
            .collect();
    }

    fn check_group(&self, group: usize) -> Result<()> {
        if group >= self.visible_groups {
            return Err(Error::IndexOutOfRange {
                index: group,
                len: self.visible_groups,
            });
        }
        Ok(())
    }

    /// Add `group` to the selection.
    pub fn select_subset(&mut self, group: usize) -> Result<()> {
        self.check_group(group)?;
        self.mask[group] = true;
        self.update_selection();
        Ok(())
    }

    /// Remove `group` from the selection.
    pub fn deselect_subset(&mut self, group: usize) -> Result<()> {
        self.check_group(group)?;
        self.mask[group] = false;
        self.update_selection();
        Ok(())
    }

    /// Select only `group`.
    pub fn select_single_subset(&mut self, group: usize) -> Result<()> {
        self.check_group(group)?;
        for (g, selected) in self.mask.iter_mut().enumerate() {
            *selected = g == group;
        }
        self.update_selection();
        Ok(())
    }

    /// Select every visible group except `group`.
    pub fn select_all_subsets_but(&mut self, group: usize) -> Result<()> {
        self.check_group(group)?;
        let visible = self.visible_groups;
        for (g, selected) in self.mask.iter_mut().enumerate() {
            *selected = g < visible && g != group;
        }
        self.update_selection();
        Ok(())
    }

    pub fn select_all_subsets(&mut self) {
        let visible = self.visible_groups;
        for (g, selected) in self.mask.iter_mut().enumerate() {
            *selected = g < visible;
        }
        self.update_selection();
    }

    pub fn clear_selection(&mut self) {
        self.mask.iter_mut().for_each(|selected| *selected = false);
        self.update_selection();
    }

    /// Flip the selection of every visible group.
    pub fn invert_selection(&mut self) {
        for selected in &mut self.mask[..self.visible_groups] {
            *selected = !*selected;
        }
        self.update_selection();
    }

    /// Number of selectable groups.
    pub fn number_of_subsets(&self) -> usize {
        self.visible_groups
    }

    /// Number of rows in the partition, selected or not.
    pub fn total_size(&self) -> usize {
        self.elements.len()
    }

    pub fn selection_size(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected_group(&self, group: usize) -> bool {
        self.mask.get(group).copied().unwrap_or(false)
    }

    /// Group of partition row `row`, if in range.
    pub fn group_of(&self, row: usize) -> Option<usize> {
        self.elements.get(row).copied()
    }

    /// Row of the partition holding the `index`-th selected row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= selection_size()`.
    pub fn map_index(&self, index: usize) -> usize {
        let size = self.selected.len();
        assert!(index < size, "index {index} out of range for selection of {size} rows");
        self.selected[index]
    }

    /// Selected rows in ascending order.
    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    /// Number of rows in each visible group.
    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.visible_groups];
        for &group in &self.elements {
            if group < self.visible_groups {
                sizes[group] += 1;
            }
        }
        sizes
    }

    /// Group of every row.
    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    /// Re-partition the selected rows.
    ///
    /// `inner[i]` assigns the `i`-th selected row to one of `inner_groups`
    /// groups. Every row not currently selected lands in the hidden group of
    /// the result, so the result covers the same rows as `self`.
    pub fn compose(&self, inner: &[usize], inner_groups: usize) -> Result<Partition> {
        if inner.len() != self.selected.len() {
            return Err(Error::length_mismatch(
                "inner partition",
                self.selected.len(),
                inner.len(),
            ));
        }
        let mut elements = vec![inner_groups; self.elements.len()];
        for (&row, &group) in self.selected.iter().zip(inner) {
            elements[row] = group;
        }
        Partition::with_hidden_group(elements, inner_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups() -> Partition {
        Partition::new(vec![0, 1, 2, 0, 1, 2, 0], 3).unwrap()
    }

    #[test]
    fn test_new_selects_everything() {
        let partition = three_groups();
        assert_eq!(partition.selected_indices(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(partition.number_of_subsets(), 3);
        assert_eq!(partition.group_sizes(), vec![3, 2, 2]);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Partition::new(vec![0, 3], 3).is_err());
        assert!(Partition::new(vec![], 0).is_err());
        assert!(Partition::new(vec![], 2).unwrap().selected_indices().is_empty());
    }

    #[test]
    fn test_selection_operations() {
        let mut partition = three_groups();
        partition.select_single_subset(1).unwrap();
        assert_eq!(partition.selected_indices(), &[1, 4]);

        partition.select_subset(2).unwrap();
        assert_eq!(partition.selected_indices(), &[1, 2, 4, 5]);

        partition.deselect_subset(1).unwrap();
        assert_eq!(partition.selected_indices(), &[2, 5]);

        partition.select_all_subsets_but(0).unwrap();
        assert_eq!(partition.selected_indices(), &[1, 2, 4, 5]);

        partition.invert_selection();
        assert_eq!(partition.selected_indices(), &[0, 3, 6]);
        assert_eq!(partition.map_index(2), 6);

        partition.clear_selection();
        assert_eq!(partition.selection_size(), 0);

        partition.select_all_subsets();
        assert_eq!(partition.selection_size(), 7);

        assert!(partition.select_subset(3).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_map_index_out_of_range() {
        let mut partition = three_groups();
        partition.select_single_subset(1).unwrap();
        partition.map_index(2);
    }

    #[test]
    fn test_compose_hides_unselected_rows() {
        let mut outer = three_groups();
        outer.select_all_subsets_but(2).unwrap();
        assert_eq!(outer.selected_indices(), &[0, 1, 3, 4, 6]);

        let mut composed = outer.compose(&[0, 1, 0, 1, 0], 2).unwrap();
        assert_eq!(composed.number_of_subsets(), 2);
        assert_eq!(composed.elements(), &[0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(composed.selected_indices(), &[0, 1, 3, 4, 6]);

        composed.select_single_subset(1).unwrap();
        assert_eq!(composed.selected_indices(), &[1, 4]);

        // the hidden group never comes back
        composed.invert_selection();
        assert_eq!(composed.selected_indices(), &[0, 3, 6]);
        composed.select_all_subsets();
        assert_eq!(composed.selection_size(), 5);
        assert!(composed.select_subset(2).is_err());
        assert!(!composed.is_selected_group(2));

        assert!(outer.compose(&[0, 1], 2).is_err());
    }

    #[test]
    fn test_from_builder() {
        let partition =
            Partition::from_builder(&PartitionBuilder::Linear, &[0.5, 0.5], 4).unwrap();
        assert_eq!(partition.elements(), &[0, 0, 1, 1]);
    }
}
