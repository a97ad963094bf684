//! Concrete example set views
//!
//! Views are lazy: they hold a cloned parent, their own attribute
//! collection and a small amount of index state, and never copy the
//! physical table. Row-mapping views keep a `view_to_parent` index array;
//! column views only rewrite the attribute collection.
//!
//! Views compose: any view accepts any other as its parent. The pairwise
//! view is the exception to row mapping: its rows are pairs of parent rows,
//! read through a virtual table computed on access.

/// Trait plumbing shared by every view that stores `attributes` and `state` fields.
macro_rules! view_plumbing {
    () => {
        fn attributes(&self) -> &$crate::attribute::Attributes {
            &self.attributes
        }

        fn attributes_mut(&mut self) -> &mut $crate::attribute::Attributes {
            &mut self.attributes
        }

        fn view_state(&self) -> &$crate::example_set::ViewState {
            &self.state
        }

        fn view_state_mut(&mut self) -> &mut $crate::example_set::ViewState {
            &mut self.state
        }

        fn clone_box(&self) -> Box<dyn $crate::example_set::ExampleSet> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn dyn_eq(&self, other: &dyn $crate::example_set::ExampleSet) -> bool {
            other
                .as_any()
                .downcast_ref::<Self>()
                .map_or(false, |other| self == other)
        }

        fn dyn_hash(&self, mut state: &mut dyn ::std::hash::Hasher) {
            ::std::hash::Hash::hash(self, &mut state)
        }
    };
}

pub(crate) use view_plumbing;

mod attribute_selection;
mod conditioned;
mod header;
mod mapped;
mod model;
mod pairwise;
mod remapped;
mod replace_missing;
mod simple;
mod sorted;
mod splitted;
mod weighted;

pub use attribute_selection::AttributeSelectionExampleSet;
pub use conditioned::ConditionedExampleSet;
pub use header::HeaderExampleSet;
pub use mapped::MappedExampleSet;
pub use model::ModelViewExampleSet;
pub use pairwise::{
    EuclideanDistance, PairMeasure, PairwiseExampleSet, FIRST_ID_NAME, PAIR_VALUE_NAME,
    SECOND_ID_NAME,
};
pub use remapped::RemappedExampleSet;
pub use replace_missing::ReplaceMissingExampleSet;
pub use simple::SimpleExampleSet;
pub use sorted::{SortDirection, SortedExampleSet};
pub use splitted::SplittedExampleSet;
pub use weighted::AttributeWeightedExampleSet;
