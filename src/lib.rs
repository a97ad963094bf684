//! ExampleSet - Lazy, Composable Views over Tabular Example Data
//!
//! An example set is a table of rows (examples) over named, typed columns
//! (attributes). Views subset, reorder, filter, partition and re-type an
//! example set without copying its physical table, and stack on top of each
//! other. Partition builders assign rows to groups (linear, shuffled or
//! class-stratified) for splitting, sampling and cross-validation.

pub mod attribute;
pub mod builder;
pub mod condition;
pub mod config;
pub mod error;
pub mod example;
pub mod example_set;
pub mod mapping;
pub mod monitor;
pub mod partition;
pub mod statistics;
pub mod table;
pub mod transformation;
pub mod view;

pub use attribute::{Attribute, AttributeRole, Attributes, BlockType, ValueType};
pub use builder::ExampleSetBuilder;
pub use condition::{
    AcceptAllCondition, AndCondition, AttributeValueFilter, Condition, ConditionRegistry,
    ExpressionCondition, MissingAttributesCondition, MissingLabelCondition, OrCondition,
    PredictionCondition, ValueMatchesCondition,
};
pub use config::{SamplingConfig, SamplingType, ScanConfig};
pub use error::{Error, Result};
pub use example::{Example, Examples, Value};
pub use example_set::{ExampleSet, HeaderDescription};
pub use mapping::NominalMapping;
pub use monitor::{CancellationToken, ScanMonitor, ScanOutcome};
pub use partition::{ImmutablePartition, Partition, PartitionBuilder};
pub use table::{DataRow, ExampleTable, MemoryExampleTable};
pub use transformation::{AttributeTransformation, ReplacementTable, ViewModel};
pub use view::{
    AttributeSelectionExampleSet, AttributeWeightedExampleSet, ConditionedExampleSet,
    EuclideanDistance, HeaderExampleSet, MappedExampleSet, ModelViewExampleSet, PairMeasure,
    PairwiseExampleSet, RemappedExampleSet, ReplaceMissingExampleSet, SimpleExampleSet,
    SortDirection, SortedExampleSet, SplittedExampleSet,
};
