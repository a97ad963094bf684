/// The example set contract shared by every view
///
/// An [`ExampleSet`] is a row-oriented, column-typed logical dataset. The
/// base implementation reads a physical [`ExampleTable`] directly; every
/// other implementation is a lazy view over a cloned parent that remaps
/// rows, changes the attribute collection, or both.
///
/// Views own their attributes and any index, partition or weight state;
/// the physical table is the only thing they share.
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use log::{debug, info};
use serde::Serialize;

use crate::attribute::{Attribute, Attributes, BlockType, ValueType};
use crate::error::{Error, Result};
use crate::example::{Example, Examples};
use crate::monitor::{ScanMonitor, ScanOutcome};
use crate::statistics::{Statistics, StatisticsCache};
use crate::table::{DataRow, DataRowReader, ExampleTable};

/// Lookup from id value to view row positions.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    rows: HashMap<u64, Vec<usize>>,
}

impl IdIndex {
    fn build<'a>(id: &Attribute, examples: impl Iterator<Item = Example<'a>>) -> Self {
        let mut rows: HashMap<u64, Vec<usize>> = HashMap::new();
        for (position, example) in examples.enumerate() {
            let value = example.value(id);
            if !value.is_nan() {
                rows.entry(id_key(value)).or_default().push(position);
            }
        }
        IdIndex { rows }
    }

    pub fn get(&self, id: f64) -> Option<&[usize]> {
        self.rows.get(&id_key(id)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// -0.0 and 0.0 must land on the same key
fn id_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// State every view carries besides its attributes.
#[derive(Debug, Default)]
pub struct ViewState {
    statistics: StatisticsCache,
    id_index: OnceLock<IdIndex>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> &StatisticsCache {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut StatisticsCache {
        &mut self.statistics
    }

    /// The id index if it has been built.
    pub fn id_index(&self) -> Option<&IdIndex> {
        self.id_index.get()
    }

    pub fn reset_id_index(&mut self) {
        self.id_index = OnceLock::new();
    }
}

/// Clones keep the statistics snapshot and drop the id index.
impl Clone for ViewState {
    fn clone(&self) -> Self {
        ViewState {
            statistics: self.statistics.clone(),
            id_index: OnceLock::new(),
        }
    }
}

/// A dataset or a lazy view over one.
pub trait ExampleSet: fmt::Debug + Send + Sync {
    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Number of rows; equals the number of rows yielded by [`data_rows`](Self::data_rows).
    fn size(&self) -> usize;

    /// The physical storage this view reads from.
    fn example_table(&self) -> &dyn ExampleTable;

    /// Physical row behind view position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    fn data_row(&self, index: usize) -> DataRow;

    /// Physical rows in view order. Single pass; call again to restart.
    fn data_rows(&self) -> DataRowReader<'_>;

    /// Deep copy of this view and its owned state; the parent is cloned
    /// through its own `clone_box`, the physical table is shared.
    fn clone_box(&self) -> Box<dyn ExampleSet>;

    /// Whether concurrent read-only iteration from several threads is safe.
    fn is_thread_safe_view(&self) -> bool;

    fn view_state(&self) -> &ViewState;

    fn view_state_mut(&mut self) -> &mut ViewState;

    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn ExampleSet) -> bool;

    fn dyn_hash(&self, state: &mut dyn Hasher);

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Example at view position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    fn example(&self, index: usize) -> Example<'_> {
        Example::new(self.data_row(index), self.attributes(), self.example_table())
    }

    fn examples(&self) -> Examples<'_> {
        Examples::new(self.data_rows(), self.attributes(), self.example_table())
    }

    /// Recompute statistics for the named attributes in one scan.
    ///
    /// A cancelled scan leaves the cache untouched and reports
    /// [`ScanOutcome::Cancelled`].
    fn recalculate_statistics(
        &mut self,
        attribute_names: &[&str],
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<ScanOutcome> {
        let attributes = attribute_names
            .iter()
            .map(|name| {
                self.attributes()
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::attribute_not_found(*name))
            })
            .collect::<Result<Vec<Attribute>>>()?;
        let weight = self
            .attributes()
            .weight()
            .filter(|w| w.is_numerical())
            .cloned();

        let mut accumulators: Vec<Vec<Statistics>> =
            attributes.iter().map(Statistics::for_attribute).collect();
        let total = self.size();
        for (position, example) in self.examples().enumerate() {
            let row_weight = weight.as_ref().map_or(1.0, |w| example.value(w));
            for (attribute, stats) in attributes.iter().zip(accumulators.iter_mut()) {
                let value = example.value(attribute);
                for s in stats.iter_mut() {
                    s.count(value, row_weight);
                }
            }
            if let Err(Error::Stopped) = monitor.checkpoint(position + 1, total) {
                info!("statistics scan cancelled after {} of {} rows", position + 1, total);
                return Ok(ScanOutcome::Cancelled);
            }
        }
        monitor.finish(total);

        let cache = self.view_state_mut().statistics_mut();
        for (attribute, stats) in attributes.into_iter().zip(accumulators) {
            cache.store(attribute.name(), stats);
        }
        debug!("recalculated statistics for {} attributes over {} rows", attribute_names.len(), total);
        Ok(ScanOutcome::Completed)
    }

    /// Recompute statistics for every attribute.
    fn recalculate_all_statistics(&mut self, monitor: &mut ScanMonitor<'_>) -> Result<ScanOutcome> {
        let names: Vec<String> = self.attributes().all().map(|a| a.name().to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.recalculate_statistics(&names, monitor)
    }

    /// Cached statistic; NaN if never computed or the name is unknown.
    fn statistic(&self, attribute: &Attribute, name: &str, parameter: Option<&str>) -> f64 {
        self.view_state()
            .statistics()
            .statistic(attribute, name, parameter)
    }

    /// View positions of rows whose id equals `id`. Builds the index on first use.
    fn example_indices_from_id(&self, id: f64) -> Option<&[usize]> {
        let index = self.view_state().id_index.get_or_init(|| match self.attributes().id() {
            Some(attribute) => IdIndex::build(attribute, self.examples()),
            None => IdIndex::default(),
        });
        index.get(id)
    }

    /// First example whose id equals `id`.
    fn example_from_id(&self, id: f64) -> Option<Example<'_>> {
        let position = *self.example_indices_from_id(id)?.first()?;
        Some(self.example(position))
    }

    /// Drop the id index so the next lookup rebuilds it.
    fn remap_ids(&mut self) {
        self.view_state_mut().reset_id_index();
    }

    fn header_description(&self) -> HeaderDescription {
        HeaderDescription::from_attributes(self.attributes())
    }
}

impl Clone for Box<dyn ExampleSet> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn ExampleSet + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl Hash for dyn ExampleSet + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

/// Metadata of one attribute as exported to external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDescription {
    pub name: String,
    pub value_type: ValueType,
    pub block_type: BlockType,
    pub nominal_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Ordered attribute metadata of an example set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderDescription {
    pub attributes: Vec<AttributeDescription>,
}

impl HeaderDescription {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let attributes = attributes
            .roles()
            .iter()
            .map(|role| {
                let attribute = role.attribute();
                AttributeDescription {
                    name: attribute.name().to_string(),
                    value_type: attribute.value_type(),
                    block_type: attribute.block_type(),
                    nominal_values: attribute
                        .mapping()
                        .map(|m| m.values().to_vec())
                        .unwrap_or_default(),
                    role: role.special_name().map(str::to_string),
                }
            })
            .collect();
        HeaderDescription { attributes }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExampleSetBuilder;
    use crate::example::Value;
    use crate::monitor::CancellationToken;
    use crate::statistics::{AVERAGE, MAXIMUM, MODE, UNKNOWN};

    fn people() -> Box<dyn ExampleSet> {
        let set = ExampleSetBuilder::new()
            .id(Attribute::numeric("id"))
            .regular(Attribute::numeric("age"))
            .label(Attribute::nominal("class"))
            .row(vec![Value::Numeric(10.0), Value::Numeric(20.0), "a".into()])
            .row(vec![Value::Numeric(11.0), Value::Numeric(35.0), "b".into()])
            .row(vec![Value::Numeric(10.0), Value::Missing, "b".into()])
            .build()
            .unwrap();
        Box::new(set)
    }

    #[test]
    fn test_recalculate_statistics() {
        let mut set = people();
        let age = set.attributes().get("age").unwrap().clone();
        let class = set.attributes().get("class").unwrap().clone();

        assert!(set.statistic(&age, AVERAGE, None).is_nan());
        let outcome = set
            .recalculate_statistics(&["age", "class"], &mut ScanMonitor::new())
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Completed);

        assert_eq!(set.statistic(&age, AVERAGE, None), 27.5);
        assert_eq!(set.statistic(&age, MAXIMUM, None), 35.0);
        assert_eq!(set.statistic(&age, UNKNOWN, None), 1.0);
        assert_eq!(set.statistic(&class, MODE, None), 1.0);
    }

    #[test]
    fn test_recalculate_statistics_unknown_attribute() {
        let mut set = people();
        let err = set
            .recalculate_statistics(&["height"], &mut ScanMonitor::new())
            .unwrap_err();
        assert_eq!(err, Error::attribute_not_found("height"));
    }

    #[test]
    fn test_cancelled_scan_keeps_cache() {
        let mut set = people();
        let age = set.attributes().get("age").unwrap().clone();
        set.recalculate_statistics(&["age"], &mut ScanMonitor::new())
            .unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let outcome = set
            .recalculate_statistics(&["id"], &mut ScanMonitor::with_token(token))
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Cancelled);
        assert_eq!(set.statistic(&age, AVERAGE, None), 27.5);
        let id = set.attributes().get("id").unwrap().clone();
        assert!(set.statistic(&id, AVERAGE, None).is_nan());
    }

    #[test]
    fn test_statistics_idempotent_on_superset() {
        let mut set = people();
        let age = set.attributes().get("age").unwrap().clone();
        set.recalculate_statistics(&["age"], &mut ScanMonitor::new())
            .unwrap();
        let before = set.statistic(&age, AVERAGE, None);
        set.recalculate_all_statistics(&mut ScanMonitor::new())
            .unwrap();
        assert_eq!(set.statistic(&age, AVERAGE, None), before);
    }

    #[test]
    fn test_id_lookup() {
        let mut set = people();
        assert_eq!(set.example_indices_from_id(10.0), Some(&[0, 2][..]));
        assert_eq!(set.example_indices_from_id(12.0), None);

        let age = set.attributes().get("age").unwrap().clone();
        let example = set.example_from_id(11.0).unwrap();
        assert_eq!(example.value(&age), 35.0);

        assert!(set.view_state().id_index().is_some());
        set.remap_ids();
        assert!(set.view_state().id_index().is_none());
    }

    #[test]
    fn test_clone_resets_id_index_keeps_statistics() {
        let mut set = people();
        let age = set.attributes().get("age").unwrap().clone();
        set.recalculate_statistics(&["age"], &mut ScanMonitor::new())
            .unwrap();
        set.example_indices_from_id(10.0);

        let copy = set.clone();
        assert!(copy.view_state().id_index().is_none());
        assert_eq!(copy.statistic(&age, AVERAGE, None), 27.5);
        assert!(*copy == *set);
    }

    #[test]
    fn test_header_description_json() {
        let set = people();
        let header = set.header_description();
        assert_eq!(header.attributes.len(), 3);
        assert_eq!(header.attributes[2].nominal_values, vec!["a", "b"]);
        assert_eq!(header.attributes[2].role.as_deref(), Some("label"));

        let json = header.to_json().unwrap();
        assert!(json.contains(r#""name":"age""#));
        assert!(json.contains(r#""value_type":"nominal""#));
        assert!(json.contains(r#""role":"id""#));
    }
}
