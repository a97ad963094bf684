use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use log::debug;
use rand::Rng;

use crate::attribute::Attributes;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::partition::seeded_rng;
use crate::table::{DataRow, DataRowReader, ExampleTable};
use crate::transformation::AttributeTransformation;

use super::view_plumbing;

/// A view scaling each numerical regular attribute by a weight.
///
/// Every numerical regular attribute gets a weighting step whose factor
/// mirrors its entry in the weight table. An attribute with weight 0 counts
/// as unused. Nominal and special attributes are never weighted.
#[derive(Debug, Clone)]
pub struct AttributeWeightedExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    weights: BTreeMap<String, f64>,
    state: ViewState,
}

impl AttributeWeightedExampleSet {
    /// Weight the numerical regular attributes of `parent`.
    ///
    /// Attributes absent from `weights` get weight 1. Naming an attribute
    /// that does not exist or cannot be weighted is an error.
    pub fn new(parent: &dyn ExampleSet, weights: Option<&BTreeMap<String, f64>>) -> Result<Self> {
        let mut attributes = parent.attributes().clone();
        let initial = weights.cloned().unwrap_or_default();
        for name in initial.keys() {
            if attributes.get_regular(name).is_none() {
                return Err(Error::attribute_not_found(name.as_str()));
            }
        }

        let mut table = BTreeMap::new();
        for attribute in attributes.regular_mut() {
            let explicit = initial.get(attribute.name()).copied();
            if !attribute.is_numerical() && explicit.is_none() {
                continue;
            }
            let weight = explicit.unwrap_or(1.0);
            attribute.add_transformation(AttributeTransformation::weighting(weight))?;
            table.insert(attribute.name().to_string(), weight);
        }
        debug!("weighted view over {} attributes", table.len());

        Ok(AttributeWeightedExampleSet {
            parent: parent.clone_box(),
            attributes,
            weights: table,
            state: ViewState::new(),
        })
    }

    /// Weight of `name`, if it is weighted by this view.
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    pub fn set_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        let slot = self
            .weights
            .get_mut(name)
            .ok_or_else(|| Error::attribute_not_found(name))?;
        *slot = weight;
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.set_weighting(weight);
        }
        Ok(())
    }

    pub fn is_attribute_used(&self, name: &str) -> bool {
        self.weight(name).is_some_and(|w| w != 0.0)
    }

    /// Number of weighted attributes with a non-zero weight.
    pub fn used_count(&self) -> usize {
        self.weights.values().filter(|w| **w != 0.0).count()
    }

    /// Give every weighted attribute weight 1.
    pub fn select_all(&mut self) {
        self.set_all(1.0);
    }

    /// Give every weighted attribute weight 0.
    pub fn deselect_all(&mut self) {
        self.set_all(0.0);
    }

    fn set_all(&mut self, weight: f64) {
        let names: Vec<String> = self.weights.keys().cloned().collect();
        for name in names {
            self.write_weight(&name, weight);
        }
    }

    fn write_weight(&mut self, name: &str, weight: f64) {
        self.weights.insert(name.to_string(), weight);
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.set_weighting(weight);
        }
    }

    /// Switch `name` between used (weight 1) and unused (weight 0).
    pub fn flip_attribute_used(&mut self, name: &str) -> Result<()> {
        let weight = if self.is_attribute_used(name) { 0.0 } else { 1.0 };
        self.set_weight(name, weight)
    }

    /// Use a random subset of about `n` attributes.
    ///
    /// Each attribute is used with probability `n / total`. If the draw
    /// selects nothing, one attribute chosen uniformly is used instead.
    pub fn select_random_subset(&mut self, n: usize, seed: Option<u64>) {
        let total = self.weights.len();
        if total == 0 {
            return;
        }
        let probability = (n as f64 / total as f64).min(1.0);
        let mut rng = seeded_rng(seed);
        let names: Vec<String> = self.weights.keys().cloned().collect();
        let picks: Vec<bool> = names.iter().map(|_| rng.gen_bool(probability)).collect();
        let fallback = if picks.contains(&true) {
            None
        } else {
            Some(rng.gen_range(0..total))
        };
        for (position, (name, picked)) in names.iter().zip(picks).enumerate() {
            let used = picked || fallback == Some(position);
            self.write_weight(name, if used { 1.0 } else { 0.0 });
        }
    }

    /// A copy without the attributes whose weight is 0.
    pub fn create_clean_clone(&self) -> AttributeWeightedExampleSet {
        let mut clean = self.clone();
        let unused: Vec<String> = self
            .weights
            .iter()
            .filter(|(_, w)| **w == 0.0)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &unused {
            clean.weights.remove(name);
            clean.attributes.remove(name);
        }
        debug!("clean clone dropped {} unused attributes", unused.len());
        clean
    }
}

impl PartialEq for AttributeWeightedExampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.weights == other.weights
    }
}

impl Hash for AttributeWeightedExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attributes.hash(state);
        for (name, weight) in &self.weights {
            name.hash(state);
            weight.to_bits().hash(state);
        }
    }
}

impl ExampleSet for AttributeWeightedExampleSet {
    view_plumbing!();

    fn size(&self) -> usize {
        self.parent.size()
    }

    fn example_table(&self) -> &dyn ExampleTable {
        self.parent.example_table()
    }

    fn data_row(&self, index: usize) -> DataRow {
        self.parent.data_row(index)
    }

    fn data_rows(&self) -> DataRowReader<'_> {
        self.parent.data_rows()
    }

    fn is_thread_safe_view(&self) -> bool {
        false
    }
}
