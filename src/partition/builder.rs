//! Partition algorithms: assign each of `size` rows to one of `ratios.len()` groups.
//!
//! Linear partitions cut the rows into contiguous blocks with boundaries
//! `round(size * cumulative_ratio)`. Shuffled partitions permute a linear
//! solution. Stratified partitions keep per-class proportions of a nominal
//! label in every group.

use std::collections::BTreeMap;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{SamplingConfig, SamplingType};
use crate::error::{Error, Result};
use crate::example_set::ExampleSet;
use crate::monitor::ScanMonitor;

/// Allowed deviation of the ratio sum from 1.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// Seeded generator, or one seeded from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Reject empty, negative or non-normalised ratio lists.
pub fn check_ratios(ratios: &[f64]) -> Result<()> {
    if ratios.is_empty() {
        return Err(Error::invalid_ratios("at least one ratio is required"));
    }
    if let Some(bad) = ratios.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(Error::invalid_ratios(format!(
            "ratios must be non-negative, got {bad}"
        )));
    }
    let sum: f64 = ratios.iter().sum();
    if (sum - 1.0).abs() > RATIO_TOLERANCE {
        return Err(Error::invalid_ratios(format!("ratios sum to {sum}, not 1")));
    }
    Ok(())
}

/// Contiguous-block partition. Assumes valid ratios.
fn linear_partition(ratios: &[f64], size: usize) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(ratios.len());
    let mut cumulative = 0.0;
    for ratio in ratios {
        cumulative += ratio;
        boundaries.push(((size as f64 * cumulative).round() as usize).min(size));
    }
    if let Some(last) = boundaries.last_mut() {
        *last = size;
    }

    let mut groups = Vec::with_capacity(size);
    let mut group = 0;
    for row in 0..size {
        while row >= boundaries[group] {
            group += 1;
        }
        groups.push(group);
    }
    groups
}

fn all_equal(ratios: &[f64]) -> bool {
    ratios
        .iter()
        .all(|r| (r - ratios[0]).abs() < RATIO_TOLERANCE)
}

/// Total order on labels with missing labels last.
fn compare_labels(a: f64, b: f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// A partition algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionBuilder {
    Linear,
    Shuffled {
        seed: Option<u64>,
    },
    /// `labels[row]` is the class of each row (NaN forms its own class).
    Stratified {
        labels: Vec<f64>,
        seed: Option<u64>,
    },
}

impl PartitionBuilder {
    /// Pick the builder described by `config` for rows of `set`.
    ///
    /// Stratification reads the label of every row (polling `monitor`). When
    /// `set` has no nominal label, stratified sampling falls back to shuffled
    /// sampling with a warning, or fails in strict mode.
    pub fn for_example_set(
        set: &dyn ExampleSet,
        config: &SamplingConfig,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let has_nominal_label = set.attributes().label().is_some_and(|l| l.is_nominal());
        match config.sampling_type {
            SamplingType::Linear => Ok(PartitionBuilder::Linear),
            SamplingType::Shuffled => Ok(PartitionBuilder::Shuffled { seed: config.seed }),
            SamplingType::Automatic if !has_nominal_label => {
                debug!("no nominal label, automatic sampling uses shuffled sampling");
                Ok(PartitionBuilder::Shuffled { seed: config.seed })
            }
            SamplingType::Stratified if !has_nominal_label => {
                let message = match set.attributes().label() {
                    Some(label) => format!(
                        "label '{}' is {}, not nominal",
                        label.name(),
                        label.value_type()
                    ),
                    None => "example set has no label".to_string(),
                };
                if config.strict_stratification {
                    return Err(Error::StratificationUnavailable { message });
                }
                warn!("stratified sampling not possible ({message}), using shuffled sampling");
                Ok(PartitionBuilder::Shuffled { seed: config.seed })
            }
            SamplingType::Stratified | SamplingType::Automatic => {
                Self::stratified(set, config.seed, monitor)
            }
        }
    }

    /// Stratified builder over the label values of `set`.
    pub fn stratified(
        set: &dyn ExampleSet,
        seed: Option<u64>,
        monitor: &mut ScanMonitor<'_>,
    ) -> Result<Self> {
        let label = set
            .attributes()
            .label()
            .filter(|l| l.is_nominal())
            .cloned()
            .ok_or_else(|| Error::StratificationUnavailable {
                message: "example set has no nominal label".to_string(),
            })?;
        let total = set.size();
        let mut labels = Vec::with_capacity(total);
        for (position, example) in set.examples().enumerate() {
            labels.push(example.value(&label));
            monitor.checkpoint(position + 1, total)?;
        }
        Ok(PartitionBuilder::Stratified { labels, seed })
    }

    /// Group of every row, `result[row] < ratios.len()`.
    pub fn create_partition(&self, ratios: &[f64], size: usize) -> Result<Vec<usize>> {
        check_ratios(ratios)?;
        match self {
            PartitionBuilder::Linear => Ok(linear_partition(ratios, size)),
            PartitionBuilder::Shuffled { seed } => {
                let mut groups = linear_partition(ratios, size);
                groups.shuffle(&mut seeded_rng(*seed));
                Ok(groups)
            }
            PartitionBuilder::Stratified { labels, seed } => {
                if labels.len() != size {
                    return Err(Error::length_mismatch("stratification labels", size, labels.len()));
                }
                let mut rng = seeded_rng(*seed);
                if all_equal(ratios) {
                    Ok(stratify_equal(ratios, labels, &mut rng))
                } else {
                    Ok(stratify_per_class(ratios, labels, &mut rng))
                }
            }
        }
    }
}

/// Shuffle, group by class, deal rows round-robin into `k` lists and cut
/// the concatenation with linear boundaries.
fn stratify_equal(ratios: &[f64], labels: &[f64], rng: &mut StdRng) -> Vec<usize> {
    let k = ratios.len();
    let mut pairs: Vec<(usize, f64)> = labels.iter().copied().enumerate().collect();
    pairs.shuffle(rng);
    pairs.sort_by(|a, b| compare_labels(a.1, b.1));

    let mut dealt: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (position, (row, _)) in pairs.into_iter().enumerate() {
        dealt[position % k].push(row);
    }

    let linear = linear_partition(ratios, labels.len());
    let mut groups = vec![0; labels.len()];
    for (position, row) in dealt.into_iter().flatten().enumerate() {
        groups[row] = linear[position];
    }
    groups
}

/// Linear partition of each shuffled class independently.
fn stratify_per_class(ratios: &[f64], labels: &[f64], rng: &mut StdRng) -> Vec<usize> {
    let mut classes: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        let key = if label.is_nan() { u64::MAX } else { label.to_bits() };
        classes.entry(key).or_default().push(row);
    }

    let mut groups = vec![0; labels.len()];
    for rows in classes.values_mut() {
        rows.shuffle(rng);
        for (row, group) in rows.iter().zip(linear_partition(ratios, rows.len())) {
            groups[*row] = group;
        }
    }
    groups
}
