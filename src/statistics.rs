//! Running statistics accumulators and the per-view statistics cache.
//!
//! Each attribute gets the accumulators that make sense for its type. A scan
//! feeds every row's `(value, weight)` pair to all of them; the finished
//! accumulators are then stored in the view's [`StatisticsCache`] and
//! queried by name.

use std::collections::{BTreeMap, HashMap};

use crate::attribute::Attribute;

pub const AVERAGE: &str = "average";
pub const AVERAGE_WEIGHTED: &str = "average_weighted";
pub const VARIANCE: &str = "variance";
pub const VARIANCE_WEIGHTED: &str = "variance_weighted";
pub const MINIMUM: &str = "minimum";
pub const MAXIMUM: &str = "maximum";
pub const SUM: &str = "sum";
pub const SUM_WEIGHTED: &str = "sum_weighted";
pub const MODE: &str = "mode";
pub const LEAST: &str = "least";
/// Count of a nominal value; takes the value string as parameter.
pub const COUNT: &str = "count";
/// Number of missing values.
pub const UNKNOWN: &str = "unknown";

/// One running accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistics {
    Numerical {
        sum: f64,
        squared_sum: f64,
        count: usize,
    },
    WeightedNumerical {
        sum: f64,
        squared_sum: f64,
        total_weight: f64,
    },
    MinMax {
        minimum: f64,
        maximum: f64,
    },
    Sum {
        sum: f64,
        weighted_sum: f64,
    },
    /// Weighted count per nominal index seen.
    Nominal {
        counts: BTreeMap<usize, f64>,
    },
    Unknown {
        missing: usize,
    },
}

impl Statistics {
    /// Fresh accumulators suited to `attribute`'s value type.
    pub fn for_attribute(attribute: &Attribute) -> Vec<Statistics> {
        let mut accumulators = vec![Statistics::Unknown { missing: 0 }];
        if attribute.is_nominal() {
            accumulators.push(Statistics::Nominal {
                counts: BTreeMap::new(),
            });
        } else {
            accumulators.push(Statistics::MinMax {
                minimum: f64::INFINITY,
                maximum: f64::NEG_INFINITY,
            });
            accumulators.push(Statistics::Numerical {
                sum: 0.0,
                squared_sum: 0.0,
                count: 0,
            });
            accumulators.push(Statistics::WeightedNumerical {
                sum: 0.0,
                squared_sum: 0.0,
                total_weight: 0.0,
            });
            if attribute.is_numerical() {
                accumulators.push(Statistics::Sum {
                    sum: 0.0,
                    weighted_sum: 0.0,
                });
            }
        }
        accumulators
    }

    /// Feed one value. Missing values only reach the unknown counter.
    pub fn count(&mut self, value: f64, weight: f64) {
        if let Statistics::Unknown { missing } = self {
            if value.is_nan() {
                *missing += 1;
            }
            return;
        }
        if value.is_nan() {
            return;
        }
        match self {
            Statistics::Numerical {
                sum,
                squared_sum,
                count,
            } => {
                *sum += value;
                *squared_sum += value * value;
                *count += 1;
            }
            Statistics::WeightedNumerical {
                sum,
                squared_sum,
                total_weight,
            } => {
                *sum += value * weight;
                *squared_sum += value * value * weight;
                *total_weight += weight;
            }
            Statistics::MinMax { minimum, maximum } => {
                *minimum = minimum.min(value);
                *maximum = maximum.max(value);
            }
            Statistics::Sum { sum, weighted_sum } => {
                *sum += value;
                *weighted_sum += value * weight;
            }
            Statistics::Nominal { counts } => {
                if value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
                    *counts.entry(value as usize).or_insert(0.0) += weight;
                }
            }
            Statistics::Unknown { .. } => {}
        }
    }

    /// Whether this accumulator answers statistic `name`.
    pub fn handles(&self, name: &str) -> bool {
        match self {
            Statistics::Numerical { .. } => name == AVERAGE || name == VARIANCE,
            Statistics::WeightedNumerical { .. } => {
                name == AVERAGE_WEIGHTED || name == VARIANCE_WEIGHTED
            }
            Statistics::MinMax { .. } => name == MINIMUM || name == MAXIMUM,
            Statistics::Sum { .. } => name == SUM || name == SUM_WEIGHTED,
            Statistics::Nominal { .. } => name == MODE || name == LEAST || name == COUNT,
            Statistics::Unknown { .. } => name == UNKNOWN,
        }
    }

    /// Value of statistic `name`; NaN when undefined.
    pub fn value(&self, attribute: &Attribute, name: &str, parameter: Option<&str>) -> f64 {
        match self {
            Statistics::Numerical {
                sum,
                squared_sum,
                count,
            } => {
                if *count == 0 {
                    return f64::NAN;
                }
                let n = *count as f64;
                match name {
                    AVERAGE => sum / n,
                    VARIANCE if *count == 1 => 0.0,
                    VARIANCE => ((squared_sum - sum * sum / n) / (n - 1.0)).max(0.0),
                    _ => f64::NAN,
                }
            }
            Statistics::WeightedNumerical {
                sum,
                squared_sum,
                total_weight,
            } => {
                if *total_weight == 0.0 {
                    return f64::NAN;
                }
                let average = sum / total_weight;
                match name {
                    AVERAGE_WEIGHTED => average,
                    VARIANCE_WEIGHTED => (squared_sum / total_weight - average * average).max(0.0),
                    _ => f64::NAN,
                }
            }
            Statistics::MinMax { minimum, maximum } => {
                if minimum > maximum {
                    return f64::NAN;
                }
                match name {
                    MINIMUM => *minimum,
                    MAXIMUM => *maximum,
                    _ => f64::NAN,
                }
            }
            Statistics::Sum { sum, weighted_sum } => match name {
                SUM => *sum,
                SUM_WEIGHTED => *weighted_sum,
                _ => f64::NAN,
            },
            Statistics::Nominal { counts } => match name {
                MODE => extreme_index(counts, |candidate, best| candidate > best),
                LEAST => extreme_index(counts, |candidate, best| candidate < best),
                COUNT => parameter
                    .and_then(|value| attribute.mapping()?.index_of(value))
                    .map_or(f64::NAN, |index| counts.get(&index).copied().unwrap_or(0.0)),
                _ => f64::NAN,
            },
            Statistics::Unknown { missing } => match name {
                UNKNOWN => *missing as f64,
                _ => f64::NAN,
            },
        }
    }
}

/// Index of the first positive count that wins under `better`, as f64.
fn extreme_index(counts: &BTreeMap<usize, f64>, better: impl Fn(f64, f64) -> bool) -> f64 {
    let mut best: Option<(usize, f64)> = None;
    for (&index, &count) in counts {
        if count <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_count)) if !better(count, best_count) => {}
            _ => best = Some((index, count)),
        }
    }
    best.map_or(f64::NAN, |(index, _)| index as f64)
}

/// Finished accumulators keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsCache {
    entries: HashMap<String, Vec<Statistics>>,
}

impl StatisticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store results for an attribute, replacing earlier ones.
    pub fn store(&mut self, attribute: impl Into<String>, statistics: Vec<Statistics>) {
        self.entries.insert(attribute.into(), statistics);
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    /// Look up statistic `name`; NaN if never computed or unknown.
    pub fn statistic(&self, attribute: &Attribute, name: &str, parameter: Option<&str>) -> f64 {
        self.entries
            .get(attribute.name())
            .and_then(|stats| stats.iter().find(|s| s.handles(name)))
            .map_or(f64::NAN, |s| s.value(attribute, name, parameter))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
