/// Nominal value dictionary for exampleset
///
/// A nominal attribute stores each row's value as the index of a string in
/// its mapping. The mapping keeps every distinct string once and hands out
/// dense indices in insertion order.
///
/// # Design
///
/// - Strings are stored once in a `Vec<String>` (index = stored value)
/// - A `HashMap<String, usize>` provides O(1) lookup from string to index
/// - Indices are never reused or reordered, so stored values stay valid
///
/// # Examples
///
/// ```
/// use exampleset::NominalMapping;
///
/// let mut mapping = NominalMapping::new();
///
/// let yes = mapping.map_string("yes");
/// let no = mapping.map_string("no");
/// assert_eq!(mapping.map_string("yes"), yes);
/// assert_ne!(yes, no);
///
/// assert_eq!(mapping.value_of(no), Some("no"));
/// assert_eq!(mapping.map_value(0.0), Some("yes"));
/// assert_eq!(mapping.map_value(f64::NAN), None);
/// ```

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NominalMapping {
    values: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl NominalMapping {
    pub fn new() -> Self {
        NominalMapping {
            values: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        NominalMapping {
            values: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Build a mapping from values in order; duplicates keep their first index.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = NominalMapping::new();
        for value in values {
            mapping.map_string(value.as_ref());
        }
        mapping
    }

    /// Return the index of `s`, adding it if it is new.
    pub fn map_string(&mut self, s: &str) -> usize {
        if let Some(&index) = self.index.get(s) {
            return index;
        }
        let index = self.values.len();
        self.values.push(s.to_string());
        self.index.insert(s.to_string(), index);
        index
    }

    /// Index of `s`, or None if it was never mapped.
    pub fn index_of(&self, s: &str) -> Option<usize> {
        self.index.get(s).copied()
    }

    pub fn value_of(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|s| s.as_str())
    }

    /// Resolve a stored cell value. Missing (NaN), negative or fractional
    /// values resolve to None.
    pub fn map_value(&self, value: f64) -> Option<&str> {
        if value.is_nan() || value < 0.0 || value.fract() != 0.0 {
            return None;
        }
        self.value_of(value as usize)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Values in lexicographic order (the stored indices are untouched).
    pub fn sorted_values(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.values.iter().map(|s| s.as_str()).collect();
        sorted.sort_unstable();
        sorted
    }

    /// For two-valued mappings: the first mapped value is negative.
    pub fn negative_index(&self) -> Option<usize> {
        if self.values.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// For two-valued mappings: the second mapped value is positive.
    pub fn positive_index(&self) -> Option<usize> {
        if self.values.len() >= 2 {
            Some(1)
        } else {
            None
        }
    }
}

impl PartialEq for NominalMapping {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for NominalMapping {}

impl Hash for NominalMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}
