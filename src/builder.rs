//! Convenience construction of in-memory example sets.
//!
//! ```
//! use exampleset::{Attribute, ExampleSet, ExampleSetBuilder, Value};
//!
//! let set = ExampleSetBuilder::new()
//!     .regular(Attribute::numeric("age"))
//!     .label(Attribute::nominal("class"))
//!     .row(vec![Value::Numeric(31.0), "yes".into()])
//!     .row(vec![Value::Missing, "no".into()])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(set.size(), 2);
//! assert_eq!(set.example(0).label(), Some(0.0));
//! ```

use std::sync::Arc;

use crate::attribute::{Attribute, Attributes};
use crate::error::{Error, Result};
use crate::example::Value;
use crate::table::MemoryExampleTable;
use crate::view::SimpleExampleSet;

/// Declares attributes and rows, then materialises a [`SimpleExampleSet`].
#[derive(Debug, Clone, Default)]
pub struct ExampleSetBuilder {
    columns: Vec<(Attribute, Option<String>)>,
    rows: Vec<Vec<Value>>,
}

impl ExampleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, attribute: Attribute) -> Self {
        self.columns.push((attribute, None));
        self
    }

    /// Declare an attribute with a special role.
    pub fn special(mut self, attribute: Attribute, role: &str) -> Self {
        self.columns.push((attribute, Some(role.to_string())));
        self
    }

    pub fn label(self, attribute: Attribute) -> Self {
        self.special(attribute, crate::attribute::LABEL_NAME)
    }

    pub fn id(self, attribute: Attribute) -> Self {
        self.special(attribute, crate::attribute::ID_NAME)
    }

    pub fn weight(self, attribute: Attribute) -> Self {
        self.special(attribute, crate::attribute::WEIGHT_NAME)
    }

    /// Add a row with one value per declared attribute, in declaration order.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.rows.extend(rows);
        self
    }

    /// Validate every row and build the table.
    pub fn build(self) -> Result<SimpleExampleSet> {
        let mut table = MemoryExampleTable::new();
        let mut columns = self.columns;
        for (attribute, _) in columns.iter_mut() {
            table.add_attribute(attribute);
        }

        let mut raw = Vec::with_capacity(columns.len());
        for (row_index, row) in self.rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::length_mismatch(
                    format!("row {row_index}"),
                    columns.len(),
                    row.len(),
                ));
            }
            raw.clear();
            for ((attribute, _), value) in columns.iter_mut().zip(row) {
                raw.push(encode(attribute, value, row_index)?);
            }
            table.add_row(&raw)?;
        }

        let mut attributes = Attributes::new();
        for (attribute, role) in columns {
            match role {
                Some(role) => {
                    attributes.set_special(attribute, &role);
                }
                None => attributes.add_regular(attribute),
            }
        }
        Ok(SimpleExampleSet::new(Arc::new(table), attributes))
    }
}

/// Raw cell value of `value` for `attribute`, growing nominal dictionaries.
fn encode(attribute: &mut Attribute, value: Value, row: usize) -> Result<f64> {
    let value_type = attribute.value_type();
    let name = attribute.name().to_string();
    let mismatch = |value: &Value| {
        Error::invalid_argument(format!(
            "row {row}: value {value:?} does not fit {value_type} attribute '{name}'"
        ))
    };
    match value {
        Value::Missing => Ok(f64::NAN),
        Value::Nominal(s) => match attribute.mapping_mut() {
            Some(mapping) => Ok(mapping.map_string(&s) as f64),
            None => Err(mismatch(&Value::Nominal(s))),
        },
        Value::Numeric(v) if !attribute.is_nominal() => Ok(v),
        Value::DateTime(ms) if attribute.is_date_time() => Ok(ms as f64),
        other => Err(mismatch(&other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_set::ExampleSet;

    #[test]
    fn test_build_maps_nominal_values() {
        let set = ExampleSetBuilder::new()
            .regular(Attribute::nominal("color"))
            .regular(Attribute::date_time("when"))
            .rows(vec![
                vec!["red".into(), Value::DateTime(1_000)],
                vec!["blue".into(), Value::Missing],
                vec!["red".into(), Value::DateTime(2_000)],
            ])
            .build()
            .unwrap();

        let color = set.attributes().get("color").unwrap();
        assert_eq!(color.mapping().unwrap().values(), &["red", "blue"]);
        assert_eq!(set.example(2).value(color), 0.0);
        assert_eq!(set.example(1).nominal_value(color), Some("blue"));
        let when = set.attributes().get("when").unwrap();
        assert_eq!(set.example(2).value(when), 2_000.0);
    }

    #[test]
    fn test_build_rejects_short_rows() {
        let err = ExampleSetBuilder::new()
            .regular(Attribute::numeric("a"))
            .regular(Attribute::numeric("b"))
            .row(vec![Value::Numeric(1.0)])
            .build()
            .unwrap_err();
        assert_eq!(err, Error::length_mismatch("row 0", 2, 1));
    }

    #[test]
    fn test_build_rejects_type_mismatch() {
        let err = ExampleSetBuilder::new()
            .regular(Attribute::numeric("a"))
            .row(vec!["oops".into()])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = ExampleSetBuilder::new()
            .regular(Attribute::nominal("n"))
            .row(vec![Value::Numeric(1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_roles() {
        let set = ExampleSetBuilder::new()
            .id(Attribute::numeric("id"))
            .weight(Attribute::numeric("w"))
            .regular(Attribute::numeric("x"))
            .row(vec![Value::Numeric(1.0), Value::Numeric(0.5), Value::Numeric(3.0)])
            .build()
            .unwrap();
        assert_eq!(set.attributes().regular_count(), 1);
        assert_eq!(set.example(0).weight(), 0.5);
        assert_eq!(set.example(0).id(), Some(1.0));
    }
}
