/// Row accessors for exampleset
///
/// An [`Example`] is a transient, borrowed view of one row as seen through
/// an example set: it pairs the physical [`DataRow`] with the view's
/// attributes so that every read goes through the attribute's
/// transformation chain.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, Attributes};
use crate::table::{DataRow, DataRowReader, ExampleTable};

/// Typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Numeric(f64),
    Nominal(String),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            Value::DateTime(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Nominal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<i64> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Value::Missing
        } else {
            Value::Numeric(value)
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Nominal(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Nominal(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

/// One row seen through a view's attributes.
#[derive(Clone, Copy)]
pub struct Example<'a> {
    row: DataRow,
    attributes: &'a Attributes,
    table: &'a dyn ExampleTable,
}

impl<'a> Example<'a> {
    pub fn new(row: DataRow, attributes: &'a Attributes, table: &'a dyn ExampleTable) -> Self {
        Example {
            row,
            attributes,
            table,
        }
    }

    pub fn data_row(&self) -> DataRow {
        self.row
    }

    pub fn attributes(&self) -> &'a Attributes {
        self.attributes
    }

    /// Transformed value of `attribute` for this row; NaN when missing.
    pub fn value(&self, attribute: &Attribute) -> f64 {
        attribute.value(self.table, self.row)
    }

    /// Value of the attribute called `name`, if the view has one.
    pub fn value_by_name(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).map(|a| self.value(a))
    }

    pub fn is_missing(&self, attribute: &Attribute) -> bool {
        self.value(attribute).is_nan()
    }

    /// Dictionary string of a nominal value.
    pub fn nominal_value<'m>(&self, attribute: &'m Attribute) -> Option<&'m str> {
        attribute.mapping()?.map_value(self.value(attribute))
    }

    /// Display form of the value, `?` when missing.
    pub fn value_as_string(&self, attribute: &Attribute) -> String {
        attribute.format_value(self.value(attribute))
    }

    pub fn typed_value(&self, attribute: &Attribute) -> Value {
        let value = self.value(attribute);
        if value.is_nan() {
            return Value::Missing;
        }
        if attribute.is_nominal() {
            return attribute
                .mapping()
                .and_then(|m| m.map_value(value))
                .map_or(Value::Missing, |s| Value::Nominal(s.to_string()));
        }
        if attribute.is_date_time() {
            return Value::DateTime(value as i64);
        }
        Value::Numeric(value)
    }

    pub fn label(&self) -> Option<f64> {
        self.attributes.label().map(|a| self.value(a))
    }

    pub fn predicted_label(&self) -> Option<f64> {
        self.attributes.predicted_label().map(|a| self.value(a))
    }

    pub fn id(&self) -> Option<f64> {
        self.attributes.id().map(|a| self.value(a))
    }

    /// Row weight; 1.0 when the view has no weight attribute.
    pub fn weight(&self) -> f64 {
        self.attributes.weight().map_or(1.0, |a| self.value(a))
    }
}

impl fmt::Debug for Example<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for attribute in self.attributes.all() {
            map.entry(&attribute.name(), &self.value_as_string(attribute));
        }
        map.finish()
    }
}

/// Iterator over the examples of a view in view order.
pub struct Examples<'a> {
    rows: DataRowReader<'a>,
    attributes: &'a Attributes,
    table: &'a dyn ExampleTable,
}

impl<'a> Examples<'a> {
    pub fn new(rows: DataRowReader<'a>, attributes: &'a Attributes, table: &'a dyn ExampleTable) -> Self {
        Examples {
            rows,
            attributes,
            table,
        }
    }
}

impl<'a> Iterator for Examples<'a> {
    type Item = Example<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(Example::new(row, self.attributes, self.table))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
