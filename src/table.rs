/// Physical row storage for exampleset
///
/// An [`ExampleTable`] is the shared, read-only matrix of raw cell values
/// every view ultimately reads from. Values are `f64`: numbers as is, nominal
/// values as indices into the attribute's mapping, dates as epoch
/// milliseconds, and NaN for missing.
///
/// # Examples
///
/// ```
/// use exampleset::{Attribute, ExampleTable, MemoryExampleTable};
///
/// let mut table = MemoryExampleTable::new();
/// let mut age = Attribute::numeric("age");
/// table.add_attribute(&mut age);
///
/// table.add_row(&[31.0]).unwrap();
/// table.add_row(&[f64::NAN]).unwrap();
///
/// assert_eq!(table.size(), 2);
/// assert_eq!(age.value(&table, table.data_row(0)), 31.0);
/// assert!(age.value(&table, table.data_row(1)).is_nan());
/// ```
use std::fmt;

use crate::attribute::Attribute;
use crate::error::{Error, Result};

/// Handle to one physical row of an example table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataRow {
    index: usize,
}

impl DataRow {
    pub fn new(index: usize) -> Self {
        DataRow { index }
    }

    /// Position of the row in its table.
    pub fn index(self) -> usize {
        self.index
    }
}

/// Forward-only sequence of physical rows.
pub type DataRowReader<'a> = Box<dyn Iterator<Item = DataRow> + 'a>;

/// Random-access raw storage shared by every view over it.
pub trait ExampleTable: fmt::Debug + Send + Sync {
    /// Number of physical rows.
    fn size(&self) -> usize;

    /// Number of physical columns.
    fn column_count(&self) -> usize;

    /// Raw value at (`row`, `column`). Cells outside the table read as NaN.
    fn get(&self, row: usize, column: usize) -> f64;

    /// Handle for physical row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    fn data_row(&self, index: usize) -> DataRow {
        let size = self.size();
        assert!(index < size, "row {index} out of range for table of {size} rows");
        DataRow::new(index)
    }

    /// All rows in physical order.
    fn data_rows(&self) -> DataRowReader<'_> {
        Box::new((0..self.size()).map(DataRow::new))
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    values: Vec<f64>,
}

/// Columnar in-memory example table.
#[derive(Debug, Clone, Default)]
pub struct MemoryExampleTable {
    columns: Vec<Column>,
    rows: usize,
}

impl MemoryExampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a column for `attribute` and bind the attribute to it.
    /// Existing rows read the new column as missing.
    pub fn add_attribute(&mut self, attribute: &mut Attribute) -> usize {
        let index = self.columns.len();
        self.columns.push(Column {
            name: attribute.name().to_string(),
            values: vec![f64::NAN; self.rows],
        });
        attribute.set_table_index(index);
        index
    }

    /// Append a row of raw values, one per column.
    pub fn add_row(&mut self, values: &[f64]) -> Result<usize> {
        if values.len() != self.columns.len() {
            return Err(Error::length_mismatch(
                "table row",
                self.columns.len(),
                values.len(),
            ));
        }
        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.values.push(value);
        }
        self.rows += 1;
        Ok(self.rows - 1)
    }

    /// Overwrite a raw cell.
    pub fn set_raw(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        let len = self.columns.len();
        let rows = self.rows;
        let cells = self
            .columns
            .get_mut(column)
            .ok_or(Error::IndexOutOfRange { index: column, len })?;
        let cell = cells
            .values
            .get_mut(row)
            .ok_or(Error::IndexOutOfRange { index: row, len: rows })?;
        *cell = value;
        Ok(())
    }

    /// Store a value as seen through `attribute`, undoing its transformation chain.
    pub fn set_value(&mut self, row: usize, attribute: &Attribute, value: f64) -> Result<()> {
        let column = attribute
            .table_index()
            .ok_or_else(|| Error::attribute_not_found(attribute.name()))?;
        self.set_raw(row, column, attribute.inverse_transform(value))
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.columns.get(column).map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl ExampleTable for MemoryExampleTable {
    fn size(&self) -> usize {
        self.rows
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn get(&self, row: usize, column: usize) -> f64 {
        self.columns
            .get(column)
            .and_then(|c| c.values.get(row))
            .copied()
            .unwrap_or(f64::NAN)
    }
}
