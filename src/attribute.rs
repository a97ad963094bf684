/// Attribute metadata and role bookkeeping for exampleset
///
/// An [`Attribute`] names one column of an [`ExampleTable`] and knows how to
/// read it: the physical column index, the value type, the nominal mapping
/// for categorical data, and the transformation chain applied on read.
///
/// [`Attributes`] is the ordered collection a view exposes. Every attribute
/// is either regular or carries a special role such as label or id.
///
/// [`ExampleTable`]: crate::table::ExampleTable
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mapping::NominalMapping;
use crate::table::{DataRow, ExampleTable};
use crate::transformation::AttributeTransformation;

/// Role name of the target attribute.
pub const LABEL_NAME: &str = "label";
/// Role name of the row identifier.
pub const ID_NAME: &str = "id";
/// Role name of the per-row weight.
pub const WEIGHT_NAME: &str = "weight";
/// Role name of a model's predicted label.
pub const PREDICTION_NAME: &str = "prediction";
/// Role name of a cluster assignment.
pub const CLUSTER_NAME: &str = "cluster";

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Real,
    Integer,
    Nominal,
    Binominal,
    DateTime,
}

impl ValueType {
    pub fn is_numerical(self) -> bool {
        matches!(self, ValueType::Real | ValueType::Integer)
    }

    pub fn is_nominal(self) -> bool {
        matches!(self, ValueType::Nominal | ValueType::Binominal)
    }

    pub fn is_date_time(self) -> bool {
        self == ValueType::DateTime
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Real => "real",
            ValueType::Integer => "integer",
            ValueType::Nominal => "nominal",
            ValueType::Binominal => "binominal",
            ValueType::DateTime => "date_time",
        };
        f.write_str(name)
    }
}

/// How an attribute groups with its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    #[default]
    SingleValue,
    ValueSeries,
    ValueMatrix,
}

/// Column metadata plus the read-time transformation chain.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    value_type: ValueType,
    block_type: BlockType,
    table_index: Option<usize>,
    mapping: Option<NominalMapping>,
    transformations: Vec<AttributeTransformation>,
}

impl Attribute {
    /// Create an attribute not yet bound to a table column.
    /// Nominal types start with an empty mapping.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Attribute {
            name: name.into(),
            value_type,
            block_type: BlockType::SingleValue,
            table_index: None,
            mapping: value_type.is_nominal().then(NominalMapping::new),
            transformations: Vec::new(),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Real)
    }

    pub fn nominal(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Nominal)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::DateTime)
    }

    /// Nominal attribute with a preset dictionary.
    pub fn nominal_with_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attribute = Self::nominal(name);
        attribute.mapping = Some(NominalMapping::from_values(values));
        attribute
    }

    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Physical column in the example table, once bound.
    pub fn table_index(&self) -> Option<usize> {
        self.table_index
    }

    pub fn set_table_index(&mut self, index: usize) {
        self.table_index = Some(index);
    }

    pub fn is_numerical(&self) -> bool {
        self.value_type.is_numerical()
    }

    pub fn is_nominal(&self) -> bool {
        self.value_type.is_nominal()
    }

    pub fn is_date_time(&self) -> bool {
        self.value_type.is_date_time()
    }

    pub fn mapping(&self) -> Option<&NominalMapping> {
        self.mapping.as_ref()
    }

    pub fn mapping_mut(&mut self) -> Option<&mut NominalMapping> {
        self.mapping.as_mut()
    }

    /// Replace the dictionary and return the previous one.
    ///
    /// Stored indices are not rewritten; pair this with a
    /// [`AttributeTransformation::FullRemapping`] from the returned mapping
    /// to the new one.
    pub fn set_mapping(&mut self, mapping: NominalMapping) -> Result<NominalMapping> {
        match self.mapping.as_mut() {
            Some(current) => Ok(std::mem::replace(current, mapping)),
            None => Err(Error::invalid_argument(format!(
                "attribute '{}' of type {} has no nominal mapping",
                self.name, self.value_type
            ))),
        }
    }

    pub fn transformations(&self) -> &[AttributeTransformation] {
        &self.transformations
    }

    /// Append a transformation to the chain.
    pub fn add_transformation(&mut self, transformation: AttributeTransformation) -> Result<()> {
        transformation.check_compatible(self)?;
        self.transformations.push(transformation);
        Ok(())
    }

    pub fn clear_transformations(&mut self) {
        self.transformations.clear();
    }

    /// Update the newest weighting step. Returns false if there is none.
    pub(crate) fn set_weighting(&mut self, weight: f64) -> bool {
        let step = self.transformations.iter_mut().rev().find_map(|t| match t {
            AttributeTransformation::Weighting { weight } => Some(weight),
            _ => None,
        });
        match step {
            Some(slot) => {
                *slot = weight;
                true
            }
            None => false,
        }
    }

    /// Apply the chain (oldest first) to a stored value.
    pub fn transform(&self, raw: f64) -> f64 {
        self.transformations
            .iter()
            .fold(raw, |value, t| t.transform(self, value))
    }

    /// Undo the chain (newest first) to obtain the value to store.
    pub fn inverse_transform(&self, value: f64) -> f64 {
        self.transformations
            .iter()
            .rev()
            .fold(value, |value, t| t.inverse_transform(self, value))
    }

    /// Read this attribute's transformed value for a physical row.
    /// An unbound attribute reads as missing.
    pub fn value(&self, table: &dyn ExampleTable, row: DataRow) -> f64 {
        match self.table_index {
            Some(column) => self.transform(table.get(row.index(), column)),
            None => f64::NAN,
        }
    }

    /// Render a (transformed) value for display. Missing renders as `?`.
    pub fn format_value(&self, value: f64) -> String {
        if value.is_nan() {
            return "?".to_string();
        }
        if let Some(mapping) = &self.mapping {
            return mapping
                .map_value(value)
                .map_or_else(|| "?".to_string(), str::to_string);
        }
        if self.value_type == ValueType::Integer || value.fract() == 0.0 {
            format!("{}", value as i64)
        } else {
            format!("{value}")
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value_type == other.value_type
            && self.block_type == other.block_type
            && self.table_index == other.table_index
            && self.mapping == other.mapping
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.value_type.hash(state);
        self.table_index.hash(state);
    }
}

/// An attribute together with its special role, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRole {
    attribute: Attribute,
    special_name: Option<String>,
}

impl AttributeRole {
    pub fn regular(attribute: Attribute) -> Self {
        AttributeRole {
            attribute,
            special_name: None,
        }
    }

    pub fn special(attribute: Attribute, role: impl Into<String>) -> Self {
        AttributeRole {
            attribute,
            special_name: Some(role.into()),
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn attribute_mut(&mut self) -> &mut Attribute {
        &mut self.attribute
    }

    pub fn into_attribute(self) -> Attribute {
        self.attribute
    }

    pub fn is_special(&self) -> bool {
        self.special_name.is_some()
    }

    pub fn special_name(&self) -> Option<&str> {
        self.special_name.as_deref()
    }
}

/// Ordered attribute collection of an example set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    roles: Vec<AttributeRole>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_regular(&mut self, attribute: Attribute) {
        self.roles.push(AttributeRole::regular(attribute));
    }

    /// Add `attribute` under `role`, replacing any attribute holding that role.
    pub fn set_special(&mut self, attribute: Attribute, role: &str) -> Option<Attribute> {
        let previous = self
            .roles
            .iter()
            .position(|r| r.special_name() == Some(role))
            .map(|position| self.roles.remove(position).into_attribute());
        self.roles.push(AttributeRole::special(attribute, role));
        previous
    }

    pub fn set_label(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.set_special(attribute, LABEL_NAME)
    }

    pub fn set_id(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.set_special(attribute, ID_NAME)
    }

    pub fn set_weight(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.set_special(attribute, WEIGHT_NAME)
    }

    pub fn set_predicted_label(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.set_special(attribute, PREDICTION_NAME)
    }

    pub fn roles(&self) -> &[AttributeRole] {
        &self.roles
    }

    /// Every attribute, regular and special, in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Attribute> {
        self.roles.iter().map(AttributeRole::attribute)
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.roles.iter_mut().map(AttributeRole::attribute_mut)
    }

    pub fn regular(&self) -> impl Iterator<Item = &Attribute> {
        self.roles
            .iter()
            .filter(|r| !r.is_special())
            .map(AttributeRole::attribute)
    }

    pub fn regular_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.roles
            .iter_mut()
            .filter(|r| !r.is_special())
            .map(AttributeRole::attribute_mut)
    }

    pub fn special(&self, role: &str) -> Option<&Attribute> {
        self.roles
            .iter()
            .find(|r| r.special_name() == Some(role))
            .map(AttributeRole::attribute)
    }

    pub fn label(&self) -> Option<&Attribute> {
        self.special(LABEL_NAME)
    }

    pub fn id(&self) -> Option<&Attribute> {
        self.special(ID_NAME)
    }

    pub fn weight(&self) -> Option<&Attribute> {
        self.special(WEIGHT_NAME)
    }

    pub fn predicted_label(&self) -> Option<&Attribute> {
        self.special(PREDICTION_NAME)
    }

    /// Find an attribute of any role by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.find_role(name).map(AttributeRole::attribute)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.roles
            .iter_mut()
            .find(|r| r.attribute().name() == name)
            .map(AttributeRole::attribute_mut)
    }

    pub fn get_regular(&self, name: &str) -> Option<&Attribute> {
        self.regular().find(|a| a.name() == name)
    }

    pub fn find_role(&self, name: &str) -> Option<&AttributeRole> {
        self.roles.iter().find(|r| r.attribute().name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_role(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeRole> {
        let position = self
            .roles
            .iter()
            .position(|r| r.attribute().name() == name)?;
        Some(self.roles.remove(position))
    }

    pub fn regular_count(&self) -> usize {
        self.roles.iter().filter(|r| !r.is_special()).count()
    }

    pub fn special_count(&self) -> usize {
        self.roles.iter().filter(|r| r.is_special()).count()
    }

    pub fn all_count(&self) -> usize {
        self.roles.len()
    }

    /// Keep the `i`-th regular attribute iff `mask[i]`. Specials are untouched.
    pub(crate) fn retain_regular_by_mask(&mut self, mask: &[bool]) {
        let mut position = 0;
        self.roles.retain(|role| {
            if role.is_special() {
                return true;
            }
            let keep = mask.get(position).copied().unwrap_or(true);
            position += 1;
            keep
        });
    }

    /// Replace all regular attributes with `regular`, keeping the specials after them.
    pub(crate) fn replace_regular(&mut self, regular: Vec<Attribute>) {
        let specials: Vec<AttributeRole> = self.roles.drain(..).filter(|r| r.is_special()).collect();
        self.roles = regular
            .into_iter()
            .map(AttributeRole::regular)
            .chain(specials)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryExampleTable;

    #[test]
    fn test_nominal_attribute_gets_mapping() {
        assert!(Attribute::nominal("a").mapping().is_some());
        assert!(Attribute::numeric("x").mapping().is_none());
        assert!(Attribute::numeric("x").set_mapping(NominalMapping::new()).is_err());
    }

    #[test]
    fn test_transformation_chain_order() {
        let mut attribute = Attribute::numeric("x");
        attribute
            .add_transformation(AttributeTransformation::weighting(2.0))
            .unwrap();
        attribute
            .add_transformation(AttributeTransformation::weighting(3.0))
            .unwrap();
        assert_eq!(attribute.transform(1.0), 6.0);
        assert_eq!(attribute.inverse_transform(6.0), 1.0);

        assert!(attribute.set_weighting(0.5));
        assert_eq!(attribute.transform(1.0), 1.0);
    }

    #[test]
    fn test_rejects_weighting_nominal() {
        let mut attribute = Attribute::nominal("n");
        let err = attribute
            .add_transformation(AttributeTransformation::weighting(2.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransformation { .. }));
        assert!(attribute.transformations().is_empty());
    }

    #[test]
    fn test_value_reads_table_column() {
        let mut table = MemoryExampleTable::new();
        let mut attribute = Attribute::numeric("x");
        let unbound = attribute.clone();
        table.add_attribute(&mut attribute);
        table.add_row(&[4.5]).unwrap();

        let row = table.data_row(0);
        assert_eq!(attribute.value(&table, row), 4.5);
        assert!(unbound.value(&table, row).is_nan());
    }

    #[test]
    fn test_format_value() {
        let nominal = Attribute::nominal_with_values("c", ["a", "b"]);
        assert_eq!(nominal.format_value(1.0), "b");
        assert_eq!(nominal.format_value(7.0), "?");
        assert_eq!(Attribute::numeric("x").format_value(f64::NAN), "?");
        assert_eq!(Attribute::numeric("x").format_value(2.0), "2");
        assert_eq!(Attribute::numeric("x").format_value(2.5), "2.5");
    }

    #[test]
    fn test_special_roles_replace() {
        let mut attributes = Attributes::new();
        attributes.add_regular(Attribute::numeric("a"));
        assert!(attributes.set_label(Attribute::nominal("y")).is_none());
        let previous = attributes.set_label(Attribute::nominal("z")).unwrap();

        assert_eq!(previous.name(), "y");
        assert_eq!(attributes.label().map(Attribute::name), Some("z"));
        assert_eq!(attributes.regular_count(), 1);
        assert_eq!(attributes.special_count(), 1);
        assert!(attributes.get_regular("z").is_none());
        assert!(attributes.get("z").is_some());
    }

    #[test]
    fn test_retain_regular_by_mask_skips_specials() {
        let mut attributes = Attributes::new();
        attributes.add_regular(Attribute::numeric("a"));
        attributes.set_label(Attribute::nominal("y"));
        attributes.add_regular(Attribute::numeric("b"));
        attributes.add_regular(Attribute::numeric("c"));

        attributes.retain_regular_by_mask(&[true, false, true]);
        let names: Vec<&str> = attributes.regular().map(Attribute::name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(attributes.label().is_some());
    }

    #[test]
    fn test_replace_regular_keeps_specials() {
        let mut attributes = Attributes::new();
        attributes.add_regular(Attribute::numeric("a"));
        attributes.set_id(Attribute::numeric("id"));
        attributes.replace_regular(vec![Attribute::numeric("b"), Attribute::numeric("a")]);

        let names: Vec<&str> = attributes.all().map(Attribute::name).collect();
        assert_eq!(names, vec!["b", "a", "id"]);
    }
}
