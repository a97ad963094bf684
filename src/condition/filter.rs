//! Attribute value filters.
//!
//! A single filter has the form `<attribute> <op> <value>`, for example
//! `age > 30`, `color = red` or `income = ?`. Operators are `=`, `==`, `!=`,
//! `<>`, `<`, `<=`, `>`, `>=`; `?` stands for the missing value and only
//! works with equality operators. Nominal attributes only support equality
//! operators.
//!
//! Filters combine with either `&&` or `||`, never both in one string.

use regex::Regex;

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use crate::example::Example;
use crate::example_set::ExampleSet;

use super::Condition;

const MISSING_SYMBOL: &str = "?";

/// Comparison in a value filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
}

impl FilterOperator {
    // longest symbols first so "<=" wins over "<"
    const SYMBOLS: [(&'static str, FilterOperator); 8] = [
        ("<=", FilterOperator::LessEquals),
        (">=", FilterOperator::GreaterEquals),
        ("!=", FilterOperator::NotEquals),
        ("<>", FilterOperator::NotEquals),
        ("==", FilterOperator::Equals),
        ("=", FilterOperator::Equals),
        ("<", FilterOperator::Less),
        (">", FilterOperator::Greater),
    ];

    fn is_equality(self) -> bool {
        matches!(self, FilterOperator::Equals | FilterOperator::NotEquals)
    }

    fn holds<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            FilterOperator::Equals => left == right,
            FilterOperator::NotEquals => left != right,
            FilterOperator::Less => left < right,
            FilterOperator::LessEquals => left <= right,
            FilterOperator::Greater => left > right,
            FilterOperator::GreaterEquals => left >= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Missing,
    Number(f64),
    Text(String),
}

/// One `<attribute> <op> <value>` test.
#[derive(Debug, Clone)]
pub struct AttributeValueFilterSingleCondition {
    attribute: Attribute,
    operator: FilterOperator,
    operand: Operand,
}

impl AttributeValueFilterSingleCondition {
    /// Parse a single filter against the attributes of `set`.
    pub fn parse(set: &dyn ExampleSet, parameter: &str) -> Result<Self> {
        let (name, operator, value) = split_filter(parameter)?;
        let attribute = set
            .attributes()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::attribute_not_found(name))?;
        Self::new(attribute, operator, value)
    }

    pub fn new(attribute: Attribute, operator: FilterOperator, value: &str) -> Result<Self> {
        let operand = if value == MISSING_SYMBOL {
            if !operator.is_equality() {
                return Err(Error::invalid_condition(format!(
                    "missing value '?' can only be tested with = or != (attribute '{}')",
                    attribute.name()
                )));
            }
            Operand::Missing
        } else if attribute.is_nominal() {
            if !operator.is_equality() {
                return Err(Error::invalid_condition(format!(
                    "nominal attribute '{}' only supports = and !=",
                    attribute.name()
                )));
            }
            Operand::Text(value.to_string())
        } else {
            let number = value.parse::<f64>().map_err(|_| {
                Error::invalid_condition(format!(
                    "'{value}' is not a number (attribute '{}')",
                    attribute.name()
                ))
            })?;
            Operand::Number(number)
        };
        Ok(AttributeValueFilterSingleCondition {
            attribute,
            operator,
            operand,
        })
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }
}

impl Condition for AttributeValueFilterSingleCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        let value = example.value(&self.attribute);
        let result = match &self.operand {
            Operand::Missing => self.operator.holds(&true, &value.is_nan()),
            _ if value.is_nan() => false,
            Operand::Number(expected) => self.operator.holds(&value, expected),
            Operand::Text(expected) => match example.nominal_value(&self.attribute) {
                Some(actual) => self.operator.holds(actual, expected.as_str()),
                None => false,
            },
        };
        Ok(result)
    }
}

/// Split `<attribute> <op> <value>` at the first operator.
fn split_filter(parameter: &str) -> Result<(&str, FilterOperator, &str)> {
    let position = parameter
        .find(['<', '>', '=', '!'])
        .ok_or_else(|| Error::invalid_condition(format!("no comparison operator in '{parameter}'")))?;
    let rest = &parameter[position..];
    let (symbol, operator) = FilterOperator::SYMBOLS
        .iter()
        .find(|(symbol, _)| rest.starts_with(symbol))
        .ok_or_else(|| Error::invalid_condition(format!("unknown operator in '{parameter}'")))?;

    let name = parameter[..position].trim();
    let value = rest[symbol.len()..].trim();
    if name.is_empty() {
        return Err(Error::invalid_condition(format!("no attribute name in '{parameter}'")));
    }
    if value.is_empty() {
        return Err(Error::invalid_condition(format!("no comparison value in '{parameter}'")));
    }
    Ok((name, *operator, value))
}

/// How the filters of an [`AttributeValueFilter`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

/// Several single filters joined by `&&` or by `||`.
#[derive(Debug, Clone)]
pub struct AttributeValueFilter {
    filters: Vec<AttributeValueFilterSingleCondition>,
    combinator: Combinator,
}

impl AttributeValueFilter {
    pub fn parse(set: &dyn ExampleSet, parameter: &str) -> Result<Self> {
        let has_and = parameter.contains("&&");
        let has_or = parameter.contains("||");
        let (combinator, separator) = match (has_and, has_or) {
            (true, true) => {
                return Err(Error::invalid_condition(
                    "'&&' and '||' cannot be mixed in one attribute value filter",
                ))
            }
            (false, true) => (Combinator::Or, "||"),
            _ => (Combinator::And, "&&"),
        };
        if parameter.trim().is_empty() {
            return Err(Error::invalid_condition("empty attribute value filter"));
        }
        let filters = parameter
            .split(separator)
            .map(|part| AttributeValueFilterSingleCondition::parse(set, part))
            .collect::<Result<Vec<_>>>()?;
        Ok(AttributeValueFilter {
            filters,
            combinator,
        })
    }

    pub fn filters(&self) -> &[AttributeValueFilterSingleCondition] {
        &self.filters
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }
}

impl Condition for AttributeValueFilter {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        for filter in &self.filters {
            let ok = filter.condition_ok(example)?;
            match self.combinator {
                Combinator::And if !ok => return Ok(false),
                Combinator::Or if ok => return Ok(true),
                _ => {}
            }
        }
        Ok(self.combinator == Combinator::And)
    }
}

/// Rows whose displayed value fully matches a regular expression.
///
/// The parameter is `<attribute>:<pattern>`, split at the first `:`.
/// Missing values never match.
#[derive(Debug, Clone)]
pub struct ValueMatchesCondition {
    attribute: Attribute,
    pattern: Regex,
}

impl ValueMatchesCondition {
    pub fn parse(set: &dyn ExampleSet, parameter: &str) -> Result<Self> {
        let (name, pattern) = parameter.split_once(':').ok_or_else(|| {
            Error::invalid_condition(format!("expected '<attribute>:<pattern>', got '{parameter}'"))
        })?;
        let name = name.trim();
        let attribute = set
            .attributes()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::attribute_not_found(name))?;
        let pattern = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|err| Error::invalid_condition(format!("bad pattern '{pattern}': {err}")))?;
        Ok(ValueMatchesCondition { attribute, pattern })
    }
}

impl Condition for ValueMatchesCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        if example.is_missing(&self.attribute) {
            return Ok(false);
        }
        Ok(self
            .pattern
            .is_match(&example.value_as_string(&self.attribute)))
    }
}
