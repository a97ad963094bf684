use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::debug;

use crate::attribute::Attributes;
use crate::error::{Error, Result};
use crate::example_set::{ExampleSet, ViewState};
use crate::table::{DataRow, DataRowReader, ExampleTable};
use crate::transformation::{AttributeTransformation, ViewModel};

use super::view_plumbing;

/// A view reading the parent's rows through a [`ViewModel`].
///
/// Every attribute the model names gets a model step appended to its
/// chain, so it composes with the weighting, remapping and replacement
/// steps of the views below.
#[derive(Debug, Clone)]
pub struct ModelViewExampleSet {
    parent: Box<dyn ExampleSet>,
    attributes: Attributes,
    model: Arc<dyn ViewModel>,
    state: ViewState,
}

impl ModelViewExampleSet {
    pub fn new(parent: &dyn ExampleSet, model: Arc<dyn ViewModel>) -> Result<Self> {
        let mut attributes = parent.attributes().clone();
        let names = model.attribute_names();
        for name in &names {
            let attribute = attributes
                .get_mut(name)
                .ok_or_else(|| Error::attribute_not_found(name.as_str()))?;
            attribute.add_transformation(AttributeTransformation::model(Arc::clone(&model)))?;
        }
        debug!("model view '{}' over {} attributes", model.name(), names.len());

        Ok(ModelViewExampleSet {
            parent: parent.clone_box(),
            attributes,
            model,
            state: ViewState::new(),
        })
    }

    pub fn model(&self) -> &Arc<dyn ViewModel> {
        &self.model
    }
}

impl PartialEq for ModelViewExampleSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.model, &other.model) && self.attributes == other.attributes
    }
}

impl Hash for ModelViewExampleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model.name().hash(state);
        self.attributes.hash(state);
    }
}

impl ExampleSet for ModelViewExampleSet {
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
        self.parent.is_thread_safe_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::builder::ExampleSetBuilder;
    use crate::example::Value;
    use crate::monitor::ScanMonitor;
    use crate::view::ReplaceMissingExampleSet;
    use std::collections::BTreeMap;

    /// Z-transformation with fixed per-attribute mean and deviation.
    #[derive(Debug)]
    struct Normalization {
        parameters: BTreeMap<String, (f64, f64)>,
    }

    impl ViewModel for Normalization {
        fn name(&self) -> &str {
            "normalization"
        }

        fn attribute_names(&self) -> Vec<String> {
            self.parameters.keys().cloned().collect()
        }

        fn transform(&self, attribute: &Attribute, value: f64) -> f64 {
            match self.parameters.get(attribute.name()) {
                Some((mean, deviation)) => (value - mean) / deviation,
                None => value,
            }
        }

        fn is_reversible(&self) -> bool {
            true
        }

        fn inverse_transform(&self, attribute: &Attribute, value: f64) -> f64 {
            match self.parameters.get(attribute.name()) {
                Some((mean, deviation)) => value * deviation + mean,
                None => value,
            }
        }
    }

    fn measurements() -> Box<dyn ExampleSet> {
        let mut builder = ExampleSetBuilder::new()
            .regular(Attribute::numeric("x"))
            .regular(Attribute::numeric("y"));
        for (x, y) in [(Value::Numeric(2.0), 1.0), (Value::Missing, 2.0), (Value::Numeric(6.0), 3.0)] {
            builder = builder.row(vec![x, Value::Numeric(y)]);
        }
        Box::new(builder.build().unwrap())
    }

    fn normalization(x: (f64, f64)) -> Arc<dyn ViewModel> {
        Arc::new(Normalization {
            parameters: BTreeMap::from([("x".to_string(), x)]),
        })
    }

    fn values(set: &dyn ExampleSet, name: &str) -> Vec<f64> {
        let attribute = set.attributes().get(name).unwrap().clone();
        set.examples().map(|e| e.value(&attribute)).collect()
    }

    #[test]
    fn test_model_rewrites_named_attributes_only() {
        let parent = measurements();
        let view = ModelViewExampleSet::new(parent.as_ref(), normalization((4.0, 2.0))).unwrap();

        let x = values(&view, "x");
        assert_eq!(x[0], -1.0);
        assert!(x[1].is_nan());
        assert_eq!(x[2], 1.0);
        assert_eq!(values(&view, "y"), vec![1.0, 2.0, 3.0]);
        assert_eq!(values(parent.as_ref(), "x")[0], 2.0);

        let attribute = view.attributes().get("x").unwrap();
        assert_eq!(attribute.inverse_transform(1.0), 6.0);
        assert!(view.is_thread_safe_view());
    }

    #[test]
    fn test_model_over_replace_missing() {
        let parent = measurements();
        let filled = ReplaceMissingExampleSet::new(parent.as_ref(), &mut ScanMonitor::new()).unwrap();
        let view = ModelViewExampleSet::new(&filled, normalization((4.0, 2.0))).unwrap();
        assert_eq!(values(&view, "x"), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_model_attribute() {
        let parent = measurements();
        let model: Arc<dyn ViewModel> = Arc::new(Normalization {
            parameters: BTreeMap::from([("z".to_string(), (0.0, 1.0))]),
        });
        let err = ModelViewExampleSet::new(parent.as_ref(), model).unwrap_err();
        assert_eq!(err, Error::attribute_not_found("z"));
    }

    #[test]
    fn test_equality_follows_model_identity() {
        let parent = measurements();
        let model = normalization((4.0, 2.0));
        let view = ModelViewExampleSet::new(parent.as_ref(), Arc::clone(&model)).unwrap();
        let copy = view.clone_box();
        assert!(copy.dyn_eq(&view));

        let other = ModelViewExampleSet::new(parent.as_ref(), normalization((4.0, 2.0))).unwrap();
        assert!(!other.dyn_eq(&view));
    }
}
