//! Default-value synthesis
//!
//! Produces the value a newly added field starts with. Every value is shaped
//! by the schema alone, so the result always has the right structure even
//! where its content (an empty citation, an empty date) still needs editing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::opaque_object;
use crate::introspect::{declared_default, unwrap, Introspector};
use crate::registry::SchemaRegistry;
use crate::schema::{PrimitiveKind, SchemaNode};

/// How the synthesized value will be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// The value replaces the whole field
    #[default]
    WholeField,
    /// The value initializes an absent array-valued field, so objects are
    /// wrapped in a one-element array
    ArrayAppend,
}

/// Builds default values from a registry
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'r> {
    introspector: Introspector<'r>,
}

impl<'r> Synthesizer<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            introspector: Introspector::new(registry),
        }
    }

    /// Default value for a field. Never fails: an unknown field yields `{}`.
    pub fn synthesize(&self, field: &str, parent: Option<&str>, mode: SynthesisMode) -> Value {
        let Some(node) = self.introspector.resolve_field(field, parent) else {
            return opaque_object();
        };

        let value = self.value_for(node);
        let is_array_field = self.introspector.registry().is_array_field(field);
        match value {
            Value::Object(_) if mode == SynthesisMode::ArrayAppend && is_array_field => {
                Value::Array(vec![value])
            }
            other => other,
        }
    }

    /// Default value of a node, ignoring any default on the node itself
    pub fn value_for(&self, node: &SchemaNode) -> Value {
        match unwrap(node) {
            SchemaNode::Object { fields, .. } => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|field| (field.name.clone(), self.field_value(&field.node)))
                    .collect();
                Value::Object(map)
            }
            SchemaNode::Primitive { kind, .. } => match kind {
                PrimitiveKind::String => Value::String(String::new()),
                PrimitiveKind::Number => Value::from(0),
                PrimitiveKind::Boolean => Value::Bool(false),
            },
            SchemaNode::Enum { allowed } => allowed
                .first()
                .map_or(Value::Null, |option| Value::String(option.clone())),
            SchemaNode::Array { .. } => Value::Array(Vec::new()),
            SchemaNode::Union { options } => options
                .first()
                .map_or(Value::Null, |option| self.value_for(option)),
            SchemaNode::Wrapper { .. } => Value::Null,
        }
    }

    /// A declared field's value: its own default when it has one
    fn field_value(&self, node: &SchemaNode) -> Value {
        match declared_default(node) {
            Some(default) => default.clone(),
            None => self.value_for(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::standard().unwrap()
    }

    #[test]
    fn test_drug_default() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);
        let value = synth.synthesize("drugs", Some("trials"), SynthesisMode::WholeField);
        assert_eq!(
            value,
            json!({
                "drug_type": "Cannabis",
                "other_drug_type": null,
                "quantity": 0,
                "source": ""
            })
        );
    }

    #[test]
    fn test_array_append_wraps_array_fields_only() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);

        let drugs = synth.synthesize("drugs", Some("trials"), SynthesisMode::ArrayAppend);
        assert_eq!(drugs.as_array().map(Vec::len), Some(1));

        let plea = synth.synthesize("guilty_plea", Some("trials"), SynthesisMode::ArrayAppend);
        assert!(plea.is_object());
        assert_eq!(plea["pleaded_guilty"], json!(false));
        assert_eq!(plea["court_type"], json!(null));
    }

    #[test]
    fn test_unknown_field_is_opaque_object() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);
        assert_eq!(
            synth.synthesize("no_such_field", None, SynthesisMode::WholeField),
            json!({})
        );
    }

    #[test]
    fn test_union_takes_first_option() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);
        assert_eq!(
            synth.synthesize("age_at_offence", Some("defendants"), SynthesisMode::WholeField),
            json!({"age": 0, "source": ""})
        );
        assert_eq!(
            synth.synthesize("date", Some("offence_date"), SynthesisMode::WholeField),
            json!("")
        );
    }

    #[test]
    fn test_nested_objects_use_declared_shape() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);
        let charge = synth.synthesize("charge_type", Some("trials"), SynthesisMode::WholeField);
        assert_eq!(charge["type"], json!("Actual Trafficking"));
        assert_eq!(charge["defendant_name"], json!(""));

        let trial = synth.synthesize("trials", None, SynthesisMode::WholeField);
        assert_eq!(trial["drugs"], json!([]));
        assert_eq!(trial["aggravating_factors"], json!(null));
        assert_eq!(trial["starting_point"]["sentence_years"], json!(0));
        assert!(trial["starting_point"].get("total_months").is_none());
    }

    #[test]
    fn test_synthesis_is_pure() {
        let registry = registry();
        let synth = Synthesizer::new(&registry);
        let first = synth.synthesize("defendants", None, SynthesisMode::ArrayAppend);
        let second = synth.synthesize("defendants", None, SynthesisMode::ArrayAppend);
        assert_eq!(first, second);
    }
}
