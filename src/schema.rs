//! Schema node types
//!
//! A [`SchemaNode`] describes the type of one field. Structural nodes
//! (primitive, enum, object, array, union) carry the shape; wrapper nodes
//! layer nullability, defaults and derivations on top of an inner node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a primitive value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Whether a JSON value has this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::String => value.is_string(),
            PrimitiveKind::Number => value.is_number(),
            PrimitiveKind::Boolean => value.is_boolean(),
        }
    }
}

/// Fixed shapes a string field may be required to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    /// `[2025] HKCFI 100`
    NeutralCitation,
    /// `YYYY-MM-DD`, must be a real calendar date
    IsoDate,
    /// `YYYY-MM-DDTHH:MM:SS` with a `Z` or `±HH:MM` offset
    IsoDateTime,
    /// `HH:MM:SS` with an optional offset
    TimeWithOffset,
    /// `HCCC 123/2024`
    CaseReference,
    /// Two-letter country code
    CountryCode,
}

/// Length constraint on an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthRule {
    #[default]
    Any,
    AtLeast(usize),
    Exactly(usize),
}

impl LengthRule {
    pub fn allows(&self, len: usize) -> bool {
        match *self {
            LengthRule::Any => true,
            LengthRule::AtLeast(min) => len >= min,
            LengthRule::Exactly(n) => len == n,
        }
    }
}

/// Computed fields attached to a record by a `Derived` wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// `total_months` from `sentence_years` and `sentence_months`
    SentenceTotal,
    /// `total_months` plus `guilty_plea_reduction_total_months`
    FinalSentenceTotals,
    /// `day_of_week` and `is_hk_public_holiday` from `date`
    DateFacts,
    /// `time_of_day` from `time`
    TimeOfDay,
    /// `district` from `subDistrict`
    District,
    /// `court` from `neutral_citation`
    Court,
}

impl Derivation {
    /// Names of the fields this derivation writes
    pub fn outputs(&self) -> &'static [&'static str] {
        match self {
            Derivation::SentenceTotal => &["total_months"],
            Derivation::FinalSentenceTotals => &["total_months", "guilty_plea_reduction_total_months"],
            Derivation::DateFacts => &["day_of_week", "is_hk_public_holiday"],
            Derivation::TimeOfDay => &["time_of_day"],
            Derivation::District => &["district"],
            Derivation::Court => &["court"],
        }
    }
}

/// How a wrapper modifies its inner node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperKind {
    Nullable,
    Optional,
    /// Value used when the field is absent
    DefaultValue(Value),
    Derived(Derivation),
}

/// One "if `when_field` equals `when_value` then `field` must be set" clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub field: String,
    pub when_field: String,
    pub when_value: Value,
}

/// Cross-field rule on an object, reported with a single message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub message: String,
    pub requirements: Vec<Requirement>,
}

impl ConditionalRule {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            requirements: Vec::new(),
        }
    }

    /// Require `field` to be non-null whenever `when_field == when_value`
    pub fn require(mut self, field: &str, when_field: &str, when_value: impl Into<Value>) -> Self {
        self.requirements.push(Requirement {
            field: field.to_string(),
            when_field: when_field.to_string(),
            when_value: when_value.into(),
        });
        self
    }

    /// Whether the rule holds for an object's fields
    pub fn holds(&self, fields: &serde_json::Map<String, Value>) -> bool {
        self.requirements.iter().all(|req| {
            let triggered = fields.get(&req.when_field) == Some(&req.when_value);
            !triggered || fields.get(&req.field).map_or(false, |v| !v.is_null())
        })
    }
}

/// A named field inside an object node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
}

/// Type descriptor of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaNode {
    Primitive {
        kind: PrimitiveKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<StringFormat>,
    },
    Enum {
        allowed: Vec<String>,
    },
    Object {
        fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        rules: Vec<ConditionalRule>,
    },
    Array {
        element: Box<SchemaNode>,
        #[serde(default)]
        length: LengthRule,
    },
    Union {
        options: Vec<SchemaNode>,
    },
    Wrapper {
        inner: Box<SchemaNode>,
        kind: WrapperKind,
    },
}

impl SchemaNode {
    pub fn string() -> Self {
        SchemaNode::Primitive { kind: PrimitiveKind::String, format: None }
    }

    pub fn formatted(format: StringFormat) -> Self {
        SchemaNode::Primitive { kind: PrimitiveKind::String, format: Some(format) }
    }

    pub fn number() -> Self {
        SchemaNode::Primitive { kind: PrimitiveKind::Number, format: None }
    }

    pub fn boolean() -> Self {
        SchemaNode::Primitive { kind: PrimitiveKind::Boolean, format: None }
    }

    pub fn enumeration(allowed: &[&str]) -> Self {
        SchemaNode::Enum {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Object with fields in declaration order
    pub fn object(fields: Vec<(&str, SchemaNode)>) -> Self {
        SchemaNode::Object {
            fields: fields
                .into_iter()
                .map(|(name, node)| Field { name: name.to_string(), node })
                .collect(),
            rules: Vec::new(),
        }
    }

    pub fn array(element: SchemaNode) -> Self {
        SchemaNode::Array { element: Box::new(element), length: LengthRule::Any }
    }

    pub fn union(options: Vec<SchemaNode>) -> Self {
        SchemaNode::Union { options }
    }

    fn wrap(self, kind: WrapperKind) -> Self {
        SchemaNode::Wrapper { inner: Box::new(self), kind }
    }

    pub fn nullable(self) -> Self {
        self.wrap(WrapperKind::Nullable)
    }

    pub fn optional(self) -> Self {
        self.wrap(WrapperKind::Optional)
    }

    pub fn default_value(self, value: Value) -> Self {
        self.wrap(WrapperKind::DefaultValue(value))
    }

    /// Nullable, defaulting to `null` when absent
    pub fn or_null(self) -> Self {
        self.nullable().default_value(Value::Null)
    }

    pub fn derived(self, derivation: Derivation) -> Self {
        self.wrap(WrapperKind::Derived(derivation))
    }

    /// Attach a conditional rule. Only meaningful on object nodes.
    pub fn with_rule(mut self, rule: ConditionalRule) -> Self {
        if let SchemaNode::Object { rules, .. } = &mut self {
            rules.push(rule);
        }
        self
    }

    /// Constrain an array node's length
    pub fn with_length(mut self, rule: LengthRule) -> Self {
        if let SchemaNode::Array { length, .. } = &mut self {
            *length = rule;
        }
        self
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, SchemaNode::Wrapper { .. })
    }

    /// Look up a declared field of an object node
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object { fields, .. } => {
                fields.iter().find(|f| f.name == name).map(|f| &f.node)
            }
            _ => None,
        }
    }

    /// Short description used in type-mismatch messages
    pub fn expected_name(&self) -> &'static str {
        match self {
            SchemaNode::Primitive { kind, .. } => kind.name(),
            SchemaNode::Enum { .. } => "string",
            SchemaNode::Object { .. } => "object",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Union { .. } => "union",
            SchemaNode::Wrapper { inner, .. } => inner.expected_name(),
        }
    }
}

/// JSON type name of a value, `undefined` for an absent one
pub fn received_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_only_triggers_on_matching_value() {
        let rule = ConditionalRule::new("Conditional fields validation failed")
            .require("court_type", "pleaded_guilty", true);

        let not_guilty = json!({"pleaded_guilty": false, "court_type": null});
        assert!(rule.holds(not_guilty.as_object().unwrap()));

        let guilty = json!({"pleaded_guilty": true, "court_type": null});
        assert!(!rule.holds(guilty.as_object().unwrap()));

        let guilty_with_court = json!({"pleaded_guilty": true, "court_type": "High Court"});
        assert!(rule.holds(guilty_with_court.as_object().unwrap()));
    }

    #[test]
    fn test_length_rule() {
        assert!(LengthRule::Any.allows(0));
        assert!(!LengthRule::AtLeast(1).allows(0));
        assert!(LengthRule::Exactly(2).allows(2));
        assert!(!LengthRule::Exactly(2).allows(3));
    }

    #[test]
    fn test_builders_only_touch_matching_variants() {
        let node = SchemaNode::string().with_length(LengthRule::Exactly(2));
        assert_eq!(node, SchemaNode::string());

        let node = SchemaNode::object(vec![("a", SchemaNode::number())]);
        assert!(node.field("a").is_some());
        assert!(node.field("b").is_none());
    }
}
