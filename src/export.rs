//! JSON Schema export
//!
//! Renders a section's input shape as a draft-07 JSON Schema, for extraction
//! pipelines that produce records outside this crate. Computed fields are
//! not part of the input shape and are left out.

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::format::FormatPatterns;
use crate::introspect::wrapper_layers;
use crate::record::Section;
use crate::registry::SchemaRegistry;
use crate::schema::{ConditionalRule, LengthRule, PrimitiveKind, SchemaNode, StringFormat, WrapperKind};

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Draft-07 document for one section
pub fn to_json_schema(registry: &SchemaRegistry, section: Section) -> Result<Value> {
    let mut document = node_schema(registry.section(section)?);
    if let Value::Object(map) = &mut document {
        map.insert("$schema".into(), Value::from(DRAFT_07));
        map.insert("title".into(), Value::from(section.as_str()));
        map.insert("version".into(), Value::from(registry.version().to_string()));
    }
    Ok(document)
}

/// JSON Schema for a single node
pub fn node_schema(node: &SchemaNode) -> Value {
    match node {
        SchemaNode::Primitive { kind, format } => primitive_schema(*kind, *format),
        SchemaNode::Enum { allowed } => json!({"type": "string", "enum": allowed}),
        SchemaNode::Object { fields, rules } => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for field in fields {
                properties.insert(field.name.clone(), node_schema(&field.node));
                if is_required(&field.node) {
                    required.push(Value::from(field.name.as_str()));
                }
            }
            let mut schema = json!({
                "type": "object",
                "properties": properties,
                "required": required,
            });
            if !rules.is_empty() {
                let clauses: Vec<Value> = rules.iter().flat_map(rule_clauses).collect();
                schema["allOf"] = Value::Array(clauses);
            }
            schema
        }
        SchemaNode::Array { element, length } => {
            let mut schema = json!({"type": "array", "items": node_schema(element)});
            match *length {
                LengthRule::Any => {}
                LengthRule::AtLeast(min) => schema["minItems"] = json!(min),
                LengthRule::Exactly(n) => {
                    schema["minItems"] = json!(n);
                    schema["maxItems"] = json!(n);
                }
            }
            schema
        }
        SchemaNode::Union { options } => {
            json!({"anyOf": options.iter().map(node_schema).collect::<Vec<_>>()})
        }
        SchemaNode::Wrapper { inner, kind } => {
            let inner = node_schema(inner);
            match kind {
                WrapperKind::Nullable => json!({"anyOf": [inner, {"type": "null"}]}),
                WrapperKind::DefaultValue(default) => match inner {
                    Value::Object(mut map) => {
                        map.insert("default".into(), default.clone());
                        Value::Object(map)
                    }
                    other => other,
                },
                WrapperKind::Optional | WrapperKind::Derived(_) => inner,
            }
        }
    }
}

fn primitive_schema(kind: PrimitiveKind, format: Option<StringFormat>) -> Value {
    let mut schema = json!({"type": kind.name()});
    match format {
        Some(StringFormat::CountryCode) => {
            schema["minLength"] = json!(2);
            schema["maxLength"] = json!(2);
        }
        Some(format) => {
            if let Some(pattern) = FormatPatterns::pattern(format) {
                schema["pattern"] = json!(pattern);
            }
        }
        None => {}
    }
    schema
}

/// A field may be omitted when absence is filled in or allowed
fn is_required(node: &SchemaNode) -> bool {
    !wrapper_layers(node)
        .any(|kind| matches!(kind, WrapperKind::Optional | WrapperKind::DefaultValue(_)))
}

/// `if when_field == value then field is not null`, one clause per requirement
fn rule_clauses(rule: &ConditionalRule) -> Vec<Value> {
    rule.requirements
        .iter()
        .map(|req| {
            json!({
                "if": {
                    "properties": single(&req.when_field, json!({"const": req.when_value})),
                    "required": [req.when_field],
                },
                "then": {
                    "properties": single(&req.field, json!({"not": {"type": "null"}})),
                    "required": [req.field],
                },
            })
        })
        .collect()
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}
