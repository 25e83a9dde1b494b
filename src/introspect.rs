//! Schema introspection
//!
//! Answers "what is the type of this field" for a [`FieldContext`], looking
//! through wrapper layers where the caller only cares about the shape.

use crate::registry::{FieldContext, SchemaRegistry};
use crate::schema::{SchemaNode, WrapperKind};

/// Strip wrapper layers until a structural node is reached
pub fn unwrap(node: &SchemaNode) -> &SchemaNode {
    let mut current = node;
    while let SchemaNode::Wrapper { inner, .. } = current {
        current = inner;
    }
    current
}

/// Wrapper kinds on the outside of a node, outermost first
pub fn wrapper_layers(node: &SchemaNode) -> impl Iterator<Item = &WrapperKind> {
    let mut current = Some(node);
    std::iter::from_fn(move || {
        let SchemaNode::Wrapper { inner, kind } = current? else {
            return None;
        };
        current = Some(inner.as_ref());
        Some(kind)
    })
}

/// Whether any outer layer admits `null` or absence
pub fn admits_null(node: &SchemaNode) -> bool {
    wrapper_layers(node).any(|kind| matches!(kind, WrapperKind::Nullable | WrapperKind::Optional))
}

/// The value of the outermost `DefaultValue` layer, if any
pub fn declared_default(node: &SchemaNode) -> Option<&serde_json::Value> {
    wrapper_layers(node).find_map(|kind| match kind {
        WrapperKind::DefaultValue(value) => Some(value),
        _ => None,
    })
}

/// Field-type queries against a registry
#[derive(Debug, Clone, Copy)]
pub struct Introspector<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Introspector<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Node for a field: `parent_field` entry, bare `field` entry, then the
    /// field as declared in the parent's shape
    pub fn resolve_field(&self, field: &str, parent: Option<&str>) -> Option<&'r SchemaNode> {
        let ctx = FieldContext::within(field, parent);
        if let Some(node) = self.registry.lookup_field(&ctx) {
            return Some(node);
        }
        let declared = self.declared_in_parent(field, parent);
        if declared.is_none() {
            tracing::debug!(field, ?parent, "field does not resolve to a schema");
        }
        declared
    }

    /// The field's node as written inside its parent's object shape.
    /// Array-valued parents are looked through to their element.
    pub fn declared_in_parent(&self, field: &str, parent: Option<&str>) -> Option<&'r SchemaNode> {
        let parent_node = self.registry.lookup_field(&FieldContext::new(parent?))?;
        let shape = match unwrap(parent_node) {
            SchemaNode::Array { element, .. } => unwrap(element),
            other => other,
        };
        shape.field(field)
    }

    /// Whether the field admits `null`. The declaration inside the parent
    /// wins, since a standalone entry usually omits the wrapper.
    pub fn is_nullable(&self, field: &str, parent: Option<&str>) -> bool {
        if let Some(declared) = self.declared_in_parent(field, parent) {
            return admits_null(declared);
        }
        self.resolve_field(field, parent).map_or(false, admits_null)
    }

    /// Options for an enum-typed field
    pub fn options(&self, field: &str, parent: Option<&str>) -> Option<&'r [String]> {
        self.registry.options_for(field, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Derivation;
    use serde_json::json;

    #[test]
    fn test_unwrap_is_idempotent() {
        let node = SchemaNode::number()
            .derived(Derivation::SentenceTotal)
            .nullable()
            .default_value(json!(null))
            .optional();
        let once = unwrap(&node);
        assert_eq!(once, &SchemaNode::number());
        assert_eq!(unwrap(once), once);
    }

    #[test]
    fn test_admits_null_under_default() {
        assert!(admits_null(&SchemaNode::string().or_null()));
        assert!(admits_null(&SchemaNode::string().optional()));
        assert!(!admits_null(&SchemaNode::string().default_value(json!("x"))));
        assert!(!admits_null(&SchemaNode::string()));
    }

    #[test]
    fn test_declared_default() {
        let node = SchemaNode::string().or_null();
        assert_eq!(declared_default(&node), Some(&json!(null)));
        assert_eq!(declared_default(&SchemaNode::boolean()), None);
    }

    #[test]
    fn test_resolution_order() {
        let registry = SchemaRegistry::standard().unwrap();
        let introspector = Introspector::new(&registry);

        // Composite key
        let time = introspector.resolve_field("time", Some("offence_time")).unwrap();
        assert!(matches!(unwrap(time), SchemaNode::Primitive { .. }));

        // Bare key
        let drugs = introspector.resolve_field("drugs", Some("trials")).unwrap();
        assert!(matches!(unwrap(drugs), SchemaNode::Object { .. }));

        // Parent shape
        let quantity = introspector.resolve_field("quantity", Some("drugs")).unwrap();
        assert_eq!(quantity, &SchemaNode::number());

        assert!(introspector.resolve_field("no_such_field", None).is_none());
    }

    #[test]
    fn test_is_nullable_prefers_parent_declaration() {
        let registry = SchemaRegistry::standard().unwrap();
        let introspector = Introspector::new(&registry);

        assert!(introspector.is_nullable("nationality", Some("defendants")));
        assert!(!introspector.is_nullable("nationality", None));
        assert!(introspector.is_nullable("other_drug_type", Some("drugs")));
        assert!(!introspector.is_nullable("quantity", Some("drugs")));
        assert!(!introspector.is_nullable("missing", Some("drugs")));
    }
}
