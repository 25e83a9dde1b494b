//! Validation and transformation
//!
//! Walks a JSON value against a [`SchemaNode`] and produces both the list of
//! issues and the transformed value: defaults filled in, unknown keys
//! dropped, computed fields derived. Nothing here short-circuits; every issue
//! in a section is collected in document order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::derive;
use crate::introspect::{admits_null, unwrap};
use crate::record::{CaseRecord, Section};
use crate::registry::SchemaRegistry;
use crate::schema::{received_name, LengthRule, SchemaNode, WrapperKind};

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Wrong kind of value, missing value or enum mismatch
    Type,
    /// Array too short, too long or not the required size
    Length,
    /// String does not match its required format
    Format,
    /// A cross-field rule does not hold
    Conditional,
    /// A derivation's lookup tables do not cover the input
    Configuration,
}

/// One problem found in a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dotted_path(), self.message)
    }
}

/// Outcome of validating one value
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub issues: Vec<Issue>,
    /// `None` when the value was absent and allowed to stay absent
    pub value: Option<Value>,
}

impl Report {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of validating one section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionReport {
    pub section: Section,
    pub issues: Vec<Issue>,
    /// The transformed section, or the input unchanged when it has issues
    pub transformed: Value,
}

impl SectionReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues as `path: message` strings
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Outcome of validating a whole case record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    /// `path: message` strings for each section that has issues
    pub errors: BTreeMap<Section, Vec<String>>,
    #[serde(skip)]
    pub issues: BTreeMap<Section, Vec<Issue>>,
    pub transformed: CaseRecord,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of sections with at least one issue
    pub fn failing_sections(&self) -> usize {
        self.errors.len()
    }

    pub fn section_errors(&self, section: Section) -> &[String] {
        self.errors.get(&section).map_or(&[], Vec::as_slice)
    }
}

/// Issues collected during one walk, with the current position
#[derive(Default)]
struct Walk {
    path: Vec<String>,
    issues: Vec<Issue>,
}

impl Walk {
    fn report(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(Issue {
            path: self.path.clone(),
            kind,
            message: message.into(),
        });
    }

    fn nested<T>(&mut self, segment: impl Into<String>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment.into());
        let out = f(self);
        self.path.pop();
        out
    }

    fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }
}

/// Validates values against the nodes of a registry
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate and transform a single value
    pub fn validate_value(&self, node: &SchemaNode, value: &Value) -> Report {
        let mut walk = Walk::default();
        let value = self.check(node, Some(value), &mut walk);
        Report {
            issues: walk.issues,
            value,
        }
    }

    /// Validate and transform one section's value
    pub fn validate_section(&self, section: Section, value: &Value) -> SectionReport {
        let (issues, transformed) = match self.registry.section(section) {
            Ok(node) => {
                let report = self.validate_value(node, value);
                match report.value {
                    Some(out) if report.issues.is_empty() => (report.issues, out),
                    _ => (report.issues, value.clone()),
                }
            }
            Err(err) => {
                tracing::warn!(%section, "{}", err);
                let issue = Issue {
                    path: Vec::new(),
                    kind: IssueKind::Configuration,
                    message: err.to_string(),
                };
                (vec![issue], value.clone())
            }
        };

        tracing::debug!(%section, issues = issues.len(), "section validated");
        SectionReport {
            section,
            issues,
            transformed,
        }
    }

    /// Validate every present section of a record independently
    pub fn validate(&self, record: &CaseRecord) -> ValidationResult {
        let mut result = ValidationResult {
            transformed: record.clone(),
            ..Default::default()
        };

        for section in Section::ALL {
            let Some(value) = record.section(section) else {
                continue;
            };
            let report = self.validate_section(section, value);
            if !report.is_valid() {
                result.errors.insert(section, report.messages());
                result.issues.insert(section, report.issues);
            }
            result.transformed.set_section(section, Some(report.transformed));
        }
        result
    }

    fn check(&self, node: &SchemaNode, value: Option<&Value>, walk: &mut Walk) -> Option<Value> {
        match node {
            SchemaNode::Wrapper { inner, kind } => self.check_wrapper(inner, kind, value, walk),
            _ => {
                let Some(value) = value else {
                    walk.report(
                        IssueKind::Type,
                        format!("Invalid input: expected {}, received undefined", expected(node)),
                    );
                    return None;
                };
                Some(self.check_structural(node, value, walk))
            }
        }
    }

    fn check_wrapper(
        &self,
        inner: &SchemaNode,
        kind: &WrapperKind,
        value: Option<&Value>,
        walk: &mut Walk,
    ) -> Option<Value> {
        match kind {
            WrapperKind::DefaultValue(default) if value.is_none() => Some(default.clone()),
            WrapperKind::Optional if value.is_none() => None,
            WrapperKind::Nullable if value == Some(&Value::Null) => Some(Value::Null),
            WrapperKind::Derived(derivation) => {
                let before = walk.issues.len();
                let out = self.check(inner, value, walk)?;
                if walk.issues.len() > before {
                    return Some(out);
                }
                let Value::Object(mut fields) = out else {
                    return Some(out);
                };
                if let Err(err) = derive::apply(*derivation, &mut fields, self.registry) {
                    tracing::warn!(path = %walk.path.join("."), "{}", err);
                    walk.report(IssueKind::Configuration, err.to_string());
                }
                Some(Value::Object(fields))
            }
            _ => self.check(inner, value, walk),
        }
    }

    fn check_structural(&self, node: &SchemaNode, value: &Value, walk: &mut Walk) -> Value {
        match node {
            SchemaNode::Primitive { kind, format } => {
                if !kind.accepts(value) {
                    type_mismatch(node, value, walk);
                } else if let (Some(format), Some(text)) = (format, value.as_str()) {
                    if let Err(message) = self.registry.formats().check(*format, text) {
                        walk.report(IssueKind::Format, message);
                    }
                }
                value.clone()
            }
            SchemaNode::Enum { allowed } => {
                let known = value.as_str().map_or(false, |v| allowed.iter().any(|a| a == v));
                if !known {
                    let options: Vec<String> = allowed.iter().map(|a| format!("\"{}\"", a)).collect();
                    walk.report(
                        IssueKind::Type,
                        format!("Invalid option: expected one of {}", options.join("|")),
                    );
                }
                value.clone()
            }
            SchemaNode::Object { fields, rules } => {
                let Value::Object(input) = value else {
                    type_mismatch(node, value, walk);
                    return value.clone();
                };

                let type_issues = walk.count(IssueKind::Type);
                let mut out = Map::new();
                for field in fields {
                    let checked = walk.nested(field.name.as_str(), |walk| {
                        self.check(&field.node, input.get(&field.name), walk)
                    });
                    if let Some(checked) = checked {
                        out.insert(field.name.clone(), checked);
                    }
                }

                if walk.count(IssueKind::Type) == type_issues {
                    for rule in rules.iter().filter(|rule| !rule.holds(&out)) {
                        walk.report(IssueKind::Conditional, rule.message.as_str());
                    }
                }
                Value::Object(out)
            }
            SchemaNode::Array { element, length } => {
                let Value::Array(items) = value else {
                    type_mismatch(node, value, walk);
                    return value.clone();
                };

                if !length.allows(items.len()) {
                    walk.report(IssueKind::Length, length_message(*length));
                }
                let out = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        walk.nested(index.to_string(), |walk| self.check(element, Some(item), walk))
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Value::Array(out)
            }
            SchemaNode::Union { options } => {
                match options.iter().find(|option| shape_accepts(option, value)) {
                    Some(option) => self.check(option, Some(value), walk).unwrap_or(Value::Null),
                    None => {
                        type_mismatch(node, value, walk);
                        value.clone()
                    }
                }
            }
            SchemaNode::Wrapper { .. } => self.check(node, Some(value), walk).unwrap_or(Value::Null),
        }
    }
}

fn type_mismatch(node: &SchemaNode, value: &Value, walk: &mut Walk) {
    walk.report(
        IssueKind::Type,
        format!(
            "Invalid input: expected {}, received {}",
            expected(node),
            received_name(Some(value))
        ),
    );
}

/// What a node expects, with union options joined by `|`
fn expected(node: &SchemaNode) -> String {
    match unwrap(node) {
        SchemaNode::Union { options } => options
            .iter()
            .map(expected)
            .collect::<Vec<_>>()
            .join("|"),
        other => other.expected_name().to_string(),
    }
}

fn length_message(rule: LengthRule) -> String {
    match rule {
        LengthRule::Any => String::new(),
        LengthRule::AtLeast(min) => format!("Too small: expected array to have >={} items", min),
        LengthRule::Exactly(n) => format!("Invalid length: expected array to have exactly {} items", n),
    }
}

/// Whether a value has the basic shape of a node, used to pick a union option
fn shape_accepts(node: &SchemaNode, value: &Value) -> bool {
    if value.is_null() && admits_null(node) {
        return true;
    }
    match unwrap(node) {
        SchemaNode::Primitive { kind, .. } => kind.accepts(value),
        SchemaNode::Enum { .. } => value.is_string(),
        SchemaNode::Object { .. } => value.is_object(),
        SchemaNode::Array { .. } => value.is_array(),
        SchemaNode::Union { options } => options.iter().any(|option| shape_accepts(option, value)),
        SchemaNode::Wrapper { .. } => false,
    }
}
