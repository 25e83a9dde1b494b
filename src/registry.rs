//! Schema Registry
//!
//! An immutable table of every record definition, built once and passed by
//! reference to the introspector, synthesizer and validator.
//!
//! Fields are addressed by a [`FieldContext`]: the field's own name plus
//! the name of the field it is nested under. The same field name can mean
//! different things under different parents (`type`, `source`, `date`), so
//! every lookup tries the parent-qualified key `parent_field` before the
//! bare `field` key. Field-node lookup and enum-option lookup share that
//! ordering through [`FieldContext::resolve`].

use std::collections::{BTreeMap, HashMap, HashSet};

use semver::Version;

use crate::districts::DistrictMap;
use crate::error::{Result, SchemaError};
use crate::format::FormatPatterns;
use crate::holidays::HolidayCalendar;
use crate::introspect::unwrap;
use crate::record::Section;
use crate::schema::SchemaNode;

/// Resolution key for a field: its name and, optionally, its parent's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldContext<'a> {
    pub field: &'a str,
    pub parent: Option<&'a str>,
}

impl<'a> FieldContext<'a> {
    pub fn new(field: &'a str) -> Self {
        Self { field, parent: None }
    }

    pub fn within(field: &'a str, parent: Option<&'a str>) -> Self {
        Self { field, parent }
    }

    /// `parent_field`, when there is a parent
    pub fn qualified_key(&self) -> Option<String> {
        self.parent.map(|parent| format!("{}_{}", parent, self.field))
    }

    /// Lookup keys in precedence order
    pub fn candidate_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        keys.extend(self.qualified_key());
        keys.push(self.field.to_string());
        keys
    }

    /// First entry of `table` matching a candidate key
    pub fn resolve<'t, T>(&self, table: &'t HashMap<String, T>) -> Option<&'t T> {
        self.candidate_keys()
            .iter()
            .find_map(|key| table.get(key.as_str()))
    }
}

/// Permitted values per disambiguated field key
#[derive(Debug, Clone, Default)]
pub struct EnumIndex {
    options: HashMap<String, Vec<String>>,
}

impl EnumIndex {
    pub fn insert(&mut self, key: &str, options: &[&str]) {
        self.options.insert(
            key.to_string(),
            options.iter().map(|s| s.to_string()).collect(),
        );
    }

    /// Options registered under an exact key
    pub fn options(&self, key: &str) -> Option<&[String]> {
        self.options.get(key).map(Vec::as_slice)
    }

    /// Options for a field, parent-qualified key first
    pub fn lookup(&self, ctx: &FieldContext<'_>) -> Option<&[String]> {
        ctx.resolve(&self.options).map(Vec::as_slice)
    }

    /// The key a lookup would use, if any matches
    pub fn resolved_key(&self, ctx: &FieldContext<'_>) -> Option<String> {
        ctx.candidate_keys()
            .into_iter()
            .find(|key| self.options.contains_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Index every enum declared in the given trees and field entries
    ///
    /// A field nested under `parent` is indexed as `parent_field`. The bare
    /// `field` key is added only when every field of that name in the trees
    /// is an enum with the same options.
    pub fn derive<'n>(
        sections: impl IntoIterator<Item = (&'n str, &'n SchemaNode)>,
        fields: impl IntoIterator<Item = (&'n str, &'n SchemaNode)>,
    ) -> Result<Self> {
        let mut index = Self::default();
        let mut bare: BTreeMap<&str, Option<&[String]>> = BTreeMap::new();

        for (key, node) in fields {
            if let Some(allowed) = enum_options(node) {
                index.insert_derived(key.to_string(), allowed)?;
            }
            collect_enums(node, key, &mut index, &mut bare)?;
        }
        for (name, node) in sections {
            collect_enums(node, name, &mut index, &mut bare)?;
        }

        for (name, allowed) in bare {
            if let Some(allowed) = allowed {
                index
                    .options
                    .entry(name.to_string())
                    .or_insert_with(|| allowed.to_vec());
            }
        }
        Ok(index)
    }

    fn insert_derived(&mut self, key: String, allowed: &[String]) -> Result<()> {
        match self.options.get(&key) {
            Some(existing) if existing.as_slice() != allowed => {
                Err(SchemaError::InvalidSchema(format!(
                    "conflicting enum options for '{}'",
                    key
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.options.insert(key, allowed.to_vec());
                Ok(())
            }
        }
    }
}

/// Options of an enum node, or of an array of enums
fn enum_options(node: &SchemaNode) -> Option<&[String]> {
    match unwrap(node) {
        SchemaNode::Enum { allowed } => Some(allowed),
        SchemaNode::Array { element, .. } => match unwrap(element) {
            SchemaNode::Enum { allowed } => Some(allowed),
            _ => None,
        },
        _ => None,
    }
}

fn collect_enums<'n>(
    node: &'n SchemaNode,
    parent: &str,
    index: &mut EnumIndex,
    bare: &mut BTreeMap<&'n str, Option<&'n [String]>>,
) -> Result<()> {
    match unwrap(node) {
        SchemaNode::Object { fields, .. } => {
            for field in fields {
                let name = field.name.as_str();
                let allowed = enum_options(&field.node);
                if let Some(allowed) = allowed {
                    index.insert_derived(format!("{}_{}", parent, name), allowed)?;
                }
                bare.entry(name)
                    .and_modify(|seen| {
                        if *seen != allowed {
                            *seen = None;
                        }
                    })
                    .or_insert(allowed);
                collect_enums(&field.node, name, index, bare)?;
            }
            Ok(())
        }
        SchemaNode::Array { element, .. } => collect_enums(element, parent, index, bare),
        SchemaNode::Union { options } => options
            .iter()
            .try_for_each(|option| collect_enums(option, parent, index, bare)),
        _ => Ok(()),
    }
}

/// The registry of record definitions
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    version: Version,
    sections: BTreeMap<Section, SchemaNode>,
    fields: HashMap<String, SchemaNode>,
    array_fields: HashSet<String>,
    computed: Vec<String>,
    enums: EnumIndex,
    districts: DistrictMap,
    holidays: HolidayCalendar,
    formats: FormatPatterns,
}

impl SchemaRegistry {
    /// Registry with every built-in definition
    pub fn standard() -> Result<Self> {
        crate::catalog::standard_registry()
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Root node of a section
    pub fn section(&self, section: Section) -> Result<&SchemaNode> {
        self.sections
            .get(&section)
            .ok_or_else(|| SchemaError::UnknownSection(section.to_string()))
    }

    pub fn sections(&self) -> impl Iterator<Item = (Section, &SchemaNode)> {
        self.sections.iter().map(|(section, node)| (*section, node))
    }

    /// Node registered under an exact key
    pub fn field_entry(&self, key: &str) -> Option<&SchemaNode> {
        self.fields.get(key)
    }

    /// Every registered field key, sorted
    pub fn field_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Node registered for a field context, parent-qualified key first
    pub fn lookup_field(&self, ctx: &FieldContext<'_>) -> Option<&SchemaNode> {
        ctx.resolve(&self.fields)
    }

    pub fn is_array_field(&self, name: &str) -> bool {
        self.array_fields.contains(name)
    }

    pub fn is_computed(&self, name: &str) -> bool {
        self.computed.iter().any(|c| c == name)
    }

    pub fn computed_fields(&self) -> &[String] {
        &self.computed
    }

    pub fn enums(&self) -> &EnumIndex {
        &self.enums
    }

    /// Options for a field, parent-qualified key first
    pub fn options_for(&self, field: &str, parent: Option<&str>) -> Option<&[String]> {
        self.enums.lookup(&FieldContext::within(field, parent))
    }

    pub fn districts(&self) -> &DistrictMap {
        &self.districts
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn formats(&self) -> &FormatPatterns {
        &self.formats
    }

    /// Copy of this registry with a different holiday calendar
    pub fn with_holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }
}

/// Assembles a [`SchemaRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    version: Version,
    sections: BTreeMap<Section, SchemaNode>,
    fields: HashMap<String, SchemaNode>,
    array_fields: HashSet<String>,
    computed: Vec<String>,
    enums: EnumIndex,
    districts: DistrictMap,
    holidays: HolidayCalendar,
}

impl RegistryBuilder {
    pub fn new(version: &str) -> Result<Self> {
        Ok(Self {
            version: Version::parse(version)?,
            sections: BTreeMap::new(),
            fields: HashMap::new(),
            array_fields: HashSet::new(),
            computed: Vec::new(),
            enums: EnumIndex::default(),
            districts: DistrictMap::default(),
            holidays: HolidayCalendar::default(),
        })
    }

    pub fn section(mut self, section: Section, node: SchemaNode) -> Self {
        self.sections.insert(section, node);
        self
    }

    /// Register a node under a bare or parent-qualified key
    pub fn field(mut self, key: &str, node: SchemaNode) -> Self {
        self.fields.insert(key.to_string(), node);
        self
    }

    pub fn array_field(mut self, name: &str) -> Self {
        self.array_fields.insert(name.to_string());
        self
    }

    pub fn computed(mut self, name: &str) -> Self {
        if !self.computed.iter().any(|c| c == name) {
            self.computed.push(name.to_string());
        }
        self
    }

    /// Expected options for a key; `build` fails unless the schemas agree
    pub fn enum_options(mut self, key: &str, options: &[&str]) -> Self {
        self.enums.insert(key, options);
        self
    }

    pub fn districts(mut self, districts: DistrictMap) -> Self {
        self.districts = districts;
        self
    }

    pub fn holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn build(self) -> Result<SchemaRegistry> {
        for (section, node) in &self.sections {
            check_node(node, section.as_str())?;
        }
        for (key, node) in &self.fields {
            check_node(node, key)?;
        }
        let enums = EnumIndex::derive(
            self.sections.iter().map(|(section, node)| (section.as_str(), node)),
            self.fields.iter().map(|(key, node)| (key.as_str(), node)),
        )?;
        // Explicit options must agree with the enum declared under that key
        for key in self.enums.keys() {
            if enums.options(key) != self.enums.options(key) {
                return Err(SchemaError::InvalidSchema(format!(
                    "enum options for '{}' do not match any declared enum",
                    key
                )));
            }
        }
        for name in &self.array_fields {
            if !self.fields.contains_key(name) {
                return Err(SchemaError::InvalidSchema(format!(
                    "array field '{}' has no registered element schema",
                    name
                )));
            }
        }

        Ok(SchemaRegistry {
            version: self.version,
            sections: self.sections,
            fields: self.fields,
            array_fields: self.array_fields,
            computed: self.computed,
            enums,
            districts: self.districts,
            holidays: self.holidays,
            formats: FormatPatterns::compile()?,
        })
    }
}

/// Enum options must be non-empty and distinct; object fields unique
fn check_node(node: &SchemaNode, at: &str) -> Result<()> {
    match node {
        SchemaNode::Primitive { .. } => Ok(()),
        SchemaNode::Enum { allowed } => check_options(allowed.iter().map(String::as_str), at),
        SchemaNode::Object { fields, .. } => {
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::InvalidSchema(format!(
                        "duplicate field '{}' in {}",
                        field.name, at
                    )));
                }
                check_node(&field.node, &format!("{}.{}", at, field.name))?;
            }
            Ok(())
        }
        SchemaNode::Array { element, .. } => check_node(element, at),
        SchemaNode::Union { options } => {
            if options.is_empty() {
                return Err(SchemaError::InvalidSchema(format!("empty union in {}", at)));
            }
            options.iter().try_for_each(|option| check_node(option, at))
        }
        SchemaNode::Wrapper { inner, .. } => check_node(inner, at),
    }
}

fn check_options<'a>(options: impl Iterator<Item = &'a str>, at: &str) -> Result<()> {
    let mut seen = HashSet::new();
    let mut count = 0;
    for option in options {
        count += 1;
        if !seen.insert(option) {
            return Err(SchemaError::InvalidSchema(format!(
                "duplicate enum option '{}' in {}",
                option, at
            )));
        }
    }
    if count == 0 {
        return Err(SchemaError::InvalidSchema(format!("empty enum in {}", at)));
    }
    Ok(())
}
