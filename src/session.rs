//! Edit sessions on the verification screen
//!
//! A session moves `Viewing -> Editing -> Saved | Cancelled`. Entering
//! `Editing` runs one validation pass so computed fields are materialized.
//! Every edit replaces the working record wholesale and validates again;
//! the latest [`ValidationResult`] is always available for display.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde_json::Value;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::introspect::{unwrap, Introspector};
use crate::record::{CaseRecord, Section};
use crate::registry::SchemaRegistry;
use crate::schema::SchemaNode;
use crate::store::{CaseStore, StoredCase};
use crate::synthesize::{SynthesisMode, Synthesizer};
use crate::validate::{ValidationResult, Validator};

/// Who is editing, and what they may do
pub trait SessionAuthority {
    /// Name recorded as `updated_by`
    fn user(&self) -> Option<&str>;

    fn can_edit(&self, case_id: &str) -> bool;

    fn can_verify(&self, case_id: &str) -> bool;
}

/// Fixed permissions for every case
#[derive(Debug, Clone, Default)]
pub struct Grant {
    pub user: Option<String>,
    pub edit: bool,
    pub verify: bool,
}

impl Grant {
    /// May edit and verify
    pub fn reviewer(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            edit: true,
            verify: true,
        }
    }

    /// May look but not touch
    pub fn read_only() -> Self {
        Self::default()
    }
}

impl SessionAuthority for Grant {
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn can_edit(&self, _case_id: &str) -> bool {
        self.edit
    }

    fn can_verify(&self, _case_id: &str) -> bool {
        self.verify
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Viewing,
    Editing,
    Saved,
    Cancelled,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Viewing => "viewing",
            SessionState::Editing => "editing",
            SessionState::Saved => "saved",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One step of a dotted edit path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Dotted path inside a section, e.g. `charges.0.offence_date.date`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl FromStr for EditPath {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SchemaError::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("path is empty"));
        }
        let segments = s
            .split('.')
            .map(|part| match part {
                "" => Err(invalid("empty segment")),
                _ => Ok(part
                    .parse::<usize>()
                    .map_or_else(|_| PathSegment::Key(part.to_string()), PathSegment::Index)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }
}

impl EditPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Field name and parent name used for schema lookups. Top-level
    /// judgement fields are looked up under `judgement`.
    pub fn context(&self, section: Section) -> Option<(&str, Option<&str>)> {
        let mut keys = self.keys().rev();
        let field = keys.next()?;
        let parent = keys.next().or(match section {
            Section::Judgement => Some("judgement"),
            _ => None,
        });
        Some((field, parent))
    }

    fn invalid(&self, reason: &str) -> SchemaError {
        SchemaError::InvalidPath {
            path: self.raw.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for EditPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The node declared at a path below `node`
pub fn declared_at<'n>(node: &'n SchemaNode, segments: &[PathSegment]) -> Option<&'n SchemaNode> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(node);
    };
    let shape = unwrap(node);
    let next = match (shape, first) {
        (SchemaNode::Object { .. }, PathSegment::Key(key)) => shape.field(key),
        (SchemaNode::Array { element, .. }, PathSegment::Index(_)) => Some(element.as_ref()),
        (SchemaNode::Union { options }, _) => {
            return options.iter().find_map(|option| declared_at(option, segments))
        }
        _ => None,
    }?;
    declared_at(next, rest)
}

fn read_at<'v>(root: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |current, segment| match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    })
}

fn write_at(root: &mut Value, path: &EditPath, value: Value) -> Result<()> {
    let (last, parents) = path
        .segments
        .split_last()
        .ok_or_else(|| path.invalid("path is empty"))?;

    let mut current = root;
    for segment in parents {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
            (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        }
        .ok_or_else(|| path.invalid("parent does not exist"))?;
    }

    match (last, current) {
        (PathSegment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), value);
        }
        (PathSegment::Index(index), Value::Array(items)) if *index < items.len() => {
            items[*index] = value;
        }
        _ => return Err(path.invalid("does not exist")),
    }
    Ok(())
}

/// Editing state for one case
pub struct EditSession<'r> {
    registry: &'r SchemaRegistry,
    snapshot: StoredCase,
    record: CaseRecord,
    state: SessionState,
    result: ValidationResult,
}

impl<'r> EditSession<'r> {
    /// View a stored case
    pub fn open(registry: &'r SchemaRegistry, stored: StoredCase) -> Self {
        let record = stored.record.clone();
        let result = Validator::new(registry).validate(&record);
        Self {
            registry,
            snapshot: stored,
            record,
            state: SessionState::Viewing,
            result,
        }
    }

    /// Load a case from a store and view it
    pub fn load(registry: &'r SchemaRegistry, store: &dyn CaseStore, case_id: &str) -> Result<Self> {
        Ok(Self::open(registry, store.load_existing(case_id)?))
    }

    pub fn case_id(&self) -> &str {
        &self.snapshot.case_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn record(&self) -> &CaseRecord {
        &self.record
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn is_verified(&self) -> bool {
        self.snapshot.verified
    }

    pub fn start_editing(&mut self, authority: &dyn SessionAuthority) -> Result<()> {
        if !authority.can_edit(self.case_id()) {
            return Err(SchemaError::Unauthorized("edit"));
        }
        if self.state == SessionState::Editing {
            return Err(self.transition_error("start editing"));
        }
        self.replace(self.record.clone());
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Set the value at a path inside a section
    pub fn set_value(&mut self, section: Section, path: &str, value: Value) -> Result<()> {
        let path = self.editable_path(section, path)?;
        self.write(section, &path, value)
    }

    /// Set a nullable field to `null`
    pub fn clear(&mut self, section: Section, path: &str) -> Result<()> {
        let path = self.editable_path(section, path)?;
        let (field, parent) = path.context(section).ok_or_else(|| path.invalid("no field"))?;
        if !Introspector::new(self.registry).is_nullable(field, parent) {
            return Err(SchemaError::NotNullable(path.to_string()));
        }
        self.write(section, &path, Value::Null)
    }

    /// Give an empty field its default value. Array-valued fields start
    /// with one default item.
    pub fn fill_default(&mut self, section: Section, path: &str) -> Result<()> {
        let path = self.editable_path(section, path)?;
        let value = self.synthesize(section, &path, SynthesisMode::ArrayAppend)?;
        self.write(section, &path, value)
    }

    /// Append a default item to the array at a path
    pub fn append_item(&mut self, section: Section, path: &str) -> Result<()> {
        let path = self.editable_path(section, path)?;
        let item = self.synthesize(section, &path, SynthesisMode::WholeField)?;

        let mut items = match self.current(section, &path) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err(path.invalid("not an array")),
        };
        items.push(item);
        self.write(section, &path, Value::Array(items))
    }

    /// Remove one item from the array at a path
    pub fn remove_item(&mut self, section: Section, path: &str, index: usize) -> Result<()> {
        let path = self.editable_path(section, path)?;
        let mut items = match self.current(section, &path) {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(path.invalid("not an array")),
        };
        if index >= items.len() {
            return Err(path.invalid("index out of range"));
        }
        items.remove(index);
        self.write(section, &path, Value::Array(items))
    }

    pub fn set_remarks(&mut self, remarks: Option<String>) -> Result<()> {
        self.require_editing("set remarks")?;
        let mut record = self.record.clone();
        record.remarks = remarks.filter(|r| !r.trim().is_empty());
        self.replace(record);
        Ok(())
    }

    /// Exclude the case from training data, or include it again
    pub fn set_exclude(&mut self, exclude: bool) -> Result<()> {
        self.require_editing("set exclude")?;
        let mut record = self.record.clone();
        record.exclude = exclude;
        self.replace(record);
        Ok(())
    }

    /// Save the working record as a draft. Outstanding errors are allowed.
    pub fn save_progress(
        &mut self,
        store: &mut dyn CaseStore,
        authority: &dyn SessionAuthority,
    ) -> Result<()> {
        self.require_editing("save")?;
        if !authority.can_edit(self.case_id()) {
            return Err(SchemaError::Unauthorized("save"));
        }
        let stored = self.stored(authority, false, None);
        store.save(&stored)?;
        tracing::debug!(
            case_id = %stored.case_id,
            failing_sections = self.result.failing_sections(),
            "progress saved"
        );
        self.snapshot = stored;
        self.state = SessionState::Saved;
        Ok(())
    }

    /// Save the working record as verified. Blocked while any section has errors.
    pub fn mark_verified(
        &mut self,
        store: &mut dyn CaseStore,
        authority: &dyn SessionAuthority,
    ) -> Result<()> {
        if !authority.can_verify(self.case_id()) {
            return Err(SchemaError::Unauthorized("verify"));
        }
        if !matches!(self.state, SessionState::Editing | SessionState::Saved) {
            return Err(self.transition_error("mark verified"));
        }
        if !self.result.is_valid() {
            return Err(SchemaError::VerificationBlocked(self.result.failing_sections()));
        }
        let checksum = Checksum::of_record(&self.record)?;
        let stored = self.stored(authority, true, Some(checksum));
        store.save(&stored)?;
        tracing::debug!(case_id = %stored.case_id, "case verified");
        self.snapshot = stored;
        self.state = SessionState::Saved;
        Ok(())
    }

    /// Discard edits and return to the last loaded or saved record
    pub fn cancel(&mut self) -> Result<()> {
        self.require_editing("cancel")?;
        self.record = self.snapshot.record.clone();
        self.result = Validator::new(self.registry).validate(&self.record);
        self.state = SessionState::Cancelled;
        Ok(())
    }

    fn stored(
        &self,
        authority: &dyn SessionAuthority,
        verified: bool,
        checksum: Option<Checksum>,
    ) -> StoredCase {
        StoredCase {
            case_id: self.snapshot.case_id.clone(),
            record: self.record.clone(),
            verified,
            checksum,
            schema_version: self.registry.version().clone(),
            updated_at: Utc::now(),
            updated_by: authority.user().map(str::to_string),
        }
    }

    fn require_editing(&self, action: &'static str) -> Result<()> {
        if self.state != SessionState::Editing {
            return Err(self.transition_error(action));
        }
        Ok(())
    }

    fn transition_error(&self, action: &'static str) -> SchemaError {
        SchemaError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }

    /// Parse a path and check it names a declared, non-computed field
    fn editable_path(&self, section: Section, path: &str) -> Result<EditPath> {
        self.require_editing("edit")?;
        let path: EditPath = path.parse()?;
        if let Some((field, _)) = path.context(section) {
            if self.registry.is_computed(field) {
                return Err(SchemaError::ComputedField(field.to_string()));
            }
        }
        let root = self.registry.section(section)?;
        if declared_at(root, path.segments()).is_none() {
            return Err(path.invalid("no such field"));
        }
        Ok(path)
    }

    fn synthesize(&self, section: Section, path: &EditPath, mode: SynthesisMode) -> Result<Value> {
        let (field, parent) = path.context(section).ok_or_else(|| path.invalid("no field"))?;
        Ok(Synthesizer::new(self.registry).synthesize(field, parent, mode))
    }

    fn current(&self, section: Section, path: &EditPath) -> Option<&Value> {
        read_at(self.record.section(section)?, path.segments())
    }

    fn write(&mut self, section: Section, path: &EditPath, value: Value) -> Result<()> {
        let mut record = self.record.clone();
        let mut root = record
            .section(section)
            .cloned()
            .unwrap_or_else(crate::catalog::opaque_object);
        write_at(&mut root, path, value)?;
        record.set_section(section, Some(root));
        self.replace(record);
        Ok(())
    }

    fn replace(&mut self, record: CaseRecord) {
        self.result = Validator::new(self.registry).validate(&record);
        self.record = self.result.transformed.clone();
    }
}
