//! Case records and their sections

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// One of the independently validated top-level record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Judgement,
    Defendants,
    Trials,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Judgement, Section::Defendants, Section::Trials];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Judgement => "judgement",
            Section::Defendants => "defendants",
            Section::Trials => "trials",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownSection(s.to_string()))
    }
}

/// The extracted facts for one case, as edited on the verification screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgement: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defendants: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Exclude this case from training data
    #[serde(default)]
    pub exclude: bool,
}

impl CaseRecord {
    /// The section's value, treating an explicit `null` as absent
    pub fn section(&self, section: Section) -> Option<&Value> {
        let value = match section {
            Section::Judgement => self.judgement.as_ref(),
            Section::Defendants => self.defendants.as_ref(),
            Section::Trials => self.trials.as_ref(),
        };
        value.filter(|v| !v.is_null())
    }

    pub fn set_section(&mut self, section: Section, value: Option<Value>) {
        match section {
            Section::Judgement => self.judgement = value,
            Section::Defendants => self.defendants = value,
            Section::Trials => self.trials = value,
        }
    }

    pub fn with_section(mut self, section: Section, value: Value) -> Self {
        self.set_section(section, Some(value));
        self
    }
}
