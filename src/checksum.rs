//! Checksums for verified case records

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::Result;
use crate::record::CaseRecord;

/// SHA256 over a record's canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Checksum of a JSON value with object keys in sorted order
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::from_bytes(&serde_json::to_vec(&canonical(value))?))
    }

    pub fn of_record(record: &CaseRecord) -> Result<Self> {
        Self::from_json(&serde_json::to_value(record)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, record: &CaseRecord) -> Result<bool> {
        Ok(*self == Self::of_record(record)?)
    }
}

fn canonical(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Section;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(Checksum::from_json(&a).unwrap(), Checksum::from_json(&b).unwrap());
    }

    #[test]
    fn test_record_edit_changes_checksum() {
        let record = CaseRecord::default().with_section(Section::Trials, json!({"trials": []}));
        let checksum = Checksum::of_record(&record).unwrap();
        assert!(checksum.matches(&record).unwrap());

        let mut edited = record.clone();
        edited.exclude = true;
        assert!(!checksum.matches(&edited).unwrap());
        assert_eq!(checksum.as_str().len(), 64);
    }
}
