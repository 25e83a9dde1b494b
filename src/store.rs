//! Case document storage
//!
//! The verification workflow only needs whole-document load and save keyed by
//! case id. [`JsonFileStore`] keeps one pretty-printed JSON file per case;
//! [`MemoryStore`] backs tests and dry runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::record::CaseRecord;

/// A case document as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCase {
    pub case_id: String,
    pub record: CaseRecord,
    #[serde(default)]
    pub verified: bool,
    /// Set when the record is marked verified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
    /// Registry version the record was last validated against
    pub schema_version: Version,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl StoredCase {
    /// Unverified document for a freshly extracted record
    pub fn new(case_id: impl Into<String>, record: CaseRecord, schema_version: Version) -> Self {
        Self {
            case_id: case_id.into(),
            record,
            verified: false,
            checksum: None,
            schema_version,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    /// A verified record must still match the checksum taken at verification
    pub fn check_integrity(&self) -> Result<()> {
        let Some(expected) = self.checksum.as_ref().filter(|_| self.verified) else {
            return Ok(());
        };
        let actual = Checksum::of_record(&self.record)?;
        if *expected != actual {
            tracing::warn!(case_id = %self.case_id, "verified record no longer matches its checksum");
            return Err(SchemaError::ChecksumMismatch {
                case_id: self.case_id.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

/// Whole-document persistence keyed by case id
pub trait CaseStore {
    fn load(&self, case_id: &str) -> Result<Option<StoredCase>>;

    fn save(&mut self, case: &StoredCase) -> Result<()>;

    /// Every stored case id, sorted
    fn list(&self) -> Result<Vec<String>>;

    fn load_existing(&self, case_id: &str) -> Result<StoredCase> {
        self.load(case_id)?
            .ok_or_else(|| SchemaError::CaseNotFound(case_id.to_string()))
    }
}

/// Case ids become file names, so they may not escape the store directory
fn check_case_id(case_id: &str) -> Result<()> {
    let invalid = case_id.is_empty()
        || case_id.starts_with('.')
        || case_id.contains(['/', '\\'])
        || case_id.contains("..");
    if invalid {
        return Err(SchemaError::InvalidCaseId(case_id.to_string()));
    }
    Ok(())
}

/// One `<case_id>.json` file per case under a root directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, case_id: &str) -> Result<PathBuf> {
        check_case_id(case_id)?;
        Ok(self.root.join(format!("{}.json", case_id)))
    }
}

impl CaseStore for JsonFileStore {
    fn load(&self, case_id: &str) -> Result<Option<StoredCase>> {
        let path = self.path_for(case_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let case: StoredCase = serde_json::from_str(&content)?;
        case.check_integrity()?;
        Ok(Some(case))
    }

    fn save(&mut self, case: &StoredCase) -> Result<()> {
        let path = self.path_for(&case.case_id)?;
        let content = serde_json::to_string_pretty(case)?;
        fs::write(&path, content)?;
        tracing::debug!(case_id = %case.case_id, path = %path.display(), "case saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SchemaError::Io(e.into()))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cases: BTreeMap<String, StoredCase>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaseStore for MemoryStore {
    fn load(&self, case_id: &str) -> Result<Option<StoredCase>> {
        check_case_id(case_id)?;
        match self.cases.get(case_id) {
            Some(case) => {
                case.check_integrity()?;
                Ok(Some(case.clone()))
            }
            None => Ok(None),
        }
    }

    fn save(&mut self, case: &StoredCase) -> Result<()> {
        check_case_id(&case.case_id)?;
        self.cases.insert(case.case_id.clone(), case.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.cases.keys().cloned().collect())
    }
}
