//! Judgement Schemas
//!
//! Schema engine behind the case verification screen: reviewers edit facts
//! extracted from Hong Kong drug trafficking judgements, and every edit is
//! checked against declarative record definitions.
//!
//! ## Features
//!
//! - **Schema Registry**: immutable tables of record definitions, field
//!   entries and enum options, resolved by field name and parent name
//! - **Default Synthesis**: a structurally valid starting value for any field
//! - **Validation**: type, enum, length, format and cross-field checks with
//!   path-qualified messages, collected per section
//! - **Derived Fields**: sentence totals, weekday and holiday flags, time of
//!   day, district and court, computed from validated input
//! - **Verification Workflow**: edit sessions, draft saves, checksummed
//!   verified records
//!
//! ## Example
//!
//! ```no_run
//! use judgement_schemas::{CaseRecord, SchemaRegistry, Section, Validator};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::standard()?;
//! let record = CaseRecord::default().with_section(Section::Trials, json!({"trials": []}));
//! let result = Validator::new(&registry).validate(&record);
//! assert!(result.is_valid());
//! # Ok::<(), judgement_schemas::SchemaError>(())
//! ```

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod derive;
pub mod districts;
pub mod error;
pub mod export;
pub mod format;
pub mod holidays;
pub mod introspect;
pub mod record;
pub mod registry;
pub mod schema;
pub mod session;
pub mod store;
pub mod synthesize;
pub mod validate;

pub use checksum::Checksum;
pub use config::VerifierConfig;
pub use error::{Result, SchemaError};
pub use holidays::HolidayCalendar;
pub use introspect::{unwrap, Introspector};
pub use record::{CaseRecord, Section};
pub use registry::{EnumIndex, FieldContext, RegistryBuilder, SchemaRegistry};
pub use schema::{Derivation, LengthRule, SchemaNode, WrapperKind};
pub use session::{EditSession, Grant, SessionAuthority, SessionState};
pub use store::{CaseStore, JsonFileStore, MemoryStore, StoredCase};
pub use synthesize::{SynthesisMode, Synthesizer};
pub use validate::{Issue, IssueKind, SectionReport, ValidationResult, Validator};
