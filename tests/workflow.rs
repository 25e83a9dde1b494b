//! Verification workflow: edit sessions backed by a file store

use judgement_schemas::{
    CaseRecord, CaseStore, EditSession, Grant, JsonFileStore, SchemaError, SchemaRegistry,
    Section, SessionState, StoredCase,
};
use serde_json::json;
use tempfile::TempDir;

fn valid_case() -> CaseRecord {
    serde_json::from_str(include_str!("fixtures/case_valid.json")).unwrap()
}

fn seeded_store(temp: &TempDir, registry: &SchemaRegistry, record: CaseRecord) -> JsonFileStore {
    let mut store = JsonFileStore::open(temp.path().join("cases")).unwrap();
    store
        .save(&StoredCase::new("HCCC-123-2024", record, registry.version().clone()))
        .unwrap();
    store
}

#[test]
fn test_verify_clean_case() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let mut store = seeded_store(&temp, &registry, valid_case());
    let reviewer = Grant::reviewer("reviewer-a");

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    assert_eq!(session.state(), SessionState::Viewing);
    session.start_editing(&reviewer).unwrap();

    // Entering edit mode materializes computed fields
    assert_eq!(session.record().judgement.as_ref().unwrap()["court"], json!("HKCFI"));

    session.mark_verified(&mut store, &reviewer).unwrap();
    assert_eq!(session.state(), SessionState::Saved);

    let stored = store.load("HCCC-123-2024").unwrap().unwrap();
    assert!(stored.verified);
    assert!(stored.checksum.is_some());
    assert_eq!(stored.updated_by.as_deref(), Some("reviewer-a"));
    assert_eq!(stored.schema_version, *registry.version());
    assert_eq!(&stored.record, session.record());
}

#[test]
fn test_verification_blocked_until_fixed() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let mut store = seeded_store(&temp, &registry, valid_case());
    let reviewer = Grant::reviewer("reviewer-a");

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    session.start_editing(&reviewer).unwrap();
    session
        .set_value(Section::Trials, "trials.0.drugs.0.drug_type", json!("Other"))
        .unwrap();
    assert_eq!(
        session.result().section_errors(Section::Trials),
        ["trials.0.drugs.0: other_drug_type is required when drug_type is 'Other'"]
    );

    let err = session.mark_verified(&mut store, &reviewer).unwrap_err();
    assert!(matches!(err, SchemaError::VerificationBlocked(1)));

    // Drafts with errors can still be saved
    session.save_progress(&mut store, &reviewer).unwrap();
    assert!(!store.load("HCCC-123-2024").unwrap().unwrap().verified);

    session.start_editing(&reviewer).unwrap();
    session
        .set_value(Section::Trials, "trials.0.drugs.0.other_drug_type", json!("Kratom"))
        .unwrap();
    assert!(session.result().is_valid());
    session.mark_verified(&mut store, &reviewer).unwrap();
}

#[test]
fn test_editing_rules() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let store = seeded_store(&temp, &registry, valid_case());
    let reviewer = Grant::reviewer("reviewer-a");

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    session.start_editing(&reviewer).unwrap();

    let err = session
        .set_value(Section::Trials, "trials.0.starting_point.total_months", json!(1))
        .unwrap_err();
    assert!(matches!(err, SchemaError::ComputedField(field) if field == "total_months"));

    let err = session
        .set_value(Section::Judgement, "charges.0.colour", json!("red"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidPath { .. }));

    let err = session.clear(Section::Trials, "trials.0.drugs.0.quantity").unwrap_err();
    assert!(matches!(err, SchemaError::NotNullable(_)));

    session.clear(Section::Defendants, "defendants.0.nationality").unwrap();
    assert_eq!(
        session.record().defendants.as_ref().unwrap()["defendants"][0]["nationality"],
        json!(null)
    );
}

#[test]
fn test_array_editing() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let store = seeded_store(&temp, &registry, valid_case());
    let reviewer = Grant::reviewer("reviewer-a");

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    session.start_editing(&reviewer).unwrap();

    // A null array-valued field starts with one default item
    session
        .fill_default(Section::Trials, "trials.0.aggravating_factors")
        .unwrap();
    let trials = session.record().trials.clone().unwrap();
    assert_eq!(
        trials["trials"][0]["aggravating_factors"],
        json!([{
            "factor": "Refugee/Asylum",
            "other_factor": null,
            "enhancement": null,
            "source": ""
        }])
    );

    session.append_item(Section::Trials, "trials.0.drugs").unwrap();
    let trials = session.record().trials.clone().unwrap();
    assert_eq!(trials["trials"][0]["drugs"].as_array().unwrap().len(), 2);
    assert_eq!(trials["trials"][0]["drugs"][1]["drug_type"], json!("Cannabis"));

    session.remove_item(Section::Trials, "trials.0.drugs", 0).unwrap();
    let trials = session.record().trials.clone().unwrap();
    assert_eq!(trials["trials"][0]["drugs"].as_array().unwrap().len(), 1);
    assert_eq!(trials["trials"][0]["drugs"][0]["drug_type"], json!("Cannabis"));

    let err = session
        .remove_item(Section::Trials, "trials.0.drugs", 5)
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidPath { .. }));
}

#[test]
fn test_remarks_exclude_and_cancel() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let store = seeded_store(&temp, &registry, valid_case());
    let reviewer = Grant::reviewer("reviewer-a");

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    session.start_editing(&reviewer).unwrap();
    session.set_remarks(Some("Sentence figures unclear".into())).unwrap();
    session.set_exclude(true).unwrap();
    assert!(session.record().exclude);

    session.cancel().unwrap();
    assert_eq!(session.state(), SessionState::Cancelled);
    assert!(!session.record().exclude);
    assert_eq!(
        session.record().remarks.as_deref(),
        Some("Checked against the printed judgement")
    );

    let err = session.set_exclude(true).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidTransition { .. }));
}

#[test]
fn test_read_only_reviewer() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let mut store = seeded_store(&temp, &registry, valid_case());
    let viewer = Grant::read_only();

    let mut session = EditSession::load(&registry, &store, "HCCC-123-2024").unwrap();
    assert!(matches!(
        session.start_editing(&viewer),
        Err(SchemaError::Unauthorized("edit"))
    ));
    assert!(matches!(
        session.mark_verified(&mut store, &viewer),
        Err(SchemaError::Unauthorized("verify"))
    ));
}

#[test]
fn test_missing_case() {
    let temp = TempDir::new().unwrap();
    let registry = SchemaRegistry::standard().unwrap();
    let store = seeded_store(&temp, &registry, valid_case());
    assert!(matches!(
        EditSession::load(&registry, &store, "DCCC-1-2025"),
        Err(SchemaError::CaseNotFound(_))
    ));
}
