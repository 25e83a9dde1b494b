//! Exported JSON Schemas agree with the built-in validator

use jsonschema::{Draft, JSONSchema};
use judgement_schemas::export::to_json_schema;
use judgement_schemas::{CaseRecord, SchemaRegistry, Section, SynthesisMode, Synthesizer};
use serde_json::{json, Value};

fn compile(section: Section) -> JSONSchema {
    let registry = SchemaRegistry::standard().unwrap();
    let schema = to_json_schema(&registry, section).unwrap();
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .unwrap()
}

fn valid_case() -> CaseRecord {
    serde_json::from_str(include_str!("fixtures/case_valid.json")).unwrap()
}

#[test]
fn test_valid_case_matches_exported_schemas() {
    let case = valid_case();
    for section in Section::ALL {
        let schema = compile(section);
        let value = case.section(section).unwrap();
        assert!(schema.is_valid(value), "{} should be valid", section);
    }
}

#[test]
fn test_conditional_rules_are_exported() {
    let schema = compile(Section::Defendants);
    let mut defendants = valid_case().defendants.unwrap();
    defendants["defendants"][0]["nationality"] =
        json!({"category": "Foreign nationality", "foreign_country_code": null, "source": ""});
    assert!(!schema.is_valid(&defendants));

    defendants["defendants"][0]["nationality"]["foreign_country_code"] = json!("VN");
    assert!(schema.is_valid(&defendants));
}

#[test]
fn test_length_and_format_are_exported() {
    let schema = compile(Section::Judgement);
    let mut judgement = valid_case().judgement.unwrap();
    judgement["cases_heard"] = json!([]);
    assert!(!schema.is_valid(&judgement));

    let mut judgement = valid_case().judgement.unwrap();
    judgement["neutral_citation"] = json!("HKCFI 100/2025");
    assert!(!schema.is_valid(&judgement));

    judgement["neutral_citation"] = json!("[２０２５] HKCFI １００");
    assert!(!schema.is_valid(&judgement));
}

#[test]
fn test_synthesized_trial_matches_schema() {
    let registry = SchemaRegistry::standard().unwrap();
    let trial = Synthesizer::new(&registry).synthesize("trials", None, SynthesisMode::WholeField);
    let section: Value = json!({"trials": [trial]});
    assert!(compile(Section::Trials).is_valid(&section));
}
