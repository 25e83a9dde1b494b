//! Behavioural properties of the schema engine
//!
//! Synthesis, validation, transformation and resolution checked against the
//! built-in record definitions and a few purpose-built registries.

use judgement_schemas::catalog::{self, standard_builder};
use chrono::NaiveDate;
use judgement_schemas::districts::DistrictMap;
use judgement_schemas::introspect::unwrap;
use judgement_schemas::{
    CaseRecord, HolidayCalendar, IssueKind, RegistryBuilder, SchemaNode, SchemaRegistry, Section, SynthesisMode,
    Synthesizer, Validator,
};
use serde_json::{json, Value};

fn registry() -> SchemaRegistry {
    SchemaRegistry::standard().unwrap()
}

fn valid_case() -> CaseRecord {
    serde_json::from_str(include_str!("fixtures/case_valid.json")).unwrap()
}

// =============================================================================
// Introspection
// =============================================================================

#[test]
fn test_unwrap_idempotent_for_every_field() {
    let registry = registry();
    for key in registry.field_keys() {
        let node = registry.field_entry(key).unwrap();
        let once = unwrap(node);
        assert!(!once.is_wrapper(), "{} unwrapped to a wrapper", key);
        assert_eq!(unwrap(once), once, "{}", key);
    }
}

#[test]
fn test_qualified_key_beats_bare_key() {
    let registry = RegistryBuilder::new("0.1.0")
        .unwrap()
        .field("role", SchemaNode::enumeration(&["Judge", "Counsel"]))
        .field("roles_role", SchemaNode::enumeration(&["Courier", "Storekeeper"]))
        .enum_options("role", &["Judge", "Counsel"])
        .enum_options("roles_role", &["Courier", "Storekeeper"])
        .build()
        .unwrap();
    let synth = Synthesizer::new(&registry);

    assert_eq!(
        synth.synthesize("role", Some("roles"), SynthesisMode::WholeField),
        json!("Courier")
    );
    assert_eq!(
        synth.synthesize("role", Some("representatives"), SynthesisMode::WholeField),
        json!("Judge")
    );
    assert_eq!(registry.options_for("role", Some("roles")).unwrap()[0], "Courier");
    assert_eq!(registry.options_for("role", None).unwrap()[0], "Judge");
}

// =============================================================================
// Synthesis
// =============================================================================

#[test]
fn test_synthesized_defaults_have_no_type_issues() {
    let registry = registry();
    let synth = Synthesizer::new(&registry);
    let validator = Validator::new(&registry);

    for key in registry.field_keys() {
        let node = registry.field_entry(key).unwrap();

        let whole = synth.synthesize(key, None, SynthesisMode::WholeField);
        let report = validator.validate_value(node, &whole);
        let type_issues: Vec<_> = report
            .issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::Type)
            .collect();
        assert!(type_issues.is_empty(), "{}: {:?}", key, type_issues);

        if registry.is_array_field(key) {
            let appended = synth.synthesize(key, None, SynthesisMode::ArrayAppend);
            let report = validator.validate_value(&SchemaNode::array(node.clone()), &appended);
            assert!(
                report.issues.iter().all(|issue| issue.kind != IssueKind::Type),
                "{} (append): {:?}",
                key,
                report.issues
            );
        }
    }
}

#[test]
fn test_drug_type_defaults_to_cannabis() {
    let registry = registry();
    let synth = Synthesizer::new(&registry);
    let drugs = synth.synthesize("drugs", Some("trials"), SynthesisMode::ArrayAppend);
    assert_eq!(drugs[0]["drug_type"], json!("Cannabis"));
    assert_eq!(registry.options_for("drug_type", Some("drugs")).unwrap()[0], "Cannabis");
}

#[test]
fn test_unresolvable_field_is_opaque() {
    let registry = registry();
    let synth = Synthesizer::new(&registry);
    for mode in [SynthesisMode::WholeField, SynthesisMode::ArrayAppend] {
        assert_eq!(synth.synthesize("mystery", Some("nowhere"), mode), json!({}));
    }
}

// =============================================================================
// Validation and transformation
// =============================================================================

#[test]
fn test_valid_case_transforms() {
    let registry = registry();
    let result = Validator::new(&registry).validate(&valid_case());
    assert!(result.is_valid(), "{:?}", result.errors);

    let transformed = result.transformed;
    let judgement = transformed.judgement.unwrap();
    assert_eq!(judgement["court"], json!("HKCFI"));
    let charge = &judgement["charges"][0];
    assert_eq!(charge["offence_date"]["day_of_week"], json!(3));
    assert_eq!(charge["offence_date"]["is_hk_public_holiday"], json!(true));
    assert_eq!(charge["offence_time"]["time_of_day"], json!("night"));
    assert_eq!(charge["place_of_offence"]["district"], json!("Yau Tsim Mong"));
    assert_eq!(charge["cross_border"]["type"], json!(null));

    let trials = transformed.trials.unwrap();
    let trial = &trials["trials"][0];
    assert_eq!(trial["starting_point"]["total_months"], json!(27));
    assert_eq!(trial["final_sentence"]["total_months"], json!(16));
    assert_eq!(
        trial["final_sentence"]["guilty_plea_reduction_total_months"],
        json!(8)
    );
    assert_eq!(trial["drugs"][0]["other_drug_type"], json!(null));

    let defendants = transformed.defendants.unwrap();
    assert_eq!(defendants["defendants"][0]["marital_status"], json!(null));
}

#[test]
fn test_transformation_is_fixed_point() {
    let registry = registry();
    let validator = Validator::new(&registry);
    let first = validator.validate(&valid_case());
    let second = validator.validate(&first.transformed);
    assert!(second.is_valid());
    assert_eq!(second.transformed, first.transformed);
}

#[test]
fn test_computed_fields_are_overwritten() {
    let registry = registry();
    let mut case = valid_case();
    let trials = case.trials.as_mut().unwrap();
    trials["trials"][0]["starting_point"]["total_months"] = json!(999);

    let result = Validator::new(&registry).validate(&case);
    assert_eq!(
        result.transformed.trials.unwrap()["trials"][0]["starting_point"]["total_months"],
        json!(27)
    );
}

#[test]
fn test_sunday_offence_date() {
    let registry = registry();
    let mut case = valid_case();
    case.judgement.as_mut().unwrap()["charges"][0]["offence_date"]["date"] = json!("2025-01-05");
    let result = Validator::new(&registry).validate(&case);
    let judgement = result.transformed.judgement.unwrap();
    let date = &judgement["charges"][0]["offence_date"];
    assert_eq!(date["day_of_week"], json!(7));
    assert_eq!(date["is_hk_public_holiday"], json!(false));
}

#[test]
fn test_time_of_day_through_validation() {
    let registry = registry();
    let validator = Validator::new(&registry);
    let node = catalog::time_detail_input().derived(judgement_schemas::Derivation::TimeOfDay);
    for (time, expected) in [
        ("07:00:00", "morning"),
        ("23:30:00", "night"),
        ("12:00:00", "afternoon"),
    ] {
        let report = validator.validate_value(&node, &json!({"time": time, "source": ""}));
        assert_eq!(report.value.unwrap()["time_of_day"], json!(expected));
    }
}

#[test]
fn test_nationality_conditional() {
    let registry = registry();
    let mut case = valid_case();
    case.defendants.as_mut().unwrap()["defendants"][0]["nationality"] =
        json!({"category": "Foreign nationality", "source": "para 20"});

    let result = Validator::new(&registry).validate(&case);
    assert_eq!(
        result.section_errors(Section::Defendants),
        ["defendants.0.nationality: Conditional fields validation failed"]
    );
    assert_eq!(
        result.issues[&Section::Defendants][0].kind,
        IssueKind::Conditional
    );
    // Failing section is returned unchanged, others still transform
    assert_eq!(result.transformed.defendants, case.defendants);
    assert_eq!(
        result.transformed.judgement.unwrap()["court"],
        json!("HKCFI")
    );
}

#[test]
fn test_hong_kong_resident_requires_status() {
    let registry = registry();
    let validator = Validator::new(&registry);
    let mut case = valid_case();
    case.defendants.as_mut().unwrap()["defendants"][0]["nationality"] = json!({
        "category": "Hong Kong resident",
        "hk_resident_status": null,
        "source": "para 20"
    });

    let result = validator.validate(&case);
    assert_eq!(
        result.section_errors(Section::Defendants),
        ["defendants.0.nationality: Conditional fields validation failed"]
    );

    case.defendants.as_mut().unwrap()["defendants"][0]["nationality"]["hk_resident_status"] =
        json!("Permanent resident");
    let result = validator.validate(&case);
    assert!(result.is_valid(), "{:?}", result.errors);
}

#[test]
fn test_guilty_plea_stage_follows_court_type() {
    let registry = registry();
    let validator = Validator::new(&registry);
    let mut case = valid_case();
    let plea_error = ["trials.0.guilty_plea: Conditional fields validation failed"];

    case.trials.as_mut().unwrap()["trials"][0]["guilty_plea"] = json!({
        "pleaded_guilty": true,
        "court_type": "High Court",
        "high_court_stage": null,
        "source": "para 10"
    });
    assert_eq!(validator.validate(&case).section_errors(Section::Trials), plea_error);

    case.trials.as_mut().unwrap()["trials"][0]["guilty_plea"] = json!({
        "pleaded_guilty": true,
        "court_type": "District Court",
        "high_court_stage": null,
        "district_court_stage": null,
        "source": "para 10"
    });
    assert_eq!(validator.validate(&case).section_errors(Section::Trials), plea_error);

    case.trials.as_mut().unwrap()["trials"][0]["guilty_plea"]["district_court_stage"] =
        json!("Plea day");
    let result = validator.validate(&case);
    assert!(result.is_valid(), "{:?}", result.errors);

    case.trials.as_mut().unwrap()["trials"][0]["guilty_plea"] = json!({
        "pleaded_guilty": true,
        "court_type": null,
        "source": "para 10"
    });
    assert_eq!(validator.validate(&case).section_errors(Section::Trials), plea_error);

    case.trials.as_mut().unwrap()["trials"][0]["guilty_plea"] = json!({
        "pleaded_guilty": false,
        "court_type": null,
        "source": "para 10"
    });
    assert!(validator.validate(&case).is_valid());
}

#[test]
fn test_guilty_plea_reduction_zero_years() {
    let registry = registry();
    let mut case = valid_case();
    let final_sentence = &mut case.trials.as_mut().unwrap()["trials"][0]["final_sentence"];
    final_sentence["guilty_plea_reduction_years"] = json!(0);
    final_sentence["guilty_plea_reduction_months"] = json!(2);

    let result = Validator::new(&registry).validate(&case);
    let trials = result.transformed.trials.unwrap();
    assert_eq!(
        trials["trials"][0]["final_sentence"]["guilty_plea_reduction_total_months"],
        json!(2)
    );
}

#[test]
fn test_guilty_plea_reduction_null() {
    let registry = registry();
    let mut case = valid_case();
    case.trials.as_mut().unwrap()["trials"][0]["final_sentence"]["guilty_plea_reduction_months"] =
        Value::Null;
    let result = Validator::new(&registry).validate(&case);
    let trials = result.transformed.trials.unwrap();
    let final_sentence = &trials["trials"][0]["final_sentence"];
    assert_eq!(final_sentence["guilty_plea_reduction_total_months"], json!(null));
}

#[test]
fn test_errors_in_document_order() {
    let registry = registry();
    let mut case = valid_case();
    let judgement = case.judgement.as_mut().unwrap();
    judgement["neutral_citation"] = json!("2025 HKCFI 100");
    judgement["cases_heard"] = json!([]);
    judgement["charges"][0]["offence_date"]["date"] = json!("2025-02-30");
    judgement["charges"][0]["charge_name"] = json!("Possession");

    let result = Validator::new(&registry).validate(&case);
    let errors = result.section_errors(Section::Judgement);
    assert_eq!(errors.len(), 4, "{:?}", errors);
    assert!(errors[0].starts_with("neutral_citation: Invalid neutral citation format"));
    assert_eq!(errors[1], "cases_heard: Too small: expected array to have >=1 items");
    assert!(errors[2].starts_with("charges.0.charge_name: Invalid option: expected one of"));
    assert_eq!(
        errors[3],
        "charges.0.offence_date.date: Invalid date format (expected YYYY-MM-DD)"
    );
    assert!(result.section_errors(Section::Trials).is_empty());
}

#[test]
fn test_unmapped_sub_district_is_configuration_issue() {
    let mut districts = DistrictMap::default();
    districts.insert("Central", "Central and Western");
    let registry = standard_builder().unwrap().districts(districts).build().unwrap();

    let result = Validator::new(&registry).validate(&valid_case());
    let issues = &result.issues[&Section::Judgement];
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::Configuration);
    assert_eq!(
        issues[0].to_string(),
        "charges.0.place_of_offence: No district mapping for sub-district 'Mong Kok'"
    );
    let judgement = result.transformed.judgement.unwrap();
    assert!(judgement["charges"][0]["place_of_offence"].get("district").is_none());
}

#[test]
fn test_non_ascii_digits_are_format_issues() {
    let registry = registry();
    let validator = Validator::new(&registry);

    let report = validator.validate_value(
        &catalog::time_detail_input(),
        &json!({"time": "٠٧:٠٠:٠٠", "source": ""}),
    );
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::Format);

    let mut case = valid_case();
    let judgement = case.judgement.as_mut().unwrap();
    judgement["neutral_citation"] = json!("[２０２５] HKCFI １٠٠");
    judgement["cases_heard"] = json!(["HCCC ١/٢٠٢٥"]);
    let result = validator.validate(&case);
    let errors = result.section_errors(Section::Judgement);
    assert_eq!(errors.len(), 2, "{:?}", errors);
    assert!(errors[0].starts_with("neutral_citation: Invalid neutral citation format"));
    assert!(errors[1].starts_with("cases_heard.0: Invalid case reference format"));
    assert_eq!(result.transformed.judgement, case.judgement);
}

#[test]
fn test_offence_date_outside_holiday_calendar() {
    let mut case = valid_case();
    case.judgement.as_mut().unwrap()["charges"][0]["offence_date"]["date"] = json!("1998-01-28");

    let result = Validator::new(&registry()).validate(&case);
    let issues = &result.issues[&Section::Judgement];
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::Configuration);
    assert!(issues[0]
        .to_string()
        .starts_with("charges.0.offence_date: No holiday calendar for 1998"));

    // Gazetted dates supplied for the year make it derivable
    let lunar_new_year = NaiveDate::from_ymd_opt(1998, 1, 28).unwrap();
    let registry = standard_builder()
        .unwrap()
        .holidays(HolidayCalendar::new().with_extra_dates([lunar_new_year]))
        .build()
        .unwrap();
    let result = Validator::new(&registry).validate(&case);
    assert!(result.is_valid(), "{:?}", result.errors);
    let judgement = result.transformed.judgement.unwrap();
    assert_eq!(
        judgement["charges"][0]["offence_date"]["is_hk_public_holiday"],
        json!(true)
    );
}

#[test]
fn test_date_range() {
    let registry = registry();
    let mut case = valid_case();
    case.judgement.as_mut().unwrap()["charges"][0]["offence_date"]["date"] =
        json!(["2024-12-30", "2024-12-31"]);
    let result = Validator::new(&registry).validate(&case);
    let judgement = result.transformed.judgement.unwrap();
    let facts = &judgement["charges"][0]["offence_date"];
    assert_eq!(facts["day_of_week"], json!([1, 2]));
    assert_eq!(facts["is_hk_public_holiday"], json!(false));

    case.judgement.as_mut().unwrap()["charges"][0]["offence_date"]["date"] =
        json!(["2024-12-30"]);
    let result = Validator::new(&registry).validate(&case);
    assert_eq!(
        result.section_errors(Section::Judgement),
        ["charges.0.offence_date.date: Invalid length: expected array to have exactly 2 items"]
    );
}
