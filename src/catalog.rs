//! Built-in record definitions
//!
//! Trial facts, judgement facts and defendant profile facts as declarative
//! [`SchemaNode`] trees. Enum option order is part of the public contract:
//! the first option is what a new field defaults to.

use serde_json::Value;

use crate::districts::{self, DistrictMap};
use crate::error::Result;
use crate::holidays::HolidayCalendar;
use crate::record::Section;
use crate::registry::{RegistryBuilder, SchemaRegistry};
use crate::schema::{ConditionalRule, Derivation, LengthRule, SchemaNode, StringFormat};

/// Version of the built-in record definitions
pub const CATALOG_VERSION: &str = "1.0.0";

pub const DRUG_TYPES: &[&str] = &[
    "Cannabis",
    "THC/CBD",
    "Cathinones",
    "Cocaine",
    "Cough medicine",
    "Ecstasy",
    "GHB/GBL",
    "Heroin",
    "Ketamine",
    "Nimetazepam",
    "Morphine",
    "Methamphetamine",
    "Salvia",
    "TFMPP",
    "Etomidate",
    "Other",
];

pub const DEFENDANT_ROLES: &[&str] = &[
    "Courier",
    "Storekeeper",
    "Lookout/scout",
    "Actual trafficker",
    "Manager/organizer",
    "Operator/financial controller",
    "International operator/financial controller",
    "Other",
];

pub const AGGRAVATING_FACTORS: &[&str] = &[
    "Refugee/Asylum",
    "Illegal immigrant",
    "On bail",
    "Suspended sentence",
    "CSD supervision",
    "Wanted",
    "Persistent offender",
    "Import",
    "Export",
    "Use of minors",
    "Multiple drugs",
    "Role of the defendant",
    "Other",
];

pub const MITIGATING_FACTORS: &[&str] = &[
    "Voluntary surrender",
    "Self-consumption",
    "Assistance - limited",
    "Assistance - useful",
    "Assistance - testify",
    "Assistance - risk",
    "Extreme youth",
    "Young offender",
    "Medical conditions",
    "Family illness",
    "Prosecutorial delay",
    "Mistaken belief",
    "Rehabilitation programme",
    "Other",
];

pub const COURT_TYPES: &[&str] = &["High Court", "District Court"];

pub const HIGH_COURT_PLEA_STAGES: &[&str] = &[
    "Unknown",
    "Up to committal",
    "After committal",
    "After dates fixed",
    "First day",
    "During trial",
];

pub const DISTRICT_COURT_PLEA_STAGES: &[&str] = &[
    "Unknown",
    "Plea day",
    "After dates fixed",
    "First day",
    "During trial",
];

pub const CHARGE_TYPES: &[&str] = &["Actual Trafficking", "Conspiracy to Traffic"];

pub const CHARGE_NAMES: &[&str] = &[
    "Trafficking in a dangerous drug",
    "Trafficking in dangerous drugs",
    "Conspiracy to traffic in a dangerous drug",
    "Conspiracy to traffic in dangerous drugs",
];

pub const PLACE_NATURES: &[&str] = &[
    "Residential building",
    "Commercial building",
    "Industrial building",
    "Government or public building",
    "Entertainment venue",
    "Street",
    "Car park or parking lot",
    "Shopping mall",
    "Public transport",
    "Private vehicle",
    "Restaurant",
    "Educational institution",
    "Hospital or medical facility",
    "Outside methadone clinic",
    "Recreational area",
    "Hotel or guesthouse",
    "Construction site",
    "Vacant or abandoned property",
    "Border checkpoint",
    "Other",
];

pub const TRAFFICKING_MODES: &[&str] = &[
    "Street-level dealing",
    "Social supply",
    "Courier delivery",
    "Parcel delivery",
    "Drug houses",
    "Vehicle-based dealing",
    "Vehicle concealment",
    "Mule trafficking",
    "Drug repackaging or storage",
    "Maritime transport",
    "Festival or event dealing",
    "Online trafficking",
    "Other",
];

pub const OFFENCE_REASONS: &[&str] = &[
    "Financial gain",
    "Economic hardship",
    "Coercion",
    "Deception",
    "Addiction-driven",
    "Peer influence",
    "Helping other people",
    "Other",
];

pub const CROSS_BORDER_TYPES: &[&str] = &["import", "export"];

pub const NATIONALITY_CATEGORIES: &[&str] = &[
    "Hong Kong resident",
    "Mainland Chinese",
    "Foreign nationality",
];

pub const HK_RESIDENT_STATUSES: &[&str] = &["Permanent resident", "New arrival", "N/A"];

pub const GENDERS: &[&str] = &["Male", "Female"];

pub const MARITAL_STATUSES: &[&str] = &[
    "Single",
    "Married",
    "Separated/divorced",
    "Widowed",
    "Cohabiting",
];

pub const PARENTAL_STATUSES: &[&str] = &["No children", "Parent", "Expecting parent"];

pub const CUSTODY_STATUSES: &[&str] = &["Parent with custody", "Parent without custody"];

pub const HOUSEHOLD_COMPOSITIONS: &[&str] = &[
    "Lives alone",
    "Lives with family",
    "Lives with non-family",
    "Homeless",
];

pub const EDUCATION_LEVELS: &[&str] = &[
    "Uneducated",
    "Primary",
    "Secondary - Lower",
    "Secondary - Upper",
    "Tertiary",
];

pub const OCCUPATION_CATEGORIES: &[&str] = &[
    "Unemployed",
    "Manager",
    "Professional",
    "Associate professional",
    "Clerical support worker",
    "Service and sales worker",
    "Craft and related worker",
    "Plant and machine operator and assembler",
    "Elementary occupation",
    "Skilled agricultural and fishery worker",
    "Student",
    "Other",
];

pub const CRIMINAL_RECORDS: &[&str] = &[
    "None",
    "Drug trafficking",
    "Dangerous drug offences",
    "Other offences",
];

pub const POSITIVE_HABITS: &[&str] = &[
    "Volunteering",
    "Studying",
    "Working",
    "Negative drug tests",
    "Participation in rehabilitation/self-improvement",
];

pub const FAMILY_SUPPORTS: &[&str] = &[
    "None",
    "Family presence in court",
    "Letters of support from family",
    "Other",
];

pub const HEALTH_CONDITION_TYPES: &[&str] = &["Drug addiction", "Mental health", "Physical health"];

/// Fields that are always derived and never edited directly
pub const COMPUTED_FIELDS: &[&str] = &[
    "total_months",
    "guilty_plea_reduction_total_months",
    "day_of_week",
    "is_hk_public_holiday",
    "time_of_day",
    "district",
    "court",
    "tracing_id",
];

/// Field names whose values are arrays of the object registered under the same name
pub const ARRAY_FIELDS: &[&str] = &[
    "drugs",
    "roles",
    "aggravating_factors",
    "mitigating_factors",
    "charges",
    "defendants",
    "criminal_records",
    "positive_habits_after_arrest",
    "family_supports",
    "reasons_for_offence",
    "representatives",
    "health_conditions",
];

const CONDITIONAL_FIELDS_FAILED: &str = "Conditional fields validation failed";

fn source() -> (&'static str, SchemaNode) {
    ("source", SchemaNode::string())
}

fn other_rule(field: &str, tag_field: &str) -> ConditionalRule {
    ConditionalRule::new(format!("{field} is required when {tag_field} is 'Other'"))
        .require(field, tag_field, "Other")
}

// =============================================================================
// Trials
// =============================================================================

pub fn drug_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("drug_type", SchemaNode::enumeration(DRUG_TYPES)),
        ("other_drug_type", SchemaNode::string().or_null()),
        ("quantity", SchemaNode::number()),
        source(),
    ])
    .with_rule(other_rule("other_drug_type", "drug_type"))
}

pub fn role_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("role", SchemaNode::enumeration(DEFENDANT_ROLES)),
        source(),
    ])
}

pub fn aggravating_factor_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("factor", SchemaNode::enumeration(AGGRAVATING_FACTORS)),
        ("other_factor", SchemaNode::string().or_null()),
        ("enhancement", SchemaNode::number().or_null()),
        source(),
    ])
    .with_rule(other_rule("other_factor", "factor"))
}

pub fn mitigating_factor_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("factor", SchemaNode::enumeration(MITIGATING_FACTORS)),
        ("other_factor", SchemaNode::string().or_null()),
        ("reduction", SchemaNode::number().or_null()),
        source(),
    ])
    .with_rule(other_rule("other_factor", "factor"))
}

pub fn guilty_plea_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("pleaded_guilty", SchemaNode::boolean()),
        ("court_type", SchemaNode::enumeration(COURT_TYPES).or_null()),
        ("high_court_stage", SchemaNode::enumeration(HIGH_COURT_PLEA_STAGES).or_null()),
        ("district_court_stage", SchemaNode::enumeration(DISTRICT_COURT_PLEA_STAGES).or_null()),
        source(),
    ])
    .with_rule(
        ConditionalRule::new(CONDITIONAL_FIELDS_FAILED)
            .require("court_type", "pleaded_guilty", true)
            .require("high_court_stage", "court_type", "High Court")
            .require("district_court_stage", "court_type", "District Court"),
    )
}

/// Years and months of a sentence, before `total_months` is derived
pub fn sentence_input() -> SchemaNode {
    SchemaNode::object(vec![
        ("sentence_years", SchemaNode::number()),
        ("sentence_months", SchemaNode::number()),
        source(),
    ])
}

pub fn sentence_detail() -> SchemaNode {
    sentence_input().derived(Derivation::SentenceTotal)
}

pub fn mitigation_reduction_detail() -> SchemaNode {
    SchemaNode::object(vec![("reduction_months", SchemaNode::number()), source()])
}

pub fn final_sentence_input() -> SchemaNode {
    SchemaNode::object(vec![
        ("sentence_years", SchemaNode::number()),
        ("sentence_months", SchemaNode::number()),
        ("guilty_plea_reduction_years", SchemaNode::number().or_null()),
        ("guilty_plea_reduction_months", SchemaNode::number().or_null()),
        source(),
    ])
}

pub fn final_sentence_detail() -> SchemaNode {
    final_sentence_input().derived(Derivation::FinalSentenceTotals)
}

pub fn charge_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("charge_no", SchemaNode::number()),
        ("type", SchemaNode::enumeration(CHARGE_TYPES)),
        ("defendant_name", SchemaNode::string()),
        ("defendant_id", SchemaNode::number()),
        source(),
    ])
}

pub fn trial() -> SchemaNode {
    SchemaNode::object(vec![
        ("charge_type", charge_detail()),
        ("drugs", SchemaNode::array(drug_detail())),
        ("roles", SchemaNode::array(role_detail())),
        ("aggravating_factors", SchemaNode::array(aggravating_factor_detail()).or_null()),
        ("mitigating_factors", SchemaNode::array(mitigating_factor_detail()).or_null()),
        ("guilty_plea", guilty_plea_detail()),
        ("starting_point", sentence_detail()),
        ("sentence_after_role", sentence_detail().or_null()),
        ("notional_sentence", sentence_detail()),
        ("mitigation_reduction", mitigation_reduction_detail().or_null()),
        ("final_sentence", final_sentence_detail()),
    ])
}

pub fn trials_section() -> SchemaNode {
    SchemaNode::object(vec![("trials", SchemaNode::array(trial()))])
}

// =============================================================================
// Judgement
// =============================================================================

/// A single date or a two-element date range
pub fn date_value() -> SchemaNode {
    SchemaNode::union(vec![
        SchemaNode::formatted(StringFormat::IsoDate),
        SchemaNode::array(SchemaNode::formatted(StringFormat::IsoDate))
            .with_length(LengthRule::Exactly(2)),
    ])
}

pub fn date_detail_input() -> SchemaNode {
    SchemaNode::object(vec![("date", date_value()), source()])
}

pub fn time_detail_input() -> SchemaNode {
    SchemaNode::object(vec![
        ("time", SchemaNode::formatted(StringFormat::TimeWithOffset)),
        source(),
    ])
}

pub fn place_of_offence_input() -> SchemaNode {
    SchemaNode::object(vec![
        ("address", SchemaNode::string()),
        ("nature", SchemaNode::enumeration(PLACE_NATURES)),
        ("subDistrict", SchemaNode::enumeration(&districts::sub_districts())),
        source(),
    ])
}

pub fn trafficking_mode() -> SchemaNode {
    SchemaNode::object(vec![
        ("mode", SchemaNode::enumeration(TRAFFICKING_MODES)),
        source(),
    ])
}

pub fn reason_for_offence_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("reason", SchemaNode::enumeration(OFFENCE_REASONS)),
        source(),
    ])
}

pub fn benefits_received_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("received", SchemaNode::boolean()),
        ("amount", SchemaNode::number().or_null()),
        source(),
    ])
}

pub fn cross_border_detail() -> SchemaNode {
    SchemaNode::object(vec![
        ("cross_border", SchemaNode::boolean()),
        ("type", SchemaNode::enumeration(CROSS_BORDER_TYPES).or_null()),
        source(),
    ])
}

pub fn charge_for_defendant() -> SchemaNode {
    SchemaNode::object(vec![
        ("defendant_name", SchemaNode::string()),
        ("defendant_id", SchemaNode::number().or_null()),
        ("trafficking_mode", trafficking_mode().or_null()),
        ("reasons_for_offence", SchemaNode::array(reason_for_offence_detail()).or_null()),
        ("benefits_received", benefits_received_detail().or_null()),
    ])
}

pub fn charge() -> SchemaNode {
    SchemaNode::object(vec![
        ("charge_no", SchemaNode::number().or_null()),
        ("charge_name", SchemaNode::enumeration(CHARGE_NAMES)),
        ("offence_date", date_detail_input().derived(Derivation::DateFacts).or_null()),
        ("offence_time", time_detail_input().derived(Derivation::TimeOfDay).or_null()),
        ("place_of_offence", place_of_offence_input().derived(Derivation::District).or_null()),
        ("cross_border", cross_border_detail()),
        ("defendants_of_charge", SchemaNode::array(charge_for_defendant())),
    ])
}

pub fn representative() -> SchemaNode {
    SchemaNode::object(vec![
        ("name", SchemaNode::string()),
        ("role", SchemaNode::string()),
    ])
}

pub fn judgement_input() -> SchemaNode {
    SchemaNode::object(vec![
        ("neutral_citation", SchemaNode::formatted(StringFormat::NeutralCitation)),
        ("judge_name", SchemaNode::string()),
        ("judgment_date_time", SchemaNode::formatted(StringFormat::IsoDateTime)),
        ("representatives", SchemaNode::array(representative())),
        (
            "cases_heard",
            SchemaNode::array(SchemaNode::formatted(StringFormat::CaseReference))
                .with_length(LengthRule::AtLeast(1)),
        ),
        ("charges", SchemaNode::array(charge())),
    ])
}

pub fn judgement_section() -> SchemaNode {
    judgement_input().derived(Derivation::Court)
}

// =============================================================================
// Defendants
// =============================================================================

pub fn nationality() -> SchemaNode {
    SchemaNode::object(vec![
        ("category", SchemaNode::enumeration(NATIONALITY_CATEGORIES)),
        ("hk_resident_status", SchemaNode::enumeration(HK_RESIDENT_STATUSES).or_null()),
        ("foreign_country_code", SchemaNode::formatted(StringFormat::CountryCode).or_null()),
        ("infer_reason", SchemaNode::string().or_null()),
        source(),
    ])
    .with_rule(
        ConditionalRule::new(CONDITIONAL_FIELDS_FAILED)
            .require("hk_resident_status", "category", "Hong Kong resident")
            .require("foreign_country_code", "category", "Foreign nationality"),
    )
}

/// An exact age or a two-element age range
pub fn age_value() -> SchemaNode {
    SchemaNode::union(vec![
        SchemaNode::number(),
        SchemaNode::array(SchemaNode::number()).with_length(LengthRule::Exactly(2)),
    ])
}

pub fn age_detail() -> SchemaNode {
    SchemaNode::object(vec![("age", age_value()), source()])
}

fn tagged(field: &'static str, options: &[&str]) -> SchemaNode {
    SchemaNode::object(vec![(field, SchemaNode::enumeration(options)), source()])
}

pub fn parental_status() -> SchemaNode {
    SchemaNode::object(vec![
        ("status", SchemaNode::enumeration(PARENTAL_STATUSES)),
        ("custody", SchemaNode::enumeration(CUSTODY_STATUSES).or_null()),
        source(),
    ])
}

pub fn health_condition() -> SchemaNode {
    SchemaNode::object(vec![
        ("name", SchemaNode::string()),
        ("type", SchemaNode::enumeration(HEALTH_CONDITION_TYPES)),
        source(),
    ])
}

pub fn occupation() -> SchemaNode {
    SchemaNode::object(vec![
        ("occupation_category", SchemaNode::enumeration(OCCUPATION_CATEGORIES)),
        ("occupation_name", SchemaNode::string().or_null()),
        source(),
    ])
}

pub fn defendant_name_detail() -> SchemaNode {
    SchemaNode::object(vec![("name", SchemaNode::string()), source()])
}

pub fn drug_treatment_detail() -> SchemaNode {
    SchemaNode::object(vec![("participated", SchemaNode::boolean()), source()])
}

pub fn monthly_wage_detail() -> SchemaNode {
    SchemaNode::object(vec![("wage", SchemaNode::number()), source()])
}

pub fn defendant_profile() -> SchemaNode {
    SchemaNode::object(vec![
        ("defendant_id", SchemaNode::number()),
        ("defendant_name", defendant_name_detail()),
        ("nationality", nationality().or_null()),
        ("age_at_offence", age_detail().or_null()),
        ("age_at_sentencing", age_detail().or_null()),
        ("gender", tagged("gender", GENDERS).or_null()),
        ("marital_status", tagged("status", MARITAL_STATUSES).or_null()),
        ("parental_status", parental_status().or_null()),
        ("household_composition", tagged("composition", HOUSEHOLD_COMPOSITIONS).or_null()),
        ("health_conditions", SchemaNode::array(health_condition()).or_null()),
        ("drug_treatment_participation", drug_treatment_detail().or_null()),
        ("education_level", tagged("level", EDUCATION_LEVELS).or_null()),
        ("occupation", occupation().or_null()),
        ("monthly_wage", monthly_wage_detail().or_null()),
        ("criminal_records", SchemaNode::array(tagged("record", CRIMINAL_RECORDS)).or_null()),
        (
            "positive_habits_after_arrest",
            SchemaNode::array(tagged("habit", POSITIVE_HABITS)).or_null(),
        ),
        ("family_supports", SchemaNode::array(tagged("support", FAMILY_SUPPORTS)).or_null()),
    ])
}

pub fn defendants_section() -> SchemaNode {
    SchemaNode::object(vec![(
        "defendants",
        SchemaNode::array(defendant_profile()).with_length(LengthRule::AtLeast(1)),
    )])
}

// =============================================================================
// Registry assembly
// =============================================================================

/// Builder preloaded with every built-in definition
pub fn standard_builder() -> Result<RegistryBuilder> {
    let mut builder = RegistryBuilder::new(CATALOG_VERSION)?
        .section(Section::Judgement, judgement_section())
        .section(Section::Defendants, defendants_section())
        .section(Section::Trials, trials_section())
        .districts(DistrictMap::hong_kong())
        .holidays(HolidayCalendar::new());

    let fields: Vec<(&str, SchemaNode)> = vec![
        // Trials
        ("trials", trial()),
        ("drugs", drug_detail()),
        ("roles", role_detail()),
        ("aggravating_factors", aggravating_factor_detail()),
        ("mitigating_factors", mitigating_factor_detail()),
        ("guilty_plea", guilty_plea_detail()),
        ("starting_point", sentence_input()),
        ("sentence_after_role", sentence_input()),
        ("notional_sentence", sentence_input()),
        ("mitigation_reduction", mitigation_reduction_detail()),
        ("final_sentence", final_sentence_input()),
        ("charge_type", charge_detail()),
        // Judgement
        ("judgement", judgement_section()),
        ("date", date_detail_input()),
        ("offence_date", date_detail_input()),
        ("time", time_detail_input()),
        ("offence_time", time_detail_input()),
        ("place_of_offence", place_of_offence_input()),
        ("trafficking_mode", trafficking_mode()),
        ("reasons_for_offence", reason_for_offence_detail()),
        ("benefits_received", benefits_received_detail()),
        ("cross_border", cross_border_detail()),
        ("charges", charge()),
        ("representatives", representative()),
        ("defendants_of_charge", charge_for_defendant()),
        ("cases_heard", SchemaNode::formatted(StringFormat::CaseReference)),
        // Defendants
        ("defendants", defendant_profile()),
        ("defendant_name", defendant_name_detail()),
        ("nationality", nationality()),
        ("age_at_offence", age_detail()),
        ("age_at_sentencing", age_detail()),
        ("gender", tagged("gender", GENDERS)),
        ("marital_status", tagged("status", MARITAL_STATUSES)),
        ("parental_status", parental_status()),
        ("household_composition", tagged("composition", HOUSEHOLD_COMPOSITIONS)),
        ("health_conditions", health_condition()),
        ("drug_treatment_participation", drug_treatment_detail()),
        ("education_level", tagged("level", EDUCATION_LEVELS)),
        ("occupation", occupation()),
        ("monthly_wage", monthly_wage_detail()),
        ("criminal_records", tagged("record", CRIMINAL_RECORDS)),
        ("positive_habits_after_arrest", tagged("habit", POSITIVE_HABITS)),
        ("family_supports", tagged("support", FAMILY_SUPPORTS)),
        // Same name, different meaning under a specific parent
        ("offence_date_date", date_value()),
        ("date_date", date_value()),
        ("offence_time_time", SchemaNode::formatted(StringFormat::TimeWithOffset)),
        ("time_time", SchemaNode::formatted(StringFormat::TimeWithOffset)),
        ("charge_type_defendant_name", SchemaNode::string()),
        ("defendants_of_charge_defendant_name", SchemaNode::string()),
        ("gender_gender", SchemaNode::enumeration(GENDERS)),
        ("cross_border_cross_border", SchemaNode::boolean()),
    ];
    for (key, node) in fields {
        builder = builder.field(key, node);
    }

    for name in ARRAY_FIELDS {
        builder = builder.array_field(name);
    }
    for name in COMPUTED_FIELDS {
        builder = builder.computed(name);
    }

    Ok(builder)
}

/// The standard registry
pub fn standard_registry() -> Result<SchemaRegistry> {
    standard_builder()?.build()
}

/// Empty JSON object, the fallback for unresolvable fields
pub(crate) fn opaque_object() -> Value {
    Value::Object(serde_json::Map::new())
}
