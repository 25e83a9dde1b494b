//! Computed fields
//!
//! Each [`Derivation`] reads raw inputs from a validated object and writes
//! its outputs into the same object. Inputs are parsed with the same
//! functions that checked their format, so a validated input always
//! derives. Lookups that cannot answer are reported as [`DerivationError`].

use chrono::{Datelike, NaiveDate, Timelike};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::format::{parse_date, parse_time};
use crate::registry::SchemaRegistry;
use crate::schema::Derivation;

/// A derivation whose lookup tables do not cover its input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("No district mapping for sub-district '{0}'")]
    UnmappedSubDistrict(String),

    #[error("No holiday calendar for {0}; add its gazetted dates to [holidays] extra_dates")]
    UncoveredHolidayYear(i32),
}

/// Part of the day an hour falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Morning [06, 12), afternoon [12, 18), evening [18, 23), night otherwise
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=22 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Write a derivation's outputs into `fields`
pub fn apply(
    derivation: Derivation,
    fields: &mut Map<String, Value>,
    registry: &SchemaRegistry,
) -> Result<(), DerivationError> {
    match derivation {
        Derivation::SentenceTotal => {
            let total = months_total(fields.get("sentence_years"), fields.get("sentence_months"));
            fields.insert("total_months".into(), total.map_or(Value::Null, number));
        }
        Derivation::FinalSentenceTotals => {
            let total = months_total(fields.get("sentence_years"), fields.get("sentence_months"));
            fields.insert("total_months".into(), total.map_or(Value::Null, number));

            let years = fields.get("guilty_plea_reduction_years").and_then(Value::as_f64);
            let months = fields.get("guilty_plea_reduction_months").and_then(Value::as_f64);
            let reduction = match (years, months) {
                (None, None) => Value::Null,
                (years, months) => number(years.unwrap_or(0.0) * 12.0 + months.unwrap_or(0.0)),
            };
            fields.insert("guilty_plea_reduction_total_months".into(), reduction);
        }
        Derivation::DateFacts => {
            if let Some((day_of_week, is_holiday)) = date_facts(fields.get("date"), registry)? {
                fields.insert("day_of_week".into(), day_of_week);
                fields.insert("is_hk_public_holiday".into(), Value::Bool(is_holiday));
            }
        }
        Derivation::TimeOfDay => {
            let time = fields.get("time").and_then(Value::as_str).and_then(parse_time);
            if let Some(time) = time {
                let part = TimeOfDay::from_hour(time.hour());
                fields.insert("time_of_day".into(), Value::from(part.as_str()));
            }
        }
        Derivation::District => {
            if let Some(sub_district) = fields.get("subDistrict").and_then(Value::as_str) {
                let district = registry
                    .districts()
                    .district_of(sub_district)
                    .ok_or_else(|| DerivationError::UnmappedSubDistrict(sub_district.to_string()))?;
                fields.insert("district".into(), Value::from(district));
            }
        }
        Derivation::Court => {
            let court = fields
                .get("neutral_citation")
                .and_then(Value::as_str)
                .and_then(|citation| citation.split_whitespace().nth(1))
                .map_or(Value::Null, Value::from);
            fields.insert("court".into(), court);
        }
    }
    Ok(())
}

fn months_total(years: Option<&Value>, months: Option<&Value>) -> Option<f64> {
    Some(years?.as_f64()? * 12.0 + months?.as_f64()?)
}

/// ISO weekday, Monday = 1 through Sunday = 7
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// `day_of_week` (a number, or one per endpoint of a range) and whether any
/// of the dates is a holiday
fn date_facts(
    date: Option<&Value>,
    registry: &SchemaRegistry,
) -> Result<Option<(Value, bool)>, DerivationError> {
    let (dates, is_range) = match date {
        Some(Value::String(single)) => (parse_date(single).map(|d| vec![d]), false),
        Some(Value::Array(range)) => {
            let dates = range
                .iter()
                .map(|d| d.as_str().and_then(parse_date))
                .collect::<Option<Vec<_>>>();
            (dates, true)
        }
        _ => (None, false),
    };
    let Some(dates) = dates else {
        return Ok(None);
    };

    let holidays = registry.holidays();
    if let Some(uncovered) = dates.iter().find(|d| !holidays.covers(d.year())) {
        return Err(DerivationError::UncoveredHolidayYear(uncovered.year()));
    }

    let any_holiday = dates.iter().any(|d| holidays.is_holiday(*d));
    let day_of_week = match dates.as_slice() {
        [single] if !is_range => Value::from(day_of_week(*single)),
        all => all.iter().map(|d| Value::from(day_of_week(*d))).collect(),
    };
    Ok(Some((day_of_week, any_holiday)))
}

/// Integral results as integers, so `27.0` is written as `27`
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
