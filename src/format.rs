//! String format checks
//!
//! Each [`StringFormat`] is a regex plus, for dates and times, a parse to
//! confirm the value names a real calendar date or clock time. Failure
//! messages carry the guidance shown next to the field.

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;

use crate::schema::StringFormat;

// ASCII digits only; `\d` in `regex` also matches other scripts' digits
const NEUTRAL_CITATION: &str = r"^\[[0-9]{4}\]\s+[A-Z]+\s+[0-9]+$";
const ISO_DATE: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";
const ISO_DATE_TIME: &str =
    r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}([+-][0-9]{2}:[0-9]{2}|Z)$";
const TIME_WITH_OFFSET: &str = r"^[0-9]{2}:[0-9]{2}:[0-9]{2}([+-][0-9]{2}:[0-9]{2}|Z)?$";
const CASE_REFERENCE: &str = r"^[A-Z]+\s+[0-9]+/[0-9]{4}$";

/// Compiled patterns for every string format
#[derive(Debug, Clone)]
pub struct FormatPatterns {
    neutral_citation: Regex,
    iso_date: Regex,
    iso_date_time: Regex,
    time_with_offset: Regex,
    case_reference: Regex,
}

impl FormatPatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            neutral_citation: Regex::new(NEUTRAL_CITATION)?,
            iso_date: Regex::new(ISO_DATE)?,
            iso_date_time: Regex::new(ISO_DATE_TIME)?,
            time_with_offset: Regex::new(TIME_WITH_OFFSET)?,
            case_reference: Regex::new(CASE_REFERENCE)?,
        })
    }

    /// Source regex of a format, if it has one
    pub fn pattern(format: StringFormat) -> Option<&'static str> {
        match format {
            StringFormat::NeutralCitation => Some(NEUTRAL_CITATION),
            StringFormat::IsoDate => Some(ISO_DATE),
            StringFormat::IsoDateTime => Some(ISO_DATE_TIME),
            StringFormat::TimeWithOffset => Some(TIME_WITH_OFFSET),
            StringFormat::CaseReference => Some(CASE_REFERENCE),
            StringFormat::CountryCode => None,
        }
    }

    /// Guidance text reported when a value does not match
    pub fn message(format: StringFormat) -> &'static str {
        match format {
            StringFormat::NeutralCitation => "Invalid neutral citation format (e.g., [2025] HKCFI 100)",
            StringFormat::IsoDate => "Invalid date format (expected YYYY-MM-DD)",
            StringFormat::IsoDateTime => {
                "Invalid ISO 8601 datetime format (e.g., 2025-08-06T00:00:00+08:00)"
            }
            StringFormat::TimeWithOffset => {
                "Invalid time format (expected HH:MM:SS or HH:MM:SS+HH:MM)"
            }
            StringFormat::CaseReference => "Invalid case reference format (e.g., HCCC 123/2024)",
            StringFormat::CountryCode => "Invalid country code (expected exactly 2 characters)",
        }
    }

    pub fn matches(&self, format: StringFormat, value: &str) -> bool {
        match format {
            StringFormat::NeutralCitation => self.neutral_citation.is_match(value),
            StringFormat::IsoDate => {
                self.iso_date.is_match(value) && parse_date(value).is_some()
            }
            StringFormat::IsoDateTime => {
                self.iso_date_time.is_match(value) && DateTime::parse_from_rfc3339(value).is_ok()
            }
            StringFormat::TimeWithOffset => {
                self.time_with_offset.is_match(value) && parse_time(value).is_some()
            }
            StringFormat::CaseReference => self.case_reference.is_match(value),
            StringFormat::CountryCode => value.chars().count() == 2,
        }
    }

    /// Check a value, returning the guidance message on failure
    pub fn check(&self, format: StringFormat, value: &str) -> Result<(), &'static str> {
        if self.matches(format, value) {
            Ok(())
        } else {
            Err(Self::message(format))
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Clock time of an `HH:MM:SS` value, ignoring any offset
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let clock = value.get(..8)?;
    NaiveTime::parse_from_str(clock, "%H:%M:%S").ok()
}
