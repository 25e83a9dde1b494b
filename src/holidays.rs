//! Hong Kong general holiday calendar
//!
//! Fixed-date and Easter holidays are computed for any year. Holidays that
//! follow the lunar calendar come from the gazetted table below (2000 to
//! 2030); dates for years outside it can be supplied through configuration.
//! A year is only [`covered`](HolidayCalendar::covers) when one of the two
//! provides its lunar holidays.
//!
//! When a holiday falls on a Sunday, the next day that is neither a Sunday
//! nor already a holiday is also a holiday.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Lunar-calendar holidays per year as (month, day):
/// Lunar New Year (first day), Ching Ming, Buddha's Birthday, Tuen Ng,
/// the day following Mid-Autumn, Chung Yeung.
const LUNAR_HOLIDAYS: &[(i32, [(u32, u32); 6])] = &[
    (2000, [(2, 5), (4, 4), (5, 11), (6, 6), (9, 13), (10, 6)]),
    (2001, [(1, 24), (4, 5), (4, 30), (6, 25), (10, 2), (10, 25)]),
    (2002, [(2, 12), (4, 5), (5, 19), (6, 15), (9, 22), (10, 14)]),
    (2003, [(2, 1), (4, 5), (5, 8), (6, 4), (9, 12), (10, 4)]),
    (2004, [(1, 22), (4, 4), (5, 26), (6, 22), (9, 29), (10, 22)]),
    (2005, [(2, 9), (4, 5), (5, 15), (6, 11), (9, 19), (10, 11)]),
    (2006, [(1, 29), (4, 5), (5, 5), (5, 31), (10, 7), (10, 30)]),
    (2007, [(2, 18), (4, 5), (5, 24), (6, 19), (9, 26), (10, 19)]),
    (2008, [(2, 7), (4, 4), (5, 12), (6, 8), (9, 15), (10, 7)]),
    (2009, [(1, 26), (4, 4), (5, 2), (5, 28), (10, 4), (10, 26)]),
    (2010, [(2, 14), (4, 5), (5, 21), (6, 16), (9, 23), (10, 16)]),
    (2011, [(2, 3), (4, 5), (5, 10), (6, 6), (9, 13), (10, 5)]),
    (2012, [(1, 23), (4, 4), (4, 28), (6, 23), (10, 1), (10, 23)]),
    (2013, [(2, 10), (4, 4), (5, 17), (6, 12), (9, 20), (10, 13)]),
    (2014, [(1, 31), (4, 5), (5, 6), (6, 2), (9, 9), (10, 2)]),
    (2015, [(2, 19), (4, 5), (5, 25), (6, 20), (9, 28), (10, 21)]),
    (2016, [(2, 8), (4, 4), (5, 14), (6, 9), (9, 16), (10, 9)]),
    (2017, [(1, 28), (4, 4), (5, 3), (5, 30), (10, 5), (10, 28)]),
    (2018, [(2, 16), (4, 5), (5, 22), (6, 18), (9, 25), (10, 17)]),
    (2019, [(2, 5), (4, 5), (5, 12), (6, 7), (9, 14), (10, 7)]),
    (2020, [(1, 25), (4, 4), (4, 30), (6, 25), (10, 2), (10, 25)]),
    (2021, [(2, 12), (4, 4), (5, 19), (6, 14), (9, 22), (10, 14)]),
    (2022, [(2, 1), (4, 5), (5, 8), (6, 3), (9, 11), (10, 4)]),
    (2023, [(1, 22), (4, 5), (5, 26), (6, 22), (9, 30), (10, 23)]),
    (2024, [(2, 10), (4, 4), (5, 15), (6, 10), (9, 18), (10, 11)]),
    (2025, [(1, 29), (4, 4), (5, 5), (5, 31), (10, 7), (10, 29)]),
    (2026, [(2, 17), (4, 5), (5, 24), (6, 19), (9, 26), (10, 18)]),
    (2027, [(2, 6), (4, 5), (5, 13), (6, 9), (9, 16), (10, 8)]),
    (2028, [(1, 26), (4, 4), (5, 2), (5, 28), (10, 4), (10, 26)]),
    (2029, [(2, 13), (4, 4), (5, 20), (6, 16), (9, 23), (10, 16)]),
    (2030, [(2, 3), (4, 5), (5, 9), (6, 5), (9, 13), (10, 5)]),
];

/// Until 2011 a Lunar New Year's Day on Sunday gave the day before it
/// instead of the fourth day
const LUNAR_NEW_YEAR_EVE_RULE_UNTIL: i32 = 2011;

const FIXED_HOLIDAYS: &[(u32, u32)] = &[(1, 1), (5, 1), (7, 1), (10, 1), (12, 25), (12, 26)];

/// Easter Sunday by the anonymous Gregorian algorithm
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Calendar of Hong Kong general holidays
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    extra: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add gazetted dates beyond the built-in rules
    pub fn with_extra_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.extra.extend(dates);
        self
    }

    /// Whether the lunar table covers a year
    pub fn covers_lunar_year(year: i32) -> bool {
        LUNAR_HOLIDAYS.iter().any(|(y, _)| *y == year)
    }

    /// Whether holidays for a year are known, from the table or configured dates
    pub fn covers(&self, year: i32) -> bool {
        Self::covers_lunar_year(year) || self.extra.iter().any(|d| d.year() == year)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays_in(date.year()).contains(&date)
    }

    /// Every holiday observed in a year, substitutes included
    pub fn holidays_in(&self, year: i32) -> BTreeSet<NaiveDate> {
        let mut base = BTreeSet::new();

        for &(month, day) in FIXED_HOLIDAYS {
            base.extend(NaiveDate::from_ymd_opt(year, month, day));
        }

        if let Some(easter) = easter_sunday(year) {
            base.insert(easter - Duration::days(2));
            base.insert(easter - Duration::days(1));
            base.insert(easter + Duration::days(1));
        }

        // A Sunday that is not carried forward to a substitute
        let mut eve_rule_sunday = None;

        match LUNAR_HOLIDAYS.iter().find(|(y, _)| *y == year) {
            Some((_, dates)) => {
                let [new_year, rest @ ..] = dates;
                if let Some(first) = NaiveDate::from_ymd_opt(year, new_year.0, new_year.1) {
                    base.extend((0..3).map(|offset| first + Duration::days(offset)));
                    if year <= LUNAR_NEW_YEAR_EVE_RULE_UNTIL && first.weekday() == Weekday::Sun {
                        base.insert(first - Duration::days(1));
                        eve_rule_sunday = Some(first);
                    }
                }
                for &(month, day) in rest {
                    base.extend(NaiveDate::from_ymd_opt(year, month, day));
                }
            }
            None => tracing::debug!(year, "no lunar holiday table for year"),
        }

        base.extend(self.extra.iter().filter(|d| d.year() == year).copied());

        let mut observed = base.clone();
        for date in base
            .iter()
            .filter(|d| d.weekday() == Weekday::Sun && Some(**d) != eve_rule_sunday)
        {
            let mut substitute = *date + Duration::days(1);
            while substitute.weekday() == Weekday::Sun || observed.contains(&substitute) {
                substitute += Duration::days(1);
            }
            observed.insert(substitute);
        }
        observed
    }
}
