// 🔁 Accumulator → temporal value
//
// A value is produced at the finest granularity that is fully valid. Anything
// that has to be dropped on the way down is reported as an issue.

use crate::issues::{IssueLedger, IssueType, Term};
use crate::temporal::accumulator::ChronoAccumulator;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TEMPORAL VALUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Year,
    YearMonth,
    Date,
    DateTime,
}

/// A date known at one of four granularities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalValue {
    Year(i32),
    YearMonth(i32, u32),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl TemporalValue {
    pub fn granularity(&self) -> Granularity {
        match self {
            TemporalValue::Year(_) => Granularity::Year,
            TemporalValue::YearMonth(..) => Granularity::YearMonth,
            TemporalValue::Date(_) => Granularity::Date,
            TemporalValue::DateTime(_) => Granularity::DateTime,
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalValue::Year(y) => write_year(f, *y),
            TemporalValue::YearMonth(y, m) => {
                write_year(f, *y)?;
                write!(f, "-{:02}", m)
            }
            TemporalValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TemporalValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Four digits after an optional sign, the same shape chrono gives dates
fn write_year(f: &mut fmt::Formatter<'_>, year: i32) -> fmt::Result {
    if year < 0 {
        write!(f, "-{:04}", year.unsigned_abs())
    } else {
        write!(f, "{:04}", year)
    }
}

impl FromStr for TemporalValue {
    type Err = String;

    /// Reads back exactly what Display writes, negative years included
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Not a temporal value: {}", s);

        // The sign is split off first so the '-' separators stay unambiguous
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let signed = |year: i32| if negative { -year } else { year };

        if let Ok(dt) = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S") {
            return dt.with_year(signed(dt.year())).map(TemporalValue::DateTime).ok_or_else(invalid);
        }
        if let Ok(d) = NaiveDate::parse_from_str(body, "%Y-%m-%d") {
            return d.with_year(signed(d.year())).map(TemporalValue::Date).ok_or_else(invalid);
        }

        let parse_year = |y: &str| -> Result<i32, String> {
            if y.is_empty() || !y.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            y.parse::<i32>().map(signed).map_err(|e| format!("{}: {}", s, e))
        };
        let parts: Vec<&str> = body.split('-').collect();
        match parts.as_slice() {
            [y] => parse_year(y).map(TemporalValue::Year),
            [y, m] => {
                let year = parse_year(y)?;
                let month = m.parse().map_err(|e| format!("{}: {}", s, e))?;
                Ok(TemporalValue::YearMonth(year, month))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for TemporalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TemporalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// CONVERSION CONTEXT
// ============================================================================

/// Which terms get blamed, and what counts as a likely year
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext {
    pub year_term: Term,
    pub month_term: Term,
    pub day_term: Term,
    pub invalid: IssueType,
    pub unlikely: IssueType,
    pub min_year: i32,
    pub max_year: i32,
}

impl ConversionContext {
    /// Atomic year/month/day terms, each blamed separately
    pub fn atomic(min_year: i32, max_year: i32) -> Self {
        ConversionContext {
            year_term: Term::Year,
            month_term: Term::Month,
            day_term: Term::Day,
            invalid: IssueType::RecordedDateInvalid,
            unlikely: IssueType::RecordedDateUnlikely,
            min_year,
            max_year,
        }
    }

    /// Every component came from one free-text term, whose issue types are used
    pub fn text(term: Term, min_year: i32, max_year: i32) -> Self {
        let (invalid, unlikely) = match term {
            Term::DateIdentified => (IssueType::IdentifiedDateInvalid, IssueType::IdentifiedDateUnlikely),
            Term::Modified => (IssueType::ModifiedDateInvalid, IssueType::ModifiedDateUnlikely),
            _ => (IssueType::RecordedDateInvalid, IssueType::RecordedDateUnlikely),
        };
        ConversionContext {
            year_term: term,
            month_term: term,
            day_term: term,
            invalid,
            unlikely,
            min_year,
            max_year,
        }
    }

    fn push_invalid(&self, ledger: &mut IssueLedger, term: Term) {
        ledger.push(self.invalid, &[term]);
    }
}

// ============================================================================
// ATOMIC COMPONENTS
// ============================================================================

pub fn year(acc: &ChronoAccumulator, ctx: &ConversionContext, ledger: &mut IssueLedger) -> Option<i32> {
    let year = acc.year?.value;
    if year < ctx.min_year || year > ctx.max_year {
        ledger.push(ctx.unlikely, &[ctx.year_term]);
    }
    Some(year)
}

pub fn month(acc: &ChronoAccumulator, ctx: &ConversionContext, ledger: &mut IssueLedger) -> Option<u32> {
    let month = acc.month?.value;
    if (1..=12).contains(&month) {
        Some(month)
    } else {
        ctx.push_invalid(ledger, ctx.month_term);
        None
    }
}

/// Day of month; checked against year and month when both are valid
pub fn day(acc: &ChronoAccumulator, ctx: &ConversionContext, ledger: &mut IssueLedger) -> Option<u32> {
    let day = acc.day?.value;
    let month = acc.month.map(|c| c.value).filter(|m| (1..=12).contains(m));

    let valid = match (acc.year, month) {
        (Some(year), Some(month)) => NaiveDate::from_ymd_opt(year.value, month, day).is_some(),
        // February 29th exists in leap years
        (None, Some(month)) => NaiveDate::from_ymd_opt(2000, month, day).is_some(),
        _ => (1..=31).contains(&day),
    };

    if valid {
        Some(day)
    } else {
        ctx.push_invalid(ledger, ctx.day_term);
        None
    }
}

// ============================================================================
// TEMPORAL VALUE
// ============================================================================

/// Convert at the accumulator's own natural granularity
pub fn to_temporal(
    acc: &ChronoAccumulator,
    ctx: &ConversionContext,
    ledger: &mut IssueLedger,
) -> Option<TemporalValue> {
    if acc.rejected {
        ctx.push_invalid(ledger, ctx.year_term);
    }
    if acc.is_empty() {
        return None;
    }

    let Some(year) = acc.year.map(|c| c.value) else {
        tracing::debug!("date components without a year");
        ctx.push_invalid(ledger, ctx.year_term);
        return None;
    };
    if year < ctx.min_year || year > ctx.max_year {
        ledger.push(ctx.unlikely, &[ctx.year_term]);
    }

    let Some(month) = acc.month else {
        if acc.day.is_some() {
            ctx.push_invalid(ledger, ctx.day_term);
        }
        return Some(TemporalValue::Year(year));
    };
    if !(1..=12).contains(&month.value) {
        ctx.push_invalid(ledger, ctx.month_term);
        return Some(TemporalValue::Year(year));
    }

    let Some(day) = acc.day else {
        return Some(TemporalValue::YearMonth(year, month.value));
    };
    if month.ambiguous && day.ambiguous && month.value != day.value {
        tracing::debug!(day = day.value, month = month.value, "ambiguous day and month");
        ctx.push_invalid(ledger, ctx.month_term);
        return Some(TemporalValue::Year(year));
    }

    let Some(date) = NaiveDate::from_ymd_opt(year, month.value, day.value) else {
        ctx.push_invalid(ledger, ctx.day_term);
        return Some(TemporalValue::YearMonth(year, month.value));
    };

    match acc.time {
        Some(time) => Some(TemporalValue::DateTime(date.and_time(time.value))),
        None => Some(TemporalValue::Date(date)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
