// 🔤 Raw date/time parser
// Turns one endpoint of an event date (or the atomic year/month/day terms)
// into a ChronoAccumulator. Never fails: text it cannot read sets `rejected`.

use crate::issues::Term;
use crate::temporal::accumulator::{ChronoAccumulator, ChronoField, Component};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Order used to resolve numeric day/month tokens that could be either
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    Dmy,
    Mdy,
}

impl DateOrder {
    pub fn from_name(name: &str) -> Option<DateOrder> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dmy" => Some(DateOrder::Dmy),
            "mdy" => Some(DateOrder::Mdy),
            _ => None,
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const DATE_SEPARATORS: [char; 5] = ['-', '/', '.', ',', ' '];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Number(&'a str),
    MonthName(u32),
    Unknown,
}

// ============================================================================
// ATOMIC FIELDS
// ============================================================================

/// Parse the atomic year/month/day terms.
///
/// Labelled terms are never ambiguous. Returns the terms whose value was unreadable.
pub fn parse_atomic(raw_year: &str, raw_month: &str, raw_day: &str) -> (ChronoAccumulator, Vec<Term>) {
    let mut acc = ChronoAccumulator::default();
    let mut unreadable = Vec::new();

    let raw_year = raw_year.trim();
    if !raw_year.is_empty() {
        match raw_year.parse::<i32>() {
            Ok(year) => acc.year = Some(Component::resolved(year)),
            Err(_) => unreadable.push(Term::Year),
        }
    }

    let raw_month = raw_month.trim();
    if !raw_month.is_empty() {
        let month = match classify(raw_month) {
            Token::Number(digits) => digits.parse::<u32>().ok(),
            Token::MonthName(month) => Some(month),
            Token::Unknown => None,
        };
        match month {
            Some(month) => acc.month = Some(Component::resolved(month)),
            None => unreadable.push(Term::Month),
        }
    }

    let raw_day = raw_day.trim();
    if !raw_day.is_empty() {
        match raw_day.parse::<u32>() {
            Ok(day) => acc.day = Some(Component::resolved(day)),
            Err(_) => unreadable.push(Term::Day),
        }
    }

    (acc, unreadable)
}

// ============================================================================
// FREE TEXT ENDPOINT
// ============================================================================

/// Parse one endpoint of a free-text date.
///
/// `seed` is the finest granularity of the other endpoint: a compact token
/// such as the "05" in "2011-01-01/05" fills the fields ending at it.
pub fn parse_endpoint(raw: &str, seed: Option<ChronoField>, order: Option<DateOrder>) -> ChronoAccumulator {
    let mut acc = ChronoAccumulator::default();
    let raw = raw.trim();
    if raw.is_empty() {
        return acc;
    }

    let (date_part, time_part) = split_date_time(raw);

    if let Some(time_text) = time_part {
        match parse_time(time_text) {
            Some(time) => acc.time = Some(Component::resolved(time)),
            None => acc.rejected = true,
        }
    }

    if let Some(date_text) = date_part {
        assign_date_tokens(&mut acc, date_text, seed, order);
    }

    acc
}

fn split_date_time(raw: &str) -> (Option<&str>, Option<&str>) {
    // Time only, e.g. the "12:52:17Z" end of a range
    if raw.contains(':') && !raw.contains('T') && !raw.contains(char::is_whitespace) {
        return (None, Some(raw));
    }

    // ISO "T" separator, only when a digit follows (so "OCTOBER" survives)
    let bytes = raw.as_bytes();
    if let Some(at) = raw
        .char_indices()
        .find(|(i, c)| *c == 'T' && bytes.get(i + 1).map_or(false, |b| b.is_ascii_digit()))
        .map(|(i, _)| i)
    {
        return (Some(&raw[..at]), Some(&raw[at + 1..]));
    }

    if let Some((date, time)) = raw.rsplit_once(char::is_whitespace) {
        if time.contains(':') {
            return (Some(date.trim()), Some(time.trim()));
        }
    }

    (Some(raw), None)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let mut text = raw.trim().trim_end_matches(['Z', 'z']);

    // Drop a numeric UTC offset; the wall-clock time is kept as recorded
    if let Some(at) = text.char_indices().skip(3).find(|(_, c)| *c == '+' || *c == '-').map(|(i, _)| i) {
        text = &text[..at];
    }

    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

fn classify(token: &str) -> Token<'_> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return Token::Number(token);
    }

    // Ordinals: 1st, 2nd, 3rd, 17th
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = token.strip_suffix(suffix) {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return Token::Number(digits);
            }
        }
    }

    let lower = token.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| *name == lower || (lower.len() >= 3 && name.starts_with(&lower)))
        .map(|index| Token::MonthName(index as u32 + 1))
        .unwrap_or(Token::Unknown)
}

fn assign_date_tokens(
    acc: &mut ChronoAccumulator,
    date_text: &str,
    seed: Option<ChronoField>,
    order: Option<DateOrder>,
) {
    let tokens: Vec<Token> = date_text
        .split(DATE_SEPARATORS)
        .filter(|t| !t.is_empty())
        .map(classify)
        .collect();

    if tokens.iter().any(|t| *t == Token::Unknown) {
        acc.rejected = true;
        return;
    }

    let month_names: Vec<u32> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::MonthName(m) => Some(*m),
            _ => None,
        })
        .collect();
    let numbers: Vec<&str> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Number(n) => Some(*n),
            _ => None,
        })
        .collect();

    match month_names.as_slice() {
        [] => assign_numeric(acc, &numbers, seed, order),
        [month] => assign_with_month_name(acc, *month, &numbers),
        _ => acc.rejected = true,
    }
}

/// "10 March 2008", "March 2008", "Mar 10th"
fn assign_with_month_name(acc: &mut ChronoAccumulator, month: u32, numbers: &[&str]) {
    acc.month = Some(Component::resolved(month));

    for number in numbers {
        let Ok(value) = number.parse::<u32>() else {
            acc.rejected = true;
            return;
        };
        let is_year = number.len() >= 3 || value > 31;
        let slot_taken = if is_year { acc.year.is_some() } else { acc.day.is_some() };
        if slot_taken {
            acc.rejected = true;
            return;
        }
        if is_year {
            set_year(acc, value);
        } else {
            acc.day = Some(Component::resolved(value));
        }
    }
}

fn assign_numeric(
    acc: &mut ChronoAccumulator,
    numbers: &[&str],
    seed: Option<ChronoField>,
    order: Option<DateOrder>,
) {
    let values: Option<Vec<u32>> = numbers.iter().map(|n| n.parse::<u32>().ok()).collect();
    let Some(values) = values else {
        acc.rejected = true;
        return;
    };
    let is_year_token = |i: usize| numbers[i].len() >= 3;

    match values.as_slice() {
        [] => {}

        [value] => {
            if numbers[0].len() == 8 {
                // Basic ISO: 20080203
                let (y, m, d) = (value / 10_000, value / 100 % 100, value % 100);
                set_year(acc, y);
                acc.month = Some(Component::resolved(m));
                acc.day = Some(Component::resolved(d));
            } else if is_year_token(0) {
                set_year(acc, *value);
            } else if let Some(seed) = seed {
                assign_seeded(acc, &values, seed, order);
            } else {
                set_year(acc, *value);
            }
        }

        [first, second] => {
            if is_year_token(0) {
                set_year(acc, *first);
                acc.month = Some(Component::resolved(*second));
            } else if is_year_token(1) {
                acc.month = Some(Component::resolved(*first));
                set_year(acc, *second);
            } else if let Some(seed) = seed {
                assign_seeded(acc, &values, seed, order);
            } else {
                acc.rejected = true;
            }
        }

        [first, second, third] => {
            if is_year_token(0) {
                set_year(acc, *first);
                acc.month = Some(Component::resolved(*second));
                acc.day = Some(Component::resolved(*third));
            } else if is_year_token(2) {
                set_year(acc, *third);
                assign_day_month(acc, *first, *second, order);
            } else {
                acc.rejected = true;
            }
        }

        _ => acc.rejected = true,
    }
}

/// A year too large for i32 rejects the endpoint
fn set_year(acc: &mut ChronoAccumulator, value: u32) {
    match i32::try_from(value) {
        Ok(year) => acc.year = Some(Component::resolved(year)),
        Err(_) => acc.rejected = true,
    }
}

/// Two leading tokens of a year-last date: which one is the day?
fn assign_day_month(acc: &mut ChronoAccumulator, first: u32, second: u32, order: Option<DateOrder>) {
    let (day, month, ambiguous) = if first > 12 {
        (first, second, false)
    } else if second > 12 {
        (second, first, false)
    } else {
        match order {
            Some(DateOrder::Mdy) => (second, first, false),
            Some(DateOrder::Dmy) => (first, second, false),
            None => (first, second, true),
        }
    };

    let component = |value| {
        if ambiguous {
            Component::ambiguous(value)
        } else {
            Component::resolved(value)
        }
    };
    acc.day = Some(component(day));
    acc.month = Some(component(month));
}

/// Fill the fields ending at the seed granularity, e.g. Day seed + 2 tokens → month, day
fn assign_seeded(acc: &mut ChronoAccumulator, values: &[u32], seed: ChronoField, order: Option<DateOrder>) {
    const DATE_FIELDS: [ChronoField; 3] = [ChronoField::Year, ChronoField::Month, ChronoField::Day];

    let end = match seed {
        ChronoField::Year => 0,
        ChronoField::Month => 1,
        ChronoField::Day | ChronoField::Time => 2,
    };
    if values.len() > end + 1 {
        acc.rejected = true;
        return;
    }

    let start = end + 1 - values.len();
    let mut fields: Vec<ChronoField> = DATE_FIELDS[start..=end].to_vec();
    if order == Some(DateOrder::Dmy) && fields == [ChronoField::Month, ChronoField::Day] {
        fields.reverse();
    }

    for (field, value) in fields.into_iter().zip(values) {
        match field {
            ChronoField::Year => set_year(acc, *value),
            ChronoField::Month => acc.month = Some(Component::resolved(*value)),
            ChronoField::Day => acc.day = Some(Component::resolved(*value)),
            ChronoField::Time => {}
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
