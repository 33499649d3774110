//! Temporal expression extraction.
//!
//! Independent passes fill a [`DateExtraction`]:
//!
//! 1. explicit dates (`15-01-2025`, `01/15/2025`, `2025-01-15`)
//! 2. `between A and B` / `from A to B` ranges over years or months
//! 3. month names, optionally followed by a year
//! 4. bare years, classified by the nearest preceding keyword
//! 5. relative terms (today, yesterday, this month, this/last year)
//! 6. "till date" / "till now" / "current date", closing an open range
//!
//! [`DateExtraction::filter`] then picks one filter by precedence.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use serde::Serialize;

use contract_nlp_core::{EntitySource, ExtractedEntity, Operation};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})\b").unwrap());
static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:between|from)\s+([a-z]+(?:\s+\d{4})?|\d{4})\s+(?:and|to|till|until)\s+([a-z]+(?:\s+\d{4})?|\d{4})\b",
    )
    .unwrap()
});
static TILL_CURRENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:till|until|up\s+to|to)\s+(?:date|now|today)\b|\bcurrent\s+date\b").unwrap()
});
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+|\d+").unwrap());

const AFTER_WORDS: &[&str] = &["after", "since", "from"];
const BEFORE_WORDS: &[&str] = &["before", "until", "till", "prior"];
const IN_WORDS: &[&str] = &["in", "during", "of", "for", "created", "year"];
/// Words that make an ambiguous month token ("may", "mar") read as a month.
const MONTH_CONTEXT: &[&str] = &[
    "in", "of", "during", "since", "after", "before", "between", "from", "and", "to", "until",
    "till", "last", "this", "early", "late", "mid",
];

/// Special marker for date results that run up to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalOperation {
    Between,
    AfterToCurrent,
}

/// Raw result of the date passes. More than one shape may be populated;
/// [`filter`](Self::filter) resolves them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateExtraction {
    pub specific_date: Option<NaiveDate>,
    pub in_year: Option<i32>,
    pub after_year: Option<i32>,
    pub before_year: Option<i32>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub start_month: Option<u32>,
    pub end_month: Option<u32>,
    /// Year the month range falls in.
    pub month_year: Option<i32>,
    pub temporal_operation: Option<TemporalOperation>,
}

/// The single filter chosen from a [`DateExtraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFilter {
    Specific(NaiveDate),
    InYear(i32),
    AfterYear(i32),
    AfterToCurrent { from: i32, to: i32 },
    BeforeYear(i32),
    YearRange(i32, i32),
    MonthRange { start: NaiveDate, end: NaiveDate },
}

impl DateFilter {
    pub fn to_entity(&self, attribute: &str) -> ExtractedEntity {
        let (operation, value) = match *self {
            Self::Specific(d) => (Operation::Eq, d.format("%Y-%m-%d").to_string()),
            Self::InYear(y) => (Operation::InYear, y.to_string()),
            Self::AfterYear(y) => (Operation::AfterYear, y.to_string()),
            Self::AfterToCurrent { from, to } => (Operation::YearRange, format!("{from},{to}")),
            Self::BeforeYear(y) => (Operation::BeforeYear, y.to_string()),
            Self::YearRange(a, b) => (Operation::YearRange, format!("{a},{b}")),
            Self::MonthRange { start, end } => (
                Operation::MonthRange,
                format!("{},{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            ),
        };
        ExtractedEntity::new(attribute, operation, value, EntitySource::Pattern)
    }
}

impl DateExtraction {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolve to one filter.
    ///
    /// Precedence: specific date, in-year, after (or after-to-current),
    /// before, year range, month range.
    pub fn filter(&self) -> Option<DateFilter> {
        if let Some(d) = self.specific_date {
            return Some(DateFilter::Specific(d));
        }
        if let Some(y) = self.in_year {
            return Some(DateFilter::InYear(y));
        }
        if let Some(from) = self.after_year {
            return Some(match (self.temporal_operation, self.end_year) {
                (Some(TemporalOperation::AfterToCurrent), Some(to)) => {
                    DateFilter::AfterToCurrent { from, to }
                }
                _ => DateFilter::AfterYear(from),
            });
        }
        if let Some(y) = self.before_year {
            return Some(DateFilter::BeforeYear(y));
        }
        if let (Some(a), Some(b)) = (self.start_year, self.end_year) {
            return Some(DateFilter::YearRange(a.min(b), a.max(b)));
        }
        let start_month = self.start_month?;
        let end_month = self.end_month.unwrap_or(start_month);
        let year = self.month_year?;
        let end_year = if end_month < start_month { year + 1 } else { year };
        let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
        let end = last_day_of_month(end_year, end_month)?;
        Some(DateFilter::MonthRange { start, end })
    }
}

/// Date extraction plus the byte spans of `text` it consumed.
///
/// Consumed spans (dates, years, ranges) must not be re-read as numeric
/// identifiers.
#[derive(Debug, Clone, Default)]
pub struct DateScan {
    pub dates: DateExtraction,
    pub consumed: Vec<Range<usize>>,
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn month_number(word: &str) -> Option<u32> {
    Some(match word {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    })
}

fn year_value(word: &str) -> Option<i32> {
    if word.len() != 4 || !(word.starts_with("19") || word.starts_with("20")) {
        return None;
    }
    word.parse().ok()
}

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Year(i32),
    Month(u32, Option<i32>),
}

fn endpoint(raw: &str) -> Option<Endpoint> {
    let mut parts = raw.split_whitespace();
    let first = parts.next()?;
    if let Some(y) = year_value(first) {
        return Some(Endpoint::Year(y));
    }
    let month = month_number(first)?;
    Some(Endpoint::Month(month, parts.next().and_then(year_value)))
}

fn parse_numeric_date(a: &str, b: &str, y: &str) -> Option<NaiveDate> {
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() == 2 {
        year += 2000;
    } else if y.len() != 4 {
        return None;
    }
    // day-month first, then month-day
    NaiveDate::from_ymd_opt(year, b, a).or_else(|| NaiveDate::from_ymd_opt(year, a, b))
}

struct Token<'a> {
    span: Range<usize>,
    word: &'a str,
}

fn overlaps(span: &Range<usize>, consumed: &[Range<usize>]) -> bool {
    consumed.iter().any(|c| span.start < c.end && c.start < span.end)
}

/// Extract dates relative to `today`.
pub fn extract_dates_at(text: &str, today: NaiveDate) -> DateScan {
    let lower = text.to_ascii_lowercase();
    let mut out = DateExtraction::default();
    let mut consumed: Vec<Range<usize>> = Vec::new();
    let till_current = TILL_CURRENT.find(&lower);
    if let Some(m) = &till_current {
        consumed.push(m.range());
    }

    // ── explicit dates ──
    for caps in ISO_DATE.captures_iter(&lower) {
        let date = caps[2]
            .parse()
            .ok()
            .zip(caps[3].parse().ok())
            .and_then(|(m, d)| NaiveDate::from_ymd_opt(caps[1].parse().ok()?, m, d));
        if let Some(date) = date {
            out.specific_date.get_or_insert(date);
            if let Some(m) = caps.get(0) {
                consumed.push(m.range());
            }
        }
    }
    for caps in NUMERIC_DATE.captures_iter(&lower) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&whole.range(), &consumed) {
            continue;
        }
        if let Some(date) = parse_numeric_date(&caps[1], &caps[2], &caps[3]) {
            out.specific_date.get_or_insert(date);
            consumed.push(whole.range());
        }
    }

    // ── ranges ──
    for caps in RANGE.captures_iter(&lower) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&whole.range(), &consumed) {
            continue;
        }
        match (endpoint(&caps[1]), endpoint(&caps[2])) {
            (Some(Endpoint::Year(a)), Some(Endpoint::Year(b))) => {
                out.start_year = Some(a.min(b));
                out.end_year = Some(a.max(b));
            }
            (Some(Endpoint::Month(m1, y1)), Some(Endpoint::Month(m2, y2))) => {
                out.start_month = Some(m1);
                out.end_month = Some(m2);
                out.month_year = Some(y1.or(y2).unwrap_or(today.year()));
            }
            _ => continue,
        }
        out.temporal_operation = Some(TemporalOperation::Between);
        consumed.push(whole.range());
        break;
    }

    let tokens: Vec<Token<'_>> = TOKEN
        .find_iter(&lower)
        .filter(|m| !overlaps(&m.range(), &consumed))
        .map(|m| Token {
            span: m.range(),
            word: m.as_str(),
        })
        .collect();

    // ── month names ──
    let mut months: Vec<(u32, Option<i32>)> = Vec::new();
    let mut claimed: Vec<usize> = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        let Some(month) = month_number(tok.word) else { continue };
        let prev = i.checked_sub(1).map(|p| tokens[p].word);
        let next = tokens.get(i + 1);
        let next_year = next.and_then(|n| year_value(n.word));
        if prev == Some("by") {
            continue;
        }
        let ambiguous = matches!(tok.word, "may" | "mar");
        if ambiguous && next_year.is_none() && !prev.is_some_and(|p| MONTH_CONTEXT.contains(&p)) {
            continue;
        }
        if next_year.is_some() {
            claimed.push(i + 1);
        }
        months.push((month, next_year));
        consumed.push(tok.span.clone());
    }

    // ── bare years ──
    for (i, tok) in tokens.iter().enumerate() {
        let Some(year) = year_value(tok.word) else { continue };
        if claimed.contains(&i) {
            consumed.push(tok.span.clone());
            continue;
        }
        let keyword = tokens[..i]
            .iter()
            .rev()
            .take(3)
            .take_while(|t| !t.word.starts_with(|c: char| c.is_ascii_digit()))
            .find_map(|t| {
                if AFTER_WORDS.contains(&t.word) {
                    Some(Keyword::After)
                } else if BEFORE_WORDS.contains(&t.word) {
                    Some(Keyword::Before)
                } else if IN_WORDS.contains(&t.word) {
                    Some(Keyword::In)
                } else {
                    None
                }
            });
        match keyword {
            Some(Keyword::After) => out.after_year = Some(year),
            Some(Keyword::Before) => out.before_year = Some(year),
            Some(Keyword::In) => out.in_year = Some(year),
            None if !months.is_empty() => out.month_year = Some(year),
            None => out.in_year = Some(year),
        }
        consumed.push(tok.span.clone());
    }

    if !months.is_empty() {
        let (first, _) = months[0];
        let (last, _) = months[months.len() - 1];
        out.start_month = Some(first);
        out.end_month = if months.len() == 1 && till_current.is_some() {
            None
        } else {
            Some(last)
        };
        let year = months.iter().find_map(|(_, y)| *y).or(out.month_year);
        out.month_year = year.or(out.in_year.take()).or(Some(today.year()));
    }

    // ── relative terms ──
    let has = |phrase: &str| contains_phrase(&lower, phrase);
    if out.specific_date.is_none() {
        if has("yesterday") {
            out.specific_date = today.pred_opt();
        } else if has("today") && !till_current.as_ref().is_some_and(|m| m.as_str().ends_with("today")) {
            out.specific_date = Some(today);
        }
    }
    if has("this month") || has("current month") {
        out.start_month = Some(today.month());
        out.end_month = Some(today.month());
        out.month_year = Some(today.year());
    }
    if out.in_year.is_none() {
        if has("this year") || has("current year") {
            out.in_year = Some(today.year());
        } else if has("last year") || has("previous year") {
            out.in_year = Some(today.year() - 1);
        }
    }

    // ── till date ──
    if till_current.is_some() {
        if out.after_year.is_some() && out.end_year.is_none() {
            out.end_year = Some(today.year());
            out.temporal_operation = Some(TemporalOperation::AfterToCurrent);
        } else if let Some(y) = out.in_year.filter(|_| out.start_year.is_none()) {
            out.in_year = None;
            out.start_year = Some(y);
            out.end_year = Some(today.year());
        } else if out.start_year.is_some() && out.end_year.is_none() {
            out.end_year = Some(today.year());
        } else if out.start_month.is_some() && out.end_month.is_none() {
            out.end_month = Some(today.month());
        }
    }

    consumed.sort_by_key(|r| r.start);
    DateScan {
        dates: out,
        consumed,
    }
}

#[derive(Debug, Clone, Copy)]
enum Keyword {
    After,
    Before,
    In,
}

/// Word-bounded phrase match on lowercase text.
pub(crate) fn contains_phrase(lower: &str, phrase: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = lower[from..].find(phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let before_ok = start == 0 || !lower.as_bytes()[start - 1].is_ascii_alphanumeric();
        let after_ok = end == lower.len() || !lower.as_bytes()[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

/// Which date column the text is talking about.
pub fn date_attribute(text: &str) -> &'static str {
    let lower = text.to_ascii_lowercase();
    if lower.contains("effective") {
        "EFFECTIVE_DATE"
    } else if lower.contains("expir") {
        "EXPIRATION_DATE"
    } else {
        "CREATE_DATE"
    }
}
