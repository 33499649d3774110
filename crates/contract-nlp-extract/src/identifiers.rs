//! Numeric identifiers, customer names, creators and status keywords.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static CONTRACT_BOUNDED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{6})\b").unwrap());
/// Six digits glued to surrounding words ("show100476").
static CONTRACT_GLUED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{6})(?:[^0-9]|$)").unwrap());
static CUSTOMER_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4,8})\b").unwrap());
static PART_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]{2}\d{3,5})\b").unwrap());
static QUOTED_CUSTOMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:customer|account|client)(?:\s+name)?\s*(?:is|=|:)?\s*["']([^"']+)["']"#)
        .unwrap()
});
static NAMED_CUSTOMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:customer|account|client)\s+name\s+(?:is\s+|=\s*|:\s*)?([A-Za-z][\w&.\-]*)")
        .unwrap()
});
static FOR_CUSTOMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(?:customer|client)\s+([A-Za-z][\w&.\-]*)").unwrap()
});

/// Phrases that end a creator name.
const CREATOR_CUT: &[&str] = &[
    " and ", " in ", " after ", " before ", " between ", " to ", " till ", " until ",
    " created ", " during ", " since ", " from ", " of ", " on ", " with ",
];

/// Two-letter words that read as a part prefix when glued to a number
/// ("in2025").
const GLUED_WORDS: &[&str] = &[
    "an", "as", "at", "be", "by", "do", "go", "if", "in", "is", "it", "me", "my", "no", "of",
    "on", "or", "so", "to", "up", "us", "we",
];

/// Words that follow "customer"/"by" but are not names.
const NOT_A_NAME: &[&str] = &[
    "number", "no", "num", "id", "name", "is", "the", "a", "an", "me", "user", "someone",
    "account", "details", "info", "information", "contracts", "contract", "date",
];

fn outside(range: Range<usize>, masked: &[Range<usize>]) -> bool {
    !masked.iter().any(|m| range.start < m.end && m.start < range.end)
}

/// First six-digit contract number: word-bounded first, then glued.
pub fn contract_number(text: &str, masked: &[Range<usize>]) -> Option<String> {
    [&*CONTRACT_BOUNDED, &*CONTRACT_GLUED]
        .into_iter()
        .find_map(|re| {
            re.captures_iter(text)
                .filter_map(|c| c.get(1))
                .find(|m| outside(m.range(), masked))
                .map(|m| m.as_str().to_string())
        })
}

/// First 4–8 digit run outside `masked` (dates and years).
pub fn customer_number(text: &str, masked: &[Range<usize>]) -> Option<String> {
    CUSTOMER_NUMBER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find(|m| outside(m.range(), masked))
        .map(|m| m.as_str().to_string())
}

/// Two letters and three to five digits, uppercased. A common word glued
/// to a number is skipped.
pub fn part_number(text: &str) -> Option<String> {
    PART_NUMBER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|m| !GLUED_WORDS.contains(&m[..2].to_ascii_lowercase().as_str()))
        .map(str::to_ascii_uppercase)
}

/// Customer name from `customer name "X"`, `customer name is X` or `for customer X`.
pub fn customer_name(text: &str) -> Option<String> {
    if let Some(name) = QUOTED_CUSTOMER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
    {
        return Some(name);
    }
    [&*NAMED_CUSTOMER, &*FOR_CUSTOMER].into_iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', ',']).to_string())
            .filter(|n| !NOT_A_NAME.contains(&n.to_ascii_lowercase().as_str()))
    })
}

/// Creator from "created by X", or "by X" once "created" has appeared.
///
/// The span after the marker is cut at the first date/conjunction keyword,
/// so "created by vinod and in 2025" yields "Vinod".
pub fn creator(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let after_marker = if let Some(pos) = lower.find("created by ") {
        pos + "created by ".len()
    } else {
        let created = lower.find("created")?;
        let by = lower[created..].find(" by ")?;
        created + by + " by ".len()
    };

    let mut span = &lower[after_marker..];
    let padded = format!(" {span} ");
    if let Some(cut) = CREATOR_CUT.iter().filter_map(|k| padded.find(k)).min() {
        span = &span[..cut.saturating_sub(1).min(span.len())];
    }

    let word = span
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric());
    if word.chars().count() <= 2
        || word.chars().all(|c| c.is_ascii_digit())
        || NOT_A_NAME.contains(&word)
    {
        return None;
    }
    Some(capitalize(word))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Status keyword, uppercased: ACTIVE, EXPIRED or FAILED.
pub fn status(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    [("active", "ACTIVE"), ("expired", "EXPIRED"), ("failed", "FAILED")]
        .into_iter()
        .find(|(kw, _)| words.contains(kw))
        .map(|(_, status)| status)
}
