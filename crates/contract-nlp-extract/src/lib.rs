//! Entity and date extraction for contract, part and customer queries.

pub mod dates;
pub mod extractor;
pub mod identifiers;

pub use dates::{DateExtraction, DateFilter, DateScan, TemporalOperation, date_attribute};
pub use extractor::{Extraction, extract, extract_at};

use chrono::{Local, NaiveDate};

/// Date extraction against the local clock.
pub fn extract_dates(text: &str) -> DateExtraction {
    extract_dates_at(text, Local::now().date_naive())
}

pub fn extract_dates_at(text: &str, today: NaiveDate) -> DateExtraction {
    dates::extract_dates_at(text, today).dates
}
