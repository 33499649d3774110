//! One-shot extraction: identifiers, names, status and dates into entities.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use contract_nlp_core::{EntitySource, ExtractedEntity, Header, Operation, ValidationIssue};

use crate::dates::{DateExtraction, date_attribute, extract_dates_at};
use crate::identifiers;

/// Everything pulled out of one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Generic filters; table-specific column names are applied by the classifier.
    pub entities: Vec<ExtractedEntity>,
    pub header: Header,
    pub dates: DateExtraction,
    pub issues: Vec<ValidationIssue>,
}

impl Extraction {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn entity(&self, attribute: &str) -> Option<&ExtractedEntity> {
        self.entities.iter().find(|e| e.attribute == attribute)
    }
}

fn check_input(text: &str) -> Option<ValidationIssue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Some(ValidationIssue::error("EMPTY_INPUT", "Input cannot be empty"))
    } else if trimmed.chars().count() < 3 {
        Some(ValidationIssue::error("INPUT_TOO_SHORT", "Input too short"))
    } else {
        None
    }
}

/// Extract against the local clock.
pub fn extract(text: &str) -> Extraction {
    extract_at(text, Local::now().date_naive())
}

/// Extract with a fixed `today` for relative dates.
pub fn extract_at(text: &str, today: NaiveDate) -> Extraction {
    if let Some(issue) = check_input(text) {
        return Extraction {
            issues: vec![issue],
            ..Default::default()
        };
    }

    let scan = extract_dates_at(text, today);
    let masked = scan.consumed.as_slice();

    let mut header = Header {
        contract_number: identifiers::contract_number(text, masked),
        part_number: identifiers::part_number(text),
        customer_name: identifiers::customer_name(text),
        created_by: identifiers::creator(text),
        ..Default::default()
    };
    if header.contract_number.is_none() {
        header.customer_number = identifiers::customer_number(text, masked);
    }

    let pattern = |attribute: &str, value: &str| {
        ExtractedEntity::new(attribute, Operation::Eq, value, EntitySource::Pattern)
    };
    let mut entities = Vec::new();
    let slots = [
        ("AWARD_NUMBER", &header.contract_number),
        ("PART_NUMBER", &header.part_number),
        ("CUSTOMER_NUMBER", &header.customer_number),
        ("CUSTOMER_NAME", &header.customer_name),
        ("CREATED_BY", &header.created_by),
    ];
    for (attribute, value) in slots {
        if let Some(value) = value {
            entities.push(pattern(attribute, value));
        }
    }
    if let Some(status) = identifiers::status(text) {
        entities.push(pattern("STATUS", status));
    }
    if let Some(filter) = scan.dates.filter() {
        entities.push(filter.to_entity(date_attribute(text)));
    }

    debug!(
        entities = entities.len(),
        has_identifier = header.has_identifier(),
        "extracted"
    );
    Extraction {
        entities,
        header,
        dates: scan.dates,
        issues: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn summary(x: &Extraction) -> Vec<String> {
        x.entities.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn creator_and_year_are_separate_entities() {
        let x = extract_at("contracts created by vinod and in 2025", today());
        assert_eq!(x.header.created_by.as_deref(), Some("Vinod"));
        assert_eq!(
            summary(&x),
            vec!["CREATED_BY = Vinod", "CREATE_DATE IN_YEAR 2025"]
        );
        assert!(x.header.customer_number.is_none());
    }

    #[test]
    fn contract_number_suppresses_customer_number() {
        let x = extract_at("show100476 for customer 4455", today());
        assert_eq!(x.header.contract_number.as_deref(), Some("100476"));
        assert!(x.header.customer_number.is_none());
        assert_eq!(summary(&x), vec!["AWARD_NUMBER = 100476"]);
    }

    #[test]
    fn years_are_not_customer_numbers() {
        let x = extract_at("contracts for customer 78901 after 2020", today());
        assert_eq!(x.header.customer_number.as_deref(), Some("78901"));
        assert_eq!(
            summary(&x),
            vec!["CUSTOMER_NUMBER = 78901", "CREATE_DATE AFTER_YEAR 2020"]
        );
    }

    #[test]
    fn expiration_dates_use_their_column() {
        let x = extract_at("contracts expiring in 2027", today());
        assert_eq!(summary(&x), vec!["EXPIRATION_DATE IN_YEAR 2027"]);
    }

    #[test]
    fn part_and_status() {
        let x = extract_at("failed parts for AB12345", today());
        assert_eq!(summary(&x), vec!["PART_NUMBER = AB12345", "STATUS = FAILED"]);
        assert_eq!(x.entity("STATUS").map(|e| e.source), Some(EntitySource::Pattern));
    }

    #[test]
    fn after_till_date_runs_to_current_year() {
        let x = extract_at("contracts created after 2020 till date", today());
        assert_eq!(summary(&x), vec!["CREATE_DATE YEAR_RANGE 2020,2026"]);
    }

    #[test]
    fn empty_and_short_input_are_errors() {
        let x = extract_at("   ", today());
        assert!(x.has_errors());
        assert_eq!(x.issues[0].code, "EMPTY_INPUT");
        assert_eq!(x.issues[0].message, "Input cannot be empty");

        let x = extract_at("hi", today());
        assert_eq!(x.issues[0].code, "INPUT_TOO_SHORT");
        assert!(x.entities.is_empty());
    }
}
