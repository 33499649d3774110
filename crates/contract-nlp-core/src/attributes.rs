//! Ordered attribute table driving the contract-creation dialogue.
//!
//! Each [`AttributeConfig`] describes one slot: the prompt shown to the user,
//! how the answer is validated and how the stored value is extracted from it.
//! Required attributes are prompted in table order.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Text,
    Number,
    Date,
    Select,
    Currency,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Number => "NUMBER",
            Self::Date => "DATE",
            Self::Select => "SELECT",
            Self::Currency => "CURRENCY",
        }
    }

    fn has_allowed_values(&self) -> bool {
        matches!(self, Self::Select | Self::Currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeConfig {
    pub name: String,
    pub display_name: String,
    pub prompt: String,
    /// Matched against the whole trimmed value.
    #[serde(default)]
    pub validation_pattern: Option<String>,
    pub validation_message: String,
    #[serde(default)]
    pub min_length: usize,
    pub max_length: usize,
    pub data_type: DataType,
    #[serde(default)]
    pub allowed_values: Vec<String>,
    pub required: bool,
}

impl AttributeConfig {
    #[allow(clippy::too_many_arguments)]
    fn built_in(
        name: &str,
        display_name: &str,
        prompt: &str,
        pattern: Option<&str>,
        message: &str,
        min_length: usize,
        max_length: usize,
        data_type: DataType,
        allowed: &[&str],
        required: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            prompt: prompt.to_string(),
            validation_pattern: pattern.map(str::to_string),
            validation_message: message.to_string(),
            min_length,
            max_length,
            data_type,
            allowed_values: allowed.iter().map(|v| v.to_string()).collect(),
            required,
        }
    }
}

const NAME_PATTERN: &str = r"[A-Za-z0-9\s\-_]+";
const DATE_PATTERN: &str = r"\d{2}-\d{2}-\d{4}";

/// The built-in attribute list, in prompt order.
pub fn default_attributes() -> Vec<AttributeConfig> {
    use DataType::*;
    vec![
        AttributeConfig::built_in(
            "CUSTOMER_NUMBER",
            "Customer Account Number",
            "Please provide the customer account number:",
            Some(r"\d{4,8}"),
            "Please provide a valid customer account number (4-8 digits).",
            4,
            8,
            Number,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "CONTRACT_NAME",
            "Contract Name",
            "Please provide a name for the contract:",
            Some(NAME_PATTERN),
            "Please provide a valid contract name (letters, numbers, spaces, hyphens, underscores only).",
            3,
            100,
            Text,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "TITLE",
            "Contract Title",
            "Please provide a title for the contract:",
            Some(NAME_PATTERN),
            "Please provide a valid contract title (letters, numbers, spaces, hyphens, underscores only).",
            3,
            200,
            Text,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "DESCRIPTION",
            "Contract Description",
            "Please provide a description for the contract:",
            Some(r"[A-Za-z0-9\s\-_.,!?()]+"),
            "Please provide a valid contract description.",
            10,
            500,
            Text,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "EFFECTIVE_DATE",
            "Effective Date",
            "Please provide the effective date (MM-DD-YYYY):",
            Some(DATE_PATTERN),
            "Please provide a valid date in MM-DD-YYYY format.",
            10,
            10,
            Date,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "EXPIRATION_DATE",
            "Expiration Date",
            "Please provide the expiration date (MM-DD-YYYY):",
            Some(DATE_PATTERN),
            "Please provide a valid date in MM-DD-YYYY format.",
            10,
            10,
            Date,
            &[],
            true,
        ),
        AttributeConfig::built_in(
            "CONTRACT_TYPE",
            "Contract Type",
            "Please select the contract type:",
            None,
            "Please select a valid contract type.",
            0,
            50,
            Select,
            &["SERVICE", "SUPPLY", "LICENSE", "MAINTENANCE", "SUPPORT"],
            false,
        ),
        AttributeConfig::built_in(
            "PAYMENT_TERMS",
            "Payment Terms",
            "Please provide the payment terms:",
            Some(NAME_PATTERN),
            "Please provide valid payment terms.",
            3,
            100,
            Text,
            &[],
            false,
        ),
        AttributeConfig::built_in(
            "CURRENCY",
            "Currency",
            "Please provide the currency (e.g. USD):",
            Some("[A-Z]{3}"),
            "Please provide a valid 3-letter currency code.",
            3,
            3,
            Currency,
            &["USD", "EUR", "GBP", "CAD", "AUD", "JPY"],
            false,
        ),
    ]
}

static DEFAULT_TABLE: LazyLock<AttributeTable> =
    LazyLock::new(|| AttributeTable::new(default_attributes()).unwrap());

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DATE_PATTERN).unwrap());

/// Validated, ordered attribute configuration.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    attributes: Vec<AttributeConfig>,
    patterns: HashMap<String, Regex>,
}

/// Counts reported by [`AttributeTable::summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSummary {
    pub total: usize,
    pub required: usize,
    pub optional: usize,
    pub required_names: Vec<String>,
}

impl fmt::Display for AttributeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total attributes: {}", self.total)?;
        writeln!(f, "Required: {}", self.required)?;
        writeln!(f, "Optional: {}", self.optional)?;
        write!(f, "Prompt order: {}", self.required_names.join(" -> "))
    }
}

impl Default for AttributeTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

fn compile(attr: &AttributeConfig) -> Result<Option<Regex>, ConfigError> {
    attr.validation_pattern
        .as_deref()
        .map(|p| {
            Regex::new(&format!("^(?:{p})$")).map_err(|source| ConfigError::InvalidPattern {
                attribute: attr.name.clone(),
                source,
            })
        })
        .transpose()
}

impl AttributeTable {
    /// Build a table, compiling every validation pattern.
    pub fn new(attributes: Vec<AttributeConfig>) -> Result<Self, ConfigError> {
        let mut table = Self {
            attributes: Vec::with_capacity(attributes.len()),
            patterns: HashMap::new(),
        };
        for attr in attributes {
            table.add(attr)?;
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeConfig> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn all(&self) -> &[AttributeConfig] {
        &self.attributes
    }

    pub fn required(&self) -> impl Iterator<Item = &AttributeConfig> {
        self.attributes.iter().filter(|a| a.required)
    }

    pub fn required_names(&self) -> Vec<String> {
        self.required().map(|a| a.name.clone()).collect()
    }

    /// First required attribute not yet in `completed`.
    pub fn next_required(&self, completed: &[String]) -> Option<&AttributeConfig> {
        self.required().find(|a| !completed.contains(&a.name))
    }

    /// Check `raw` against `attr`'s rules.
    ///
    /// Order: required-but-empty, optional-and-empty (accepted), minimum
    /// length, maximum length, pattern, allowed values.
    pub fn validate(&self, attr: &AttributeConfig, raw: &str) -> Result<(), ValidationFailure> {
        let value = raw.trim();
        let fail = |message: String| ValidationFailure {
            attribute: attr.name.clone(),
            message,
        };

        if value.is_empty() {
            return if attr.required {
                Err(fail(format!("Please provide a value for {}.", attr.display_name)))
            } else {
                Ok(())
            };
        }

        let len = value.chars().count();
        if len < attr.min_length {
            return Err(fail(format!(
                "{} must be at least {} characters.",
                attr.display_name, attr.min_length
            )));
        }
        if len > attr.max_length {
            return Err(fail(format!(
                "{} must be no more than {} characters.",
                attr.display_name, attr.max_length
            )));
        }

        let candidate = if attr.data_type.has_allowed_values() {
            value.to_uppercase()
        } else {
            value.to_string()
        };
        if let Some(pattern) = self.patterns.get(&attr.name)
            && !pattern.is_match(&candidate)
        {
            return Err(fail(attr.validation_message.clone()));
        }

        // the stored date must exist on the calendar, not just look like one
        if attr.data_type == DataType::Date
            && let Some(date) = FIRST_DATE.find(value)
            && NaiveDate::parse_from_str(date.as_str(), "%m-%d-%Y").is_err()
        {
            return Err(fail(attr.validation_message.clone()));
        }

        if attr.data_type.has_allowed_values()
            && !attr.allowed_values.is_empty()
            && !attr.allowed_values.iter().any(|v| v.eq_ignore_ascii_case(&candidate))
        {
            return Err(fail(format!(
                "Please select from: {}",
                attr.allowed_values.join(", ")
            )));
        }

        Ok(())
    }

    /// Normalise an accepted answer into the stored value.
    pub fn extract_value(&self, attr: &AttributeConfig, raw: &str) -> String {
        let value = raw.trim();
        match attr.data_type {
            DataType::Number => FIRST_NUMBER
                .find(value)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| value.to_string()),
            DataType::Date => FIRST_DATE
                .find(value)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| value.to_string()),
            DataType::Select | DataType::Currency => value.to_uppercase(),
            DataType::Text => value.to_string(),
        }
    }

    pub fn summary(&self) -> AttributeSummary {
        let required = self.required().count();
        AttributeSummary {
            total: self.attributes.len(),
            required,
            optional: self.attributes.len() - required,
            required_names: self.required_names(),
        }
    }

    /// Append an attribute. Names must be unique.
    pub fn add(&mut self, attr: AttributeConfig) -> Result<(), ConfigError> {
        if self.get(&attr.name).is_some() {
            return Err(ConfigError::DuplicateAttribute(attr.name));
        }
        if attr.min_length > attr.max_length {
            return Err(ConfigError::Other(format!(
                "{}: min_length {} exceeds max_length {}",
                attr.name, attr.min_length, attr.max_length
            )));
        }
        if let Some(re) = compile(&attr)? {
            self.patterns.insert(attr.name.clone(), re);
        }
        self.attributes.push(attr);
        Ok(())
    }

    /// Replace an existing attribute in place, keeping its position.
    pub fn update(&mut self, attr: AttributeConfig) -> Result<(), ConfigError> {
        let idx = self
            .attributes
            .iter()
            .position(|a| a.name == attr.name)
            .ok_or_else(|| ConfigError::UnknownAttribute(attr.name.clone()))?;
        match compile(&attr)? {
            Some(re) => {
                self.patterns.insert(attr.name.clone(), re);
            }
            None => {
                self.patterns.remove(&attr.name);
            }
        }
        self.attributes[idx] = attr;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != name);
        self.patterns.remove(name);
        self.attributes.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> AttributeTable {
        AttributeTable::default()
    }

    fn check(name: &str, value: &str) -> Result<(), String> {
        let t = table();
        let attr = t.get(name).unwrap();
        t.validate(attr, value).map_err(|e| e.message)
    }

    #[test]
    fn required_attributes_in_prompt_order() {
        assert_eq!(
            table().required_names(),
            vec![
                "CUSTOMER_NUMBER",
                "CONTRACT_NAME",
                "TITLE",
                "DESCRIPTION",
                "EFFECTIVE_DATE",
                "EXPIRATION_DATE"
            ]
        );
    }

    #[test]
    fn next_required_skips_completed() {
        let t = table();
        let done = vec!["CUSTOMER_NUMBER".to_string(), "CONTRACT_NAME".to_string()];
        assert_eq!(t.next_required(&done).unwrap().name, "TITLE");
        let all = t.required_names();
        assert!(t.next_required(&all).is_none());
    }

    #[test]
    fn customer_number_rules() {
        assert!(check("CUSTOMER_NUMBER", "12345").is_ok());
        assert_eq!(
            check("CUSTOMER_NUMBER", ""),
            Err("Please provide a value for Customer Account Number.".into())
        );
        assert_eq!(
            check("CUSTOMER_NUMBER", "12"),
            Err("Customer Account Number must be at least 4 characters.".into())
        );
        assert_eq!(
            check("CUSTOMER_NUMBER", "123456789"),
            Err("Customer Account Number must be no more than 8 characters.".into())
        );
        assert_eq!(
            check("CUSTOMER_NUMBER", "12ab"),
            Err("Please provide a valid customer account number (4-8 digits).".into())
        );
    }

    #[test]
    fn pattern_must_match_whole_value() {
        assert!(check("CONTRACT_NAME", "Boeing Support 2025").is_ok());
        assert!(check("CONTRACT_NAME", "Boeing; drop table").is_err());
        assert!(check("EFFECTIVE_DATE", "01-15-2025").is_ok());
        assert!(check("EFFECTIVE_DATE", "2025-01-15").is_err());
    }

    #[test]
    fn dates_must_exist_on_the_calendar() {
        assert_eq!(
            check("EFFECTIVE_DATE", "13-45-2025"),
            Err("Please provide a valid date in MM-DD-YYYY format.".into())
        );
        assert!(check("EXPIRATION_DATE", "02-30-2026").is_err());
        assert!(check("EXPIRATION_DATE", "02-29-2028").is_ok());
        assert!(check("EFFECTIVE_DATE", "01-15-2025").is_ok());
    }

    #[test]
    fn optional_empty_is_accepted() {
        assert!(check("CURRENCY", "").is_ok());
        assert!(check("CONTRACT_TYPE", "  ").is_ok());
    }

    #[test]
    fn select_values_compare_uppercase() {
        assert!(check("CONTRACT_TYPE", "service").is_ok());
        assert_eq!(
            check("CONTRACT_TYPE", "barter"),
            Err("Please select from: SERVICE, SUPPLY, LICENSE, MAINTENANCE, SUPPORT".into())
        );
        assert!(check("CURRENCY", "usd").is_ok());
        assert!(check("CURRENCY", "XYZ").is_err());
    }

    #[test]
    fn extraction_by_data_type() {
        let t = table();
        let get = |n: &str| t.get(n).unwrap().clone();
        assert_eq!(t.extract_value(&get("CUSTOMER_NUMBER"), " 12345 "), "12345");
        assert_eq!(
            t.extract_value(&get("EFFECTIVE_DATE"), "01-15-2025"),
            "01-15-2025"
        );
        assert_eq!(t.extract_value(&get("CURRENCY"), "eur"), "EUR");
        assert_eq!(t.extract_value(&get("TITLE"), "  Annual Support  "), "Annual Support");
    }

    #[test]
    fn summary_counts() {
        let s = table().summary();
        assert_eq!(s.total, 9);
        assert_eq!(s.required, 6);
        assert_eq!(s.optional, 3);
        assert!(s.to_string().contains("CUSTOMER_NUMBER -> CONTRACT_NAME"));
    }

    #[test]
    fn add_update_remove() {
        let mut t = table();
        let mut extra = t.get("PAYMENT_TERMS").unwrap().clone();
        assert!(matches!(
            t.add(extra.clone()),
            Err(ConfigError::DuplicateAttribute(_))
        ));

        extra.required = true;
        t.update(extra).unwrap();
        assert_eq!(t.required_names().last().map(String::as_str), Some("PAYMENT_TERMS"));

        assert!(t.remove("PAYMENT_TERMS"));
        assert!(!t.remove("PAYMENT_TERMS"));
        assert!(t.get("PAYMENT_TERMS").is_none());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut attr = table().get("TITLE").unwrap().clone();
        attr.name = "BROKEN".into();
        attr.validation_pattern = Some("[unclosed".into());
        let err = AttributeTable::new(vec![attr]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
