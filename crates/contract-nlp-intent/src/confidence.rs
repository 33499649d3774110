//! Five-factor confidence scoring.
//!
//! Each factor is a heuristic in `[0, 1]` read off the corrected input:
//! entity extraction, query-type consistency, action appropriateness,
//! display-field relevance and an error penalty. The overall score is their
//! mean.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use contract_nlp_core::{
    BaseAction, ColumnRegistry, ExtractedEntity, QueryType, Table, ValidationIssue,
};

static CONTRACT_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{6}\b").unwrap());
static PART_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{2}\d{3,5}\b").unwrap());
static CUSTOMER_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,8}\b").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Score below which a factor earns a recommendation.
const WEAK: f64 = 0.6;

/// Per-factor scores and their mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    pub overall: f64,
    pub entity: f64,
    pub query_type: f64,
    pub action: f64,
    pub fields: f64,
    pub errors: f64,
}

impl ConfidenceBreakdown {
    fn new(entity: f64, query_type: f64, action: f64, fields: f64, errors: f64) -> Self {
        let factors = [entity, query_type, action, fields, errors].map(|f| f.clamp(0.0, 1.0));
        Self {
            overall: factors.iter().sum::<f64>() / factors.len() as f64,
            entity: factors[0],
            query_type: factors[1],
            action: factors[2],
            fields: factors[3],
            errors: factors[4],
        }
    }

    pub fn recommendations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.entity < WEAK {
            out.push("Consider providing more specific entity information");
        }
        if self.query_type < WEAK {
            out.push("Query type may not match your intent - try rephrasing");
        }
        if self.action < WEAK {
            out.push("Action type may be incorrect - be more specific about what you want");
        }
        if self.fields < WEAK {
            out.push("Display fields may not match your needs - specify required fields");
        }
        if self.errors < 1.0 {
            out.push("There are validation errors - check your input format");
        }
        out
    }

    /// Multi-line percentage report with recommendations.
    pub fn report(&self) -> String {
        let mut out = format!("Overall confidence: {:.1}%\n", self.overall * 100.0);
        for (label, value) in [
            ("Entity extraction", self.entity),
            ("Query type match", self.query_type),
            ("Action appropriateness", self.action),
            ("Field relevance", self.fields),
            ("Error penalty", self.errors),
        ] {
            out.push_str(&format!("  {label}: {:.1}%\n", value * 100.0));
        }
        let recs = self.recommendations();
        if !recs.is_empty() {
            out.push_str("Recommendations:\n");
            for r in recs {
                out.push_str(&format!("  - {r}\n"));
            }
        }
        out
    }
}

impl fmt::Display for ConfidenceBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "overall={:.2} entities={:.2} type={:.2} action={:.2} fields={:.2} errors={:.2}",
            self.overall, self.entity, self.query_type, self.action, self.fields, self.errors
        )
    }
}

/// What a scored interpretation looks like, borrowed from the caller.
pub struct Interpretation<'a> {
    pub query_type: QueryType,
    pub action: BaseAction,
    pub rendered_action: &'a str,
    pub entities: &'a [ExtractedEntity],
    pub display_fields: &'a [String],
    pub issues: &'a [ValidationIssue],
}

pub struct ConfidenceCalculator {
    registry: Arc<dyn ColumnRegistry>,
}

impl ConfidenceCalculator {
    pub fn new(registry: Arc<dyn ColumnRegistry>) -> Self {
        Self { registry }
    }

    pub fn breakdown(&self, input: &str, interp: &Interpretation<'_>) -> ConfidenceBreakdown {
        if input.trim().is_empty() {
            return ConfidenceBreakdown::new(0.0, 0.0, 0.0, 0.0, 0.0);
        }
        let lower = input.to_lowercase();
        ConfidenceBreakdown::new(
            entity_confidence(input, &lower, interp.entities),
            type_consistency(&lower, interp.query_type),
            action_appropriateness(input, &lower, interp),
            self.field_relevance(input, &lower, interp.display_fields),
            if interp.issues.is_empty() { 1.0 } else { 0.5 },
        )
    }

    pub fn score(&self, input: &str, interp: &Interpretation<'_>) -> f64 {
        self.breakdown(input, interp).overall
    }

    fn field_relevance(&self, input: &str, lower: &str, fields: &[String]) -> f64 {
        if fields.is_empty() {
            return 0.2;
        }
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        let relevant = fields
            .iter()
            .filter(|field| match field.as_str() {
                "AWARD_NUMBER" | "CONTRACT_NUMBER" | "LOADED_CP_NUMBER" | "CONTRACT_NO" => {
                    has(&["contract", "award"]) || CONTRACT_NUMBER.is_match(input)
                }
                "CUSTOMER_NAME" | "CUSTOMER_NUMBER" | "ACCOUNT_NUMBER" => {
                    has(&["customer", "account", "client"])
                }
                "PART_NUMBER" | "INVOICE_PART_NUMBER" => has(&["part", "component"]),
                "CREATE_DATE" | "EFFECTIVE_DATE" | "EXPIRATION_DATE" => {
                    has(&["date", "created", "effective", "expir", "year", "month"])
                        || YEAR.is_match(input)
                }
                "STATUS" => has(&["status", "active", "expired", "failed"]),
                "PROJECT_TYPE" => has(&["project", "type"]),
                "CREATED_BY" => has(&["created by", "author", "who"]),
                "PRICE_LIST" | "PRICE" => has(&["price", "cost", "financial"]),
                other => Table::ALL
                    .iter()
                    .any(|t| self.registry.is_valid_column(*t, other)),
            })
            .count();

        match relevant as f64 / fields.len() as f64 {
            r if r < 0.3 => 0.2,
            r if r < 0.5 => 0.5,
            r if r < 0.7 => 0.7,
            _ => 0.9,
        }
    }
}

fn entity_confidence(input: &str, lower: &str, entities: &[ExtractedEntity]) -> f64 {
    if entities.is_empty() {
        return 0.2;
    }
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let total: f64 = entities
        .iter()
        .map(|e| match e.attribute.as_str() {
            "AWARD_NUMBER" | "CONTRACT_NUMBER" | "LOADED_CP_NUMBER" | "CONTRACT_NO" => {
                if CONTRACT_NUMBER.is_match(input) {
                    0.9
                } else if has(&["contract"]) {
                    0.7
                } else {
                    0.0
                }
            }
            "PART_NUMBER" | "INVOICE_PART_NUMBER" => {
                if PART_NUMBER.is_match(input) {
                    0.9
                } else if has(&["part"]) {
                    0.7
                } else {
                    0.0
                }
            }
            "CUSTOMER_NUMBER" => {
                if CUSTOMER_NUMBER.is_match(input) {
                    0.9
                } else if has(&["customer", "account"]) {
                    0.7
                } else {
                    0.0
                }
            }
            "CUSTOMER_NAME" => {
                if input.contains(['"', '\'']) {
                    0.8
                } else if has(&["customer", "account"]) {
                    0.6
                } else {
                    0.0
                }
            }
            "CREATE_DATE" | "EFFECTIVE_DATE" | "EXPIRATION_DATE" => {
                if YEAR.is_match(input) {
                    0.8
                } else if has(&["date", "created", "month", "year", "recent", "latest", "older"]) {
                    0.6
                } else {
                    0.0
                }
            }
            "STATUS" => {
                if has(&["active", "expired", "failed", "status", "error"]) {
                    0.7
                } else {
                    0.0
                }
            }
            "CREATED_BY" => {
                if has(&["created by"]) {
                    0.85
                } else {
                    0.5
                }
            }
            _ => 0.5,
        })
        .sum();
    (total / entities.len() as f64).min(1.0)
}

fn type_consistency(lower: &str, query_type: QueryType) -> f64 {
    let has = |w: &str| lower.contains(w);
    match query_type {
        QueryType::Contracts => {
            if has("contract") || has("award") {
                0.9
            } else if has("customer") || has("account") {
                0.7
            } else {
                0.4
            }
        }
        QueryType::Parts => {
            if has("part") || has("component") {
                0.9
            } else {
                0.3
            }
        }
        QueryType::FailedParts => {
            if has("failed") && has("part") {
                0.95
            } else if has("failed") || has("error") {
                0.7
            } else {
                0.2
            }
        }
        QueryType::Customers => {
            if has("customer") || has("account") || has("client") {
                0.9
            } else {
                0.4
            }
        }
        QueryType::Help => {
            if has("contract") {
                0.9
            } else if has("help") || has("how") {
                0.7
            } else {
                0.5
            }
        }
    }
}

fn action_appropriateness(input: &str, lower: &str, interp: &Interpretation<'_>) -> f64 {
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let rendered = interp.rendered_action;
    if rendered.ends_with("_metadata") || rendered.contains("_metadata_") {
        return if has(&["metadata", "all information", "get all"]) { 0.9 } else { 0.4 };
    }
    if rendered.ends_with("_summary") {
        return if has(&["summary", "overview"]) { 0.9 } else { 0.5 };
    }
    if rendered.contains("_detailed") {
        return if has(&["detail", "full information"]) { 0.9 } else { 0.5 };
    }
    match interp.action {
        BaseAction::ContractsByContractNumber => {
            if CONTRACT_NUMBER.is_match(input) {
                0.95
            } else {
                0.3
            }
        }
        BaseAction::ContractsByUser => {
            if has(&["created by"]) {
                0.9
            } else {
                0.4
            }
        }
        BaseAction::FailedPartsByPartNumber | BaseAction::FailedPartsByContractNumber => {
            if has(&["failed", "error"]) && has(&["part"]) {
                0.95
            } else {
                0.3
            }
        }
        BaseAction::PartsByPartNumber => {
            if PART_NUMBER.is_match(input) {
                0.9
            } else {
                0.4
            }
        }
        BaseAction::CustomersByNumber | BaseAction::CustomersByName | BaseAction::CustomersByFilter => {
            if has(&["customer", "account", "client"]) {
                0.8
            } else {
                0.4
            }
        }
        BaseAction::HelpCreateUser | BaseAction::HelpCreateBot | BaseAction::CreateContract => {
            if has(&["contract"]) {
                0.85
            } else {
                0.6
            }
        }
        BaseAction::ContractsByFilter | BaseAction::PartsByContractNumber | BaseAction::PartsByFilter => {
            if has(&["show", "display", "list", "get", "retrieve", "fetch", "find"]) {
                0.8
            } else {
                0.6
            }
        }
    }
}
