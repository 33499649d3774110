//! Query-type and action classification.
//!
//! The pipeline for one utterance is normalize, extract, then three rule
//! tables: routing (which table family, or creation), the family's base
//! action, and for creation requests the creation intent. Modifiers are
//! orthogonal and apply to every action.

use std::sync::{Arc, LazyLock};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

use contract_nlp_core::{
    ActionModifier, ActionType, BaseAction, ColumnRegistry, Correction, ExtractedEntity, Header,
    QueryClassification, QueryType, TextNormalizer, ValidationIssue,
};
use contract_nlp_extract::extract_at;

use crate::confidence::{ConfidenceBreakdown, ConfidenceCalculator, Interpretation};
use crate::fields::{default_fields, primary_identifier, push_unique, table_for};
use crate::rules::{Rule, RuleTable};
use crate::signals::Signals;

/// Everything the front end knows about one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub original_input: String,
    pub corrected_input: String,
    pub corrections: Vec<Correction>,
    pub classification: QueryClassification,
    pub entities: Vec<ExtractedEntity>,
    pub header: Header,
    pub display_fields: Vec<String>,
    pub issues: Vec<ValidationIssue>,
    pub confidence: ConfidenceBreakdown,
    /// Weighted feature score, set by the enhancer.
    pub feature_score: Option<f64>,
}

impl QueryResult {
    pub fn query_type(&self) -> QueryType {
        self.classification.query_type
    }

    pub fn base_action(&self) -> BaseAction {
        self.classification.action_type.base
    }

    /// `HELP_CONTRACT_CREATE_BOT`: the caller should start slot-filling.
    pub fn starts_creation_workflow(&self) -> bool {
        self.base_action() == BaseAction::HelpCreateBot
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }
}

// ── Rule tables ──

/// Outcome of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Family(QueryType),
    Creation,
}

/// How a creation request should be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationIntent {
    /// Explain the steps.
    HelpUser,
    /// Collect the fields through the workflow.
    HelpBot,
    /// Enough is present to create directly.
    DirectCreate,
}

impl CreationIntent {
    pub fn route(&self) -> (QueryType, BaseAction) {
        match self {
            Self::HelpUser => (QueryType::Help, BaseAction::HelpCreateUser),
            Self::HelpBot => (QueryType::Help, BaseAction::HelpCreateBot),
            Self::DirectCreate => (QueryType::Contracts, BaseAction::CreateContract),
        }
    }
}

static ROUTES: LazyLock<RuleTable<Signals, Route>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new("created_by", 70, |s: &Signals| s.created_by, Route::Family(QueryType::Contracts)),
        Rule::new("creation_intent", 60, Signals::is_creation, Route::Creation),
        Rule::new(
            "failed_parts",
            50,
            |s: &Signals| s.failed_term && (s.part_term || s.has_part_number()),
            Route::Family(QueryType::FailedParts),
        ),
        Rule::new(
            "parts",
            40,
            |s: &Signals| s.part_term || s.has_part_number(),
            Route::Family(QueryType::Parts),
        ),
        Rule::new(
            "contracts",
            30,
            |s: &Signals| s.contract_term || s.has_contract_number(),
            Route::Family(QueryType::Contracts),
        ),
        Rule::new("customers", 20, |s: &Signals| s.customer_term, Route::Family(QueryType::Customers)),
        Rule::new("fallback", 0, |_: &Signals| true, Route::Family(QueryType::Contracts)),
    ])
});

static CREATION: LazyLock<RuleTable<Signals, CreationIntent>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new(
            "help_and_imperative",
            60,
            |s: &Signals| s.creation.is_some_and(|c| c.help && c.imperative),
            CreationIntent::HelpUser,
        ),
        Rule::new(
            "direct_create",
            50,
            |s: &Signals| {
                s.creation.is_some_and(|c| c.imperative)
                    && (s.has_customer_number() || (s.has_contract_number() && s.customer_term))
            },
            CreationIntent::DirectCreate,
        ),
        Rule::new(
            "single_verb",
            40,
            |s: &Signals| s.creation.is_some_and(|c| c.single_verb),
            CreationIntent::HelpBot,
        ),
        Rule::new(
            "single_ambiguous",
            35,
            |s: &Signals| s.creation.is_some_and(|c| c.single_ambiguous),
            CreationIntent::HelpUser,
        ),
        Rule::new(
            "help_cue",
            30,
            |s: &Signals| s.creation.is_some_and(|c| c.help),
            CreationIntent::HelpUser,
        ),
        Rule::new(
            "imperative_cue",
            20,
            |s: &Signals| s.creation.is_some_and(|c| c.imperative),
            CreationIntent::HelpBot,
        ),
        Rule::new("unclear", 0, |_: &Signals| true, CreationIntent::HelpUser),
    ])
});

static CONTRACT_ACTIONS: LazyLock<RuleTable<Signals, BaseAction>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new("created_by", 40, |s: &Signals| s.created_by, BaseAction::ContractsByUser),
        Rule::new(
            "created_filter",
            30,
            |s: &Signals| s.created_without_by,
            BaseAction::ContractsByFilter,
        ),
        Rule::new(
            "contract_number",
            20,
            Signals::has_contract_number,
            BaseAction::ContractsByContractNumber,
        ),
        Rule::new("filter", 0, |_: &Signals| true, BaseAction::ContractsByFilter),
    ])
});

static PART_ACTIONS: LazyLock<RuleTable<Signals, BaseAction>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new("part_number", 20, Signals::has_part_number, BaseAction::PartsByPartNumber),
        Rule::new(
            "contract_number",
            10,
            Signals::has_contract_number,
            BaseAction::PartsByContractNumber,
        ),
        Rule::new("filter", 0, |_: &Signals| true, BaseAction::PartsByFilter),
    ])
});

static FAILED_PART_ACTIONS: LazyLock<RuleTable<Signals, BaseAction>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new(
            "part_number",
            20,
            Signals::has_part_number,
            BaseAction::FailedPartsByPartNumber,
        ),
        Rule::new("contract", 0, |_: &Signals| true, BaseAction::FailedPartsByContractNumber),
    ])
});

static CUSTOMER_ACTIONS: LazyLock<RuleTable<Signals, BaseAction>> = LazyLock::new(|| {
    RuleTable::new(vec![
        Rule::new("number", 20, Signals::has_customer_number, BaseAction::CustomersByNumber),
        Rule::new("name", 10, Signals::has_customer_name, BaseAction::CustomersByName),
        Rule::new("filter", 0, |_: &Signals| true, BaseAction::CustomersByFilter),
    ])
});

fn family_actions(query_type: QueryType) -> Option<&'static RuleTable<Signals, BaseAction>> {
    match query_type {
        QueryType::Contracts => Some(&*CONTRACT_ACTIONS),
        QueryType::Parts => Some(&*PART_ACTIONS),
        QueryType::FailedParts => Some(&*FAILED_PART_ACTIONS),
        QueryType::Customers => Some(&*CUSTOMER_ACTIONS),
        QueryType::Help => None,
    }
}

fn modifiers(signals: &Signals) -> Vec<ActionModifier> {
    let mut out = Vec::new();
    if signals.has_lemma(&["metadata"]) || signals.has_phrase("all information") {
        out.push(ActionModifier::Metadata);
    }
    if signals.has_lemma(&["detail"]) {
        out.push(ActionModifier::Detailed);
    }
    if signals.has_lemma(&["summary"]) {
        out.push(ActionModifier::Summary);
    }
    out
}

// ── Classifier ──

/// Stateless classifier; cheap to share behind an `Arc`.
pub struct IntentClassifier {
    normalizer: TextNormalizer,
    registry: Arc<dyn ColumnRegistry>,
    confidence: ConfidenceCalculator,
}

impl IntentClassifier {
    pub fn new(normalizer: TextNormalizer, registry: Arc<dyn ColumnRegistry>) -> Self {
        let confidence = ConfidenceCalculator::new(Arc::clone(&registry));
        Self {
            normalizer,
            registry,
            confidence,
        }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn registry(&self) -> &Arc<dyn ColumnRegistry> {
        &self.registry
    }

    pub fn classify(&self, text: &str) -> QueryResult {
        self.classify_at(text, Local::now().date_naive())
    }

    /// Classify with a fixed `today` for relative dates.
    pub fn classify_at(&self, text: &str, today: NaiveDate) -> QueryResult {
        let normalized = self.normalizer.normalize(text);
        let extraction = extract_at(&normalized.corrected, today);

        if extraction.has_errors() {
            let classification = QueryClassification::new(
                QueryType::Contracts,
                ActionType::new(BaseAction::ContractsByFilter),
                0.0,
            );
            return QueryResult {
                original_input: normalized.original,
                corrected_input: normalized.corrected,
                corrections: normalized.corrections,
                classification,
                entities: Vec::new(),
                header: Header::default(),
                display_fields: Vec::new(),
                issues: extraction.issues,
                confidence: self.confidence.breakdown("", &empty_interpretation()),
                feature_score: None,
            };
        }

        let signals = Signals::build(&normalized.corrected, &extraction, self.normalizer.lemmatizer());
        let (route_rule, route) = ROUTES
            .evaluate(&signals)
            .unwrap_or(("fallback", Route::Family(QueryType::Contracts)));
        let (rule, query_type, base) = match route {
            Route::Creation => {
                let (rule, intent) = CREATION
                    .evaluate(&signals)
                    .unwrap_or(("unclear", CreationIntent::HelpUser));
                let (qt, base) = intent.route();
                (rule, qt, base)
            }
            Route::Family(qt) => {
                let (rule, base) = family_actions(qt)
                    .and_then(|t| t.evaluate(&signals))
                    .unwrap_or((route_rule, BaseAction::ContractsByFilter));
                (rule, qt, base)
            }
        };

        let action_type = modifiers(&signals)
            .into_iter()
            .fold(ActionType::new(base), ActionType::with_modifier);

        let table = table_for(query_type);
        let entities: Vec<ExtractedEntity> = extraction
            .entities
            .into_iter()
            .filter(|e| {
                !(query_type == QueryType::FailedParts && e.attribute == "STATUS" && e.value == "FAILED")
            })
            .map(|mut e| {
                e.attribute = table.filter_column(&e.attribute).to_string();
                e
            })
            .collect();

        let display_fields = self.display_fields(query_type, &normalized.corrected, &entities);
        let issues = missing_identifier(query_type, base, &extraction.header, &entities);

        let rendered = action_type.to_string();
        let confidence = self.confidence.breakdown(
            &normalized.corrected,
            &Interpretation {
                query_type,
                action: base,
                rendered_action: &rendered,
                entities: &entities,
                display_fields: &display_fields,
                issues: &issues,
            },
        );

        debug!(
            route = route_rule,
            rule,
            query_type = %query_type,
            action = %rendered,
            confidence = confidence.overall,
            "classified"
        );

        QueryResult {
            original_input: normalized.original,
            corrected_input: normalized.corrected,
            corrections: normalized.corrections,
            classification: QueryClassification::new(query_type, action_type, confidence.overall),
            entities,
            header: extraction.header,
            display_fields,
            issues,
            confidence,
            feature_score: None,
        }
    }

    /// Score an interpretation built elsewhere, e.g. after enhancement.
    pub fn rescore(&self, result: &QueryResult) -> ConfidenceBreakdown {
        let rendered = result.classification.action_type.to_string();
        self.confidence.breakdown(
            &result.corrected_input,
            &Interpretation {
                query_type: result.query_type(),
                action: result.base_action(),
                rendered_action: &rendered,
                entities: &result.entities,
                display_fields: &result.display_fields,
                issues: &result.issues,
            },
        )
    }

    /// Columns the user asked for, else the query type's defaults.
    ///
    /// Columns already used as filters are not repeated as requested
    /// columns.
    fn display_fields(
        &self,
        query_type: QueryType,
        text: &str,
        entities: &[ExtractedEntity],
    ) -> Vec<String> {
        let requested: Vec<String> = if query_type == QueryType::Help {
            Vec::new()
        } else {
            self.registry
                .columns_mentioned(table_for(query_type), text)
                .into_iter()
                .filter(|c| !entities.iter().any(|e| e.attribute == *c))
                .collect()
        };

        if requested.is_empty() {
            return default_fields(query_type).iter().map(|f| f.to_string()).collect();
        }
        let mut fields = Vec::with_capacity(requested.len() + 1);
        if let Some(primary) = primary_identifier(query_type) {
            push_unique(&mut fields, primary);
        }
        for column in &requested {
            push_unique(&mut fields, column);
        }
        fields
    }
}

fn empty_interpretation() -> Interpretation<'static> {
    Interpretation {
        query_type: QueryType::Contracts,
        action: BaseAction::ContractsByFilter,
        rendered_action: "contracts_by_filter",
        entities: &[],
        display_fields: &[],
        issues: &[],
    }
}

fn missing_identifier(
    query_type: QueryType,
    base: BaseAction,
    header: &Header,
    entities: &[ExtractedEntity],
) -> Vec<ValidationIssue> {
    const CODE: &str = "MISSING_IDENTIFIER";
    if base.is_creation() {
        return Vec::new();
    }
    let issue = match query_type {
        QueryType::Parts | QueryType::FailedParts
            if header.part_number.is_none() && header.contract_number.is_none() =>
        {
            Some("Please provide a contract number or part number")
        }
        QueryType::Customers
            if header.customer_number.is_none() && header.customer_name.is_none() =>
        {
            Some("Please provide a customer number or customer name")
        }
        QueryType::Contracts if !header.has_identifier() && entities.is_empty() => {
            Some("Please provide a contract number, customer, creator or date filter")
        }
        _ => None,
    };
    issue
        .map(|message| vec![ValidationIssue::warning(CODE, message)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_nlp_core::{Operation, StaticColumnRegistry};
    use pretty_assertions::assert_eq;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(TextNormalizer::new(), Arc::new(StaticColumnRegistry))
    }

    fn classify(text: &str) -> QueryResult {
        classifier().classify_at(text, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    fn label(r: &QueryResult) -> (QueryType, String) {
        (r.query_type(), r.classification.action_type.to_string())
    }

    #[test]
    fn how_to_question_is_user_help() {
        let r = classify("How do I create a contract?");
        assert_eq!(label(&r), (QueryType::Help, "HELP_CONTRACT_CREATE_USER".into()));
        assert!(r.issues.is_empty());
        assert_eq!(r.display_fields, default_fields(QueryType::Help));
    }

    #[test]
    fn bare_command_starts_bot_workflow() {
        let r = classify("create contract");
        assert_eq!(label(&r), (QueryType::Help, "HELP_CONTRACT_CREATE_BOT".into()));
        assert!(r.starts_creation_workflow());
        assert!(classify("create").starts_creation_workflow());
    }

    #[test]
    fn help_and_request_together_mean_user_help() {
        let r = classify("can you show me how to create a contract");
        assert_eq!(r.base_action(), BaseAction::HelpCreateUser);
    }

    #[test]
    fn asking_for_help_never_starts_the_workflow() {
        for text in [
            "I need help creating a contract",
            "please help me with a new contract",
            "need help understanding contract creation",
        ] {
            let r = classify(text);
            assert_eq!(r.base_action(), BaseAction::HelpCreateUser, "{text}");
            assert!(!r.starts_creation_workflow(), "{text}");
        }
    }

    #[test]
    fn lone_ambiguous_word_asks_instead_of_acting() {
        for word in ["new", "start", "setup"] {
            let r = classify(word);
            assert_eq!(r.base_action(), BaseAction::HelpCreateUser, "{word}");
            assert!(!r.starts_creation_workflow(), "{word}");
        }
        assert_eq!(classify("create").base_action(), BaseAction::HelpCreateBot);
    }

    #[test]
    fn imperative_with_account_creates_directly() {
        let r = classify("create contract for account 45678 named Falcon Supply");
        assert_eq!(label(&r), (QueryType::Contracts, "create_contract".into()));
        assert!(r.issues.is_empty());
    }

    #[test]
    fn created_by_always_wins() {
        let r = classify("contracts created by vinod and in 2025");
        assert_eq!(label(&r), (QueryType::Contracts, "contracts_by_user".into()));
        assert_eq!(r.header.created_by.as_deref(), Some("Vinod"));
        let year = r.entities.iter().find(|e| e.attribute == "CREATE_DATE").unwrap();
        assert_eq!((year.operation, year.value.as_str()), (Operation::InYear, "2025"));

        let r = classify("contract 123456 created by vinod");
        assert_eq!(r.base_action(), BaseAction::ContractsByUser);
    }

    #[test]
    fn contract_family_cascade() {
        assert_eq!(
            classify("show contract 123456").base_action(),
            BaseAction::ContractsByContractNumber
        );
        assert_eq!(
            classify("contracts created in 2024").base_action(),
            BaseAction::ContractsByFilter
        );
        assert_eq!(
            classify("show expired contracts").base_action(),
            BaseAction::ContractsByFilter
        );
    }

    #[test]
    fn parts_use_parts_columns() {
        let r = classify("show parts for contract 123456");
        assert_eq!(label(&r), (QueryType::Parts, "parts_by_contract_number".into()));
        assert_eq!(r.entities[0].attribute, "LOADED_CP_NUMBER");

        let r = classify("price and lead time for AB12345");
        assert_eq!(r.base_action(), BaseAction::PartsByPartNumber);
        assert_eq!(r.entities[0].attribute, "INVOICE_PART_NUMBER");
        assert_eq!(r.display_fields, ["INVOICE_PART_NUMBER", "PRICE", "LEAD_TIME"]);

        let r = classify("show parts for contract 123456 in 2025");
        let year = r.entities.iter().find(|e| e.value == "2025").unwrap();
        assert_eq!(year.attribute, "CREATION_DATE");
    }

    #[test]
    fn failed_parts_drop_the_redundant_status() {
        let r = classify("failed parts for contract 123456");
        assert_eq!(
            label(&r),
            (QueryType::FailedParts, "parts_failed_by_contract_number".into())
        );
        assert_eq!(r.entities.len(), 1);
        assert_eq!(r.entities[0].attribute, "CONTRACT_NO");
    }

    #[test]
    fn customer_family() {
        assert_eq!(classify("customer 45678").base_action(), BaseAction::CustomersByNumber);
        assert_eq!(
            classify("customer name is Honeywell").base_action(),
            BaseAction::CustomersByName
        );
        let r = classify("list all customers");
        assert_eq!(r.base_action(), BaseAction::CustomersByFilter);
        assert_eq!(r.issues[0].message, "Please provide a customer number or customer name");
    }

    #[test]
    fn modifiers_combine_in_fixed_order() {
        let r = classify("show contract 123456 metadata");
        assert_eq!(
            r.classification.action_type.to_string(),
            "contracts_by_contractnumber_metadata"
        );
        let r = classify("summary and details of contract 123456");
        assert_eq!(
            r.classification.action_type.to_string(),
            "contracts_by_contractnumber_detailed_summary"
        );
    }

    #[test]
    fn missing_identifier_warning() {
        let r = classify("show contracts");
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].code, "MISSING_IDENTIFIER");
        assert!(r.classification.confidence < 0.9);
    }

    #[test]
    fn requested_columns_lead_with_the_identifier() {
        let r = classify("effective date and status of contract 123456");
        assert_eq!(r.display_fields, ["AWARD_NUMBER", "EFFECTIVE_DATE", "STATUS"]);
    }

    #[test]
    fn empty_input_is_an_error_result() {
        let r = classify("");
        assert!(r.has_errors());
        assert_eq!(r.classification.confidence, 0.0);
    }

    #[test]
    fn confidence_is_always_in_range() {
        for text in ["show contract 123456", "xyz", "create contract", "failed parts"] {
            let c = classify(text).classification.confidence;
            assert!((0.0..=1.0).contains(&c), "{text}: {c}");
        }
    }
}
