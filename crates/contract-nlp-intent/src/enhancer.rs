//! Post-classification enhancement and the feedback-weighted feature table.
//!
//! [`Enhancer::enhance`] adds contextual filters ("recent", "expired"),
//! widens the display columns from named field groups, back-fills the
//! header, re-checks the result and re-scores it. Feature weights start
//! from fixed values and drift with user ratings fed through
//! [`Enhancer::add_training_example`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use contract_nlp_core::{
    ColumnRegistry, EntitySource, ExtractedEntity, FeedbackConfig, Header, Lemmatizer, Operation,
    QueryClassification, QueryType, SpellCorrector, ValidationIssue, merge_entities,
};

use crate::classifier::QueryResult;
use crate::confidence::{ConfidenceCalculator, Interpretation};
use crate::fields::{matching_group, primary_identifier, push_unique, table_for};

static SIX_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{6}\b").unwrap());
static SEVEN_PLUS_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{7,8}\b").unwrap());
static PART_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\d{3}").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Oldest examples are dropped beyond this.
const MAX_HISTORY: usize = 1000;

const MULTIPLE_CONTRACTS: &str = "Multiple contract numbers detected - please specify one contract";

// ── Features ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ContractNumberPresent,
    CustomerInfoPresent,
    PartNumberPresent,
    DateRangePresent,
    StatusKeywordPresent,
    ActionVerbPresent,
    SpellingErrorsCorrected,
    BusinessRuleMatch,
    IntentClarity,
    EntityConsistency,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::ContractNumberPresent,
        Feature::CustomerInfoPresent,
        Feature::PartNumberPresent,
        Feature::DateRangePresent,
        Feature::StatusKeywordPresent,
        Feature::ActionVerbPresent,
        Feature::SpellingErrorsCorrected,
        Feature::BusinessRuleMatch,
        Feature::IntentClarity,
        Feature::EntityConsistency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractNumberPresent => "contract_number_present",
            Self::CustomerInfoPresent => "customer_info_present",
            Self::PartNumberPresent => "part_number_present",
            Self::DateRangePresent => "date_range_present",
            Self::StatusKeywordPresent => "status_keyword_present",
            Self::ActionVerbPresent => "action_verb_present",
            Self::SpellingErrorsCorrected => "spelling_errors_corrected",
            Self::BusinessRuleMatch => "business_rule_match",
            Self::IntentClarity => "intent_clarity",
            Self::EntityConsistency => "entity_consistency",
        }
    }

    pub fn initial_weight(&self) -> f64 {
        match self {
            Self::ContractNumberPresent => 0.95,
            Self::CustomerInfoPresent => 0.85,
            Self::PartNumberPresent => 0.90,
            Self::DateRangePresent => 0.75,
            Self::StatusKeywordPresent => 0.70,
            Self::ActionVerbPresent => 0.60,
            Self::SpellingErrorsCorrected => 0.40,
            Self::BusinessRuleMatch => 0.90,
            Self::IntentClarity => 0.80,
            Self::EntityConsistency => 0.85,
        }
    }
}

/// Features readable from raw input alone; only these are trained.
pub fn input_features(input: &str, spell: &SpellCorrector) -> Vec<Feature> {
    let lower = input.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let mut out = Vec::new();
    if SIX_DIGITS.is_match(input) || has(&["contract", "award"]) {
        out.push(Feature::ContractNumberPresent);
    }
    if has(&["customer", "account"]) || SEVEN_PLUS_DIGITS.is_match(input) {
        out.push(Feature::CustomerInfoPresent);
    }
    if PART_CODE.is_match(&input.to_uppercase()) || has(&["part"]) {
        out.push(Feature::PartNumberPresent);
    }
    if YEAR.is_match(input) || has(&["date", "created", "year", "month"]) {
        out.push(Feature::DateRangePresent);
    }
    if has(&["active", "expired", "failed", "status"]) {
        out.push(Feature::StatusKeywordPresent);
    }
    if has(&["show", "get", "find", "list", "display", "search", "retrieve"]) {
        out.push(Feature::ActionVerbPresent);
    }
    if spell.correct(input) != input {
        out.push(Feature::SpellingErrorsCorrected);
    }
    out
}

// ── Learning state ──

/// A rated interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
    pub input: String,
    pub expected: Option<QueryClassification>,
    pub actual: Option<QueryClassification>,
    /// User rating; clamped to `[0, 1]` when applied.
    pub rating: f64,
    features: Vec<Feature>,
}

#[derive(Debug)]
struct LearningState {
    weights: BTreeMap<Feature, f64>,
    history: VecDeque<TrainingExample>,
    seen: usize,
}

impl LearningState {
    fn new() -> Self {
        Self {
            weights: Feature::ALL.iter().map(|f| (*f, f.initial_weight())).collect(),
            history: VecDeque::new(),
            seen: 0,
        }
    }

    fn retrain(&mut self, window: usize, learning_rate: f64) {
        let skip = self.history.len().saturating_sub(window);
        for example in self.history.iter().skip(skip) {
            let nudge = learning_rate * (example.rating.clamp(0.0, 1.0) - 0.5);
            for feature in &example.features {
                if let Some(w) = self.weights.get_mut(feature) {
                    *w = (*w + nudge).clamp(0.0, 1.0);
                }
            }
        }

        let baseline: f64 = Feature::ALL.iter().map(Feature::initial_weight).sum();
        let total: f64 = self.weights.values().sum();
        if total > 0.0 {
            for w in self.weights.values_mut() {
                *w = (*w / total * baseline).clamp(0.0, 1.0);
            }
        }
    }
}

// ── Enhancer ──

pub struct Enhancer {
    registry: Arc<dyn ColumnRegistry>,
    spell: SpellCorrector,
    lemmatizer: Lemmatizer,
    confidence: ConfidenceCalculator,
    feedback: FeedbackConfig,
    state: Mutex<LearningState>,
}

impl Enhancer {
    pub fn new(
        registry: Arc<dyn ColumnRegistry>,
        spell: SpellCorrector,
        lemmatizer: Lemmatizer,
        feedback: FeedbackConfig,
    ) -> Self {
        let confidence = ConfidenceCalculator::new(Arc::clone(&registry));
        Self {
            registry,
            spell,
            lemmatizer,
            confidence,
            feedback,
            state: Mutex::new(LearningState::new()),
        }
    }

    pub fn enhance(&self, text: &str, base: QueryResult) -> QueryResult {
        let mut result = base;
        let query_type = result.query_type();
        let corrected = if result.corrected_input.is_empty() {
            text.to_string()
        } else {
            result.corrected_input.clone()
        };
        let words = words(&corrected);

        if query_type != QueryType::Help && !result.has_errors() {
            let contextual = contextual_entities(&words, query_type);
            result.entities = merge_entities(std::mem::take(&mut result.entities), contextual);
            self.expand_display_fields(&mut result, &words);
            backfill_header(&mut result.header, &result.entities);
        }

        let contract_values: Vec<&str> = {
            let mut v: Vec<&str> = result
                .entities
                .iter()
                .filter(|e| is_contract_column(&e.attribute))
                .map(|e| e.value.as_str())
                .collect();
            v.sort_unstable();
            v.dedup();
            v
        };
        if contract_values.len() > 1 && !result.issues.iter().any(|i| i.message == MULTIPLE_CONTRACTS) {
            result
                .issues
                .push(ValidationIssue::warning("MULTIPLE_CONTRACTS", MULTIPLE_CONTRACTS));
        }

        let rendered = result.classification.action_type.to_string();
        let breakdown = self.confidence.breakdown(
            &corrected,
            &Interpretation {
                query_type,
                action: result.base_action(),
                rendered_action: &rendered,
                entities: &result.entities,
                display_fields: &result.display_fields,
                issues: &result.issues,
            },
        );
        result.confidence = breakdown;
        result.classification.confidence = breakdown.overall.clamp(0.0, 1.0);
        result.feature_score = Some(self.feature_score(&result));

        debug!(
            entities = result.entities.len(),
            fields = result.display_fields.len(),
            confidence = result.classification.confidence,
            "enhanced"
        );
        result
    }

    fn expand_display_fields(&self, result: &mut QueryResult, words: &[String]) {
        let table = table_for(result.query_type());
        let lemmas: Vec<String> = words.iter().map(|w| self.lemmatizer.lemmatize(w)).collect();
        if let Some(group) = matching_group(&lemmas) {
            for field in group.fields {
                if self.registry.is_valid_column(table, field) {
                    push_unique(&mut result.display_fields, field);
                }
            }
        }
        if let Some(primary) = primary_identifier(result.query_type()) {
            push_unique(&mut result.display_fields, primary);
        }
        for entity in &result.entities {
            push_unique(&mut result.display_fields, &entity.attribute);
        }
    }

    /// Share of total feature weight carried by the features `result` shows.
    pub fn feature_score(&self, result: &QueryResult) -> f64 {
        let mut present = input_features(&result.corrected_input, &self.spell);
        if !result.corrections.is_empty() && !present.contains(&Feature::SpellingErrorsCorrected) {
            present.push(Feature::SpellingErrorsCorrected);
        }
        if result
            .entities
            .iter()
            .any(|e| matches!(e.source, EntitySource::BusinessRule | EntitySource::Pattern))
        {
            present.push(Feature::BusinessRuleMatch);
        }
        if result.classification.confidence >= 0.7 {
            present.push(Feature::IntentClarity);
        }
        if result.issues.is_empty() {
            present.push(Feature::EntityConsistency);
        }

        let state = self.state.lock();
        let total: f64 = state.weights.values().sum();
        if total <= 0.0 {
            return 0.0;
        }
        let hit: f64 = present
            .iter()
            .filter_map(|f| state.weights.get(f))
            .sum();
        (hit / total).clamp(0.0, 1.0)
    }

    /// Record a rated interpretation; every `retrain_every` examples the
    /// weights are adjusted from the latest window.
    pub fn add_training_example(
        &self,
        input: &str,
        expected: Option<QueryClassification>,
        actual: Option<QueryClassification>,
        rating: f64,
    ) {
        let features = input_features(input, &self.spell);
        let every = self.feedback.retrain_every.max(1);
        let mut state = self.state.lock();
        state.history.push_back(TrainingExample {
            input: input.to_string(),
            expected,
            actual,
            rating,
            features,
        });
        if state.history.len() > MAX_HISTORY {
            state.history.pop_front();
        }
        state.seen += 1;
        if state.seen % every == 0 {
            state.retrain(every, self.feedback.learning_rate);
            info!(examples = state.seen, "retrained feature weights");
        }
    }

    pub fn feature_weights(&self) -> BTreeMap<Feature, f64> {
        self.state.lock().weights.clone()
    }

    pub fn training_examples(&self) -> usize {
        self.state.lock().seen
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_phrase(words: &[String], phrase: &str) -> bool {
    format!(" {} ", words.join(" ")).contains(&format!(" {phrase} "))
}

fn contextual_entities(words: &[String], query_type: QueryType) -> Vec<ExtractedEntity> {
    let has = |p: &str| has_phrase(words, p);
    let ml = |attr: &str, op: Operation, value: &str| {
        ExtractedEntity::new(attr, op, value, EntitySource::MlEnhancement)
    };
    let mut out = Vec::new();
    if has("last month") || has("previous month") {
        out.push(ml("CREATE_DATE", Operation::Gte, "LAST_MONTH"));
    }
    if has("recent") || has("latest") {
        out.push(ml("CREATE_DATE", Operation::Gte, "LAST_30_DAYS"));
    }
    if has("older") {
        out.push(ml("CREATE_DATE", Operation::Lte, "LAST_YEAR"));
    }
    if has("expired") || has("inactive") {
        out.push(ml("STATUS", Operation::Eq, "EXPIRED"));
    }
    if has("active") {
        out.push(ml("STATUS", Operation::Eq, "ACTIVE"));
    }
    if (has("failed") || has("error")) && query_type != QueryType::FailedParts {
        out.push(ml("STATUS", Operation::Eq, "FAILED"));
    }
    out
}

fn is_contract_column(attribute: &str) -> bool {
    matches!(
        attribute,
        "AWARD_NUMBER" | "CONTRACT_NUMBER" | "LOADED_CP_NUMBER" | "CONTRACT_NO"
    )
}

fn backfill_header(header: &mut Header, entities: &[ExtractedEntity]) {
    for e in entities.iter().filter(|e| e.operation == Operation::Eq) {
        let slot = match e.attribute.as_str() {
            a if is_contract_column(a) => &mut header.contract_number,
            "PART_NUMBER" | "INVOICE_PART_NUMBER" => &mut header.part_number,
            "CUSTOMER_NUMBER" => &mut header.customer_number,
            "CUSTOMER_NAME" => &mut header.customer_name,
            "CREATED_BY" => &mut header.created_by,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(e.value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::IntentClassifier;
    use chrono::NaiveDate;
    use contract_nlp_core::{StaticColumnRegistry, TextNormalizer};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn enhancer(feedback: FeedbackConfig) -> Enhancer {
        Enhancer::new(
            Arc::new(StaticColumnRegistry),
            SpellCorrector::new(),
            Lemmatizer::new(),
            feedback,
        )
    }

    fn run(text: &str) -> QueryResult {
        let classifier = IntentClassifier::new(TextNormalizer::new(), Arc::new(StaticColumnRegistry));
        let base = classifier.classify_at(text, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        enhancer(FeedbackConfig::default()).enhance(text, base)
    }

    #[test]
    fn recent_adds_a_contextual_date_filter() {
        let r = run("show recent contracts for customer 45678");
        let recent = r
            .entities
            .iter()
            .find(|e| e.value == "LAST_30_DAYS")
            .unwrap();
        assert_eq!(recent.attribute, "CREATE_DATE");
        assert_eq!(recent.operation, Operation::Gte);
        assert_eq!(recent.source, EntitySource::MlEnhancement);
        assert!(r.display_fields.contains(&"CREATE_DATE".to_string()));
    }

    #[test]
    fn duplicate_status_keeps_pattern_source() {
        let r = run("show expired contracts");
        let expired: Vec<_> = r.entities.iter().filter(|e| e.value == "EXPIRED").collect();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].source, EntitySource::Pattern);
    }

    #[test]
    fn inactive_is_not_active() {
        let r = run("show inactive contracts");
        let statuses: Vec<&str> = r
            .entities
            .iter()
            .filter(|e| e.attribute == "STATUS")
            .map(|e| e.value.as_str())
            .collect();
        assert_eq!(statuses, ["EXPIRED"]);
    }

    #[test]
    fn failed_parts_get_no_failed_status() {
        let r = run("failed parts for contract 123456");
        assert!(r.entities.iter().all(|e| e.attribute != "STATUS"));
    }

    #[test]
    fn first_field_group_applies_with_essentials() {
        let r = run("customer summary for contract 123456");
        // summary is tried before customer
        assert!(r.display_fields.contains(&"CREATE_DATE".to_string()));
        assert!(r.display_fields.contains(&"AWARD_NUMBER".to_string()));
    }

    #[test]
    fn multiple_contract_numbers_are_flagged() {
        let mut base = run("show contract 123456");
        base.entities.push(ExtractedEntity::new(
            "AWARD_NUMBER",
            Operation::Eq,
            "654321",
            EntitySource::Pattern,
        ));
        let r = enhancer(FeedbackConfig::default()).enhance("show contract 123456", base);
        assert!(r.issues.iter().any(|i| i.message == MULTIPLE_CONTRACTS));
        assert_eq!(r.confidence.errors, 0.5);
    }

    #[test]
    fn header_is_backfilled() {
        let mut header = Header::default();
        backfill_header(
            &mut header,
            &[ExtractedEntity::new("LOADED_CP_NUMBER", Operation::Eq, "123456", EntitySource::Pattern)],
        );
        assert_eq!(header.contract_number.as_deref(), Some("123456"));
    }

    #[test]
    fn feature_score_is_reported() {
        let r = run("show contract 123456");
        let score = r.feature_score.unwrap();
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn retrain_nudges_present_features_and_keeps_baseline_total() {
        let e = enhancer(FeedbackConfig::default());
        for _ in 0..50 {
            e.add_training_example("show contract 123456", None, None, 1.0);
        }
        let w = e.feature_weights();
        let total: f64 = w.values().sum();
        let baseline: f64 = Feature::ALL.iter().map(Feature::initial_weight).sum();
        assert!((total - baseline).abs() < 1e-9);
        assert!(w[&Feature::ActionVerbPresent] > 0.6);
        assert!(w[&Feature::CustomerInfoPresent] < 0.85);
        assert_eq!(e.training_examples(), 50);
    }

    #[test]
    fn no_retrain_before_the_window_fills() {
        let e = enhancer(FeedbackConfig::default());
        for _ in 0..49 {
            e.add_training_example("show contract 123456", None, None, 1.0);
        }
        assert_eq!(e.feature_weights()[&Feature::ActionVerbPresent], 0.6);
    }

    const INPUTS: &[&str] = &[
        "show contract 123456",
        "failed parts for AB12345",
        "customer 4455667 active contracts",
        "contracts created in 2024",
        "shwo contrcts",
        "hello",
    ];

    proptest! {
        #[test]
        fn weights_stay_in_unit_interval(
            examples in prop::collection::vec((0..INPUTS.len(), -2.0f64..3.0), 0..120),
            every in 1usize..10,
            rate in 0.0f64..1.0,
        ) {
            let e = enhancer(FeedbackConfig { retrain_every: every, learning_rate: rate });
            for (i, rating) in examples {
                e.add_training_example(INPUTS[i], None, None, rating);
            }
            for (feature, w) in e.feature_weights() {
                prop_assert!((0.0..=1.0).contains(&w), "{} = {}", feature.as_str(), w);
            }
        }
    }
}
