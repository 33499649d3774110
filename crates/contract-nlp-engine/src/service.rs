//! The service object tying classification, enhancement and the creation
//! workflow together.
//!
//! Each [`NlpService`] owns its session store and its feature weights.
//! One-shot classification is stateless; creation dialogues are keyed by
//! the caller's session id.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use contract_nlp_core::{
    AttributeConfig, AttributeSummary, ColumnRegistry, EngineConfig, QueryClassification,
    StaticColumnRegistry, TextNormalizer,
};
use contract_nlp_intent::{Enhancer, Feature, IntentClassifier, QueryResult};

use crate::error::EngineError;
use crate::sweeper::spawn_sweeper;
use crate::workflow::{ContractWorkflow, NOT_ACTIVE_MESSAGE, WorkflowResult};

/// What a conversational turn turned into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// A one-shot query.
    Query { result: Box<QueryResult> },
    /// A step of the creation dialogue.
    Workflow { result: WorkflowResult },
    /// The dialogue finished; `query` is the merged creation request,
    /// already classified. The session has been cleared.
    Completed {
        result: WorkflowResult,
        query: Box<QueryResult>,
    },
}

pub struct NlpService {
    config: EngineConfig,
    classifier: IntentClassifier,
    enhancer: Enhancer,
    workflow: Arc<ContractWorkflow>,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl NlpService {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_registry(config, Arc::new(StaticColumnRegistry))
    }

    pub fn with_registry(
        config: EngineConfig,
        registry: Arc<dyn ColumnRegistry>,
    ) -> Result<Self, EngineError> {
        config.check()?;
        let attributes = config.attribute_table()?;
        let normalizer = TextNormalizer::new();
        let enhancer = Enhancer::new(
            Arc::clone(&registry),
            normalizer.spell().clone(),
            normalizer.lemmatizer().clone(),
            config.feedback.clone(),
        );
        let workflow = Arc::new(ContractWorkflow::new(attributes, config.session_timeout()));
        info!(
            timeout_secs = config.session_timeout_secs,
            required = workflow.attributes().read().required().count(),
            "nlp service ready"
        );
        Ok(Self {
            classifier: IntentClassifier::new(normalizer, registry),
            enhancer,
            workflow,
            shutdown: CancellationToken::new(),
            sweeper: Mutex::new(None),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the periodic expiry sweep. Must be called inside a tokio
    /// runtime; a second call is a no-op.
    pub fn start_sweeper(&self) {
        let mut slot = self.sweeper.lock();
        if slot.is_some() {
            return;
        }
        *slot = Some(spawn_sweeper(
            Arc::clone(&self.workflow),
            self.config.sweep_interval(),
            self.shutdown.child_token(),
        ));
    }

    /// Stop the sweep task and wait for it.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "sweeper task failed");
        }
    }

    // ── One-shot ──

    pub fn classify(&self, raw: &str) -> QueryResult {
        let base = self.classifier.classify(raw);
        self.enhancer.enhance(raw, base)
    }

    pub fn classify_at(&self, raw: &str, today: NaiveDate) -> QueryResult {
        let base = self.classifier.classify_at(raw, today);
        self.enhancer.enhance(raw, base)
    }

    pub fn classify_json(&self, raw: &str) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.classify(raw))?)
    }

    // ── Workflow ──

    pub fn process_contract_creation_input(&self, raw: &str, session_id: &str) -> WorkflowResult {
        let trigger = self.classifier.classify(raw).starts_creation_workflow();
        self.workflow.process(raw, session_id, trigger)
    }

    /// Route a turn to the creation dialogue when one is running or asked
    /// for, otherwise answer it as a one-shot query.
    pub fn handle_turn(&self, raw: &str, session_id: &str) -> Turn {
        let result = self.classify(raw);
        let trigger = result.starts_creation_workflow();
        let in_dialogue = self
            .workflow
            .store()
            .get(session_id)
            .is_some_and(|s| s.is_in_progress());

        if !trigger && !in_dialogue {
            return Turn::Query {
                result: Box::new(result),
            };
        }

        let step = self.workflow.process_at(raw, session_id, trigger, Utc::now());
        debug!(session_id, trigger, in_dialogue, "workflow turn");
        match step {
            WorkflowResult::ChainBreak { ref message } if message == NOT_ACTIVE_MESSAGE => Turn::Query {
                result: Box::new(result),
            },
            WorkflowResult::Complete {
                ref merged_query, ..
            } => {
                let query = self.classify(merged_query);
                self.workflow.clear_session(session_id);
                Turn::Completed {
                    result: step,
                    query: Box::new(query),
                }
            }
            _ => Turn::Workflow { result: step },
        }
    }

    pub fn session_info(&self, session_id: &str) -> Option<String> {
        self.workflow.session_info(session_id)
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        self.workflow.clear_session(session_id)
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.workflow.active_sessions()
    }

    pub fn sweep_expired(&self) -> Vec<String> {
        self.workflow.sweep_expired_at(Utc::now())
    }

    // ── Feedback ──

    pub fn add_training_example(
        &self,
        input: &str,
        expected: Option<QueryClassification>,
        actual: Option<QueryClassification>,
        rating: f64,
    ) {
        self.enhancer.add_training_example(input, expected, actual, rating);
    }

    pub fn feature_weights(&self) -> BTreeMap<Feature, f64> {
        self.enhancer.feature_weights()
    }

    // ── Attributes ──

    pub fn attribute_summary(&self) -> AttributeSummary {
        self.workflow.attributes().read().summary()
    }

    pub fn attributes(&self) -> Vec<AttributeConfig> {
        self.workflow.attributes().read().all().to_vec()
    }

    pub fn add_attribute(&self, attr: AttributeConfig) -> Result<(), EngineError> {
        let name = attr.name.clone();
        self.workflow.attributes().write().add(attr)?;
        info!(attribute = %name, "attribute added");
        Ok(())
    }

    pub fn update_attribute(&self, attr: AttributeConfig) -> Result<(), EngineError> {
        let name = attr.name.clone();
        self.workflow.attributes().write().update(attr)?;
        info!(attribute = %name, "attribute updated");
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        let removed = self.workflow.attributes().write().remove(name);
        if removed {
            info!(attribute = name, "attribute removed");
        }
        removed
    }
}

impl Drop for NlpService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_nlp_core::{BaseAction, QueryType};
    use pretty_assertions::assert_eq;

    fn service() -> NlpService {
        NlpService::new(EngineConfig::default()).unwrap()
    }

    const ANSWERS: &[&str] = &[
        "45678",
        "Falcon Supply",
        "Supply Agreement",
        "Annual supply of spare parts.",
        "01-15-2026",
        "01-15-2027",
    ];

    #[test]
    fn one_shot_queries_are_enhanced() {
        let r = service().classify("show recent contracts for customer 45678");
        assert_eq!(r.query_type(), QueryType::Contracts);
        assert!(r.feature_score.is_some());
        assert!(r.entities.iter().any(|e| e.value == "LAST_30_DAYS"));
    }

    #[test]
    fn creation_help_is_not_a_workflow_trigger() {
        let s = service();
        let turn = s.handle_turn("How do I create a contract?", "s1");
        match turn {
            Turn::Query { result } => {
                assert_eq!(result.base_action(), BaseAction::HelpCreateUser)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.active_sessions().is_empty());
    }

    #[test]
    fn dialogue_runs_to_completion_through_handle_turn() {
        let s = service();
        let first = s.handle_turn("create contract", "s1");
        assert!(matches!(first, Turn::Workflow { ref result } if result.requires_input()));

        let mut last = None;
        for answer in ANSWERS {
            last = Some(s.handle_turn(answer, "s1"));
        }
        match last.unwrap() {
            Turn::Completed { result, query } => {
                assert!(result.is_complete());
                assert_eq!(query.base_action(), BaseAction::CreateContract);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.session_info("s1").is_none());
        assert!(matches!(s.handle_turn("show contract 123456", "s1"), Turn::Query { .. }));
    }

    #[test]
    fn invalid_answer_reprompts_same_step() {
        let s = service();
        s.process_contract_creation_input("create contract", "s1");
        let r = s.process_contract_creation_input("12", "s1");
        match r {
            WorkflowResult::RequiresInput {
                attribute,
                completed_steps,
                message,
                ..
            } => {
                assert_eq!(attribute, "CUSTOMER_NUMBER");
                assert!(completed_steps.is_empty());
                assert!(!message.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unrelated_input_breaks_the_chain() {
        let r = service().process_contract_creation_input("show expired contracts", "nobody");
        assert!(r.is_chain_break());
    }

    #[test]
    fn sessions_are_independent() {
        let s = Arc::new(service());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    let id = format!("user-{i}");
                    s.process_contract_creation_input("create contract", &id);
                    s.process_contract_creation_input("45678", &id)
                })
            })
            .collect();
        for h in handles {
            let r = h.join().unwrap();
            assert!(matches!(r, WorkflowResult::RequiresInput { ref attribute, .. } if attribute == "CONTRACT_NAME"));
        }
        assert_eq!(s.active_sessions().len(), 4);
    }

    #[test]
    fn zero_timeout_sessions_are_swept() {
        let config = EngineConfig {
            session_timeout_secs: 0,
            ..EngineConfig::default()
        };
        let s = NlpService::new(config).unwrap();
        s.workflow
            .process_at("create contract", "s1", true, Utc::now() - chrono::TimeDelta::seconds(1));
        assert_eq!(s.sweep_expired(), ["s1"]);
        assert!(s.active_sessions().is_empty());
    }

    #[test]
    fn runtime_attribute_changes_are_visible() {
        let s = service();
        let mut currency = s
            .attributes()
            .into_iter()
            .find(|a| a.name == "CURRENCY")
            .unwrap();
        currency.required = true;
        s.update_attribute(currency).unwrap();
        assert_eq!(s.attribute_summary().required, 7);
        assert!(s.remove_attribute("CURRENCY"));
        assert!(!s.remove_attribute("CURRENCY"));
        assert_eq!(s.attribute_summary().total, 8);
    }

    #[test]
    fn feedback_reaches_the_enhancer() {
        let s = service();
        for _ in 0..50 {
            s.add_training_example("show contract 123456", None, None, 0.0);
        }
        assert!(s.feature_weights()[&Feature::ActionVerbPresent] < 0.6);
    }

    #[tokio::test]
    async fn turns_on_one_session_serialize() {
        let s = Arc::new(service());
        s.process_contract_creation_input("create contract", "s1");
        let tasks = (0..4).map(|_| {
            let s = Arc::clone(&s);
            tokio::task::spawn_blocking(move || s.process_contract_creation_input("45678", "s1"))
        });
        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|r| r.is_ok()));
        // the same answer fits three steps in a row, then fails DESCRIPTION
        let session = s.workflow.store().get("s1").unwrap();
        assert_eq!(session.completed_steps, ["CUSTOMER_NUMBER", "CONTRACT_NAME", "TITLE"]);
        assert_eq!(session.current_step.as_deref(), Some("DESCRIPTION"));
    }

    #[tokio::test]
    async fn sweeper_starts_and_stops() {
        let s = service();
        s.start_sweeper();
        s.start_sweeper();
        s.shutdown().await;
        assert!(s.sweeper.lock().is_none());
    }

    #[test]
    fn config_built_in_code_is_checked() {
        let config = EngineConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(NlpService::new(config), Err(EngineError::Config(_))));
    }
}
