//! Contract-creation workflow state machine.
//!
//! A session moves NEW → IN_PROGRESS(step) → COMPLETE, CANCELLED or
//! TIMEOUT. Each turn either answers the current step, cancels, restarts the
//! dialogue, or breaks the chain because it has nothing to do with contract
//! creation.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use contract_nlp_core::{AttributeConfig, AttributeTable};

use crate::error::EngineError;
use crate::session::{Session, SessionStatus};
use crate::store::SessionStore;

const CANCEL_WORDS: &[&str] = &["cancel", "stop", "abort", "quit", "exit"];

pub const CANCELLED_MESSAGE: &str =
    "Contract creation cancelled. You can start a new contract creation request at any time.";
pub const NOT_ACTIVE_MESSAGE: &str =
    "Contract creation workflow not active. Please start a new contract creation request.";
pub const COMPLETE_MESSAGE: &str = "Contract creation data complete. Processing contract creation...";

/// Outcome of one workflow turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowResult {
    /// Waiting on `attribute`. `message` is the prompt or the validation
    /// failure.
    #[serde(rename_all = "camelCase")]
    RequiresInput {
        session_id: String,
        attribute: String,
        message: String,
        completed_steps: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        session_id: String,
        message: String,
        data: BTreeMap<String, String>,
        merged_query: String,
    },
    /// Not a creation turn; the caller should route it elsewhere.
    ChainBreak { message: String },
    Error { message: String },
}

impl WorkflowResult {
    pub fn is_chain_break(&self) -> bool {
        matches!(self, Self::ChainBreak { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn requires_input(&self) -> bool {
        matches!(self, Self::RequiresInput { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::RequiresInput { message, .. }
            | Self::Complete { message, .. }
            | Self::ChainBreak { message }
            | Self::Error { message } => message,
        }
    }

    fn prompt(session: &Session, attribute: &AttributeConfig, message: String) -> Self {
        Self::RequiresInput {
            session_id: session.session_id.clone(),
            attribute: attribute.name.clone(),
            message,
            completed_steps: session.completed_steps.clone(),
        }
    }
}

/// Natural-language creation request rebuilt from collected values.
pub fn merged_query(data: &BTreeMap<String, String>) -> String {
    let mut query = String::from("create contract");
    let parts = [
        ("CUSTOMER_NUMBER", "for account"),
        ("CONTRACT_NAME", "named"),
        ("TITLE", "with title"),
        ("DESCRIPTION", "description"),
        ("EFFECTIVE_DATE", "effective"),
        ("EXPIRATION_DATE", "expires"),
    ];
    for (attribute, lead) in parts {
        if let Some(value) = data.get(attribute) {
            query.push(' ');
            query.push_str(lead);
            query.push(' ');
            query.push_str(value);
        }
    }
    query
}

fn is_cancel(raw: &str) -> bool {
    let word = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    CANCEL_WORDS.contains(&word.as_str())
}

pub struct ContractWorkflow {
    store: SessionStore,
    attributes: RwLock<AttributeTable>,
    timeout: Duration,
}

impl ContractWorkflow {
    pub fn new(attributes: AttributeTable, timeout: Duration) -> Self {
        Self {
            store: SessionStore::new(),
            attributes: RwLock::new(attributes),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn attributes(&self) -> &RwLock<AttributeTable> {
        &self.attributes
    }

    /// Handle one turn. `trigger` says whether `raw` asks the bot to start
    /// a new contract.
    pub fn process(&self, raw: &str, session_id: &str, trigger: bool) -> WorkflowResult {
        self.process_at(raw, session_id, trigger, Utc::now())
    }

    pub fn process_at(
        &self,
        raw: &str,
        session_id: &str,
        trigger: bool,
        now: DateTime<Utc>,
    ) -> WorkflowResult {
        self.store
            .with_session(session_id, |slot| {
                self.turn(slot, raw, session_id, trigger, now)
            })
            .unwrap_or_else(|e| WorkflowResult::Error {
                message: format!("Error processing contract creation input: {e}"),
            })
    }

    fn turn(
        &self,
        slot: &mut Option<Session>,
        raw: &str,
        session_id: &str,
        trigger: bool,
        now: DateTime<Utc>,
    ) -> Result<WorkflowResult, EngineError> {
        if let Some(session) = slot.as_mut()
            && session.is_in_progress()
            && session.is_idle(now, self.timeout)
        {
            session.status = SessionStatus::Timeout;
            info!(session_id, "session timed out");
        }

        let in_progress = slot.as_ref().is_some_and(Session::is_in_progress);
        if !in_progress {
            return Ok(if trigger {
                self.start(slot, raw, session_id, now)
            } else {
                WorkflowResult::ChainBreak {
                    message: NOT_ACTIVE_MESSAGE.to_string(),
                }
            });
        }

        let Some(session) = slot.as_mut() else {
            return Ok(WorkflowResult::ChainBreak {
                message: NOT_ACTIVE_MESSAGE.to_string(),
            });
        };

        if is_cancel(raw) {
            session.status = SessionStatus::Cancelled;
            session.touch(now);
            info!(session_id, "contract creation cancelled");
            return Ok(WorkflowResult::ChainBreak {
                message: CANCELLED_MESSAGE.to_string(),
            });
        }

        let table = self.attributes.read();
        let step = session.current_step.clone().unwrap_or_default();
        let attribute = table.get(&step).ok_or_else(|| EngineError::UnknownStep {
            session_id: session_id.to_string(),
            step: step.clone(),
        })?;

        if let Err(failure) = table.validate(attribute, raw) {
            if trigger {
                drop(table);
                info!(session_id, step = %step, "creation request supersedes session");
                return Ok(self.start(slot, raw, session_id, now));
            }
            debug!(session_id, step = %step, message = %failure.message, "step rejected");
            session
                .validation_errors
                .insert(step.clone(), failure.message.clone());
            session.touch(now);
            return Ok(WorkflowResult::prompt(session, attribute, failure.message));
        }

        let value = table.extract_value(attribute, raw);
        let mut completed = session.completed_steps.clone();
        completed.push(step.clone());
        let next = table.next_required(&completed);
        session.record(&step, value, next.map(|a| a.name.clone()));
        session.touch(now);
        debug!(session_id, step = %step, "step accepted");

        Ok(match next {
            Some(next) => WorkflowResult::prompt(session, next, next.prompt.clone()),
            None => {
                info!(session_id, workflow_id = %session.workflow_id, "contract data complete");
                WorkflowResult::Complete {
                    session_id: session_id.to_string(),
                    message: COMPLETE_MESSAGE.to_string(),
                    data: session.collected.clone(),
                    merged_query: merged_query(&session.collected),
                }
            }
        })
    }

    fn start(
        &self,
        slot: &mut Option<Session>,
        raw: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> WorkflowResult {
        if let Some(old) = slot.as_mut()
            && old.is_in_progress()
        {
            old.status = SessionStatus::Cancelled;
        }

        let table = self.attributes.read();
        let session = Session::start(session_id, raw.trim(), table.required_names(), now);
        let Some(first) = table.next_required(&[]) else {
            *slot = Some(Session {
                status: SessionStatus::Complete,
                ..session
            });
            return WorkflowResult::Complete {
                session_id: session_id.to_string(),
                message: COMPLETE_MESSAGE.to_string(),
                data: BTreeMap::new(),
                merged_query: merged_query(&BTreeMap::new()),
            };
        };
        info!(session_id, workflow_id = %session.workflow_id, "contract creation started");
        let result = WorkflowResult::prompt(&session, first, first.prompt.clone());
        *slot = Some(session);
        result
    }

    pub fn session_info(&self, session_id: &str) -> Option<String> {
        self.store.get(session_id).map(|s| s.info())
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        let removed = self.store.remove(session_id).is_some();
        if removed {
            info!(session_id, "session cleared");
        }
        removed
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.store.active_ids()
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        self.store.sweep_expired_at(now, self.timeout)
    }
}
