//! One user's contract-creation dialogue.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Complete,
    Cancelled,
    Timeout,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub workflow_id: Uuid,
    pub status: SessionStatus,
    /// Utterance that started the dialogue.
    pub original_query: String,
    pub required_attributes: Vec<String>,
    /// `None` once every required attribute is collected.
    pub current_step: Option<String>,
    pub completed_steps: Vec<String>,
    pub collected: BTreeMap<String, String>,
    /// Last validation message per attribute.
    pub validation_errors: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn start(
        session_id: &str,
        original_query: &str,
        required_attributes: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            workflow_id: Uuid::new_v4(),
            status: SessionStatus::InProgress,
            original_query: original_query.to_string(),
            current_step: required_attributes.first().cloned(),
            required_attributes,
            completed_steps: Vec::new(),
            collected: BTreeMap::new(),
            validation_errors: BTreeMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    /// Idle for longer than `timeout` as of `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        let limit = TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.last_activity) > limit
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Store an accepted value and advance to `next`.
    pub fn record(&mut self, attribute: &str, value: String, next: Option<String>) {
        self.collected.insert(attribute.to_string(), value);
        self.validation_errors.remove(attribute);
        if !self.completed_steps.iter().any(|s| s == attribute) {
            self.completed_steps.push(attribute.to_string());
        }
        self.current_step = next;
        if self.current_step.is_none() {
            self.status = SessionStatus::Complete;
        }
    }

    /// Plain-text dump for diagnostics.
    pub fn info(&self) -> String {
        let mut out = String::from("Contract Creation Session Info:\n");
        let _ = writeln!(out, "Session ID: {}", self.session_id);
        let _ = writeln!(out, "Workflow ID: {}", self.workflow_id);
        let _ = writeln!(out, "Status: {}", self.status.as_str());
        let _ = writeln!(out, "Current Step: {}", self.current_step.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "Original Query: {}", self.original_query);
        let _ = writeln!(out, "Required Attributes: {}", self.required_attributes.join(", "));
        let _ = writeln!(out, "Completed Steps: {}", self.completed_steps.join(", "));
        let collected: Vec<String> = self
            .collected
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let _ = writeln!(out, "Collected Data: {}", collected.join(", "));
        let errors: Vec<String> = self
            .validation_errors
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        let _ = writeln!(out, "Validation Errors: {}", errors.join("; "));
        let _ = writeln!(out, "Created: {}", self.created_at.to_rfc3339());
        let _ = writeln!(out, "Last Activity: {}", self.last_activity.to_rfc3339());
        out
    }
}
