//! Alert lifecycle: Draft -> AwaitingClarification -> Draft -> Active ->
//! Triggered (one-shot) or Active (recurring). Deleted from anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::config::{AlertConfiguration, AlertPayload};
use super::AlertId;
use crate::error::AlertError;

/// Open question for the user while a translation is incomplete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationState {
    pub missing_info: BTreeSet<String>,
    pub question: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlertState {
    Draft,
    AwaitingClarification { clarification: ClarificationState },
    Active,
    Triggered { at: DateTime<Utc> },
    Deleted,
}

impl AlertState {
    pub fn name(&self) -> &'static str {
        match self {
            AlertState::Draft => "draft",
            AlertState::AwaitingClarification { .. } => "awaiting_clarification",
            AlertState::Active => "active",
            AlertState::Triggered { .. } => "triggered",
            AlertState::Deleted => "deleted",
        }
    }
}

/// What a firing did to the alert's subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FiringEffect {
    /// One-shot: moved to Triggered and unsubscribed
    Deactivated,
    /// Recurring: stays Active
    Retained,
}

#[derive(Clone, Debug, Serialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub owner: String,
    /// Original request plus every clarification, in order
    pub request_text: String,
    pub state: AlertState,
    pub config: Option<Arc<AlertConfiguration>>,
    pub trigger_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new_draft(id: AlertId, owner: &str, text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner: owner.to_string(),
            request_text: text.trim().to_string(),
            state: AlertState::Draft,
            config: None,
            trigger_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn invalid(&self, to: &'static str) -> AlertError {
        AlertError::InvalidTransition {
            id: self.id.to_string(),
            from: self.state.name(),
            to,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, AlertState::Active)
    }

    /// Draft -> AwaitingClarification. Only the clarification is stored.
    pub fn request_clarification(&mut self, clarification: ClarificationState, now: DateTime<Utc>) -> Result<(), AlertError> {
        if self.state != AlertState::Draft {
            return Err(self.invalid("awaiting_clarification"));
        }
        self.state = AlertState::AwaitingClarification { clarification };
        self.updated_at = now;
        Ok(())
    }

    /// AwaitingClarification -> Draft, appending the user's answer.
    pub fn supply_clarification(&mut self, text: &str, now: DateTime<Utc>) -> Result<&str, AlertError> {
        if !matches!(self.state, AlertState::AwaitingClarification { .. }) {
            return Err(self.invalid("draft"));
        }
        let text = text.trim();
        if !text.is_empty() {
            if !self.request_text.is_empty() {
                self.request_text.push('\n');
            }
            self.request_text.push_str(text);
        }
        self.state = AlertState::Draft;
        self.updated_at = now;
        Ok(&self.request_text)
    }

    /// Draft -> Active. An invalid payload leaves the record in Draft.
    pub fn activate(&mut self, payload: AlertPayload, now: DateTime<Utc>) -> Result<Arc<AlertConfiguration>, AlertError> {
        if self.state != AlertState::Draft {
            return Err(self.invalid("active"));
        }
        let config = Arc::new(AlertConfiguration::from_payload(self.id, &self.owner, payload, now)?);
        self.config = Some(config.clone());
        self.state = AlertState::Active;
        self.updated_at = now;
        Ok(config)
    }

    /// Active -> Triggered for one-shot alerts, Active -> Active otherwise.
    pub fn record_firing(&mut self, now: DateTime<Utc>) -> Result<FiringEffect, AlertError> {
        if self.state != AlertState::Active {
            return Err(self.invalid("triggered"));
        }
        self.trigger_count += 1;
        self.updated_at = now;

        let one_shot = self.config.as_ref().map(|c| c.one_shot).unwrap_or(true);
        if one_shot {
            self.state = AlertState::Triggered { at: now };
            Ok(FiringEffect::Deactivated)
        } else {
            Ok(FiringEffect::Retained)
        }
    }

    /// Any state -> Deleted. Deleting twice is a no-op.
    pub fn delete(&mut self, now: DateTime<Utc>) {
        if self.state != AlertState::Deleted {
            self.state = AlertState::Deleted;
            self.updated_at = now;
        }
    }
}
