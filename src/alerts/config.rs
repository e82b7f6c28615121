use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::AlertId;
use crate::constants::schema::DEFAULT_EXCHANGE;
use crate::error::AlertError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

fn default_exchange() -> String {
    DEFAULT_EXCHANGE.to_string()
}

/// Alert as emitted by the translation collaborator (`config` of a
/// `CONFIRMED` reply). Not yet validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub one_shot: bool,
}

impl AlertPayload {
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.symbol.trim().is_empty() {
            return Err(AlertError::InvalidConfiguration("symbol is required".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(AlertError::InvalidConfiguration(
                "at least one condition is required".to_string(),
            ));
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            condition.validate().map_err(|reason| {
                AlertError::InvalidConfiguration(format!("condition {} ({}): {}", i, condition.kind(), reason))
            })?;
        }
        Ok(())
    }
}

/// A validated, immutable alert. Condition order is significant: it is the
/// short-circuit order of the combinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertConfiguration {
    pub id: AlertId,
    pub owner: String,
    pub symbol: String,
    pub exchange: String,
    pub conditions: Vec<Condition>,
    pub combinator: Combinator,
    pub one_shot: bool,
    pub created_at: DateTime<Utc>,
}

impl AlertConfiguration {
    pub fn from_payload(
        id: AlertId,
        owner: &str,
        payload: AlertPayload,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AlertError> {
        payload.validate()?;

        let exchange = match payload.exchange.trim() {
            "" => default_exchange(),
            e => e.to_uppercase(),
        };

        Ok(Self {
            id,
            owner: owner.to_string(),
            symbol: payload.symbol.trim().to_uppercase(),
            exchange,
            conditions: payload.conditions,
            combinator: payload.combinator,
            one_shot: payload.one_shot,
            created_at,
        })
    }
}
