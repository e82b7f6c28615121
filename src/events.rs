use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::context::IndicatorContext;
use crate::alerts::evaluator::ConditionResult;
use crate::alerts::AlertId;
use crate::data::PriceBar;

/// A single real-time price/volume update. Passed through, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub last_price: f64,
    /// Session volume so far
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>, last_price: f64, volume: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            last_price,
            volume,
            open: None,
            high: None,
            low: None,
            close: None,
        }
    }

    /// Close-so-far as published by the feed, else the last traded price.
    pub fn close_so_far(&self) -> f64 {
        self.close.unwrap_or(self.last_price)
    }

    /// The live session viewed as a provisional bar.
    pub fn as_bar(&self) -> PriceBar {
        PriceBar {
            timestamp: self.timestamp,
            open: self.open.unwrap_or(self.last_price),
            high: self.high.unwrap_or(self.last_price).max(self.last_price),
            low: self.low.unwrap_or(self.last_price).min(self.last_price),
            close: self.last_price,
            volume: self.volume,
        }
    }
}

/// One firing of one alert. Immutable once built.
#[derive(Clone, Debug, Serialize)]
pub struct TriggerEvent {
    pub alert_id: AlertId,
    pub owner: String,
    pub symbol: String,
    pub exchange: String,
    pub one_shot: bool,
    pub tick: Tick,
    pub results: Vec<ConditionResult>,
    pub context: IndicatorContext,
    pub fired_at: DateTime<Utc>,
}

// Global Event Enum
#[derive(Clone, Debug)]
pub enum Event {
    Tick(Tick),
    Trigger(Arc<TriggerEvent>),
}
