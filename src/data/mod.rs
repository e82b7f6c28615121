pub mod session;
pub mod store;


use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use session::SessionClock;
pub use store::{HistoryProvider, MarketStore};

/// Aggregated OHLCV record, typically one trading day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Chronological, bounded bar history for one symbol. Read-only to the core.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl HistorySeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Bars that closed on a session date strictly before `date`.
    ///
    /// A bar for the live session (if the collaborator already published one)
    /// is superseded by the tick and excluded here.
    pub fn prior_to(&self, date: NaiveDate, clock: &SessionClock) -> &[PriceBar] {
        let cut = self
            .bars
            .partition_point(|bar| clock.session_date(bar.timestamp) < date);
        &self.bars[..cut]
    }
}
