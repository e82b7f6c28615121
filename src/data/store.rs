use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use super::{HistorySeries, PriceBar};
use crate::error::DataError;

/// Query side of the market-data collaborator.
pub trait HistoryProvider: Send + Sync {
    fn history_for(&self, symbol: &str, lookback: usize) -> HistorySeries;
}

/// In-memory, bounded, append-only bar store keyed by symbol.
#[derive(Clone, Debug)]
pub struct MarketStore {
    historical_bars: Arc<RwLock<HashMap<String, VecDeque<PriceBar>>>>,
    pub limit: usize,
}

impl MarketStore {
    pub fn new(limit: usize) -> Self {
        Self {
            historical_bars: Arc::new(RwLock::new(HashMap::new())),
            limit,
        }
    }

    /// Append a bar; bars must arrive in strictly increasing timestamp order.
    pub fn append_bar(&self, symbol: &str, bar: PriceBar) -> Result<(), DataError> {
        let mut bars_map = self.historical_bars.write();
        let queue = bars_map.entry(symbol.to_string()).or_default();

        if let Some(last) = queue.back() {
            if bar.timestamp == last.timestamp {
                return Err(DataError::DuplicateBar {
                    symbol: symbol.to_string(),
                    timestamp: bar.timestamp.to_rfc3339(),
                });
            }
            if bar.timestamp < last.timestamp {
                return Err(DataError::OutOfOrderBar {
                    symbol: symbol.to_string(),
                    timestamp: bar.timestamp.to_rfc3339(),
                    last: last.timestamp.to_rfc3339(),
                });
            }
        }

        if queue.len() >= self.limit {
            queue.pop_front();
        }
        queue.push_back(bar);
        debug!("[STORE] {} now holds {} bars", symbol, queue.len());
        Ok(())
    }

    /// Seed a symbol with a batch (e.g. a backfill); stops at the first bad bar.
    pub fn extend_bars(&self, symbol: &str, bars: impl IntoIterator<Item = PriceBar>) -> Result<usize, DataError> {
        let mut added = 0;
        for bar in bars {
            self.append_bar(symbol, bar)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn get_latest_bar(&self, symbol: &str) -> Option<PriceBar> {
        let bars_map = self.historical_bars.read();
        bars_map.get(symbol).and_then(|q| q.back()).cloned()
    }

    pub fn bar_count(&self, symbol: &str) -> usize {
        let bars_map = self.historical_bars.read();
        bars_map.get(symbol).map(|q| q.len()).unwrap_or(0)
    }

    pub fn symbols(&self) -> Vec<String> {
        let bars_map = self.historical_bars.read();
        bars_map.keys().cloned().collect()
    }
}

impl HistoryProvider for MarketStore {
    fn history_for(&self, symbol: &str, lookback: usize) -> HistorySeries {
        let bars_map = self.historical_bars.read();
        let bars = match bars_map.get(symbol) {
            Some(queue) => {
                let skip = queue.len().saturating_sub(lookback);
                queue.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        };
        HistorySeries::new(symbol, bars)
    }
}
