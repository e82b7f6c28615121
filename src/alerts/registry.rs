//! Owned arena of alert records plus a per-symbol index of active
//! configurations.
//!
//! Readers (the dispatcher) only ever see immutable `SymbolSnapshot`s; every
//! mutation goes through a state-machine transition, republishes the affected
//! symbol's snapshot and bumps the version counter.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::config::{AlertConfiguration, AlertPayload};
use super::state::{AlertRecord, ClarificationState, FiringEffect};
use super::AlertId;
use crate::error::AlertError;

/// Active alerts for one symbol at one registry version.
#[derive(Debug, Default)]
pub struct SymbolSnapshot {
    pub version: u64,
    pub alerts: Vec<Arc<AlertConfiguration>>,
}

impl SymbolSnapshot {
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn contains(&self, id: &AlertId) -> bool {
        self.alerts.iter().any(|a| &a.id == id)
    }
}

#[derive(Default)]
struct RegistryInner {
    records: HashMap<AlertId, AlertRecord>,
    by_symbol: HashMap<String, Arc<SymbolSnapshot>>,
    version: u64,
}

impl RegistryInner {
    fn record_mut(&mut self, id: AlertId) -> Result<&mut AlertRecord, AlertError> {
        self.records
            .get_mut(&id)
            .ok_or_else(|| AlertError::AlertNotFound { id: id.to_string() })
    }

    /// Rebuild one symbol's snapshot from the records. Ordered by creation
    /// time so evaluation order is stable across versions.
    fn republish(&mut self, symbol: &str) {
        self.version += 1;
        let mut alerts: Vec<Arc<AlertConfiguration>> = self
            .records
            .values()
            .filter(|r| r.is_active())
            .filter_map(|r| r.config.clone())
            .filter(|c| c.symbol == symbol)
            .collect();
        alerts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        if alerts.is_empty() {
            self.by_symbol.remove(symbol);
        } else {
            self.by_symbol.insert(
                symbol.to_string(),
                Arc::new(SymbolSnapshot {
                    version: self.version,
                    alerts,
                }),
            );
        }
    }
}

#[derive(Default)]
pub struct AlertRegistry {
    inner: RwLock<RegistryInner>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_draft(&self, owner: &str, text: &str) -> AlertId {
        let id = Uuid::new_v4();
        let record = AlertRecord::new_draft(id, owner, text, Utc::now());
        self.inner.write().records.insert(id, record);
        id
    }

    pub fn get(&self, id: AlertId) -> Option<AlertRecord> {
        self.inner.read().records.get(&id).cloned()
    }

    pub fn list_for_owner(&self, owner: &str) -> Vec<AlertRecord> {
        let inner = self.inner.read();
        let mut records: Vec<AlertRecord> = inner.records.values().filter(|r| r.owner == owner).cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    pub fn request_clarification(&self, id: AlertId, clarification: ClarificationState) -> Result<(), AlertError> {
        let mut inner = self.inner.write();
        inner.record_mut(id)?.request_clarification(clarification, Utc::now())
    }

    /// Returns the accumulated request text to resubmit.
    pub fn supply_clarification(&self, id: AlertId, text: &str) -> Result<String, AlertError> {
        let mut inner = self.inner.write();
        let record = inner.record_mut(id)?;
        record.supply_clarification(text, Utc::now()).map(str::to_string)
    }

    pub fn activate(&self, id: AlertId, payload: AlertPayload) -> Result<Arc<AlertConfiguration>, AlertError> {
        let mut inner = self.inner.write();
        let config = inner.record_mut(id)?.activate(payload, Utc::now())?;
        inner.republish(&config.symbol);
        info!(
            "✅ [REGISTRY] Alert {} active on {} ({} conditions, {:?}, one_shot={})",
            id,
            config.symbol,
            config.conditions.len(),
            config.combinator,
            config.one_shot
        );
        Ok(config)
    }

    pub fn record_firing(&self, id: AlertId) -> Result<FiringEffect, AlertError> {
        let mut inner = self.inner.write();
        let record = inner.record_mut(id)?;
        let effect = record.record_firing(Utc::now())?;
        if effect == FiringEffect::Deactivated {
            if let Some(symbol) = record.config.as_ref().map(|c| c.symbol.clone()) {
                inner.republish(&symbol);
                info!("🔕 [REGISTRY] One-shot alert {} triggered, unsubscribed from {}", id, symbol);
            }
        }
        Ok(effect)
    }

    pub fn delete(&self, id: AlertId) -> Result<(), AlertError> {
        let mut inner = self.inner.write();
        let record = inner.record_mut(id)?;
        let was_active = record.is_active();
        record.delete(Utc::now());
        let symbol = record.config.as_ref().map(|c| c.symbol.clone());
        if was_active {
            if let Some(symbol) = symbol {
                inner.republish(&symbol);
            }
        }
        info!("🗑️ [REGISTRY] Alert {} deleted", id);
        Ok(())
    }

    /// Current active alerts for `symbol`; empty if none are registered.
    pub fn snapshot(&self, symbol: &str) -> Arc<SymbolSnapshot> {
        let inner = self.inner.read();
        match inner.by_symbol.get(symbol) {
            Some(snapshot) => snapshot.clone(),
            None => Arc::new(SymbolSnapshot {
                version: inner.version,
                alerts: Vec::new(),
            }),
        }
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    pub fn active_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.inner.read().by_symbol.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}
