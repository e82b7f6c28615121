//! Real-time dispatcher: routes ticks to one FIFO worker per symbol, which
//! evaluates that symbol's active alerts against an immutable registry
//! snapshot and publishes a trigger event for every alert that fires.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alerts::{build_context, evaluate_alert, AlertId, AlertRegistry, AlertRuntime, FiringEffect, MarketFrame};
use crate::bus::EventBus;
use crate::config::DispatcherConfig;
use crate::data::{HistoryProvider, SessionClock};
use crate::events::{Event, Tick, TriggerEvent};

/// Evaluation state for one symbol. Owned by exactly one task, so ticks for
/// the symbol are handled strictly in arrival order.
pub struct SymbolWorker {
    symbol: String,
    registry: Arc<AlertRegistry>,
    history: Arc<dyn HistoryProvider>,
    clock: SessionClock,
    lookback: usize,
    runtimes: HashMap<AlertId, AlertRuntime>,
    seen_version: u64,
}

impl SymbolWorker {
    pub fn new(
        symbol: impl Into<String>,
        registry: Arc<AlertRegistry>,
        history: Arc<dyn HistoryProvider>,
        clock: SessionClock,
        lookback: usize,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            registry,
            history,
            clock,
            lookback,
            runtimes: HashMap::new(),
            seen_version: 0,
        }
    }

    /// Evaluate every active alert for this symbol once against `tick`.
    ///
    /// State transitions are applied only after the whole pass, so every
    /// alert in the pass sees the same snapshot.
    pub fn process_tick(&mut self, tick: &Tick) -> Vec<TriggerEvent> {
        let snapshot = self.registry.snapshot(&self.symbol);
        if snapshot.version != self.seen_version {
            self.runtimes.retain(|id, _| snapshot.contains(id));
            self.seen_version = snapshot.version;
        }
        if snapshot.is_empty() {
            return Vec::new();
        }

        let history = self.history.history_for(&self.symbol, self.lookback);
        let frame = MarketFrame::new(tick, &history, &self.clock);

        let mut fired = Vec::new();
        for config in &snapshot.alerts {
            let runtime = self
                .runtimes
                .entry(config.id)
                .or_insert_with(|| AlertRuntime::for_config(config));
            let evaluation = evaluate_alert(config, &frame, runtime);
            if evaluation.fired() {
                runtime.commit_firing();
                fired.push((config.clone(), evaluation.results));
            }
        }

        let fired_at = Utc::now();
        let mut events = Vec::with_capacity(fired.len());
        for (config, results) in fired {
            let context = build_context(&config, &frame);
            match self.registry.record_firing(config.id) {
                Ok(FiringEffect::Deactivated) => {
                    self.runtimes.remove(&config.id);
                }
                Ok(FiringEffect::Retained) => {}
                // deleted while this pass was running: it still fires once
                Err(e) => debug!("[DISPATCHER] {} firing not recorded: {}", config.id, e),
            }
            events.push(TriggerEvent {
                alert_id: config.id,
                owner: config.owner.clone(),
                symbol: config.symbol.clone(),
                exchange: config.exchange.clone(),
                one_shot: config.one_shot,
                tick: tick.clone(),
                results,
                context,
                fired_at,
            });
        }
        events
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Tick>, bus: EventBus) {
        info!("🧵 [DISPATCHER] Worker started for {}", self.symbol);
        while let Some(tick) = rx.recv().await {
            for event in self.process_tick(&tick) {
                info!(
                    "🚨 [DISPATCHER] Alert {} fired on {} @ {:.2}",
                    event.alert_id, event.symbol, event.tick.last_price
                );
                if bus.publish_trigger(event).is_err() {
                    warn!("⚠️ [DISPATCHER] No subscribers for trigger events on {}", self.symbol);
                }
            }
        }
        info!("🧵 [DISPATCHER] Worker for {} stopped", self.symbol);
    }
}

pub struct Dispatcher {
    event_bus: EventBus,
    registry: Arc<AlertRegistry>,
    history: Arc<dyn HistoryProvider>,
    clock: SessionClock,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        event_bus: EventBus,
        registry: Arc<AlertRegistry>,
        history: Arc<dyn HistoryProvider>,
        clock: SessionClock,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            event_bus,
            registry,
            history,
            clock,
            config,
        }
    }

    fn spawn_worker(&self, symbol: &str) -> mpsc::Sender<Tick> {
        let (tx, rx) = mpsc::channel(self.config.symbol_queue_size);
        let worker = SymbolWorker::new(
            symbol,
            self.registry.clone(),
            self.history.clone(),
            self.clock.clone(),
            self.config.history_lookback,
        );
        tokio::spawn(worker.run(rx, self.event_bus.clone()));
        tx
    }

    /// Subscribe to the bus and route ticks until the bus closes.
    pub fn start(self) -> JoinHandle<()> {
        let mut rx = self.event_bus.subscribe();

        tokio::spawn(async move {
            info!(
                "🛰️ [DISPATCHER] Started (queue per symbol: {}, lookback: {})",
                self.config.symbol_queue_size, self.config.history_lookback
            );
            let mut workers: HashMap<String, mpsc::Sender<Tick>> = HashMap::new();

            loop {
                let mut tick = match rx.recv().await {
                    Ok(Event::Tick(tick)) => tick,
                    Ok(Event::Trigger(_)) => continue,
                    Err(RecvError::Lagged(n)) => {
                        warn!("⚠️ [DISPATCHER] Lagged behind the bus, {} events skipped", n);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                tick.symbol = tick.symbol.trim().to_uppercase();
                // No active alerts: nothing to evaluate, and the worker can go
                if self.registry.snapshot(&tick.symbol).is_empty() {
                    if workers.remove(&tick.symbol).is_some() {
                        info!("🧵 [DISPATCHER] Retiring idle worker for {}", tick.symbol);
                    }
                    continue;
                }

                let symbol = tick.symbol.clone();
                let tx = workers
                    .entry(symbol.clone())
                    .or_insert_with(|| self.spawn_worker(&symbol));
                match tx.try_send(tick) {
                    Ok(()) => {}
                    Err(TrySendError::Full(tick)) => {
                        warn!(
                            "⚠️ [DISPATCHER] Queue full for {}, dropping tick @ {}",
                            symbol, tick.timestamp
                        );
                    }
                    Err(TrySendError::Closed(tick)) => {
                        let tx = self.spawn_worker(&symbol);
                        if tx.try_send(tick).is_err() {
                            warn!("⚠️ [DISPATCHER] Could not restart worker for {}", symbol);
                        }
                        workers.insert(symbol, tx);
                    }
                }
            }
            info!("🛰️ [DISPATCHER] Event bus closed, stopping");
        })
    }
}
