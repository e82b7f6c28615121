//! Market Sentinel - real-time market alert monitoring
//!
//! This library provides the indicator library, the multi-condition
//! evaluator, the alert state machine and the per-symbol dispatcher, plus the
//! LLM-backed translation and notification collaborators around them.

pub mod agents;
pub mod alerts;
pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod indicators;
pub mod llm;
pub mod services;

// Re-export commonly used types
pub use alerts::{AlertConfiguration, AlertId, AlertRegistry, Condition};
pub use bus::EventBus;
pub use config::AppConfig;
pub use events::{Event, Tick, TriggerEvent};

#[cfg(test)]
mod events_tests;
