//! Alert model, condition evaluation and lifecycle.

pub mod condition;
pub mod config;
pub mod context;
pub mod evaluator;
pub mod registry;
pub mod state;
pub mod streak;


pub use condition::{Comparison, Condition, LevelKind, MacdSignal, Pattern, VolumeMode};
pub use config::{AlertConfiguration, AlertPayload, Combinator};
pub use context::{build_context, IndicatorContext};
pub use evaluator::{evaluate_alert, evaluate_condition, AlertRuntime, ConditionResult, Evaluation, MarketFrame, Outcome, Undecidable};
pub use registry::{AlertRegistry, SymbolSnapshot};
pub use state::{AlertRecord, AlertState, ClarificationState, FiringEffect};

pub type AlertId = uuid::Uuid;
