use async_trait::async_trait;
use serde::Deserialize;

use crate::agents::Agent;
use crate::alerts::AlertPayload;
use crate::error::AlertError;
use crate::llm::LLMQueue;

/// What the translation collaborator made of a free-text request.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslationResult {
    Confirmed {
        config: AlertPayload,
    },
    NeedsClarification {
        #[serde(default)]
        missing_info: Vec<String>,
        #[serde(alias = "question")]
        clarification_question: String,
    },
    Rejected {
        #[serde(default)]
        message: String,
    },
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<TranslationResult, AlertError>;
}

/// Slice out the JSON object from a reply that may wrap it in prose or a
/// markdown fence.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

pub fn parse_translation(raw: &str) -> Result<TranslationResult, AlertError> {
    let json = extract_json(raw)
        .ok_or_else(|| AlertError::MalformedTranslation("no JSON object in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| AlertError::MalformedTranslation(e.to_string()))
}

pub struct TranslatorAgent;

impl Agent for TranslatorAgent {
    fn name(&self) -> &str {
        "Translator-Agent"
    }

    fn system_prompt(&self) -> &str {
        r#"You convert a user's request for a stock market alert into a structured alert configuration. Indian equities (NSE/BSE) unless told otherwise.

Convert common aliases to exchange tickers (RIL=RELIANCE, SBI=SBIN). Never give investment advice: reject requests for tips, predictions or recommendations.
If the request lacks something you need (which stock, which threshold, which direction), ask for it instead of guessing.

Output MUST be a single valid JSON object, one of:

{"status": "CONFIRMED", "config": {
    "symbol": "TCS",
    "exchange": "NSE",
    "combinator": "AND" | "OR",
    "one_shot": true | false,
    "conditions": [ ...condition objects... ]
}}
{"status": "NEEDS_CLARIFICATION", "missing_info": ["threshold"], "clarification_question": "At what price should I alert you?"}
{"status": "REJECTED", "message": "I cannot provide investment advice."}

Condition objects (omitted parameters take the defaults shown):
- {"type": "price_cross", "operator": "above" | "below", "value": 4000}
- {"type": "daily_close", "operator": "above" | "below", "value": 1700, "consecutive_days": 1}
- {"type": "volume_comparison", "comparison": "average" | "max", "lookback_period": 20, "multiplier": 1.5}   (multiplier only with "average")
- {"type": "rsi", "operator": "above" | "below", "value": 30, "period": 14}
- {"type": "macd", "fast_period": 12, "slow_period": 26, "signal_period": 9, "signal": "bullish_crossover" | "bearish_crossover" | "above_zero" | "below_zero"}
- {"type": "moving_average_cross", "fast_period": 50, "slow_period": 200, "ma_type": "sma" | "ema", "direction": "bullish" | "bearish"}
- {"type": "pattern", "pattern": {"kind": "consolidation_breakout", "period": 20, "range_threshold": 0.05, "breakout_margin": 0.0}}
- {"type": "pattern", "pattern": {"kind": "week_52_high"}} or {"kind": "week_52_low"}
- {"type": "pattern", "pattern": {"kind": "volume_spike", "multiplier": 2.0, "lookback_period": 20}}
- {"type": "pattern", "pattern": {"kind": "bollinger_breakout", "period": 20, "std_dev": 2.0, "band": "upper" | "lower"}}
- {"type": "pattern", "pattern": {"kind": "supertrend", "period": 7, "multiplier": 3.0, "direction": "buy" | "sell"}}
- {"type": "pattern", "pattern": {"kind": "vwap", "operator": "above" | "below", "lookback_period": 20}}
- {"type": "support_resistance", "level": "support" | "resistance", "lookback_period": 20, "value": 1400}   (value optional)

"Breakout" with no other detail means: price above the 52-week high AND volume above 1.5x the 20-day average.
Use "one_shot": true when the user wants to be told once ("tell me when"), false for "every time".
"#
    }
}

/// Translator backed by the LLM queue at high priority.
pub struct LlmTranslator {
    llm: LLMQueue,
    agent: TranslatorAgent,
}

impl LlmTranslator {
    pub fn new(llm: LLMQueue) -> Self {
        Self {
            llm,
            agent: TranslatorAgent,
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str) -> Result<TranslationResult, AlertError> {
        let reply = self
            .agent
            .run_high_priority(text, &self.llm)
            .await
            .map_err(|e| AlertError::TranslationFailed(e.to_string()))?;
        parse_translation(&reply)
    }
}
