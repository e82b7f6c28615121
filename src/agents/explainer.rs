use async_trait::async_trait;
use serde_json::json;

use crate::agents::Agent;
use crate::alerts::Outcome;
use crate::error::NotifyError;
use crate::events::TriggerEvent;
use crate::llm::LLMQueue;

#[async_trait]
pub trait Explainer: Send + Sync {
    /// Human-readable message for one trigger, Telegram HTML.
    async fn explain(&self, trigger: &TriggerEvent) -> Result<String, NotifyError>;
}

pub struct ExplainerAgent;

impl Agent for ExplainerAgent {
    fn name(&self) -> &str {
        "Explainer-Agent"
    }

    fn system_prompt(&self) -> &str {
        r#"You write short stock alert notifications for a Telegram bot.

You receive a JSON object describing an alert that just fired: the symbol, the live tick, the conditions that were evaluated and a snapshot of indicator values.
Explain in 2-4 short lines what happened and which conditions were met, quoting the numbers from the snapshot. Do not invent values that are not in the input.
Never give buy/sell advice or predictions.

Format with Telegram HTML only (<b>, <i>), no markdown. Start with the symbol in bold.
"#
    }
}

/// Explanations from the LLM queue at normal priority.
pub struct LlmExplainer {
    llm: LLMQueue,
    agent: ExplainerAgent,
}

impl LlmExplainer {
    pub fn new(llm: LLMQueue) -> Self {
        Self {
            llm,
            agent: ExplainerAgent,
        }
    }
}

#[async_trait]
impl Explainer for LlmExplainer {
    async fn explain(&self, trigger: &TriggerEvent) -> Result<String, NotifyError> {
        let input = json!({
            "symbol": trigger.symbol,
            "exchange": trigger.exchange,
            "last_price": trigger.tick.last_price,
            "volume": trigger.tick.volume,
            "conditions": trigger.results,
            "indicators": trigger.context.values,
            "one_shot": trigger.one_shot,
        })
        .to_string();

        let reply = self
            .agent
            .run(&input, &self.llm)
            .await
            .map_err(|e| NotifyError::Explain(e.to_string()))?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(NotifyError::Explain("empty explanation".to_string()));
        }
        Ok(reply.to_string())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Deterministic message used when no explainer is configured or it fails.
pub fn render_trigger_message(trigger: &TriggerEvent) -> String {
    let mut lines = vec![
        format!(
            "🔔 <b>{}</b> ({}) alert triggered",
            escape_html(&trigger.symbol),
            escape_html(&trigger.exchange)
        ),
        format!("💰 Price: ₹{:.2}", trigger.tick.last_price),
    ];

    if let Some(change) = trigger.context.get("change_pct") {
        lines.push(format!("📈 Change: {:+.2}%", change));
    }
    if let Some(avg) = trigger.context.get("avg_volume_20") {
        if avg > 0.0 {
            lines.push(format!(
                "📊 Volume: {:.0} ({:.1}x 20-day avg)",
                trigger.tick.volume,
                trigger.tick.volume / avg
            ));
        }
    }

    let met: Vec<&str> = trigger
        .results
        .iter()
        .filter(|r| r.outcome == Outcome::Pass)
        .map(|r| r.kind)
        .collect();
    if !met.is_empty() {
        lines.push(format!("✅ Conditions met: {}", met.join(", ")));
    }

    for (key, value) in &trigger.context.values {
        if key.starts_with("rsi_") || key.starts_with("macd_") || key.starts_with("sma_") || key.starts_with("ema_") {
            lines.push(format!("• {}: {:.2}", escape_html(key), value));
        }
    }

    if trigger.one_shot {
        lines.push("<i>This alert has now been deactivated.</i>".to_string());
    }
    lines.join("\n")
}
