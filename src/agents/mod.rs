pub mod explainer;
pub mod translator;

#[cfg(test)]
mod agents_tests;

use crate::llm::{LLMQueue, Priority};
use std::error::Error;

use tracing::info;

pub use explainer::{render_trigger_message, Explainer, ExplainerAgent, LlmExplainer};
pub use translator::{parse_translation, LlmTranslator, TranslationResult, Translator, TranslatorAgent};

pub trait Agent {
    fn name(&self) -> &str;
    fn system_prompt(&self) -> &str;

    /// Run the agent with normal priority (trigger explanations)
    async fn run(&self, query: &str, llm: &LLMQueue) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.run_with_priority(query, llm, Priority::Normal).await
    }

    /// Run the agent with high priority (a user is waiting)
    async fn run_high_priority(&self, query: &str, llm: &LLMQueue) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.run_with_priority(query, llm, Priority::High).await
    }

    async fn run_with_priority(
        &self,
        query: &str,
        llm: &LLMQueue,
        priority: Priority,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        info!("🤖 [AGENT] Queueing {} request for {}...", priority.purpose(), self.name());
        let response = llm.chat(self.system_prompt(), query, priority).await?;
        info!("🤖 [AGENT] Response from {}: {}", self.name(), response);
        Ok(response)
    }
}
