pub mod queue;

#[cfg(test)]
mod llm_tests;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::error::Error;
use tracing::{info, warn};

pub use queue::{LLMQueue, Priority};

#[derive(Clone)]
pub struct LLMClient {
    pub client: Client<OpenAIConfig>,
    /// Primary model first, then fallbacks in order
    pub models: Vec<String>,
}

impl LLMClient {
    pub fn new(api_key: String, base_url: Option<String>, models: Vec<String>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        let client = Client::with_config(config);
        Self { client, models }
    }

    /// Ask each model in turn until one answers with non-empty content.
    pub async fn chat(&self, system_prompt: &str, user_input: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut last_err: Option<Box<dyn Error + Send + Sync>> = None;

        for model in &self.models {
            match self.chat_with_model(model, system_prompt, user_input).await {
                Ok(content) if !content.trim().is_empty() => return Ok(content),
                Ok(_) => {
                    warn!("🤖 Empty response from {}, trying next model", model);
                    last_err = Some(format!("empty response from {}", model).into());
                }
                Err(e) => {
                    warn!("🤖 Model {} failed: {}", model, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "no LLM models configured".into()))
    }

    async fn chat_with_model(
        &self,
        model: &str,
        system_prompt: &str,
        user_input: &str,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        info!("🤖 Sending request to LLM (Model: {})...", model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages([
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system_prompt)
                        .build()?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(user_input)
                        .build()?,
                ),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        info!("🤖 LLM Response received.");

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
