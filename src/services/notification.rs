//! Trigger delivery: explanation, cooldown and the outbound notifier.
//!
//! Everything here runs off the bus after the trigger decision; a failure is
//! logged and never reaches the dispatcher or the registry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::agents::{render_trigger_message, Explainer};
use crate::bus::EventBus;
use crate::constants::runtime::TELEGRAM_TIMEOUT_SECS;
use crate::error::NotifyError;
use crate::events::{Event, TriggerEvent};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, owner: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log. Used when no bot token is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, owner: &str, message: &str) -> Result<(), NotifyError> {
        info!("📨 [NOTIFY] to {}:\n{}", owner, message);
        Ok(())
    }
}

/// Telegram Bot API `sendMessage`; the alert owner is the chat id.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Result<Self, NotifyError> {
        Self::with_base_url(token, "https://api.telegram.org".to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, owner: &str, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": owner,
                "text": message,
                "parse_mode": "HTML",
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

pub struct NotificationService {
    explainer: Option<Arc<dyn Explainer>>,
    notifier: Arc<dyn Notifier>,
    cooldown: Duration,
    /// (owner, symbol) -> last delivery
    last_sent: DashMap<(String, String), DateTime<Utc>>,
}

impl NotificationService {
    pub fn new(explainer: Option<Arc<dyn Explainer>>, notifier: Arc<dyn Notifier>, cooldown_secs: u64) -> Self {
        Self {
            explainer,
            notifier,
            cooldown: i64::try_from(cooldown_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            last_sent: DashMap::new(),
        }
    }

    /// Claims the (owner, symbol) slot at `now` if it is outside the cooldown.
    pub fn try_claim(&self, owner: &str, symbol: &str, now: DateTime<Utc>) -> bool {
        match self.last_sent.entry((owner.to_string(), symbol.to_string())) {
            Entry::Occupied(mut last) => {
                if now - *last.get() < self.cooldown {
                    return false;
                }
                last.insert(now);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    /// Give back a slot claimed at `claimed_at`; a newer claim is kept.
    fn release(&self, owner: &str, symbol: &str, claimed_at: DateTime<Utc>) {
        self.last_sent
            .remove_if(&(owner.to_string(), symbol.to_string()), |_, at| *at == claimed_at);
    }

    async fn message_for(&self, trigger: &TriggerEvent) -> String {
        if let Some(explainer) = &self.explainer {
            match explainer.explain(trigger).await {
                Ok(text) => return text,
                Err(e) => warn!("⚠️ [NOTIFY] Explanation failed for {}, using template: {}", trigger.alert_id, e),
            }
        }
        render_trigger_message(trigger)
    }

    /// Returns whether a notification was sent.
    pub async fn handle(&self, trigger: &TriggerEvent) -> Result<bool, NotifyError> {
        if !self.try_claim(&trigger.owner, &trigger.symbol, trigger.fired_at) {
            info!(
                "⏰ [COOLDOWN] Skipping {} for {} on {}",
                trigger.alert_id, trigger.owner, trigger.symbol
            );
            return Ok(false);
        }
        let message = self.message_for(trigger).await;
        if let Err(e) = self.notifier.deliver(&trigger.owner, &message).await {
            self.release(&trigger.owner, &trigger.symbol, trigger.fired_at);
            return Err(e);
        }
        info!("📨 [NOTIFY] Sent alert {} to {}", trigger.alert_id, trigger.owner);
        Ok(true)
    }

    pub fn start(self: Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            info!("📨 [NOTIFY] Notification service started");
            loop {
                match rx.recv().await {
                    Ok(Event::Trigger(trigger)) => {
                        let service = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = service.handle(&trigger).await {
                                error!("❌ [NOTIFY] Delivery failed for {}: {}", trigger.alert_id, e);
                            }
                        });
                    }
                    Ok(Event::Tick(_)) => {}
                    Err(RecvError::Lagged(n)) => warn!("⚠️ [NOTIFY] Lagged, {} events skipped", n),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
