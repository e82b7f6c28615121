use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{info, warn};

use super::LLMClient;

/// Priority level for LLM requests
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    /// High priority: a user is waiting on a translation
    High,
    /// Normal priority: trigger explanations
    Normal,
}

impl Priority {
    /// What a request of this priority is for, as it appears in logs.
    pub fn purpose(self) -> &'static str {
        match self {
            Priority::High => "translation",
            Priority::Normal => "explanation",
        }
    }
}

/// A request to be queued for LLM processing
struct QueuedRequest {
    priority: Priority,
    system_prompt: String,
    user_input: String,
    response_tx: oneshot::Sender<Result<String, String>>,
}

/// LLM Queue that limits concurrent requests and serves translations first
#[derive(Clone)]
pub struct LLMQueue {
    high_tx: mpsc::Sender<QueuedRequest>,
    normal_tx: mpsc::Sender<QueuedRequest>,
}

impl LLMQueue {
    /// Create a new LLM Queue with the given client and max concurrent requests
    pub fn new(client: LLMClient, max_concurrent: usize, queue_size: usize) -> Self {
        let (high_tx, high_rx) = mpsc::channel::<QueuedRequest>(queue_size);
        let (normal_tx, normal_rx) = mpsc::channel::<QueuedRequest>(queue_size);

        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        tokio::spawn(Self::process_queue(client, semaphore, high_rx, normal_rx));

        Self { high_tx, normal_tx }
    }

    /// Process queued requests, prioritizing high-priority over normal-priority
    async fn process_queue(
        client: LLMClient,
        semaphore: Arc<Semaphore>,
        mut high_rx: mpsc::Receiver<QueuedRequest>,
        mut normal_rx: mpsc::Receiver<QueuedRequest>,
    ) {
        info!(
            "📬 [QUEUE] LLM Queue processor started (max concurrent: {})",
            semaphore.available_permits()
        );

        loop {
            let request = tokio::select! {
                biased;

                Some(req) = high_rx.recv() => req,
                Some(req) = normal_rx.recv() => req,
                else => {
                    info!("📬 [QUEUE] All channels closed, shutting down");
                    break;
                }
            };

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = request.response_tx.send(Err("Semaphore closed".to_string()));
                    continue;
                }
            };

            info!(
                "📬 [QUEUE] Running {} request, {} slots remaining",
                request.priority.purpose(),
                semaphore.available_permits()
            );

            let client = client.clone();
            tokio::spawn(async move {
                let result = client
                    .chat(&request.system_prompt, &request.user_input)
                    .await
                    .map_err(|e| e.to_string());
                if let Err(e) = &result {
                    warn!("⚠️ [QUEUE] {} request failed: {}", request.priority.purpose(), e);
                }

                let _ = request.response_tx.send(result);
                drop(permit);
            });
        }
    }

    /// Send a chat request with the specified priority
    pub async fn chat(
        &self,
        system_prompt: &str,
        user_input: &str,
        priority: Priority,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let (response_tx, response_rx) = oneshot::channel();

        let request = QueuedRequest {
            priority,
            system_prompt: system_prompt.to_string(),
            user_input: user_input.to_string(),
            response_tx,
        };

        let send_result = match priority {
            Priority::High => self.high_tx.send(request).await,
            Priority::Normal => self.normal_tx.send(request).await,
        };

        if send_result.is_err() {
            return Err(format!("Failed to queue {} request", priority.purpose()).into());
        }

        match response_rx.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err("LLM request was cancelled".into()),
        }
    }
}
