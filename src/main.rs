use market_sentinel::agents::{Explainer, LlmExplainer, LlmTranslator, Translator};
use market_sentinel::alerts::AlertRegistry;
use market_sentinel::api::{run_server, AppState};
use market_sentinel::bus::EventBus;
use market_sentinel::config::AppConfig;
use market_sentinel::data::{HistoryProvider, MarketStore, SessionClock};
use market_sentinel::llm::{LLMClient, LLMQueue};
use market_sentinel::services::{AlertService, Dispatcher, LogNotifier, NotificationService, Notifier, TelegramNotifier};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Market Sentinel...");

    // Load Configuration
    let config = AppConfig::load()?;
    info!(
        "Loaded Configuration: session close {} (UTC{:+}m, ±{}m), lookback {}",
        config.session.close_time,
        config.session.utc_offset_minutes,
        config.session.close_window_minutes,
        config.dispatcher.history_lookback
    );
    let clock = SessionClock::from_config(&config.session)?;

    // Initialize Clients
    info!("Initializing AI Clients...");
    let api_key = config.llm.api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        warn!("⚠️ No LLM API key configured; translations will fail until OPENAI_API_KEY is set");
    }
    if let Some(url) = &config.llm.base_url {
        info!("Using Custom OpenAI Base URL: {}", url);
    }
    let models = config.llm_models();
    info!("Using LLM Models: {:?}", models);

    let llm_client = LLMClient::new(api_key, config.llm.base_url.clone(), models);
    info!(
        "📬 Initializing LLM Queue (max concurrent: {}, size: {})...",
        config.llm.max_concurrent, config.llm.queue_size
    );
    let llm_queue = LLMQueue::new(llm_client, config.llm.max_concurrent, config.llm.queue_size);

    // Core
    let bus = EventBus::new(config.dispatcher.bus_capacity);
    let registry = Arc::new(AlertRegistry::new());
    let store = MarketStore::new(config.dispatcher.history_limit);
    let history: Arc<dyn HistoryProvider> = Arc::new(store.clone());

    Dispatcher::new(
        bus.clone(),
        registry.clone(),
        history,
        clock,
        config.dispatcher.clone(),
    )
    .start();

    // Notifications
    let notifier: Arc<dyn Notifier> = match &config.notifications.telegram_bot_token {
        Some(token) => {
            info!("📨 Telegram delivery enabled");
            Arc::new(TelegramNotifier::new(token.clone())?)
        }
        None => {
            info!("ℹ️ TELEGRAM_BOT_TOKEN not set - notifications go to the log");
            Arc::new(LogNotifier)
        }
    };
    let explainer: Option<Arc<dyn Explainer>> = if config.notifications.explain_with_llm {
        Some(Arc::new(LlmExplainer::new(llm_queue.clone())))
    } else {
        None
    };
    Arc::new(NotificationService::new(
        explainer,
        notifier,
        config.notifications.cooldown_secs,
    ))
    .start(&bus);

    // Create App State
    let translator: Arc<dyn Translator> = Arc::new(LlmTranslator::new(llm_queue));
    let app_state = Arc::new(AppState {
        alerts: AlertService::new(registry, translator),
        store,
        bus,
    });

    // Start API Server
    info!("Initializing API Server...");
    run_server(app_state, &config.api.bind_addr).await?;

    Ok(())
}
