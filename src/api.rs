use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::alerts::AlertId;
use crate::bus::EventBus;
use crate::data::{MarketStore, PriceBar};
use crate::error::{AlertError, DataError};
use crate::events::Tick;
use crate::services::{AlertService, SubmitOutcome};

pub struct AppState {
    pub alerts: AlertService,
    pub store: MarketStore,
    pub bus: EventBus,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({"error": self.1}))).into_response()
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        let status = match &err {
            AlertError::InvalidConfiguration(_) | AlertError::MalformedTranslation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AlertError::TranslationRejected(_) => StatusCode::BAD_REQUEST,
            AlertError::TranslationFailed(_) => StatusCode::BAD_GATEWAY,
            AlertError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AlertError::AlertNotFound { .. } => StatusCode::NOT_FOUND,
        };
        ApiError(status, err.to_string())
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError(StatusCode::CONFLICT, err.to_string())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/alerts", post(create_alert).get(list_alerts))
        .route("/alerts/{id}", get(get_alert).delete(delete_alert))
        .route("/alerts/{id}/clarify", post(clarify_alert))
        .route("/market/bars", post(append_bars))
        .route("/market/ticks", post(publish_tick))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>, bind_addr: &str) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("API Server listening on {}", bind_addr);
    axum::serve(listener, app).await
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.alerts.registry();
    Json(json!({
        "status": "ok",
        "registry_version": registry.version(),
        "active_symbols": registry.active_symbols(),
    }))
}

#[derive(Deserialize)]
struct CreateAlertRequest {
    owner: String,
    text: String,
}

#[derive(Deserialize)]
struct ClarifyRequest {
    text: String,
}

fn outcome_response(outcome: SubmitOutcome) -> Response {
    match outcome {
        SubmitOutcome::Activated(record) => (
            StatusCode::CREATED,
            Json(json!({"status": "active", "alert": record})),
        )
            .into_response(),
        SubmitOutcome::NeedsClarification(record) => (
            StatusCode::ACCEPTED,
            Json(json!({"status": "awaiting_clarification", "alert": record})),
        )
            .into_response(),
    }
}

async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<Response, ApiError> {
    if req.owner.trim().is_empty() || req.text.trim().is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "owner and text are required".to_string()));
    }
    let outcome = state.alerts.submit(&req.owner, &req.text).await?;
    Ok(outcome_response(outcome))
}

async fn clarify_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AlertId>,
    Json(req): Json<ClarifyRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.alerts.clarify(id, &req.text).await?;
    Ok(outcome_response(outcome))
}

async fn get_alert(State(state): State<Arc<AppState>>, Path(id): Path<AlertId>) -> Result<Response, ApiError> {
    match state.alerts.get(id) {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(AlertError::AlertNotFound { id: id.to_string() }.into()),
    }
}

async fn delete_alert(State(state): State<Arc<AppState>>, Path(id): Path<AlertId>) -> Result<StatusCode, ApiError> {
    state.alerts.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ListParams {
    owner: String,
}

async fn list_alerts(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> impl IntoResponse {
    Json(state.alerts.list(&params.owner))
}

#[derive(Deserialize)]
struct BarsRequest {
    symbol: String,
    bars: Vec<PriceBar>,
}

async fn append_bars(State(state): State<Arc<AppState>>, Json(req): Json<BarsRequest>) -> Result<Response, ApiError> {
    let symbol = req.symbol.trim().to_uppercase();
    let added = state.store.extend_bars(&symbol, req.bars)?;
    Ok(Json(json!({
        "symbol": symbol,
        "added": added,
        "total": state.store.bar_count(&symbol),
    }))
    .into_response())
}

async fn publish_tick(State(state): State<Arc<AppState>>, Json(mut tick): Json<Tick>) -> impl IntoResponse {
    tick.symbol = tick.symbol.trim().to_uppercase();
    if state.bus.publish_tick(tick).is_err() {
        warn!("⚠️ [API] Tick published with no subscribers");
    }
    StatusCode::ACCEPTED
}
