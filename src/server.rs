use crate::{
    error::ApiError,
    features::PropertyFeatures,
    model::{clamp_price, Regressor},
};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const CURRENCY: &str = "IDR";

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn Regressor>,
    pub log_rows: bool,
}

impl AppState {
    pub fn new(model: Arc<dyn Regressor>) -> Self {
        Self {
            model,
            log_rows: false,
        }
    }
}

// ---------- Response types ----------

#[derive(Serialize, Debug)]
pub struct PredictOut {
    pub predicted_price: i64,
    pub currency: &'static str,
}

// ---------- Handlers ----------

async fn home() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "price predictor is running; POST /predict to estimate a house price",
    }))
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictOut>, ApiError> {
    // Parse by hand so that empty and malformed bodies share one 400
    let payload: Value = serde_json::from_slice(&body).map_err(|_| ApiError::EmptyBody)?;

    let row = PropertyFeatures::from_payload(payload).map_err(|e| {
        tracing::warn!("rejected request: {}", e);
        e
    })?;

    if state.log_rows {
        tracing::info!(
            "recv location={} bed={} bath={} carport={} surface_area={} building_area={}",
            row.location, row.bed, row.bath, row.carport, row.surface_area, row.building_area
        );
    } else {
        tracing::debug!(?row, "recv");
    }

    let price = state
        .model
        .predict(&row)
        .and_then(clamp_price)
        .map_err(|e| {
            tracing::error!("prediction failed: {:#}", e);
            ApiError::Prediction(format!("{:#}", e))
        })?;

    Ok(Json(PredictOut {
        predicted_price: price,
        currency: CURRENCY,
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
