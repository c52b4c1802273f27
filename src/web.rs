//! JSON HTTP surface over [`DomainService`]

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::{DomainSmithError, Result};
use crate::service::{DomainService, GenerateRequest, GenerateResponse};
use crate::types::WhoisInfo;

pub type AppState = Arc<DomainService>;

/// Body of `POST /refresh_whois`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub whois: WhoisInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Handler error rendered as `{success: false, error}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<DomainSmithError> for ApiError {
    fn from(err: DomainSmithError) -> Self {
        if err.is_validation() {
            Self::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "Request failed");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Routes with the shared service attached
pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/refresh_whois", post(refresh_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn generate_handler(
    State(service): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> std::result::Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload?;
    let response = service.generate(&request).await?;
    Ok(Json(response))
}

async fn refresh_handler(
    State(service): State<AppState>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> std::result::Result<Json<RefreshResponse>, ApiError> {
    let Json(request) = payload?;
    let domain = request
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing domain"))?;

    let whois = service.refresh_whois(&domain).await?;
    Ok(Json(RefreshResponse {
        success: true,
        whois,
    }))
}

async fn health_handler(State(service): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        Json(service.health()),
    )
}

/// Serve until Ctrl-C, then persist the cache
pub async fn serve(service: AppState, address: &str) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| {
            DomainSmithError::network(format!("Failed to bind: {}", e), Some(address.to_string()))
        })?;

    tracing::info!(address, "Listening");

    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DomainSmithError::internal(format!("Server error: {}", e)))?;

    service.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
