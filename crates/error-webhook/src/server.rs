//! HTTP server for error-tracking webhooks.

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handler::{WebhookHandler, WebhookResponse};
use crate::models::Provider;
use crate::webhooks::signature_header;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<WebhookHandler>,
}

impl AppState {
    #[must_use]
    pub fn new(handler: WebhookHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhooks/glitchtip", post(glitchtip_webhook_handler))
        .route("/webhooks/betterstack", post(betterstack_webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the address.
pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Error webhook server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn glitchtip_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResponse {
    handle(&state, Provider::GlitchTip, &headers, &body).await
}

async fn betterstack_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResponse {
    handle(&state, Provider::BetterStack, &headers, &body).await
}

async fn handle(
    state: &AppState,
    provider: Provider,
    headers: &HeaderMap,
    body: &[u8],
) -> WebhookResponse {
    let signature = signature_header(headers, provider);
    state
        .handler
        .handle(provider, body, signature.as_deref())
        .await
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.body)).into_response();
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) =
                (HeaderName::try_from(name), HeaderValue::try_from(value))
            {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
