//! HTTP surface: the list resolution endpoint and the SMS webhook.

use crate::message::{self, MessageKind};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use marquee::{DocumentFetcher, ListResolver};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// State shared by every handler.
pub struct AppState {
    pub resolver: ListResolver<Arc<dyn DocumentFetcher>>,
    /// Base URL for links in SMS replies.
    pub site_url: String,
}

impl AppState {
    pub fn new(resolver: ListResolver<Arc<dyn DocumentFetcher>>, site_url: impl Into<String>) -> Self {
        Self {
            resolver,
            site_url: site_url.into(),
        }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/imdb/list", post(resolve_list))
        .route("/v1/sms", post(sms_inbound))
        .route("/v1/sms/status", post(sms_status))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn start(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cached_lists": state.resolver.cache().len(),
    }))
}

#[derive(Deserialize, Default)]
struct ListParams {
    #[serde(default)]
    force: bool,
    max: Option<usize>,
}

#[derive(Deserialize, Default)]
struct ListRequest {
    #[serde(default)]
    url: Option<String>,
}

async fn resolve_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
    Json(body): Json<ListRequest>,
) -> Response {
    let Some(url) = body.url.filter(|u| !u.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url is required" })),
        )
            .into_response();
    };

    let records = state.resolver.resolve(&url, params.force, params.max).await;
    Json(records).into_response()
}

/// Twilio-style inbound message form.
#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct SmsForm {
    body: String,
    from: String,
    to: String,
}

async fn sms_inbound(State(state): State<Arc<AppState>>, Form(form): Form<SmsForm>) -> Response {
    let kind = message::classify_message(&form.body);
    tracing::info!(from = %form.from, to = %form.to, kind = kind.as_str(), "inbound sms");

    let reply = match kind {
        MessageKind::RandomPick => random_pick(&state, &form.body).await,
        _ => None,
    };
    xml(message::twiml(reply.as_deref()))
}

async fn random_pick(state: &AppState, body: &str) -> Option<String> {
    let url = message::extract_list_url(body)?;
    let records = state.resolver.resolve(&url, false, None).await;
    let Some(record) = message::pick_random(&records) else {
        tracing::debug!("no titles resolved from {url}, sending empty reply");
        return None;
    };
    Some(message::format_title(record, &state.site_url))
}

async fn sms_status(Form(status): Form<HashMap<String, String>>) -> StatusCode {
    tracing::debug!(
        sid = status.get("MessageSid").map(String::as_str).unwrap_or(""),
        status = status.get("MessageStatus").map(String::as_str).unwrap_or(""),
        "sms status callback"
    );
    StatusCode::OK
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], body).into_response()
}
