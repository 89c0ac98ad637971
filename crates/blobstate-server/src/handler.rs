//! HTTP handlers.
//!
//! Each handler turns one request into store calls and picks the status code
//! from what the store returned. Backend failures always become 500; an
//! absent item is the only source of 404.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use blobstate_store::{Item, Store, StoreError};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::router::endpoints;
use crate::templates::Templates;

pub const HEALTH_CONTENT_TYPE: &str = "application/health+json; charset=utf-8";

const FALLBACK_MIME: &str = "application/octet-stream";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    pub healthy: Arc<AtomicBool>,
    pub templates: Arc<Templates>,
}

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Whether any `Accept` entry names `media` exactly (parameters ignored).
fn accepts(headers: &HeaderMap, media: &str) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.split(';').next())
        .any(|entry| entry.trim().eq_ignore_ascii_case(media))
}

fn backend_failure(op: &str, name: &str, err: StoreError) -> Response {
    tracing::error!(op, name, error = %err, "store call failed");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn content_type_of(item: &Item) -> HeaderValue {
    HeaderValue::from_str(item.mime_type())
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_MIME))
}

/// `GET /`
pub async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !accepts(&headers, "text/html") {
        return "Hello, World!".into_response();
    }
    match state.templates.index(&state.config.color) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "index page failed to render");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let (code, status) = if state.healthy.load(Ordering::SeqCst) {
        (StatusCode::OK, "pass")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "fail")
    };
    let body = serde_json::to_string(&HealthResponse { status: status.into() }).unwrap_or_default();
    (code, [(CONTENT_TYPE, HEALTH_CONTENT_TYPE)], body).into_response()
}

/// `GET /env`: the process environment, one `KEY=VALUE` per line.
pub async fn env_handler(State(state): State<AppState>) -> Response {
    if state.config.is_production() {
        return StatusCode::FORBIDDEN.into_response();
    }
    let body: String = std::env::vars_os()
        .map(|(key, value)| format!("{}={}\n", key.to_string_lossy(), value.to_string_lossy()))
        .collect();
    body.into_response()
}

/// `GET /state/{name}`
pub async fn get_state(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.fetch(&name).await {
        Ok(Some(item)) => {
            let content_type = content_type_of(&item);
            let body = Body::from(item.data().clone());
            (StatusCode::OK, [(CONTENT_TYPE, content_type)], body).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => backend_failure("fetch", &name, err),
    }
}

/// `HEAD /state/{name}`: headers of `GET` with an empty body.
pub async fn head_state(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.fetch(&name).await {
        Ok(Some(item)) => {
            let headers = [
                (CONTENT_TYPE, content_type_of(&item)),
                (CONTENT_LENGTH, HeaderValue::from(item.len())),
            ];
            (StatusCode::OK, headers, Body::empty()).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => backend_failure("fetch", &name, err),
    }
}

/// `PUT /state/{name}`
///
/// 201 when the name was new, 200 when the stored item already had this
/// media type and payload (nothing is written), 204 when it was replaced.
pub async fn put_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(mime_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| value.parse::<mime::Mime>().is_ok())
    else {
        return (StatusCode::BAD_REQUEST, "Content-Type must be a valid media type").into_response();
    };

    let item = Item::new(name, mime_type, body);
    let prior = match state.store.fetch(item.name()).await {
        Ok(prior) => prior,
        Err(err) => return backend_failure("fetch", item.name(), err),
    };
    if prior.as_ref().is_some_and(|prior| prior.same_content(&item)) {
        return StatusCode::OK.into_response();
    }

    let name = item.name().to_owned();
    if let Err(err) = state.store.add(item).await {
        return backend_failure("add", &name, err);
    }
    if prior.is_some() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

/// `DELETE /state/{name}`
pub async fn delete_state(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.fetch(&name).await {
        Ok(Some(_)) => match state.store.remove(&name).await {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(err) => backend_failure("remove", &name, err),
        },
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => backend_failure("fetch", &name, err),
    }
}

/// `GET /states`: every stored path, as JSON or one per line.
pub async fn list_states(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut names = match state.store.list().await {
        Ok(names) => names,
        Err(err) => return backend_failure("list", "*", err),
    };
    names.sort_unstable();
    let paths: Vec<String> = names
        .iter()
        .map(|name| format!("{}{name}", endpoints::STATE_PREFIX))
        .collect();

    if accepts(&headers, "application/json") {
        Json(paths).into_response()
    } else {
        paths.join("\n").into_response()
    }
}

/// Anything unrouted.
pub async fn fallback_handler() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}
