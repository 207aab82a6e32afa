//! HTTP request handlers
//!
//! Serves playlists and segments from the segment store.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::error::WriterError;

use super::ServeState;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    AssetNotFound(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::AssetNotFound(name) => {
                (StatusCode::NOT_FOUND, format!("Asset not found: {}", name))
            }
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, body).into_response()
    }
}

impl From<WriterError> for HttpError {
    fn from(err: WriterError) -> Self {
        HttpError::InternalError(err.to_string())
    }
}

/// What a request path resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Playlist,
    Segment,
}

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new($re).unwrap())
    }};
}

/// Check a request path against the allow-list.
///
/// Only flat names are served; anything with a directory component or
/// a `..` is refused.
pub fn classify_asset(name: &str) -> Option<AssetKind> {
    if name.contains("..") || name.contains('/') {
        return None;
    }
    let caps = regex!(r"^[A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*\.(m3u8|m4s)$").captures(name)?;
    match caps.get(1).map(|m| m.as_str()) {
        Some("m3u8") => Some(AssetKind::Playlist),
        Some("m4s") => Some(AssetKind::Segment),
        _ => None,
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("hls-record-writer v", env!("CARGO_PKG_VERSION"))
}

/// Playlists found in the store
#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub count: usize,
    pub playlists: Vec<String>,
}

/// List recorded playlists
/// GET /assets
pub async fn list_assets(
    State(state): State<Arc<ServeState>>,
) -> Result<Json<AssetListResponse>, HttpError> {
    let store = state.store.clone();
    let names = tokio::task::spawn_blocking(move || store.list())
        .await
        .map_err(|e| HttpError::InternalError(e.to_string()))??;

    let playlists: Vec<String> = names
        .into_iter()
        .filter(|n| classify_asset(n) == Some(AssetKind::Playlist))
        .collect();

    Ok(Json(AssetListResponse {
        count: playlists.len(),
        playlists,
    }))
}

/// Cache statistics
/// GET /debug/cache
pub async fn cache_stats(State(state): State<Arc<ServeState>>) -> impl IntoResponse {
    Json(state.cache.stats())
}

/// Playlist or segment endpoint
/// GET /{name}.m3u8, GET /{name}.m4s
pub async fn serve_asset(
    State(state): State<Arc<ServeState>>,
    Path(path): Path<String>,
) -> Result<Response, HttpError> {
    let kind = match classify_asset(&path) {
        Some(kind) => kind,
        None => {
            warn!("Refusing asset request: {}", path);
            return Err(HttpError::AssetNotFound(path));
        }
    };

    if kind == AssetKind::Segment {
        if let Some(data) = state.cache.get(&path) {
            debug!("Cache hit: {}", path);
            return Ok(segment_response(data));
        }
    }

    let store = state.store.clone();
    let name = path.clone();
    let data = tokio::task::spawn_blocking(move || store.read(&name))
        .await
        .map_err(|e| HttpError::InternalError(e.to_string()))??
        .ok_or_else(|| HttpError::AssetNotFound(path.clone()))?;

    match kind {
        // Playlists change while recording
        AssetKind::Playlist => Ok(playlist_response(data)),
        AssetKind::Segment => {
            state.cache.insert(&path, data.clone());
            Ok(segment_response(data))
        }
    }
}

fn playlist_response(data: Bytes) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Content-Type",
        HeaderValue::from_static("application/vnd.apple.mpegurl"),
    );
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));

    (headers, data).into_response()
}

fn segment_response(data: Bytes) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("video/iso.segment"));
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("public, max-age=31536000"),
    );

    (headers, data).into_response()
}
