use super::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::Query,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

const DEFAULT_TAIL_LINES: usize = 200;
const MAX_TAIL_LINES: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct TailParams {
    pub lines: Option<usize>,
}

fn with_content_type(body: impl Into<axum::body::Body>, content_type: &'static str) -> Response {
    let mut resp = Response::new(body.into());
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    resp
}

fn not_available() -> Response {
    (StatusCode::NOT_FOUND, "Log file not available").into_response()
}

/// Last `lines` lines of the current log file
pub async fn logs_tail(
    State(state): State<AppState>,
    Query(params): Query<TailParams>,
) -> Response {
    let max_lines = params.lines.unwrap_or(DEFAULT_TAIL_LINES).min(MAX_TAIL_LINES);
    let Some(path) = resolve_log_file_path(&state.config.logging.file).await else {
        return not_available();
    };
    match fs::read_to_string(&path).await {
        Ok(contents) => {
            let lines: Vec<&str> = contents.lines().collect();
            let start = lines.len().saturating_sub(max_lines);
            with_content_type(lines[start..].join("\n"), "text/plain; charset=utf-8")
        }
        Err(_) => not_available(),
    }
}

pub async fn logs_download(State(state): State<AppState>) -> Response {
    let Some(path) = resolve_log_file_path(&state.config.logging.file).await else {
        return not_available();
    };
    match fs::read(&path).await {
        Ok(bytes) => with_content_type(bytes, "application/octet-stream"),
        Err(_) => not_available(),
    }
}

/// Live log lines as server-sent `log` events, filtered by the web level
pub async fn logs_stream() -> impl IntoResponse {
    let rx = crate::logging::subscribe_log_lines();
    let stream = BroadcastStream::new(rx).filter_map(|res| match res {
        Ok(line) if crate::logging::should_emit_to_web(&line) => {
            let event = Event::default().event("log").data(line);
            Some(Ok::<_, Infallible>(event))
        }
        _ => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// The daily appender writes `acbridge.<date>.log` next to the configured
// file; fall back to the newest of those when the file itself is missing.
pub(crate) async fn resolve_log_file_path(configured_path: &str) -> Option<PathBuf> {
    let configured = Path::new(configured_path);
    if let Ok(md) = fs::metadata(configured).await
        && md.is_file()
    {
        return Some(configured.to_path_buf());
    }
    let dir = if configured.extension().is_some() {
        configured.parent().unwrap_or_else(|| Path::new("."))
    } else {
        configured
    };

    let mut best: Option<(SystemTime, PathBuf)> = None;
    let mut rd = fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = rd.next_entry().await {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !(name.starts_with("acbridge.") && name.ends_with(".log")) {
            continue;
        }
        if let Ok(md) = entry.metadata().await
            && md.is_file()
            && let Ok(modified) = md.modified()
            && best.as_ref().is_none_or(|(t, _)| modified > *t)
        {
            best = Some((modified, entry.path()));
        }
    }
    best.map(|(_, p)| p)
}

#[derive(Deserialize)]
struct WebLevelQuery {
    level: String,
}

async fn set_web_log_level(Query(q): Query<WebLevelQuery>) -> impl IntoResponse {
    match crate::logging::parse_log_level(&q.level) {
        Ok(level) => {
            crate::logging::set_web_log_level(level);
            (
                StatusCode::OK,
                Json(serde_json::json!({"ok": true, "level": level.to_string()})),
            )
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        ),
    }
}

async fn get_web_log_level() -> impl IntoResponse {
    let level = crate::logging::get_web_log_level();
    Json(serde_json::json!({"level": level.to_string()}))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/logs/tail", get(logs_tail))
        .route("/api/logs/download", get(logs_download))
        .route("/api/logs/stream", get(logs_stream))
        .route(
            "/api/logs/web_level",
            post(set_web_log_level).get(get_web_log_level),
        )
}
