use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::debug;

use crate::builder::SentimentResultBuilder;
use crate::history::{History, HistoryEntry};
use crate::render::render_page;
use crate::result::SentimentResult;
use crate::session::{new_session_id, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub builder: Arc<SentimentResultBuilder>,
    pub sessions: Arc<SessionStore>,
    pub static_dir: PathBuf,
}

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/analyze", post(api_analyze))
        .route("/api/history", get(api_history))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/static", static_files)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct AnalyzeForm {
    #[serde(default)]
    text_input: Option<String>,
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResp {
    result: Option<SentimentResult>,
    history: History,
}

/// Session id for this request, and whether a cookie must be issued.
fn session_for(state: &AppState, headers: &HeaderMap) -> (String, bool) {
    match state.sessions.session_id(headers) {
        Some(sid) => (sid, false),
        None => (new_session_id(), true),
    }
}

fn with_cookie(mut resp: Response, state: &AppState, sid: &str, fresh: bool) -> Response {
    if fresh {
        if let Ok(v) = HeaderValue::from_str(&state.sessions.set_cookie(sid)) {
            resp.headers_mut().insert(header::SET_COOKIE, v);
        }
    }
    resp
}

fn current_history(state: &AppState, headers: &HeaderMap) -> History {
    state
        .sessions
        .session_id(headers)
        .map(|sid| state.sessions.load(&sid))
        .unwrap_or_default()
}

/// Classify `text` within the caller's session. Empty text changes nothing
/// and issues no cookie.
async fn classify_in_session(
    state: &AppState,
    headers: &HeaderMap,
    text: &str,
) -> (Option<SentimentResult>, History, Option<(String, bool)>) {
    if text.is_empty() {
        return (None, current_history(state, headers), None);
    }
    let (sid, fresh) = session_for(state, headers);
    let result = state.builder.analyze(text).await;
    // prepend under the store lock so concurrent requests of one session
    // don't overwrite each other's entries
    let history = state
        .sessions
        .prepend(&sid, HistoryEntry::from_result(&result));
    (Some(result), history, Some((sid, fresh)))
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let history = current_history(&state, &headers);
    Html(render_page(None, &history))
}

async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<AnalyzeForm>, FormRejection>,
) -> Response {
    let text = match form {
        Ok(Form(f)) => f.text_input.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "form rejected; treating as empty submission");
            String::new()
        }
    };

    let (result, history, session) = classify_in_session(&state, &headers, &text).await;
    let resp = Html(render_page(result.as_ref(), &history)).into_response();
    match session {
        Some((sid, fresh)) => with_cookie(resp, &state, &sid, fresh),
        None => resp,
    }
}

async fn api_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Response {
    let text = match body {
        Ok(Json(req)) => req.text,
        Err(e) => return e.into_response(),
    };

    let (result, history, session) = classify_in_session(&state, &headers, &text).await;
    let resp = Json(AnalyzeResp { result, history }).into_response();
    match session {
        Some((sid, fresh)) => with_cookie(resp, &state, &sid, fresh),
        None => resp,
    }
}

async fn api_history(State(state): State<AppState>, headers: HeaderMap) -> Json<History> {
    Json(current_history(&state, &headers))
}
