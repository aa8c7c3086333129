use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tracing::{error, info};

use super::page;
use crate::errors::{SprintError, TrackerError};
use crate::service::SprintBoard;
use crate::view::SortColumn;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub board: Mutex<SprintBoard>,
    /// Set once a fatal error happens; the server loop shuts down on it.
    pub fatal: watch::Sender<Option<String>>,
}

impl AppState {
    pub fn new(board: SprintBoard) -> Self {
        let (fatal, _) = watch::channel(None);
        Self {
            board: Mutex::new(board),
            fatal,
        }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TaskAddForm {
    #[serde(default)]
    pub issue_list: String,
}

#[derive(Deserialize)]
pub struct CliForm {
    #[serde(default)]
    pub cli_text: String,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Conflict(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

/// Map a board error to a response, signalling shutdown when it is fatal.
fn fail(state: &AppState, err: SprintError) -> ApiError {
    let msg = err.to_string();
    if err.is_fatal() {
        error!(error = %msg, "Fatal error, shutting down");
        state.fatal.send_replace(Some(msg.clone()));
        return ApiError::Internal(msg);
    }
    match err {
        SprintError::InvalidState(_) => ApiError::Conflict(msg),
        SprintError::InvalidScrumNumber(_) => ApiError::BadRequest(msg),
        SprintError::Tracker(TrackerError::NotFound(_)) => ApiError::NotFound(msg),
        _ => ApiError::Internal(msg),
    }
}

fn to_board() -> Redirect {
    Redirect::to("/")
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(board))
        .route("/health", get(health_check))
        .route("/api/view", get(view_json))
        .route("/prev_scrum", get(prev_scrum))
        .route("/next_scrum", get(next_scrum))
        .route("/prev_sprint", get(prev_sprint))
        .route("/next_sprint", get(next_sprint))
        .route("/last", get(last))
        .route("/sort/{column}", get(sort))
        .route("/reload", get(reload))
        .route("/devel/{name}", get(dev_form))
        .route("/update", post(update))
        .route("/close_scrum", post(close_scrum))
        .route("/close_sprint", post(close_sprint))
        .route("/new_scrum", post(new_scrum))
        .route("/new_sprint", post(new_sprint))
        .route("/task_add", post(task_add))
        .route("/cli", post(cli))
}

// ── Handlers: reading ─────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn board(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let board = state.board.lock().await;
    let view = board.rendered().map_err(|e| fail(&state, e))?;
    let header = board.header(Utc::now()).map_err(|e| fail(&state, e))?;
    Ok(Html(page::board_page(&header, &view)))
}

async fn view_json(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let board = state.board.lock().await;
    let view = board.rendered().map_err(|e| fail(&state, e))?;
    let header = board.header(Utc::now()).map_err(|e| fail(&state, e))?;
    Ok(Json(serde_json::json!({ "header": header, "view": *view })))
}

async fn dev_form(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let board = state.board.lock().await;
    let tasks = board.dev_tasks(&name).map_err(|e| fail(&state, e))?;
    let scrum = board
        .project()
        .active_scrum()
        .map(|s| s.number)
        .ok_or_else(|| ApiError::Conflict("No scrum is active".into()))?;
    let display = board
        .project()
        .resolve_developer_name(&board.project().resolve_developer_id(&name));
    Ok(Html(page::dev_form_page(&display, scrum, &tasks)))
}

// ── Handlers: navigation ──────────────────────────────────────────────

async fn prev_scrum(State(state): State<SharedState>) -> Redirect {
    state.board.lock().await.prev_scrum();
    to_board()
}

async fn next_scrum(State(state): State<SharedState>) -> Redirect {
    state.board.lock().await.next_scrum();
    to_board()
}

async fn prev_sprint(State(state): State<SharedState>) -> Redirect {
    state.board.lock().await.prev_sprint();
    to_board()
}

async fn next_sprint(State(state): State<SharedState>) -> Redirect {
    state.board.lock().await.next_sprint();
    to_board()
}

async fn last(State(state): State<SharedState>) -> Redirect {
    state.board.lock().await.last();
    to_board()
}

async fn sort(
    State(state): State<SharedState>,
    Path(column): Path<String>,
) -> Result<Redirect, ApiError> {
    let column: SortColumn = column.parse().map_err(ApiError::BadRequest)?;
    state.board.lock().await.sort(column);
    Ok(to_board())
}

async fn reload(State(state): State<SharedState>) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board.reload().await.map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

// ── Handlers: mutations ───────────────────────────────────────────────

async fn update(
    State(state): State<SharedState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    let changed = board
        .apply_update(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())), Utc::now())
        .await
        .map_err(|e| fail(&state, e))?;
    info!(changed, "Scrum update submitted");
    Ok(to_board())
}

async fn close_scrum(State(state): State<SharedState>) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board.close_scrum().await.map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

async fn close_sprint(State(state): State<SharedState>) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board.close_sprint().await.map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

async fn new_scrum(State(state): State<SharedState>) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board
        .open_new_scrum(Utc::now())
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

async fn new_sprint(State(state): State<SharedState>) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board
        .open_new_sprint(Utc::now())
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

async fn task_add(
    State(state): State<SharedState>,
    Form(form): Form<TaskAddForm>,
) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board
        .add_tasks(&form.issue_list, Utc::now())
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(to_board())
}

async fn cli(
    State(state): State<SharedState>,
    Form(form): Form<CliForm>,
) -> Result<Redirect, ApiError> {
    let mut board = state.board.lock().await;
    board
        .run_admin(&form.cli_text)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(to_board())
}
