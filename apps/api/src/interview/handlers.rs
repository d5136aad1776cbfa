//! Axum route handlers for the Interview API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::InterviewEngine;
use crate::interview::prompts::{MODEL_UNAVAILABLE_WARNING, OPENING_PROMPT, TITLE, WELCOME};
use crate::interview::session::{Session, SessionSnapshot};
use crate::llm_client::selector::{ModelChoice, ModelOption};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub default: &'static str,
    pub models: Vec<ModelOption>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Sidebar identifier; the first choice when omitted.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub title: &'static str,
    pub welcome: &'static str,
    pub greeting: &'static str,
    pub session: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
    pub session: SessionSnapshot,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default: ModelChoice::default().identifier(),
        models: state.models.options(),
    })
}

/// POST /api/v1/sessions
///
/// Loads the chosen model once; the session keeps it until it is closed.
/// A bare POST with no JSON body opens a session on the default model.
pub async fn handle_create_session(
    State(state): State<AppState>,
    request: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let request = match request {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSessionRequest::default(),
        Err(rejection) => return Err(AppError::Validation(rejection.body_text())),
    };

    let model_id = request
        .model
        .unwrap_or_else(|| ModelChoice::default().identifier().to_string());

    let Some(model) = state.models.load(&model_id) else {
        warn!("Refusing session for unavailable model {model_id}");
        return Err(AppError::ModelUnavailable(
            MODEL_UNAVAILABLE_WARNING.to_string(),
        ));
    };

    let engine = InterviewEngine::new(model, state.config.question_max_attempts);
    let handle = state.sessions.insert(Session::new(model_id, engine)).await;
    let session = handle.lock().await.snapshot();

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            title: TITLE,
            welcome: WELCOME,
            greeting: OPENING_PROMPT,
            session,
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    let snapshot = handle.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// POST /api/v1/sessions/:id/messages
///
/// Runs one interview turn. Holds the session lock for the whole turn,
/// including any model calls.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let handle = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    let mut session = handle.lock().await;
    session.touch();
    let Session {
        engine,
        conversation,
        ..
    } = &mut *session;
    let reply = engine.process_turn(conversation, &request.content).await;

    Ok(Json(SendMessageResponse {
        reply,
        session: session.snapshot(),
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(session_id))
    }
}

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
