//! API routes
//!
//! The presentation boundary. Handlers translate the three user actions
//! (submit a question, clear the transcript, drop the session) onto the
//! session store and the gateway, and expose the transcript plus a
//! server-sent-events change feed for re-rendering.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::manager::SharedSession;
use crate::session::Turn;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: Uuid,
}

/// Snapshot of one session for rendering.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// User-visible request failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Unknown session: {id}"),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Reject blank submissions before they reach the session or the gateway.
fn validate_question(input: &str) -> Result<(), ApiError> {
    if input.trim().is_empty() {
        return Err(ApiError::validation("Please enter a question."));
    }
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (id, _) = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ids = state.sessions.ids().await;
    Json(serde_json::json!({ "sessions": ids }))
}

async fn lookup(state: &AppState, id: Uuid) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(id))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = lookup(&state, id).await?;
    let session = session.read().await;

    Ok(Json(SessionView {
        id: session.id,
        created_at: session.created_at,
        updated_at: session.updated_at,
        turns: session.snapshot(),
    }))
}

async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let session = lookup(&state, id).await?;
    validate_question(&request.question)?;

    session.write().await.add_user(&request.question);

    // The lock is not held across the network round trip; the generation may
    // take the full request timeout.
    match state.gateway.generate(&request.question).await {
        Ok(answer) => {
            session.write().await.add_assistant(&answer);
            Ok(Json(AskResponse { answer }))
        }
        Err(e) => {
            // The user turn stays in the transcript so the user can resubmit.
            tracing::warn!(session_id = %id, error = %e, "generation failed");
            Err(ApiError::bad_gateway(format!("An error occurred: {e}")))
        }
    }
}

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = lookup(&state, id).await?;
    session.write().await.clear();
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(id))
    }
}

/// Change feed: emits the session's revision after every mutation so the
/// presentation layer knows when to refresh. Ends when the session is
/// dropped.
async fn session_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = lookup(&state, id).await?;
    let mut revisions = session.read().await.subscribe();

    let stream = async_stream::stream! {
        loop {
            let revision = *revisions.borrow_and_update();
            yield Ok(Event::default().event("changed").data(revision.to_string()));
            if revisions.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/sessions", post(create_session).get(list_sessions))
        .route(
            "/v1/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/v1/sessions/:id/ask", post(ask))
        .route("/v1/sessions/:id/clear", post(clear_session))
        .route("/v1/sessions/:id/events", get(session_events))
}
