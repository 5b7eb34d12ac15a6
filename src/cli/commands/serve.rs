//! HTTP API server for integration with other systems.
//!
//! Every client works in its own session. A session's requests are handled one at a time.
//! Sessions left idle past the timeout are dropped the next time a session is created.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::{EchoError, ErrorKind};
use crate::orchestrator::Orchestrator;
use crate::session::{ConversationTurn, Session};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

type SharedSession = Arc<Mutex<Session>>;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

/// All live sessions, keyed by id.
struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    async fn create(&self) -> Uuid {
        let now = Instant::now();
        self.evict_idle(now).await;

        let id = Uuid::new_v4();
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                session: Arc::new(Mutex::new(Session::new())),
                last_used: now,
            },
        );
        id
    }

    /// Look up a session and mark it as used.
    async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop sessions idle for longer than the timeout as of `now`. A session busy with a
    /// request is kept. Returns how many were dropped.
    async fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.last_used);
            let keep = idle <= self.idle_timeout || entry.session.try_lock().is_err();
            if !keep {
                info!("Dropping session {} after {}s idle", id, idle.as_secs());
            }
            keep
        });
        before - sessions.len()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/video", post(load_video))
        .route("/sessions/{id}/ask", post(ask))
        .route("/sessions/{id}/reset", post(reset_session))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: &str,
    port: u16,
    idle_minutes: u64,
    settings: Settings,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState {
        orchestrator,
        sessions: SessionStore::new(Duration::from_secs(idle_minutes * 60)),
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("EchoVerse API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Session state", "GET    /sessions/{id}");
    Output::kv("Load video", "POST   /sessions/{id}/video");
    Output::kv("Ask", "POST   /sessions/{id}/ask");
    Output::kv("Reset", "POST   /sessions/{id}/reset");
    Output::kv("Close session", "DELETE /sessions/{id}");
    println!();
    Output::kv("Idle sessions dropped after", &format!("{} min", idle_minutes));
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct LoadVideoRequest {
    url: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct SessionCreated {
    id: Uuid,
}

#[derive(Serialize)]
struct VideoInfo {
    video_id: String,
    title: String,
    language: String,
    chunk_count: usize,
}

#[derive(Serialize)]
struct SessionView {
    id: Uuid,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoInfo>,
    turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

// === Errors ===

/// HTTP status for an error kind.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unavailable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &EchoError) -> Response {
    let kind = err.kind();
    (
        status_for(kind),
        Json(ErrorResponse {
            error: err.to_string(),
            kind,
        }),
    )
        .into_response()
}

fn session_not_found(id: &Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {}", id),
            kind: ErrorKind::NotFound,
        }),
    )
        .into_response()
}

fn video_info(session: &Session) -> Option<VideoInfo> {
    session.active().map(|v| VideoInfo {
        video_id: v.reference.video_id.clone(),
        title: v.transcript.title.clone(),
        language: v.transcript.language.clone(),
        chunk_count: v.chunk_count,
    })
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> Response {
    let id = state.sessions.create().await;
    info!("Created session {}", id);
    (StatusCode::CREATED, Json(SessionCreated { id })).into_response()
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.sessions.get(&id).await else {
        return session_not_found(&id);
    };
    let session = session.lock().await;

    Json(SessionView {
        id,
        ready: session.is_ready(),
        video: video_info(&session),
        turns: session.turns().to_vec(),
    })
    .into_response()
}

async fn load_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadVideoRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id).await else {
        return session_not_found(&id);
    };
    let mut session = session.lock().await;

    match state.orchestrator.load_into(&mut session, &req.url).await {
        Ok(()) => Json(video_info(&session)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id).await else {
        return session_not_found(&id);
    };
    let mut session = session.lock().await;

    match state.orchestrator.ask(&mut session, &req.question).await {
        Ok(turn) => Json(turn.clone()).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn reset_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    let Some(session) = state.sessions.get(&id).await else {
        return session_not_found(&id);
    };
    session.lock().await.reset();
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id).await {
        info!("Closed session {}", id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}
