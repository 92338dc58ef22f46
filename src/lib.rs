pub mod auth;
pub mod error;
pub mod messages;
pub mod model;
pub mod patch;
pub mod roles;
pub mod rooms;
pub mod session;
pub mod store;
pub mod users;

use axum::extract::FromRef;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub use error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub hasher: auth::Hasher,
}

#[derive(Clone)]
pub struct Config {
    /// Reserved substring rejected in room names at creation.
    pub stop_word: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            stop_word: dotenv::var("ROOM_STOP_WORD").unwrap_or_else(|_| "stop-word".to_owned()),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(30)));

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .nest("/role", roles::router())
        .nest("/room", rooms::router())
        .nest("/users", users::router())
        .nest("/message", messages::router())
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[debug_handler]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
