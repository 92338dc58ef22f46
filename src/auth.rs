//! Password hashing and session establishment.
//!
//! Hashing uses Argon2id with the default parameters and a random salt per
//! hash; the stored value is a PHC-format string.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::session::USERNAME;
use crate::store::PersonStore;

#[derive(Clone, Default)]
pub struct Hasher;

impl Hasher {
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hash: {e}")))
    }

    /// `Ok(false)` on mismatch; an error only when the stored hash is
    /// malformed.
    pub fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        let parsed = argon2::PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("stored hash invalid: {e}")))?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!("password verify: {e}"))),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    username: String,
    password: String,
}

#[debug_handler(state = AppState)]
async fn login(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    session: Session,
    Json(LoginQuery { username, password }): Json<LoginQuery>,
) -> AppResult<impl IntoResponse> {
    // One failure message for both unknown user and bad password.
    let denied = || AppError::Unauthorized("invalid credentials".into());

    let person = PersonStore::new(&db_pool)
        .find_by_username(&username)
        .await?
        .ok_or_else(denied)?;

    if !hasher.verify(&password, &person.password)? {
        return Err(denied());
    }

    session.insert(USERNAME, &person.username).await?;
    tracing::info!(username = %person.username, "session established");
    Ok(StatusCode::OK)
}

#[debug_handler]
async fn logout(session: Session) -> AppResult<impl IntoResponse> {
    session.flush().await?;
    Ok(StatusCode::OK)
}
