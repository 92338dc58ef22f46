//! Session identity, read once at the transport boundary.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use crate::error::AppError;

pub const USERNAME: &str = "username";

/// The authenticated username for the active session.
///
/// Message authorship derives from this, never from the request body.
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, reason)| AppError::Unauthorized(reason.to_string()))?;
        match session.get::<String>(USERNAME).await? {
            Some(username) => Ok(Self(username)),
            None => Err(AppError::Unauthorized("no active session".into())),
        }
    }
}
