//! Entity records, their factories, and the per-phase validation gate.
//!
//! Identity is an `i64` assigned by the store on first save; id 0 means
//! "not yet persisted". Equality is identity equality: two instances are
//! equal iff their ids match.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult, Phase};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Role {
    pub fn of(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
}

impl Room {
    pub fn of(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Room {}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Person {
    pub id: i64,
    pub username: String,
    /// Argon2 hash, never plaintext and never serialized.
    #[serde(skip_serializing)]
    pub password: String,
    pub role_id: i64,
}

impl Person {
    pub fn of(username: impl Into<String>, password_hash: impl Into<String>, role_id: i64) -> Self {
        Self {
            id: 0,
            username: username.into(),
            password: password_hash.into(),
            role_id,
        }
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    pub room_id: i64,
    pub person_id: i64,
}

impl Message {
    /// Stamps `created` with the current server time; the client never
    /// controls this field.
    pub fn of(text: impl Into<String>, room_id: i64, person_id: i64) -> Self {
        Self {
            id: 0,
            text: text.into(),
            created: OffsetDateTime::now_utc(),
            room_id,
            person_id,
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

// ---------------------------------------------------------------------------
// Inbound payloads and the validation gate
// ---------------------------------------------------------------------------

/// Non-empty-after-trim check shared by every required field.
fn require<'a>(
    value: &'a Option<String>,
    field: &'static str,
    phase: Phase,
) -> AppResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingField { field, phase }),
    }
}

fn require_id(id: Option<i64>, phase: Phase) -> AppResult<i64> {
    id.ok_or(AppError::MissingField { field: "id", phase })
}

#[derive(Debug, Deserialize)]
pub struct NewRole {
    pub name: Option<String>,
}

impl NewRole {
    pub fn validate(&self) -> AppResult<&str> {
        require(&self.name, "name", Phase::Create)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RolePatch {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl RolePatch {
    pub fn validate(&self) -> AppResult<i64> {
        require(&self.name, "name", Phase::Update)?;
        require_id(self.id, Phase::Update)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewRoom {
    pub name: Option<String>,
}

impl NewRoom {
    pub fn validate(&self) -> AppResult<&str> {
        require(&self.name, "name", Phase::Create)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RoomPatch {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl RoomPatch {
    pub fn validate(&self) -> AppResult<i64> {
        require(&self.name, "name", Phase::Update)?;
        require_id(self.id, Phase::Update)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewPerson {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl NewPerson {
    pub fn validate(&self) -> AppResult<(&str, &str)> {
        let username = require(&self.username, "username", Phase::Create)?;
        let password = require(&self.password, "password", Phase::Create)?;
        Ok((username, password))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonPatch {
    pub id: Option<i64>,
    pub username: Option<String>,
    /// Required on update; re-hashed before it reaches the store.
    pub password: Option<String>,
}

impl PersonPatch {
    pub fn validate(&self) -> AppResult<i64> {
        require(&self.password, "password", Phase::Update)?;
        require_id(self.id, Phase::Update)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub text: Option<String>,
}

impl NewMessage {
    pub fn validate(&self) -> AppResult<&str> {
        require(&self.text, "text", Phase::Create)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagePatch {
    pub id: Option<i64>,
    pub text: Option<String>,
    /// Accepted on the wire but ignored: the engine always refreshes it.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
}

impl MessagePatch {
    pub fn validate(&self) -> AppResult<i64> {
        require(&self.text, "text", Phase::Update)?;
        require_id(self.id, Phase::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_identity_only() {
        let a = Room {
            id: 7,
            name: "general".into(),
        };
        let b = Room {
            id: 7,
            name: "renamed".into(),
        };
        assert_eq!(a, b);
        assert_ne!(a, Room::of("general"));
    }

    #[test]
    fn message_factory_stamps_created() {
        let before = OffsetDateTime::now_utc();
        let msg = Message::of("hi", 1, 2);
        assert_eq!(msg.id, 0);
        assert!(msg.created >= before);
        assert!(msg.created <= OffsetDateTime::now_utc());
    }

    #[test]
    fn blank_name_fails_create_gate() {
        let draft = NewRoom {
            name: Some("   ".into()),
        };
        let err = draft.validate().unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingField {
                field: "name",
                phase: Phase::Create
            }
        ));
    }

    #[test]
    fn patch_without_id_fails_update_gate() {
        let patch = RolePatch {
            id: None,
            name: Some("admin".into()),
        };
        let err = patch.validate().unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingField {
                field: "id",
                phase: Phase::Update
            }
        ));
    }

    #[test]
    fn person_patch_requires_password() {
        let patch = PersonPatch {
            id: Some(2),
            username: Some("bob".into()),
            password: None,
        };
        assert!(matches!(
            patch.validate().unwrap_err(),
            AppError::MissingField {
                field: "password",
                ..
            }
        ));
    }
}
