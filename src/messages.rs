//! Message flows, including the dependent-resolution pipeline for creation:
//! the room is resolved by id, the author by the session's username, and the
//! message is only assembled and written once both are present. Either
//! lookup missing fails the whole operation with no partial write.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use sqlx::SqlitePool;

use crate::AppState;
use crate::auth::Hasher;
use crate::error::{AppError, AppResult};
use crate::model::{Message, MessagePatch, NewMessage};
use crate::patch::{PatchContext, apply_patch};
use crate::session::CurrentUser;
use crate::store::{Gateway, MessageStore, PersonStore, RoomStore, delete_required, find_required};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_all).patch(update))
        .route("/{id}", get(find_by_id).delete(delete_by_id))
        .route("/by-person/{id}", get(find_by_person))
        .route("/room/{id}", axum::routing::post(create))
}

pub async fn compose_message(
    db_pool: &SqlitePool,
    room_id: i64,
    author: &str,
    draft: NewMessage,
) -> AppResult<Message> {
    let text = draft.validate()?;

    // Room first, then author; a collaborator failure is an upstream
    // outage, an absent row is the caller's not-found.
    let room = RoomStore::new(db_pool)
        .find_by_id(room_id)
        .await
        .map_err(|e| AppError::Upstream(format!("room lookup: {e}")))?
        .ok_or_else(|| AppError::not_found("room", room_id))?;

    let person = PersonStore::new(db_pool)
        .find_by_username(author)
        .await
        .map_err(|e| AppError::Upstream(format!("person lookup: {e}")))?
        .ok_or_else(|| AppError::not_found("person", author))?;

    let message = Message::of(text, room.id, person.id);
    Ok(MessageStore::new(db_pool).save(message).await?)
}

#[debug_handler(state = AppState)]
async fn find_all(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(MessageStore::new(&db_pool).find_all().await?))
}

#[debug_handler(state = AppState)]
async fn find_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<Json<Message>> {
    Ok(Json(find_required(&MessageStore::new(&db_pool), id).await?))
}

#[debug_handler(state = AppState)]
async fn find_by_person(
    State(db_pool): State<SqlitePool>,
    Path(person_id): Path<i64>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(
        MessageStore::new(&db_pool)
            .find_all_by_person_id(person_id)
            .await?,
    ))
}

#[debug_handler(state = AppState)]
async fn create(
    State(db_pool): State<SqlitePool>,
    CurrentUser(username): CurrentUser,
    Path(room_id): Path<i64>,
    Json(draft): Json<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let saved = compose_message(&db_pool, room_id, &username, draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[debug_handler(state = AppState)]
async fn update(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Json(patch): Json<MessagePatch>,
) -> AppResult<StatusCode> {
    let id = patch.validate()?;
    let ctx = PatchContext::new(&hasher);
    apply_patch(&MessageStore::new(&db_pool), id, patch, &ctx).await?;
    Ok(StatusCode::OK)
}

#[debug_handler(state = AppState)]
async fn delete_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete_required(&MessageStore::new(&db_pool), id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewPerson, Role};
    use crate::store::RoleStore;
    use crate::store::tests::memory_pool;
    use crate::users::sign_up_person;

    async fn seeded(pool: &SqlitePool) -> (i64, String) {
        let role = RoleStore::new(pool).save(Role::of("user")).await.unwrap();
        let person = sign_up_person(
            pool,
            &Hasher,
            role.id,
            NewPerson {
                username: Some("alice".into()),
                password: Some("pw".into()),
            },
        )
        .await
        .unwrap();
        let room = RoomStore::new(pool)
            .save(crate::model::Room::of("general"))
            .await
            .unwrap();
        (room.id, person.username)
    }

    #[tokio::test]
    async fn creation_resolves_room_and_author() {
        let pool = memory_pool().await;
        let (room_id, author) = seeded(&pool).await;

        let saved = compose_message(
            &pool,
            room_id,
            &author,
            NewMessage {
                text: Some("hello".into()),
            },
        )
        .await
        .unwrap();

        assert!(saved.id > 0);
        assert_eq!(saved.room_id, room_id);
        let by_author = MessageStore::new(&pool)
            .find_all_by_person_id(saved.person_id)
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
    }

    #[tokio::test]
    async fn unknown_room_fails_without_a_write() {
        let pool = memory_pool().await;
        let (_, author) = seeded(&pool).await;

        let err = compose_message(
            &pool,
            999,
            &author,
            NewMessage {
                text: Some("orphan".into()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound { entity: "room", .. }));
        assert!(MessageStore::new(&pool).find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_author_fails_without_a_write() {
        let pool = memory_pool().await;
        let (room_id, _) = seeded(&pool).await;

        let err = compose_message(
            &pool,
            room_id,
            "ghost",
            NewMessage {
                text: Some("hi".into()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound { entity: "person", .. }));
        assert!(MessageStore::new(&pool).find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_text_never_reaches_the_lookups() {
        let pool = memory_pool().await;
        let (room_id, author) = seeded(&pool).await;

        let err = compose_message(&pool, room_id, &author, NewMessage { text: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField { field: "text", .. }));
    }
}
