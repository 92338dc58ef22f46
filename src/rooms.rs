use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use sqlx::SqlitePool;

use crate::auth::Hasher;
use crate::error::{AppError, AppResult};
use crate::model::{NewRoom, Room, RoomPatch};
use crate::patch::{PatchContext, apply_patch};
use crate::store::{Gateway, RoomStore, delete_required, find_required};
use crate::{AppState, Config};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_all).post(create).patch(update))
        .route("/{id}", get(find_by_id).delete(delete_by_id))
}

/// Room names must not contain the configured reserved substring. This is
/// a request rule, reported distinctly from a missing field.
pub async fn create_room(
    db_pool: &SqlitePool,
    stop_word: &str,
    draft: NewRoom,
) -> AppResult<Room> {
    let name = draft.validate()?;
    if name.contains(stop_word) {
        return Err(AppError::InvalidArgument(format!(
            "room name must not contain \"{stop_word}\""
        )));
    }
    Ok(RoomStore::new(db_pool).save(Room::of(name)).await?)
}

#[debug_handler(state = AppState)]
async fn find_all(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(RoomStore::new(&db_pool).find_all().await?))
}

#[debug_handler(state = AppState)]
async fn find_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<Json<Room>> {
    Ok(Json(find_required(&RoomStore::new(&db_pool), id).await?))
}

#[debug_handler(state = AppState)]
async fn create(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(draft): Json<NewRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let saved = create_room(&db_pool, &config.stop_word, draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[debug_handler(state = AppState)]
async fn update(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Json(patch): Json<RoomPatch>,
) -> AppResult<StatusCode> {
    let id = patch.validate()?;
    let ctx = PatchContext::new(&hasher);
    apply_patch(&RoomStore::new(&db_pool), id, patch, &ctx).await?;
    Ok(StatusCode::OK)
}

#[debug_handler(state = AppState)]
async fn delete_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete_required(&RoomStore::new(&db_pool), id).await?;
    Ok(StatusCode::OK)
}
