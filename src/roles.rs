use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use sqlx::SqlitePool;

use crate::AppState;
use crate::auth::Hasher;
use crate::error::AppResult;
use crate::model::{NewRole, Role, RolePatch};
use crate::patch::{PatchContext, apply_patch};
use crate::store::{Gateway, RoleStore, delete_required, find_required};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(find_all).post(create).patch(update))
        .route("/{id}", get(find_by_id).delete(delete_by_id))
}

#[debug_handler(state = AppState)]
async fn find_all(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(RoleStore::new(&db_pool).find_all().await?))
}

#[debug_handler(state = AppState)]
async fn find_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<Json<Role>> {
    Ok(Json(find_required(&RoleStore::new(&db_pool), id).await?))
}

#[debug_handler(state = AppState)]
async fn create(
    State(db_pool): State<SqlitePool>,
    Json(draft): Json<NewRole>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let name = draft.validate()?;
    let saved = RoleStore::new(&db_pool).save(Role::of(name)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[debug_handler(state = AppState)]
async fn update(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Json(patch): Json<RolePatch>,
) -> AppResult<StatusCode> {
    let id = patch.validate()?;
    let ctx = PatchContext::new(&hasher);
    apply_patch(&RoleStore::new(&db_pool), id, patch, &ctx).await?;
    Ok(StatusCode::OK)
}

#[debug_handler(state = AppState)]
async fn delete_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete_required(&RoleStore::new(&db_pool), id).await?;
    Ok(StatusCode::OK)
}
