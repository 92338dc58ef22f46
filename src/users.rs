use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router, debug_handler};
use sqlx::SqlitePool;

use crate::AppState;
use crate::auth::Hasher;
use crate::error::{AppError, AppResult};
use crate::model::{NewPerson, Person, PersonPatch};
use crate::patch::{PatchContext, apply_patch};
use crate::store::{Gateway, PersonStore, RoleStore, delete_required, find_required};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(find_all))
        .route("/{id}", get(find_by_id).delete(delete_by_id))
        .route("/username/{username}", get(find_by_username))
        .route("/sign-up/role/{id}", post(sign_up))
        .route("/", patch(update))
}

/// Signup resolves the role before anything is written; the password is
/// hashed on the way in and the plaintext never reaches the store.
pub async fn sign_up_person(
    db_pool: &SqlitePool,
    hasher: &Hasher,
    role_id: i64,
    draft: NewPerson,
) -> AppResult<Person> {
    let (username, password) = draft.validate()?;

    let role = RoleStore::new(db_pool)
        .find_by_id(role_id)
        .await
        .map_err(|e| AppError::Upstream(format!("role lookup: {e}")))?
        .ok_or_else(|| AppError::not_found("role", role_id))?;

    let person = Person::of(username, hasher.hash(password)?, role.id);
    Ok(PersonStore::new(db_pool).save(person).await?)
}

#[debug_handler(state = AppState)]
async fn find_all(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Person>>> {
    Ok(Json(PersonStore::new(&db_pool).find_all().await?))
}

#[debug_handler(state = AppState)]
async fn find_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<Json<Person>> {
    Ok(Json(find_required(&PersonStore::new(&db_pool), id).await?))
}

#[debug_handler(state = AppState)]
async fn find_by_username(
    State(db_pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> AppResult<Json<Person>> {
    let person = PersonStore::new(&db_pool)
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found("person", &username))?;
    Ok(Json(person))
}

#[debug_handler(state = AppState)]
async fn sign_up(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Path(role_id): Path<i64>,
    Json(draft): Json<NewPerson>,
) -> AppResult<(StatusCode, Json<Person>)> {
    let saved = sign_up_person(&db_pool, &hasher, role_id, draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[debug_handler(state = AppState)]
async fn update(
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Json(patch): Json<PersonPatch>,
) -> AppResult<StatusCode> {
    let id = patch.validate()?;
    let ctx = PatchContext::new(&hasher);
    apply_patch(&PersonStore::new(&db_pool), id, patch, &ctx).await?;
    Ok(StatusCode::OK)
}

#[debug_handler(state = AppState)]
async fn delete_by_id(
    State(db_pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    delete_required(&PersonStore::new(&db_pool), id).await?;
    Ok(StatusCode::OK)
}
