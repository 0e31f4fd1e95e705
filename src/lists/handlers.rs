use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::Actor, repo_types::User},
    error::{ApiError, ApiResult},
    lists::{
        dto::{AddMemberRequest, ListNameRequest, ListWithMembers, Page, Pagination},
        repo,
        repo_types::UserList,
        services,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lists", get(index).post(store))
        .route("/lists/:id", put(rename).delete(destroy))
        .route("/lists/:id/users", get(members).post(add_member))
        .route("/lists/:id/users/:user_id", delete(remove_member))
        .route("/lists/:id/available-users", get(available_users))
        .route("/lists/:id/pick-winner", get(pick_winner))
}

async fn find_list(state: &AppState, id: Uuid) -> ApiResult<UserList> {
    UserList::find(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("List does not exist".to_string()))
}

async fn find_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))
}

#[instrument(skip(state, _actor))]
pub async fn index(
    State(state): State<AppState>,
    _actor: Actor,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    let per_page = p.per_page.max(1);
    let page = p.page.max(1);
    let (lists, total) = UserList::paginate(&state.db, per_page, page)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "success": true,
        "lists": Page::new(lists, total, per_page, page),
    })))
}

#[instrument(skip(state, actor, payload))]
pub async fn store(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<ListNameRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    actor.require_role("Admin")?;

    let name = payload.list_name.as_deref();
    let taken = match name {
        Some(name) => UserList::name_taken(&state.db, name, None)
            .await
            .map_err(ApiError::internal)?,
        None => false,
    };
    services::validate_list_name(name, taken).into_result()?;

    let list = UserList::create(&state.db, name.unwrap_or_default())
        .await
        .map_err(ApiError::internal)?;

    info!(list_id = %list.id, list_name = %list.list_name, "list created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "List created successfully",
            "list": list,
        })),
    ))
}

#[instrument(skip(state, actor, payload))]
pub async fn rename(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListNameRequest>,
) -> ApiResult<Json<Value>> {
    actor.require_role("Admin")?;
    find_list(&state, id).await?;

    let name = payload.list_name.as_deref();
    let taken = match name {
        Some(name) => UserList::name_taken(&state.db, name, Some(id))
            .await
            .map_err(ApiError::internal)?,
        None => false,
    };
    services::validate_list_name(name, taken).into_result()?;

    let list = UserList::rename(&state.db, id, name.unwrap_or_default())
        .await
        .map_err(ApiError::internal)?;

    info!(list_id = %list.id, list_name = %list.list_name, "list renamed");
    Ok(Json(json!({
        "success": true,
        "message": "List updated successfully",
        "list": list,
    })))
}

#[instrument(skip(state, actor))]
pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    actor.require_role("Admin")?;
    find_list(&state, id).await?;

    UserList::delete(&state.db, id)
        .await
        .map_err(ApiError::internal)?;

    info!(list_id = %id, "list deleted");
    Ok(Json(json!({
        "success": true,
        "message": "List deleted successfully",
    })))
}

/// Open to any authenticated caller, unlike its admin-gated siblings.
#[instrument(skip(state, _actor))]
pub async fn members(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let list = find_list(&state, id).await?;
    let users = repo::members(&state.db, id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "success": true,
        "users_list": ListWithMembers { list, users },
    })))
}

#[instrument(skip(state, actor))]
pub async fn available_users(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    actor.require_role("Admin")?;
    find_list(&state, id).await?;

    let users = repo::available_users(&state.db, id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "success": true,
        "available_users": users,
    })))
}

#[instrument(skip(state, actor, payload))]
pub async fn add_member(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<Json<Value>> {
    actor.require_role("Admin")?;
    let list = find_list(&state, id).await?;
    let user = find_user(&state, payload.user_id).await?;

    let inserted = repo::add_member(&state.db, list.id, user.id)
        .await
        .map_err(ApiError::internal)?;
    if !inserted {
        return Err(ApiError::Conflict(
            "This user is already added on this list".to_string(),
        ));
    }

    info!(list_id = %list.id, user_id = %user.id, "member added");
    Ok(Json(json!({
        "success": true,
        "message": "User added successfully",
        "list": list,
    })))
}

#[instrument(skip(state, actor))]
pub async fn remove_member(
    State(state): State<AppState>,
    actor: Actor,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    actor.require_role("Admin")?;
    let list = find_list(&state, id).await?;
    let user = find_user(&state, user_id).await?;

    let removed = repo::remove_member(&state.db, list.id, user.id)
        .await
        .map_err(ApiError::internal)?;
    if !removed {
        return Err(ApiError::Conflict(
            "User does not exist on this list".to_string(),
        ));
    }

    info!(list_id = %list.id, user_id = %user.id, "member removed");
    Ok(Json(json!({
        "success": true,
        "message": "User removed successfully from list",
    })))
}

/// Open to any authenticated caller; winners are never persisted.
#[instrument(skip(state, _actor))]
pub async fn pick_winner(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let list = find_list(&state, id).await?;
    let members = repo::members(&state.db, list.id)
        .await
        .map_err(ApiError::internal)?;

    let winner = services::pick_uniform(&mut rand::thread_rng(), &members)?;

    info!(list_id = %list.id, winner_id = %winner.id, "winner drawn");
    Ok(Json(json!({
        "success": true,
        "message": "Winner selected successfully",
        "winner_user": winner,
    })))
}
