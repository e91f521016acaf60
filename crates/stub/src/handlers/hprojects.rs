//! `/hprojects` endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{IdRef, require_text};
use crate::error::StubResult;
use crate::extractors::{Caller, Pagination};
use crate::state::AppState;
use crate::store::ProjectRecord;
use crate::views;

/// Submitted project.
///
/// The owner is always the caller on creation; `user` is accepted and
/// ignored so that full project bodies round-trip.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectInput {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user: Option<IdRef>,
}

/// `POST /hprojects`
pub async fn create_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<ProjectInput>,
) -> StubResult<Json<Value>> {
    let name = require_text("name", &input.name)?;

    let mut tables = state.store().write();
    let id = tables.insert_project(ProjectRecord {
        name,
        description: input.description,
        owner_id: caller.user_id(),
        ..Default::default()
    })?;
    info!(id, owner = caller.user_id(), "Created project");

    Ok(Json(views::project(&tables, tables.project(id)?)?))
}

/// `GET /hprojects/{id}`
pub async fn find_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    let project = tables.project(id)?;
    caller.ensure_can_access(project.owner_id)?;
    Ok(Json(views::project(&tables, project)?))
}

/// `PUT /hprojects`
///
/// Updates name and description of the project identified by the body's id.
/// The owner only changes through [`update_owner_handler`].
pub async fn update_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<ProjectInput>,
) -> StubResult<Json<Value>> {
    let name = require_text("name", &input.name)?;

    let mut tables = state.store().write();
    let project = tables.project_mut(input.id)?;
    caller.ensure_can_access(project.owner_id)?;
    project.name = name;
    project.description = input.description;
    project.audit.touch();
    debug!(id = input.id, version = project.audit.version, "Updated project");

    Ok(Json(views::project(&tables, tables.project(input.id)?)?))
}

/// `DELETE /hprojects/{id}`
///
/// Answers 200 with an empty body.
pub async fn delete_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Response> {
    let mut tables = state.store().write();
    caller.ensure_can_access(tables.project(id)?.owner_id)?;
    tables.delete_project(id)?;
    info!(id, "Deleted project");
    Ok(StatusCode::OK.into_response())
}

fn visible_projects(state: &AppState, caller: Caller) -> StubResult<Vec<Value>> {
    let tables = state.store().read();
    let user = tables.user(caller.user_id())?;
    tables
        .projects_visible_to(user)
        .into_iter()
        .map(|p| views::project(&tables, p))
        .collect()
}

/// `GET /hprojects/all`
pub async fn find_all_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> StubResult<Json<Value>> {
    Ok(Json(Value::Array(visible_projects(&state, caller)?)))
}

/// `GET /hprojects?delta=&page=`
pub async fn find_all_paginated_handler(
    State(state): State<AppState>,
    caller: Caller,
    pagination: Pagination,
) -> StubResult<Json<Value>> {
    let projects = visible_projects(&state, caller)?;
    Ok(Json(views::paginated(
        projects,
        pagination.delta(),
        pagination.page(),
    )))
}

/// `GET /hprojects/all/cards`
pub async fn cards_handler(
    State(state): State<AppState>,
    caller: Caller,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    let user = tables.user(caller.user_id())?;
    let cards = tables
        .projects_visible_to(user)
        .into_iter()
        .map(|p| views::project_card(&tables, p))
        .collect();
    Ok(Json(Value::Array(cards)))
}

/// `GET /hprojects/{id}/tree`
///
/// Lists every packet of every device of the project.
pub async fn tree_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    caller.ensure_can_access(tables.project(id)?.owner_id)?;
    let packets = tables
        .packets_of_project(id)
        .into_iter()
        .map(|p| views::packet_tree(&tables, p))
        .collect::<StubResult<Vec<_>>>()?;
    Ok(Json(Value::Array(packets)))
}

/// `GET /hprojects/{id}/areas`
pub async fn areas_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    caller.ensure_can_access(tables.project(id)?.owner_id)?;
    let areas = tables
        .areas_of_project(id)
        .into_iter()
        .map(views::area)
        .collect();
    Ok(Json(Value::Array(areas)))
}

/// `PUT /hprojects/{id}/owner/{userId}`
pub async fn update_owner_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, user_id)): Path<(i64, i64)>,
) -> StubResult<Json<Value>> {
    let mut tables = state.store().write();
    tables.user(user_id)?;
    let project = tables.project_mut(id)?;
    caller.ensure_can_access(project.owner_id)?;
    project.owner_id = user_id;
    project.audit.touch();
    info!(id, owner = user_id, "Changed project owner");

    Ok(Json(views::project(&tables, tables.project(id)?)?))
}
