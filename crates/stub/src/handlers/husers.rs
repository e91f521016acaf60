//! `/husers` endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{require_password, require_text};
use crate::error::{StubError, StubResult};
use crate::extractors::Caller;
use crate::state::AppState;
use crate::store::UserRecord;
use crate::views;

/// Submitted user.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserInput {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub password_confirm: String,
    pub admin: bool,
    pub active: bool,
}

/// `POST /husers`
///
/// Only administrators may create users.
pub async fn create_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<UserInput>,
) -> StubResult<Json<Value>> {
    if !caller.is_admin() {
        return Err(StubError::Forbidden(
            "only administrators can create users".to_string(),
        ));
    }
    let username = require_text("username", &input.username)?;
    let password = require_password(&input.password, &input.password_confirm)?;

    let mut tables = state.store().write();
    let id = tables.insert_user(UserRecord {
        name: input.name,
        lastname: input.lastname,
        username,
        email: input.email,
        password,
        admin: input.admin,
        active: input.active,
        ..Default::default()
    })?;
    info!(id, "Created user");

    Ok(Json(views::user(tables.user(id)?)))
}

/// `GET /husers/{id}`
pub async fn find_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    caller.ensure_can_access(id)?;
    let tables = state.store().read();
    Ok(Json(views::user(tables.user(id)?)))
}
