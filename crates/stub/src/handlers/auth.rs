//! Login endpoint.

use axum::{Form, Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::StubResult;
use crate::state::AppState;
use crate::views;

/// Form body of a login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `POST /authentication/login`
///
/// Issues a token for valid credentials of an active user; 401 otherwise.
pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> StubResult<Json<Value>> {
    let (token, user_id) = state.store().login(&form.username, &form.password)?;

    let tables = state.store().read();
    let user = tables.user(user_id)?;
    info!(username = %user.username, user_id, "User logged in");

    Ok(Json(json!({
        "token": token,
        "authenticable": views::user(user),
    })))
}
