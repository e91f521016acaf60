//! `/hdevices` endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{IdRef, require_password, require_ref, require_text};
use crate::error::StubResult;
use crate::extractors::Caller;
use crate::state::AppState;
use crate::store::DeviceRecord;
use crate::views;

/// Submitted device.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInput {
    pub device_name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub software_version: Option<String>,
    pub description: Option<String>,
    pub password: String,
    pub password_confirm: String,
    #[serde(rename = "loginWithSSLCert")]
    pub login_with_ssl_cert: bool,
    pub x509_cert: Option<String>,
    pub x509_cert_key: Option<String>,
    pub project: Option<IdRef>,
}

/// `POST /hdevices`
pub async fn create_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<DeviceInput>,
) -> StubResult<Json<Value>> {
    let device_name = require_text("deviceName", &input.device_name)?;
    let password = require_password(&input.password, &input.password_confirm)?;
    let project_id = require_ref("project", input.project)?;

    let mut tables = state.store().write();
    caller.ensure_can_access(tables.project(project_id)?.owner_id)?;
    let id = tables.insert_device(DeviceRecord {
        device_name,
        brand: input.brand,
        model: input.model,
        firmware_version: input.firmware_version,
        software_version: input.software_version,
        description: input.description,
        password,
        login_with_ssl_cert: input.login_with_ssl_cert,
        x509_cert: input.x509_cert,
        x509_cert_key: input.x509_cert_key,
        project_id,
        ..Default::default()
    })?;
    info!(id, project_id, "Created device");

    Ok(Json(views::device(&tables, tables.device(id)?)?))
}

/// `GET /hdevices/{id}`
pub async fn find_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    let device = tables.device(id)?;
    caller.ensure_can_access(tables.project(device.project_id)?.owner_id)?;
    Ok(Json(views::device(&tables, device)?))
}
