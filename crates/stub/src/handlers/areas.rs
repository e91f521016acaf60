//! `/areas` endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{IdRef, one_of, require_ref, require_text};
use crate::error::StubResult;
use crate::extractors::Caller;
use crate::state::AppState;
use crate::store::{AreaDeviceRecord, AreaRecord};
use crate::views;

const AREA_VIEW_TYPES: &[&str] = &["IMAGE", "BIM_XKT", "BIM_IFC", "MAP"];

/// Submitted area.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaInput {
    pub name: String,
    pub description: Option<String>,
    pub area_view_type: Option<String>,
    pub area_configuration: Option<String>,
    pub map_info: Value,
    pub project: Option<IdRef>,
}

/// Submitted placement of a device in an area.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AreaDeviceInput {
    pub device: Option<IdRef>,
    #[serde(rename = "mapInfo")]
    pub map_info: Value,
}

/// `POST /areas`
pub async fn create_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<AreaInput>,
) -> StubResult<Json<Value>> {
    let record = AreaRecord {
        name: require_text("name", &input.name)?,
        description: input.description,
        area_view_type: one_of("areaViewType", input.area_view_type, "IMAGE", AREA_VIEW_TYPES)?,
        area_configuration: input.area_configuration,
        map_info: input.map_info,
        project_id: require_ref("project", input.project)?,
        ..Default::default()
    };

    let mut tables = state.store().write();
    caller.ensure_can_access(tables.project(record.project_id)?.owner_id)?;
    let project_id = record.project_id;
    let id = tables.insert_area(record)?;
    info!(id, project_id, "Created area");

    Ok(Json(views::area_with_project(&tables, tables.area(id)?)?))
}

/// `GET /areas/{id}`
pub async fn find_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    let area = tables.area(id)?;
    caller.ensure_can_access(tables.project(area.project_id)?.owner_id)?;
    Ok(Json(views::area_with_project(&tables, area)?))
}

/// `POST /areas/{id}/devices`
///
/// The device must belong to the area's project.
pub async fn add_device_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(area_id): Path<i64>,
    Json(input): Json<AreaDeviceInput>,
) -> StubResult<Json<Value>> {
    let device_id = require_ref("device", input.device)?;

    let mut tables = state.store().write();
    let project_id = tables.area(area_id)?.project_id;
    caller.ensure_can_access(tables.project(project_id)?.owner_id)?;
    let id = tables.insert_area_device(AreaDeviceRecord {
        area_id,
        device_id,
        map_info: input.map_info,
        ..Default::default()
    })?;
    info!(id, area_id, device_id, "Placed device in area");

    Ok(Json(views::area_device(&tables, tables.area_device(id)?)?))
}
