//! `/hpackets` endpoints.

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
use crate::store::{FieldRecord, PacketRecord, Tables};
use crate::views;

const PACKET_TYPES: &[&str] = &["INPUT", "OUTPUT", "IO"];
const PACKET_FORMATS: &[&str] = &["JSON", "XML", "CSV"];
const PACKET_SERIALIZATIONS: &[&str] = &["NONE", "AVRO"];
const TRAFFIC_PLANS: &[&str] = &["LOW", "MEDIUM", "HIGH", "INTENSIVE"];
const FIELD_TYPES: &[&str] = &[
    "OBJECT",
    "INTEGER",
    "DOUBLE",
    "FLOAT",
    "BOOLEAN",
    "DATE",
    "TEXT",
    "TIMESTAMP",
    "CATEGORY",
    "FILE",
];
const FIELD_MULTIPLICITIES: &[&str] = &["SINGLE", "ARRAY", "MATRIX"];

/// Submitted packet.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PacketInput {
    pub name: String,
    #[serde(rename = "type")]
    pub packet_type: Option<String>,
    pub format: Option<String>,
    pub serialization: Option<String>,
    pub version: Option<String>,
    pub traffic_plan: Option<String>,
    pub timestamp_field: Option<String>,
    pub timestamp_format: Option<String>,
    pub unix_timestamp: bool,
    pub unix_timestamp_format_seconds: bool,
    pub device: Option<IdRef>,
}

/// Submitted packet field.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub multiplicity: Option<String>,
    pub unit: Option<String>,
    pub value: Value,
}

fn packet_owner(tables: &Tables, packet_id: i64) -> StubResult<i64> {
    let device = tables.device(tables.packet(packet_id)?.device_id)?;
    Ok(tables.project(device.project_id)?.owner_id)
}

/// `POST /hpackets`
pub async fn create_handler(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<PacketInput>,
) -> StubResult<Json<Value>> {
    let name = require_text("name", &input.name)?;
    let device_id = require_ref("device", input.device)?;
    let record = PacketRecord {
        name,
        packet_type: one_of("type", input.packet_type, "IO", PACKET_TYPES)?,
        format: one_of("format", input.format, "JSON", PACKET_FORMATS)?,
        serialization: one_of(
            "serialization",
            input.serialization,
            "AVRO",
            PACKET_SERIALIZATIONS,
        )?,
        version: input.version,
        traffic_plan: one_of("trafficPlan", input.traffic_plan, "LOW", TRAFFIC_PLANS)?,
        timestamp_field: input.timestamp_field,
        timestamp_format: input.timestamp_format,
        unix_timestamp: input.unix_timestamp,
        unix_timestamp_format_seconds: input.unix_timestamp_format_seconds,
        device_id,
        ..Default::default()
    };

    let mut tables = state.store().write();
    let project_id = tables.device(device_id)?.project_id;
    caller.ensure_can_access(tables.project(project_id)?.owner_id)?;
    let id = tables.insert_packet(record)?;
    info!(id, device_id, "Created packet");

    Ok(Json(views::packet(&tables, tables.packet(id)?)?))
}

/// `GET /hpackets/{id}`
pub async fn find_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> StubResult<Json<Value>> {
    let tables = state.store().read();
    caller.ensure_can_access(packet_owner(&tables, id)?)?;
    Ok(Json(views::packet(&tables, tables.packet(id)?)?))
}

/// `POST /hpackets/{id}/fields`
pub async fn add_field_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(packet_id): Path<i64>,
    Json(input): Json<FieldInput>,
) -> StubResult<Json<Value>> {
    let record = FieldRecord {
        name: require_text("name", &input.name)?,
        description: input.description,
        field_type: one_of("type", input.field_type, "DOUBLE", FIELD_TYPES)?,
        multiplicity: one_of(
            "multiplicity",
            input.multiplicity,
            "SINGLE",
            FIELD_MULTIPLICITIES,
        )?,
        unit: input.unit,
        value: input.value,
        packet_id,
        ..Default::default()
    };

    let mut tables = state.store().write();
    caller.ensure_can_access(packet_owner(&tables, packet_id)?)?;
    let id = tables.insert_field(record)?;
    info!(id, packet_id, "Added packet field");

    Ok(Json(views::field(&tables, tables.field(id)?)?))
}
