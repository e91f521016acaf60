//! Entity DTOs exchanged with the service.
//!
//! These types only carry what fixtures submit and what they need to read
//! back; every field defaults so that partial reference views (for example
//! the owner embedded in a project) deserialize too. Shape checks never go
//! through these types, they run on raw JSON in [`crate::validator`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A platform user (`/husers`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HUser {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub admin: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// A project (`/hprojects`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HProject {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<HUser>,
}

/// A device belonging to a project (`/hdevices`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HDevice {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
    #[serde(rename = "loginWithSSLCert")]
    #[serde(deserialize_with = "null_as_default")]
    pub login_with_ssl_cert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509_cert_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<HProject>,
}

/// Direction of a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketType {
    Input,
    Output,
    #[default]
    Io,
}

/// Wire format of a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

/// Serialization applied to a packet before storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketSerialization {
    None,
    #[default]
    Avro,
}

/// Expected traffic volume of a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketTrafficPlan {
    #[default]
    Low,
    Medium,
    High,
    Intensive,
}

/// A packet emitted by a device (`/hpackets`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HPacket {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub packet_type: HPacketType,
    #[serde(deserialize_with = "null_as_default")]
    pub format: HPacketFormat,
    #[serde(deserialize_with = "null_as_default")]
    pub serialization: HPacketSerialization,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub traffic_plan: HPacketTrafficPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<HDevice>,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: Vec<HPacketField>,
}

/// Value type of a packet field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketFieldType {
    Object,
    Integer,
    #[default]
    Double,
    Float,
    Boolean,
    Date,
    Text,
    Timestamp,
    Category,
    File,
}

/// Cardinality of a packet field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HPacketFieldMultiplicity {
    #[default]
    Single,
    Array,
    Matrix,
}

/// A field of a packet (`/hpackets/{id}/fields`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HPacketField {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub field_type: HPacketFieldType,
    #[serde(deserialize_with = "null_as_default")]
    pub multiplicity: HPacketFieldMultiplicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet: Option<Box<HPacket>>,
}

/// An area of a project (`/areas`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Area {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub entity_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<HProject>,
}

/// Placement of a device inside an area (`/areas/{id}/devices`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaDevice {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<HDevice>,
}

/// Body returned by `POST /authentication/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub authenticable: HUser,
}

/// Returns the owner id of the project at the root of a device.
pub(crate) fn device_owner_id(device: &HDevice) -> Option<i64> {
    device
        .project
        .as_ref()
        .and_then(|p| p.user.as_ref())
        .map(|u| u.id)
}
