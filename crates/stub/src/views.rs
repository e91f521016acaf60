//! JSON views of stored entities.
//!
//! Each entity has a full view, carrying `id, entityCreateDate,
//! entityModifyDate, entityVersion` plus its own properties, and a reduced
//! reference view used when it is embedded in another entity. Timestamps are
//! epoch milliseconds. Write-only properties (passwords) never appear.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::error::StubResult;
use crate::store::{
    AreaDeviceRecord, AreaRecord, Audit, DeviceRecord, FieldRecord, PacketRecord, ProjectRecord,
    Tables, UserRecord,
};

fn millis(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

fn reference(id: i64, audit: &Audit) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".into(), json!(id));
    map.insert("entityCreateDate".into(), json!(millis(&audit.created)));
    map.insert("entityModifyDate".into(), json!(millis(&audit.modified)));
    map
}

fn entity(id: i64, audit: &Audit) -> Map<String, Value> {
    let mut map = reference(id, audit);
    map.insert("entityVersion".into(), json!(audit.version));
    map
}

fn with(mut map: Map<String, Value>, extra: Value) -> Value {
    if let Value::Object(extra) = extra {
        map.extend(extra);
    }
    Value::Object(map)
}

/// Owner as embedded in a project.
pub fn user_reference(user: &UserRecord) -> Value {
    with(
        reference(user.id, &user.audit),
        json!({
            "admin": user.admin,
            "imagePath": user.image_path,
        }),
    )
}

pub fn user(user: &UserRecord) -> Value {
    with(
        entity(user.id, &user.audit),
        json!({
            "name": user.name,
            "lastname": user.lastname,
            "username": user.username,
            "email": user.email,
            "admin": user.admin,
            "active": user.active,
            "imagePath": user.image_path,
            "roles": [],
        }),
    )
}

pub fn project(tables: &Tables, project: &ProjectRecord) -> StubResult<Value> {
    let owner = tables.user(project.owner_id)?;
    Ok(with(
        entity(project.id, &project.audit),
        json!({
            "name": project.name,
            "description": project.description,
            "user": user_reference(owner),
        }),
    ))
}

/// Project as embedded in a device reference.
pub fn project_reference(project: &ProjectRecord) -> Value {
    with(
        reference(project.id, &project.audit),
        json!({
            "name": project.name,
            "description": project.description,
        }),
    )
}

pub fn project_card(tables: &Tables, project: &ProjectRecord) -> Value {
    with(
        reference(project.id, &project.audit),
        json!({
            "name": project.name,
            "description": project.description,
            "deviceCount": tables.devices_of_project(project.id).len(),
            "statisticsCount": 0,
            "rulesCount": 0,
            "hProjectSharingInfo": {
                "ownerId": project.owner_id,
                "userSharingIds": [],
            },
        }),
    )
}

pub fn device(tables: &Tables, device: &DeviceRecord) -> StubResult<Value> {
    let project = tables.project(device.project_id)?;
    Ok(with(
        entity(device.id, &device.audit),
        json!({
            "deviceName": device.device_name,
            "brand": device.brand,
            "model": device.model,
            "firmwareVersion": device.firmware_version,
            "softwareVersion": device.software_version,
            "description": device.description,
            "loginWithSSLCert": device.login_with_ssl_cert,
            "x509Cert": device.x509_cert,
            "x509CertKey": device.x509_cert_key,
            "project": self::project(tables, project)?,
            "roles": [],
        }),
    ))
}

/// Device as embedded in a packet of the tree view.
pub fn device_reference(tables: &Tables, device: &DeviceRecord) -> StubResult<Value> {
    let project = tables.project(device.project_id)?;
    Ok(with(
        reference(device.id, &device.audit),
        json!({
            "deviceName": device.device_name,
            "brand": device.brand,
            "model": device.model,
            "firmwareVersion": device.firmware_version,
            "softwareVersion": device.software_version,
            "description": device.description,
            "project": project_reference(project),
            "roles": [],
        }),
    ))
}

/// Field as embedded in a packet.
pub fn field_reference(field: &FieldRecord) -> Value {
    with(
        entity(field.id, &field.audit),
        json!({
            "name": field.name,
            "description": field.description,
            "type": field.field_type,
            "multiplicity": field.multiplicity,
            "unit": field.unit,
            "value": field.value,
            "innerFields": [],
        }),
    )
}

fn packet_view(tables: &Tables, packet: &PacketRecord, device: Value) -> Value {
    let fields: Vec<Value> = tables
        .fields_of_packet(packet.id)
        .into_iter()
        .map(field_reference)
        .collect();

    with(
        entity(packet.id, &packet.audit),
        json!({
            "name": packet.name,
            "type": packet.packet_type,
            "format": packet.format,
            "serialization": packet.serialization,
            "version": packet.version,
            "valid": !fields.is_empty(),
            "timestampField": packet.timestamp_field,
            "timestampFormat": packet.timestamp_format,
            "unixTimestamp": packet.unix_timestamp,
            "unixTimestampFormatSeconds": packet.unix_timestamp_format_seconds,
            "trafficPlan": packet.traffic_plan,
            "device": device,
            "fields": fields,
        }),
    )
}

/// Packet with its full device, as returned on creation.
pub fn packet(tables: &Tables, packet: &PacketRecord) -> StubResult<Value> {
    let device = self::device(tables, tables.device(packet.device_id)?)?;
    Ok(packet_view(tables, packet, device))
}

/// Packet as listed in a project's tree view.
pub fn packet_tree(tables: &Tables, packet: &PacketRecord) -> StubResult<Value> {
    let device = device_reference(tables, tables.device(packet.device_id)?)?;
    Ok(packet_view(tables, packet, device))
}

/// Field with its owning packet, as returned on creation.
pub fn field(tables: &Tables, field: &FieldRecord) -> StubResult<Value> {
    let packet = self::packet(tables, tables.packet(field.packet_id)?)?;
    let mut view = field_reference(field);
    if let Value::Object(map) = &mut view {
        map.insert("packet".into(), packet);
    }
    Ok(view)
}

pub fn area(area: &AreaRecord) -> Value {
    with(
        entity(area.id, &area.audit),
        json!({
            "name": area.name,
            "description": area.description,
            "areaViewType": area.area_view_type,
            "areaConfiguration": area.area_configuration,
            "mapInfo": area.map_info,
        }),
    )
}

/// Area with its project, as returned on creation.
pub fn area_with_project(tables: &Tables, area: &AreaRecord) -> StubResult<Value> {
    let project = project(tables, tables.project(area.project_id)?)?;
    let mut view = self::area(area);
    if let Value::Object(map) = &mut view {
        map.insert("project".into(), project);
    }
    Ok(view)
}

pub fn area_device(tables: &Tables, area_device: &AreaDeviceRecord) -> StubResult<Value> {
    let area = area_with_project(tables, tables.area(area_device.area_id)?)?;
    let device = device(tables, tables.device(area_device.device_id)?)?;
    Ok(with(
        entity(area_device.id, &area_device.audit),
        json!({
            "area": area,
            "mapInfo": area_device.map_info,
            "device": device,
        }),
    ))
}

/// Wraps one page of `items` in the paginated envelope.
///
/// `delta` and `page` must already be normalized (both at least 1).
pub fn paginated(items: Vec<Value>, delta: usize, page: usize) -> Value {
    let total = items.len();
    let num_pages = total.div_ceil(delta).max(1);
    let next_page = if page < num_pages { page + 1 } else { 1 };
    let results: Vec<Value> = items
        .into_iter()
        .skip((page - 1).saturating_mul(delta))
        .take(delta)
        .collect();

    json!({
        "numPages": num_pages,
        "currentPage": page,
        "nextPage": next_page,
        "delta": delta,
        "results": results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::BTreeSet;

    fn keys(value: &Value) -> BTreeSet<&str> {
        value
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_project_view_shape() {
        let store = MemoryStore::default();
        let mut tables = store.write();
        let id = tables
            .insert_project(ProjectRecord {
                name: "p".into(),
                owner_id: store.admin_id(),
                ..Default::default()
            })
            .unwrap();
        let view = project(&tables, tables.project(id).unwrap()).unwrap();
        assert_eq!(
            keys(&view),
            BTreeSet::from([
                "id",
                "entityCreateDate",
                "entityModifyDate",
                "entityVersion",
                "name",
                "description",
                "user"
            ])
        );
        assert_eq!(
            keys(&view["user"]),
            BTreeSet::from(["id", "entityCreateDate", "entityModifyDate", "admin", "imagePath"])
        );
    }

    #[test]
    fn test_device_and_placement_views_shape() {
        let store = MemoryStore::default();
        let mut tables = store.write();
        let project_id = tables
            .insert_project(ProjectRecord {
                name: "p".into(),
                owner_id: store.admin_id(),
                ..Default::default()
            })
            .unwrap();
        let device_id = tables
            .insert_device(DeviceRecord {
                device_name: "d".into(),
                project_id,
                ..Default::default()
            })
            .unwrap();
        let area_id = tables
            .insert_area(AreaRecord {
                name: "a".into(),
                project_id,
                ..Default::default()
            })
            .unwrap();
        let placement_id = tables
            .insert_area_device(AreaDeviceRecord {
                area_id,
                device_id,
                ..Default::default()
            })
            .unwrap();

        let view = device(&tables, tables.device(device_id).unwrap()).unwrap();
        assert_eq!(
            keys(&view),
            BTreeSet::from([
                "id",
                "entityCreateDate",
                "entityModifyDate",
                "entityVersion",
                "deviceName",
                "description",
                "brand",
                "model",
                "firmwareVersion",
                "softwareVersion",
                "loginWithSSLCert",
                "x509Cert",
                "x509CertKey",
                "project",
                "roles"
            ])
        );
        assert!(keys(&view["project"]).contains("user"));

        let placement =
            area_device(&tables, tables.area_device(placement_id).unwrap()).unwrap();
        assert_eq!(
            keys(&placement),
            BTreeSet::from([
                "id",
                "entityCreateDate",
                "entityModifyDate",
                "entityVersion",
                "area",
                "mapInfo",
                "device"
            ])
        );
        assert!(keys(&placement["area"]).contains("project"));
    }

    #[test]
    fn test_user_view_hides_password() {
        let user = UserRecord {
            username: "u".into(),
            password: "secret".into(),
            ..Default::default()
        };
        let view = self::user(&user);
        assert!(view.get("password").is_none());
        assert_eq!(view["username"], "u");
    }

    #[test]
    fn test_paginated_envelope() {
        let items: Vec<Value> = (0..25).map(|i| json!({ "id": i })).collect();
        let page = paginated(items.clone(), 10, 1);
        assert_eq!(page["numPages"], 3);
        assert_eq!(page["nextPage"], 2);
        assert_eq!(page["results"].as_array().unwrap().len(), 10);

        let last = paginated(items, 10, 3);
        assert_eq!(last["nextPage"], 1);
        assert_eq!(last["results"].as_array().unwrap().len(), 5);

        let empty = paginated(Vec::new(), 10, 1);
        assert_eq!(empty["numPages"], 1);
        assert_eq!(empty["results"], json!([]));
    }
}
