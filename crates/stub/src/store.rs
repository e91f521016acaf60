//! In-memory entity store.
//!
//! All tables live behind one [`parking_lot::RwLock`]; handlers take the lock,
//! do their work synchronously and release it before responding. Ids come from
//! a single counter shared by every table, so an id is never reused within a
//! store's lifetime, truncation included.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StubError, StubResult};

/// Tables of the store, named as in the platform's database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTable {
    AreaDevice,
    Area,
    HPacketField,
    HPacket,
    HDevice,
    HProject,
    HUser,
}

impl StoreTable {
    pub fn name(&self) -> &'static str {
        match self {
            StoreTable::AreaDevice => "area_device",
            StoreTable::Area => "area",
            StoreTable::HPacketField => "hpacketfield",
            StoreTable::HPacket => "hpacket",
            StoreTable::HDevice => "hdevice",
            StoreTable::HProject => "hproject",
            StoreTable::HUser => "huser",
        }
    }

    pub fn from_name(name: &str) -> StubResult<Self> {
        Ok(match name {
            "area_device" => StoreTable::AreaDevice,
            "area" => StoreTable::Area,
            "hpacketfield" => StoreTable::HPacketField,
            "hpacket" => StoreTable::HPacket,
            "hdevice" => StoreTable::HDevice,
            "hproject" => StoreTable::HProject,
            "huser" => StoreTable::HUser,
            other => return Err(StubError::UnknownTable(other.to_string())),
        })
    }
}

impl fmt::Display for StoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Creation and modification bookkeeping common to every entity.
#[derive(Debug, Clone)]
pub struct Audit {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub version: i64,
}

impl Default for Audit {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
            version: 1,
        }
    }
}

impl Audit {
    /// Records a modification.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
        self.version += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub id: i64,
    pub audit: Audit,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub admin: bool,
    pub active: bool,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectRecord {
    pub id: i64,
    pub audit: Audit,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    pub id: i64,
    pub audit: Audit,
    pub device_name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub software_version: Option<String>,
    pub description: Option<String>,
    pub password: String,
    pub login_with_ssl_cert: bool,
    pub x509_cert: Option<String>,
    pub x509_cert_key: Option<String>,
    pub project_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PacketRecord {
    pub id: i64,
    pub audit: Audit,
    pub name: String,
    pub packet_type: String,
    pub format: String,
    pub serialization: String,
    pub version: Option<String>,
    pub traffic_plan: String,
    pub timestamp_field: Option<String>,
    pub timestamp_format: Option<String>,
    pub unix_timestamp: bool,
    pub unix_timestamp_format_seconds: bool,
    pub device_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FieldRecord {
    pub id: i64,
    pub audit: Audit,
    pub name: String,
    pub description: Option<String>,
    pub field_type: String,
    pub multiplicity: String,
    pub unit: Option<String>,
    pub value: Value,
    pub packet_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AreaRecord {
    pub id: i64,
    pub audit: Audit,
    pub name: String,
    pub description: Option<String>,
    pub area_view_type: String,
    pub area_configuration: Option<String>,
    pub map_info: Value,
    pub project_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AreaDeviceRecord {
    pub id: i64,
    pub audit: Audit,
    pub area_id: i64,
    pub device_id: i64,
    pub map_info: Value,
}

/// Every table of the store.
#[derive(Debug, Default)]
pub struct Tables {
    next_id: i64,
    pub users: BTreeMap<i64, UserRecord>,
    pub projects: BTreeMap<i64, ProjectRecord>,
    pub devices: BTreeMap<i64, DeviceRecord>,
    pub packets: BTreeMap<i64, PacketRecord>,
    pub fields: BTreeMap<i64, FieldRecord>,
    pub areas: BTreeMap<i64, AreaRecord>,
    pub area_devices: BTreeMap<i64, AreaDeviceRecord>,
    tokens: HashMap<String, IssuedToken>,
    token_serial: u64,
}

/// Tokens a single user may hold at once; logging in again past this
/// revokes the oldest.
pub const MAX_TOKENS_PER_USER: usize = 8;

#[derive(Debug, Clone, Copy)]
struct IssuedToken {
    user_id: i64,
    serial: u64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn user(&self, id: i64) -> StubResult<&UserRecord> {
        self.users.get(&id).ok_or(StubError::not_found("HUser", id))
    }

    pub fn project(&self, id: i64) -> StubResult<&ProjectRecord> {
        self.projects
            .get(&id)
            .ok_or(StubError::not_found("HProject", id))
    }

    pub fn project_mut(&mut self, id: i64) -> StubResult<&mut ProjectRecord> {
        self.projects
            .get_mut(&id)
            .ok_or(StubError::not_found("HProject", id))
    }

    pub fn device(&self, id: i64) -> StubResult<&DeviceRecord> {
        self.devices
            .get(&id)
            .ok_or(StubError::not_found("HDevice", id))
    }

    pub fn packet(&self, id: i64) -> StubResult<&PacketRecord> {
        self.packets
            .get(&id)
            .ok_or(StubError::not_found("HPacket", id))
    }

    pub fn field(&self, id: i64) -> StubResult<&FieldRecord> {
        self.fields
            .get(&id)
            .ok_or(StubError::not_found("HPacketField", id))
    }

    pub fn area(&self, id: i64) -> StubResult<&AreaRecord> {
        self.areas.get(&id).ok_or(StubError::not_found("Area", id))
    }

    pub fn area_device(&self, id: i64) -> StubResult<&AreaDeviceRecord> {
        self.area_devices
            .get(&id)
            .ok_or(StubError::not_found("AreaDevice", id))
    }

    pub fn user_by_username(&self, username: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.username == username)
    }

    /// Projects the user may see: all of them for an administrator, owned
    /// ones otherwise.
    pub fn projects_visible_to(&self, user: &UserRecord) -> Vec<&ProjectRecord> {
        self.projects
            .values()
            .filter(|p| user.admin || p.owner_id == user.id)
            .collect()
    }

    pub fn devices_of_project(&self, project_id: i64) -> Vec<&DeviceRecord> {
        self.devices
            .values()
            .filter(|d| d.project_id == project_id)
            .collect()
    }

    pub fn packets_of_project(&self, project_id: i64) -> Vec<&PacketRecord> {
        self.packets
            .values()
            .filter(|p| {
                self.devices
                    .get(&p.device_id)
                    .is_some_and(|d| d.project_id == project_id)
            })
            .collect()
    }

    pub fn fields_of_packet(&self, packet_id: i64) -> Vec<&FieldRecord> {
        self.fields
            .values()
            .filter(|f| f.packet_id == packet_id)
            .collect()
    }

    pub fn areas_of_project(&self, project_id: i64) -> Vec<&AreaRecord> {
        self.areas
            .values()
            .filter(|a| a.project_id == project_id)
            .collect()
    }

    pub fn insert_user(&mut self, mut record: UserRecord) -> StubResult<i64> {
        if self.user_by_username(&record.username).is_some() {
            return Err(StubError::Duplicate {
                field: "username".to_string(),
            });
        }
        if record.email.is_some() && self.users.values().any(|u| u.email == record.email) {
            return Err(StubError::Duplicate {
                field: "email".to_string(),
            });
        }
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.users.insert(id, record);
        Ok(id)
    }

    pub fn insert_project(&mut self, mut record: ProjectRecord) -> StubResult<i64> {
        self.user(record.owner_id)?;
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.projects.insert(id, record);
        Ok(id)
    }

    pub fn insert_device(&mut self, mut record: DeviceRecord) -> StubResult<i64> {
        self.project(record.project_id)?;
        if self
            .devices
            .values()
            .any(|d| d.device_name == record.device_name)
        {
            return Err(StubError::Duplicate {
                field: "deviceName".to_string(),
            });
        }
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.devices.insert(id, record);
        Ok(id)
    }

    pub fn insert_packet(&mut self, mut record: PacketRecord) -> StubResult<i64> {
        self.device(record.device_id)?;
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.packets.insert(id, record);
        Ok(id)
    }

    pub fn insert_field(&mut self, mut record: FieldRecord) -> StubResult<i64> {
        self.packet(record.packet_id)?;
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        let packet_id = record.packet_id;
        self.fields.insert(id, record);
        if let Some(packet) = self.packets.get_mut(&packet_id) {
            packet.audit.touch();
        }
        Ok(id)
    }

    pub fn insert_area(&mut self, mut record: AreaRecord) -> StubResult<i64> {
        self.project(record.project_id)?;
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.areas.insert(id, record);
        Ok(id)
    }

    pub fn insert_area_device(&mut self, mut record: AreaDeviceRecord) -> StubResult<i64> {
        let area_project = self.area(record.area_id)?.project_id;
        let device_project = self.device(record.device_id)?.project_id;
        if area_project != device_project {
            return Err(StubError::validation(
                "device",
                "device and area belong to different projects",
            ));
        }
        record.id = self.next_id();
        record.audit = Audit::default();
        let id = record.id;
        self.area_devices.insert(id, record);
        Ok(id)
    }

    /// Deletes a project and everything that hangs off it.
    pub fn delete_project(&mut self, id: i64) -> StubResult<()> {
        self.projects
            .remove(&id)
            .ok_or(StubError::not_found("HProject", id))?;

        let devices: Vec<i64> = self
            .devices
            .values()
            .filter(|d| d.project_id == id)
            .map(|d| d.id)
            .collect();
        let areas: Vec<i64> = self
            .areas
            .values()
            .filter(|a| a.project_id == id)
            .map(|a| a.id)
            .collect();

        self.area_devices
            .retain(|_, ad| !areas.contains(&ad.area_id) && !devices.contains(&ad.device_id));
        self.areas.retain(|_, a| a.project_id != id);

        let packets: Vec<i64> = self
            .packets
            .values()
            .filter(|p| devices.contains(&p.device_id))
            .map(|p| p.id)
            .collect();
        self.fields.retain(|_, f| !packets.contains(&f.packet_id));
        self.packets.retain(|_, p| !devices.contains(&p.device_id));
        self.devices.retain(|_, d| d.project_id != id);
        Ok(())
    }

    /// Empties a table together with every table referencing it.
    pub fn truncate(&mut self, table: StoreTable, keep_user: i64) {
        match table {
            StoreTable::AreaDevice => self.area_devices.clear(),
            StoreTable::Area => {
                self.area_devices.clear();
                self.areas.clear();
            }
            StoreTable::HPacketField => self.fields.clear(),
            StoreTable::HPacket => {
                self.fields.clear();
                self.packets.clear();
            }
            StoreTable::HDevice => {
                self.area_devices.clear();
                self.fields.clear();
                self.packets.clear();
                self.devices.clear();
            }
            StoreTable::HProject => {
                self.area_devices.clear();
                self.areas.clear();
                self.fields.clear();
                self.packets.clear();
                self.devices.clear();
                self.projects.clear();
            }
            StoreTable::HUser => {
                self.truncate(StoreTable::HProject, keep_user);
                self.users.retain(|id, _| *id == keep_user);
                self.tokens.retain(|_, t| t.user_id == keep_user);
            }
        }
    }

    /// Issues a new token for the user, revoking its oldest one when it
    /// already holds [`MAX_TOKENS_PER_USER`].
    pub fn issue_token(&mut self, user_id: i64) -> String {
        let held: Vec<(u64, &String)> = self
            .tokens
            .iter()
            .filter(|(_, t)| t.user_id == user_id)
            .map(|(token, t)| (t.serial, token))
            .collect();
        let oldest = if held.len() >= MAX_TOKENS_PER_USER {
            held.into_iter().min().map(|(_, token)| token.clone())
        } else {
            None
        };
        if let Some(oldest) = oldest {
            debug!(user_id, "Revoking oldest token");
            self.tokens.remove(&oldest);
        }

        self.token_serial += 1;
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(
            token.clone(),
            IssuedToken {
                user_id,
                serial: self.token_serial,
            },
        );
        token
    }

    pub fn user_for_token(&self, token: &str) -> Option<&UserRecord> {
        self.tokens
            .get(token)
            .and_then(|t| self.users.get(&t.user_id))
    }
}

/// Thread-safe in-memory store seeded with one administrator.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    admin_id: i64,
}

impl MemoryStore {
    /// Creates a store holding only the administrator.
    pub fn new(admin_username: &str, admin_password: &str) -> Self {
        let mut tables = Tables::default();
        let admin_id = tables.next_id();
        tables.users.insert(
            admin_id,
            UserRecord {
                id: admin_id,
                audit: Audit::default(),
                name: Some("HyperIoT".to_string()),
                lastname: Some("Admin".to_string()),
                username: admin_username.to_string(),
                email: Some(format!("{}@hyperiot.com", admin_username)),
                password: admin_password.to_string(),
                admin: true,
                active: true,
                image_path: None,
            },
        );

        Self {
            tables: RwLock::new(tables),
            admin_id,
        }
    }

    /// Returns the id of the seeded administrator.
    pub fn admin_id(&self) -> i64 {
        self.admin_id
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write()
    }

    /// Checks credentials of an active user and issues a token.
    pub fn login(&self, username: &str, password: &str) -> StubResult<(String, i64)> {
        let mut tables = self.tables.write();
        let user_id = tables
            .user_by_username(username)
            .filter(|u| u.active && u.password == password)
            .map(|u| u.id)
            .ok_or_else(|| StubError::Unauthenticated(username.to_string()))?;
        let token = tables.issue_token(user_id);
        Ok((token, user_id))
    }

    /// Empties a table and its dependents. The administrator survives.
    pub fn truncate(&self, table: StoreTable) {
        debug!(%table, "Truncating table");
        self.tables.write().truncate(table, self.admin_id);
    }

    /// Truncates a table given by its database name.
    pub fn truncate_by_name(&self, name: &str) -> StubResult<()> {
        let table = StoreTable::from_name(name)?;
        self.truncate(table);
        Ok(())
    }

    /// Number of rows in a table.
    pub fn count(&self, table: StoreTable) -> usize {
        let tables = self.tables.read();
        match table {
            StoreTable::AreaDevice => tables.area_devices.len(),
            StoreTable::Area => tables.areas.len(),
            StoreTable::HPacketField => tables.fields.len(),
            StoreTable::HPacket => tables.packets.len(),
            StoreTable::HDevice => tables.devices.len(),
            StoreTable::HProject => tables.projects.len(),
            StoreTable::HUser => tables.users.len(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("hadmin", "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryStore, i64, i64, i64) {
        let store = MemoryStore::default();
        let owner = store.admin_id();
        let mut tables = store.write();
        let project = tables
            .insert_project(ProjectRecord {
                name: "p".into(),
                owner_id: owner,
                ..Default::default()
            })
            .unwrap();
        let device = tables
            .insert_device(DeviceRecord {
                device_name: "d".into(),
                project_id: project,
                ..Default::default()
            })
            .unwrap();
        let packet = tables
            .insert_packet(PacketRecord {
                name: "pk".into(),
                device_id: device,
                ..Default::default()
            })
            .unwrap();
        tables
            .insert_field(FieldRecord {
                name: "f".into(),
                packet_id: packet,
                ..Default::default()
            })
            .unwrap();
        drop(tables);
        (store, project, device, packet)
    }

    #[test]
    fn test_admin_is_seeded() {
        let store = MemoryStore::default();
        assert_eq!(store.admin_id(), 1);
        assert!(store.read().user(1).unwrap().admin);
    }

    #[test]
    fn test_login_and_token() {
        let store = MemoryStore::default();
        let (token, id) = store.login("hadmin", "admin").unwrap();
        assert_eq!(id, store.admin_id());
        assert_eq!(store.read().user_for_token(&token).unwrap().id, id);
        assert!(store.login("hadmin", "wrong").is_err());
    }

    #[test]
    fn test_repeated_logins_keep_token_map_bounded() {
        let store = MemoryStore::default();
        let (first, _) = store.login("hadmin", "admin").unwrap();
        let mut last = String::new();
        for _ in 0..MAX_TOKENS_PER_USER * 3 {
            last = store.login("hadmin", "admin").unwrap().0;
        }

        let tables = store.read();
        assert_eq!(tables.tokens.len(), MAX_TOKENS_PER_USER);
        assert!(tables.user_for_token(&first).is_none());
        assert!(tables.user_for_token(&last).is_some());
    }

    #[test]
    fn test_insert_requires_parent() {
        let store = MemoryStore::default();
        let err = store
            .write()
            .insert_device(DeviceRecord {
                project_id: 999,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, StubError::not_found("HProject", 999));
    }

    #[test]
    fn test_delete_project_cascades() {
        let (store, project, _, _) = seeded();
        store.write().delete_project(project).unwrap();
        assert_eq!(store.count(StoreTable::HDevice), 0);
        assert_eq!(store.count(StoreTable::HPacket), 0);
        assert_eq!(store.count(StoreTable::HPacketField), 0);
    }

    #[test]
    fn test_truncate_keeps_admin_and_ids_grow() {
        let (store, project, _, _) = seeded();
        store.truncate(StoreTable::HUser);
        assert_eq!(store.count(StoreTable::HUser), 1);
        assert_eq!(store.count(StoreTable::HProject), 0);

        let next = store
            .write()
            .insert_project(ProjectRecord {
                owner_id: store.admin_id(),
                ..Default::default()
            })
            .unwrap();
        assert!(next > project);
    }

    #[test]
    fn test_truncate_by_name() {
        let (store, _, _, _) = seeded();
        store.truncate_by_name("hpacket").unwrap();
        assert_eq!(store.count(StoreTable::HPacket), 0);
        assert_eq!(store.count(StoreTable::HPacketField), 0);
        assert_eq!(store.count(StoreTable::HDevice), 1);
        assert!(store.truncate_by_name("nope").is_err());
    }

    #[test]
    fn test_duplicate_username() {
        let store = MemoryStore::default();
        let err = store
            .write()
            .insert_user(UserRecord {
                username: "hadmin".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StubError::Duplicate { .. }));
    }
}
