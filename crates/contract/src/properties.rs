//! Expected JSON property sets.
//!
//! Every full entity view carries [`BASE_ENTITY`] plus its own properties.
//! Reference views (an entity embedded in another) carry a reduced set and
//! are listed separately.

/// Properties common to every persisted entity.
pub const BASE_ENTITY: &[&str] = &["id", "entityCreateDate", "entityModifyDate", "entityVersion"];

/// Project-specific properties.
pub const PROJECT: &[&str] = &["name", "description", "user"];

/// User-specific properties.
pub const USER: &[&str] = &[
    "name",
    "lastname",
    "username",
    "email",
    "admin",
    "active",
    "imagePath",
    "roles",
];

/// Owner as embedded in a project.
pub const USER_REFERENCE_IN_PROJECT: &[&str] = &[
    "id",
    "entityCreateDate",
    "entityModifyDate",
    "admin",
    "imagePath",
];

/// Packet-specific properties, as returned by the project tree view.
pub const PACKET: &[&str] = &[
    "name",
    "type",
    "format",
    "serialization",
    "version",
    "valid",
    "timestampField",
    "timestampFormat",
    "unixTimestamp",
    "unixTimestampFormatSeconds",
    "trafficPlan",
    "device",
    "fields",
];

/// Device-specific properties.
pub const DEVICE: &[&str] = &[
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
    "roles",
];

/// Device as embedded in a packet.
pub const DEVICE_REFERENCE_IN_PACKET: &[&str] = &[
    "id",
    "entityCreateDate",
    "entityModifyDate",
    "deviceName",
    "brand",
    "model",
    "firmwareVersion",
    "softwareVersion",
    "description",
    "project",
    "roles",
];

/// Field-specific properties, as embedded in a packet.
pub const FIELD_IN_PACKET: &[&str] = &[
    "name",
    "description",
    "type",
    "multiplicity",
    "unit",
    "value",
    "innerFields",
];

/// A standalone field adds its owning packet.
pub const FIELD_PACKET: &str = "packet";

/// Project as embedded in a device.
pub const PROJECT_REFERENCE_IN_DEVICE: &[&str] = &[
    "id",
    "entityCreateDate",
    "entityModifyDate",
    "name",
    "description",
];

/// Summary card of a project.
pub const PROJECT_CARD: &[&str] = &[
    "id",
    "entityCreateDate",
    "entityModifyDate",
    "name",
    "description",
    "deviceCount",
    "statisticsCount",
    "rulesCount",
    "hProjectSharingInfo",
];

/// Area-specific properties.
pub const AREA: &[&str] = &[
    "name",
    "description",
    "areaViewType",
    "areaConfiguration",
    "mapInfo",
];

/// An area returned on its own carries its project.
pub const AREA_PROJECT: &str = "project";

/// Placement-specific properties of a device in an area.
pub const AREA_DEVICE: &[&str] = &["area", "mapInfo", "device"];

/// Envelope of every paginated list.
pub const PAGINATED: &[&str] = &["numPages", "currentPage", "nextPage", "delta", "results"];

/// Name of the array inside the paginated envelope.
pub const PAGINATED_RESULTS: &str = "results";

/// Returns the base set joined with entity-specific properties.
pub fn with_base_entity(specific: &[&'static str]) -> Vec<&'static str> {
    BASE_ENTITY.iter().chain(specific.iter()).copied().collect()
}

/// Full project view.
pub fn project() -> Vec<&'static str> {
    with_base_entity(PROJECT)
}

/// Full user view.
pub fn user() -> Vec<&'static str> {
    with_base_entity(USER)
}

/// Full device view.
pub fn device() -> Vec<&'static str> {
    with_base_entity(DEVICE)
}

/// Full packet view.
pub fn packet() -> Vec<&'static str> {
    with_base_entity(PACKET)
}

/// Full field view, as embedded in a packet.
pub fn field_in_packet() -> Vec<&'static str> {
    with_base_entity(FIELD_IN_PACKET)
}

/// Full field view with its packet.
pub fn field() -> Vec<&'static str> {
    let mut view = field_in_packet();
    view.push(FIELD_PACKET);
    view
}

/// Full area view.
pub fn area() -> Vec<&'static str> {
    with_base_entity(AREA)
}

/// Full area view with its project.
pub fn area_with_project() -> Vec<&'static str> {
    let mut view = area();
    view.push(AREA_PROJECT);
    view
}

/// Full view of a device placed in an area.
pub fn area_device() -> Vec<&'static str> {
    with_base_entity(AREA_DEVICE)
}
