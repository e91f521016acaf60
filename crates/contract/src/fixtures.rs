//! Entity fixtures.
//!
//! Every fixture submits a randomized entity as the administrative identity,
//! requires status 200 and the entity's exact full view, and checks that the
//! returned entity echoes what was submitted along with the id of every parent
//! up to the project owner. Any deviation is a [`ContractError::Setup`], which
//! aborts the calling case.
//!
//! Dependency chains: project → device → packet → field, and
//! project → area → area device.

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{AdminSession, ContractClient};
use crate::error::{ContractError, ContractResult};
use crate::model::{
    Area, AreaDevice, HDevice, HPacket, HPacketField, HPacketFieldMultiplicity, HPacketFieldType,
    HPacketFormat, HPacketSerialization, HPacketTrafficPlan, HPacketType, HProject, HUser,
    device_owner_id,
};
use crate::properties::{self, USER_REFERENCE_IN_PROJECT};
use crate::request::HttpRequestBuilder;
use crate::validator::{ResponseValidator, ResponseValidatorBuilder};

/// Password accepted by the platform's password policy.
const FIXTURE_PASSWORD: &str = "passwordPass&01";

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

fn expect_eq<T: PartialEq + Debug>(
    fixture: &str,
    what: &str,
    expected: T,
    actual: T,
) -> ContractResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ContractError::setup(
            fixture,
            format!("{}: expected {:?}, got {:?}", what, expected, actual),
        ))
    }
}

fn expect_created(fixture: &str, id: i64) -> ContractResult<()> {
    if id == 0 {
        Err(ContractError::setup(fixture, "returned entity has no id"))
    } else {
        Ok(())
    }
}

/// Requires the full project view at `path` (empty for the root), owner included.
fn with_project(builder: ResponseValidatorBuilder, path: &str) -> ResponseValidatorBuilder {
    let user_path = if path.is_empty() {
        "user".to_string()
    } else {
        format!("{}.user", path)
    };
    builder
        .contain_exact_inner_properties(path, properties::project())
        .contain_exact_inner_properties(&user_path, USER_REFERENCE_IN_PROJECT.iter().copied())
}

fn project_shape() -> ResponseValidator {
    with_project(ResponseValidator::builder(), "").build()
}

fn device_shape() -> ResponseValidator {
    let builder = ResponseValidator::builder().contain_exact_properties(properties::device());
    with_project(builder, "project").build()
}

/// Fields are not checked: a new packet has none.
fn packet_shape() -> ResponseValidator {
    let builder = ResponseValidator::builder()
        .contain_exact_properties(properties::packet())
        .contain_exact_inner_properties("device", properties::device());
    with_project(builder, "device.project").build()
}

fn field_shape() -> ResponseValidator {
    let builder = ResponseValidator::builder()
        .contain_exact_properties(properties::field())
        .contain_exact_inner_properties("packet", properties::packet())
        .contain_exact_inner_properties("packet.fields", properties::field_in_packet())
        .contain_exact_inner_properties("packet.device", properties::device());
    with_project(builder, "packet.device.project").build()
}

fn user_shape() -> ResponseValidator {
    ResponseValidator::builder()
        .contain_exact_properties(properties::user())
        .build()
}

fn area_shape() -> ResponseValidator {
    let builder =
        ResponseValidator::builder().contain_exact_properties(properties::area_with_project());
    with_project(builder, "project").build()
}

fn area_device_shape() -> ResponseValidator {
    let builder = ResponseValidator::builder()
        .contain_exact_properties(properties::area_device())
        .contain_exact_inner_properties("area", properties::area_with_project())
        .contain_exact_inner_properties("device", properties::device());
    with_project(with_project(builder, "area.project"), "device.project").build()
}

/// Creates prerequisite entities for a case.
pub struct Fixtures<'a> {
    client: &'a ContractClient,
    session: &'a AdminSession,
}

impl<'a> Fixtures<'a> {
    /// Creates fixtures acting as the given session.
    pub fn new(client: &'a ContractClient, session: &'a AdminSession) -> Self {
        Self { client, session }
    }

    fn admin_username(&self) -> String {
        self.session.user.username.clone().unwrap_or_default()
    }

    /// Description every fixture project carries.
    pub fn project_description(&self) -> String {
        format!("Project of user: {}", self.admin_username())
    }

    /// Builds an unsaved project owned by the admin, with a unique name.
    pub fn new_project(&self) -> HProject {
        HProject {
            name: format!("Project {}", Uuid::new_v4()),
            description: Some(self.project_description()),
            user: Some(self.session.user.clone()),
            ..Default::default()
        }
    }

    async fn submit<B, R>(
        &self,
        fixture: &str,
        uri: &str,
        body: &B,
        shape: &ResponseValidator,
    ) -> ContractResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let request = self
            .session
            .authorize(HttpRequestBuilder::post())
            .with_uri(uri)
            .with_content_type_header("application/json")
            .with_json_body(body)
            .build()?;

        let response = self.client.execute(&request).await?;
        if response.status() != 200 {
            return Err(ContractError::setup(
                fixture,
                format!(
                    "{} returned {}: {}",
                    request.label(),
                    response.status(),
                    response.body()
                ),
            ));
        }

        let report = shape.validate(&response);
        if !report.passed() {
            warn!(
                request = %request.label(),
                actual = %report.actual_body(),
                expected = ?report.expected_shape(),
                "Fixture response does not match"
            );
            let mismatches: Vec<String> = report.mismatches().iter().map(|m| m.to_string()).collect();
            return Err(ContractError::setup(
                fixture,
                format!("{} shape: {}", request.label(), mismatches.join("; ")),
            ));
        }

        response
            .entity()
            .map_err(|e| ContractError::setup(fixture, format!("unreadable entity: {}", e)))
    }

    /// Creates a project owned by the admin.
    pub async fn create_project(&self) -> ContractResult<HProject> {
        const FIXTURE: &str = "create_project";
        let project = self.new_project();

        let created: HProject = self
            .submit(FIXTURE, "/hprojects", &project, &project_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        expect_eq(FIXTURE, "name", &project.name, &created.name)?;
        expect_eq(FIXTURE, "description", &project.description, &created.description)?;
        expect_eq(
            FIXTURE,
            "owner id",
            Some(self.session.user_id()),
            created.user.as_ref().map(|u| u.id),
        )?;

        info!(id = created.id, name = %created.name, "Created project");
        Ok(created)
    }

    /// Creates a device inside `project`.
    pub async fn create_device(&self, project: &HProject) -> ContractResult<HDevice> {
        const FIXTURE: &str = "create_device";
        let device = HDevice {
            device_name: format!("deviceName{}", unique_suffix()),
            brand: Some("Brand".to_string()),
            model: Some("model".to_string()),
            firmware_version: Some("1.".to_string()),
            software_version: Some("1.".to_string()),
            description: Some(format!("Property of: {}", self.admin_username())),
            password: Some(FIXTURE_PASSWORD.to_string()),
            password_confirm: Some(FIXTURE_PASSWORD.to_string()),
            login_with_ssl_cert: false,
            project: Some(project.clone()),
            ..Default::default()
        };

        let created: HDevice = self
            .submit(FIXTURE, "/hdevices", &device, &device_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        expect_eq(FIXTURE, "deviceName", &device.device_name, &created.device_name)?;
        expect_eq(FIXTURE, "brand", &device.brand, &created.brand)?;
        expect_eq(FIXTURE, "description", &device.description, &created.description)?;
        expect_eq(FIXTURE, "firmwareVersion", &device.firmware_version, &created.firmware_version)?;
        expect_eq(FIXTURE, "model", &device.model, &created.model)?;
        expect_eq(FIXTURE, "softwareVersion", &device.software_version, &created.software_version)?;
        expect_eq(FIXTURE, "loginWithSSLCert", false, created.login_with_ssl_cert)?;
        expect_eq(
            FIXTURE,
            "project id",
            Some(project.id),
            created.project.as_ref().map(|p| p.id),
        )?;
        expect_eq(
            FIXTURE,
            "owner id",
            Some(self.session.user_id()),
            device_owner_id(&created),
        )?;

        info!(id = created.id, project_id = project.id, "Created device");
        Ok(created)
    }

    /// Creates a packet emitted by `device`.
    pub async fn create_packet(&self, device: &HDevice) -> ContractResult<HPacket> {
        const FIXTURE: &str = "create_packet";
        let packet = HPacket {
            name: format!("name{}", unique_suffix()),
            packet_type: HPacketType::Io,
            format: HPacketFormat::Json,
            serialization: HPacketSerialization::Avro,
            version: Some(format!("version{}", unique_suffix())),
            traffic_plan: HPacketTrafficPlan::Low,
            timestamp_field: Some(chrono::Utc::now().to_string()),
            timestamp_format: Some("String".to_string()),
            device: Some(device.clone()),
            ..Default::default()
        };

        let created: HPacket = self
            .submit(FIXTURE, "/hpackets", &packet, &packet_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        let created_device = created.device.as_ref();
        expect_eq(
            FIXTURE,
            "device id",
            Some(device.id),
            created_device.map(|d| d.id),
        )?;
        expect_eq(
            FIXTURE,
            "project id",
            device.project.as_ref().map(|p| p.id),
            created_device.and_then(|d| d.project.as_ref()).map(|p| p.id),
        )?;
        expect_eq(
            FIXTURE,
            "owner id",
            Some(self.session.user_id()),
            created_device.and_then(device_owner_id),
        )?;

        info!(id = created.id, device_id = device.id, "Created packet");
        Ok(created)
    }

    /// Adds a field to `packet`.
    pub async fn create_field(&self, packet: &HPacket) -> ContractResult<HPacketField> {
        const FIXTURE: &str = "create_field";
        let field = HPacketField {
            name: format!("temperature{}", unique_suffix()),
            description: Some("Temperature".to_string()),
            field_type: HPacketFieldType::Double,
            multiplicity: HPacketFieldMultiplicity::Single,
            value: Some(serde_json::json!(24.0)),
            packet: Some(Box::new(packet.clone())),
            ..Default::default()
        };

        let uri = format!("/hpackets/{}/fields", packet.id);
        let created: HPacketField = self.submit(FIXTURE, &uri, &field, &field_shape()).await?;
        expect_created(FIXTURE, created.id)?;
        let created_packet = created.packet.as_deref();
        let created_device = created_packet.and_then(|p| p.device.as_ref());
        let device = packet.device.as_ref();
        expect_eq(
            FIXTURE,
            "packet id",
            Some(packet.id),
            created_packet.map(|p| p.id),
        )?;
        expect_eq(
            FIXTURE,
            "device id",
            device.map(|d| d.id),
            created_device.map(|d| d.id),
        )?;
        expect_eq(
            FIXTURE,
            "project id",
            device.and_then(|d| d.project.as_ref()).map(|p| p.id),
            created_device.and_then(|d| d.project.as_ref()).map(|p| p.id),
        )?;
        expect_eq(
            FIXTURE,
            "owner id",
            Some(self.session.user_id()),
            created_device.and_then(device_owner_id),
        )?;

        info!(id = created.id, packet_id = packet.id, "Created packet field");
        Ok(created)
    }

    /// Creates an active, non-admin user.
    pub async fn create_user(&self) -> ContractResult<HUser> {
        const FIXTURE: &str = "create_user";
        let user = HUser {
            name: Some("name".to_string()),
            lastname: Some("lastname".to_string()),
            username: Some(format!("TestUser{}", unique_suffix())),
            email: Some(format!("testusername{}@hyperiot.com", Uuid::new_v4())),
            password: Some(FIXTURE_PASSWORD.to_string()),
            password_confirm: Some(FIXTURE_PASSWORD.to_string()),
            admin: false,
            active: true,
            ..Default::default()
        };

        let created: HUser = self
            .submit(FIXTURE, "/husers", &user, &user_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        expect_eq(FIXTURE, "name", &user.name, &created.name)?;
        expect_eq(FIXTURE, "lastname", &user.lastname, &created.lastname)?;
        expect_eq(FIXTURE, "username", &user.username, &created.username)?;
        expect_eq(FIXTURE, "email", &user.email, &created.email)?;
        expect_eq(FIXTURE, "admin", false, created.admin)?;
        expect_eq(FIXTURE, "active", true, created.active)?;

        info!(id = created.id, "Created user");
        Ok(created)
    }

    /// Creates an area inside `project`.
    pub async fn create_area(&self, project: &HProject) -> ContractResult<Area> {
        const FIXTURE: &str = "create_area";
        expect_eq(
            FIXTURE,
            "project description",
            Some(self.project_description()),
            project.description.clone(),
        )?;

        let area = Area {
            name: format!("Area {}", Uuid::new_v4()),
            description: Some("Description".to_string()),
            project: Some(project.clone()),
            ..Default::default()
        };

        let created: Area = self
            .submit(FIXTURE, "/areas", &area, &area_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        expect_eq(FIXTURE, "name", &area.name, &created.name)?;
        expect_eq(FIXTURE, "description", &area.description, &created.description)?;
        let created_project = created.project.as_ref();
        expect_eq(
            FIXTURE,
            "project id",
            Some(project.id),
            created_project.map(|p| p.id),
        )?;
        expect_eq(
            FIXTURE,
            "owner id",
            Some(self.session.user_id()),
            created_project.and_then(|p| p.user.as_ref()).map(|u| u.id),
        )?;

        info!(id = created.id, project_id = project.id, "Created area");
        Ok(created)
    }

    /// Places `device` inside `area`.
    pub async fn create_area_device(
        &self,
        area: &Area,
        device: &HDevice,
    ) -> ContractResult<AreaDevice> {
        const FIXTURE: &str = "create_area_device";
        let area_device = AreaDevice {
            device: Some(device.clone()),
            ..Default::default()
        };

        let uri = format!("/areas/{}/devices", area.id);
        let created: AreaDevice = self
            .submit(FIXTURE, &uri, &area_device, &area_device_shape())
            .await?;
        expect_created(FIXTURE, created.id)?;
        let created_area = created.area.as_ref();
        let created_device = created.device.as_ref();
        expect_eq(FIXTURE, "area id", Some(area.id), created_area.map(|a| a.id))?;
        expect_eq(
            FIXTURE,
            "device id",
            Some(device.id),
            created_device.map(|d| d.id),
        )?;
        expect_eq(
            FIXTURE,
            "area owner id",
            Some(self.session.user_id()),
            created_area
                .and_then(|a| a.project.as_ref())
                .and_then(|p| p.user.as_ref())
                .map(|u| u.id),
        )?;
        expect_eq(
            FIXTURE,
            "device owner id",
            Some(self.session.user_id()),
            created_device.and_then(device_owner_id),
        )?;

        info!(id = created.id, area_id = area.id, device_id = device.id, "Created area device");
        Ok(created)
    }
}
