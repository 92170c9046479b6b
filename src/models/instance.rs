use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::image::ImageOs;

/// Credentials provisioned on first boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultAccount {
    pub username: String,
    pub password: String,
}

/// Public side of an address attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicIp {
    pub address: String,
    pub attached: bool,
}

/// Private side of an address attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateIp {
    pub address: String,
    pub netmask: String,
    pub network: String,
    pub broadcast: String,
    pub gateway: String,
}

/// One address pair attached to an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpAttachment {
    pub public: PublicIp,
    pub private: PrivateIp,
    /// Attachment type (e.g. `fixed`, `floating`)
    #[serde(rename = "type")]
    pub kind: String,
}

/// Zone reference embedded in an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceZone {
    pub zone_id: String,
    pub name: String,
}

/// Flavor snapshot embedded in an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceFlavor {
    pub flavor_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub vcpu: u32,
    pub memory: u64,
    pub disk: u64,
    pub network: u64,
    pub gpu: Option<String>,
}

/// Image snapshot embedded in an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceImage {
    pub image_id: String,
    pub visibility: String,
    pub os: ImageOs,
    pub image_type: String,
    #[serde(default)]
    pub zone: Vec<String>,
}

/// Monitoring endpoint for an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitoring {
    pub port: String,
    pub resource: String,
}

/// Attached block storage volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceVolume {
    pub volume_id: String,
    pub name: String,
    /// Volume size in GB
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

/// VNC console access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vnc {
    pub link: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Attachment ceilings for an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionLimit {
    pub block_storage: u32,
    pub ip: u32,
}

/// Traffic accounting for an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traffic {
    /// Included traffic allowance
    #[serde(rename = "default")]
    pub default_allowance: u64,
    /// Accounting period (e.g. `month`)
    pub period: String,
    /// Hard cap, if one applies
    pub limit: Option<u64>,
    /// Remaining traffic resets allowed, if capped
    pub reset_allow_count: Option<u64>,
}

/// A compute instance as returned by `/v1/instances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Power/lifecycle status (e.g. `ACTIVE`, `SHUTOFF`)
    pub status: String,
    pub provide: String,
    pub start_date: String,
    pub stop_date: Option<String>,
    pub default_account: DefaultAccount,
    #[serde(default)]
    pub ip: Vec<IpAttachment>,
    pub zone: InstanceZone,
    pub flavor: InstanceFlavor,
    pub image: InstanceImage,
    pub monitoring: Monitoring,
    #[serde(default)]
    pub block_storage: Vec<InstanceVolume>,
    pub vnc: Vnc,
    pub connection_limit: ConnectionLimit,
    pub traffic: Traffic,
}

/// Query parameters for `GET /api/instances`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListInstancesQuery {
    /// 1-indexed page number; absent means the first page
    pub page: Option<u64>,
}

/// Payload for `POST /api/instances`.
///
/// Relayed to `POST /v1/instances` after validation; optional fields are
/// dropped from the upstream body entirely when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub flavor_id: String,
    pub image_id: String,
    pub network_id: String,
    pub zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_script_id: Option<String>,
}

/// A lifecycle action on an instance.
///
/// The dashboard posts `{"action": "...", ...}` to one inbound endpoint; each
/// action maps to its own upstream endpoint, and only some carry a body.
/// Parsing out of the inbound JSON lives in [`crate::validation`], which also
/// rejects unknown actions before anything is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceAction {
    Start,
    Shutdown,
    /// Reboot with the given mode (`SOFT` or `HARD`).
    Reboot { kind: String },
    /// Reinstall from the given image.
    Rebuild { image_id: String },
    /// Move to the given flavor.
    Resize { flavor_id: String },
}

impl InstanceAction {
    /// Final path segment of the upstream action endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Shutdown => "shutdown",
            Self::Reboot { .. } => "reboot",
            Self::Rebuild { .. } => "rebuild",
            Self::Resize { .. } => "resize",
        }
    }

    /// JSON body for the upstream call, if this action carries one.
    pub fn upstream_body(&self) -> Option<Value> {
        match self {
            Self::Start | Self::Shutdown => None,
            Self::Reboot { kind } => Some(json!({ "type": kind })),
            Self::Rebuild { image_id } => Some(json!({ "image_id": image_id })),
            Self::Resize { flavor_id } => Some(json!({ "flavor_id": flavor_id })),
        }
    }
}
