//! Azure NetApp Files data models
//!
//! Request and response shapes for the `Microsoft.NetApp` resource provider.
//! Every resource uses the ARM envelope `{ id, name, type, location, tags,
//! properties }`; read-only fields are optional so the same structs serve as
//! request bodies and parsed responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use zeroize::Zeroizing;

pub const GIB: u64 = 1024 * 1024 * 1024;
pub const TIB: u64 = 1024 * GIB;

/// Smallest capacity pool the service accepts (4 TiB)
pub const MIN_POOL_SIZE: u64 = 4 * TIB;
/// Largest capacity pool the service accepts (500 TiB)
pub const MAX_POOL_SIZE: u64 = 500 * TIB;
/// Smallest volume quota (100 GiB)
pub const MIN_VOLUME_SIZE: u64 = 100 * GIB;
/// Largest regular volume quota (100 TiB)
pub const MAX_VOLUME_SIZE: u64 = 100 * TIB;

/// The service appends a random suffix during domain join, so the prefix is capped.
pub const MAX_SMB_SERVER_PREFIX_LEN: usize = 10;

/// Capacity pool service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServiceLevel {
    #[default]
    Standard,
    Premium,
    Ultra,
    #[serde(rename = "StandardZRS")]
    StandardZrs,
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLevel::Standard => write!(f, "Standard"),
            ServiceLevel::Premium => write!(f, "Premium"),
            ServiceLevel::Ultra => write!(f, "Ultra"),
            ServiceLevel::StandardZrs => write!(f, "StandardZRS"),
        }
    }
}

impl FromStr for ServiceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ServiceLevel::Standard),
            "premium" => Ok(ServiceLevel::Premium),
            "ultra" => Ok(ServiceLevel::Ultra),
            "standardzrs" => Ok(ServiceLevel::StandardZrs),
            _ => Err(format!(
                "Invalid service level '{s}'. Valid values: Standard, Premium, Ultra, StandardZRS"
            )),
        }
    }
}

/// Protocols a volume can be exported with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolType {
    #[serde(rename = "CIFS")]
    Cifs,
    #[serde(rename = "NFSv3")]
    NfsV3,
    #[serde(rename = "NFSv4.1")]
    NfsV41,
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolType::Cifs => write!(f, "CIFS"),
            ProtocolType::NfsV3 => write!(f, "NFSv3"),
            ProtocolType::NfsV41 => write!(f, "NFSv4.1"),
        }
    }
}

/// The protocol pair of a dual-protocol volume
pub const DUAL_PROTOCOL_TYPES: [ProtocolType; 2] = [ProtocolType::Cifs, ProtocolType::NfsV3];

/// Permission model of a dual-protocol volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityStyle {
    #[default]
    Ntfs,
    Unix,
}

impl fmt::Display for SecurityStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityStyle::Ntfs => write!(f, "ntfs"),
            SecurityStyle::Unix => write!(f, "unix"),
        }
    }
}

impl FromStr for SecurityStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ntfs" => Ok(SecurityStyle::Ntfs),
            "unix" => Ok(SecurityStyle::Unix),
            _ => Err(format!("Invalid security style '{s}'. Valid values: ntfs, unix")),
        }
    }
}

/// ARM provisioning state reported in `properties.provisioningState`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Succeeded,
    Failed,
    Canceled,
    Creating,
    Updating,
    Deleting,
    Accepted,
    Moving,
    #[serde(other)]
    Unknown,
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::Canceled
        )
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Failed => "Failed",
            ProvisioningState::Canceled => "Canceled",
            ProvisioningState::Creating => "Creating",
            ProvisioningState::Updating => "Updating",
            ProvisioningState::Deleting => "Deleting",
            ProvisioningState::Accepted => "Accepted",
            ProvisioningState::Moving => "Moving",
            ProvisioningState::Unknown => "Unknown",
        };
        write!(f, "{text}")
    }
}

/// Active Directory connection embedded in an account
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDirectory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory_id: Option<String>,
    #[serde(default)]
    pub username: String,
    /// Write-only; the service never returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Zeroizing<String>>,
    #[serde(default)]
    pub domain: String,
    /// Comma-separated DNS server addresses
    #[serde(default)]
    pub dns: String,
    #[serde(default)]
    pub smb_server_name: String,
    #[serde(
        rename = "serverRootCACertificate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_root_ca_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizational_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl fmt::Debug for ActiveDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveDirectory")
            .field("active_directory_id", &self.active_directory_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("domain", &self.domain)
            .field("dns", &self.dns)
            .field("smb_server_name", &self.smb_server_name)
            .field(
                "server_root_ca_certificate",
                &self.server_root_ca_certificate.as_ref().map(|c| c.len()),
            )
            .field("organizational_unit", &self.organizational_unit)
            .field("site", &self.site)
            .field("status", &self.status)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_directories: Vec<ActiveDirectory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// `Microsoft.NetApp/netAppAccounts`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetAppAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: AccountProperties,
}

impl NetAppAccount {
    /// Account body joined to a single Active Directory domain
    pub fn with_active_directory(
        location: &str,
        tags: BTreeMap<String, String>,
        active_directory: ActiveDirectory,
    ) -> Self {
        Self {
            location: location.to_string(),
            tags,
            properties: AccountProperties {
                active_directories: vec![active_directory],
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CapacityPoolProperties {
    #[serde(default)]
    pub service_level: ServiceLevel,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// `Microsoft.NetApp/netAppAccounts/capacityPools`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapacityPool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: CapacityPoolProperties,
}

impl CapacityPool {
    pub fn new(
        location: &str,
        service_level: ServiceLevel,
        size: u64,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            location: location.to_string(),
            tags,
            properties: CapacityPoolProperties {
                service_level,
                size,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// One rule of a volume export policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPolicyRule {
    pub rule_index: u32,
    pub unix_read_only: bool,
    pub unix_read_write: bool,
    pub cifs: bool,
    pub nfsv3: bool,
    pub nfsv41: bool,
    pub allowed_clients: String,
}

impl ExportPolicyRule {
    /// Read/write NFSv3 access for the given client specification
    pub fn nfsv3_read_write(rule_index: u32, allowed_clients: &str) -> Self {
        Self {
            rule_index,
            unix_read_only: false,
            unix_read_write: true,
            cifs: false,
            nfsv3: true,
            nfsv41: false,
            allowed_clients: allowed_clients.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExportPolicy {
    #[serde(default)]
    pub rules: Vec<ExportPolicyRule>,
}

/// Network endpoint through which a volume is reachable
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MountTarget {
    #[serde(default)]
    pub mount_target_id: Option<String>,
    #[serde(default)]
    pub file_system_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub smb_server_fqdn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProperties {
    #[serde(default)]
    pub creation_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_level: Option<ServiceLevel>,
    #[serde(default)]
    pub usage_threshold: u64,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub protocol_types: Vec<ProtocolType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_style: Option<SecurityStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_policy: Option<ExportPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_targets: Vec<MountTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

/// `Microsoft.NetApp/netAppAccounts/capacityPools/volumes`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: VolumeProperties,
}

/// Inputs for a dual-protocol volume body
#[derive(Debug, Clone)]
pub struct DualProtocolVolumeSpec {
    pub location: String,
    pub volume_name: String,
    pub service_level: ServiceLevel,
    pub usage_threshold: u64,
    pub subnet_id: String,
    pub security_style: SecurityStyle,
    pub export_allowed_clients: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Volume {
    /// Volume exported over CIFS and NFSv3, with the creation token set to the volume name
    pub fn dual_protocol(spec: DualProtocolVolumeSpec) -> Self {
        let export_policy = spec.export_allowed_clients.as_deref().map(|clients| ExportPolicy {
            rules: vec![ExportPolicyRule::nfsv3_read_write(1, clients)],
        });

        Self {
            location: spec.location,
            tags: spec.tags,
            properties: VolumeProperties {
                creation_token: spec.volume_name,
                service_level: Some(spec.service_level),
                usage_threshold: spec.usage_threshold,
                subnet_id: spec.subnet_id,
                protocol_types: DUAL_PROTOCOL_TYPES.to_vec(),
                security_style: Some(spec.security_style),
                export_policy,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn primary_mount_target(&self) -> Option<&MountTarget> {
        self.properties.mount_targets.first()
    }

    pub fn protocol_list(&self) -> String {
        self.properties
            .protocol_types
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Display function for Option<String> in tables
fn display_option(opt: &Option<String>) -> String {
    match opt {
        Some(value) => value.clone(),
        None => "-".to_string(),
    }
}

/// Row of the provisioning summary table
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ResourceSummary {
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "State", display_with = "display_option")]
    pub state: Option<String>,
    #[tabled(rename = "Resource ID")]
    pub id: String,
}

impl From<&NetAppAccount> for ResourceSummary {
    fn from(account: &NetAppAccount) -> Self {
        Self {
            kind: "Account".to_string(),
            name: account.name.clone().unwrap_or_default(),
            state: account.properties.provisioning_state.as_ref().map(|s| s.to_string()),
            id: account.id.clone().unwrap_or_default(),
        }
    }
}

impl From<&CapacityPool> for ResourceSummary {
    fn from(pool: &CapacityPool) -> Self {
        Self {
            kind: "Capacity Pool".to_string(),
            name: pool.name.clone().unwrap_or_default(),
            state: pool.properties.provisioning_state.as_ref().map(|s| s.to_string()),
            id: pool.id.clone().unwrap_or_default(),
        }
    }
}

impl From<&Volume> for ResourceSummary {
    fn from(volume: &Volume) -> Self {
        Self {
            kind: "Volume".to_string(),
            name: volume.name.clone().unwrap_or_default(),
            state: volume.properties.provisioning_state.as_ref().map(|s| s.to_string()),
            id: volume.id.clone().unwrap_or_default(),
        }
    }
}
