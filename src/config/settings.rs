//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{AnfError, Result};
use crate::netapp::models::{
    SecurityStyle, ServiceLevel, GIB, MAX_POOL_SIZE, MAX_VOLUME_SIZE, MIN_POOL_SIZE,
    MIN_VOLUME_SIZE, TIB,
};
use crate::utils::validation::SetupHelper;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_API_VERSION: &str = "2023-05-01";

/// Active Directory domain-join settings for the account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveDirectoryConfig {
    /// Identity allowed to join computers to the domain
    pub username: String,
    /// Comma-separated DNS server addresses
    pub dns: String,
    /// Fully qualified AD domain name
    pub domain: String,
    pub smb_server_name_prefix: String,
    pub organizational_unit: Option<String>,
    pub site: Option<String>,
    /// PEM root CA certificate of the domain controller
    pub root_ca_cert_path: PathBuf,
}

impl Default for ActiveDirectoryConfig {
    fn default() -> Self {
        Self {
            username: "aduser".to_string(),
            dns: String::new(),
            domain: String::new(),
            smb_server_name_prefix: "anfsmb".to_string(),
            organizational_unit: None,
            site: None,
            root_ca_cert_path: PathBuf::from("./ad-server.cer"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub no_color: bool,

    pub subscription_id: String,
    /// "default" or "clientsecret"
    pub auth_method: String,
    pub tenant_id: String,
    pub client_id: String,
    pub management_endpoint: String,
    pub api_version: String,

    pub resource_group: String,
    pub location: String,
    pub vnet_name: String,
    pub subnet_name: String,

    pub account_name: String,
    pub pool_name: String,
    pub pool_service_level: ServiceLevel,
    /// Bytes
    pub pool_size: u64,
    pub volume_name: String,
    /// Bytes
    pub volume_size: u64,
    pub security_style: SecurityStyle,
    /// When set, the volume gets an NFSv3 read/write export rule for these clients
    pub export_allowed_clients: Option<String>,

    pub cleanup: bool,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,

    // Tables last so the TOML output stays valid
    pub tags: BTreeMap<String, String>,
    pub active_directory: ActiveDirectoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            no_color: false,
            subscription_id: String::new(),
            auth_method: "default".to_string(),
            tenant_id: String::new(),
            client_id: String::new(),
            management_endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            resource_group: String::new(),
            location: "eastus".to_string(),
            vnet_name: String::new(),
            subnet_name: String::new(),
            account_name: String::new(),
            pool_name: String::new(),
            pool_service_level: ServiceLevel::Standard,
            pool_size: MIN_POOL_SIZE,
            volume_name: String::new(),
            volume_size: MIN_VOLUME_SIZE,
            security_style: SecurityStyle::Ntfs,
            export_allowed_clients: None,
            cleanup: false,
            poll_interval_secs: 10,
            poll_max_attempts: 60,
            tags: BTreeMap::new(),
            active_directory: ActiveDirectoryConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate everything the provisioning flow depends on
    pub fn validate(&self) -> Result<()> {
        self.validate_target()?;

        require("location", &self.location)?;
        require("vnet_name", &self.vnet_name)?;
        require("subnet_name", &self.subnet_name)?;

        if !(MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(&self.pool_size) {
            return Err(AnfError::config(format!(
                "Capacity pool size must be between {} TiB and {} TiB (got {} bytes)",
                MIN_POOL_SIZE / TIB,
                MAX_POOL_SIZE / TIB,
                self.pool_size
            )));
        }

        if !(MIN_VOLUME_SIZE..=MAX_VOLUME_SIZE).contains(&self.volume_size) {
            return Err(AnfError::config(format!(
                "Volume size must be between {} GiB and {} TiB (got {} bytes)",
                MIN_VOLUME_SIZE / GIB,
                MAX_VOLUME_SIZE / TIB,
                self.volume_size
            )));
        }

        if self.volume_size > self.pool_size {
            return Err(AnfError::config(
                "Volume size cannot exceed the capacity pool size",
            ));
        }

        let ad = &self.active_directory;
        require("active_directory.username", &ad.username)?;
        SetupHelper::validate_domain(&ad.domain).map_err(AnfError::config)?;
        SetupHelper::validate_dns_list(&ad.dns).map_err(AnfError::config)?;
        SetupHelper::validate_smb_server_prefix(&ad.smb_server_name_prefix)
            .map_err(AnfError::config)?;
        if ad.root_ca_cert_path.as_os_str().is_empty() {
            return Err(AnfError::config(
                "active_directory.root_ca_cert_path is required",
            ));
        }

        if self.poll_max_attempts == 0 {
            return Err(AnfError::config("poll_max_attempts must be at least 1"));
        }

        Ok(())
    }

    /// Validate only what is needed to address existing resources (show, cleanup)
    pub fn validate_target(&self) -> Result<()> {
        SetupHelper::validate_subscription_id(&self.subscription_id).map_err(AnfError::config)?;
        SetupHelper::validate_resource_group_name(&self.resource_group)
            .map_err(AnfError::config)?;
        SetupHelper::validate_account_name(&self.account_name).map_err(AnfError::config)?;
        SetupHelper::validate_pool_name(&self.pool_name).map_err(AnfError::config)?;
        SetupHelper::validate_volume_name(&self.volume_name).map_err(AnfError::config)?;

        if self.auth_method.eq_ignore_ascii_case("clientsecret")
            && (self.tenant_id.is_empty() || self.client_id.is_empty())
        {
            return Err(AnfError::config(
                "tenant_id and client_id are required for client secret authentication",
            ));
        }

        url::Url::parse(&self.management_endpoint).map_err(|e| {
            AnfError::config(format!(
                "Invalid management endpoint '{}': {}",
                self.management_endpoint, e
            ))
        })?;

        Ok(())
    }

    /// Settings handed to the auth provider factory
    pub fn auth_settings(&self) -> HashMap<String, String> {
        let mut settings = HashMap::new();
        if !self.tenant_id.is_empty() {
            settings.insert("tenant_id".to_string(), self.tenant_id.clone());
        }
        if !self.client_id.is_empty() {
            settings.insert("client_id".to_string(), self.client_id.clone());
        }
        if let Ok(secret) = std::env::var("AZURE_CLIENT_SECRET") {
            settings.insert("client_secret".to_string(), secret);
        }
        settings
    }

    /// Update a single setting by its `config set` key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| AnfError::invalid_argument(format!("'{v}' is not a valid number")))
        };
        let parse_bool = |v: &str| match v.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(AnfError::invalid_argument(format!(
                "'{v}' is not a valid boolean"
            ))),
        };
        let optional = |v: &str| {
            if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        };

        match key {
            "debug" => self.debug = parse_bool(value)?,
            "no_color" => self.no_color = parse_bool(value)?,
            "subscription_id" => self.subscription_id = value.to_string(),
            "auth_method" => self.auth_method = value.to_string(),
            "tenant_id" => self.tenant_id = value.to_string(),
            "client_id" => self.client_id = value.to_string(),
            "management_endpoint" => self.management_endpoint = value.to_string(),
            "api_version" => self.api_version = value.to_string(),
            "resource_group" => self.resource_group = value.to_string(),
            "location" => self.location = value.to_string(),
            "vnet_name" => self.vnet_name = value.to_string(),
            "subnet_name" => self.subnet_name = value.to_string(),
            "account_name" => self.account_name = value.to_string(),
            "pool_name" => self.pool_name = value.to_string(),
            "pool_service_level" => {
                self.pool_service_level = value.parse().map_err(AnfError::invalid_argument)?
            }
            "pool_size" => self.pool_size = parse_u64(value)?,
            "volume_name" => self.volume_name = value.to_string(),
            "volume_size" => self.volume_size = parse_u64(value)?,
            "security_style" => {
                self.security_style = value.parse().map_err(AnfError::invalid_argument)?
            }
            "export_allowed_clients" => self.export_allowed_clients = optional(value),
            "active_directory.username" => self.active_directory.username = value.to_string(),
            "active_directory.dns" => self.active_directory.dns = value.to_string(),
            "active_directory.domain" => self.active_directory.domain = value.to_string(),
            "active_directory.smb_server_name_prefix" => {
                self.active_directory.smb_server_name_prefix = value.to_string()
            }
            "active_directory.organizational_unit" => {
                self.active_directory.organizational_unit = optional(value)
            }
            "active_directory.site" => self.active_directory.site = optional(value),
            "active_directory.root_ca_cert_path" => {
                self.active_directory.root_ca_cert_path = PathBuf::from(value)
            }
            "cleanup" => self.cleanup = parse_bool(value)?,
            "poll_interval_secs" => self.poll_interval_secs = parse_u64(value)?,
            "poll_max_attempts" => {
                self.poll_max_attempts = value.parse::<u32>().map_err(|_| {
                    AnfError::invalid_argument(format!("'{value}' is not a valid number"))
                })?
            }
            _ => {
                return Err(AnfError::invalid_argument(format!(
                    "Unknown configuration key '{key}'"
                )))
            }
        }

        Ok(())
    }

    /// Key/value rows for `config show`
    pub fn display_pairs(&self) -> Vec<(String, String)> {
        let or_dash = |v: &str| {
            if v.is_empty() {
                "-".to_string()
            } else {
                v.to_string()
            }
        };
        let ad = &self.active_directory;

        vec![
            ("Subscription ID".to_string(), or_dash(&self.subscription_id)),
            ("Auth Method".to_string(), self.auth_method.clone()),
            ("Management Endpoint".to_string(), self.management_endpoint.clone()),
            ("API Version".to_string(), self.api_version.clone()),
            ("Resource Group".to_string(), or_dash(&self.resource_group)),
            ("Location".to_string(), or_dash(&self.location)),
            ("VNet / Subnet".to_string(), format!("{} / {}", or_dash(&self.vnet_name), or_dash(&self.subnet_name))),
            ("Account".to_string(), or_dash(&self.account_name)),
            ("Capacity Pool".to_string(), or_dash(&self.pool_name)),
            ("Service Level".to_string(), self.pool_service_level.to_string()),
            ("Pool Size".to_string(), format!("{} TiB", self.pool_size / TIB)),
            ("Volume".to_string(), or_dash(&self.volume_name)),
            ("Volume Size".to_string(), format!("{} GiB", self.volume_size / GIB)),
            ("Security Style".to_string(), self.security_style.to_string()),
            ("AD Username".to_string(), or_dash(&ad.username)),
            ("AD Domain".to_string(), or_dash(&ad.domain)),
            ("AD DNS".to_string(), or_dash(&ad.dns)),
            ("SMB Server Prefix".to_string(), or_dash(&ad.smb_server_name_prefix)),
            ("Root CA Certificate".to_string(), ad.root_ca_cert_path.display().to_string()),
            ("Cleanup".to_string(), self.cleanup.to_string()),
        ]
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| AnfError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("anf-dual").join("config.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| AnfError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("anf-dual").join("config.toml"))
        }
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnfError::config(format!("{name} is required")));
    }
    Ok(())
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (applied by the CLI afterwards)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AnfError::config(format!(
                    "Configuration file '{}' does not exist",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => Config::get_config_path()?,
    };

    if config_path.exists() {
        debug!("Loading configuration from {}", config_path.display());
        config = load_from_file(&config_path).await?;
    }

    apply_env(&mut config, |name| std::env::var(name).ok())?;

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(toml_error) => serde_json::from_str::<Config>(&contents).map_err(|_| {
            AnfError::config(format!(
                "Failed to parse '{}': {}",
                path.display(),
                toml_error
            ))
        }),
    }
}

/// Override settings from environment variables looked up through `lookup`.
///
/// A value that does not parse is a configuration error.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    let strings: [(&str, &mut String); 14] = [
        ("AZURE_SUBSCRIPTION_ID", &mut config.subscription_id),
        ("AZURE_TENANT_ID", &mut config.tenant_id),
        ("AZURE_CLIENT_ID", &mut config.client_id),
        ("ANF_AUTH_METHOD", &mut config.auth_method),
        ("ANF_RESOURCE_GROUP", &mut config.resource_group),
        ("ANF_LOCATION", &mut config.location),
        ("ANF_VNET_NAME", &mut config.vnet_name),
        ("ANF_SUBNET_NAME", &mut config.subnet_name),
        ("ANF_ACCOUNT_NAME", &mut config.account_name),
        ("ANF_POOL_NAME", &mut config.pool_name),
        ("ANF_VOLUME_NAME", &mut config.volume_name),
        ("ANF_DOMAIN_JOIN_USERNAME", &mut config.active_directory.username),
        ("ANF_AD_DNS", &mut config.active_directory.dns),
        ("ANF_AD_FQDN", &mut config.active_directory.domain),
    ];
    for (name, field) in strings {
        if let Some(value) = lookup(name) {
            *field = value;
        }
    }

    if let Some(value) = lookup("ANF_SMB_SERVER_PREFIX") {
        config.active_directory.smb_server_name_prefix = value;
    }

    if let Some(value) = lookup("ANF_ROOT_CA_CERT") {
        config.active_directory.root_ca_cert_path = PathBuf::from(value);
    }

    if let Some(value) = lookup("ANF_SERVICE_LEVEL") {
        config.pool_service_level = value
            .parse()
            .map_err(|e| AnfError::config(format!("ANF_SERVICE_LEVEL: {e}")))?;
    }

    if let Some(value) = lookup("ANF_CLEANUP") {
        config.cleanup = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup("ANF_POLL_INTERVAL") {
        config.poll_interval_secs = value.parse::<u64>().map_err(|_| {
            AnfError::config(format!("ANF_POLL_INTERVAL: '{value}' is not a valid number"))
        })?;
    }

    Ok(())
}

pub async fn save_config(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| AnfError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default configuration file unless one already exists.
///
/// Returns whether a file was written.
pub async fn init_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    save_config(&Config::default(), path).await?;
    Ok(true)
}
