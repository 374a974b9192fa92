//! Dual-protocol provisioning facade
//!
//! This module runs the account, capacity pool and volume steps in order,
//! reports the resulting endpoints and tears everything down again in
//! reverse order.

use std::future::Future;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::lro::PollOptions;
use super::models::{
    ActiveDirectory, CapacityPool, DualProtocolVolumeSpec, NetAppAccount, ResourceSummary, Volume,
};
use super::operations::{ArmClientOptions, AzureNetAppOperations, NetAppOperations};
use super::resource_id::{get_resource_value, subnet_id, ResourceId, ResourceKind};
use super::wait::wait_for_no_resource;
use crate::auth::provider::AzureAuthProvider;
use crate::config::Config;
use crate::error::{AnfError, Result};
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};
use crate::utils::interactive::ProgressIndicator;
use crate::utils::retry::RetryOptions;

/// Resource ids derived from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub account_id: ResourceId,
    pub pool_id: ResourceId,
    pub volume_id: ResourceId,
    pub subnet_id: String,
}

impl ProvisioningPlan {
    pub fn from_config(config: &Config) -> Self {
        let sub = &config.subscription_id;
        let rg = &config.resource_group;

        Self {
            account_id: ResourceId::account(sub, rg, &config.account_name),
            pool_id: ResourceId::pool(sub, rg, &config.account_name, &config.pool_name),
            volume_id: ResourceId::volume(
                sub,
                rg,
                &config.account_name,
                &config.pool_name,
                &config.volume_name,
            ),
            subnet_id: subnet_id(sub, rg, &config.vnet_name, &config.subnet_name),
        }
    }
}

/// Domain-join secrets collected before the account is created
pub struct DomainJoinCredentials {
    pub password: Zeroizing<String>,
    /// Base64 of the root CA certificate text
    pub root_ca_certificate: String,
}

#[derive(Debug, Clone)]
pub struct ProvisionedResources {
    pub account: NetAppAccount,
    pub pool: CapacityPool,
    pub volume: Volume,
}

impl ProvisionedResources {
    /// Cleanup targets taken from the returned ids, falling back to the plan
    pub fn cleanup_targets(&self, plan: &ProvisioningPlan) -> CleanupTargets {
        let parsed = |id: &Option<String>, fallback: &ResourceId| {
            id.as_deref()
                .and_then(|id| ResourceId::parse(id).ok())
                .unwrap_or_else(|| fallback.clone())
        };

        CleanupTargets {
            volumes: vec![parsed(&self.volume.id, &plan.volume_id)],
            pools: vec![parsed(&self.pool.id, &plan.pool_id)],
            account: Some(parsed(&self.account.id, &plan.account_id)),
        }
    }

    pub fn summaries(&self) -> Vec<ResourceSummary> {
        vec![
            ResourceSummary::from(&self.account),
            ResourceSummary::from(&self.pool),
            ResourceSummary::from(&self.volume),
        ]
    }
}

/// Resources to delete, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupTargets {
    pub volumes: Vec<ResourceId>,
    pub pools: Vec<ResourceId>,
    pub account: Option<ResourceId>,
}

impl CleanupTargets {
    pub fn from_plan(plan: &ProvisioningPlan) -> Self {
        Self {
            volumes: vec![plan.volume_id.clone()],
            pools: vec![plan.pool_id.clone()],
            account: Some(plan.account_id.clone()),
        }
    }
}

/// High-level NetApp manager
pub struct NetAppManager {
    ops: Arc<dyn NetAppOperations>,
    display_utils: DisplayUtils,
    no_color: bool,
    show_progress: bool,
}

impl NetAppManager {
    /// Create a manager talking to Azure Resource Manager
    pub fn new(auth_provider: Arc<dyn AzureAuthProvider>, config: &Config) -> Result<Self> {
        let options = ArmClientOptions {
            endpoint: config.management_endpoint.clone(),
            api_version: config.api_version.clone(),
            poll: PollOptions {
                interval: config.poll_interval(),
                max_attempts: config.poll_max_attempts,
            },
            retry: RetryOptions::default(),
        };
        let ops = Arc::new(AzureNetAppOperations::new(auth_provider, options)?);

        Ok(Self {
            ops,
            display_utils: DisplayUtils::new(config.no_color),
            no_color: config.no_color,
            show_progress: std::io::stdout().is_terminal(),
        })
    }

    /// Create a manager over any operations implementation, without spinners
    pub fn with_operations(ops: Arc<dyn NetAppOperations>, no_color: bool) -> Self {
        Self {
            ops,
            display_utils: DisplayUtils::new(no_color),
            no_color,
            show_progress: false,
        }
    }

    async fn with_progress<T, F>(&self, message: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let progress = if self.show_progress {
            ProgressIndicator::new(message)
        } else {
            ProgressIndicator::hidden()
        };
        let result = operation.await;
        progress.finish_clear();
        result
    }

    /// Print the console line for a failed step and pass the error on
    fn report_failure<T>(&self, action: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.display_utils.print_error(&format!(
                    "An error occurred while {}: {}",
                    action,
                    e.user_message()
                ))?;
                Err(e)
            }
        }
    }

    /// Create the account joined to the configured Active Directory domain
    pub async fn create_account(
        &self,
        config: &Config,
        credentials: &DomainJoinCredentials,
    ) -> Result<NetAppAccount> {
        self.display_utils.print_step("Creating Account...")?;

        let ad = &config.active_directory;
        let active_directory = ActiveDirectory {
            username: ad.username.clone(),
            password: Some(credentials.password.clone()),
            domain: ad.domain.clone(),
            dns: ad.dns.clone(),
            smb_server_name: ad.smb_server_name_prefix.clone(),
            server_root_ca_certificate: Some(credentials.root_ca_certificate.clone()),
            organizational_unit: ad.organizational_unit.clone(),
            site: ad.site.clone(),
            ..Default::default()
        };
        debug!("Active Directory settings: {:?}", active_directory);

        let body = NetAppAccount::with_active_directory(
            &config.location,
            config.tags.clone(),
            active_directory,
        );
        let id = ResourceId::account(
            &config.subscription_id,
            &config.resource_group,
            &config.account_name,
        );

        let result = self
            .with_progress(
                "Waiting for account creation...",
                self.ops.create_or_update_account(&id, &body),
            )
            .await;
        let account = self.report_failure("creating Account", result)?;

        self.display_utils.print_step(&format!(
            "\tAccount successfully created. Resource id: {}",
            account.id.as_deref().unwrap_or_default()
        ))?;
        Ok(account)
    }

    /// Create the capacity pool inside `account`
    pub async fn create_capacity_pool(
        &self,
        config: &Config,
        account: &NetAppAccount,
    ) -> Result<CapacityPool> {
        self.display_utils.print_step("Creating Capacity Pool...")?;

        let account_name = account
            .id
            .as_deref()
            .and_then(|id| get_resource_value(id, "netAppAccounts"))
            .unwrap_or_else(|| config.account_name.clone());
        let id = ResourceId::pool(
            &config.subscription_id,
            &config.resource_group,
            &account_name,
            &config.pool_name,
        );
        let body = CapacityPool::new(
            &config.location,
            config.pool_service_level,
            config.pool_size,
            config.tags.clone(),
        );

        let result = self
            .with_progress(
                "Waiting for capacity pool creation...",
                self.ops.create_or_update_pool(&id, &body),
            )
            .await;
        let pool = self.report_failure("creating Capacity Pool", result)?;

        self.display_utils.print_step(&format!(
            "\tCapacity Pool successfully created. Resource id: {}",
            pool.id.as_deref().unwrap_or_default()
        ))?;
        Ok(pool)
    }

    /// Create the CIFS + NFSv3 volume inside `pool`
    pub async fn create_volume(
        &self,
        config: &Config,
        pool: &CapacityPool,
        subnet_id: &str,
    ) -> Result<Volume> {
        self.display_utils
            .print_step("Creating Volume with dual-protocol...")?;

        let pool_id = pool.id.as_deref().and_then(|id| ResourceId::parse(id).ok());
        let account_name = pool_id
            .as_ref()
            .and_then(|id| id.account.clone())
            .unwrap_or_else(|| config.account_name.clone());
        let pool_name = pool_id
            .as_ref()
            .and_then(|id| id.pool.clone())
            .unwrap_or_else(|| config.pool_name.clone());

        let id = ResourceId::volume(
            &config.subscription_id,
            &config.resource_group,
            &account_name,
            &pool_name,
            &config.volume_name,
        );
        let body = Volume::dual_protocol(DualProtocolVolumeSpec {
            location: config.location.clone(),
            volume_name: config.volume_name.clone(),
            service_level: pool.properties.service_level,
            usage_threshold: config.volume_size,
            subnet_id: subnet_id.to_string(),
            security_style: config.security_style,
            export_allowed_clients: config.export_allowed_clients.clone(),
            tags: config.tags.clone(),
        });

        let result = self
            .with_progress(
                "Waiting for volume creation...",
                self.ops.create_or_update_volume(&id, &body),
            )
            .await;
        let volume = self.report_failure("creating Volume", result)?;

        self.display_utils.print_step(&format!(
            "\tVolume successfully created. Resource id: {}",
            volume.id.as_deref().unwrap_or_default()
        ))?;
        Ok(volume)
    }

    /// Create account, capacity pool and volume in that order
    pub async fn provision(
        &self,
        config: &Config,
        credentials: &DomainJoinCredentials,
    ) -> Result<ProvisionedResources> {
        let plan = ProvisioningPlan::from_config(config);
        info!("Provisioning {}", plan.volume_id);

        self.display_utils.print_step("Creating ANF Resources...")?;
        let account = self.create_account(config, credentials).await?;
        let pool = self.create_capacity_pool(config, &account).await?;
        let volume = self.create_volume(config, &pool, &plan.subnet_id).await?;

        Ok(ProvisionedResources {
            account,
            pool,
            volume,
        })
    }

    /// Print the protocols and endpoints of a dual-protocol volume
    pub fn report(&self, volume: &Volume) -> Result<()> {
        self.display_utils.print_step(&format!(
            "Current Volume protocol types: {}",
            volume.protocol_list()
        ))?;

        match volume.primary_mount_target() {
            Some(target) => {
                self.display_utils.print_step(&format!(
                    "SMB Server FQDN: {}",
                    target.smb_server_fqdn.as_deref().unwrap_or("-")
                ))?;
                self.display_utils.print_step(&format!(
                    "NFS IP Address: {}",
                    target.ip_address.as_deref().unwrap_or("-")
                ))?;
            }
            None => {
                self.display_utils.print_warning(&format!(
                    "Volume '{}' reports no mount targets; SMB FQDN and NFS IP are not available yet",
                    volume.name.as_deref().unwrap_or_default()
                ))?;
            }
        }

        Ok(())
    }

    /// Print the resource summary table
    pub fn print_summary(&self, rows: &[ResourceSummary], format: OutputFormat) -> Result<()> {
        let formatter = TableFormatter::new(format, self.no_color);
        println!("{}", formatter.format_table(rows)?);
        Ok(())
    }

    /// Current state of the planned resources; missing ones are listed as not found
    pub async fn show(&self, plan: &ProvisioningPlan) -> Result<Vec<ResourceSummary>> {
        let missing = |id: &ResourceId| ResourceSummary {
            kind: id.kind().to_string(),
            name: id.leaf_name().unwrap_or_default().to_string(),
            state: Some("NotFound".to_string()),
            id: id.to_string(),
        };

        let account = match self.ops.get_account(&plan.account_id).await {
            Ok(account) => ResourceSummary::from(&account),
            Err(AnfError::ResourceNotFound { .. }) => missing(&plan.account_id),
            Err(e) => return Err(e),
        };
        let pool = match self.ops.get_pool(&plan.pool_id).await {
            Ok(pool) => ResourceSummary::from(&pool),
            Err(AnfError::ResourceNotFound { .. }) => missing(&plan.pool_id),
            Err(e) => return Err(e),
        };
        let volume = match self.ops.get_volume(&plan.volume_id).await {
            Ok(volume) => {
                self.report(&volume)?;
                ResourceSummary::from(&volume)
            }
            Err(AnfError::ResourceNotFound { .. }) => missing(&plan.volume_id),
            Err(e) => return Err(e),
        };

        Ok(vec![account, pool, volume])
    }

    /// Delete volumes, then pools, then the account.
    ///
    /// Volumes and pools are polled until a GET returns 404 before their
    /// parent is deleted. The account deletion only waits for its operation.
    pub async fn cleanup(&self, targets: &CleanupTargets, wait: &PollOptions) -> Result<()> {
        self.display_utils.print_step("Cleaning up resources")?;

        self.display_utils.print_step("Deleting Volumes...")?;
        for id in &targets.volumes {
            let result = self.delete_and_wait(id, wait).await;
            self.report_failure("deleting volumes", result)?;
            self.display_utils
                .print_step(&format!("\t\tSuccessfully deleted Volume: {}", id))?;
        }

        self.display_utils.print_step("Deleting Capacity Pools...")?;
        for id in &targets.pools {
            let result = self.delete_and_wait(id, wait).await;
            self.report_failure("deleting capacity pools", result)?;
            self.display_utils
                .print_step(&format!("\t\tSuccessfully deleted Capacity Pool: {}", id))?;
        }

        if let Some(id) = &targets.account {
            self.display_utils.print_step("Deleting Account...")?;
            self.display_utils.print_step(&format!(
                "\tDeleting {}",
                id.leaf_name().unwrap_or_default()
            ))?;

            let result = self
                .with_progress("Deleting account...", self.ops.delete_account(id))
                .await;
            self.report_failure("deleting accounts", result)?;
            self.display_utils
                .print_step(&format!("\t\tSuccessfully deleted Account: {}", id))?;
        }

        Ok(())
    }

    async fn delete_and_wait(&self, id: &ResourceId, wait: &PollOptions) -> Result<()> {
        self.display_utils.print_step(&format!(
            "\tDeleting {}",
            id.leaf_name().unwrap_or_default()
        ))?;

        let operation = async {
            match id.kind() {
                ResourceKind::Volume => self.ops.delete_volume(id).await?,
                ResourceKind::CapacityPool => self.ops.delete_pool(id).await?,
                kind => {
                    return Err(AnfError::invalid_argument(format!(
                        "Cannot delete {} '{}' in this step",
                        kind, id
                    )))
                }
            }
            wait_for_no_resource(self.ops.as_ref(), id, wait.interval, wait.max_attempts).await
        };

        self.with_progress(&format!("Deleting {}...", id.kind()), operation)
            .await
    }
}
