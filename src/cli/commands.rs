//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use std::future::Future;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;
use zeroize::Zeroizing;

use crate::auth::provider::{AuthProviderFactory, AzureAuthProvider};
use crate::config::{init_default_config, load_config, load_from_file, save_config, Config};
use crate::error::{AnfError, Result};
use crate::netapp::lro::PollOptions;
use crate::netapp::{CleanupTargets, DomainJoinCredentials, NetAppManager, ProvisioningPlan};
use crate::utils::cert::{encode_certificate, read_root_ca_cert};
use crate::utils::format::{DisplayUtils, OutputFormat};
use crate::utils::interactive::InteractivePrompt;

/// Environment variable read before falling back to the password prompt
pub const PASSWORD_ENV: &str = "ANF_DOMAIN_JOIN_PASSWORD";

const PASSWORD_PROMPT: &str =
    "Please type Active Directory's user password that will domain join ANF's SMB server and press [ENTER]:";

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

#[derive(Debug)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub target: &'static str,
    pub full_version: &'static str,
}

/// Get build information for display
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        target: env!("BUILD_TARGET"),
        full_version: env!("VERSION_WITH_GIT"),
    }
}

#[derive(Parser, Debug)]
#[command(name = "anf-dual")]
#[command(about = "Provision an Azure NetApp Files dual-protocol (SMB/NFS) volume")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Azure subscription id
    #[arg(long, global = true, value_name = "ID")]
    pub subscription: Option<String>,

    /// Resource group holding the NetApp resources and the VNet
    #[arg(short = 'g', long, global = true, value_name = "NAME")]
    pub resource_group: Option<String>,

    /// Azure region, e.g. eastus
    #[arg(short, long, global = true)]
    pub location: Option<String>,

    /// NetApp account name
    #[arg(long, global = true, value_name = "NAME")]
    pub account: Option<String>,

    /// Capacity pool name
    #[arg(long, global = true, value_name = "NAME")]
    pub pool: Option<String>,

    /// Volume name
    #[arg(long, global = true, value_name = "NAME")]
    pub volume: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the account, capacity pool and dual-protocol volume
    Run {
        /// Delete the created resources again before exiting
        #[arg(long)]
        cleanup: bool,
        /// Do not ask for confirmation before cleanup
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete the configured volume, capacity pool and account
    Cleanup {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the current state of the configured resources
    Show {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print version and build information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init,
    /// Set a configuration value
    Set {
        /// Setting name, e.g. pool_name or active_directory.domain
        key: String,
        /// Setting value
        value: String,
    },
}

impl Cli {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.debug {
            config.debug = true;
        }
        if self.no_color {
            config.no_color = true;
        }

        let overrides: [(&Option<String>, &mut String); 6] = [
            (&self.subscription, &mut config.subscription_id),
            (&self.resource_group, &mut config.resource_group),
            (&self.location, &mut config.location),
            (&self.account, &mut config.account_name),
            (&self.pool, &mut config.pool_name),
            (&self.volume, &mut config.volume_name),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }

    /// Whether debug logging is on, from `--debug`, `DEBUG` or the config file.
    ///
    /// A configuration that fails to load leaves only `--debug`; the command
    /// itself reports the load error.
    pub async fn debug_enabled(&self) -> bool {
        if self.debug {
            return true;
        }
        match self.load_config().await {
            Ok(config) => config.debug,
            Err(_) => false,
        }
    }

    async fn load_config(&self) -> Result<Config> {
        let mut config = load_config(self.config.as_deref()).await?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub async fn execute(self) -> Result<()> {
        match &self.command {
            Commands::Version => execute_version_command(),
            Commands::Config { command } => self.execute_config_command(command).await,
            Commands::Run { cleanup, yes } => {
                let config = self.load_config().await?;
                execute_run(*cleanup, *yes, config).await
            }
            Commands::Cleanup { yes } => {
                let config = self.load_config().await?;
                execute_cleanup(*yes, config).await
            }
            Commands::Show { format } => {
                let config = self.load_config().await?;
                execute_show(*format, config).await
            }
        }
    }

    async fn execute_config_command(&self, command: &ConfigCommands) -> Result<()> {
        let path = config_path(self.config.as_deref())?;

        match command {
            ConfigCommands::Show => {
                let config = self.load_config().await?;
                execute_config_show(&config, &path)
            }
            ConfigCommands::Path => {
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommands::Init => execute_config_init(&path, self.no_color).await,
            ConfigCommands::Set { key, value } => execute_config_set(key, value, &path).await,
        }
    }
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::get_config_path(),
    }
}

fn create_auth_provider(config: &Config) -> Result<Arc<dyn AzureAuthProvider>> {
    AuthProviderFactory::create_provider(&config.auth_method, &config.auth_settings())
}

fn wait_options(config: &Config) -> PollOptions {
    PollOptions {
        interval: config.poll_interval(),
        max_attempts: config.poll_max_attempts,
    }
}

/// Domain-join password from the environment, or prompted for without echo
fn domain_join_password() -> Result<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(value) if !value.is_empty() => {
            debug!("Using domain join password from {}", PASSWORD_ENV);
            Ok(Zeroizing::new(value))
        }
        _ => InteractivePrompt::new().password(PASSWORD_PROMPT),
    }
}

/// Whether cleanup was asked for and how it may be confirmed
#[derive(Debug, Clone, Copy)]
pub struct CleanupRequest {
    /// `--cleanup` or `cleanup = true` in the configuration
    pub requested: bool,
    /// `--yes` was passed
    pub yes: bool,
    /// stdin is a terminal, so a prompt can be answered
    pub interactive: bool,
}

/// Settle whether cleanup runs.
///
/// A non-interactive session without `--yes` is refused rather than left
/// waiting on a prompt.
pub fn resolve_cleanup<F>(request: CleanupRequest, confirm: F) -> Result<bool>
where
    F: FnOnce() -> Result<bool>,
{
    if !request.requested {
        return Ok(false);
    }
    if request.yes {
        return Ok(true);
    }
    if !request.interactive {
        return Err(AnfError::invalid_argument(
            "Cleanup needs confirmation; pass --yes when running non-interactively",
        ));
    }
    confirm()
}

fn prompt_cleanup(display: &DisplayUtils) -> Result<bool> {
    display.print_warning("This will delete the volume, the capacity pool and the account")?;
    InteractivePrompt::new().confirm("Delete the resources now?", false)
}

async fn domain_join_credentials(
    config: &Config,
    display: &DisplayUtils,
) -> Result<DomainJoinCredentials> {
    let password = domain_join_password()?;

    let certificate = read_root_ca_cert(&config.active_directory.root_ca_cert_path).await?;
    display.print_step("Encoding certificate contents as base64 string...")?;
    Ok(DomainJoinCredentials {
        password,
        root_ca_certificate: encode_certificate(&certificate),
    })
}

/// Provision the resources, report them and optionally clean them up.
///
/// Cleanup confirmation is settled before `credentials` is awaited, so a
/// refused cleanup never leaves resources behind.
pub async fn run_sample<C>(
    manager: &NetAppManager,
    config: &Config,
    cleanup: CleanupRequest,
    credentials: C,
) -> Result<()>
where
    C: Future<Output = Result<DomainJoinCredentials>>,
{
    let display = DisplayUtils::new(config.no_color);
    let requested = cleanup.requested;
    let cleanup = resolve_cleanup(cleanup, || prompt_cleanup(&display))?;

    let credentials = credentials.await?;
    let resources = manager.provision(config, &credentials).await?;
    manager.report(&resources.volume)?;
    manager.print_summary(&resources.summaries(), OutputFormat::Table)?;

    if cleanup {
        let plan = ProvisioningPlan::from_config(config);
        manager
            .cleanup(&resources.cleanup_targets(&plan), &wait_options(config))
            .await?;
    } else if requested {
        display.print_info("Cleanup skipped")?;
    }

    Ok(())
}

async fn execute_run(cleanup: bool, yes: bool, config: Config) -> Result<()> {
    config.validate()?;
    let display = DisplayUtils::new(config.no_color);

    display.print_banner(
        "Azure NetApp Files Dual-Protocol Sample",
        Some("Creates an SMB/NFSv3 volume joined to Active Directory"),
    )?;

    let auth_provider = create_auth_provider(&config)?;
    display.print_step("Instantiating a new Azure NetApp Files management client...")?;
    let manager = NetAppManager::new(auth_provider, &config)?;
    display.print_step(&format!("Api Version: {}", config.api_version))?;

    let request = CleanupRequest {
        requested: cleanup || config.cleanup,
        yes,
        interactive: std::io::stdin().is_terminal(),
    };
    run_sample(
        &manager,
        &config,
        request,
        domain_join_credentials(&config, &display),
    )
    .await?;

    display.print_step("ANF Dual-Protocol sample has completed successfully")?;
    Ok(())
}

async fn execute_cleanup(yes: bool, config: Config) -> Result<()> {
    config.validate_target()?;
    let display = DisplayUtils::new(config.no_color);

    let request = CleanupRequest {
        requested: true,
        yes,
        interactive: std::io::stdin().is_terminal(),
    };
    if !resolve_cleanup(request, || prompt_cleanup(&display))? {
        display.print_info("Cleanup cancelled")?;
        return Ok(());
    }

    let manager = NetAppManager::new(create_auth_provider(&config)?, &config)?;
    let plan = ProvisioningPlan::from_config(&config);
    manager
        .cleanup(&CleanupTargets::from_plan(&plan), &wait_options(&config))
        .await?;

    display.print_success("Cleanup completed")?;
    Ok(())
}

async fn execute_show(format: OutputFormat, config: Config) -> Result<()> {
    config.validate_target()?;

    let manager = NetAppManager::new(create_auth_provider(&config)?, &config)?;
    let plan = ProvisioningPlan::from_config(&config);
    let rows = manager.show(&plan).await?;
    manager.print_summary(&rows, format)
}

fn execute_version_command() -> Result<()> {
    let build_info = get_build_info();

    println!("anf-dual");
    println!("========");
    println!("Version:      {}", build_info.version);
    println!("Full Version: {}", build_info.full_version);
    println!("Git Hash:     {}", build_info.git_hash);
    println!("Target:       {}", build_info.target);

    Ok(())
}

fn execute_config_show(config: &Config, path: &Path) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    display.print_header("Configuration")?;

    let pairs = config.display_pairs();
    let borrowed: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    println!("{}", display.format_key_value_pairs(&borrowed));
    println!();

    let state = if path.exists() { "" } else { " (not created)" };
    display.print_info(&format!("Configuration file: {}{}", path.display(), state))?;
    Ok(())
}

async fn execute_config_init(path: &Path, no_color: bool) -> Result<()> {
    let display = DisplayUtils::new(no_color);

    if init_default_config(path).await? {
        display.print_success(&format!(
            "Created default configuration at {}",
            path.display()
        ))?;
        display.print_info("Fill in the subscription, resource names and Active Directory settings before running")?;
    } else {
        display.print_info(&format!(
            "Configuration already exists at {}",
            path.display()
        ))?;
    }

    Ok(())
}

/// Update one key in the configuration file; environment overrides are not persisted
async fn execute_config_set(key: &str, value: &str, path: &Path) -> Result<()> {
    let mut config = if path.exists() {
        load_from_file(path).await?
    } else {
        Config::default()
    };

    config.set_value(key, value)?;
    save_config(&config, path).await?;
    println!("✅ Configuration updated: {key} = {value}");

    Ok(())
}
