//! Input validation for Azure and NetApp resource settings
//!
//! Validators return `Err(String)` with a user-facing message so they can be
//! used both for configuration checks and interactive prompts.

use regex::Regex;
use std::net::Ipv4Addr;

use crate::netapp::models::MAX_SMB_SERVER_PREFIX_LEN;

/// Utility functions for validating setup values
pub struct SetupHelper;

impl SetupHelper {
    /// Validate Azure subscription ID format
    pub fn validate_subscription_id(subscription_id: &str) -> std::result::Result<(), String> {
        if subscription_id.trim().is_empty() {
            return Err("Subscription ID cannot be empty".to_string());
        }

        // Basic GUID format validation
        let guid_pattern = Regex::new(
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        )
        .map_err(|_| "Invalid regex pattern".to_string())?;

        if !guid_pattern.is_match(subscription_id.trim()) {
            return Err("Subscription ID must be a valid GUID format".to_string());
        }

        Ok(())
    }

    /// Validate resource group name
    pub fn validate_resource_group_name(name: &str) -> std::result::Result<(), String> {
        let name = name.trim();

        if name.is_empty() {
            return Err("Resource group name cannot be empty".to_string());
        }

        if name.len() > 90 {
            return Err("Resource group name cannot exceed 90 characters".to_string());
        }

        if name.ends_with('.') {
            return Err("Resource group name cannot end with '.'".to_string());
        }

        if !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_' | '(' | ')'))
        {
            return Err("Resource group name can only contain alphanumeric characters, periods, hyphens, underscores, and parentheses".to_string());
        }

        Ok(())
    }

    /// Validate NetApp account name (1-128 chars, letters, digits, '-' and '_')
    pub fn validate_account_name(name: &str) -> std::result::Result<(), String> {
        validate_netapp_name("Account", name, 128, false)
    }

    /// Validate capacity pool name (1-64 chars, letters, digits, '-' and '_')
    pub fn validate_pool_name(name: &str) -> std::result::Result<(), String> {
        validate_netapp_name("Capacity pool", name, 64, false)
    }

    /// Validate volume name (1-64 chars, must start with a letter)
    pub fn validate_volume_name(name: &str) -> std::result::Result<(), String> {
        validate_netapp_name("Volume", name, 64, true)
    }

    /// Validate the SMB server name prefix used during domain join
    pub fn validate_smb_server_prefix(prefix: &str) -> std::result::Result<(), String> {
        if prefix.is_empty() {
            return Err("SMB server name prefix cannot be empty".to_string());
        }

        if prefix.len() > MAX_SMB_SERVER_PREFIX_LEN {
            return Err(format!(
                "SMB server name prefix cannot exceed {MAX_SMB_SERVER_PREFIX_LEN} characters"
            ));
        }

        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(
                "SMB server name prefix can only contain alphanumeric characters and hyphens"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Validate a comma-separated list of IPv4 DNS server addresses
    pub fn validate_dns_list(dns: &str) -> std::result::Result<(), String> {
        if dns.trim().is_empty() {
            return Err("At least one DNS server address is required".to_string());
        }

        for entry in dns.split(',') {
            let entry = entry.trim();
            if entry.parse::<Ipv4Addr>().is_err() {
                return Err(format!("'{entry}' is not a valid IPv4 DNS server address"));
            }
        }

        Ok(())
    }

    /// Validate an Active Directory FQDN such as `corp.contoso.com`
    pub fn validate_domain(domain: &str) -> std::result::Result<(), String> {
        if domain.trim().is_empty() {
            return Err("Active Directory domain cannot be empty".to_string());
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(format!("'{domain}' is not a fully qualified domain name"));
        }

        for label in labels {
            if label.is_empty()
                || label.len() > 63
                || label.starts_with('-')
                || label.ends_with('-')
                || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(format!("'{domain}' is not a valid domain name"));
            }
        }

        Ok(())
    }
}

fn validate_netapp_name(
    kind: &str,
    name: &str,
    max_len: usize,
    letter_first: bool,
) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err(format!("{kind} name cannot be empty"));
    }

    if name.len() > max_len {
        return Err(format!("{kind} name cannot exceed {max_len} characters"));
    }

    let first = name.chars().next().unwrap_or(' ');
    if letter_first && !first.is_ascii_alphabetic() {
        return Err(format!("{kind} name must start with a letter"));
    }
    if !first.is_ascii_alphanumeric() {
        return Err(format!("{kind} name must start with a letter or digit"));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "{kind} name can only contain alphanumeric characters, hyphens, and underscores"
        ));
    }

    Ok(())
}
