#![allow(dead_code)]

use anf_dual::auth::provider::AzureAuthProvider;
use anf_dual::config::Config;
use async_trait::async_trait;
use azure_core::auth::AccessToken;
use serde_json::{json, Value};
use time::OffsetDateTime;

pub const SUBSCRIPTION: &str = "12345678-1234-1234-1234-123456789012";
pub const ACCOUNT_PATH: &str = "/subscriptions/12345678-1234-1234-1234-123456789012/resourceGroups/anf-rg/providers/Microsoft.NetApp/netAppAccounts/anfacct";
pub const POOL_PATH: &str = "/subscriptions/12345678-1234-1234-1234-123456789012/resourceGroups/anf-rg/providers/Microsoft.NetApp/netAppAccounts/anfacct/capacityPools/pool1";
pub const VOLUME_PATH: &str = "/subscriptions/12345678-1234-1234-1234-123456789012/resourceGroups/anf-rg/providers/Microsoft.NetApp/netAppAccounts/anfacct/capacityPools/pool1/volumes/vol1";

/// Hands out a fixed bearer token
pub struct StaticTokenProvider;

#[async_trait]
impl AzureAuthProvider for StaticTokenProvider {
    async fn get_token(&self, _scopes: &[&str]) -> anf_dual::Result<AccessToken> {
        Ok(AccessToken::new(
            "test-token".to_string(),
            OffsetDateTime::now_utc() + time::Duration::hours(1),
        ))
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.subscription_id = SUBSCRIPTION.to_string();
    config.resource_group = "anf-rg".to_string();
    config.location = "eastus".to_string();
    config.vnet_name = "anf-vnet".to_string();
    config.subnet_name = "anf-sn".to_string();
    config.account_name = "anfacct".to_string();
    config.pool_name = "pool1".to_string();
    config.volume_name = "vol1".to_string();
    config.active_directory.dns = "10.25.4.68".to_string();
    config.active_directory.domain = "testdomain.local".to_string();
    config.active_directory.smb_server_name_prefix = "testsmb".to_string();
    config.no_color = true;
    config
}

pub fn account_json(state: &str) -> Value {
    json!({
        "id": ACCOUNT_PATH,
        "name": "anfacct",
        "type": "Microsoft.NetApp/netAppAccounts",
        "location": "eastus",
        "properties": {
            "activeDirectories": [{
                "activeDirectoryId": "ad-1",
                "username": "aduser",
                "domain": "testdomain.local",
                "dns": "10.25.4.68",
                "smbServerName": "testsmb",
                "status": "Created"
            }],
            "provisioningState": state
        }
    })
}

pub fn pool_json(state: &str) -> Value {
    json!({
        "id": POOL_PATH,
        "name": "anfacct/pool1",
        "type": "Microsoft.NetApp/netAppAccounts/capacityPools",
        "location": "eastus",
        "properties": {
            "serviceLevel": "Standard",
            "size": 4398046511104u64,
            "poolId": "b5f9c4ae-0000-0000-0000-000000000000",
            "provisioningState": state
        }
    })
}

pub fn volume_json(state: &str) -> Value {
    json!({
        "id": VOLUME_PATH,
        "name": "anfacct/pool1/vol1",
        "type": "Microsoft.NetApp/netAppAccounts/capacityPools/volumes",
        "location": "eastus",
        "properties": {
            "creationToken": "vol1",
            "serviceLevel": "Standard",
            "usageThreshold": 107374182400u64,
            "subnetId": "/subscriptions/12345678-1234-1234-1234-123456789012/resourceGroups/anf-rg/providers/Microsoft.Network/virtualNetworks/anf-vnet/subnets/anf-sn",
            "protocolTypes": ["CIFS", "NFSv3"],
            "securityStyle": "ntfs",
            "mountTargets": [{
                "mountTargetId": "mt-1",
                "fileSystemId": "fs-1",
                "ipAddress": "10.0.2.4",
                "smbServerFqdn": "testsmb-a1b2.testdomain.local"
            }],
            "provisioningState": state
        }
    })
}
