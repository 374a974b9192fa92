//! ARM resource id helpers
//!
//! Parsing and building `/subscriptions/.../providers/Microsoft.NetApp/...`
//! resource ids.

use std::fmt;

use crate::error::{AnfError, Result};

pub const NETAPP_PROVIDER: &str = "Microsoft.NetApp";

/// Returns the segment following `key` in a resource id.
///
/// Keys match case-insensitively, so `resourcegroups` finds the value after
/// `resourceGroups`.
pub fn get_resource_value(resource_id: &str, key: &str) -> Option<String> {
    let segments: Vec<&str> = resource_id
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    segments
        .windows(2)
        .find(|pair| pair[0].eq_ignore_ascii_case(key))
        .map(|pair| pair[1].to_string())
}

/// Kind of NetApp resource a resource id points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Account,
    CapacityPool,
    Volume,
    Other,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Account => write!(f, "Account"),
            ResourceKind::CapacityPool => write!(f, "Capacity Pool"),
            ResourceKind::Volume => write!(f, "Volume"),
            ResourceKind::Other => write!(f, "Resource"),
        }
    }
}

/// Parsed NetApp resource id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub account: Option<String>,
    pub pool: Option<String>,
    pub volume: Option<String>,
}

impl ResourceId {
    pub fn parse(resource_id: &str) -> Result<Self> {
        let subscription_id = get_resource_value(resource_id, "subscriptions").ok_or_else(|| {
            AnfError::invalid_argument(format!("No subscription in resource id '{resource_id}'"))
        })?;
        let resource_group = get_resource_value(resource_id, "resourceGroups").ok_or_else(|| {
            AnfError::invalid_argument(format!(
                "No resource group in resource id '{resource_id}'"
            ))
        })?;

        Ok(Self {
            subscription_id,
            resource_group,
            account: get_resource_value(resource_id, "netAppAccounts"),
            pool: get_resource_value(resource_id, "capacityPools"),
            volume: get_resource_value(resource_id, "volumes"),
        })
    }

    pub fn account(subscription_id: &str, resource_group: &str, account: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            account: Some(account.to_string()),
            pool: None,
            volume: None,
        }
    }

    pub fn pool(subscription_id: &str, resource_group: &str, account: &str, pool: &str) -> Self {
        Self {
            pool: Some(pool.to_string()),
            ..Self::account(subscription_id, resource_group, account)
        }
    }

    pub fn volume(
        subscription_id: &str,
        resource_group: &str,
        account: &str,
        pool: &str,
        volume: &str,
    ) -> Self {
        Self {
            volume: Some(volume.to_string()),
            ..Self::pool(subscription_id, resource_group, account, pool)
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match (&self.account, &self.pool, &self.volume) {
            (Some(_), Some(_), Some(_)) => ResourceKind::Volume,
            (Some(_), Some(_), None) => ResourceKind::CapacityPool,
            (Some(_), None, None) => ResourceKind::Account,
            _ => ResourceKind::Other,
        }
    }

    /// Last name segment, e.g. the volume name for a volume id
    pub fn leaf_name(&self) -> Option<&str> {
        self.volume
            .as_deref()
            .or(self.pool.as_deref())
            .or(self.account.as_deref())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(account) = &self.account {
            write!(f, "/providers/{NETAPP_PROVIDER}/netAppAccounts/{account}")?;
            if let Some(pool) = &self.pool {
                write!(f, "/capacityPools/{pool}")?;
                if let Some(volume) = &self.volume {
                    write!(f, "/volumes/{volume}")?;
                }
            }
        }
        Ok(())
    }
}

/// Resource id of the subnet delegated to `Microsoft.NetApp/volumes`
pub fn subnet_id(subscription_id: &str, resource_group: &str, vnet: &str, subnet: &str) -> String {
    format!(
        "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.Network/virtualNetworks/{vnet}/subnets/{subnet}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLUME_ID: &str = "/subscriptions/0000-1111/resourceGroups/anf-rg/providers/Microsoft.NetApp/netAppAccounts/anfacct/capacityPools/pool1/volumes/vol1";

    #[test]
    fn test_get_resource_value() {
        assert_eq!(
            get_resource_value(VOLUME_ID, "capacityPools").as_deref(),
            Some("pool1")
        );
        assert_eq!(
            get_resource_value(VOLUME_ID, "RESOURCEGROUPS").as_deref(),
            Some("anf-rg")
        );
        assert_eq!(get_resource_value(VOLUME_ID, "snapshots"), None);
        // key as the last segment has no value
        assert_eq!(get_resource_value(VOLUME_ID, "vol1"), None);
    }

    #[test]
    fn test_parse_volume_id() {
        let id = ResourceId::parse(VOLUME_ID).unwrap();
        assert_eq!(id.subscription_id, "0000-1111");
        assert_eq!(id.resource_group, "anf-rg");
        assert_eq!(id.account.as_deref(), Some("anfacct"));
        assert_eq!(id.pool.as_deref(), Some("pool1"));
        assert_eq!(id.volume.as_deref(), Some("vol1"));
        assert_eq!(id.kind(), ResourceKind::Volume);
        assert_eq!(id.leaf_name(), Some("vol1"));
        assert_eq!(id.to_string(), VOLUME_ID);
    }

    #[test]
    fn test_kind_detection() {
        let pool = ResourceId::pool("s", "rg", "a", "p");
        assert_eq!(pool.kind(), ResourceKind::CapacityPool);
        assert_eq!(
            pool.to_string(),
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.NetApp/netAppAccounts/a/capacityPools/p"
        );

        let account = ResourceId::account("s", "rg", "a");
        assert_eq!(account.kind(), ResourceKind::Account);

        let group = ResourceId::parse("/subscriptions/s/resourceGroups/rg").unwrap();
        assert_eq!(group.kind(), ResourceKind::Other);
        assert_eq!(group.leaf_name(), None);
    }

    #[test]
    fn test_parse_rejects_incomplete_ids() {
        assert!(ResourceId::parse("/resourceGroups/rg").is_err());
        assert!(ResourceId::parse("/subscriptions/s").is_err());
    }

    #[test]
    fn test_subnet_id() {
        assert_eq!(
            subnet_id("s", "rg", "vnet1", "anf-sn"),
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/anf-sn"
        );
    }
}
