//! Waiting for resources to appear or disappear
//!
//! A finished delete operation does not mean the resource is gone from ARM
//! reads yet, so cleanup polls a GET of the resource until it returns 404
//! before moving on to the parent.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::operations::NetAppOperations;
use super::resource_id::ResourceId;
use crate::error::{AnfError, Result};

/// Sleep, then check; repeat until the resource is gone or `retries` checks were made.
pub async fn wait_for_no_resource(
    ops: &dyn NetAppOperations,
    id: &ResourceId,
    interval: Duration,
    retries: u32,
) -> Result<()> {
    for attempt in 1..=retries {
        sleep(interval).await;

        if !ops.resource_exists(id).await? {
            debug!("{} is gone after {} check(s)", id, attempt);
            return Ok(());
        }
    }

    Err(AnfError::timeout(format!(
        "{} {} still exists after {} checks",
        id.kind(),
        id,
        retries
    )))
}

/// Sleep, then check; repeat until the resource can be read or `retries` checks were made.
pub async fn wait_for_resource(
    ops: &dyn NetAppOperations,
    id: &ResourceId,
    interval: Duration,
    retries: u32,
) -> Result<()> {
    for attempt in 1..=retries {
        sleep(interval).await;

        if ops.resource_exists(id).await? {
            debug!("{} found after {} check(s)", id, attempt);
            return Ok(());
        }
    }

    Err(AnfError::timeout(format!(
        "{} {} not found after {} checks",
        id.kind(),
        id,
        retries
    )))
}
