//! Azure NetApp Files management module
//!
//! This module provides account, capacity pool and volume operations
//! against Azure Resource Manager, including long-running operation
//! tracking and the dual-protocol provisioning flow.

pub mod lro;
pub mod manager;
pub mod models;
pub mod operations;
pub mod resource_id;
pub mod wait;

pub use manager::*;
pub use models::*;
pub use operations::*;
