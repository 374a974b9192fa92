//! anf-dual - Azure NetApp Files dual-protocol provisioning
//!
//! Creates a NetApp account joined to Active Directory, a capacity pool and
//! a volume exported over both SMB (CIFS) and NFSv3, then optionally deletes
//! them again.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod netapp;
pub mod utils;

// Re-export commonly used types
pub use error::{AnfError, Result};
