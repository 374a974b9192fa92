//! Authentication module for Azure services
//!
//! This module provides authentication for the Azure Resource Manager
//! using DefaultAzureCredential or a service principal client secret.

pub mod provider;

pub use provider::*;
