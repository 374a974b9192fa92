//! Utility functions module
//!
//! This module contains console formatting, prompts, HTTP client helpers,
//! retry logic, input validation and certificate loading.

pub mod cert;
pub mod format;
pub mod interactive;
pub mod network;
pub mod retry;
pub mod validation;

pub use format::*;
pub use network::*;
pub use retry::*;
