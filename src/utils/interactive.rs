//! Interactive input utilities for user prompts
//!
//! This module provides hidden password input, confirmations and
//! spinners for long-running operations.

use crate::error::{AnfError, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use zeroize::Zeroizing;

/// Interactive prompt utilities
pub struct InteractivePrompt {
    theme: ColorfulTheme,
}

impl InteractivePrompt {
    /// Create a new interactive prompt instance
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for yes/no confirmation with a default value
    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let result = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| AnfError::config(format!("Failed to get user input: {e}")))?;
        Ok(result)
    }

    /// Prompt for a secret without echoing it
    pub fn password(&self, message: &str) -> Result<Zeroizing<String>> {
        let value = Zeroizing::new(rpassword::prompt_password(message)?);
        if value.is_empty() {
            return Err(AnfError::invalid_argument("Password cannot be empty"));
        }
        Ok(value)
    }
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Spinner shown while a long-running operation is polled
pub struct ProgressIndicator {
    bar: ProgressBar,
}

impl ProgressIndicator {
    /// Create a new progress indicator
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg} [{elapsed}]")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Spinner that draws nothing, for non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Finish and clear the progress indicator
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
