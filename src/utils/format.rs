//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data and progress messages with color support.

use crate::error::{AnfError, Result};
use crossterm::{style::{Color as CrosstermColor, Stylize}, terminal::size};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Table formatter with color support
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Create a formatted table from data
    pub fn format_table<T: Tabled + Serialize>(&self, data: &[T]) -> Result<String> {
        if data.is_empty() {
            return Ok("No data to display".to_string());
        }

        match self.format {
            OutputFormat::Table => Ok(self.format_as_table(data)),
            OutputFormat::Json => serde_json::to_string_pretty(data)
                .map_err(|e| AnfError::serialization(e.to_string())),
        }
    }

    /// Format data as a styled table
    fn format_as_table<T: Tabled>(&self, data: &[T]) -> String {
        let mut table = Table::new(data);

        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        // Auto-adjust width to terminal
        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        table.to_string()
    }
}

/// Display utilities for console progress output
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    /// Create new display utilities
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    /// Print a section header
    pub fn print_header(&self, title: &str) -> Result<()> {
        let styled_title = if self.no_color {
            format!("=== {} ===", title)
        } else {
            format!("=== {} ===", title.with(self.theme.header).bold())
        };

        println!("{}", styled_title);
        Ok(())
    }

    /// Print a timestamped progress line
    pub fn print_step(&self, message: &str) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if self.no_color {
            println!("{}: {}", timestamp, message);
        } else {
            println!("{}: {}", timestamp.with(self.theme.accent), message);
        }
        Ok(())
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) -> Result<()> {
        let styled_message = if self.no_color {
            format!("✓ {}", message)
        } else {
            format!("✓ {}", message.with(self.theme.success))
        };

        println!("{}", styled_message);
        Ok(())
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) -> Result<()> {
        let styled_message = if self.no_color {
            format!("⚠ {}", message)
        } else {
            format!("⚠ {}", message.with(self.theme.warning))
        };

        println!("{}", styled_message);
        Ok(())
    }

    /// Print an error message
    pub fn print_error(&self, message: &str) -> Result<()> {
        let styled_message = if self.no_color {
            format!("✗ {}", message)
        } else {
            format!("✗ {}", message.with(self.theme.error))
        };

        eprintln!("{}", styled_message);
        Ok(())
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) -> Result<()> {
        let styled_message = if self.no_color {
            format!("ℹ {}", message)
        } else {
            format!("ℹ {}", message.with(self.theme.info))
        };

        println!("{}", styled_message);
        Ok(())
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{:width$}", key, width = max_key_length);
                let formatted_key = if self.no_color {
                    padded
                } else {
                    padded.with(self.theme.accent).bold().to_string()
                };
                format!("{}: {}", formatted_key, value)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Print a banner with border
    pub fn print_banner(&self, title: &str, subtitle: Option<&str>) -> Result<()> {
        let width = if let Ok((w, _)) = size() {
            (w as usize).clamp(20, 100)
        } else {
            80
        };

        let border = "═".repeat(width);
        let title_line = format!("║ {:^width$} ║", title, width = width - 2);

        if self.no_color {
            println!("╔{}╗", border);
            println!("{}", title_line);
            if let Some(sub) = subtitle {
                println!("║ {:^width$} ║", sub, width = width - 2);
            }
            println!("╚{}╝", border);
        } else {
            println!("╔{}╗", border.clone().with(self.theme.accent));
            println!("{}", title_line.with(self.theme.header).bold());
            if let Some(sub) = subtitle {
                let subtitle_line = format!("║ {:^width$} ║", sub, width = width - 2);
                println!("{}", subtitle_line.with(self.theme.info));
            }
            println!("╚{}╝", border.with(self.theme.accent));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct TestData {
        name: String,
        state: String,
    }

    fn sample() -> Vec<TestData> {
        vec![
            TestData {
                name: "anfacct".to_string(),
                state: "Succeeded".to_string(),
            },
            TestData {
                name: "pool1".to_string(),
                state: "Creating".to_string(),
            },
        ]
    }

    #[test]
    fn test_table_formatting() {
        let formatter = TableFormatter::new(OutputFormat::Table, true);
        let output = formatter.format_table(&sample()).unwrap();
        assert!(output.contains("anfacct"));
        assert!(output.contains("Creating"));
    }

    #[test]
    fn test_json_formatting() {
        let formatter = TableFormatter::new(OutputFormat::Json, true);
        let output = formatter.format_table(&sample()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[1]["name"], "pool1");
    }

    #[test]
    fn test_empty_table() {
        let formatter = TableFormatter::new(OutputFormat::Table, true);
        let output = formatter.format_table::<TestData>(&[]).unwrap();
        assert_eq!(output, "No data to display");
    }

    #[test]
    fn test_key_value_formatting() {
        let display = DisplayUtils::new(true);
        let pairs = vec![("Protocol types", "CIFS, NFSv3"), ("NFS IP", "10.0.0.4")];

        let result = display.format_key_value_pairs(&pairs);
        assert!(result.contains("Protocol types: CIFS, NFSv3"));
        assert!(result.contains("NFS IP        : 10.0.0.4"));
    }
}
