//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use crossterm::style::Stylize;
use tido_core::TodoItem;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the todo list
    pub fn print_items(&self, items: &[TodoItem]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("Nothing to do.");
                    return;
                }
                for item in items {
                    println!("{}", format_row(item));
                }
                println!("\n{} item(s)", items.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(items).unwrap());
            }
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id);
                }
            }
        }
    }

    /// Print a single item (after add/toggle)
    pub fn print_item(&self, item: &TodoItem) {
        match self.format {
            OutputFormat::Human => println!("{}", format_row(item)),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(item).unwrap());
            }
            OutputFormat::Quiet => println!("{}", item.id),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Render one list row: short id, checkbox, text
///
/// Done items are struck through and italicized, matching the TUI.
fn format_row(item: &TodoItem) -> String {
    let short_id = short_id(&item.id.to_string());
    if item.done {
        format!(
            "{} [x] {}",
            short_id,
            item.text.clone().crossed_out().italic()
        )
    } else {
        format!("{} [ ] {}", short_id, item.text)
    }
}

/// First 8 characters of an id, or the whole id if shorter
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tido_core::ItemId;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abcdefghijk"), "abcdefgh");
        assert_eq!(short_id("ab"), "ab");
    }

    #[test]
    fn test_format_row_pending() {
        let item = TodoItem::with_id(ItemId::from("12345678-rest"), "buy milk", false);
        let row = format_row(&item);
        assert!(row.starts_with("12345678 [ ]"));
        assert!(row.contains("buy milk"));
    }

    #[test]
    fn test_format_row_done_is_marked() {
        let item = TodoItem::with_id(ItemId::from("12345678-rest"), "buy milk", true);
        assert!(format_row(&item).contains("[x]"));
    }
}
