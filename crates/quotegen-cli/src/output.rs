//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use quotegen_core::sync::{SyncOutcome, SyncReport};
use quotegen_core::{Quote, StorageError};
use serde::Serialize;

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

    /// Print a single quote
    pub fn print_quote(&self, quote: &Quote) {
        match self.format {
            OutputFormat::Human => {
                println!("\u{201c}{}\u{201d}", quote.text);
                println!("  \u{2014} {}", quote.category);
            }
            OutputFormat::Json => print_json(quote),
            OutputFormat::Quiet => println!("{}", quote.text),
        }
    }

    /// Print a list of quotes
    pub fn print_quotes(&self, quotes: &[Quote]) {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("No quotes found.");
                    return;
                }
                for quote in quotes {
                    println!(
                        "{} | {}",
                        pad(&truncate(&quote.category, 14), 14),
                        truncate(&quote.text, 70)
                    );
                }
                println!("\n{} quote(s)", quotes.len());
            }
            OutputFormat::Json => print_json(quotes),
            OutputFormat::Quiet => {
                for quote in quotes {
                    println!("{}", quote.text);
                }
            }
        }
    }

    /// Print selector options
    pub fn print_categories(&self, options: &[String]) {
        match self.format {
            OutputFormat::Human => {
                for option in options {
                    println!("{}", option);
                }
                println!("\n{} categories", options.len().saturating_sub(1));
            }
            OutputFormat::Json => print_json(options),
            OutputFormat::Quiet => {
                for option in options {
                    println!("{}", option);
                }
            }
        }
    }

    /// Print the statuses of a sync run
    pub fn print_sync(&self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Skipped => self.message("Sync already in progress, skipped."),
            SyncOutcome::Completed(report) => self.print_sync_report(report),
        }
    }

    fn print_sync_report(&self, report: &SyncReport) {
        match self.format {
            OutputFormat::Human => {
                for status in &report.statuses {
                    if status.is_failure() {
                        println!("\u{26a0} {}", status);
                    } else {
                        println!("\u{2713} {}", status);
                    }
                }
            }
            OutputFormat::Json => {
                let statuses: Vec<String> = report.statuses.iter().map(|s| s.to_string()).collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "status": if report.succeeded() { "success" } else { "error" },
                        "merged": report.merged(),
                        "messages": statuses
                    })
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
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

    /// Report a failed flush; the command itself still succeeded
    pub fn storage_warning(&self, error: Option<&StorageError>) {
        let Some(error) = error else {
            return;
        };
        if self.is_quiet() {
            return;
        }
        eprintln!("\u{26a0} Changes kept in memory only: {}", error);
        if let Some(hint) = error.recovery_suggestion() {
            eprintln!("  {}", hint);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Right-pad to a fixed character width
fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}
