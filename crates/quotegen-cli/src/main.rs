//! Quotegen CLI
//!
//! Command-line interface for quotegen - random quotes by category.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotegen_core::{Config, QuoteApp};

mod commands;
mod output;
mod prompt;
mod shell;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotegen")]
#[command(about = "Quotegen - random quotes by category")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a random quote (default)
    Random {
        /// Category to pick from ("all" for every quote)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List quotes
    #[command(alias = "ls")]
    List {
        /// Category to list ("all" for every quote)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        /// Quote text
        text: String,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// List categories
    Categories,
    /// Show or select the active category filter
    Filter {
        /// Category to select ("all" clears the filter)
        category: Option<String>,
    },
    /// Show the last viewed quote
    Last,
    /// Export quotes to a JSON file
    Export {
        /// Output file or directory (default: current directory)
        path: Option<PathBuf>,
    },
    /// Import quotes from a JSON file
    Import {
        /// JSON file with an array of {text, category}
        path: PathBuf,
    },
    /// Delete stored quotes and restore the defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sync with the remote server
    Sync,
    /// Show status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Start an interactive session with background sync
    Shell,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sync_url, sync_enabled, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config_file.as_ref();

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let command = cli.command.unwrap_or(Commands::Random { category: None });

    if let Commands::Shell = command {
        return shell::run(QuoteApp::open_interactive(config), &output).await;
    }

    let app = QuoteApp::open(config);

    match command {
        Commands::Random { category } => commands::quote::random(&app, category, &output).await,
        Commands::List { category } => commands::quote::list(&app, category, &output).await,
        Commands::Add { text, category } => {
            commands::quote::add(&app, text, category, &output).await
        }
        Commands::Categories => commands::quote::categories(&app, &output).await,
        Commands::Filter { category } => commands::quote::filter(&app, category, &output).await,
        Commands::Last => commands::quote::last(&app, &output).await,
        Commands::Export { path } => commands::transfer::export(&app, path, &output).await,
        Commands::Import { path } => commands::transfer::import(&app, path, &output).await,
        Commands::Reset { yes } => commands::quote::reset(&app, yes, &output).await,
        Commands::Sync => commands::sync::sync(&app, &output).await,
        Commands::Status => commands::status::show(&app, &output).await,
        Commands::Config { .. } | Commands::Shell => Ok(()), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if QUOTEGEN_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("QUOTEGEN_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "quotegen_core={},quotegen={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["quotegen", "add", "Keep going", "-c", "Life"]).unwrap();
        match cli.command {
            Some(Commands::Add { text, category }) => {
                assert_eq!(text, "Keep going");
                assert_eq!(category, "Life");
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["quotegen", "list", "--json", "-c", "all"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Some(Commands::List { category: Some(ref c) }) if c == "all"
        ));
    }

    #[test]
    fn test_no_subcommand_defaults_to_random() {
        let cli = Cli::try_parse_from(["quotegen"]).unwrap();
        assert!(cli.command.is_none());
    }
}
