//! Interactive shell
//!
//! One long-lived session: the session slot is in memory, and when sync is
//! enabled a poller fetches from the remote collection in the background.
//! Sync statuses are printed as they arrive.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::info;

use quotegen_core::sync::{spawn_sync_poller, SyncEvent, SyncTrigger};
use quotegen_core::QuoteApp;

use crate::commands;
use crate::output::Output;
use crate::prompt;

const HELP: &str = "\
Commands:
  random [category]        show a random quote
  list [category]          list quotes
  add <category> <text>    add a quote; quote a category with spaces
                           (add \"Big Ideas\" ...) or use -c/--category
  categories               list categories
  filter [category]        show or select the active filter
  last                     show the last viewed quote
  export [path]            export quotes to JSON
  import <file.json>       import quotes from JSON
  reset [-y]               delete stored quotes and restore the defaults
  sync                     upload, then fetch from the server
  status                   show status
  help                     show this help
  quit                     leave the shell";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Random(Option<String>),
    List(Option<String>),
    Add { category: String, text: String },
    Categories,
    Filter(Option<String>),
    Last,
    Export(Option<String>),
    Import(String),
    Reset { yes: bool },
    Sync,
    Status,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let arg = || (!rest.is_empty()).then(|| rest.to_string());

        match name {
            "" => ShellCommand::Empty,
            "random" | "r" => ShellCommand::Random(arg()),
            "list" | "ls" => ShellCommand::List(arg()),
            "add" => parse_add(rest),
            "categories" => ShellCommand::Categories,
            "filter" => ShellCommand::Filter(arg()),
            "last" => ShellCommand::Last,
            "export" => ShellCommand::Export(arg()),
            "import" => match arg() {
                Some(path) => ShellCommand::Import(path),
                None => ShellCommand::Invalid("Usage: import <file.json>".to_string()),
            },
            "reset" => match rest {
                "" => ShellCommand::Reset { yes: false },
                "-y" | "--yes" => ShellCommand::Reset { yes: true },
                _ => ShellCommand::Invalid("Usage: reset [-y]".to_string()),
            },
            "sync" => ShellCommand::Sync,
            "status" => ShellCommand::Status,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => ShellCommand::Invalid(format!("Unknown command: {}", other)),
        }
    }
}

const ADD_USAGE: &str = "Usage: add <category> <text> | add \"<category>\" <text> | add -c <category> <text>";

/// `add` arguments: an optional `-c`/`--category` flag, then the category
/// (double or single quoted when it contains spaces), then the text
fn parse_add(rest: &str) -> ShellCommand {
    let rest = ["--category", "-c"]
        .iter()
        .find_map(|flag| {
            rest.strip_prefix(flag)
                .filter(|after| after.starts_with(char::is_whitespace))
        })
        .unwrap_or(rest)
        .trim_start();

    let Some((category, text)) = split_token(rest) else {
        return ShellCommand::Invalid(ADD_USAGE.to_string());
    };
    let text = text.trim();
    if category.trim().is_empty() || text.is_empty() {
        return ShellCommand::Invalid(ADD_USAGE.to_string());
    }

    ShellCommand::Add {
        category: category.to_string(),
        text: text.to_string(),
    }
}

/// Split the leading token off `input`, honouring one level of quotes
fn split_token(input: &str) -> Option<(&str, &str)> {
    match input.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = &input[1..];
            let end = body.find(quote)?;
            Some((&body[..end], &body[end + 1..]))
        }
        _ => Some(
            input
                .split_once(char::is_whitespace)
                .unwrap_or((input, "")),
        ),
    }
}

/// Run the shell until `quit` or end of input
pub async fn run(app: QuoteApp, output: &Output) -> Result<()> {
    let poller = app
        .sync_engine()
        .map(|engine| spawn_sync_poller(engine.clone(), app.config().sync_interval()));
    let mut events = app.sync_engine().map(|engine| engine.subscribe_events());

    info!("Shell started, sync {}", if poller.is_some() { "on" } else { "off" });
    output.message("quotegen shell. Type `help` for commands.");
    commands::quote::random(&app, None, output).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = ShellCommand::parse(&line);
                if command == ShellCommand::Quit {
                    break;
                }
                if command == ShellCommand::Sync {
                    match &poller {
                        Some(handle) => {
                            handle.sync_now().await;
                        }
                        None => output.message("Sync is not enabled."),
                    }
                    continue;
                }
                if command == (ShellCommand::Reset { yes: false }) {
                    print!("Delete all stored quotes and restore the defaults? [y/N] ");
                    std::io::stdout().flush()?;
                    let answer = lines.next_line().await?.unwrap_or_default();
                    if !prompt::is_yes(&answer) {
                        output.message("Cancelled.");
                        continue;
                    }
                    if let Err(e) = commands::quote::reset(&app, true, output).await {
                        eprintln!("Error: {:#}", e);
                    }
                    continue;
                }
                if let Err(e) = execute(&app, command, output).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            event = next_event(&mut events) => match event {
                Some(event) => print_event(&event, output),
                None => events = None,
            }
        }
    }

    if let Some(handle) = poller {
        handle.shutdown().await;
    }
    Ok(())
}

async fn execute(app: &QuoteApp, command: ShellCommand, output: &Output) -> Result<()> {
    match command {
        ShellCommand::Random(category) => commands::quote::random(app, category, output).await,
        ShellCommand::List(category) => commands::quote::list(app, category, output).await,
        ShellCommand::Add { category, text } => {
            commands::quote::add(app, text, category, output).await
        }
        ShellCommand::Categories => commands::quote::categories(app, output).await,
        ShellCommand::Filter(category) => commands::quote::filter(app, category, output).await,
        ShellCommand::Last => commands::quote::last(app, output).await,
        ShellCommand::Export(path) => {
            commands::transfer::export(app, path.map(Into::into), output).await
        }
        ShellCommand::Import(path) => commands::transfer::import(app, path.into(), output).await,
        ShellCommand::Reset { yes } => commands::quote::reset(app, yes, output).await,
        ShellCommand::Status => commands::status::show(app, output).await,
        ShellCommand::Help => {
            output.message(HELP);
            Ok(())
        }
        ShellCommand::Invalid(message) => {
            output.message(&message);
            Ok(())
        }
        ShellCommand::Empty | ShellCommand::Quit | ShellCommand::Sync => Ok(()),
    }
}

/// Next sync event; `None` once the channel is closed, pending forever
/// without a subscription
async fn next_event(events: &mut Option<broadcast::Receiver<SyncEvent>>) -> Option<SyncEvent> {
    let Some(rx) = events else {
        return std::future::pending().await;
    };

    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

fn print_event(event: &SyncEvent, output: &Output) {
    match event {
        SyncEvent::Status(status) => output.message(&format!("[sync] {}", status)),
        SyncEvent::Skipped(SyncTrigger::Manual) => {
            output.message("[sync] Sync already in progress, skipped.")
        }
        _ => {}
    }
}
