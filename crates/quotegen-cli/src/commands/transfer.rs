//! Import and export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use quotegen_core::QuoteApp;

use crate::output::{Output, OutputFormat};

/// Export the collection to a file or directory (default: current dir)
pub async fn export(app: &QuoteApp, target: Option<PathBuf>, output: &Output) -> Result<()> {
    let target = target.unwrap_or_else(|| PathBuf::from("."));
    let path = app
        .export(&target)
        .await
        .with_context(|| format!("Failed to export quotes to {}", target.display()))?;

    match output.format {
        OutputFormat::Quiet => println!("{}", path.display()),
        _ => output.success(&format!("Exported quotes to {}", path.display())),
    }
    Ok(())
}

/// Import quotes from a JSON file
pub async fn import(app: &QuoteApp, path: PathBuf, output: &Output) -> Result<()> {
    let imported = app.import(&path).await?;
    output.storage_warning(imported.storage_error());

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "status": "success",
                    "read": imported.value.read,
                    "added": imported.value.added,
                    "message": imported.value.message()
                })
            );
        }
        _ => output.success(&imported.value.message()),
    }
    Ok(())
}
