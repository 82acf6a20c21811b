//! Status command handler

use anyhow::Result;

use quotegen_core::QuoteApp;

use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(app: &QuoteApp, output: &Output) -> Result<()> {
    let status = app.status().await;

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Quiet => {
            println!("{}", status.quotes);
        }
        OutputFormat::Human => {
            println!("Quotegen Status");
            println!("===============");
            println!();
            println!("Collection:");
            println!("  Quotes:     {}", status.quotes);
            println!("  Categories: {}", status.categories.join(", "));
            println!("  Filter:     {}", status.active_filter);
            if status.seeded {
                println!("  Source:     built-in seed quotes");
            }
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if status.sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  Server: {}", status.sync_url);
            if let Some(ref phase) = status.sync_phase {
                println!("  Phase:  {}", phase);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", status.slot_dir.display());
        }
    }

    Ok(())
}
