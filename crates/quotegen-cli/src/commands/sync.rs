//! Sync command handler

use anyhow::{bail, Result};

use quotegen_core::sync::SyncOutcome;
use quotegen_core::QuoteApp;

use crate::output::Output;

/// Upload the local collection, then fetch and merge the remote one
pub async fn sync(app: &QuoteApp, output: &Output) -> Result<()> {
    let config = app.config();

    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             quotegen config set sync_enabled true\n  \
             quotegen config set sync_url https://your-server/quotes"
        );
    }

    if let Some(engine) = app.sync_engine() {
        output.message(&format!("Syncing with {}...", engine.endpoint()));
    }

    let outcome = app.sync_now().await?;
    output.print_sync(&outcome);

    if let SyncOutcome::Completed(report) = &outcome {
        if !report.succeeded() {
            bail!("Sync finished with errors");
        }
    }
    Ok(())
}
