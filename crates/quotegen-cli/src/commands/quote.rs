//! Quote command handlers

use anyhow::{Context, Result};

use quotegen_core::{QuoteApp, QuoteError};

use crate::output::Output;
use crate::prompt::confirm;

/// Show a random quote from the filter (or the saved one)
pub async fn random(app: &QuoteApp, category: Option<String>, output: &Output) -> Result<()> {
    match app.show_random(category.as_deref()).await {
        Ok(quote) => output.print_quote(&quote),
        // Not an error for the user, just nothing to show
        Err(QuoteError::EmptyPool { filter }) => {
            output.message(&format!("No quotes available in \"{}\".", filter));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// List quotes in the filter (or the saved one)
pub async fn list(app: &QuoteApp, category: Option<String>, output: &Output) -> Result<()> {
    let (_, quotes) = app.list(category.as_deref()).await;
    output.print_quotes(&quotes);
    Ok(())
}

/// Add a new quote
pub async fn add(app: &QuoteApp, text: String, category: String, output: &Output) -> Result<()> {
    let added = app
        .add(&text, &category)
        .await
        .context("Please enter both quote text and category")?;

    output.storage_warning(added.storage_error());
    output.success("Quote added");
    output.print_quote(&added.value);
    Ok(())
}

/// List category options
pub async fn categories(app: &QuoteApp, output: &Output) -> Result<()> {
    output.print_categories(&app.categories().await);
    Ok(())
}

/// Select and remember a filter, or show the current one
pub async fn filter(app: &QuoteApp, category: Option<String>, output: &Output) -> Result<()> {
    let Some(category) = category else {
        output.message(app.last_filter().await.as_value());
        return Ok(());
    };

    let selected = app.select_filter(&category).await;
    output.storage_warning(selected.storage_error());

    if selected.value.as_value() == category {
        output.success(&format!("Filter set to {}", selected.value));
    } else {
        output.message(&format!(
            "No category \"{}\", filter set to {}",
            category, selected.value
        ));
    }
    Ok(())
}

/// Show the last viewed quote
pub async fn last(app: &QuoteApp, output: &Output) -> Result<()> {
    match app.last_viewed().await {
        Some(quote) => output.print_quote(&quote),
        None => output.message("No last viewed quote in this session."),
    }
    Ok(())
}

/// Clear stored quotes and restore the built-in ones
pub async fn reset(app: &QuoteApp, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            anyhow::bail!("Refusing to reset without confirmation. Pass --yes to confirm.");
        }
        if !confirm("Delete all stored quotes and restore the defaults?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    let reset = app.clear_and_reseed().await;
    output.storage_warning(reset.storage_error());
    output.success(&format!("Collection reset to {} default quotes", reset.value));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use quotegen_core::storage::MemorySlots;
    use quotegen_core::{Config, QuotePersistence, QuoteStore};

    fn test_app() -> QuoteApp {
        let store = QuoteStore::open(QuotePersistence::new(
            "cli",
            MemorySlots::new(),
            MemorySlots::new(),
        ));
        QuoteApp::with_store(Config::default(), store)
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[tokio::test]
    async fn test_add_rejects_empty_text() {
        let app = test_app();
        let err = add(&app, "  ".to_string(), "Life".to_string(), &quiet())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("both quote text and category"));
        assert_eq!(app.list(Some("all")).await.1.len(), 4);
    }

    #[tokio::test]
    async fn test_random_with_empty_pool_is_not_an_error() {
        let app = test_app();
        random(&app, Some("Missing".to_string()), &quiet())
            .await
            .unwrap();
        assert!(app.last_viewed().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation_when_not_prompting() {
        let app = test_app();
        app.add("Extra", "More").await.unwrap();

        assert!(reset(&app, false, &quiet()).await.is_err());
        assert_eq!(app.list(Some("all")).await.1.len(), 5);

        reset(&app, true, &quiet()).await.unwrap();
        assert_eq!(app.list(Some("all")).await.1.len(), 4);
    }

    #[tokio::test]
    async fn test_filter_persists_selection() {
        let app = test_app();
        filter(&app, Some("Life".to_string()), &quiet())
            .await
            .unwrap();
        assert_eq!(app.last_filter().await.as_value(), "Life");
    }
}
