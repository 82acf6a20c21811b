//! Data models for quotegen
//!
//! Defines the core data structures: `Quote` and `CategoryFilter`.
//! A quote has no identifier; identity is structural (see `merge`).

use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, QuoteResult};

/// Sentinel filter value selecting every category
pub const ALL_CATEGORIES: &str = "all";

/// A quote with the category it is filed under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quote {
    /// The quote text
    pub text: String,
    /// Category label
    pub category: String,
}

impl Quote {
    /// Create a quote without validation (for seed data and remote records)
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Create a quote from user input
    ///
    /// Both fields are trimmed; either one being empty afterwards is a
    /// `QuoteError::Validation`.
    pub fn parse(text: &str, category: &str) -> QuoteResult<Self> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(QuoteError::Validation("quote text must not be empty"));
        }
        if category.is_empty() {
            return Err(QuoteError::Validation("quote category must not be empty"));
        }

        Ok(Self::new(text, category))
    }
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\u{201c}{}\u{201d} ({})", self.text, self.category)
    }
}

/// The built-in collection used on first start and after a reset
pub fn seed_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The best way to get started is to quit talking and begin doing.",
            "Motivation",
        ),
        Quote::new(
            "Life is what happens when you\u{2019}re busy making other plans.",
            "Life",
        ),
        Quote::new(
            "Do what you can, with what you have, where you are.",
            "Inspiration",
        ),
        Quote::new(
            "Success usually comes to those who are too busy to be looking for it.",
            "Success",
        ),
    ]
}

/// Which quotes a query selects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every quote (the synthetic "all" option)
    #[default]
    All,
    /// Only quotes whose category equals this value exactly
    Category(String),
}

impl CategoryFilter {
    /// Build a filter from a selector value, mapping the `"all"` sentinel
    pub fn from_value(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(value.to_string())
        }
    }

    /// Selector value for this filter (`"all"` for `All`)
    pub fn as_value(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Category(name) => name,
        }
    }

    /// Check whether a quote passes this filter
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(name) => quote.category == *name,
        }
    }
}

impl From<Option<&str>> for CategoryFilter {
    fn from(value: Option<&str>) -> Self {
        value.map(CategoryFilter::from_value).unwrap_or_default()
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_value())
    }
}
