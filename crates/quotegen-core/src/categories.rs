//! Category index
//!
//! A derived, sorted view of the distinct categories in a collection.
//! The "all" option is synthetic: it is offered first in selectors but is
//! never stored as a category.

use std::collections::BTreeSet;

use crate::models::{CategoryFilter, Quote, ALL_CATEGORIES};

/// Sorted distinct categories of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    /// Compute the index for a collection
    pub fn build(quotes: &[Quote]) -> Self {
        Self {
            categories: categories_of(quotes),
        }
    }

    /// The real categories, sorted
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Check if `name` is a real category in the collection
    pub fn contains(&self, name: &str) -> bool {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(name))
            .is_ok()
    }

    /// Selector options: `"all"` first, then each category
    pub fn options(&self) -> Vec<&str> {
        std::iter::once(ALL_CATEGORIES)
            .chain(self.categories.iter().map(String::as_str))
            .collect()
    }

    /// Resolve a previously saved filter value
    ///
    /// A value no longer present in the index falls back to `All`.
    pub fn restore(&self, saved: Option<&str>) -> CategoryFilter {
        match CategoryFilter::from(saved) {
            CategoryFilter::Category(name) if !self.contains(&name) => CategoryFilter::All,
            filter => filter,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Sorted set of distinct category strings in `quotes`
pub fn categories_of(quotes: &[Quote]) -> Vec<String> {
    quotes
        .iter()
        .map(|q| q.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_quotes;

    #[test]
    fn test_categories_sorted_and_distinct() {
        let quotes = vec![
            Quote::new("1", "Life"),
            Quote::new("2", "Art"),
            Quote::new("3", "Life"),
            Quote::new("4", "Zen"),
        ];
        assert_eq!(categories_of(&quotes), vec!["Art", "Life", "Zen"]);
    }

    #[test]
    fn test_empty_collection() {
        let index = CategoryIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.options(), vec!["all"]);
    }

    #[test]
    fn test_options_start_with_all() {
        let index = CategoryIndex::build(&seed_quotes());
        let options = index.options();
        assert_eq!(options[0], "all");
        assert_eq!(
            &options[1..],
            &["Inspiration", "Life", "Motivation", "Success"]
        );
        assert!(!index.contains("all"));
    }

    #[test]
    fn test_restore_missing_category_falls_back_to_all() {
        let index = CategoryIndex::build(&seed_quotes());
        assert_eq!(index.restore(Some("Obscure")), CategoryFilter::All);
    }

    #[test]
    fn test_restore_present_category() {
        let index = CategoryIndex::build(&seed_quotes());
        assert_eq!(
            index.restore(Some("Life")),
            CategoryFilter::Category("Life".to_string())
        );
        assert_eq!(index.restore(Some("all")), CategoryFilter::All);
        assert_eq!(index.restore(None), CategoryFilter::All);
    }
}
