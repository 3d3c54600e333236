use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::Result;

/// The categories a shop starts with, in the order they are shown.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Ciro/Satış",
    "Mutfak/Gıda",
    "Elektrik",
    "Su/Doğalgaz",
    "Kira",
    "Maaş",
    "Mal Alımı",
    "Diğer",
];

/// The fixed, ordered list of category labels that transactions are classified with. The order is
/// the declaration order used when category totals are not sorted by value.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categories(Vec<String>);

impl Default for Categories {
    fn default() -> Self {
        Self(DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }
}

impl Categories {
    /// Creates a category list, which must be non-empty and free of duplicates.
    pub fn new<S, I>(names: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let categories = Self(names.into_iter().map(Into::into).collect());
        categories.validate()?;
        Ok(categories)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(!self.0.is_empty(), "The category list cannot be empty");
        let mut seen = BTreeSet::new();
        for name in &self.0 {
            ensure!(!name.trim().is_empty(), "Category names cannot be blank");
            ensure!(seen.insert(name), "The category '{name}' is listed twice");
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
