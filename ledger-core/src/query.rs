//! Structured dark web search queries
//!
//! The search index has no offset pagination, so later pages are reached by
//! negating every site already seen. The query keeps the base term and the
//! exclusions apart and is only rendered to text at the request boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Blacklist;

/// A search term plus an ordered, de-duplicated set of excluded sites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    term: String,
    exclusions: Vec<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            exclusions: Vec::new(),
        }
    }

    /// Refined query: `term` excluding `found` (in order) and then the blacklist
    pub fn refined<'a, I>(term: &str, found: I, blacklist: &Blacklist) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut query = Self::new(term);
        for site in found {
            query.exclude(site);
        }
        for site in blacklist.iter() {
            query.exclude(site);
        }
        query
    }

    /// Exclude a site. Returns `false` if it was already excluded.
    pub fn exclude(&mut self, site: &str) -> bool {
        let site = site.trim();
        if site.is_empty() || self.excludes(site) {
            return false;
        }
        self.exclusions.push(site.to_string());
        true
    }

    pub fn excludes(&self, site: &str) -> bool {
        self.exclusions.iter().any(|s| s.eq_ignore_ascii_case(site))
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Render to the index's query syntax
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)?;
        for site in &self.exclusions {
            write!(f, " -site:{}", site)?;
        }
        Ok(())
    }
}
