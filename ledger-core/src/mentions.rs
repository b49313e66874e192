//! Hidden service mentions discovered for bitcoin addresses

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Known noise sites that mention nearly every address (explorers, mirrors)
pub static DEFAULT_BLACKLIST: &[&str] = &["4a6kzlzytb4ksafk.onion", "blockchainbdgpzk.onion"];

/// Sites that are excluded from every search and never recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    sites: Vec<String>,
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLACKLIST.iter().copied())
    }
}

impl Blacklist {
    pub fn new<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut blacklist = Self { sites: Vec::new() };
        for site in sites {
            blacklist.add(site);
        }
        blacklist
    }

    /// Add a site, ignoring blanks and duplicates
    pub fn add(&mut self, site: impl Into<String>) {
        let site = site.into().trim().to_lowercase();
        if !site.is_empty() && !self.sites.contains(&site) {
            self.sites.push(site);
        }
    }

    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for site in sites {
            self.add(site);
        }
        self
    }

    pub fn contains(&self, site: &str) -> bool {
        self.sites.iter().any(|s| s.eq_ignore_ascii_case(site))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Address -> set of hidden service sites that mention it.
///
/// Grows monotonically; addresses without any recorded site are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenServiceMentions {
    by_address: BTreeMap<String, BTreeSet<String>>,
}

impl HiddenServiceMentions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mention. Returns `true` if the site was new for this address.
    pub fn insert(&mut self, address: &str, site: &str) -> bool {
        self.by_address
            .entry(address.to_string())
            .or_default()
            .insert(site.to_string())
    }

    pub fn sites(&self, address: &str) -> Option<&BTreeSet<String>> {
        self.by_address.get(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.by_address.iter().map(|(a, s)| (a.as_str(), s))
    }

    /// Number of addresses with at least one mention
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    /// Distinct sites across all addresses
    pub fn distinct_sites(&self) -> usize {
        self.by_address
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blacklist() {
        let blacklist = Blacklist::default();
        assert_eq!(blacklist.len(), 2);
        assert!(blacklist.contains("blockchainbdgpzk.onion"));
        assert!(blacklist.contains("4A6KZLZYTB4KSAFK.onion"));
        assert!(!blacklist.contains("market.onion"));
    }

    #[test]
    fn test_blacklist_dedup() {
        let blacklist = Blacklist::default().with_sites(["extra.onion", " Extra.onion ", ""]);
        assert_eq!(blacklist.len(), 3);
        assert_eq!(blacklist.iter().last(), Some("extra.onion"));
    }

    #[test]
    fn test_mentions_insert() {
        let mut mentions = HiddenServiceMentions::new();
        assert!(mentions.is_empty());

        assert!(mentions.insert("A", "x.onion"));
        assert!(!mentions.insert("A", "x.onion"));
        assert!(mentions.insert("A", "y.onion"));
        assert!(mentions.insert("B", "x.onion"));

        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions.sites("A").map(|s| s.len()), Some(2));
        assert_eq!(mentions.distinct_sites(), 2);
        assert!(!mentions.contains("C"));
    }
}
