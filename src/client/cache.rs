use std::collections::{HashMap, HashSet};

use crate::metadata::LinkMetadata;

/// Link title/icon keyed by URL. Entries are never invalidated.
#[derive(Debug, Default, Clone)]
pub struct MetadataCache {
    entries: HashMap<String, LinkMetadata>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&LinkMetadata> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, meta: LinkMetadata) {
        self.entries.insert(url.into(), meta);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct uncached URLs, in first-seen order.
    pub fn missing<'a, I>(&self, links: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter(|l| !self.entries.contains_key(l.as_str()))
            .filter(|l| seen.insert(*l))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_skips_cached_and_duplicates() {
        let mut cache = MetadataCache::new();
        cache.insert("https://a.example", LinkMetadata::placeholder());

        let links: Vec<String> = ["https://b.example", "https://a.example", "https://b.example", "https://c.example"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(cache.missing(&links), vec!["https://b.example", "https://c.example"]);
    }
}
