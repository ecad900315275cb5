use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::client::ClientError;

/// Most-recent-first list of typed queries, deduplicated and capped, kept in
/// a JSON file so it survives between sessions.
#[derive(Debug, Clone)]
pub struct RecentQueries {
    items: Vec<String>,
    cap: usize,
    path: Option<PathBuf>,
}

impl RecentQueries {
    pub fn in_memory(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            cap,
            path: None,
        }
    }

    /// A missing or unreadable file starts an empty list.
    pub fn load(path: impl Into<PathBuf>, cap: usize) -> Self {
        let path = path.into();
        let items = match read_items(&path) {
            Ok(items) => items,
            Err(e) => {
                if path.exists() {
                    warn!("Ignoring unreadable recent queries at {}: {}", path.display(), e);
                }
                Vec::new()
            }
        };

        let mut recent = Self {
            items,
            cap,
            path: Some(path),
        };
        recent.items.truncate(cap);
        recent
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Moves `query` to the front and persists the list.
    pub fn record(&mut self, query: &str) -> Result<(), ClientError> {
        self.items.retain(|q| q != query);
        self.items.insert(0, query.to_string());
        self.items.truncate(self.cap);
        self.save()
    }

    pub fn save(&self) -> Result<(), ClientError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec(&self.items)?)?;
        Ok(())
    }
}

fn read_items(path: &Path) -> Result<Vec<String>, ClientError> {
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_first_deduplicated_and_capped() {
        let mut recent = RecentQueries::in_memory(5);
        for q in ["a", "b", "c", "d", "e", "f"] {
            recent.record(q).unwrap();
        }
        assert_eq!(recent.items(), ["f", "e", "d", "c", "b"]);

        recent.record("d").unwrap();
        assert_eq!(recent.items(), ["d", "f", "e", "c", "b"]);
    }

    #[test]
    fn persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recent.json");

        let mut recent = RecentQueries::load(&path, 5);
        assert!(recent.items().is_empty());
        recent.record("What is GDPR?").unwrap();
        recent.record("What is HIPAA?").unwrap();

        let reloaded = RecentQueries::load(&path, 5);
        assert_eq!(reloaded.items(), ["What is HIPAA?", "What is GDPR?"]);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent.json");
        fs::write(&path, b"{not json").unwrap();

        let recent = RecentQueries::load(&path, 5);
        assert!(recent.items().is_empty());
    }
}
