//! Catalog search boundary.
//!
//! The metadata store is read-only from mediahub's point of view. Lookups try
//! a full-text match first (every query word must appear as a word of the
//! title) and fall back to a case-insensitive substring match when that
//! finds nothing.

use crate::config::CatalogEntry;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    /// Magnet link, present when `id` is a BitTorrent info hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
}

/// `magnet:?xt=urn:btih:<hash>` for a 40-digit hex info hash.
pub fn magnet_uri(id: &str) -> Option<String> {
    let is_info_hash = id.len() == 40 && id.chars().all(|c| c.is_ascii_hexdigit());
    is_info_hash.then(|| format!("magnet:?xt=urn:btih:{}", id.to_ascii_lowercase()))
}

pub trait CatalogSearch: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit>;
}

/// Catalog held in memory, seeded from the config file.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl MemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    fn full_text(&self, words: &[String], limit: usize) -> Vec<SearchHit> {
        self.entries
            .iter()
            .filter(|entry| {
                let title_words = tokenize(&entry.title);
                words.iter().all(|w| title_words.contains(w))
            })
            .take(limit)
            .map(hit)
            .collect()
    }

    fn substring(&self, needle: &str, limit: usize) -> Vec<SearchHit> {
        self.entries
            .iter()
            .filter(|entry| entry.title.to_lowercase().contains(needle))
            .take(limit)
            .map(hit)
            .collect()
    }
}

impl CatalogSearch for MemoryCatalog {
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let words = tokenize(query);
        if words.is_empty() {
            return Vec::new();
        }

        let hits = self.full_text(&words, limit);
        if !hits.is_empty() {
            return hits;
        }

        self.substring(&query.trim().to_lowercase(), limit)
    }
}

fn hit(entry: &CatalogEntry) -> SearchHit {
    SearchHit {
        id: entry.id.clone(),
        title: entry.title.clone(),
        magnet: magnet_uri(&entry.id),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
