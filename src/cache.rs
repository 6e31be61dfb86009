//! Time-bounded memoization of extraction results.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::model::{DeviceVariant, Recipe};

/// Seven days, the lifetime of a cached extraction
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Whether an extraction involved the LLM or only the heuristic scraper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub url: String,
    pub variant: DeviceVariant,
    pub strategy: ExtractionStrategy,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, variant: DeviceVariant, strategy: ExtractionStrategy) -> Self {
        CacheKey {
            url: url.into(),
            variant,
            strategy,
        }
    }
}

/// Persisted shape of one cache slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: CacheKey,
    pub recipe: Recipe,
    pub timestamp_millis: u64,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Shared extraction cache. Expiry is lazy: stale entries are ignored on
/// read and only removed by `purge_expired` or an overwrite.
#[derive(Debug)]
pub struct ExtractionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ExtractionCache {
    pub fn new(ttl: Duration) -> Self {
        ExtractionCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now_millis: u64) -> bool {
        now_millis.saturating_sub(entry.timestamp_millis) < self.ttl.as_millis() as u64
    }

    pub fn get(&self, key: &CacheKey) -> Option<Recipe> {
        self.get_at(key, now_millis())
    }

    /// Lookup against an explicit clock reading
    pub fn get_at(&self, key: &CacheKey, now_millis: u64) -> Option<Recipe> {
        let entries = self.entries.read().ok()?;
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now_millis) => Some(entry.recipe.clone()),
            Some(_) => {
                debug!("Cache entry for {} ({}) expired", key.url, key.variant);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, recipe: Recipe) {
        self.insert_at(key, recipe, now_millis());
    }

    /// Replace the whole entry for `key`; concurrent writers race and the
    /// last one wins.
    pub fn insert_at(&self, key: CacheKey, recipe: Recipe, timestamp_millis: u64) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.clone(),
                CacheEntry {
                    key,
                    recipe,
                    timestamp_millis,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every fresh entry, for persisting between runs
    pub fn entries(&self) -> Vec<CacheEntry> {
        let now = now_millis();
        self.entries
            .read()
            .map(|entries| {
                entries
                    .values()
                    .filter(|entry| self.is_fresh(entry, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load previously exported entries, skipping any that are already stale.
    /// Returns how many were kept.
    pub fn restore(&self, restored: impl IntoIterator<Item = CacheEntry>) -> usize {
        let now = now_millis();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let mut kept = 0;
        for entry in restored {
            if self.is_fresh(&entry, now) {
                entries.insert(entry.key.clone(), entry);
                kept += 1;
            }
        }
        debug!("Restored {} cache entries", kept);
        kept
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now_millis())
    }

    pub fn purge_expired_at(&self, now_millis: u64) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| {
            now_millis.saturating_sub(entry.timestamp_millis) < self.ttl.as_millis() as u64
        });
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractionMethod, RecipeContent};

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    fn recipe(url: &str) -> Recipe {
        Recipe::new(
            url,
            ExtractionMethod::Deepseek,
            RecipeContent::Markdown("# Soup\n## Ingredients\n- water".to_string()),
        )
    }

    fn key(url: &str, variant: DeviceVariant) -> CacheKey {
        CacheKey::new(url, variant, ExtractionStrategy::Llm)
    }

    #[test]
    fn test_entries_expire_after_seven_days() {
        let cache = ExtractionCache::default();
        let k = key("https://example.com/soup", DeviceVariant::Desktop);
        cache.insert_at(k.clone(), recipe("https://example.com/soup"), 1_000);

        assert!(cache.get_at(&k, 1_000 + 6 * DAY_MS).is_some());
        assert!(cache.get_at(&k, 1_000 + 604_800_000).is_none());
        // lazily expired, still stored until purged
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired_at(1_000 + 8 * DAY_MS), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_variants_and_strategies_are_separate_keys() {
        let cache = ExtractionCache::default();
        let url = "https://example.com/soup";
        cache.insert(key(url, DeviceVariant::Mobile), recipe(url));

        assert!(cache.get(&key(url, DeviceVariant::Mobile)).is_some());
        assert!(cache.get(&key(url, DeviceVariant::Desktop)).is_none());
        assert!(cache
            .get(&CacheKey::new(url, DeviceVariant::Mobile, ExtractionStrategy::Heuristic))
            .is_none());
    }

    #[test]
    fn test_insert_replaces_whole_entry() {
        let cache = ExtractionCache::default();
        let url = "https://example.com/soup";
        let k = key(url, DeviceVariant::Desktop);
        cache.insert(k.clone(), recipe(url));
        let mut newer = recipe(url);
        newer.method = ExtractionMethod::DeepseekOptimized;
        cache.insert(k.clone(), newer.clone());

        assert_eq!(cache.get(&k), Some(newer));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_restore_drops_stale_entries() {
        let source = ExtractionCache::default();
        let fresh_url = "https://example.com/fresh";
        source.insert(key(fresh_url, DeviceVariant::Desktop), recipe(fresh_url));

        let mut exported = source.entries();
        assert_eq!(exported.len(), 1);
        exported.push(CacheEntry {
            key: key("https://example.com/stale", DeviceVariant::Desktop),
            recipe: recipe("https://example.com/stale"),
            timestamp_millis: 0,
        });

        let json = serde_json::to_string(&exported).unwrap();
        let decoded: Vec<CacheEntry> = serde_json::from_str(&json).unwrap();

        let target = ExtractionCache::default();
        assert_eq!(target.restore(decoded), 1);
        assert!(target.get(&key(fresh_url, DeviceVariant::Desktop)).is_some());
    }
}
