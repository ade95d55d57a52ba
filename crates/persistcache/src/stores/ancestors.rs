//! Parent links of documents and collections, and their transitive closure.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use persistcache_core::cache::{KeyValueStore, Result, ANCESTORS_IDENTIFIER};

use crate::cache::SimpleKvCache;

pub const ANCESTORS_VERSION: u32 = 1;

/// Cached parent links reachable from a set of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedAncestors {
    /// Direct parents of every item that had a cache entry.
    pub ancestors: BTreeMap<String, Vec<String>>,
    /// Items, at any depth, that had no cache entry.
    pub not_found_ids: Vec<String>,
}

pub struct AncestorsStore {
    cache: SimpleKvCache<Vec<String>>,
}

impl AncestorsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_version(store, ANCESTORS_VERSION)
    }

    pub fn with_version(store: Arc<dyn KeyValueStore>, version: u32) -> Self {
        Self {
            cache: SimpleKvCache::new(store, ANCESTORS_IDENTIFIER, version),
        }
    }

    /// Direct parents of `item_ids`, without following them further.
    pub async fn fetch_cached_parents(&self, item_ids: &[String]) -> Result<CachedAncestors> {
        let mut result = CachedAncestors::default();
        for entry in self.cache.get_many(item_ids).await? {
            match entry.value {
                Some(parents) => {
                    result.ancestors.insert(entry.key, parents);
                }
                None => result.not_found_ids.push(entry.key),
            }
        }
        Ok(result)
    }

    /// Follows cached parent links from `item_ids` until a step yields no
    /// parent ids.
    ///
    /// There is no cycle detection: cyclic parent links never terminate.
    pub async fn fetch_cached_ancestors(&self, item_ids: &[String]) -> Result<CachedAncestors> {
        let mut result = CachedAncestors::default();
        let mut pending = distinct(item_ids.iter());

        while !pending.is_empty() {
            let step = self.fetch_cached_parents(&pending).await?;
            pending = distinct(step.ancestors.values().flatten());

            for id in step.not_found_ids {
                if !result.not_found_ids.contains(&id) {
                    result.not_found_ids.push(id);
                }
            }
            result.ancestors.extend(step.ancestors);
        }

        tracing::trace!(
            resolved = result.ancestors.len(),
            not_found = result.not_found_ids.len(),
            "Resolved cached ancestors"
        );
        Ok(result)
    }

    pub async fn cache_parents(&self, parents: &BTreeMap<String, Vec<String>>) -> Result<()> {
        self.cache
            .set_many(parents.iter().map(|(id, parents)| (id.as_str(), parents)))
            .await
    }

    pub async fn invalidate_items(&self, item_ids: &[String]) -> Result<()> {
        self.cache.remove(item_ids).await
    }
}

fn distinct<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.as_str())).cloned().collect()
}
