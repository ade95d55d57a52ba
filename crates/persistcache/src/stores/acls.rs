//! ACL lists cached per resource id.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use persistcache_core::authorization::{
    dedupe_acls, filter_acls_by_account, flatten_resource_ids, partition_resource_groups, Acl,
    ResourceGroup,
};
use persistcache_core::cache::{KeyValueStore, Result, ACLS_IDENTIFIER};

use crate::cache::SimpleKvCache;

/// Bumped whenever the cached `Acl` shape changes.
pub const ACLS_VERSION: u32 = 1;

/// Result of [`AclsStore::fetch_cached_acls_for_resource_groups`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedResourceAcls {
    pub acls: Vec<Acl>,
    /// Groups narrowed to the ids that had a cache entry.
    pub found_resources: Vec<ResourceGroup>,
    /// Groups narrowed to the ids the caller still has to load.
    pub not_found_resources: Vec<ResourceGroup>,
}

pub struct AclsStore {
    cache: SimpleKvCache<Vec<Acl>>,
}

impl AclsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_version(store, ACLS_VERSION)
    }

    pub fn with_version(store: Arc<dyn KeyValueStore>, version: u32) -> Self {
        Self {
            cache: SimpleKvCache::new(store, ACLS_IDENTIFIER, version),
        }
    }

    /// Returns the cached ACL lists of the ids that have one, keyed by id.
    pub async fn fetch_cached_acls(
        &self,
        resource_ids: &[String],
    ) -> Result<BTreeMap<String, Vec<Acl>>> {
        let entries = self.cache.get_many(resource_ids).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.value.map(|acls| (entry.key, acls)))
            .collect())
    }

    /// Looks up the ACLs of every id in `groups` and reports which ids missed.
    ///
    /// ACLs shared by several resources are returned once. With `account_id`
    /// only that account's ACLs are kept. Nothing is loaded or written back for
    /// `not_found_resources`; that is up to the caller.
    pub async fn fetch_cached_acls_for_resource_groups(
        &self,
        groups: &[ResourceGroup],
        account_id: Option<&str>,
    ) -> Result<CachedResourceAcls> {
        let resource_ids = flatten_resource_ids(groups);
        let cached = self.fetch_cached_acls(&resource_ids).await?;

        let acls = resource_ids
            .iter()
            .filter_map(|id| cached.get(id))
            .flatten()
            .cloned()
            .collect();
        let mut acls = dedupe_acls(acls);
        if let Some(account_id) = account_id {
            acls = filter_acls_by_account(acls, account_id);
        }

        let found: HashSet<&str> = cached.keys().map(String::as_str).collect();
        let (found_resources, not_found_resources) =
            partition_resource_groups(groups, |id| found.contains(id));

        tracing::trace!(
            hits = found_resources.len(),
            misses = not_found_resources.len(),
            "Fetched cached ACLs for resource groups"
        );

        Ok(CachedResourceAcls {
            acls,
            found_resources,
            not_found_resources,
        })
    }

    /// Writes the ACL list of every resource id in one multi-key write.
    pub async fn cache_acls_for_resource_ids(
        &self,
        acls_by_resource: &BTreeMap<String, Vec<Acl>>,
    ) -> Result<()> {
        self.cache
            .set_many(
                acls_by_resource
                    .iter()
                    .map(|(id, acls)| (id.as_str(), acls)),
            )
            .await
    }

    pub async fn invalidate_resource_ids(&self, resource_ids: &[String]) -> Result<()> {
        self.cache.remove(resource_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use persistcache_core::authorization::{group_acls_by_resource_id, PermissionName, ResourceType};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn acl(id: &str, account_id: &str, resource_ids: &[&str]) -> Acl {
        Acl::new(id, account_id).with_rule(
            ResourceGroup::new(ResourceType::Document, resource_ids.iter().copied()),
            vec![PermissionName::View],
        )
    }

    async fn seeded_store(acls: &[Acl]) -> AclsStore {
        let store = AclsStore::new(Arc::new(MemoryStore::new()));
        store
            .cache_acls_for_resource_ids(&group_acls_by_resource_id(acls))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_fetch_cached_acls_skips_misses() {
        let store = seeded_store(&[acl("acl-1", "acc", &["d1"])]).await;

        let cached = store.fetch_cached_acls(&ids(&["d1", "d2"])).await.unwrap();

        assert_eq!(cached.len(), 1);
        assert_eq!(cached["d1"][0].id, "acl-1");
    }

    #[tokio::test]
    async fn test_groups_are_split_between_found_and_not_found() {
        let store = seeded_store(&[acl("acl-1", "acc", &["d1"])]).await;
        let groups = vec![
            ResourceGroup::new(ResourceType::Document, ["d1", "d2"]),
            ResourceGroup::new(ResourceType::Collection, ["c1"]),
        ];

        let result = store
            .fetch_cached_acls_for_resource_groups(&groups, None)
            .await
            .unwrap();

        assert_eq!(
            result.found_resources,
            vec![ResourceGroup::new(ResourceType::Document, ["d1"])]
        );
        assert_eq!(
            result.not_found_resources,
            vec![
                ResourceGroup::new(ResourceType::Document, ["d2"]),
                ResourceGroup::new(ResourceType::Collection, ["c1"]),
            ]
        );
        assert_eq!(result.acls.len(), 1);
    }

    #[tokio::test]
    async fn test_shared_acl_is_returned_once() {
        let store = seeded_store(&[acl("acl-1", "acc", &["d1", "d2"])]).await;
        let groups = vec![ResourceGroup::new(ResourceType::Document, ["d1", "d2"])];

        let result = store
            .fetch_cached_acls_for_resource_groups(&groups, None)
            .await
            .unwrap();

        assert_eq!(result.acls.len(), 1);
        assert!(result.not_found_resources.is_empty());
    }

    #[tokio::test]
    async fn test_account_filter() {
        let store = seeded_store(&[
            acl("acl-1", "acc-a", &["d1"]),
            acl("acl-2", "acc-b", &["d1"]),
        ])
        .await;
        let groups = vec![ResourceGroup::new(ResourceType::Document, ["d1"])];

        let result = store
            .fetch_cached_acls_for_resource_groups(&groups, Some("acc-b"))
            .await
            .unwrap();

        assert_eq!(result.acls.len(), 1);
        assert_eq!(result.acls[0].id, "acl-2");
    }

    #[tokio::test]
    async fn test_invalidate_resource_ids() {
        let store = seeded_store(&[acl("acl-1", "acc", &["d1", "d2"])]).await;

        store.invalidate_resource_ids(&ids(&["d1"])).await.unwrap();

        let cached = store.fetch_cached_acls(&ids(&["d1", "d2"])).await.unwrap();
        assert_eq!(cached.keys().cloned().collect::<Vec<_>>(), ids(&["d2"]));
    }
}
