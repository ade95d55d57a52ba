//! Per-account set of resource ids that carry at least one ACL.

use std::sync::Arc;

use persistcache_core::cache::{kv_key, KeyValueStore, Result, ACL_RESOURCES_IDENTIFIER};

pub const ACL_RESOURCES_VERSION: u32 = 1;

pub struct AclResourcesStore {
    store: Arc<dyn KeyValueStore>,
    version: u32,
}

impl AclResourcesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_version(store, ACL_RESOURCES_VERSION)
    }

    pub fn with_version(store: Arc<dyn KeyValueStore>, version: u32) -> Self {
        Self { store, version }
    }

    fn key(&self, account_id: &str) -> String {
        kv_key(ACL_RESOURCES_IDENTIFIER, self.version, account_id)
    }

    /// Whether the account's set has been cached at all.
    pub async fn has_resource_ids_for_account(&self, account_id: &str) -> Result<bool> {
        self.store.exists(&self.key(account_id)).await
    }

    /// Returns the ids of `resource_ids` that are members of the account's
    /// cached set, in input order.
    ///
    /// Despite the name, these are the ids that DO have an ACL.
    pub async fn filter_resource_ids_without_acl(
        &self,
        account_id: &str,
        resource_ids: &[String],
    ) -> Result<Vec<String>> {
        self.store
            .smembers_present(&self.key(account_id), resource_ids)
            .await
    }

    /// Replaces the account's set with `resource_ids`.
    ///
    /// The previous set is deleted first, so consecutive calls never merge.
    /// Not atomic: a concurrent writer may interleave and the last one wins.
    pub async fn cache_ids_with_acl_for_account(
        &self,
        account_id: &str,
        resource_ids: &[String],
    ) -> Result<()> {
        let key = self.key(account_id);
        self.store.del(std::slice::from_ref(&key)).await?;
        self.store.sadd(&key, resource_ids).await?;
        tracing::trace!(
            account_id = %account_id,
            count = resource_ids.len(),
            "Cached resource ids with ACL"
        );
        Ok(())
    }

    pub async fn invalidate_account(&self, account_id: &str) -> Result<()> {
        self.store.del(&[self.key(account_id)]).await
    }

    pub async fn invalidate_accounts(&self, account_ids: &[String]) -> Result<()> {
        if account_ids.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = account_ids.iter().map(|id| self.key(id)).collect();
        self.store.del(&keys).await
    }

    /// Lists the account's cached set, sorted.
    pub async fn cached_resource_ids(&self, account_id: &str) -> Result<Vec<String>> {
        self.store.smembers(&self.key(account_id)).await
    }
}
