//! Usergroups a user belongs to, across all accounts.

use std::sync::Arc;

use persistcache_core::authorization::{filter_usergroups_by_account, Usergroup};
use persistcache_core::cache::{KeyValueStore, Result, USERGROUPS_IDENTIFIER};

use crate::cache::SimpleKvCache;

pub const USERGROUPS_VERSION: u32 = 1;

pub struct GroupsStore {
    cache: SimpleKvCache<Vec<Usergroup>>,
}

impl GroupsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_version(store, USERGROUPS_VERSION)
    }

    pub fn with_version(store: Arc<dyn KeyValueStore>, version: u32) -> Self {
        Self {
            cache: SimpleKvCache::new(store, USERGROUPS_IDENTIFIER, version),
        }
    }

    /// Returns the user's groups within `account_id`.
    ///
    /// `None` when nothing is cached for the user, and also whenever
    /// `account_id` is `None`, even if an entry exists.
    pub async fn get_groups(
        &self,
        user_id: &str,
        account_id: Option<&str>,
    ) -> Result<Option<Vec<Usergroup>>> {
        let Some(groups) = self.cache.get(user_id).await? else {
            tracing::trace!(user_id = %user_id, "No cached usergroups");
            return Ok(None);
        };
        Ok(account_id.map(|account_id| filter_usergroups_by_account(groups, account_id)))
    }

    /// Stores every group of the user, for all accounts.
    pub async fn set_groups(&self, user_id: &str, groups: &[Usergroup]) -> Result<()> {
        self.cache.set(user_id, &groups.to_vec()).await
    }

    pub async fn invalidate_users(&self, user_ids: &[String]) -> Result<()> {
        self.cache.remove(user_ids).await
    }
}
