//! Cache-aside orchestration of ACL lookups.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use persistcache_core::authorization::{
    filter_acls_by_assignees, filter_usergroups_by_account, group_acls_by_resource_id,
    permission_names_for_acls, user_assignees, Acl, AssigneeGroup, PermissionName, ResourceGroup,
    ResourceType, Usergroup,
};
use persistcache_core::cache::{KeyValueStore, Result};

use crate::stores::{AclResourcesStore, AclsStore, AncestorsStore, CachedAncestors, GroupsStore};

/// Source of truth for ACLs.
///
/// Implementations report their failures as `CacheError::Backend`.
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    /// Every ACL with a rule on any resource of `groups`.
    async fn all_resource_acls(&self, groups: &[ResourceGroup]) -> Result<Vec<Acl>>;

    /// Resource ids carrying at least one ACL, per account.
    async fn all_resource_ids_for_accounts(
        &self,
        account_ids: &[String],
    ) -> Result<HashMap<String, Vec<String>>>;

    /// Every usergroup of the user, across accounts.
    async fn user_groups(&self, user_id: &str) -> Result<Vec<Usergroup>>;

    /// Direct parents of items. Items left out have no parents.
    async fn item_parents(&self, item_ids: &[String]) -> Result<BTreeMap<String, Vec<String>>>;
}

/// Answers ACL questions from the cache, falling back to an
/// [`AuthorizationBackend`] and repopulating on misses.
pub struct AclsCache {
    acl_resources: AclResourcesStore,
    acls: AclsStore,
    ancestors: AncestorsStore,
    groups: GroupsStore,
    backend: Arc<dyn AuthorizationBackend>,
}

impl AclsCache {
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthorizationBackend>) -> Self {
        Self {
            acl_resources: AclResourcesStore::new(store.clone()),
            acls: AclsStore::new(store.clone()),
            ancestors: AncestorsStore::new(store.clone()),
            groups: GroupsStore::new(store),
            backend,
        }
    }

    /// ACLs of `account_id` granting `user_id`, directly or through one of
    /// their usergroups, access to the resource or any of its ancestors.
    pub async fn find_user_acls(
        &self,
        account_id: &str,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<Acl>> {
        let assignees = self.fetch_user_assignees(account_id, user_id).await?;
        let resources = self
            .fetch_resource_with_ancestors(resource_type, resource_id)
            .await?;
        self.find_acl_matches(account_id, &assignees, &resources)
            .await
    }

    /// The ACLs behind [`AclsCache::find_user_permissions`], so callers can
    /// inspect the restrictions they carry.
    pub async fn find_resource_permissions_with_restrictions(
        &self,
        account_id: &str,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<Acl>> {
        self.find_user_acls(account_id, user_id, resource_type, resource_id)
            .await
    }

    /// Distinct permissions `user_id` holds on the resource, sorted.
    pub async fn find_user_permissions(
        &self,
        account_id: &str,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<PermissionName>> {
        let acls = self
            .find_user_acls(account_id, user_id, resource_type, resource_id)
            .await?;
        Ok(permission_names_for_acls(&acls))
    }

    /// Keeps the ids of `resource_ids` that carry an ACL in `account_id`.
    ///
    /// Loads and caches the account's full set when it is not cached yet.
    pub async fn filter_resource_ids_with_acl(
        &self,
        account_id: &str,
        resource_ids: &[String],
    ) -> Result<Vec<String>> {
        if self
            .acl_resources
            .has_resource_ids_for_account(account_id)
            .await?
        {
            return self
                .acl_resources
                .filter_resource_ids_without_acl(account_id, resource_ids)
                .await;
        }

        tracing::debug!(account_id = %account_id, "Loading resource ids with ACL");
        let mut by_account = self
            .backend
            .all_resource_ids_for_accounts(&[account_id.to_string()])
            .await?;
        let with_acl = by_account.remove(account_id).unwrap_or_default();

        // An empty set is never stored, so an account without any ACL is
        // loaded from the backend on every lookup.
        if let Err(err) = self
            .acl_resources
            .cache_ids_with_acl_for_account(account_id, &with_acl)
            .await
        {
            tracing::warn!(account_id = %account_id, error = %err, "Failed to cache resource ids with ACL");
        }

        let with_acl: HashSet<&str> = with_acl.iter().map(String::as_str).collect();
        Ok(resource_ids
            .iter()
            .filter(|id| with_acl.contains(id.as_str()))
            .cloned()
            .collect())
    }

    /// Narrows every group to its ids with an ACL, dropping emptied groups.
    pub async fn filter_resource_groups_with_acl(
        &self,
        account_id: &str,
        groups: &[ResourceGroup],
    ) -> Result<Vec<ResourceGroup>> {
        let mut filtered = Vec::with_capacity(groups.len());
        for group in groups {
            let ids = self
                .filter_resource_ids_with_acl(account_id, &group.ids)
                .await?;
            if !ids.is_empty() {
                filtered.push(group.with_ids(ids));
            }
        }
        Ok(filtered)
    }

    /// Cached ACLs of `groups`, completed from the backend for the misses.
    ///
    /// ACLs loaded from the backend are cached under each resource id their
    /// rules mention.
    pub async fn fetch_acls_for_resource_groups(
        &self,
        groups: &[ResourceGroup],
    ) -> Result<Vec<Acl>> {
        let cached = self
            .acls
            .fetch_cached_acls_for_resource_groups(groups, None)
            .await?;
        if cached.not_found_resources.is_empty() {
            return Ok(cached.acls);
        }

        let loaded = self
            .backend
            .all_resource_acls(&cached.not_found_resources)
            .await?;
        let by_resource = group_acls_by_resource_id(&loaded);
        if let Err(err) = self.acls.cache_acls_for_resource_ids(&by_resource).await {
            tracing::warn!(error = %err, "Failed to cache ACLs");
        }

        let mut acls = cached.acls;
        acls.extend(loaded);
        Ok(acls)
    }

    /// ACLs of `groups` within `account_id` that are assigned to any of
    /// `assignees`.
    pub async fn find_acl_matches(
        &self,
        account_id: &str,
        assignees: &[AssigneeGroup],
        groups: &[ResourceGroup],
    ) -> Result<Vec<Acl>> {
        let acls = self.fetch_account_acls(account_id, groups).await?;
        Ok(filter_acls_by_assignees(assignees, acls))
    }

    /// Distinct permissions granted on `groups` within `account_id`, sorted.
    pub async fn find_resource_permissions(
        &self,
        account_id: &str,
        groups: &[ResourceGroup],
    ) -> Result<Vec<PermissionName>> {
        let acls = self.fetch_account_acls(account_id, groups).await?;
        Ok(permission_names_for_acls(&acls))
    }

    async fn fetch_user_assignees(
        &self,
        account_id: &str,
        user_id: &str,
    ) -> Result<Vec<AssigneeGroup>> {
        let groups = match self.groups.get_groups(user_id, Some(account_id)).await? {
            Some(groups) => groups,
            None => {
                tracing::debug!(user_id = %user_id, "Loading usergroups");
                let all = self.backend.user_groups(user_id).await?;
                if let Err(err) = self.groups.set_groups(user_id, &all).await {
                    tracing::warn!(user_id = %user_id, error = %err, "Failed to cache usergroups");
                }
                filter_usergroups_by_account(all, account_id)
            }
        };
        Ok(user_assignees(user_id, &groups))
    }

    /// The resource followed by every ancestor, as one group.
    ///
    /// Parents missing from the cache are loaded from the backend and cached.
    async fn fetch_resource_with_ancestors(
        &self,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<ResourceGroup>> {
        let CachedAncestors {
            mut ancestors,
            not_found_ids: mut missing,
        } = self
            .ancestors
            .fetch_cached_ancestors(&[resource_id.to_string()])
            .await?;

        while !missing.is_empty() {
            tracing::debug!(count = missing.len(), "Loading item parents");
            let mut loaded = self.backend.item_parents(&missing).await?;
            for id in &missing {
                loaded.entry(id.clone()).or_default();
            }
            if let Err(err) = self.ancestors.cache_parents(&loaded).await {
                tracing::warn!(error = %err, "Failed to cache item parents");
            }

            let unresolved: Vec<String> = {
                let mut seen = HashSet::new();
                loaded
                    .values()
                    .flatten()
                    .filter(|id| !ancestors.contains_key(*id) && !loaded.contains_key(*id))
                    .filter(|id| seen.insert(id.as_str()))
                    .cloned()
                    .collect()
            };
            ancestors.extend(loaded);

            let next = self.ancestors.fetch_cached_ancestors(&unresolved).await?;
            ancestors.extend(next.ancestors);
            missing = next.not_found_ids;
        }

        let ids = std::iter::once(resource_id.to_string())
            .chain(ancestors.into_keys().filter(|id| id != resource_id))
            .collect::<Vec<_>>();
        Ok(vec![ResourceGroup::new(resource_type, ids)])
    }

    async fn fetch_account_acls(
        &self,
        account_id: &str,
        groups: &[ResourceGroup],
    ) -> Result<Vec<Acl>> {
        let with_acl = self
            .filter_resource_groups_with_acl(account_id, groups)
            .await?;
        if with_acl.is_empty() {
            tracing::warn!(account_id = %account_id, "No ACLs found for resources");
            return Ok(Vec::new());
        }
        self.fetch_acls_for_resource_groups(&with_acl).await
    }
}
