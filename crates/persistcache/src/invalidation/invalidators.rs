//! Invalidators for the domain stores.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use persistcache_core::cache::{KeyValueStore, Result};
use persistcache_core::invalidation::{AnyInvalidateEvent, LifecyclePhase};

use super::Invalidator;
use crate::stores::{AclResourcesStore, AclsStore, AncestorsStore, GroupsStore};

const ALL_PHASES: &[LifecyclePhase] = &[
    LifecyclePhase::Create,
    LifecyclePhase::Update,
    LifecyclePhase::Delete,
];

const UPDATE_AND_DELETE: &[LifecyclePhase] = &[LifecyclePhase::Update, LifecyclePhase::Delete];

/// Collects distinct ids in first-seen order.
fn distinct_ids<'a>(ids: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.as_str())).cloned().collect()
}

/// Drops the acl-resources set of every account touched by an ACL change.
pub struct AclResourcesAclInvalidator {
    store: AclResourcesStore,
}

impl AclResourcesAclInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: AclResourcesStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let account_ids = distinct_ids(events.iter().filter_map(|event| match event {
            AnyInvalidateEvent::Acl(acl) => Some(&acl.account_id),
            _ => None,
        }));
        self.store.invalidate_accounts(&account_ids).await
    }
}

#[async_trait]
impl Invalidator for AclResourcesAclInvalidator {
    fn name(&self) -> &'static str {
        "AclResourcesAclInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        ALL_PHASES
    }

    async fn on_create(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the cached ACL lists of every resource an ACL change mentions.
pub struct AclsAclInvalidator {
    store: AclsStore,
}

impl AclsAclInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: AclsStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let resource_ids = distinct_ids(
            events
                .iter()
                .filter_map(|event| match event {
                    AnyInvalidateEvent::Acl(acl) => Some(&acl.resource_ids),
                    _ => None,
                })
                .flatten(),
        );
        self.store.invalidate_resource_ids(&resource_ids).await
    }
}

#[async_trait]
impl Invalidator for AclsAclInvalidator {
    fn name(&self) -> &'static str {
        "AclsAclInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        ALL_PHASES
    }

    async fn on_create(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the acl-resources set of changed accounts.
pub struct AclResourcesAccountInvalidator {
    store: AclResourcesStore,
}

impl AclResourcesAccountInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: AclResourcesStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let account_ids = distinct_ids(events.iter().filter_map(|event| match event {
            AnyInvalidateEvent::Account(account) => Some(&account.account_id),
            _ => None,
        }));
        self.store.invalidate_accounts(&account_ids).await
    }
}

#[async_trait]
impl Invalidator for AclResourcesAccountInvalidator {
    fn name(&self) -> &'static str {
        "AclResourcesAccountInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        UPDATE_AND_DELETE
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the parent entry of changed collections.
pub struct AncestorsCollectionInvalidator {
    store: AncestorsStore,
}

impl AncestorsCollectionInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: AncestorsStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let collection_ids = distinct_ids(events.iter().filter_map(|event| match event {
            AnyInvalidateEvent::Collection(collection) => Some(&collection.collection_id),
            _ => None,
        }));
        self.store.invalidate_items(&collection_ids).await
    }
}

#[async_trait]
impl Invalidator for AncestorsCollectionInvalidator {
    fn name(&self) -> &'static str {
        "AncestorsCollectionInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        UPDATE_AND_DELETE
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the parent entry of changed documents.
pub struct AncestorsDocumentInvalidator {
    store: AncestorsStore,
}

impl AncestorsDocumentInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: AncestorsStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let document_ids = distinct_ids(events.iter().filter_map(|event| match event {
            AnyInvalidateEvent::Document(document) => Some(&document.document_id),
            _ => None,
        }));
        self.store.invalidate_items(&document_ids).await
    }
}

#[async_trait]
impl Invalidator for AncestorsDocumentInvalidator {
    fn name(&self) -> &'static str {
        "AncestorsDocumentInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        UPDATE_AND_DELETE
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the group lists of every member of a changed usergroup.
pub struct GroupsUsergroupInvalidator {
    store: GroupsStore,
}

impl GroupsUsergroupInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: GroupsStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let user_ids = distinct_ids(
            events
                .iter()
                .filter_map(|event| match event {
                    AnyInvalidateEvent::Usergroup(group) => Some(&group.user_ids),
                    _ => None,
                })
                .flatten(),
        );
        self.store.invalidate_users(&user_ids).await
    }
}

#[async_trait]
impl Invalidator for GroupsUsergroupInvalidator {
    fn name(&self) -> &'static str {
        "GroupsUsergroupInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        ALL_PHASES
    }

    async fn on_create(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

/// Drops the group list of changed users.
pub struct GroupsUserInvalidator {
    store: GroupsStore,
}

impl GroupsUserInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: GroupsStore::new(store),
        }
    }

    async fn invalidate(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        let user_ids = distinct_ids(events.iter().filter_map(|event| match event {
            AnyInvalidateEvent::User(user) => Some(&user.user_id),
            _ => None,
        }));
        self.store.invalidate_users(&user_ids).await
    }
}

#[async_trait]
impl Invalidator for GroupsUserInvalidator {
    fn name(&self) -> &'static str {
        "GroupsUserInvalidator"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        UPDATE_AND_DELETE
    }

    async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }

    async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use persistcache_core::authorization::{
        Acl, PermissionName, ResourceGroup, ResourceType, Usergroup,
    };
    use std::collections::BTreeMap;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn shared() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_acl_event_drops_account_set() {
        let backing = shared();
        let resources = AclResourcesStore::new(backing.clone());
        resources
            .cache_ids_with_acl_for_account("acc", &ids(&["d1"]))
            .await
            .unwrap();

        AclResourcesAclInvalidator::new(backing)
            .on_create(&[AnyInvalidateEvent::acl("acl-1", "acc", ["d1"])])
            .await
            .unwrap();

        assert!(!resources.has_resource_ids_for_account("acc").await.unwrap());
    }

    #[tokio::test]
    async fn test_acl_event_drops_resource_acls() {
        let backing = shared();
        let acls = AclsStore::new(backing.clone());
        let acl = Acl::new("acl-1", "acc").with_rule(
            ResourceGroup::new(ResourceType::Document, ["d1"]),
            vec![PermissionName::Edit],
        );
        let mut by_resource = BTreeMap::new();
        by_resource.insert("d1".to_string(), vec![acl.clone()]);
        by_resource.insert("d2".to_string(), vec![acl]);
        acls.cache_acls_for_resource_ids(&by_resource).await.unwrap();

        AclsAclInvalidator::new(backing)
            .on_update(&[AnyInvalidateEvent::acl("acl-1", "acc", ["d1"])])
            .await
            .unwrap();

        let cached = acls.fetch_cached_acls(&ids(&["d1", "d2"])).await.unwrap();
        assert!(!cached.contains_key("d1"));
        assert!(cached.contains_key("d2"));
    }

    #[tokio::test]
    async fn test_account_event_drops_account_set() {
        let backing = shared();
        let resources = AclResourcesStore::new(backing.clone());
        resources
            .cache_ids_with_acl_for_account("acc", &ids(&["d1"]))
            .await
            .unwrap();

        AclResourcesAccountInvalidator::new(backing)
            .on_delete(&[AnyInvalidateEvent::account("acc")])
            .await
            .unwrap();

        assert!(!resources.has_resource_ids_for_account("acc").await.unwrap());
    }

    #[tokio::test]
    async fn test_collection_and_document_events_drop_parents() {
        let backing = shared();
        let ancestors = AncestorsStore::new(backing.clone());
        let mut parents = BTreeMap::new();
        parents.insert("doc".to_string(), ids(&["col"]));
        parents.insert("col".to_string(), ids(&["root"]));
        ancestors.cache_parents(&parents).await.unwrap();

        AncestorsCollectionInvalidator::new(backing.clone())
            .on_update(&[AnyInvalidateEvent::collection("col")])
            .await
            .unwrap();
        let result = ancestors.fetch_cached_parents(&ids(&["doc", "col"])).await.unwrap();
        assert_eq!(result.not_found_ids, ids(&["col"]));

        AncestorsDocumentInvalidator::new(backing)
            .on_delete(&[AnyInvalidateEvent::document("doc")])
            .await
            .unwrap();
        let result = ancestors.fetch_cached_parents(&ids(&["doc"])).await.unwrap();
        assert_eq!(result.not_found_ids, ids(&["doc"]));
    }

    #[tokio::test]
    async fn test_usergroup_and_user_events_drop_group_lists() {
        let backing = shared();
        let groups = GroupsStore::new(backing.clone());
        let memberships = vec![Usergroup::new("g1", "acc", "Editors")];
        for user in ["u1", "u2", "u3"] {
            groups.set_groups(user, &memberships).await.unwrap();
        }

        GroupsUsergroupInvalidator::new(backing.clone())
            .on_create(&[AnyInvalidateEvent::usergroup("g1", ["u1", "u2"])])
            .await
            .unwrap();
        assert_eq!(groups.get_groups("u1", Some("acc")).await.unwrap(), None);
        assert_eq!(groups.get_groups("u2", Some("acc")).await.unwrap(), None);
        assert!(groups.get_groups("u3", Some("acc")).await.unwrap().is_some());

        GroupsUserInvalidator::new(backing)
            .on_update(&[AnyInvalidateEvent::user("u3")])
            .await
            .unwrap();
        assert_eq!(groups.get_groups("u3", Some("acc")).await.unwrap(), None);
    }

    #[test]
    fn test_phase_tables() {
        let backing = shared();
        assert!(AclsAclInvalidator::new(backing.clone()).supports(LifecyclePhase::Create));
        assert!(!AclResourcesAccountInvalidator::new(backing.clone())
            .supports(LifecyclePhase::Create));
        assert!(!GroupsUserInvalidator::new(backing.clone()).supports(LifecyclePhase::Create));
        assert!(GroupsUsergroupInvalidator::new(backing).supports(LifecyclePhase::Create));
    }
}
