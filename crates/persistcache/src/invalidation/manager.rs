//! Fans invalidation events out to registered invalidators.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;

use persistcache_core::cache::{KeyValueStore, Result};
use persistcache_core::invalidation::{
    group_events_by_name, AnyInvalidateEvent, InvalidateEventName, LifecyclePhase,
};

use super::invalidators::{
    AclResourcesAccountInvalidator, AclResourcesAclInvalidator, AclsAclInvalidator,
    AncestorsCollectionInvalidator, AncestorsDocumentInvalidator, GroupsUserInvalidator,
    GroupsUsergroupInvalidator,
};
use super::Invalidator;

/// Invalidators per event name, in registration order.
#[derive(Default, Clone)]
pub struct InvalidatorRegistry {
    entries: HashMap<InvalidateEventName, Vec<Arc<dyn Invalidator>>>,
}

impl InvalidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The invalidators of every domain store, all sharing `store`.
    pub fn standard(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new()
            .register(
                InvalidateEventName::Acl,
                Arc::new(AclResourcesAclInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::Acl,
                Arc::new(AclsAclInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::Account,
                Arc::new(AclResourcesAccountInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::Collection,
                Arc::new(AncestorsCollectionInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::Document,
                Arc::new(AncestorsDocumentInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::Usergroup,
                Arc::new(GroupsUsergroupInvalidator::new(store.clone())),
            )
            .register(
                InvalidateEventName::User,
                Arc::new(GroupsUserInvalidator::new(store)),
            )
    }

    pub fn register(mut self, name: InvalidateEventName, invalidator: Arc<dyn Invalidator>) -> Self {
        self.entries.entry(name).or_default().push(invalidator);
        self
    }

    pub fn invalidators(&self, name: InvalidateEventName) -> &[Arc<dyn Invalidator>] {
        self.entries.get(&name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Dispatches lifecycle events to the invalidators registered for them.
///
/// Cheap to clone; clones share the same invalidators.
#[derive(Clone)]
pub struct InvalidatorManager {
    registry: Arc<InvalidatorRegistry>,
}

impl InvalidatorManager {
    /// Builds the manager with the standard invalidators over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_registry(InvalidatorRegistry::standard(store))
    }

    pub fn with_registry(registry: InvalidatorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub async fn on_create(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(LifecyclePhase::Create, events).await
    }

    pub async fn on_update(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(LifecyclePhase::Update, events).await
    }

    pub async fn on_delete(&self, events: &[AnyInvalidateEvent]) -> Result<()> {
        self.invalidate(LifecyclePhase::Delete, events).await
    }

    /// Groups `events` by name and runs every invalidator that handles
    /// `phase` on its group, all concurrently.
    ///
    /// Every dispatched call runs to completion. If any of them failed, the
    /// first error in dispatch order is returned and nothing tells which
    /// invalidators succeeded.
    pub async fn invalidate(
        &self,
        phase: LifecyclePhase,
        events: &[AnyInvalidateEvent],
    ) -> Result<()> {
        let grouped = group_events_by_name(events);

        let mut calls = Vec::new();
        for (name, group) in &grouped {
            for invalidator in self.registry.invalidators(*name) {
                if !invalidator.supports(phase) {
                    continue;
                }
                tracing::debug!(
                    invalidator = invalidator.name(),
                    event = %name,
                    %phase,
                    count = group.len(),
                    "Dispatching invalidation"
                );
                calls.push(async move { invalidator.handle(phase, group).await });
            }
        }

        let results = join_all(calls).await;
        for result in results {
            if let Err(err) = result {
                tracing::warn!(%phase, error = %err, "Invalidation failed");
                return Err(err);
            }
        }
        Ok(())
    }
}
