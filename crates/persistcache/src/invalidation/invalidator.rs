//! The per-event reactor trait.

use async_trait::async_trait;

use persistcache_core::cache::{CacheError, Result};
use persistcache_core::invalidation::{AnyInvalidateEvent, LifecyclePhase};

/// Corrects one store when entities of a given event name change.
///
/// Implementors override the handlers of the phases they list in
/// [`Invalidator::phases`]. The manager only calls listed phases; the default
/// handlers fail with [`CacheError::UnsupportedPhase`].
#[async_trait]
pub trait Invalidator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Phases this invalidator reacts to.
    fn phases(&self) -> &'static [LifecyclePhase];

    fn supports(&self, phase: LifecyclePhase) -> bool {
        self.phases().contains(&phase)
    }

    async fn on_create(&self, _events: &[AnyInvalidateEvent]) -> Result<()> {
        Err(unsupported(self.name(), LifecyclePhase::Create))
    }

    async fn on_update(&self, _events: &[AnyInvalidateEvent]) -> Result<()> {
        Err(unsupported(self.name(), LifecyclePhase::Update))
    }

    async fn on_delete(&self, _events: &[AnyInvalidateEvent]) -> Result<()> {
        Err(unsupported(self.name(), LifecyclePhase::Delete))
    }

    async fn handle(&self, phase: LifecyclePhase, events: &[AnyInvalidateEvent]) -> Result<()> {
        match phase {
            LifecyclePhase::Create => self.on_create(events).await,
            LifecyclePhase::Update => self.on_update(events).await,
            LifecyclePhase::Delete => self.on_delete(events).await,
        }
    }
}

fn unsupported(invalidator: &'static str, phase: LifecyclePhase) -> CacheError {
    CacheError::UnsupportedPhase {
        invalidator,
        phase: phase.as_str(),
    }
}
