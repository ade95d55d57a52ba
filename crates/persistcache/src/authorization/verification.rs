//! Cached vs live comparison of authorization answers.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};

use prometheus::{IntCounter, Registry};

use persistcache_core::cache::{CacheError, Result};
use persistcache_core::invalidation::AnyInvalidateEvent;

use crate::invalidation::InvalidatorManager;

/// Which side of a lookup answers, and whether the other side double-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Cached answer only.
    Cached,
    /// Cached answer, verified against the live one in the background.
    #[default]
    CachedWithVerification,
    /// Both concurrently, the live answer is returned.
    UncachedWithVerification,
    /// Live answer only.
    Uncached,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Cached => "cached",
            CacheMode::CachedWithVerification => "cached-with-verification",
            CacheMode::UncachedWithVerification => "uncached-with-verification",
            CacheMode::Uncached => "uncached",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cached" => Ok(CacheMode::Cached),
            "cached-with-verification" => Ok(CacheMode::CachedWithVerification),
            "uncached-with-verification" => Ok(CacheMode::UncachedWithVerification),
            "uncached" => Ok(CacheMode::Uncached),
            other => Err(CacheError::Configuration(format!(
                "unknown cache mode: {other}"
            ))),
        }
    }
}

/// Name of the counter of cached answers served and later found stale.
pub const INVALID_CACHE_COUNTER: &str = "persistcache_invalid_authorization_cache_total";

/// Runs a lookup according to a [`CacheMode`].
///
/// When a verified answer differs from the live one, the account's cached
/// data is invalidated through an `account` delete event.
#[derive(Clone)]
pub struct VerifiedRunner {
    mode: CacheMode,
    invalidator: InvalidatorManager,
    invalid_cache_counter: IntCounter,
}

impl VerifiedRunner {
    pub fn new(mode: CacheMode, invalidator: InvalidatorManager) -> Result<Self> {
        let invalid_cache_counter = IntCounter::new(
            INVALID_CACHE_COUNTER,
            "Cached authorization answers that differed from the live answer",
        )
        .map_err(|e| {
            CacheError::Configuration(format!("Failed to create {INVALID_CACHE_COUNTER}: {e}"))
        })?;

        Ok(Self {
            mode,
            invalidator,
            invalid_cache_counter,
        })
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Registers the invalid cache counter with `registry`.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.invalid_cache_counter.clone()))
            .map_err(|e| {
                CacheError::Configuration(format!(
                    "Failed to register {INVALID_CACHE_COUNTER}: {e}"
                ))
            })
    }

    /// Number of cached answers served and then found to differ from the
    /// live one. Only background verification counts.
    pub fn inconsistencies(&self) -> u64 {
        self.invalid_cache_counter.get()
    }

    /// Answers `method` for `account_id` from `fetch_cached` and/or `fetch_live`.
    ///
    /// In `UncachedWithVerification` mode an error from either side fails the
    /// call. In `CachedWithVerification` mode the live side runs in a spawned
    /// task and its failures are only logged.
    pub async fn run<T, C, L>(
        &self,
        method: &'static str,
        account_id: &str,
        fetch_cached: C,
        fetch_live: L,
    ) -> Result<T>
    where
        T: PartialEq + fmt::Debug + Clone + Send + Sync + 'static,
        C: Future<Output = Result<T>> + Send,
        L: Future<Output = Result<T>> + Send + 'static,
    {
        match self.mode {
            CacheMode::Cached => fetch_cached.await,
            CacheMode::Uncached => fetch_live.await,
            CacheMode::UncachedWithVerification => {
                let ((cached, cached_time), (live, live_time)) =
                    tokio::join!(timed(fetch_cached), timed(fetch_live));
                log_timings(method, cached_time, live_time);
                let cached = cached?;
                let live = live?;
                if cached != live {
                    self.report_inconsistency(method, account_id, &cached, &live)
                        .await;
                }
                Ok(live)
            }
            CacheMode::CachedWithVerification => {
                let (cached, cached_time) = timed(fetch_cached).await;
                let cached = cached?;

                let runner = self.clone();
                let expected = cached.clone();
                let account_id = account_id.to_string();
                tokio::spawn(async move {
                    let (live, live_time) = timed(fetch_live).await;
                    log_timings(method, cached_time, live_time);
                    match live {
                        Ok(live) if live != expected => {
                            runner.invalid_cache_counter.inc();
                            runner
                                .report_inconsistency(method, &account_id, &expected, &live)
                                .await;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            tracing::warn!(method, error = %err, "Live verification failed");
                        }
                    }
                });

                Ok(cached)
            }
        }
    }

    async fn report_inconsistency<T: fmt::Debug>(
        &self,
        method: &'static str,
        account_id: &str,
        cached: &T,
        live: &T,
    ) {
        tracing::error!(
            method,
            account_id = %account_id,
            cached = ?cached,
            live = ?live,
            "Cached authorization answer differs from live answer"
        );
        if let Err(err) = self
            .invalidator
            .on_delete(&[AnyInvalidateEvent::account(account_id)])
            .await
        {
            tracing::error!(account_id = %account_id, error = %err, "Failed to invalidate account caches");
        }
    }
}

async fn timed<F: Future>(future: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let output = future.await;
    (output, start.elapsed())
}

fn log_timings(method: &str, cached: Duration, live: Duration) {
    tracing::debug!(
        method,
        cached_ms = cached.as_millis() as u64,
        live_ms = live.as_millis() as u64,
        "Authorization lookup timings"
    );
}
