//! # Token Cache
//!
//! Holds at most one bearer token together with the time it was fetched.
//! A cached token is served while it is younger than the freshness window;
//! otherwise the caller-supplied fetch function is invoked and its result
//! replaces the entry.
//!
//! Staleness is checked lazily on access. There is no eviction timer and a
//! failed refresh never evicts the existing entry.

use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Default freshness window for cached tokens, in seconds
pub const TOKEN_FRESHNESS_SECS: i64 = 5 * 60;

/// Default freshness window for cached tokens
pub fn default_freshness_window() -> Duration {
    Duration::seconds(TOKEN_FRESHNESS_SECS)
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A token and the instant it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub token: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedToken {
    /// Whether this token may still be served at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.fetched_at < window
    }
}

/// Single-entry token cache.
///
/// The lock is only held to read or replace the entry, never across the
/// fetch, so concurrent callers that find the entry stale may each fetch.
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
    window: Duration,
    clock: Box<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache with the default window and the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an empty cache reading time from `clock`
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            slot: RwLock::new(None),
            window: default_freshness_window(),
            clock: Box::new(clock),
        }
    }

    /// Builder: override the freshness window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Return a fresh cached token, or fetch and cache a new one.
    ///
    /// `fetch` resolving to an error or to an empty token is an
    /// authentication failure; the existing entry is kept in that case.
    pub async fn get_valid_token<F, Fut>(&self, fetch: F) -> AuthResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuthResult<Option<String>>>,
    {
        let now = self.clock.now();

        if let Some(cached) = self.slot.read().await.as_ref() {
            if cached.is_fresh(now, self.window) {
                return Ok(cached.token.clone());
            }
        }

        debug!("Token cache miss, fetching a new token");

        let token = fetch()
            .await?
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::TokenUnavailable)?;

        let fresh = CachedToken {
            token,
            fetched_at: now,
        };

        let mut slot = self.slot.write().await;
        match slot.as_ref() {
            // A concurrent caller already stored a newer token
            Some(current) if current.fetched_at > fresh.fetched_at => Ok(current.token.clone()),
            _ => {
                let token = fresh.token.clone();
                *slot = Some(fresh);
                Ok(token)
            }
        }
    }

    /// Snapshot of the current entry, fresh or not
    pub async fn peek(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    /// Drop the cached entry (e.g. on sign-out)
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn cache_with_clock() -> (TokenCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (TokenCache::with_clock(clock.clone()), clock)
    }

    async fn fetch_counting(
        cache: &TokenCache,
        calls: &AtomicUsize,
        token: &str,
    ) -> AuthResult<String> {
        cache
            .get_valid_token(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(token.to_string()))
            })
            .await
    }

    #[tokio::test]
    async fn test_serves_cached_token_within_window() {
        let (cache, clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        assert_eq!(fetch_counting(&cache, &calls, "tok_1").await.unwrap(), "tok_1");

        clock.advance(Duration::minutes(4) + Duration::seconds(59));
        assert_eq!(fetch_counting(&cache, &calls, "tok_2").await.unwrap(), "tok_1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetches_once_at_window_boundary() {
        let (cache, clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        fetch_counting(&cache, &calls, "tok_1").await.unwrap();
        clock.advance(default_freshness_window());

        assert_eq!(fetch_counting(&cache, &calls, "tok_2").await.unwrap(), "tok_2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // the new token is now the cached one
        assert_eq!(fetch_counting(&cache, &calls, "tok_3").await.unwrap(), "tok_2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cached = cache.peek().await.unwrap();
        assert_eq!(cached.fetched_at, start() + default_freshness_window());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let (cache, clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        fetch_counting(&cache, &calls, "tok_1").await.unwrap();
        clock.advance(Duration::minutes(10));

        let err = cache
            .get_valid_token(|| async { Err(AuthError::Provider("offline".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Provider("offline".into()));

        let cached = cache.peek().await.unwrap();
        assert_eq!(cached.token, "tok_1");
        assert_eq!(cached.fetched_at, start());
    }

    #[tokio::test]
    async fn test_empty_token_is_auth_failure() {
        let (cache, _clock) = cache_with_clock();

        let err = cache
            .get_valid_token(|| async { Ok(Some(String::new())) })
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TokenUnavailable);

        let err = cache
            .get_valid_token(|| async { Ok(None) })
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TokenUnavailable);

        assert!(cache.peek().await.is_none());
    }

    #[tokio::test]
    async fn test_older_refresh_does_not_replace_newer_entry() {
        let (cache, clock) = cache_with_clock();
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // starts at t0, then blocks until the second refresh has stored its token
        let slow = cache.get_valid_token(|| async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok(Some("tok_old".to_string()))
        });

        let fast = async {
            started_rx.await.unwrap();
            clock.advance(Duration::seconds(10));
            let token = cache
                .get_valid_token(|| async { Ok(Some("tok_new".to_string())) })
                .await;
            release_tx.send(()).unwrap();
            token
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(fast.unwrap(), "tok_new");
        assert_eq!(slow.unwrap(), "tok_new");

        let cached = cache.peek().await.unwrap();
        assert_eq!(cached.token, "tok_new");
        assert_eq!(cached.fetched_at, start() + Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let (cache, _clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        fetch_counting(&cache, &calls, "tok_1").await.unwrap();
        cache.clear().await;
        assert_eq!(fetch_counting(&cache, &calls, "tok_2").await.unwrap(), "tok_2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_is_fresh() {
        let cached = CachedToken {
            token: "t".into(),
            fetched_at: start(),
        };
        assert!(cached.is_fresh(start(), default_freshness_window()));
        assert!(!cached.is_fresh(start() + Duration::minutes(5), default_freshness_window()));
    }
}
