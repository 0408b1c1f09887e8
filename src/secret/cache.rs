//! Time-bounded cache of dynamic secrets keyed by client key, method, and pathname.
//!
//! A [`SecretCache`] is an explicit object: clients that should share issued secrets hold the
//! same `Arc<SecretCache>`, while independent clients (and tests) get isolated caches. Entries
//! are considered fresh while `now - fetched_at < ttl`; stale entries are replaced on the next
//! access and never deleted eagerly. Concurrent misses for one key are coalesced behind a
//! per-key async guard so only one fetch is in flight at a time, while distinct keys refresh
//! independently.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	obs::{self, CacheOutcome, CallKind, CallOutcome, CallSpan},
	secret::{DynamicSecret, SecretFetcher},
};

/// Identifies a cached secret: client key + uppercase method + pathname.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKey {
	/// Client key the secret was issued for.
	pub key: String,
	/// Uppercase HTTP method.
	pub method: String,
	/// Request pathname.
	pub pathname: String,
}
impl SecretKey {
	/// Builds a key, normalizing the method to uppercase.
	pub fn new(key: impl Into<String>, method: &Method, pathname: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			method: method.as_str().to_ascii_uppercase(),
			pathname: pathname.into(),
		}
	}

	fn method(&self) -> Method {
		Method::from_bytes(self.method.as_bytes()).unwrap_or(Method::GET)
	}
}

/// Thread-safe counters describing cache effectiveness.
#[derive(Debug, Default)]
pub struct SecretCacheStats {
	hits: AtomicU64,
	misses: AtomicU64,
	failures: AtomicU64,
}
impl SecretCacheStats {
	/// Returns the number of lookups served from the cache.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups that invoked the fetcher.
	pub fn misses(&self) -> u64 {
		self.misses.load(Ordering::Relaxed)
	}

	/// Returns the number of fetcher invocations that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	fn record(&self, outcome: CacheOutcome) {
		obs::record_secret_cache(outcome);

		match outcome {
			CacheOutcome::Hit => self.hits.fetch_add(1, Ordering::Relaxed),
			CacheOutcome::Miss => self.misses.fetch_add(1, Ordering::Relaxed),
		};
	}

	fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[derive(Clone, Debug)]
struct CachedSecret {
	secret: DynamicSecret,
	fetched_at: OffsetDateTime,
}

/// Shared cache of [`DynamicSecret`]s with time-based expiry.
#[derive(Debug)]
pub struct SecretCache {
	ttl: Duration,
	entries: RwLock<HashMap<SecretKey, CachedSecret>>,
	guards: Mutex<HashMap<SecretKey, Arc<AsyncMutex<()>>>>,
	stats: SecretCacheStats,
}
impl SecretCache {
	/// Lifetime of a cached secret measured from the local fetch time.
	pub const DEFAULT_TTL: Duration = Duration::seconds(250);

	/// Creates an empty cache using [`SecretCache::DEFAULT_TTL`].
	pub fn new() -> Self {
		Self::with_ttl(Self::DEFAULT_TTL)
	}

	/// Creates an empty cache with a custom lifetime; negative values clamp to zero.
	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			ttl: if ttl.is_negative() { Duration::ZERO } else { ttl },
			entries: Default::default(),
			guards: Default::default(),
			stats: Default::default(),
		}
	}

	/// Returns the configured lifetime.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns hit/miss/failure counters.
	pub fn stats(&self) -> &SecretCacheStats {
		&self.stats
	}

	/// Number of stored entries, fresh or stale.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Returns the cached secret when it is still fresh at `now`.
	pub fn lookup(&self, key: &SecretKey, now: OffsetDateTime) -> Option<DynamicSecret> {
		self.entries
			.read()
			.get(key)
			.filter(|entry| now - entry.fetched_at < self.ttl)
			.map(|entry| entry.secret.clone())
	}

	/// Stores `secret` as fetched at `now`, replacing any previous entry for `key`.
	pub fn store(&self, key: SecretKey, secret: DynamicSecret, now: OffsetDateTime) {
		self.entries.write().insert(key, CachedSecret { secret, fetched_at: now });
	}

	/// Drops the entry for `key`, returning the secret it held.
	pub fn invalidate(&self, key: &SecretKey) -> Option<DynamicSecret> {
		self.entries.write().remove(key).map(|entry| entry.secret)
	}

	/// Returns a fresh secret for `key`, invoking `fetcher` on a miss.
	pub async fn get(&self, key: &SecretKey, fetcher: &dyn SecretFetcher) -> Result<DynamicSecret> {
		self.get_at(key, fetcher, OffsetDateTime::now_utc()).await
	}

	/// Same as [`SecretCache::get`], evaluating freshness against `now`.
	pub async fn get_at(
		&self,
		key: &SecretKey,
		fetcher: &dyn SecretFetcher,
		now: OffsetDateTime,
	) -> Result<DynamicSecret> {
		if let Some(secret) = self.lookup(key, now) {
			self.stats.record(CacheOutcome::Hit);

			return Ok(secret);
		}

		let guard = self.guard(key);
		let result = self.get_guarded(key, fetcher, now, &guard).await;

		self.release_guard(key, guard);

		result
	}

	async fn get_guarded(
		&self,
		key: &SecretKey,
		fetcher: &dyn SecretFetcher,
		now: OffsetDateTime,
		guard: &AsyncMutex<()>,
	) -> Result<DynamicSecret> {
		let _singleflight = guard.lock().await;

		// Another caller may have refreshed the entry while this one waited on the guard.
		if let Some(secret) = self.lookup(key, now) {
			self.stats.record(CacheOutcome::Hit);

			return Ok(secret);
		}

		self.stats.record(CacheOutcome::Miss);

		let secret = self.fetch(key, fetcher).await?;

		self.store(key.clone(), secret.clone(), now);

		Ok(secret)
	}

	async fn fetch(&self, key: &SecretKey, fetcher: &dyn SecretFetcher) -> Result<DynamicSecret> {
		const KIND: CallKind = CallKind::SecretFetch;

		let method = key.method();
		let span = CallSpan::new(KIND, &method, &key.pathname);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(fetcher.fetch(&method, &key.pathname)).await;

		match result {
			Ok(secret) => {
				obs::record_call_outcome(KIND, CallOutcome::Success);

				Ok(secret)
			},
			Err(e) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);
				self.stats.record_failure();

				Err(Error::secret_fetch(e))
			},
		}
	}

	fn guard(&self, key: &SecretKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	fn release_guard(&self, key: &SecretKey, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.guards.lock();

		// Waiters clone the guard under this lock, so a count of two means only the map and
		// this caller still reference it.
		if Arc::strong_count(&guard) == 2
			&& guards.get(key).is_some_and(|current| Arc::ptr_eq(current, &guard))
		{
			guards.remove(key);
		}
	}
}
impl Default for SecretCache {
	fn default() -> Self {
		Self::new()
	}
}
