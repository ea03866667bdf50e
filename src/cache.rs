//! TTL-bounded memoization of offer lookups.
//!
//! Entries expire lazily: a lookup ignores stale entries without removing them and the next
//! store for the key overwrites them. Reads never mutate the map. Payload and timestamp live
//! in one [`CacheEntry`] that is swapped under the write lock, so readers never see a torn
//! entry.

// self
use crate::{_prelude::*, model::Offer};

/// Offers cache TTL unless configured otherwise.
pub const DEFAULT_OFFERS_TTL: Duration = Duration::seconds(60);

/// A cached offers payload and the instant it was stored.
#[derive(Clone, Debug)]
pub struct CacheEntry {
	offers: Arc<[Offer]>,
	stored_at: OffsetDateTime,
}
impl CacheEntry {
	/// Cached payload.
	pub fn offers(&self) -> &[Offer] {
		&self.offers
	}

	/// Instant the payload was stored.
	pub fn stored_at(&self) -> OffsetDateTime {
		self.stored_at
	}

	/// Returns `true` while the entry is younger than `ttl` at `now`.
	pub fn is_fresh_at(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		now - self.stored_at < ttl
	}
}

/// Per-client offers cache keyed by product identifier.
///
/// A zero TTL builds a disabled cache that allocates no map: lookups always miss and stores
/// are dropped.
#[derive(Debug)]
pub struct OffersCache(CacheMode);
impl OffersCache {
	/// Creates a cache whose entries stay fresh for `ttl`; zero or negative disables it.
	pub fn new(ttl: Duration) -> Self {
		if ttl.is_positive() {
			Self(CacheMode::Enabled { ttl, entries: RwLock::new(HashMap::new()) })
		} else {
			Self(CacheMode::Disabled)
		}
	}

	/// Creates a cache that never stores anything.
	pub fn disabled() -> Self {
		Self(CacheMode::Disabled)
	}

	/// Returns `false` for the bypass variant.
	pub fn is_enabled(&self) -> bool {
		matches!(self.0, CacheMode::Enabled { .. })
	}

	/// Configured TTL, or `None` when caching is disabled.
	pub fn ttl(&self) -> Option<Duration> {
		match &self.0 {
			CacheMode::Enabled { ttl, .. } => Some(*ttl),
			CacheMode::Disabled => None,
		}
	}

	/// Returns the fresh payload for `product_id`, if any.
	pub fn lookup(&self, product_id: Uuid) -> Option<Vec<Offer>> {
		self.lookup_at(product_id, OffsetDateTime::now_utc())
	}

	/// Same as [`lookup`](Self::lookup) with an explicit clock reading.
	pub fn lookup_at(&self, product_id: Uuid, now: OffsetDateTime) -> Option<Vec<Offer>> {
		let CacheMode::Enabled { ttl, entries } = &self.0 else {
			return None;
		};

		entries
			.read()
			.get(&product_id)
			.filter(|entry| entry.is_fresh_at(now, *ttl))
			.map(|entry| entry.offers.to_vec())
	}

	/// Stores `offers` for `product_id`, replacing any previous entry.
	pub fn store(&self, product_id: Uuid, offers: Vec<Offer>) {
		self.store_at(product_id, offers, OffsetDateTime::now_utc());
	}

	/// Same as [`store`](Self::store) with an explicit clock reading.
	pub fn store_at(&self, product_id: Uuid, offers: Vec<Offer>, now: OffsetDateTime) {
		let CacheMode::Enabled { entries, .. } = &self.0 else {
			return;
		};
		let entry = CacheEntry { offers: offers.into(), stored_at: now };

		entries.write().insert(product_id, entry);
	}

	/// Raw entry for `product_id`, fresh or not.
	pub fn entry(&self, product_id: Uuid) -> Option<CacheEntry> {
		match &self.0 {
			CacheMode::Enabled { entries, .. } => entries.read().get(&product_id).cloned(),
			CacheMode::Disabled => None,
		}
	}

	/// Number of stored entries, including expired ones not yet overwritten.
	pub fn len(&self) -> usize {
		match &self.0 {
			CacheMode::Enabled { entries, .. } => entries.read().len(),
			CacheMode::Disabled => 0,
		}
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl Default for OffersCache {
	fn default() -> Self {
		Self::new(DEFAULT_OFFERS_TTL)
	}
}

#[derive(Debug)]
enum CacheMode {
	Disabled,
	Enabled { ttl: Duration, entries: RwLock<HashMap<Uuid, CacheEntry>> },
}
