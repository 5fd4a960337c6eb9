use crate::subset::SubsetIndex;
use crate::{CacheConfig, SubsetMatch, WriterId};
use futures::channel::oneshot;
use futures::future::{ready, BoxFuture};
use futures::FutureExt;
use lru::LruCache;
use parking_lot::Mutex;
use rdf_weave_model::{Bgp, Binding};
use rdf_weave_stage::StageEngine;
use std::sync::Arc;
use std::time::Instant;

/// Resolves to the bindings of a cache entry once it is committed.
///
/// If the entry is deleted before its commit, the future resolves to an empty sequence.
pub type CachedBindings = BoxFuture<'static, Arc<Vec<Binding>>>;

/// The outcome of waiting for a cache entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheRead {
    /// The entry was committed with the given bindings.
    Committed(Arc<Vec<Binding>>),
    /// The entry was deleted before it was committed.
    Vanished,
}

type Reader = oneshot::Sender<CacheRead>;

/// A semantic cache that maps BGPs to their solution sequences.
///
/// # Writers
///
/// An entry is created by the first [BgpCache::update] (or [BgpCache::begin]) for a BGP and is
/// owned by the writer that created it. Only the owner can append to, commit, or delete the
/// entry. Calls by other writers are silently ignored, such that a second execution of the same
/// BGP simply proceeds without caching.
///
/// # Visibility
///
/// Readers never observe a partially built entry. [BgpCache::get] on an entry that is still
/// being built returns a future that resolves once the owner commits or deletes the entry. There
/// is no timeout: a writer that neither commits nor deletes leaves its readers waiting forever.
///
/// # Eviction
///
/// The sum of the binding counts of all entries is bounded by [CacheConfig::max_size]. Once the
/// bound is exceeded, committed entries are evicted in least-recently-used order. Committed
/// entries also expire after [CacheConfig::ttl]. Entries that are still being built are never
/// evicted.
pub struct BgpCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

/// The entries and the subset index. Both are always updated in the same critical section.
struct CacheState {
    entries: LruCache<String, CacheEntry>,
    index: SubsetIndex,
    size: usize,
}

struct CacheEntry {
    bgp: Bgp,
    items: Arc<Vec<Binding>>,
    writer: WriterId,
    status: EntryStatus,
}

enum EntryStatus {
    Building { readers: Vec<Reader> },
    Committed { at: Instant },
}

impl CacheEntry {
    fn is_committed(&self) -> bool {
        matches!(self.status, EntryStatus::Committed { .. })
    }
}

impl BgpCache {
    /// Creates a new empty [BgpCache].
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                index: SubsetIndex::default(),
                size: 0,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns whether an entry (committed or not) exists for `bgp`.
    pub fn has(&self, bgp: &Bgp) -> bool {
        let mut state = self.state.lock();
        state.purge_expired(&self.config);
        state.entries.contains(&bgp.cache_key())
    }

    /// Returns the number of entries.
    pub fn count(&self) -> usize {
        let mut state = self.state.lock();
        state.purge_expired(&self.config);
        state.entries.len()
    }

    /// Returns the sum of the binding counts of all entries.
    pub fn size(&self) -> usize {
        let mut state = self.state.lock();
        state.purge_expired(&self.config);
        state.size
    }

    /// Creates an empty entry for `bgp` owned by `writer` if there is no entry yet.
    ///
    /// Returns whether `writer` owns an entry that is still being built afterward.
    pub fn begin(&self, bgp: &Bgp, writer: WriterId) -> bool {
        let key = bgp.cache_key();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.purge_expired(&self.config);

        match state.entries.peek(&key) {
            Some(entry) => entry.writer == writer && !entry.is_committed(),
            None => {
                tracing::trace!(%writer, bgp = %key, "Creating cache entry");
                state.insert(key, bgp.clone(), writer);
                true
            }
        }
    }

    /// Appends `item` to the entry of `bgp`.
    ///
    /// Creates the entry if it does not exist. Does nothing if the entry is owned by a different
    /// writer or is already committed.
    pub fn update(&self, bgp: &Bgp, item: Binding, writer: WriterId) {
        let key = bgp.cache_key();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.entries.peek_mut(&key) {
            Some(entry) if entry.writer == writer && !entry.is_committed() => {
                Arc::make_mut(&mut entry.items).push(item);
                state.size += 1;
            }
            Some(entry) => {
                tracing::trace!(
                    %writer,
                    owner = %entry.writer,
                    bgp = %key,
                    "Ignoring cache update of a foreign or committed entry"
                );
                return;
            }
            None => {
                tracing::trace!(%writer, bgp = %key, "Creating cache entry");
                let entry = state.insert(key, bgp.clone(), writer);
                Arc::make_mut(&mut entry.items).push(item);
                state.size += 1;
            }
        }

        state.evict_overflow(&self.config);
    }

    /// Marks the entry of `bgp` as complete and hands its bindings to all waiting readers.
    ///
    /// Does nothing if the entry does not exist or is owned by a different writer.
    pub fn commit(&self, bgp: &Bgp, writer: WriterId) {
        let key = bgp.cache_key();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.entries.peek_mut(&key) else {
            return;
        };
        if entry.writer != writer {
            tracing::trace!(%writer, owner = %entry.writer, bgp = %key, "Ignoring foreign commit");
            return;
        }

        let status = std::mem::replace(
            &mut entry.status,
            EntryStatus::Committed { at: Instant::now() },
        );
        if let EntryStatus::Building { readers } = status {
            tracing::debug!(bgp = %key, size = entry.items.len(), "Committed cache entry");
            for reader in readers {
                // A dropped reader is no longer interested in the result.
                drop(reader.send(CacheRead::Committed(Arc::clone(&entry.items))));
            }
        }

        state.evict_overflow(&self.config);
    }

    /// Removes the entry of `bgp`. Readers that wait for the entry resolve with an empty result.
    ///
    /// Does nothing if the entry is owned by a different writer.
    pub fn delete(&self, bgp: &Bgp, writer: WriterId) {
        let key = bgp.cache_key();
        let mut state = self.state.lock();

        let owned = state
            .entries
            .peek(&key)
            .is_some_and(|entry| entry.writer == writer);
        if owned {
            tracing::debug!(%writer, bgp = %key, "Deleting cache entry");
            state.remove(&key);
        }
    }

    /// Removes all entries. Readers that wait for an entry resolve with an empty result.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let keys = state
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();
        for key in keys {
            state.remove(&key);
        }
    }

    /// Returns the bindings of `bgp` or [None] if there is no entry.
    ///
    /// The returned future resolves once the entry is committed. If the entry is deleted before
    /// its commit, the future resolves to an empty sequence.
    pub fn get(&self, bgp: &Bgp) -> Option<CachedBindings> {
        let read = self.read(bgp)?;
        Some(
            read.map(|read| match read {
                CacheRead::Committed(items) => items,
                CacheRead::Vanished => Arc::new(Vec::new()),
            })
            .boxed(),
        )
    }

    /// Like [BgpCache::get] but distinguishes committed entries from vanished ones.
    pub fn read(&self, bgp: &Bgp) -> Option<BoxFuture<'static, CacheRead>> {
        let key = bgp.cache_key();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.purge_expired(&self.config);

        // Reading refreshes the recency of the entry.
        let entry = state.entries.get_mut(&key)?;
        match &mut entry.status {
            EntryStatus::Committed { .. } => {
                Some(ready(CacheRead::Committed(Arc::clone(&entry.items))).boxed())
            }
            EntryStatus::Building { readers } => {
                let (sender, receiver) = oneshot::channel();
                readers.push(sender);
                Some(
                    receiver
                        .map(|read| read.unwrap_or(CacheRead::Vanished))
                        .boxed(),
                )
            }
        }
    }

    /// Returns a stage over the bindings of `bgp`.
    ///
    /// If there is no entry for `bgp`, or the entry vanishes before it is committed, the stage
    /// continues with the stage returned by `fallback`.
    pub fn get_as_stage<E, F>(&self, engine: &E, bgp: &Bgp, fallback: F) -> E::Stage<Binding>
    where
        E: StageEngine,
        F: FnOnce() -> E::Stage<Binding> + Send + 'static,
    {
        let Some(read) = self.read(bgp) else {
            tracing::debug!(bgp = %bgp, "Cache entry is gone, evaluating directly");
            return fallback();
        };

        let inner = engine.clone();
        let bgp = bgp.clone();
        let mut fallback = Some(fallback);
        engine.merge_map(engine.from_future(read.map(Ok)), move |read| match read {
            CacheRead::Committed(items) => inner.of(Arc::unwrap_or_clone(items)),
            CacheRead::Vanished => {
                tracing::debug!(bgp = %bgp, "Cache entry vanished before commit, evaluating directly");
                fallback.take().map_or_else(|| inner.empty(), |fallback| fallback())
            }
        })
    }

    /// Returns the largest cached BGP whose patterns are all contained in `bgp`.
    ///
    /// Only BGPs that target the same graph are considered. Ties are broken by the smallest cache
    /// key.
    pub fn find_subset(&self, bgp: &Bgp) -> SubsetMatch {
        let key = bgp.cache_key();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.purge_expired(&self.config);

        if state.entries.contains(&key) {
            return SubsetMatch {
                subset: bgp.patterns().to_vec(),
                missing: Vec::new(),
            };
        }

        let best = state
            .index
            .candidates(bgp)
            .into_iter()
            .filter_map(|key| state.entries.peek(key).map(|entry| (key, &entry.bgp)))
            .filter(|(_, cached)| {
                cached.graph() == bgp.graph()
                    && !cached.is_empty()
                    && cached
                        .patterns()
                        .iter()
                        .all(|pattern| bgp.contains_pattern(pattern))
            })
            .max_by(|(lhs_key, lhs), (rhs_key, rhs)| {
                lhs.len()
                    .cmp(&rhs.len())
                    .then_with(|| rhs_key.cmp(lhs_key))
            });

        match best {
            None => SubsetMatch::none(bgp),
            Some((_, cached)) => SubsetMatch {
                subset: cached.patterns().to_vec(),
                missing: bgp
                    .patterns()
                    .iter()
                    .filter(|pattern| !cached.contains_pattern(pattern))
                    .cloned()
                    .collect(),
            },
        }
    }
}

impl Default for BgpCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for BgpCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BgpCache")
            .field("config", &self.config)
            .field("entries", &state.entries.len())
            .field("size", &state.size)
            .finish()
    }
}

impl CacheState {
    fn insert(&mut self, key: String, bgp: Bgp, writer: WriterId) -> &mut CacheEntry {
        self.index.insert(&key, &bgp);
        let entry = CacheEntry {
            bgp,
            items: Arc::new(Vec::new()),
            writer,
            status: EntryStatus::Building {
                readers: Vec::new(),
            },
        };
        self.entries.get_or_insert_mut(key, || entry)
    }

    /// Removes an entry together with its footprint in the subset index.
    fn remove(&mut self, key: &str) {
        let Some(entry) = self.entries.pop(key) else {
            return;
        };
        self.index.remove(key, &entry.bgp);
        self.size -= entry.items.len();

        if let EntryStatus::Building { readers } = entry.status {
            for reader in readers {
                drop(reader.send(CacheRead::Vanished));
            }
        }
    }

    /// Evicts committed entries in LRU order until the size bound holds again.
    fn evict_overflow(&mut self, config: &CacheConfig) {
        while self.size > config.max_size {
            let victim = self
                .entries
                .iter()
                .rev()
                .find(|(_, entry)| entry.is_committed())
                .map(|(key, _)| key.clone());
            let Some(victim) = victim else {
                break;
            };
            tracing::trace!(bgp = %victim, "Evicting cache entry");
            self.remove(&victim);
        }
    }

    fn purge_expired(&mut self, config: &CacheConfig) {
        let expired = self
            .entries
            .iter()
            .filter(|(_, entry)| match entry.status {
                EntryStatus::Committed { at } => at.elapsed() >= config.ttl,
                EntryStatus::Building { .. } => false,
            })
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();
        for key in expired {
            tracing::trace!(bgp = %key, "Cache entry expired");
            self.remove(&key);
        }
    }
}
