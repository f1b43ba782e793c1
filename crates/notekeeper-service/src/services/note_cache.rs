//! Cache-aside layer over the note store.
//!
//! Two namespaces are cached: the full newest-first listing and one entry per
//! note id. Entries have no TTL; they live until [`NoteCache::invalidate_on_write`]
//! clears every namespace.
//!
//! # Concurrency
//!
//! Each key holds either a ready value or an in-flight load. Callers that miss
//! while a load is in flight join it instead of starting another, so the
//! store sees one load per key no matter how many callers miss at once.
//!
//! The mutex guards bookkeeping only and is never held across a store call.
//! A finished load is published only if its in-flight marker is still the
//! one in the slot. Eviction removes in-flight markers too, so a load that
//! started before a write can never repopulate the cache after that write's
//! eviction.
//!
//! Failed loads (including not-found) are handed to every waiter and then
//! dropped, never cached.
//!
//! If the task running a load is cancelled, the next waiter runs its own
//! loader in its place.

use crate::errors::NkError;
use crate::models::{Note, NoteId};
use crate::observability::metrics;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Cache key, one variant per namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllNotes,
    NoteById(NoteId),
}

impl CacheKey {
    /// Metrics and log label.
    pub fn namespace(self) -> &'static str {
        match self {
            CacheKey::AllNotes => "all",
            CacheKey::NoteById(_) => "by_id",
        }
    }
}

type Flight<V> = Arc<OnceCell<Result<V, NkError>>>;

enum Slot<V> {
    Ready(V),
    Loading(Flight<V>),
}

#[derive(Default)]
struct CacheState {
    // Singleton namespace, keyed by unit
    all: HashMap<(), Slot<Vec<Note>>>,
    by_id: HashMap<NoteId, Slot<Note>>,
}

type SlotSelector<K, V> = fn(&mut CacheState) -> &mut HashMap<K, Slot<V>>;

fn all_slots(state: &mut CacheState) -> &mut HashMap<(), Slot<Vec<Note>>> {
    &mut state.all
}

fn by_id_slots(state: &mut CacheState) -> &mut HashMap<NoteId, Slot<Note>> {
    &mut state.by_id
}

#[derive(Default)]
pub struct NoteCache {
    state: Mutex<CacheState>,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notes, loading through `loader` on a miss.
    pub async fn get_all<F, Fut>(&self, loader: F) -> Result<Vec<Note>, NkError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Note>, NkError>>,
    {
        self.get_or_load(CacheKey::AllNotes, (), all_slots, loader)
            .await
    }

    /// One note, loading through `loader` on a miss.
    ///
    /// A loader result of `None` becomes `NkError::NotFound(id)` and is not cached.
    pub async fn get_by_id<F, Fut>(&self, id: NoteId, loader: F) -> Result<Note, NkError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Note>, NkError>>,
    {
        self.get_or_load(CacheKey::NoteById(id), id, by_id_slots, move || async move {
            loader().await?.ok_or(NkError::NotFound(id))
        })
        .await
    }

    /// Evict every entry in every namespace, including in-flight loads.
    ///
    /// Once this returns, no later lookup observes data cached before the call.
    pub fn invalidate_on_write(&self) {
        let mut state = self.lock();
        let evicted = state.all.len() + state.by_id.len();
        state.all.clear();
        state.by_id.clear();
        drop(state);

        metrics::record_cache_eviction(evicted);
        tracing::debug!(target: "nk.services.note_cache", evicted, "Cache invalidated after write");
    }

    /// Whether `key` currently holds a ready value.
    pub fn is_cached(&self, key: CacheKey) -> bool {
        let state = self.lock();
        match key {
            CacheKey::AllNotes => matches!(state.all.get(&()), Some(Slot::Ready(_))),
            CacheKey::NoteById(id) => matches!(state.by_id.get(&id), Some(Slot::Ready(_))),
        }
    }

    /// Number of ready entries across all namespaces.
    pub fn ready_entries(&self) -> usize {
        let state = self.lock();
        let ready_all = state
            .all
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count();
        let ready_by_id = state
            .by_id
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count();
        ready_all + ready_by_id
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Slot bookkeeping is always left consistent, so a poisoned lock is safe to reuse
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn get_or_load<K, V, F, Fut>(
        &self,
        cache_key: CacheKey,
        key: K,
        select: SlotSelector<K, V>,
        loader: F,
    ) -> Result<V, NkError>
    where
        K: Eq + Hash + Copy,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, NkError>>,
    {
        let namespace = cache_key.namespace();

        let flight: Flight<V> = {
            let mut state = self.lock();
            match select(&mut *state).entry(key) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Ready(value) => {
                        metrics::record_cache_lookup(namespace, "hit");
                        return Ok(value.clone());
                    }
                    Slot::Loading(flight) => {
                        metrics::record_cache_lookup(namespace, "coalesced");
                        Arc::clone(flight)
                    }
                },
                Entry::Vacant(entry) => {
                    metrics::record_cache_lookup(namespace, "miss");
                    let flight = Arc::new(OnceCell::new());
                    entry.insert(Slot::Loading(Arc::clone(&flight)));
                    flight
                }
            }
        };

        let mut loaded_here = false;
        let result = flight
            .get_or_init(|| {
                loaded_here = true;
                async move {
                    let start = Instant::now();
                    let result = loader().await;
                    let status = if result.is_ok() { "success" } else { "error" };
                    metrics::record_cache_load(namespace, status, start.elapsed());
                    result
                }
            })
            .await
            .clone();

        if loaded_here {
            self.publish(cache_key, key, select, &flight, &result);
        }

        result
    }

    fn publish<K, V>(
        &self,
        cache_key: CacheKey,
        key: K,
        select: SlotSelector<K, V>,
        flight: &Flight<V>,
        result: &Result<V, NkError>,
    ) where
        K: Eq + Hash + Copy,
        V: Clone,
    {
        let mut state = self.lock();
        let slots = select(&mut *state);

        let still_current = matches!(
            slots.get(&key),
            Some(Slot::Loading(current)) if Arc::ptr_eq(current, flight)
        );

        if !still_current {
            if result.is_ok() {
                metrics::record_stale_load_discarded(cache_key.namespace());
                tracing::debug!(
                    target: "nk.services.note_cache",
                    key = ?cache_key,
                    "Load finished after eviction, result not cached"
                );
            }
            return;
        }

        match result {
            Ok(value) => {
                slots.insert(key, Slot::Ready(value.clone()));
            }
            Err(e) => {
                slots.remove(&key);
                tracing::debug!(
                    target: "nk.services.note_cache",
                    key = ?cache_key,
                    error = %e,
                    "Load failed, key left empty"
                );
            }
        }
    }
}
