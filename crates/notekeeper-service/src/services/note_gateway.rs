//! Note create/read operations over the store and the cache.

use crate::errors::NkError;
use crate::models::{Note, NoteId};
use crate::observability::metrics;
use crate::repositories::NoteStore;
use crate::services::note_cache::NoteCache;
use std::sync::Arc;
use tracing::instrument;

pub struct NoteGateway {
    store: Arc<dyn NoteStore>,
    cache: Arc<NoteCache>,
}

impl NoteGateway {
    pub fn new(store: Arc<dyn NoteStore>, cache: Arc<NoteCache>) -> Self {
        Self { store, cache }
    }

    /// Store a note, then evict the cache before acknowledging the write.
    #[instrument(skip_all)]
    pub async fn create(&self, title: &str, content: &str) -> Result<Note, NkError> {
        let note = self.store.create(title, content).await.map_err(|e| {
            metrics::record_note_created("error");
            e
        })?;

        self.cache.invalidate_on_write();
        metrics::record_note_created("success");
        tracing::info!(target: "nk.services.notes", note_id = note.id, "Note created");

        Ok(note)
    }

    /// All notes, newest first.
    #[instrument(skip_all)]
    pub async fn get_all(&self) -> Result<Vec<Note>, NkError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_all(|| async move { store.find_all_ordered_by_id_desc().await })
            .await
    }

    #[instrument(skip_all, fields(note_id = id))]
    pub async fn get_by_id(&self, id: NoteId) -> Result<Note, NkError> {
        let store = Arc::clone(&self.store);
        self.cache
            .get_by_id(id, || async move { store.find_by_id(id).await })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repositories::notes::mock::CountingNoteStore;
    use crate::services::note_cache::CacheKey;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn gateway(store: Arc<CountingNoteStore>) -> (NoteGateway, Arc<NoteCache>) {
        let cache = Arc::new(NoteCache::new());
        (NoteGateway::new(store, Arc::clone(&cache)), cache)
    }

    #[tokio::test]
    async fn test_create_then_get_by_id() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, _) = gateway(Arc::clone(&store));

        let created = notes.create("T", "C").await.unwrap();
        assert_eq!(
            created,
            Note {
                id: 1,
                title: "T".to_string(),
                content: "C".to_string()
            }
        );

        assert_eq!(notes.get_by_id(1).await.unwrap(), created);
        assert_eq!(notes.get_by_id(1).await.unwrap(), created);
        assert_eq!(store.find_by_id_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_stale_aggregate_after_create() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, _) = gateway(Arc::clone(&store));
        notes.create("first", "C").await.unwrap();

        let before = notes.get_all().await.unwrap();
        let created = notes.create("second", "C").await.unwrap();
        let after = notes.get_all().await.unwrap();

        assert_ne!(before, after);
        assert_eq!(after.first(), Some(&created));
        assert_eq!(after.len(), 2);
        assert_eq!(store.find_all_calls(), 2);
    }

    #[tokio::test]
    async fn test_sequential_get_all_hits_store_once() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, _) = gateway(Arc::clone(&store));

        notes.get_all().await.unwrap();
        notes.get_all().await.unwrap();

        assert_eq!(store.find_all_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_evicts_unrelated_ids() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, cache) = gateway(Arc::clone(&store));
        notes.create("T", "C").await.unwrap();

        notes.get_by_id(1).await.unwrap();
        assert!(cache.is_cached(CacheKey::NoteById(1)));

        notes.create("T2", "C2").await.unwrap();
        assert!(!cache.is_cached(CacheKey::NoteById(1)));

        notes.get_by_id(1).await.unwrap();
        assert_eq!(store.find_by_id_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_note_is_not_found_every_time() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, _) = gateway(Arc::clone(&store));

        assert!(matches!(notes.get_by_id(42).await, Err(NkError::NotFound(42))));
        assert!(matches!(notes.get_by_id(42).await, Err(NkError::NotFound(42))));
        assert_eq!(store.find_by_id_calls(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_unmodified() {
        let store = Arc::new(CountingNoteStore::new());
        let (notes, cache) = gateway(Arc::clone(&store));
        store.set_failing(true);

        let err = notes.get_all().await.unwrap_err();
        assert!(matches!(err, NkError::Store(msg) if msg == "Mock note store failure"));
        assert!(!cache.is_cached(CacheKey::AllNotes));

        store.set_failing(false);
        assert!(notes.get_all().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_by_id_calls_store_once() {
        const CALLERS: usize = 16;
        let store = Arc::new(CountingNoteStore::with_latency(Duration::from_millis(50)));
        store.seed("T", "C").await.unwrap();
        let notes = Arc::new(gateway(Arc::clone(&store)).0);
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let notes = Arc::clone(&notes);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    notes.get_by_id(1).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.find_by_id_calls(), 1);
        assert!(results.windows(2).all(|w| w.first() == w.last()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_read_started_before_write_does_not_repopulate_cache() {
        let store = Arc::new(CountingNoteStore::gated());
        let (notes, cache) = gateway(Arc::clone(&store));
        let notes = Arc::new(notes);

        let early_reader = {
            let notes = Arc::clone(&notes);
            tokio::spawn(async move { notes.get_all().await })
        };

        store.read_started().await;
        let created = notes.create("T", "C").await.unwrap();
        store.release_reads(2);

        // The early reader saw the pre-write snapshot...
        assert!(early_reader.await.unwrap().unwrap().is_empty());
        // ...but did not leave it in the cache
        assert!(!cache.is_cached(CacheKey::AllNotes));

        let after = notes.get_all().await.unwrap();
        assert_eq!(after, vec![created]);
        assert_eq!(store.find_all_calls(), 2);
    }
}
