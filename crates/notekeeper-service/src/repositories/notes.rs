use super::NoteStore;
use crate::errors::NkError;
use crate::models::{Note, NoteId};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug)]
struct NoteTable {
    next_id: NoteId,
    notes: BTreeMap<NoteId, Note>,
}

/// Note store held in process memory.
///
/// Ids are taken from a counter under the same write lock as the insert, so
/// they are strictly increasing and never reused.
#[derive(Debug)]
pub struct InMemoryNoteStore {
    table: RwLock<NoteTable>,
}

impl Default for InMemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(NoteTable {
                next_id: 1,
                notes: BTreeMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.notes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.notes.is_empty()
    }
}

#[async_trait::async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn create(&self, title: &str, content: &str) -> Result<Note, NkError> {
        let mut table = self.table.write().await;

        let id = table.next_id;
        table.next_id = id
            .checked_add(1)
            .ok_or_else(|| NkError::Store("note id space exhausted".to_string()))?;

        let note = Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
        };
        table.notes.insert(id, note.clone());

        tracing::debug!(target: "nk.repositories.notes", note_id = id, "Note stored");
        Ok(note)
    }

    async fn find_by_id(&self, id: NoteId) -> Result<Option<Note>, NkError> {
        Ok(self.table.read().await.notes.get(&id).cloned())
    }

    async fn find_all_ordered_by_id_desc(&self) -> Result<Vec<Note>, NkError> {
        Ok(self.table.read().await.notes.values().rev().cloned().collect())
    }
}

/// Instrumented note store for tests.
///
/// Wraps [`InMemoryNoteStore`] and adds per-method call counters, optional
/// read latency, a failure switch, and a gate that holds reads until released.
///
/// Only compiled for tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};

    pub struct CountingNoteStore {
        inner: InMemoryNoteStore,
        create_calls: AtomicUsize,
        find_by_id_calls: AtomicUsize,
        find_all_calls: AtomicUsize,
        read_latency: Option<Duration>,
        fail_reads: AtomicBool,
        read_gate: Option<Arc<Semaphore>>,
        read_started: Notify,
    }

    impl Default for CountingNoteStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CountingNoteStore {
        /// Store with no latency and no gate.
        pub fn new() -> Self {
            Self {
                inner: InMemoryNoteStore::new(),
                create_calls: AtomicUsize::new(0),
                find_by_id_calls: AtomicUsize::new(0),
                find_all_calls: AtomicUsize::new(0),
                read_latency: None,
                fail_reads: AtomicBool::new(false),
                read_gate: None,
                read_started: Notify::new(),
            }
        }

        /// Store whose reads sleep for `latency` before returning.
        pub fn with_latency(latency: Duration) -> Self {
            Self {
                read_latency: Some(latency),
                ..Self::new()
            }
        }

        /// Store whose reads snapshot the data, then block until
        /// [`release_reads`](Self::release_reads) hands out a permit.
        pub fn gated() -> Self {
            Self {
                read_gate: Some(Arc::new(Semaphore::new(0))),
                ..Self::new()
            }
        }

        /// Let `n` blocked (or future) reads proceed.
        pub fn release_reads(&self, n: usize) {
            if let Some(gate) = &self.read_gate {
                gate.add_permits(n);
            }
        }

        /// Wait until a read has taken its snapshot.
        pub async fn read_started(&self) {
            self.read_started.notified().await;
        }

        /// Make subsequent reads fail with `NkError::Store`.
        pub fn set_failing(&self, failing: bool) {
            self.fail_reads.store(failing, Ordering::SeqCst);
        }

        /// Insert directly into the backing store without counting the call.
        pub async fn seed(&self, title: &str, content: &str) -> Result<Note, NkError> {
            self.inner.create(title, content).await
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn find_by_id_calls(&self) -> usize {
            self.find_by_id_calls.load(Ordering::SeqCst)
        }

        pub fn find_all_calls(&self) -> usize {
            self.find_all_calls.load(Ordering::SeqCst)
        }

        async fn before_return(&self) -> Result<(), NkError> {
            self.read_started.notify_one();

            if let Some(latency) = self.read_latency {
                tokio::time::sleep(latency).await;
            }

            if let Some(gate) = &self.read_gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|_| NkError::Store("read gate closed".to_string()))?;
                permit.forget();
            }

            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(NkError::Store("Mock note store failure".to_string()));
            }

            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl NoteStore for CountingNoteStore {
        async fn create(&self, title: &str, content: &str) -> Result<Note, NkError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(title, content).await
        }

        async fn find_by_id(&self, id: NoteId) -> Result<Option<Note>, NkError> {
            self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
            let snapshot = self.inner.find_by_id(id).await?;
            self.before_return().await?;
            Ok(snapshot)
        }

        async fn find_all_ordered_by_id_desc(&self) -> Result<Vec<Note>, NkError> {
            self.find_all_calls.fetch_add(1, Ordering::SeqCst);
            let snapshot = self.inner.find_all_ordered_by_id_desc().await?;
            self.before_return().await?;
            Ok(snapshot)
        }
    }
}
