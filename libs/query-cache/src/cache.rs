use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{watch, Mutex};
use tracing::{debug, trace};

use crate::{QueryState, Tag};

pub type BoxFetch<V, E> = BoxFuture<'static, Result<V, E>>;

/// Produces a fresh fetch of one query. Called again on every re-fetch.
pub type Fetcher<V, E> = Arc<dyn Fn() -> BoxFetch<V, E> + Send + Sync>;

const NEVER: u64 = u64::MAX;

struct Entry<V, E> {
    tags: Vec<Tag>,
    fetcher: Fetcher<V, E>,
    state: watch::Sender<QueryState<V, E>>,
    /// Bumped on every invalidation touching this entry.
    generation: AtomicU64,
    /// Generation the current `Success` value was fetched under.
    fetched_generation: AtomicU64,
    subscribers: AtomicUsize,
    /// One fetch at a time per entry; waiters re-check freshness.
    fetch_gate: Mutex<()>,
}

impl<V, E> Entry<V, E>
where
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn new(tags: Vec<Tag>, fetcher: Fetcher<V, E>) -> Self {
        let (state, _) = watch::channel(QueryState::Uninitialized);
        Self {
            tags,
            fetcher,
            state,
            generation: AtomicU64::new(0),
            fetched_generation: AtomicU64::new(NEVER),
            subscribers: AtomicUsize::new(0),
            fetch_gate: Mutex::new(()),
        }
    }

    fn fresh_value(&self) -> Option<Arc<V>> {
        if self.fetched_generation.load(Ordering::Acquire)
            != self.generation.load(Ordering::Acquire)
        {
            return None;
        }
        match &*self.state.borrow() {
            QueryState::Success(v) => Some(Arc::clone(v)),
            _ => None,
        }
    }

    fn is_tagged_with_any(&self, tags: &[Tag]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }

    /// Cached value if fresh, otherwise fetch (joining an in-flight fetch).
    async fn load(&self) -> Result<Arc<V>, E> {
        if let Some(v) = self.fresh_value() {
            trace!("query cache hit");
            return Ok(v);
        }

        let _gate = self.fetch_gate.lock().await;
        if let Some(v) = self.fresh_value() {
            trace!("query refreshed while waiting");
            return Ok(v);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let previous = self.state.borrow().data().cloned();
        self.state.send_replace(QueryState::Loading { previous });

        match (self.fetcher)().await {
            Ok(v) => {
                let v = Arc::new(v);
                self.fetched_generation.store(generation, Ordering::Release);
                self.state.send_replace(QueryState::Success(Arc::clone(&v)));
                Ok(v)
            }
            Err(e) => {
                self.state.send_replace(QueryState::Failed(e.clone()));
                Err(e)
            }
        }
    }
}

/// Cache of query results keyed by `K`, invalidated by [`Tag`].
pub struct QueryCache<K, V, E> {
    entries: DashMap<K, Arc<Entry<V, E>>>,
}

impl<K, V, E> Default for QueryCache<K, V, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, V, E> QueryCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the entry for `key`. With `mount`, the subscriber count
    /// is bumped while the slot is still locked so eviction cannot race it.
    fn entry(&self, key: K, tags: &[Tag], fetcher: Fetcher<V, E>, mount: bool) -> Arc<Entry<V, E>> {
        let slot = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(Entry::new(tags.to_vec(), fetcher)));
        if mount {
            slot.value().subscribers.fetch_add(1, Ordering::AcqRel);
        }
        Arc::clone(slot.value())
    }

    /// Return the cached value for `key` while fresh; otherwise run the
    /// fetcher, store the result under `tags` and return it.
    ///
    /// The fetcher registered by the first call for a key is the one used for
    /// every later (re-)fetch of that key.
    pub async fn query(&self, key: K, tags: &[Tag], fetcher: Fetcher<V, E>) -> Result<Arc<V>, E> {
        debug!(?key, "query");
        self.entry(key, tags, fetcher, false).load().await
    }

    /// Mount a query: the returned subscription sees every state transition
    /// and keeps the entry eligible for background re-fetch on invalidation.
    ///
    /// Starts a fetch if the entry is not fresh. Must be called inside a
    /// tokio runtime.
    pub fn subscribe(&self, key: K, tags: &[Tag], fetcher: Fetcher<V, E>) -> QuerySubscription<V, E> {
        let entry = self.entry(key.clone(), tags, fetcher, true);
        let rx = entry.state.subscribe();

        if entry.fresh_value().is_none() {
            debug!(?key, "mounting stale query, fetching");
            spawn_load(Arc::clone(&entry));
        }

        QuerySubscription { entry, rx }
    }

    /// Mark every entry carrying one of `tags` stale and schedule one
    /// background re-fetch for each entry that has subscribers. Entries with
    /// no subscribers are evicted; the next `query` fetches them afresh.
    ///
    /// Returns the number of re-fetches scheduled. Must be called inside a
    /// tokio runtime.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let affected: Vec<(K, Arc<Entry<V, E>>)> = self
            .entries
            .iter()
            .filter(|item| item.value().is_tagged_with_any(tags))
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect();

        let mut refetches = 0;
        let mut evicted = 0;
        for (key, entry) in affected {
            entry.generation.fetch_add(1, Ordering::AcqRel);
            if entry.subscribers.load(Ordering::Acquire) > 0 {
                spawn_load(entry);
                refetches += 1;
                continue;
            }
            let unmounted = self.entries.remove_if(&key, |_, current| {
                Arc::ptr_eq(current, &entry) && current.subscribers.load(Ordering::Acquire) == 0
            });
            match unmounted {
                Some(_) => evicted += 1,
                // Mounted between the check and the removal.
                None if entry.subscribers.load(Ordering::Acquire) > 0 => {
                    spawn_load(entry);
                    refetches += 1;
                }
                None => {}
            }
        }

        debug!(?tags, refetches, evicted, "invalidated tags");
        refetches
    }

    /// Current state of `key` without triggering a fetch.
    pub fn peek(&self, key: &K) -> Option<QueryState<V, E>> {
        self.entries
            .get(key)
            .map(|e| e.value().state.borrow().clone())
    }

    /// Whether `key` holds a value that no invalidation has touched since it was fetched.
    pub fn is_fresh(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.value().fresh_value().is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn spawn_load<V, E>(entry: Arc<Entry<V, E>>)
where
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        // Failures are published through the watch channel.
        let _ = entry.load().await;
    });
}

/// A mounted query. Dropping it unmounts the query; an in-flight fetch is not
/// cancelled.
pub struct QuerySubscription<V, E> {
    entry: Arc<Entry<V, E>>,
    rx: watch::Receiver<QueryState<V, E>>,
}

impl<V, E> QuerySubscription<V, E>
where
    V: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn current(&self) -> QueryState<V, E> {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change and return the new state.
    pub async fn changed(&mut self) -> Option<QueryState<V, E>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until a fetch completes (success or failure) after the last observed state.
    pub async fn next_settled(&mut self) -> Option<QueryState<V, E>> {
        loop {
            let state = self.changed().await?;
            if state.is_settled() {
                return Some(state);
            }
        }
    }

    /// Force a fetch if the entry is stale; a fresh value is returned as-is.
    pub async fn refetch(&self) -> Result<Arc<V>, E> {
        self.entry.load().await
    }
}

impl<V, E> Drop for QuerySubscription<V, E> {
    fn drop(&mut self) {
        self.entry.subscribers.fetch_sub(1, Ordering::AcqRel);
    }
}
