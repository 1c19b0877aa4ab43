//! In-process document store
//!
//! Collections live in memory behind a lock. Every write bumps a version on a
//! `watch` channel; each live subscription runs as its own task, re-evaluates
//! its query when the version moves, and pushes a snapshot only when the
//! result actually changed.

use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore, LiveFeed, QuerySpec, Snapshot};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

type Collection = BTreeMap<String, Map<String, Value>>;

struct Inner {
    collections: RwLock<HashMap<String, Collection>>,
    version: watch::Sender<u64>,
    active_subscriptions: AtomicUsize,
}

/// Shared in-memory store; clones share the same data
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                collections: RwLock::new(HashMap::new()),
                version,
                active_subscriptions: AtomicUsize::new(0),
            }),
        }
    }

    fn poisoned() -> Error {
        Error::Transport("in-memory store lock poisoned".to_string())
    }

    fn notify(&self) {
        self.inner.version.send_modify(|v| *v += 1);
    }

    /// Insert or replace many documents with a single change notification
    pub fn load(&self, collection: &str, documents: impl IntoIterator<Item = Document>) -> Result<usize> {
        let count = {
            let mut collections = self.inner.collections.write().map_err(|_| Self::poisoned())?;
            let target = collections.entry(collection.to_string()).or_default();
            let mut count = 0;
            for doc in documents {
                target.insert(doc.id, doc.data);
                count += 1;
            }
            count
        };
        self.notify();
        debug!(collection, count, "Loaded documents");
        Ok(count)
    }

    /// Add a document under a fresh id, returning the id
    pub async fn add(&self, collection: &str, data: Map<String, Value>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write(collection, &id, data).await?;
        Ok(id)
    }

    /// Get a single document
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.inner.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> Result<usize> {
        let collections = self.inner.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections.get(collection).map_or(0, |c| c.len()))
    }

    /// Names of all collections holding at least one document
    pub fn collections(&self) -> Result<Vec<String>> {
        let collections = self.inner.collections.read().map_err(|_| Self::poisoned())?;
        let mut names: Vec<String> = collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Number of live subscriptions whose delivery task is still running
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active_subscriptions.load(Ordering::SeqCst)
    }

    /// Evaluate a query against the current data, ordered by its key
    fn evaluate(&self, spec: &QuerySpec) -> Result<Snapshot> {
        let collections = self.inner.collections.read().map_err(|_| Self::poisoned())?;
        let Some(docs) = collections.get(&spec.collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(String, Document)> = docs
            .iter()
            .filter_map(|(id, data)| {
                let doc = Document::new(id.clone(), data.clone());
                let key = spec.sort_key(&doc)?.to_string();
                Some((key, doc))
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

        Ok(hits.into_iter().map(|(_, doc)| doc).collect())
    }
}

/// Decrements the active subscription count when a delivery task ends
struct SubscriptionGuard(Arc<Inner>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.active_subscriptions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DocumentStore for InMemoryStore {
    /// Spawns the delivery task, so this must be called inside a Tokio runtime
    fn subscribe(&self, spec: QuerySpec, cancel: CancellationToken) -> Result<LiveFeed> {
        let (tx, feed) = LiveFeed::channel(cancel.clone());
        let mut changes = self.inner.version.subscribe();
        let store = self.clone();

        self.inner.active_subscriptions.fetch_add(1, Ordering::SeqCst);
        let guard = SubscriptionGuard(self.inner.clone());

        debug!(
            collection = %spec.collection,
            start = %spec.start_at,
            end = %spec.end_at,
            "Opening subscription"
        );

        tokio::spawn(async move {
            let _guard = guard;
            let mut last: Option<Snapshot> = None;

            loop {
                match store.evaluate(&spec) {
                    Ok(snapshot) => {
                        if last.as_ref() != Some(&snapshot) {
                            trace!(start = %spec.start_at, size = snapshot.len(), "Pushing snapshot");
                            if tx.send(Ok(snapshot.clone())).is_err() {
                                break;
                            }
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            debug!(start = %spec.start_at, "Subscription closed");
        });

        Ok(feed)
    }

    async fn fetch(&self, spec: &QuerySpec) -> Result<Snapshot> {
        self.evaluate(spec)
    }

    async fn write(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<()> {
        {
            let mut collections = self.inner.collections.write().map_err(|_| Self::poisoned())?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
        self.notify();
        trace!(collection, id, "Wrote document");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let removed = {
            let mut collections = self.inner.collections.write().map_err(|_| Self::poisoned())?;
            collections
                .get_mut(collection)
                .and_then(|c| c.remove(id))
                .is_some()
        };
        if removed {
            self.notify();
            trace!(collection, id, "Deleted document");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::range_query;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("document data must be an object"),
        }
    }

    fn spec() -> QuerySpec {
        range_query("places", "pos.geohash", "dppn", "dppn~")
    }

    async fn wait_for_idle(store: &InMemoryStore) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.active_subscriptions() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscriptions did not shut down");
    }

    #[tokio::test]
    async fn test_write_get_delete() {
        let store = InMemoryStore::new();
        store.write("places", "a", data(json!({"name": "A"}))).await.unwrap();
        assert_eq!(store.len("places").unwrap(), 1);
        assert_eq!(store.get("places", "a").unwrap().unwrap().data["name"], "A");

        store.delete("places", "a").await.unwrap();
        store.delete("places", "a").await.unwrap();
        assert!(store.get("places", "a").unwrap().is_none());
        assert_eq!(store.len("missing").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_generates_id() {
        let store = InMemoryStore::new();
        let id = store.add("places", data(json!({"name": "A"}))).await.unwrap();
        assert!(!id.is_empty());
        assert!(store.get("places", &id).unwrap().is_some());
        assert_eq!(store.collections().unwrap(), vec!["places".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_orders_by_key() {
        let store = InMemoryStore::new();
        store
            .load(
                "places",
                [
                    Document::new("z", data(json!({"pos": {"geohash": "dppn9"}}))),
                    Document::new("y", data(json!({"pos": {"geohash": "dppn1"}}))),
                    Document::new("x", data(json!({"pos": {"geohash": "dpq00"}}))),
                ],
            )
            .unwrap();

        let ids: Vec<String> = store.fetch(&spec()).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["y", "z"]);
    }

    #[tokio::test]
    async fn test_subscription_pushes_changes_only() {
        let store = InMemoryStore::new();
        let mut feed = store.subscribe(spec(), CancellationToken::new()).unwrap();

        assert!(feed.next().await.unwrap().unwrap().is_empty());

        // outside the range: no snapshot expected
        store.write("places", "far", data(json!({"pos": {"geohash": "u4pr"}}))).await.unwrap();
        // inside the range
        store.write("places", "near", data(json!({"pos": {"geohash": "dppn7"}}))).await.unwrap();

        let snapshot = feed.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "near");

        store.delete("places", "near").await.unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery_task() {
        let store = InMemoryStore::new();
        let token = CancellationToken::new();
        let feeds: Vec<LiveFeed> = (0..3)
            .map(|_| store.subscribe(spec(), token.child_token()).unwrap())
            .collect();
        assert_eq!(store.active_subscriptions(), 3);

        token.cancel();
        wait_for_idle(&store).await;
        for feed in &feeds {
            assert!(feed.is_cancelled());
        }
    }

    #[tokio::test]
    async fn test_drop_feed_stops_delivery_task() {
        let store = InMemoryStore::new();
        let feed = store.subscribe(spec(), CancellationToken::new()).unwrap();
        assert_eq!(store.active_subscriptions(), 1);
        drop(feed);
        wait_for_idle(&store).await;
    }
}
