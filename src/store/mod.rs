//! Document store interface
//!
//! The radius query engine never talks to a database directly. It needs three
//! things from a store: ordered range queries over a string field, live
//! subscriptions that push the full matching set on every change, and plain
//! writes/deletes for tagging records.
//!
//! ## Flex Point
//! Backing the engine with a new store requires implementing `DocumentStore`;
//! `memory::InMemoryStore` is the reference implementation.

pub mod memory;
pub mod seed;

use crate::error::{Error, Result};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A stored record: its id plus arbitrary JSON fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    /// Create a document
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Look up a dotted field path, e.g. `"pos.geohash"`
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }
}

/// Resolve a dotted path inside a JSON object
pub fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Full result set of a query at one moment
pub type Snapshot = Vec<Document>;

/// Filter applied to a query in addition to its ordered range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Constraint {
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field is an array containing value
    ArrayContains { field: String, value: Value },
}

impl Constraint {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ArrayContains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value` into an equality constraint
    ///
    /// The value is read as JSON when it parses (`rank=3`, `open=true`), otherwise
    /// as a plain string.
    pub fn parse_eq(s: &str) -> Result<Self> {
        let (field, value) = s
            .split_once('=')
            .filter(|(field, _)| !field.is_empty())
            .ok_or_else(|| Error::InvalidArgument(format!("Expected \"key=value\", got {:?}", s)))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        Ok(Self::eq(field, value))
    }

    /// Check whether a document satisfies this constraint
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Constraint::Eq { field, value } => doc.get(field) == Some(value),
            Constraint::ArrayContains { field, value } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// A range query over one collection, ordered by a string field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub collection: String,
    pub constraints: Vec<Constraint>,
    pub order_by: String,
    /// Inclusive lower bound
    pub start_at: String,
    /// Inclusive upper bound
    pub end_at: String,
}

/// Build a query for keys in `[start, end]` of `order_by`
pub fn range_query(
    collection: impl Into<String>,
    order_by: impl Into<String>,
    start: impl Into<String>,
    end: impl Into<String>,
) -> QuerySpec {
    QuerySpec {
        collection: collection.into(),
        constraints: Vec::new(),
        order_by: order_by.into(),
        start_at: start.into(),
        end_at: end.into(),
    }
}

impl QuerySpec {
    /// Add constraints evaluated before the range clause
    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// The ordering key of `doc`, if it falls inside the range and passes every constraint
    pub fn sort_key<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        if !self.constraints.iter().all(|c| c.matches(doc)) {
            return None;
        }
        let key = doc.get(&self.order_by)?.as_str()?;
        (key >= self.start_at.as_str() && key <= self.end_at.as_str()).then_some(key)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.sort_key(doc).is_some()
    }
}

/// Receiving end of a live subscription
///
/// Yields the full current snapshot on open and again after every change until
/// unsubscribed or dropped. An `Err` item ends the feed.
pub struct LiveFeed {
    receiver: mpsc::UnboundedReceiver<Result<Snapshot>>,
    cancel: CancellationToken,
}

impl LiveFeed {
    /// Wrap a channel; the store stops delivering once `cancel` fires
    pub fn new(receiver: mpsc::UnboundedReceiver<Result<Snapshot>>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    /// Create a feed and the sender a store delivers snapshots through
    pub fn channel(cancel: CancellationToken) -> (mpsc::UnboundedSender<Result<Snapshot>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, cancel))
    }

    /// Stop delivery and release the subscription; safe to call repeatedly
    pub fn unsubscribe(&mut self) {
        self.cancel.cancel();
        self.receiver.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for LiveFeed {
    type Item = Result<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Storage backend the radius query engine runs against
pub trait DocumentStore: Send + Sync + 'static {
    /// Open a live subscription for `spec`
    ///
    /// Delivery stops once `cancel` (or the feed's own unsubscribe) fires.
    fn subscribe(&self, spec: QuerySpec, cancel: CancellationToken) -> Result<LiveFeed>;

    /// Run `spec` once
    fn fetch(&self, spec: &QuerySpec) -> impl Future<Output = Result<Snapshot>> + Send;

    /// Create or replace a document
    fn write(
        &self,
        collection: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a document; deleting a missing id is not an error
    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(map) => Document::new(id, map),
            _ => panic!("document data must be an object"),
        }
    }

    #[test]
    fn test_lookup_nested() {
        let d = doc("a", json!({"pos": {"geohash": "dppn", "geopoint": {"latitude": 1.0}}}));
        assert_eq!(d.get("pos.geohash"), Some(&json!("dppn")));
        assert_eq!(d.get("pos.geopoint.latitude"), Some(&json!(1.0)));
        assert_eq!(d.get("pos.missing"), None);
        assert_eq!(d.get("pos.geohash.deeper"), None);
        assert_eq!(d.get(""), None);
    }

    #[test]
    fn test_document_serialization_flattens() {
        let d = doc("a", json!({"name": "x"}));
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value, json!({"id": "a", "name": "x"}));
        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_constraints() {
        let d = doc("a", json!({"color": "blue", "categories": ["food", "bar"]}));
        assert!(Constraint::eq("color", "blue").matches(&d));
        assert!(!Constraint::eq("color", "red").matches(&d));
        assert!(Constraint::array_contains("categories", "bar").matches(&d));
        assert!(!Constraint::array_contains("categories", "gym").matches(&d));
        assert!(!Constraint::array_contains("color", "blue").matches(&d));
    }

    #[test]
    fn test_parse_eq() {
        assert_eq!(Constraint::parse_eq("color=blue").unwrap(), Constraint::eq("color", "blue"));
        assert_eq!(Constraint::parse_eq("rank=3").unwrap(), Constraint::eq("rank", json!(3)));
        assert_eq!(Constraint::parse_eq("open=true").unwrap(), Constraint::eq("open", true));
        assert_eq!(Constraint::parse_eq("name=a=b").unwrap(), Constraint::eq("name", "a=b"));
        assert!(Constraint::parse_eq("color").is_err());
        assert!(Constraint::parse_eq("=blue").is_err());
    }

    #[test]
    fn test_range_is_inclusive_prefix() {
        let spec = range_query("places", "pos.geohash", "dppn", "dppn~");
        assert!(spec.matches(&doc("a", json!({"pos": {"geohash": "dppn7scc8"}}))));
        assert!(spec.matches(&doc("b", json!({"pos": {"geohash": "dppn"}}))));
        assert!(spec.matches(&doc("c", json!({"pos": {"geohash": "dppnzzzzz"}}))));
        assert!(!spec.matches(&doc("d", json!({"pos": {"geohash": "dppp0"}}))));
        assert!(!spec.matches(&doc("e", json!({"pos": {"geohash": "dppm"}}))));
        assert!(!spec.matches(&doc("f", json!({"pos": {"geohash": 42}}))));
        assert!(!spec.matches(&doc("g", json!({"name": "no position"}))));
    }

    #[test]
    fn test_range_with_constraints() {
        let spec = range_query("places", "pos.geohash", "dppn", "dppn~")
            .with_constraints([Constraint::eq("color", "blue")]);
        assert!(spec.matches(&doc("a", json!({"color": "blue", "pos": {"geohash": "dppn1"}}))));
        assert!(!spec.matches(&doc("b", json!({"color": "red", "pos": {"geohash": "dppn1"}}))));
    }

    #[tokio::test]
    async fn test_live_feed_unsubscribe_is_idempotent() {
        use futures::StreamExt;

        let (tx, mut feed) = LiveFeed::channel(CancellationToken::new());
        tx.send(Ok(vec![])).unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        feed.unsubscribe();
        feed.unsubscribe();
        assert!(feed.is_cancelled());
        assert!(tx.send(Ok(vec![])).is_err());
        assert!(feed.next().await.is_none());
    }
}
