//! Radius queries over a document store
//!
//! `within` turns "point + radius" into a live, distance-sorted hit list:
//!
//! 1. pick a geohash length for the radius and encode the center at that length
//! 2. cover the circle with the center cell plus its 8 neighbors
//! 3. open one live range subscription per cell (`[cell, cell + "~"]`)
//! 4. combine the latest snapshot of every cell, keep records within
//!    `radius * 1.02` of the center, annotate distance/bearing, sort by distance
//!
//! All cell subscriptions share one cancellation token: dropping or cancelling
//! the returned stream tears every one of them down, and so does the first
//! subscription error.

pub mod combine;
pub mod field;
pub mod switch;


use crate::constants::query::{CATEGORY_FIELD, RADIUS_BUFFER, RANGE_SENTINEL};
use crate::coord::precision::select_precision;
use crate::coord::{spherical, Coordinates, GeoPoint};
use crate::error::{Error, Result};
use crate::geohash::{self, BoundingBox};
use crate::store::{range_query, Constraint, Document, DocumentStore, LiveFeed, QuerySpec, Snapshot};
use combine::CombineLatest;
use field::FieldPath;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use switch::{watch_params, SwitchHits, WithinParams};

/// Options for a radius query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Log a summary (cell hits, hits in radius, elapsed time) on every emission
    #[serde(default)]
    pub log: bool,

    /// Only match records whose `categories` array contains this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl QueryOptions {
    pub fn logged() -> Self {
        Self {
            log: true,
            ..Self::default()
        }
    }
}

/// Distance and bearing of a hit relative to the query center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitMetadata {
    /// Great-circle distance in km
    pub distance: f64,
    /// Initial bearing in degrees, (-180, 180]
    pub bearing: f64,
}

/// A matched record annotated with its position relative to the center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(flatten)]
    pub document: Document,

    #[serde(rename = "hitMetadata")]
    pub hit_metadata: HitMetadata,
}

impl Hit {
    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn distance(&self) -> f64 {
        self.hit_metadata.distance
    }

    pub fn bearing(&self) -> f64 {
        self.hit_metadata.bearing
    }

    /// Deserialize the record's fields into a typed struct
    pub fn deserialize_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::to_value(&self.document).and_then(serde_json::from_value)?)
    }
}

/// Radius queries against one collection of a store
pub struct GeoQuery<S> {
    store: Arc<S>,
    collection: String,
    constraints: Vec<Constraint>,
}

impl<S> Clone for GeoQuery<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collection: self.collection.clone(),
            constraints: self.constraints.clone(),
        }
    }
}

impl<S: DocumentStore> GeoQuery<S> {
    /// Query `collection` of `store`
    pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            constraints: Vec::new(),
        }
    }

    /// Add a constraint applied to every cell query (compound queries)
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Live hits within `radius_km` of `center`, read from `field`
    ///
    /// Opens the cell subscriptions immediately, so this must be called inside a
    /// Tokio runtime when the store spawns delivery tasks.
    pub fn within(
        &self,
        center: &GeoPoint,
        radius_km: f64,
        field: &str,
        opts: QueryOptions,
    ) -> Result<HitStream> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(Error::InvalidRadius(format!(
                "Radius must be a non-negative number of km, got {}",
                radius_km
            )));
        }
        let field = FieldPath::new(field)?;
        let cells = cover(center.coords(), radius_km)?;

        let cancel = CancellationToken::new();
        let mut feeds: Vec<LiveFeed> = Vec::with_capacity(cells.len());
        for cell in &cells {
            let spec = self.cell_query(cell, &field, opts.category.as_deref());
            match self.store.subscribe(spec, cancel.child_token()) {
                Ok(feed) => feeds.push(feed),
                Err(e) => {
                    cancel.cancel();
                    return Err(e);
                }
            }
        }

        debug!(
            collection = %self.collection,
            field = %field,
            radius_km,
            cells = ?cells,
            "Opened radius query"
        );

        Ok(HitStream {
            merged: CombineLatest::new(feeds),
            cancel,
            cells,
            pipeline: Pipeline {
                center: center.coords(),
                radius_km,
                field,
                log: opts.log,
                started: Instant::now(),
            },
            finished: false,
        })
    }

    /// Like [`GeoQuery::within`], limited to records tagged with `category`
    pub fn within_category(
        &self,
        center: &GeoPoint,
        radius_km: f64,
        field: &str,
        category: &str,
        opts: QueryOptions,
    ) -> Result<HitStream> {
        let opts = QueryOptions {
            category: Some(category.to_string()),
            ..opts
        };
        self.within(center, radius_km, field, opts)
    }

    /// Radius query whose center and radius follow `params`
    ///
    /// Every new parameter set fully replaces the previous cell subscriptions.
    pub fn within_live<P>(&self, params: P, field: &str, opts: QueryOptions) -> Result<SwitchHits<S>>
    where
        P: Stream<Item = WithinParams> + Send + 'static,
    {
        FieldPath::new(field)?;
        Ok(SwitchHits::new(self.clone(), params.boxed(), field.to_string(), opts))
    }

    pub fn within_bbox(&self, _bbox: BoundingBox, _field: &str, _opts: QueryOptions) -> Result<HitStream> {
        Err(Error::Unimplemented("bounding box queries"))
    }

    pub fn within_polygon(
        &self,
        _polygon: &[Coordinates],
        _field: &str,
        _opts: QueryOptions,
    ) -> Result<HitStream> {
        Err(Error::Unimplemented("polygon queries"))
    }

    pub fn find_nearest(&self, _center: &GeoPoint, _field: &str, _opts: QueryOptions) -> Result<HitStream> {
        Err(Error::Unimplemented("nearest-neighbor search"))
    }

    pub fn find_first(&self, _center: &GeoPoint, _field: &str, _opts: QueryOptions) -> Result<HitStream> {
        Err(Error::Unimplemented("first-hit search"))
    }

    /// Range query for one cell: constraints, then category, then the geohash range
    fn cell_query(&self, cell: &str, field: &FieldPath, category: Option<&str>) -> QuerySpec {
        let mut constraints = self.constraints.clone();
        if let Some(category) = category {
            constraints.push(Constraint::array_contains(CATEGORY_FIELD, category));
        }
        range_query(
            self.collection.clone(),
            field.geohash_path(),
            cell,
            format!("{}{}", cell, RANGE_SENTINEL),
        )
        .with_constraints(constraints)
    }
}

/// Cells covering a circle: the 8 neighbors of the center cell, then the center cell
///
/// Duplicates near the poles and the antimeridian are kept.
pub fn cover(center: Coordinates, radius_km: f64) -> Result<Vec<String>> {
    let precision = select_precision(radius_km);
    let center_hash = geohash::encode(center.lat, center.lng, precision);
    let mut cells: Vec<String> = geohash::neighbors(&center_hash)?.into();
    cells.push(center_hash);
    Ok(cells)
}

/// Per-query filter/annotate/sort stage
struct Pipeline {
    center: Coordinates,
    radius_km: f64,
    field: FieldPath,
    log: bool,
    started: Instant,
}

impl Pipeline {
    fn hits(&self, snapshots: Vec<Snapshot>) -> Vec<Hit> {
        let limit = self.radius_km * RADIUS_BUFFER;
        let mut total = 0;

        let mut hits: Vec<Hit> = snapshots
            .into_iter()
            .flatten()
            .filter_map(|document| {
                total += 1;
                let Some(coords) = self.field.coords(&document) else {
                    warn!(id = %document.id, field = %self.field, "Record has no readable geopoint");
                    return None;
                };
                let distance = spherical::distance(self.center, coords);
                (distance <= limit).then(|| Hit {
                    hit_metadata: HitMetadata {
                        distance,
                        bearing: spherical::bearing(self.center, coords),
                    },
                    document,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance().total_cmp(&b.distance()));

        if self.log {
            info!(
                center = ?(self.center.lat, self.center.lng),
                radius_km = self.radius_km,
                hits = total,
                within_radius = hits.len(),
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Geo query"
            );
        }

        hits
    }
}

/// Live, distance-sorted results of a radius query
///
/// Each item is the full hit list as of the latest snapshot of every cell. The
/// stream ends after an error, after [`HitStream::cancel`], or never. Dropping it
/// cancels every cell subscription.
pub struct HitStream {
    merged: CombineLatest<LiveFeed, Snapshot>,
    cancel: CancellationToken,
    cells: Vec<String>,
    pipeline: Pipeline,
    finished: bool,
}

impl HitStream {
    /// The geohash cells this query subscribed to
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn radius_km(&self) -> f64 {
        self.pipeline.radius_km
    }

    /// Tear down every cell subscription; later polls yield `None`
    pub fn cancel(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.cancel.cancel();
        self.merged.close();
        if self.pipeline.log {
            info!(
                radius_km = self.pipeline.radius_km,
                elapsed_ms = self.pipeline.started.elapsed().as_millis() as u64,
                "Query complete"
            );
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.finished
    }
}

impl Stream for HitStream {
    type Item = Result<Vec<Hit>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.merged.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(snapshots))) => Poll::Ready(Some(Ok(this.pipeline.hits(snapshots)))),
            Poll::Ready(Some(Err(e))) => {
                warn!(error = %e, "Cell subscription failed, closing query");
                this.cancel();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.cancel();
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for HitStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Resolve a live stream to its first emission, then tear it down
pub async fn resolve_once<St, T>(mut stream: St) -> Result<T>
where
    St: Stream<Item = Result<T>> + Unpin,
{
    stream.next().await.unwrap_or_else(|| {
        Err(Error::Transport(
            "stream ended before producing a result".to_string(),
        ))
    })
}
