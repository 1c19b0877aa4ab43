//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::coord::{Coordinates, GeoPoint};
use crate::error::Error;
use crate::format::geojson::{geojson_stream, to_geojson};
use crate::format::{available_formats, FormatInfo, Report};
use crate::geohash::{self, BoundingBox, Direction, Ordinate, Precision};
use crate::query::field::FieldPath;
use crate::query::{resolve_once, GeoQuery, QueryOptions};
use crate::server::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::{Constraint, Document, DocumentStore};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/formats", get(formats_handler))
        .route("/api/geohash/encode", get(encode_handler))
        .route("/api/geohash/:hash", get(decode_handler))
        .route(
            "/api/collections/:collection/docs",
            axum::routing::post(create_doc_handler),
        )
        .route(
            "/api/collections/:collection/docs/:id",
            get(get_doc_handler).put(put_doc_handler).delete(delete_doc_handler),
        )
        .route("/api/collections/:collection/within", get(within_handler))
        .route("/api/collections/:collection/within/live", get(within_live_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "NOT_IMPLEMENTED" => StatusCode::NOT_IMPLEMENTED,
            "TRANSPORT_ERROR" | "INTERNAL_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::InvalidGeohash { .. } => "INVALID_GEOHASH",
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::InvalidRadius(_) => "INVALID_RADIUS",
            Error::Unimplemented(_) => "NOT_IMPLEMENTED",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    pub started_at: DateTime<Utc>,
    /// Uptime in seconds
    pub uptime_secs: i64,
    /// Live cell subscriptions currently open
    pub active_subscriptions: usize,
    /// Document count per collection
    pub collections: BTreeMap<String, usize>,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let mut collections = BTreeMap::new();
    for name in state.store.collections()? {
        let count = state.store.len(&name)?;
        collections.insert(name, count);
    }

    Ok(Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at(),
        uptime_secs: state.uptime_secs(),
        active_subscriptions: state.store.active_subscriptions(),
        collections,
    }))
}

/// Formats list response
#[derive(Debug, Serialize, Deserialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
}

/// List available output formats
///
/// GET /api/formats
async fn formats_handler() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: available_formats(),
    })
}

/// Encode query parameters; coordinates stay text so `auto` can count digits
#[derive(Debug, Deserialize)]
pub struct EncodeQuery {
    pub lat: String,
    pub lng: String,
    pub precision: Option<usize>,
    #[serde(default)]
    pub auto: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub geohash: String,
    pub precision: usize,
}

/// Encode a coordinate
///
/// GET /api/geohash/encode?lat=..&lng=..[&precision=N|&auto=true]
async fn encode_handler(Query(q): Query<EncodeQuery>) -> Result<Json<EncodeResponse>, ApiError> {
    let precision = if q.auto {
        Precision::Auto
    } else {
        q.precision.map(Precision::Chars).unwrap_or_default()
    };
    let geohash = geohash::encode_with(Ordinate::Decimal(&q.lat), Ordinate::Decimal(&q.lng), precision)?;
    Ok(Json(EncodeResponse {
        precision: geohash.len(),
        geohash,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    pub hash: String,
    pub latitude: f64,
    pub longitude: f64,
    pub lat_error: f64,
    pub lng_error: f64,
    pub bbox: BoundingBox,
    /// Neighbor cells keyed by direction (`n`, `ne`, ...)
    pub neighbors: BTreeMap<String, String>,
}

/// Decode a geohash
///
/// GET /api/geohash/:hash
async fn decode_handler(Path(hash): Path<String>) -> Result<Json<DecodeResponse>, ApiError> {
    let bbox = geohash::decode_bbox(&hash)?;
    let decoded = bbox.center();
    let neighbors = geohash::neighbors(&hash)?;
    let neighbors = Direction::CLOCKWISE
        .iter()
        .map(|d| d.to_string())
        .zip(neighbors)
        .collect();

    Ok(Json(DecodeResponse {
        hash,
        latitude: decoded.latitude,
        longitude: decoded.longitude,
        lat_error: decoded.lat_error,
        lng_error: decoded.lng_error,
        bbox,
        neighbors,
    }))
}

/// Document write body: a position plus any extra fields
#[derive(Debug, Deserialize)]
pub struct DocRequest {
    pub lat: f64,
    pub lng: f64,
    /// Field to store the point under (defaults to the configured field)
    pub field: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocResponse {
    pub id: String,
    pub collection: String,
    pub geohash: String,
}

/// Tag the request's position and merge it into its data
async fn tagged_data(state: &AppState, req: DocRequest) -> Result<(Map<String, Value>, String), ApiError> {
    let coords = Coordinates::new(req.lat, req.lng);
    coords.validate()?;

    let (default_field, precision) = {
        let config = state.config.read().await;
        (config.query.field.clone(), config.geohash.precision)
    };
    let field = FieldPath::new(&req.field.unwrap_or(default_field))?;

    let point = GeoPoint::with_precision(coords.lat, coords.lng, precision);
    let mut data = req.data;
    field.set(&mut data, point.to_value());
    Ok((data, point.geohash().to_string()))
}

/// Add a document under a generated id
///
/// POST /api/collections/:collection/docs
async fn create_doc_handler(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(req): Json<DocRequest>,
) -> Result<(StatusCode, Json<DocResponse>), ApiError> {
    let (data, geohash) = tagged_data(&state, req).await?;
    let id = state.store.add(&collection, data).await?;
    debug!(collection = %collection, id = %id, "Created document");
    Ok((
        StatusCode::CREATED,
        Json(DocResponse {
            id,
            collection,
            geohash,
        }),
    ))
}

/// Create or replace a document
///
/// PUT /api/collections/:collection/docs/:id
async fn put_doc_handler(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
    Json(req): Json<DocRequest>,
) -> Result<Json<DocResponse>, ApiError> {
    let (data, geohash) = tagged_data(&state, req).await?;
    state.store.write(&collection, &id, data).await?;
    Ok(Json(DocResponse {
        id,
        collection,
        geohash,
    }))
}

/// Get a document
///
/// GET /api/collections/:collection/docs/:id
async fn get_doc_handler(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    state
        .store
        .get(&collection, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::new("NOT_FOUND", format!("Document not found: {}/{}", collection, id)))
}

/// Delete a document
///
/// DELETE /api/collections/:collection/docs/:id
async fn delete_doc_handler(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Radius query parameters
#[derive(Debug, Deserialize)]
pub struct WithinQuery {
    pub lat: f64,
    pub lng: f64,
    /// Radius in km (defaults to the configured radius)
    pub radius: Option<f64>,
    pub field: Option<String>,
    pub category: Option<String>,
    /// Equality filter as "key=value"
    #[serde(rename = "where")]
    pub filter: Option<String>,
    /// `json` (default) or `geojson`
    pub format: Option<String>,
    #[serde(default)]
    pub log: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputKind {
    Json,
    GeoJson,
}

/// A validated radius query, ready to open
struct Prepared {
    query: GeoQuery<InMemoryStore>,
    center: GeoPoint,
    radius_km: f64,
    field: String,
    opts: QueryOptions,
    output: OutputKind,
}

impl Prepared {
    async fn new(state: &AppState, collection: String, q: WithinQuery) -> Result<Self, ApiError> {
        let center = Coordinates::new(q.lat, q.lng);
        center.validate()?;

        let output = match q.format.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("json") => OutputKind::Json,
            Some("geojson") => OutputKind::GeoJson,
            Some(other) => {
                return Err(ApiError::new(
                    "INVALID_ARGUMENT",
                    format!("Unknown format: {} (expected json or geojson)", other),
                ))
            }
        };

        let config = state.config.read().await;
        let mut query = GeoQuery::new(state.store.clone(), collection);
        if let Some(filter) = &q.filter {
            query = query.with_constraint(Constraint::parse_eq(filter)?);
        }

        Ok(Self {
            query,
            center: GeoPoint::from_coords(center),
            radius_km: q.radius.unwrap_or(config.query.radius_km),
            field: q.field.unwrap_or_else(|| config.query.field.clone()),
            opts: QueryOptions {
                log: q.log || config.query.log,
                category: q.category,
            },
            output,
        })
    }
}

/// One-shot radius query
///
/// GET /api/collections/:collection/within?lat=..&lng=..&radius=..
async fn within_handler(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(q): Query<WithinQuery>,
) -> Result<Response, ApiError> {
    let p = Prepared::new(&state, collection, q).await?;
    let stream = p.query.within(&p.center, p.radius_km, &p.field, p.opts)?;
    let cells = stream.cells().to_vec();
    let hits = resolve_once(stream).await?;

    let response = match p.output {
        OutputKind::GeoJson => Json(to_geojson(&hits, &p.field, true)?).into_response(),
        OutputKind::Json => Json(Report::new(
            p.query.collection(),
            p.field,
            p.center.coords(),
            p.radius_km,
            cells,
            hits,
        ))
        .into_response(),
    };
    Ok(response)
}

/// Serialize a stream item as a named event, or as an `error` event
fn to_event<T: Serialize>(name: &str, item: crate::error::Result<T>) -> Result<Event, Infallible> {
    let event = match item {
        Ok(value) => Event::default().event(name).json_data(value),
        Err(e) => {
            warn!(error = %e, "Live query failed");
            Event::default().event("error").json_data(ApiError::from(e))
        }
    };
    Ok(event.unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
}

/// Live radius query as Server-Sent Events
///
/// Emits a `hits` (or `geojson`) event on open and after every change. Closing
/// the connection tears down every cell subscription.
///
/// GET /api/collections/:collection/within/live?lat=..&lng=..&radius=..
async fn within_live_handler(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(q): Query<WithinQuery>,
) -> Result<Sse<BoxStream<'static, Result<Event, Infallible>>>, ApiError> {
    let p = Prepared::new(&state, collection, q).await?;
    let hits = p.query.within(&p.center, p.radius_km, &p.field, p.opts)?;

    let events = match p.output {
        OutputKind::Json => hits.map(|item| to_event("hits", item)).boxed(),
        OutputKind::GeoJson => geojson_stream(hits, &p.field, true)
            .map(|item| to_event("geojson", item))
            .boxed(),
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
