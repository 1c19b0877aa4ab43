//! geoquery: live geohash radius queries
//!
//! A library and CLI tool for "everything within N km of here" queries over a
//! document store that only supports ordered range scans on one field.
//!
//! ## Features
//!
//! - Geohash encode/decode, bounding boxes and neighbors
//! - Haversine distance and bearing
//! - Live radius queries: nine geohash range subscriptions merged, filtered
//!   and sorted by distance, re-emitted on every change
//! - Switchable queries whose center and radius can change over time
//! - In-memory live store, HTTP API (with SSE) + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use geoquery::geohash;
//! use geoquery::query::cover;
//! use geoquery::Coordinates;
//!
//! let hash = geohash::encode(40.5, -80.0, 9);
//! assert_eq!(hash, "dppn7scc8");
//!
//! // The nine cells a 10 km query at that point subscribes to
//! let cells = cover(Coordinates::new(40.5, -80.0), 10.0).unwrap();
//! assert_eq!(cells.len(), 9);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod format;
pub mod geohash;
pub mod query;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use coord::{Coordinates, GeoPoint};
pub use error::{Error, Result};
pub use query::{resolve_once, GeoQuery, Hit, HitStream, QueryOptions};
pub use store::memory::InMemoryStore;
pub use store::{Constraint, Document, DocumentStore};
