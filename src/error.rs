//! Error types for geoquery

use thiserror::Error;

/// Main error type for geoquery operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid geohash {hash:?}: unexpected character {ch:?}")]
    InvalidGeohash { hash: String, ch: char },

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(String),

    /// A live subscription against the document store failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for geoquery operations
pub type Result<T> = std::result::Result<T, Error>;
