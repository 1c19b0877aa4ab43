//! Server shared state
//!
//! Holds configuration and the document store shared by every request.

use crate::config::Config;
use crate::error::Result;
use crate::store::memory::InMemoryStore;
use crate::store::seed::SeedFile;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    /// Store every query and write goes through
    pub store: Arc<InMemoryStore>,

    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state with an empty store
    pub fn new(config: Config) -> Self {
        Self::with_store(config, InMemoryStore::new())
    }

    /// Create application state around an existing store
    pub fn with_store(config: Config, store: InMemoryStore) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            store: Arc::new(store),
            started_at: Utc::now(),
        }
    }

    /// Load the configured seed file, if any, into the store
    pub async fn preload(&self) -> Result<usize> {
        let Some(path) = self.config.read().await.server.seed.clone() else {
            return Ok(0);
        };
        let seed = SeedFile::load(&path)?;
        let count = self.store.load(&seed.collection, seed.documents)?;
        info!(path = %path.display(), collection = %seed.collection, count, "Loaded seed file");
        Ok(count)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinates;
    use crate::store::seed;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_preload_without_seed() {
        let state = AppState::new(Config::default());
        assert_eq!(state.preload().await.unwrap(), 0);
        assert!(state.uptime_secs() >= 0);
    }

    #[tokio::test]
    async fn test_preload_seed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seed.json");
        SeedFile {
            collection: "bearings".to_string(),
            field: "pos".to_string(),
            documents: seed::ring(
                Coordinates::new(40.5, -80.0),
                "pos",
                &seed::RING_DISTANCES_KM,
                &seed::RING_BEARINGS,
            ),
        }
        .save(&path)
        .unwrap();

        let mut config = Config::default();
        config.server.seed = Some(path);
        let state = AppState::new(config);
        assert_eq!(state.preload().await.unwrap(), 32);
        assert_eq!(state.store.len("bearings").unwrap(), 32);
    }
}
