//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geoquery/config.toml

pub mod defaults;

use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Defaults for radius queries
    #[serde(default)]
    pub query: QueryConfig,

    /// Point tagging
    #[serde(default)]
    pub geohash: GeohashConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Defaults for radius queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Collection to query
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Field holding each record's GeoPoint
    #[serde(default = "default_field")]
    pub field: String,

    /// Query radius in km
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    /// Log a summary line per emission
    #[serde(default)]
    pub log: bool,
}

/// Point tagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeohashConfig {
    /// Geohash length written on tagged points
    #[serde(default = "default_precision")]
    pub precision: usize,
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seed file loaded into the store at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,
}

// Default value functions for serde
fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}
fn default_field() -> String {
    DEFAULT_FIELD.to_string()
}
fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}
fn default_precision() -> usize {
    DEFAULT_PRECISION
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            field: default_field(),
            radius_km: default_radius_km(),
            log: false,
        }
    }
}

impl Default for GeohashConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

fn check_precision(precision: usize) -> Result<()> {
    if !(1..=MAX_PRECISION).contains(&precision) {
        return Err(Error::Config(format!(
            "Precision must be between 1 and {}, got {}",
            MAX_PRECISION, precision
        )));
    }
    Ok(())
}

impl Config {
    /// Check values a hand-edited file could get wrong
    pub fn validate(&self) -> Result<()> {
        check_precision(self.geohash.precision)?;
        if !self.query.radius_km.is_finite() || self.query.radius_km < 0.0 {
            return Err(Error::Config(format!("Invalid radius value: {}", self.query.radius_km)));
        }
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            let config: Config = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["query", "collection"] => Some(self.query.collection.clone()),
            ["query", "field"] => Some(self.query.field.clone()),
            ["query", "radius_km"] => Some(self.query.radius_km.to_string()),
            ["query", "log"] => Some(self.query.log.to_string()),

            ["geohash", "precision"] => Some(self.geohash.precision.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["server", "seed"] => Some(
                self.server
                    .seed
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),

            ["output", "format"] => Some(self.output.format.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["query", "collection"] => {
                if value.is_empty() {
                    return Err(Error::Config("Collection name cannot be empty".to_string()));
                }
                self.query.collection = value.to_string();
            }
            ["query", "field"] => {
                crate::query::field::FieldPath::new(value)
                    .map_err(|_| Error::Config(format!("Invalid field path: {}", value)))?;
                self.query.field = value.to_string();
            }
            ["query", "radius_km"] => {
                let radius: f64 = parse(key, value)?;
                if !radius.is_finite() || radius < 0.0 {
                    return Err(Error::Config(format!("Invalid radius value: {}", value)));
                }
                self.query.radius_km = radius;
            }
            ["query", "log"] => {
                self.query.log = parse(key, value)?;
            }

            ["geohash", "precision"] => {
                let precision: usize = parse(key, value)?;
                check_precision(precision)?;
                self.geohash.precision = precision;
            }

            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = parse(key, value)?;
            }
            ["server", "seed"] => {
                self.server.seed = (!value.is_empty()).then(|| PathBuf::from(value));
            }

            ["output", "format"] => {
                if crate::format::get_formatter(value).is_none() {
                    return Err(Error::Config(format!("Unknown output format: {}", value)));
                }
                self.output.format = value.to_lowercase();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "query.collection",
            "query.field",
            "query.radius_km",
            "query.log",
            "geohash.precision",
            "server.host",
            "server.port",
            "server.seed",
            "output.format",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.query.collection, "places");
        assert_eq!(config.query.field, "pos");
        assert_eq!(config.query.radius_km, 5.0);
        assert_eq!(config.geohash.precision, 9);
        assert_eq!(config.server.port, 7979);
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        assert_eq!(config.get("query.collection"), Some("places".to_string()));

        config.set("query.collection", "bearings").unwrap();
        assert_eq!(config.get("query.collection"), Some("bearings".to_string()));

        config.set("query.radius_km", "10").unwrap();
        assert_eq!(config.get("query.radius_km"), Some("10".to_string()));
        assert_eq!(config.query.radius_km, 10.0);

        config.set("output.format", "GeoJSON").unwrap();
        assert_eq!(config.output.format, "geojson");

        config.set("server.seed", "/tmp/seed.json").unwrap();
        assert_eq!(config.server.seed, Some(PathBuf::from("/tmp/seed.json")));
        config.set("server.seed", "").unwrap();
        assert_eq!(config.server.seed, None);
    }

    #[test]
    fn test_get_invalid_key() {
        let config = Config::default();
        assert_eq!(config.get("invalid.key"), None);
    }

    #[test]
    fn test_set_invalid_key() {
        let mut config = Config::default();
        assert!(config.set("invalid.key", "value").is_err());
    }

    #[test]
    fn test_set_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("query.radius_km", "not_a_number").is_err());
        assert!(config.set("query.radius_km", "-1").is_err());
        assert!(config.set("query.field", "a..b").is_err());
        assert!(config.set("geohash.precision", "0").is_err());
        assert!(config.set("geohash.precision", "13").is_err());
        assert!(config.set("output.format", "url").is_err());
        assert!(config.set("query.log", "maybe").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("geoquery").join("config.toml");

        let mut config = Config::default();
        config.query.collection = "bearings".to_string();
        config.query.radius_km = 0.5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.query.collection, "bearings");
        assert_eq!(loaded.query.radius_km, 0.5);
    }

    #[test]
    fn test_load_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[query]\nfield = \"location\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.query.field, "location");
        assert_eq!(loaded.query.collection, "places");
        assert_eq!(loaded.server.port, 7979);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[query\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_rejects_out_of_range_precision() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[geohash]\nprecision = 1000\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        fs::write(&path, "[geohash]\nprecision = 0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        fs::write(&path, "[geohash]\nprecision = 12\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().geohash.precision, 12);
    }

    #[test]
    fn test_serialization_format() {
        let toml = toml::to_string_pretty(&Config::default()).unwrap();

        assert!(toml.contains("[query]"));
        assert!(toml.contains("[geohash]"));
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "127.0.0.1:7979");
    }

    #[test]
    fn test_available_keys() {
        let keys = Config::available_keys();
        let config = Config::default();
        for key in &keys {
            assert!(config.get(key).is_some(), "{} has no getter", key);
        }
        assert!(keys.contains(&"geohash.precision"));
    }
}
