//! Config command handler
//!
//! Prints the config file, or reads and writes single dotted keys.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Dotted key such as "query.radius_km"
    pub key: Option<String>,

    /// New value for the key
    #[arg(requires = "key")]
    pub value: Option<String>,

    /// Print the config file location
    #[arg(long, conflicts_with_all = ["key", "reset"])]
    pub path: bool,

    /// Overwrite the config file with defaults
    #[arg(long, conflicts_with = "key")]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }
    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;
    match (args.key, args.value) {
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        (Some(key), None) => println!("{}", lookup(&config, &key)?),
        (None, _) => print!("{}", render(&config)?),
    }
    Ok(())
}

/// Value of `key`, or an error listing the keys that exist
fn lookup(config: &Config, key: &str) -> Result<String> {
    config.get(key).ok_or_else(|| {
        Error::Config(format!(
            "Unknown config key: {} (available: {})",
            key,
            Config::available_keys().join(", ")
        ))
    })
}

/// The whole config as it would be written to disk
fn render(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let config = Config::default();
        assert_eq!(lookup(&config, "query.field").unwrap(), "pos");
        let err = lookup(&config, "query.nope").unwrap_err().to_string();
        assert!(err.contains("geohash.precision"));
    }

    #[test]
    fn test_render_round_trips() {
        let mut config = Config::default();
        config.query.radius_km = 12.5;
        let rendered = render(&config).unwrap();
        assert!(rendered.contains("[query]"));
        assert_eq!(toml::from_str::<Config>(&rendered).unwrap(), config);
    }
}
