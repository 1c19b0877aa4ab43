//! Serve command handler
//!
//! Runs the HTTP API in the foreground until Ctrl-C.

use crate::cli::init_logging;
use crate::config::Config;
use crate::error::Result;
use crate::server;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Serve command arguments; each flag overrides the `[server]` config section
#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Seed file loaded into the store before accepting requests
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        config.server.host = self.host.unwrap_or_else(|| config.server.host.clone());
        config.server.port = self.port.unwrap_or(config.server.port);
        if self.seed.is_some() {
            config.server.seed = self.seed;
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    init_logging(&args.log_filter);

    let mut config = Config::load()?;
    args.apply(&mut config);

    info!(version = env!("CARGO_PKG_VERSION"), addr = %config.server_addr(), "geoquery server");
    server::run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.server.seed = Some(PathBuf::from("kept.json"));

        ServeArgs {
            host: None,
            port: Some(8080),
            seed: None,
            log_filter: "info".to_string(),
        }
        .apply(&mut config);

        assert_eq!(config.server_addr(), "127.0.0.1:8080");
        assert_eq!(config.server.seed, Some(PathBuf::from("kept.json")));
    }
}
