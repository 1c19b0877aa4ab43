//! Status command handler
//!
//! Shows the effective configuration and whether a server is running.

use crate::config::Config;
use crate::error::Result;
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Server address to check instead of the configured one ("host:port")
    #[arg(long)]
    pub addr: Option<String>,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load()?;
    let addr = args.addr.unwrap_or_else(|| config.server_addr());

    println!("geoquery v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!(
        "Defaults: collection \"{}\", field \"{}\", radius {} km",
        config.query.collection, config.query.field, config.query.radius_km
    );
    println!("Point precision: {} characters", config.geohash.precision);
    println!();

    check_server_status(&addr).await;
    Ok(())
}

/// Check if the server is running
async fn check_server_status(addr: &str) {
    let url = format!("http://{}/api/status", addr);

    match reqwest::get(&url).await {
        Ok(response) => {
            if response.status().is_success() {
                println!("Server: RUNNING on {}", addr);
                if let Ok(status) = response.json::<serde_json::Value>().await {
                    if let Some(version) = status.get("version").and_then(|v| v.as_str()) {
                        println!("  Version: {}", version);
                    }
                    if let Some(uptime) = status.get("uptime_secs").and_then(|v| v.as_i64()) {
                        println!("  Uptime: {}s", uptime);
                    }
                    if let Some(subs) = status.get("active_subscriptions").and_then(|v| v.as_u64()) {
                        println!("  Live subscriptions: {}", subs);
                    }
                    if let Some(collections) = status.get("collections").and_then(|v| v.as_object()) {
                        for (name, count) in collections {
                            println!("  Collection {}: {} documents", name, count);
                        }
                    }
                }
            } else {
                println!("Server: ERROR (status {})", response.status());
            }
        }
        Err(_) => {
            println!("Server: NOT RUNNING on {}", addr);
        }
    }
}
