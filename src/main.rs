//! geoquery CLI entry point
//!
//! Geohash radius queries - CLI + web API

use geoquery::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
