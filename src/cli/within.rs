//! Within command handler
//!
//! Loads a fixture file into an in-memory store and prints the hits of one
//! radius query.

use crate::cli::{init_logging, parse_coords};
use crate::config::Config;
use crate::coord::{Coordinates, GeoPoint};
use crate::error::{Error, Result};
use crate::format::{available_formats, get_formatter, Report};
use crate::query::{resolve_once, GeoQuery, QueryOptions};
use crate::store::memory::InMemoryStore;
use crate::store::seed::SeedFile;
use crate::store::Constraint;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Within command arguments
#[derive(Args)]
pub struct WithinArgs {
    /// Fixture file written by `geoquery seed`
    pub file: Option<PathBuf>,

    /// Query center as "lat,lng"
    #[arg(long, value_parser = parse_coords, allow_hyphen_values = true, default_value = "40.5,-80")]
    pub center: Coordinates,

    /// Radius in km
    #[arg(long, short = 'r')]
    pub radius: Option<f64>,

    /// Field holding each point (defaults to the file's field)
    #[arg(long)]
    pub field: Option<String>,

    /// Equality filter "key=value" (repeatable); values parse as JSON when they can
    #[arg(long = "where", value_name = "KEY=VALUE", value_parser = parse_constraint)]
    pub constraints: Vec<Constraint>,

    /// Only records whose `categories` contain this value
    #[arg(long)]
    pub category: Option<String>,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Log a query summary
    #[arg(long)]
    pub log: bool,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

fn parse_constraint(s: &str) -> std::result::Result<Constraint, String> {
    Constraint::parse_eq(s).map_err(|e| e.to_string())
}

/// Run the within command
pub async fn run(args: WithinArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    let config = Config::load()?;
    init_logging(if args.log || config.query.log { "info" } else { "warn" });

    let path = args
        .file
        .ok_or_else(|| Error::InvalidArgument("No fixture file given".to_string()))?;
    let seed = SeedFile::load(&path)?;

    let field = args.field.unwrap_or(seed.field);
    let radius = args.radius.unwrap_or(config.query.radius_km);
    let format = args.format.unwrap_or(config.output.format.clone());
    let formatter =
        get_formatter(&format).ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;

    let store = InMemoryStore::new();
    store.load(&seed.collection, seed.documents)?;

    let query = args
        .constraints
        .into_iter()
        .fold(GeoQuery::new(Arc::new(store), seed.collection.clone()), |q, c| {
            q.with_constraint(c)
        });
    let opts = QueryOptions {
        log: args.log || config.query.log,
        category: args.category,
    };

    let center = GeoPoint::from_coords(args.center);
    let stream = query.within(&center, radius, &field, opts)?;
    let cells = stream.cells().to_vec();
    let hits = resolve_once(stream).await?;

    let report = Report::new(seed.collection, field, args.center, radius, cells, hits);
    let output = formatter.format(&report)?;

    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Output written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:8} - {}", format.name, format.description);
    }
}
