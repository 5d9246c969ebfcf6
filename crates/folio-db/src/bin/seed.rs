//! # Seed Data Generator
//!
//! Populates a Folio database with demo brokerages and holdings.
//!
//! ## Usage
//! ```bash
//! # Seed the platform default database
//! cargo run -p folio-db --bin seed
//!
//! # Specify database path
//! cargo run -p folio-db --bin seed -- --db ./data/folio.db
//!
//! # More holdings per brokerage
//! cargo run -p folio-db --bin seed -- --holdings 20
//! ```

use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_core::MandatoryText;
use folio_db::{DatabaseBuilder, StorageConfig};

/// Demo brokerages
const BROKERAGES: &[&str] = &[
    "Interactive Brokers",
    "Charles Schwab",
    "Fidelity",
    "Vanguard",
    "Degiro",
    "Trade Republic",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let db_path = flag_value(&args, "--db").map(PathBuf::from);
    let holdings_per_brokerage: usize = flag_value(&args, "--holdings")
        .map(|v| v.parse::<usize>())
        .transpose()?
        .unwrap_or(3);

    let mut config = StorageConfig::load(None)?;
    if db_path.is_some() {
        config.database_path = db_path;
    }

    let builder = DatabaseBuilder::new(config);
    println!("Folio seed");
    println!("  Database: {}", builder.resolve_path()?.display());
    println!("  Holdings per brokerage: {}", holdings_per_brokerage);
    println!();

    let db = builder.build().await?;

    for name in BROKERAGES {
        let brokerage = db.brokerages().get_or_create(&MandatoryText::new(*name)?).await?;
        let id = brokerage
            .entity_id()
            .ok_or("store returned a non-positive id")?;

        for _ in 0..holdings_per_brokerage {
            db.holdings().insert(id).await?;
        }
        info!(brokerage = %name, id = brokerage.id, "Seeded brokerage");
    }

    let status = db.migration_status().await?;
    println!("✓ Schema version {} (target {})", status.current, status.target);
    println!("  Brokerages: {}", db.brokerages().count().await?);
    println!("  Holdings:   {}", db.holdings().count().await?);

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Returns the value following `flag`, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,folio=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,folio=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
