//! Race Vert - elevation profile comparison
//!
//! CLI commands:
//! - serve: Start HTTP server
//! - events: List events in the data folder
//! - variants: List the year/distance variants of one event
//! - compare: Compare two variants bin by bin

mod catalog;
mod compare;
mod config;
mod error;
mod logging;
mod profile;
mod server;
mod state;
mod tornado;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::compare::{Metric, Selection};
use crate::error::Notice;
use crate::tornado::TornadoChart;

#[derive(Parser)]
#[command(name = "race_vert")]
#[command(about = "Side-by-side elevation gain comparison of race profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to race_vert.yaml config
    #[arg(short, long, default_value = "race_vert.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (defaults to PORT or 8501)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List events
    Events,

    /// List variants of an event
    Variants {
        event: String,
    },

    /// Compare two race variants
    Compare {
        event_a: String,
        variant_a: String,
        event_b: String,
        variant_b: String,

        /// Comparison metric
        #[arg(short, long, value_enum, default_value_t = Metric::Distance)]
        metric: Metric,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Secrets first: LOG_DIR decides where logging goes
    let secrets = config::Secrets::load();
    logging::init_logging(&secrets.log_dir);
    tracing::info!("Race Vert starting up");
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        config::Config::default()
    };

    let data_dir = secrets.data_root(&config);
    tracing::info!("Data root: {:?} (*.{})", data_dir, config.extension);
    let state = state::AppState::new(config, data_dir);

    match cli.command {
        Commands::Serve { port } => {
            server::serve(state, port.unwrap_or(secrets.port)).await?;
        }

        Commands::Events => list_events(&state),

        Commands::Variants { event } => list_variants(&state, &event),

        Commands::Compare {
            event_a,
            variant_a,
            event_b,
            variant_b,
            metric,
            json,
        } => {
            let a = Selection::new(event_a, variant_a);
            let b = Selection::new(event_b, variant_b);
            run_compare(&state, &a, &b, metric, json)?;
        }
    }

    Ok(())
}

fn list_events(state: &state::AppState) {
    let events = state.list_events();
    if events.is_empty() {
        println!("{}", Notice::CatalogEmpty.message());
        return;
    }

    println!("Events ({}):", events.len());
    for event in events {
        println!("  - {}", event);
    }
}

fn list_variants(state: &state::AppState, event: &str) {
    let variants = state.list_variants(event);
    if variants.is_empty() {
        println!("No race data for event '{}'", event);
        return;
    }

    println!("{} ({}):", event, variants.len());
    for variant in variants {
        println!("  - {}", variant);
    }
}

fn run_compare(
    state: &state::AppState,
    a: &Selection,
    b: &Selection,
    metric: Metric,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = state.catalog();
    for sel in [a, b] {
        if !catalog.contains(&sel.event, &sel.variant) {
            tracing::warn!("{}/{} is not in the catalog", sel.event, sel.variant);
        }
    }

    let comparison = state.compare(a, b, metric).map_err(|e| {
        tracing::error!("Comparison failed: {}", e);
        anyhow::anyhow!(e.user_message())
    })?;
    let chart = TornadoChart::build(&comparison, &state.config);

    if json {
        let out = serde_json::json!({
            "comparison": &comparison,
            "chart": &chart,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to serialize comparison")?
        );
    } else {
        print!("{}", tornado::render_table(&chart));
    }

    if let Some(notice) = comparison.notice() {
        println!("{}", notice.message());
    }
    Ok(())
}
