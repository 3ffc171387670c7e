//! Bulk provocation generator.
//!
//! Usage: provoke-generate --target 200 --data-dir ./data
//!
//! Resumes from the existing `provocations.json`, so it can be stopped with
//! Ctrl-C and restarted at any time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use provoke::config::api_key_from_env;
use provoke::generation::batch::{BatchRunner, BatchSettings};
use provoke::llm_client::GeminiClient;
use provoke::store::JsonStore;

#[derive(Debug, Parser)]
#[command(name = "provoke-generate", version, about = "Fill provocations.json up to a target size")]
struct Args {
    /// Stop once the collection holds this many provocations
    #[arg(long, env = "TARGET", default_value_t = 200)]
    target: usize,

    /// Directory holding thinkers.json and provocations.json
    #[arg(long, env = "DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Pause after each saved provocation, in milliseconds
    #[arg(long, default_value_t = 300)]
    pause_ms: u64,

    /// First wait after a rate-limit error; doubles on each repeat
    #[arg(long, default_value_t = 5)]
    initial_backoff_secs: u64,

    /// Optional ceiling for the rate-limit wait
    #[arg(long)]
    max_backoff_secs: Option<u64>,

    /// Wait after any other failure
    #[arg(long, default_value_t = 10)]
    error_pause_secs: u64,

    /// Seed for thinker/seed selection (random if omitted)
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    provoke::init_tracing(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let api_key = api_key_from_env().context(
        "GOOGLE_API_KEY not found in environment variables. \
         Set it before running the generator.",
    )?;
    let generator = Arc::new(GeminiClient::new(api_key)?);

    let store = Arc::new(JsonStore::new(
        &args.data_dir,
        args.data_dir.join("provocations_scores.json"),
    ));
    let thinkers = store
        .load_thinkers()
        .await
        .context("thinkers.json is missing or not correctly formatted")?;

    let settings = BatchSettings {
        target: args.target,
        pause: Duration::from_millis(args.pause_ms),
        initial_backoff: Duration::from_secs(args.initial_backoff_secs),
        max_backoff: args.max_backoff_secs.map(Duration::from_secs),
        error_pause: Duration::from_secs(args.error_pause_secs),
    };
    let rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut runner = BatchRunner::new(generator, store, thinkers, settings, rng).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let report = runner.run(shutdown).await?;
    info!(
        "Done. {} provocations on disk ({} new{}).",
        report.total,
        report.added,
        if report.interrupted { ", interrupted" } else { "" }
    );
    Ok(())
}
