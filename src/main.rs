//! ARRMap - gated ARR map generator and publisher
//!
//! A CLI pipeline that fetches location/revenue records from a remote
//! tabular endpoint, skips the run when nothing changed, renders a
//! self-contained interactive map, injects a client-side access gate,
//! and pushes the artifact to a git remote.
//!
//! Exit codes:
//!   0 - Success (published, nothing to publish, or skipped as unchanged)
//!   1 - Runtime error (fetch, config, or filesystem failure)

mod analysis;
mod cli;
mod config;
mod fingerprint;
mod map;
mod models;
mod normalize;
mod publish;
mod source;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use fingerprint::FingerprintStore;
use models::{NormalizationReport, RegionBreakdown, TierBreakdown, ALL_REGIONS, ALL_TIERS};
use publish::PublishOutcome;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ARRMap v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the pipeline
    match run_pipeline(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .arrmap.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".arrmap.toml");

    if path.exists() {
        eprintln!("⚠️  .arrmap.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .arrmap.toml")?;

    println!("✅ Created .arrmap.toml with default settings.");
    println!("   Edit it to set the source URL, gate digest, and publish target.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete pipeline. Returns the process exit code.
async fn run_pipeline(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Fetch records
    println!("📥 Fetching records from: {}", config.source.url);
    let raw_records = source::fetch_records(&config.source).await?;
    println!("   {} rows fetched", raw_records.len());

    // Step 2: Change detection
    let new_fingerprint = fingerprint::fingerprint(&raw_records);
    let store = FingerprintStore::new(&config.fingerprint.path);
    let previous = store.load()?;
    let unchanged = !fingerprint::should_proceed(previous.as_deref(), &new_fingerprint);

    if args.dry_run {
        println!(
            "🔍 Dry run: source data {} since last run.",
            if unchanged { "unchanged" } else { "changed" }
        );
    } else if unchanged && !args.force {
        println!("✅ Source data has not changed. Skipping update.");
        return Ok(0);
    } else {
        if unchanged {
            info!("Source unchanged but --force given; rebuilding");
        }
        // Persisted before rendering: a crash later in the run means the
        // next run skips until the source changes again
        // (at-most-once-per-change).
        store.save(&new_fingerprint)?;
    }

    // Step 3: Normalize
    let (records, report) = normalize::normalize(&raw_records);
    print_normalization_report(&report);

    // Step 4: Aggregate
    let (tiers, regions) = analysis::aggregate(&records);

    // Handle --dry-run: print the breakdowns and exit without writing
    if args.dry_run {
        print_breakdowns(&tiers, &regions);
        println!("\n✅ Dry run complete. No files were written.");
        return Ok(0);
    }

    // Step 5: Render the map
    println!("\n🗺️  Rendering map ({} markers)...", records.len());
    let mut html = map::render_map(&records, &tiers, &regions, &config.map);

    // Step 6: Inject the access gate
    if config.gate.enabled {
        html = map::inject_gate(&html, &config.gate);
        info!("Access gate injected (obfuscation only, not a security boundary)");
    } else {
        info!("Access gate disabled");
    }

    std::fs::write(&config.map.output, &html)
        .with_context(|| format!("Failed to write artifact to {}", config.map.output))?;
    println!("📄 Artifact written to: {}", config.map.output);

    // Step 7: Publish
    let outcome = if config.publish.enabled {
        match publish::publish_artifact(&config.publish, std::path::Path::new(&config.map.output)) {
            Ok(outcome) => outcome,
            Err(e) => {
                // Reported but not retried; the artifact exists on disk,
                // so the run still counts as partial success.
                error!("Publish failed: {:#}", e);
                eprintln!("⚠️  Publish failed: {}", e);
                PublishOutcome::Skipped
            }
        }
    } else {
        PublishOutcome::Skipped
    };

    match outcome {
        PublishOutcome::Pushed => println!("🚀 Pushed to {}!", config.publish.remote),
        PublishOutcome::NothingToCommit => println!("ℹ️  Nothing to commit (no changes)."),
        PublishOutcome::Skipped => println!("ℹ️  Publish skipped."),
    }

    // Print summary
    println!("\n📊 Run Summary:");
    println!("   Markers rendered: {}", records.len());
    println!(
        "   Rows kept/dropped: {}/{}",
        report.kept, report.dropped
    );
    println!(
        "   Total ARR on map: {}",
        map::renderer::format_currency(tiers.total_arr(), 0)
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "   Completed: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    Ok(0)
}

/// Print the normalization report, loudly when it looks degenerate.
fn print_normalization_report(report: &NormalizationReport) {
    println!(
        "🧹 Normalized: kept {} of {} rows ({} dropped)",
        report.kept, report.input_rows, report.dropped
    );

    for reason in &report.reasons {
        debug!("Dropped {}", reason);
    }

    if report.looks_degenerate() {
        warn!("Most rows were dropped; check the source field names");
        println!("⚠️  Most rows were dropped; the map may be empty or misleading.");
    }
}

/// Print both breakdowns (dry-run output).
fn print_breakdowns(tiers: &TierBreakdown, regions: &RegionBreakdown) {
    println!("\n   ARR by tier:");
    for tier in ALL_TIERS {
        let stats = tiers.get(tier);
        println!(
            "     {:<12} {} clients, {}",
            tier.label(),
            stats.count,
            map::renderer::format_currency(stats.total, 0)
        );
    }

    println!("\n   ARR by region:");
    for region in ALL_REGIONS {
        let stats = regions.get(region);
        println!(
            "     {:<8} {} clients, {}",
            region.label(),
            stats.count,
            map::renderer::format_currency(stats.total, 0)
        );
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .arrmap.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
