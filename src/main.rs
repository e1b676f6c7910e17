use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info, warn};

use channel_video_search::core::report::{print_summary, write_csv};
use channel_video_search::utils::logging::init_tracing;
use channel_video_search::{AppConfig, SearchApp, NAME, VERSION};

/// Positional overrides: `[keyword] [csv-path]`
fn apply_cli_args(config: &mut AppConfig, mut args: impl Iterator<Item = String>) {
    if let Some(keyword) = args.next() {
        config.search.keyword = keyword;
    }
    if let Some(path) = args.next() {
        config.output.csv_path = PathBuf::from(path);
    }
}

async fn run() -> anyhow::Result<()> {
    let started = Instant::now();

    let mut config = SearchApp::load_or_initialize_config();
    config.apply_env_overrides();
    apply_cli_args(&mut config, std::env::args().skip(1));

    let app = SearchApp::new(config).context("Configuration error")?;
    let config = &app.config;

    info!(
        "🚀 Searching {} channel(s) for '{}' ({:?} mode)",
        app.channels.len(),
        config.search.keyword,
        config.search.mode
    );

    let report = app.run().await;

    print_summary(
        &report.videos,
        &config.search.keyword,
        config.output.summary_limit,
    );

    if report.is_partial() {
        warn!("{} channel(s) could not be searched", report.failures.len());
        for failure in &report.failures {
            println!("Skipped {}: {}", failure.channel, failure.reason);
        }
    }

    if config.output.write_csv {
        let written = write_csv(&report.videos, &config.output.csv_path)
            .with_context(|| format!("Failed to write {}", config.output.csv_path.display()))?;
        if written > 0 {
            println!(
                "Results saved to '{}'",
                config.output.csv_path.display()
            );
        }
    }

    println!(
        "\nSearch finished in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();
    init_tracing();
    info!("{} v{}", NAME, VERSION);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
