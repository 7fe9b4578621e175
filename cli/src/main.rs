use anyhow::Context;
use clap::Parser;

use civictrack_admin::cli::Cli;
use civictrack_admin::{commands, logging, report, AdminConfig, ReqwestTransport, Shell};
use shared::image_processing::ImageProcessor;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("civictrack-admin error: {error:#}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the run ended with an alert.
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let config = AdminConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;
    let _log_guard = logging::init(&config.logging, cli.verbose)?;

    let transport = ReqwestTransport::new(config.api.timeout())
        .context("failed to build HTTP client")?;
    let images = ImageProcessor::new(config.processing_config());
    let mut shell = Shell::new(transport, images);

    let command = cli.subcommand();
    let outcome = commands::run(
        &mut shell,
        &command,
        &config.api.base_url,
        config.display.issue_order,
    )
    .await?;

    if let Some(banner) = &outcome.view.banner {
        eprintln!("warning: {banner}");
    }

    if cli.json {
        println!("{}", report::render_json(&outcome)?);
    } else {
        println!("{}", report::render_text(&outcome));
    }

    if let Some(error) = &outcome.view.error {
        eprintln!("error [{}]: {}", error.error_code, error.message);
    }

    Ok(!outcome.is_alert())
}
