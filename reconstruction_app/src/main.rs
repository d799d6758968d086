//! Reconstruction app, headless
//!
//! Replays a scenario through the immersive view and prints the resulting
//! scene. Exits non-zero when the run ended with the error window showing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use reconstruction_app::{run_demo, AppConfig, DemoScript};
use spatial_engine::config::Config;
use spatial_engine::foundation::logging;

#[derive(Parser, Debug)]
#[command(name = "reconstruction_app", version, about = "Scene reconstruction physics playground")]
struct Cli {
    /// Configuration file (.toml or .ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Demo script to replay (.ron); a built-in room is used when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Log filter, overriding the configuration file
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };
    logging::init_with_filter(cli.log.as_deref().unwrap_or(&config.log_filter));
    config.validate()?;

    let script = match &cli.scenario {
        Some(path) => {
            log::info!("Loading demo script from {}", path.display());
            DemoScript::load_from_file(path)?
        }
        None => DemoScript::sample(),
    };

    log::info!(
        "Replaying {} steps, {} taps",
        script.scenario.steps.len(),
        script.taps.len()
    );
    let report = run_demo(&config, script).await?;

    println!("{}", report.snapshot);
    println!("cubes spawned by taps: {}", report.cubes_spawned);

    match report.error {
        Some(window) => {
            eprintln!("{}", window.message());
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
