// Entrypoint for the uploader.
// - Loads `.env`, sets up logging and parses the command line.
// - Builds the client and service handles once and hands them to the run.

use std::io::IsTerminal;
use std::process::exit;

use anyhow::Context as _;
use tcx_uploader::{
    api::{CurrentAthleteService, StravaClient, UploadsService},
    config::Config,
    upload::Context,
    waiting::SleepWait,
    Error,
};

fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_args();
    let token = match config.token() {
        Ok(t) => t.to_string(),
        Err(e) => {
            if let Some(hint) = e.hint() {
                log::error!("{hint}");
            }
            eprintln!("{}", Config::help());
            exit(1);
        }
    };

    match run(&config, &token) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            log::error!("Upload run aborted: {e:#}");
            exit(1);
        }
    }
}

/// Returns whether every file made it through.
fn run(config: &Config, token: &str) -> anyhow::Result<bool> {
    let client = StravaClient::new(&config.api_url, token).map_err(Error::from)?;
    let mut ctx = Context::new(
        config.upload_options(),
        UploadsService::new(client.clone()),
        CurrentAthleteService::new(client),
        SleepWait {
            spinner: std::io::stderr().is_terminal(),
        },
    );

    if config.check_athlete {
        ctx.check_athlete().context("Failed to look up the current athlete")?;
    }

    let dir = config.activities_dir();
    let report = ctx.upload_dir(&dir)?;
    log::info!(
        "Uploaded {} file(s) from {dir:?}, {} failed",
        report.completed.len(),
        report.failed.len()
    );
    for failed in &report.failed {
        log::error!("{} failed: {}", failed.file, failed.error);
    }
    Ok(report.is_success())
}
