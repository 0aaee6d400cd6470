use anyhow::{Context, Result};
use clap::Parser;
use podconfig_tui::api::FeedApi;
use podconfig_tui::app::{App, AppEvent};
use podconfig_tui::config::{Config, SERVER_URL_ENV};
use podconfig_tui::ui;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(
    name = "podconfig-tui",
    about = "Terminal admin console for podconfig: add, edit, remove and reload podsync feeds"
)]
struct Args {
    /// Backend base URL (overrides PODCONFIG_URL and the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Config file (default: ~/.config/podconfig-tui/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Check that the backend is reachable and exit
    #[arg(long)]
    check: bool,
}

/// Sends logs to stderr, or to `log_file` when set. The TUI owns stdout and
/// the alternate screen, so a file is the only readable sink while it runs.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let builder =
        tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn build_api(config: &Config, server: Option<&str>) -> Result<FeedApi> {
    let env_url = std::env::var(SERVER_URL_ENV).ok();
    let base = config
        .resolve_server_url(server, env_url.as_deref())
        .context("Invalid backend URL")?;

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    Ok(FeedApi::new(client, base)
        .with_timeout(config.request_timeout())
        .with_max_response_bytes(config.max_response_bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => Config::default(),
    };

    init_tracing(config.log_file.as_deref())?;
    tracing::debug!(?config_path, "Configuration resolved");

    let api = build_api(&config, args.server.as_deref())?;

    if args.check {
        return match api.health().await {
            Ok(()) => {
                println!("{} is healthy", api.base_url());
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {} is not reachable: {}", api.base_url(), e);
                std::process::exit(1);
            }
        };
    }

    let mut app = App::new(api, &config);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    ui::run(&mut app, event_tx, event_rx).await?;

    Ok(())
}
