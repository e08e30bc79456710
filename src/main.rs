mod app;
mod commands;
mod config;
mod event;
mod ui;

use clap::Parser;
use color_eyre::Result;
use gridpager::grid::LogLevel;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gridpager")]
#[command(about = "Browse a paginated list API as a table in the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gridpager/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// List API endpoint; overrides api.url from the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Records per page
  #[arg(short = 's', long)]
  page_size: Option<usize>,
}

/// Log to a daily file under the data directory; the terminal belongs to the UI.
/// RUST_LOG wins over the configured `grid.log_level`.
fn init_tracing(config: &config::Config) -> Result<WorkerGuard> {
  let level = config
    .grid
    .log_level
    .as_deref()
    .and_then(LogLevel::parse)
    .unwrap_or_default();

  let log_dir = config::Config::log_dir()?;
  std::fs::create_dir_all(&log_dir)?;
  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "gridpager.log"));

  let filter = EnvFilter::builder()
    .with_default_directive(level.level_filter().into())
    .from_env_lossy();

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref(), args.url)?;
  if let Some(page_size) = args.page_size {
    config.grid.page_size = Some(page_size);
  }

  let _log_guard = init_tracing(&config)?;

  // Initialize and run the app
  let mut app = app::App::new(config).await?;
  app.run().await?;

  Ok(())
}
