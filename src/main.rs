mod app;
mod config;
mod event;
mod store;
mod sync;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "t9s")]
#[command(about = "A terminal UI for a shared todo list, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/t9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Store root URL (overrides the config file)
  #[arg(short, long)]
  url: Option<String>,
}

// All state mutation happens on the one event loop; spawned tasks only
// report back through channels, so a single-threaded runtime suffices.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // --url alone is enough to run; otherwise the config file must exist.
  let config = match (&args.url, config::Config::load(args.config.as_deref())) {
    (Some(url), Err(_)) => config::Config::from_url(url.clone()),
    (Some(url), Ok(config)) => config::Config {
      store: config::StoreConfig { url: url.clone() },
      ..config
    },
    (None, result) => result?,
  };

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::state_dir()
    .or_else(dirs::cache_dir)
    .map(|dir| dir.join("t9s"))
    .unwrap_or_else(|| PathBuf::from("."));
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(&log_dir, "t9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("T9S_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
