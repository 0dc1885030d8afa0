mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use airq_dashboard::config::DashboardConfig;
use airq_dashboard::data::loader;
use anyhow::{anyhow, Context, Result};
use app::AirQualityApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

/// Interactive dashboard for hourly multi-site air-quality observations.
#[derive(Debug, Parser)]
#[command(name = "airq-dashboard", version, about)]
struct Cli {
    /// Observation file to open at startup (overrides `data_path` in the config).
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(long)]
    debug: bool,
}

/// Priority: RUST_LOG > --debug > config `log_level` > "info".
fn init_logging(debug: bool, config_level: Option<&str>) {
    let default = if debug {
        "debug"
    } else {
        config_level.unwrap_or("info")
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DashboardConfig::resolve(cli.config.as_deref());
    init_logging(
        cli.debug,
        config.as_ref().ok().and_then(|c| c.log_level.as_deref()),
    );
    let config = config.context("invalid configuration")?;

    let mut state = AppState::new(&config);
    match (&cli.data, &config.data_path) {
        // An explicitly requested file must load.
        (Some(path), _) => state.set_table(loader::load_file(path)?),
        (None, Some(path)) if path.is_file() => match loader::load_file(path) {
            Ok(table) => state.set_table(table),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        },
        (None, Some(path)) => log::info!("No dataset at {}, starting empty", path.display()),
        (None, None) => {}
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(AirQualityApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
