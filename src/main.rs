//! Collision Explorer - Motor Vehicle Collision Dashboard
//!
//! Opens the interactive dashboard, or prints a JSON summary with `summary`.

use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Parser, Subcommand};
use collision_explorer::config::{init_logging, AppConfig};
use collision_explorer::dashboard::{DashboardViews, ViewParams};
use collision_explorer::data::{AffectedCategory, DataLoader};
use collision_explorer::gui::CollisionApp;
use eframe::egui;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "collision_explorer",
    version,
    about = "Explore where and when motor vehicle collisions injure people"
)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Collisions CSV, or a zip holding one.
    #[arg(long, value_name = "PATH", env = "COLLISION_DATA")]
    data: Option<PathBuf>,

    /// Maximum number of rows to read.
    #[arg(long, value_name = "N")]
    nrows: Option<usize>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every view for one parameter set as JSON.
    Summary {
        /// Minimum number of persons injured.
        #[arg(long, default_value_t = 0, value_parser = value_parser!(u32).range(0..=19))]
        min_injured: u32,

        /// Hour of day, 0 to 23.
        #[arg(long, default_value_t = 0, value_parser = value_parser!(u32).range(0..=23))]
        hour: u32,

        /// Affected type: pedestrians, cyclists or motorists.
        #[arg(long, default_value = "pedestrians")]
        category: AffectedCategory,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(&config.log_level)?;

    match cli.command {
        Some(Commands::Summary {
            min_injured,
            hour,
            category,
        }) => run_summary(
            &config,
            ViewParams {
                min_injured,
                hour,
                category,
            },
        ),
        None => run_dashboard(config),
    }
}

/// Config file first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(nrows) = cli.nrows {
        config.nrows = nrows;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run_summary(config: &AppConfig, params: ViewParams) -> Result<()> {
    let table = DataLoader::new(&config.data_path, config.nrows)
        .load()
        .with_context(|| format!("Failed to load {}", config.data_path.display()))?;
    let views = DashboardViews::compute(&table, params, &config.density)?;

    let json = serde_json::to_string_pretty(&views.report(&table))?;
    println!("{json}");
    Ok(())
}

fn run_dashboard(config: AppConfig) -> Result<()> {
    info!(data = %config.data_path.display(), nrows = config.nrows, "starting dashboard");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Collision Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "Collision Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(CollisionApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("Dashboard failed: {e}"))
}
