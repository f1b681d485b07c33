//! roadmap CLI - data-driven roadmap charts
//!
//! Reads the tables of an HTML page export and renders them as a swimlane
//! roadmap, or checks them for rows that would be dropped.

mod report;
mod watch;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use roadmap_core::{ChartOverrides, RoadmapConfig, Timestamp};
use roadmap_layout::{LayoutConfig, TimelineLayout};
use roadmap_parser::{parse_file, ParseOptions, ParseReport};
use roadmap_render::{JsonRenderer, Renderer, SvgRoadmapRenderer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::report::{ExitCode, IssueEmitter, JsonEmitter, TerminalEmitter};

const DEFAULT_WIDTH: u32 = 1200;

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(author, version, about = "Roadmap charts from HTML tables", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "ROADMAP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(long, global = true)]
    width: Option<u32>,

    /// First date shown on the chart (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Last date shown on the chart (YYYY-MM-DD)
    #[arg(long, global = true, value_name = "DATE")]
    end: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the tables of a page and report problems
    Check {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Treat row problems as errors
        #[arg(long)]
        strict: bool,
    },

    /// Render a roadmap chart
    Render {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Svg)]
        format: OutputFormat,
    },

    /// Re-render whenever the input file changes
    Watch {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Svg,
    Json,
}

/// Everything a command needs after merging defaults, config file and flags
pub struct Settings {
    pub options: ParseOptions,
    pub layout: LayoutConfig,
    pub width: f64,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut config = RoadmapConfig::default();
        if let Some(path) = &self.config {
            config = config.layer(RoadmapConfig::load(path)?);
        }
        config = config.layer(RoadmapConfig {
            start_date: self.start,
            end_date: self.end,
            chart: ChartOverrides {
                width: self.width,
                ..ChartOverrides::default()
            },
            ..RoadmapConfig::default()
        });

        Ok(Settings {
            options: ParseOptions::from_config(&config),
            layout: LayoutConfig::default()
                .apply(&config.chart)
                .with_window(config.window()),
            width: f64::from(config.chart.width.unwrap_or(DEFAULT_WIDTH)),
        })
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn now() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

async fn load(file: &Path, options: &ParseOptions) -> Result<ParseReport> {
    parse_file(file, options)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

async fn check(file: &Path, settings: &Settings, format: ReportFormat, strict: bool) -> Result<ExitCode> {
    let report = load(file, &settings.options).await?;
    let stdout = std::io::stdout().lock();
    let errors = match format {
        ReportFormat::Text => TerminalEmitter::new(stdout, strict).emit(file, &report)?,
        ReportFormat::Json => JsonEmitter::new(stdout, strict).emit(file, &report)?,
    };
    Ok(ExitCode::from_error_count(errors))
}

async fn render(file: &Path, settings: &Settings, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let report = load(file, &settings.options).await?;
    for issue in &report.issues {
        tracing::warn!("{}: {}", file.display(), issue);
    }

    let chart = TimelineLayout::with_config(settings.layout.clone())
        .layout(&report.swimlanes, settings.width, now())
        .context("Failed to lay out roadmap")?;
    let content = match format {
        OutputFormat::Svg => SvgRoadmapRenderer::new().render(&chart)?,
        OutputFormat::Json => JsonRenderer.render(&chart)?,
    };

    match output {
        Some(path) => {
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                events = chart.item_count(),
                "wrote {}",
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = cli.settings()?;

    let code = match &cli.command {
        Commands::Check { file, format, strict } => check(file, &settings, *format, *strict).await?,
        Commands::Render { file, output, format } => {
            render(file, &settings, output.as_deref(), *format).await?;
            ExitCode::Success
        }
        Commands::Watch {
            file,
            output,
            interval,
        } => {
            watch::watch(file, output, settings, Duration::from_millis(*interval)).await?;
            ExitCode::Success
        }
    };

    Ok(code.into())
}
