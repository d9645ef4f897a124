use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueHint};
use pep_dashboard::{Dashboard, DashboardConfig, Page, PageState};
use pep_model::{DatasetVariant, RegionCode};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "PEP/PrEP surveillance dashboard", long_about = None)]
struct Cli {
    /// JSON configuration file (missing keys take their defaults)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Workbook or CSV to read instead of the configured workbook
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    data: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a page's view model as JSON
    Render(RenderArgs),
    /// Write the filtered records of one dataset as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Region to include (repeatable; defaults to every known region)
    #[arg(long = "region")]
    regions: Vec<RegionCode>,

    /// First event date to include (YYYY-MM-DD; defaults to the earliest in the data)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last event date to include (YYYY-MM-DD; defaults to the latest in the data)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl FilterArgs {
    fn into_state(self, page: Page) -> PageState {
        PageState {
            page,
            regions: (!self.regions.is_empty()).then_some(self.regions),
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// home, pep or prep
    #[arg(long, default_value = "home")]
    page: Page,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// pep or prep
    #[arg(long)]
    variant: DatasetVariant,

    /// Directory receiving `<variant>_filtered.csv`
    #[arg(long, value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    #[command(flatten)]
    filters: FilterArgs,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_json_path(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(data) = cli.data {
        config.workbook = data;
    }
    let dashboard = Dashboard::new(config);

    match cli.command {
        Command::Render(args) => {
            let state = args.filters.into_state(args.page);
            let view = dashboard.render_page(&state);
            print_json(&view)?;
            Ok(if view.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Export(args) => {
            let state = args.filters.into_state(Page::from(args.variant));
            let path = dashboard
                .export_filtered(args.variant, &state, &args.out_dir)
                .with_context(|| format!("export {} data", args.variant))?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize view model")?;
    println!("{json}");
    Ok(())
}
