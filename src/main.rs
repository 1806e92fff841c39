use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use rusty_sales::data::filter::selection;
use rusty_sales::data::loader::load_file;
use rusty_sales::metrics::SmoothingWindow;
use rusty_sales::{DashboardState, Dimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "rusty-sales")]
#[command(about = "Aggregate a sales transaction file into dashboard metrics")]
#[command(version)]
struct Cli {
    /// Transaction file (.csv, .json or .parquet)
    input: PathBuf,

    /// Keep only these regions (repeatable or comma separated; default all)
    #[arg(long = "region", value_delimiter = ',')]
    regions: Vec<String>,

    /// Keep only these products
    #[arg(long = "product", value_delimiter = ',')]
    products: Vec<String>,

    /// Keep only these payment methods
    #[arg(long = "payment-method", value_delimiter = ',')]
    payment_methods: Vec<String>,

    /// Trend smoothing window, in data points (1-30)
    #[arg(short, long, default_value_t = SmoothingWindow::DEFAULT)]
    window: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let source = load_file(&cli.input)?;
    let mut state = DashboardState::new(source);
    state.set_window(cli.window)?;

    for (dim, values) in [
        (Dimension::Region, &cli.regions),
        (Dimension::Product, &cli.products),
        (Dimension::PaymentMethod, &cli.payment_methods),
    ] {
        if !values.is_empty() {
            state.select(dim, selection(values.iter().cloned()));
        }
    }

    let report = state.report();
    let rendered = match cli.format {
        Format::Text => report.to_string(),
        Format::Json => serde_json::to_string_pretty(&report).context("serialising report")?,
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
