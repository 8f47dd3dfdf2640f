use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use market_insights::export::{write_percentage_csv, write_series_csv};
use market_insights::frame::{facts_to_dataframe, write_csv, write_parquet, yearly_totals};
use market_insights::{Dashboard, DashboardQuery, FactCache, FactGenerator, Field, FilterCriteria, GeneratorConfig, Measure};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "market-insights")]
#[command(about = "Synthetic market dataset and dashboard chart series")]
struct Args {
    /// JSON generator config (defaults and MARKET_* env vars otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of generated years
    #[arg(long)]
    years: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the fact table and print a yearly summary
    Generate {
        /// Field to summarize by
        #[arg(long, default_value = "region")]
        segment: String,
    },
    /// Print one chart series as JSON (or CSV)
    Series {
        #[arg(long, default_value = "productCategory")]
        segment: String,
        #[arg(long, default_value = "value")]
        measure: String,
        /// Filter criteria as JSON, e.g. '{"region": ["Europe"]}'
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, value_enum, default_value_t = Shape::Segment)]
        shape: Shape,
        /// Write CSV instead of JSON (segment, stacked and percentage shapes)
        #[arg(long)]
        csv: bool,
    },
    /// Print the distinct values of every filterable field
    Options,
    /// Write the fact table to a file
    Export {
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Segment,
    Stacked,
    Percentage,
    Waterfall,
    Growth,
    Bubble,
    Channel,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::from_env()?,
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(years) = args.years {
        config.year_count = years;
    }
    config.validate()?;
    Ok(config)
}

fn parse_field(name: &str) -> Result<Field> {
    Field::from_name(name).ok_or_else(|| anyhow!("Unknown field: {}", name))
}

fn parse_measure(name: &str) -> Result<Measure> {
    Measure::from_name(name).ok_or_else(|| anyhow!("Unknown measure: {}", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Market insights starting (seed {}, {} years from {})", config.seed, config.year_count, config.first_year);

    let cache = Arc::new(FactCache::new(FactGenerator::with_standard_tables(config)));
    let dashboard = Dashboard::new(cache.clone());

    match args.command {
        Command::Generate { segment } => {
            let segment = parse_field(&segment)?;
            let table = cache.clone().get_async().await;
            if let Some(report) = cache.last_report() {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            let df = facts_to_dataframe(&table)?;
            for total in yearly_totals(&df, segment, Measure::Value)? {
                println!("{}\t{}\t{:.2}", total.year, total.segment, total.total);
            }
        }
        Command::Series { segment, measure, filter, shape, csv } => {
            let criteria = match filter {
                Some(json) => FilterCriteria::from_json(&json)?,
                None => FilterCriteria::new(),
            };
            let query = DashboardQuery::new(parse_field(&segment)?, parse_measure(&measure)?).with_criteria(criteria);
            let view = dashboard.view_async(&query).await;
            let stdout = std::io::stdout();

            match (shape, csv) {
                (Shape::Segment, true) => write_series_csv(&view.by_segment, stdout.lock())?,
                (Shape::Stacked, true) => write_series_csv(&view.stacked, stdout.lock())?,
                (Shape::Percentage, true) => write_percentage_csv(&view.percentage, stdout.lock())?,
                (Shape::Channel, true) => write_series_csv(&view.channel_groups, stdout.lock())?,
                (_, true) => return Err(anyhow!("CSV output is not available for this shape")),
                (Shape::Segment, false) => println!("{}", serde_json::to_string_pretty(&view.by_segment)?),
                (Shape::Stacked, false) => println!("{}", serde_json::to_string_pretty(&view.stacked)?),
                (Shape::Percentage, false) => println!("{}", serde_json::to_string_pretty(&view.percentage)?),
                (Shape::Waterfall, false) => println!("{}", serde_json::to_string_pretty(&view.waterfall)?),
                (Shape::Growth, false) => println!("{}", serde_json::to_string_pretty(&view.growth)?),
                (Shape::Bubble, false) => println!("{}", serde_json::to_string_pretty(&view.bubbles)?),
                (Shape::Channel, false) => println!("{}", serde_json::to_string_pretty(&view.channel_groups)?),
                (Shape::All, false) => println!("{}", serde_json::to_string_pretty(&view)?),
            }
        }
        Command::Options => {
            let options = dashboard.options();
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
        Command::Export { format, out } => {
            let table = cache.clone().get_async().await;
            let mut df = facts_to_dataframe(&table)?;
            match format {
                Format::Csv => write_csv(&mut df, &out)?,
                Format::Parquet => write_parquet(&mut df, &out)?,
            }
        }
    }

    Ok(())
}
