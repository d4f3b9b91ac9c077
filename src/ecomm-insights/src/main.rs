//! Ecomm Insights: multi-country GA4 reporting.
//!
//! Queries one GA4 property per country storefront, labels each property's
//! rows with its country and prints the merged table.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use insights_analytics::{Ga4Client, MultiPropertyQuery, SharedClient};
use insights_core::{AppConfig, DateRange, PropertyConfig, QuerySpec, ResultTable};
use insights_reporting::{render, ExportFormat, ReportRunner, ReportType};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "ecomm-insights")]
#[command(about = "Query GA4 properties per country and merge the results")]
#[command(version)]
struct Cli {
    /// Settings file (TOML). Environment variables ECOMM_INSIGHTS__* override it.
    #[arg(long, short, env = "ECOMM_INSIGHTS_CONFIG")]
    config: Option<String>,

    /// Property config JSON mapping labels to property ids (overrides settings)
    #[arg(long)]
    properties: Option<String>,

    /// Access token file (overrides settings)
    #[arg(long)]
    credentials: Option<String>,

    /// Number of properties queried at once (overrides settings)
    #[arg(long)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured country labels and their property ids
    Labels,
    /// List available report templates
    Reports,
    /// Run an ad-hoc query across properties
    Query(QueryArgs),
    /// Run a named report template
    Report {
        /// Template name, see `reports`
        name: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// One row per property with headline metrics and derived ratios
    Summary {
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Comma-separated dimension names, in output order
    #[arg(long, value_delimiter = ',')]
    dimensions: Vec<String>,

    /// Comma-separated metric names, in output order
    #[arg(long, value_delimiter = ',', required = true)]
    metrics: Vec<String>,

    /// Omit the country_label column
    #[arg(long, default_value_t = false)]
    no_label: bool,

    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Start date: YYYY-MM-DD, today, yesterday or NdaysAgo
    #[arg(long)]
    start: Option<String>,

    /// End date: YYYY-MM-DD, today, yesterday or NdaysAgo
    #[arg(long)]
    end: Option<String>,

    /// Comma-separated labels to query (default: all configured)
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,

    /// Maximum rows per property
    #[arg(long)]
    limit: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Table,
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Table => ExportFormat::Table,
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

impl WindowArgs {
    fn date_range(&self, config: &AppConfig) -> anyhow::Result<DateRange> {
        let start = self.start.as_deref().unwrap_or(&config.query.start_date);
        let end = self.end.as_deref().unwrap_or(&config.query.end_date);
        Ok(DateRange::parse(start, end)?)
    }

    fn limit(&self, config: &AppConfig) -> u64 {
        self.limit.unwrap_or(config.query.row_limit)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ecomm_insights=info,insights_analytics=info,insights_reporting=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let result = run(Cli::parse()).await;
    if let Err(ref e) = result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            AppConfig::load(Some(path)).with_context(|| format!("loading settings from {path}"))?
        }
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load settings from environment, using defaults");
            AppConfig::default()
        }),
    };

    if let Some(path) = cli.properties {
        config.properties_path = path;
    }
    if let Some(path) = cli.credentials {
        config.ga4.credentials_path = path;
    }
    if let Some(n) = cli.concurrency {
        config.query.max_concurrent_properties = n;
    }

    info!(
        properties_path = %config.properties_path,
        api_base_url = %config.ga4.api_base_url,
        concurrency = config.query.max_concurrent_properties,
        "Configuration loaded"
    );

    match cli.command {
        Command::Reports => {
            for report in ReportType::ALL {
                println!("{:<20} {}", report.name(), report.description());
            }
        }
        Command::Labels => {
            let properties = PropertyConfig::load(&config.properties_path)?;
            for (label, property_id) in properties.iter() {
                println!("{label}\t{property_id}");
            }
        }
        Command::Query(args) => {
            let spec = QuerySpec::new(
                args.dimensions.clone(),
                args.metrics.clone(),
                args.window.date_range(&config)?,
            )?
            .with_limit(args.window.limit(&config))?;
            let properties = PropertyConfig::load(&config.properties_path)?;
            let table = MultiPropertyQuery::new(properties, spec)
                .maybe_labels(args.window.labels.clone())
                .attach_label(!args.no_label)
                .max_concurrent(config.query.max_concurrent_properties)
                .run(connect(&config)?)
                .await?;
            print_table(&table, args.window.format)?;
        }
        Command::Report { name, window } => {
            let report: ReportType = name.parse()?;
            let runner = runner(&config)?;
            let table = runner
                .run(
                    report,
                    window.date_range(&config)?,
                    window.labels.clone(),
                    window.limit(&config),
                )
                .await?;
            print_table(&table, window.format)?;
        }
        Command::Summary { window } => {
            let runner = runner(&config)?;
            let table = runner
                .multi_country_summary(
                    window.date_range(&config)?,
                    window.labels.clone(),
                    window.limit(&config),
                )
                .await?;
            print_table(&table, window.format)?;
        }
    }

    Ok(())
}

fn connect(config: &AppConfig) -> anyhow::Result<SharedClient> {
    let client = Ga4Client::from_config(&config.ga4).context("creating GA4 client")?;
    Ok(Arc::new(client))
}

fn runner(config: &AppConfig) -> anyhow::Result<ReportRunner> {
    let properties = PropertyConfig::load(&config.properties_path)?;
    Ok(ReportRunner::new(connect(config)?, properties)
        .with_concurrency(config.query.max_concurrent_properties))
}

fn print_table(table: &ResultTable, format: Format) -> anyhow::Result<()> {
    let output = render(table, format.into())?;
    println!("{}", output.trim_end());
    Ok(())
}
