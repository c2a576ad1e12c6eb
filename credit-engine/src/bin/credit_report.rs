//! Credit report binary
//!
//! Usage: `credit-report <dataset.json> [--config path.toml] [--as-of YYYY-MM-DD]`

use anyhow::{anyhow, bail, Context};
use credit_engine::dates::{parse_calendar_day, today};
use credit_engine::{
    enrich_invoices, get_overdue_invoices, CustomerRiskProfile, Dataset, EngineConfig,
    InMemoryStore, NotificationCenter, PortfolioSummary, RiskScorer,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug)]
struct Args {
    dataset: PathBuf,
    config: Option<PathBuf>,
    as_of: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut dataset = None;
    let mut config = None;
    let mut as_of = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(args.next().ok_or_else(|| anyhow!("--config needs a path"))?))
            }
            "--as-of" => as_of = Some(args.next().ok_or_else(|| anyhow!("--as-of needs a date"))?),
            other if other.starts_with("--") => bail!("unknown flag {}", other),
            other => dataset = Some(PathBuf::from(other)),
        }
    }

    Ok(Args {
        dataset: dataset.ok_or_else(|| {
            anyhow!("usage: credit-report <dataset.json> [--config path.toml] [--as-of YYYY-MM-DD]")
        })?,
        config,
        as_of,
    })
}

#[derive(Serialize)]
struct Report {
    as_of: chrono::NaiveDate,
    enriched_invoices: Vec<credit_engine::EnrichedInvoice>,
    overdue: Vec<credit_engine::EnrichedInvoice>,
    customers: Vec<CustomerRiskProfile>,
    portfolio: PortfolioSummary,
    notifications: Vec<credit_engine::notifications::Notification>,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::from_env()?,
    };

    let as_of = match &args.as_of {
        Some(raw) => parse_calendar_day(raw).ok_or_else(|| anyhow!("invalid --as-of date {:?}", raw))?,
        None => today(),
    };

    let json = std::fs::read_to_string(&args.dataset)
        .with_context(|| format!("reading dataset {}", args.dataset.display()))?;
    let dataset = Dataset::from_json_str(&json)?;
    tracing::info!(
        customers = dataset.customers.len(),
        invoices = dataset.invoices.len(),
        payments = dataset.payments.len(),
        %as_of,
        "dataset loaded"
    );

    let scorer = RiskScorer::from_config(&config)?;
    let enriched = enrich_invoices(&dataset.invoices, &dataset.payments, as_of);
    let overdue = get_overdue_invoices(&dataset.invoices, &dataset.payments, as_of);
    let customers = dataset
        .customers
        .iter()
        .map(|c| scorer.assess_customer(c, &enriched, &dataset.payments))
        .collect();
    let portfolio = PortfolioSummary::compute(&dataset.customers, &enriched, &dataset.payments, &scorer);

    let center = NotificationCenter::new(InMemoryStore::new(), config.notifications.clone(), scorer);
    let notifications = center.generate(&dataset.customers, &dataset.invoices, &dataset.payments, as_of)?;

    let report = Report {
        as_of,
        enriched_invoices: enriched,
        overdue,
        customers,
        portfolio,
        notifications,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
