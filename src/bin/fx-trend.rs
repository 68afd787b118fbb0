//! fx-trend CLI - exchange-rate lookups and trend analysis
//!
//! ## Example Usage
//!
//! ```bash
//! # Buy/sell ranges for USD during April with a 1.5% threshold
//! fx-trend --database rates.db analyze USD --from 2025-04-01 --to 2025-04-30 --threshold 1.5
//!
//! # Same, reading CSV files and printing JSON
//! fx-trend --currencies currencies.csv --rates rates.csv analyze USD \
//!     --from 2025-04-01 --to 2025-04-30 --json
//!
//! # Load CSV files into a database
//! fx-trend import currencies.csv rates.csv --database rates.db
//! ```

use anyhow::{bail, Context as _};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use fx_trend::analysis::{Recommendation, TrendSegment};
use fx_trend::config::AnalysisConfig;
use fx_trend::currency::{Currency, RateObservation};
use fx_trend::data::{InMemoryRateRepository, RateRepository, SearchKind};
use fx_trend::error::TrendError;
use fx_trend::service::CurrencyService;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

/// fx-trend: exchange-rate history and buy/sell trend analysis
#[derive(Parser)]
#[command(name = "fx-trend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exchange-rate history and buy/sell trend analysis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database with currencies and rates
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Currencies CSV (id,symbol,name)
    #[arg(long, global = true)]
    currencies: Option<PathBuf>,

    /// Rates CSV (currency_id,date,rate)
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a currency's rate history into buy/sell ranges
    Analyze {
        /// Currency symbol
        #[arg(value_name = "SYMBOL")]
        symbol: String,

        /// Start date (YYYY-MM-DD)
        #[arg(short = 'f', long)]
        from: NaiveDate,

        /// End date (YYYY-MM-DD)
        #[arg(short = 't', long)]
        to: NaiveDate,

        /// Variation threshold in percent (default from config, else 1.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List or search currencies
    Currencies {
        /// Text to search for
        #[arg(value_name = "TEXT")]
        search: Option<String>,

        /// Search names instead of symbols
        #[arg(long)]
        by_name: bool,
    },

    /// Show rate history for a currency
    History {
        #[arg(value_name = "SYMBOL")]
        symbol: String,

        #[arg(short = 'f', long)]
        from: NaiveDate,

        #[arg(short = 't', long)]
        to: NaiveDate,

        #[arg(long)]
        json: bool,
    },

    /// Show the latest rate for a currency, or its rate on one date
    Current {
        #[arg(value_name = "SYMBOL")]
        symbol: String,

        /// Date to look up instead of the latest (YYYY-MM-DD)
        #[arg(long)]
        on: Option<NaiveDate>,
    },

    /// Load currency and rate CSV files into the database
    Import {
        #[arg(value_name = "CURRENCIES_CSV")]
        currencies_csv: PathBuf,

        #[arg(value_name = "RATES_CSV")]
        rates_csv: PathBuf,
    },
}

type Service = CurrencyService<Box<dyn RateRepository>>;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());

    if cli.verbose {
        println!("{} v{}", "fx-trend".cyan().bold(), env!("CARGO_PKG_VERSION"));
        println!("Default threshold: {}%", config.threshold.to_string().dimmed());
    }

    if let Err(e) = run(cli, config) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// 2 for unknown currencies, 3 for bad input or data, 1 otherwise
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TrendError>() {
        Some(e) if e.is_not_found() => 2,
        Some(e) if e.is_client_error() => 3,
        _ => 1,
    }
}

fn load_config(path: Option<&Path>) -> AnalysisConfig {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => dirs::home_dir()
            .map(|home| home.join(".fx-trend").join("config.toml"))
            .filter(|p| p.exists()),
    };

    match path {
        Some(p) => AnalysisConfig::load(&p).unwrap_or_else(|e| {
            eprintln!("{} {} ({})", "Warning:".yellow(), e, p.display());
            AnalysisConfig::default()
        }),
        None => AnalysisConfig::default(),
    }
}

fn run(cli: Cli, mut config: AnalysisConfig) -> anyhow::Result<()> {
    if cli.database.is_some() {
        config.data.database = cli.database;
    }
    if cli.currencies.is_some() {
        config.data.currencies_csv = cli.currencies;
    }
    if cli.rates.is_some() {
        config.data.rates_csv = cli.rates;
    }

    let service = || -> anyhow::Result<Service> {
        Ok(CurrencyService::with_config(
            open_repository(&config)?,
            config.trend()?,
        )?)
    };

    match cli.command {
        Commands::Analyze {
            symbol,
            from,
            to,
            threshold,
            json,
        } => analyze(&service()?, &symbol, from, to, threshold, json),
        Commands::Currencies { search, by_name } => {
            list_currencies(&service()?, search.as_deref(), by_name)
        }
        Commands::History {
            symbol,
            from,
            to,
            json,
        } => history(&service()?, &symbol, from, to, json),
        Commands::Current { symbol, on } => current(&service()?, &symbol, on),
        Commands::Import {
            currencies_csv,
            rates_csv,
        } => import(&config, &currencies_csv, &rates_csv),
    }
}

fn load_csv(currencies: &Path, rates: &Path) -> anyhow::Result<InMemoryRateRepository> {
    let mut repo = InMemoryRateRepository::new();
    let currency_file = File::open(currencies)
        .with_context(|| format!("opening {}", currencies.display()))?;
    let rate_file = File::open(rates).with_context(|| format!("opening {}", rates.display()))?;

    repo.load_currencies_csv(currency_file)?;
    repo.load_rates_csv(rate_file)?;
    log::info!(
        "Loaded {} currencies and {} rates from CSV",
        repo.num_currencies(),
        repo.num_rates()
    );
    Ok(repo)
}

fn open_repository(config: &AnalysisConfig) -> anyhow::Result<Box<dyn RateRepository>> {
    if let (Some(currencies), Some(rates)) = (&config.data.currencies_csv, &config.data.rates_csv) {
        return Ok(Box::new(load_csv(currencies, rates)?));
    }

    if let Some(repo) = open_database(config)? {
        return Ok(repo);
    }

    bail!("no data source: pass --database, or both --currencies and --rates")
}

#[cfg(feature = "rusqlite-support")]
fn open_database(config: &AnalysisConfig) -> anyhow::Result<Option<Box<dyn RateRepository>>> {
    match &config.data.database {
        Some(db) => {
            let repo = fx_trend::data::SqliteRateRepository::open(db)
                .with_context(|| format!("opening database {}", db.display()))?;
            Ok(Some(Box::new(repo)))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "rusqlite-support"))]
fn open_database(_config: &AnalysisConfig) -> anyhow::Result<Option<Box<dyn RateRepository>>> {
    Ok(None)
}

#[cfg(feature = "rusqlite-support")]
fn import(config: &AnalysisConfig, currencies: &Path, rates: &Path) -> anyhow::Result<()> {
    let Some(db) = &config.data.database else {
        bail!("import needs --database");
    };

    let source = load_csv(currencies, rates)?;
    let repo = fx_trend::data::SqliteRateRepository::open(db)?;
    let (n_currencies, n_rates) = repo.import_from(&source)?;

    println!(
        "{} {} currencies, {} rates into {}",
        "Imported".green().bold(),
        n_currencies,
        n_rates,
        db.display()
    );
    Ok(())
}

#[cfg(not(feature = "rusqlite-support"))]
fn import(_config: &AnalysisConfig, _currencies: &Path, _rates: &Path) -> anyhow::Result<()> {
    bail!("import requires the rusqlite-support feature")
}

fn analyze(
    service: &Service,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    threshold: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let threshold = threshold.unwrap_or(service.config().threshold_pct);
    let segments = service.analyze_trend(symbol, from, to, threshold)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    if let Some(first) = segments.first() {
        println!("{} (threshold {}%)", first.currency.bold(), threshold);
    }
    for segment in &segments {
        print_segment(segment);
    }
    Ok(())
}

fn print_segment(segment: &TrendSegment) {
    let label = match segment.recommendation {
        Recommendation::Sell => segment.recommendation.as_str().red().bold(),
        Recommendation::Buy => segment.recommendation.as_str().green().bold(),
        Recommendation::NoChange => segment.recommendation.as_str().dimmed(),
    };
    println!("  {}  {}  {}", segment.from_date, segment.to_date, label);
}

fn list_currencies(service: &Service, search: Option<&str>, by_name: bool) -> anyhow::Result<()> {
    let currencies: Vec<Currency> = match search {
        Some(text) => {
            let kind = if by_name { SearchKind::Name } else { SearchKind::Symbol };
            service.search(kind, text)?
        }
        None => service.currencies()?,
    };

    if currencies.is_empty() {
        println!("{}", "No currencies found".yellow());
    }
    for currency in &currencies {
        println!("  {:>4}  {:<6} {}", currency.id, currency.symbol.bold(), currency.name);
    }
    Ok(())
}

fn history(
    service: &Service,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    json: bool,
) -> anyhow::Result<()> {
    let currency = service.resolve_symbol(symbol)?;
    let rates: Vec<RateObservation> = service.rate_history(currency.id, from, to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rates)?);
        return Ok(());
    }

    println!("{} ({} rates)", currency.label().bold(), rates.len());
    for obs in &rates {
        println!("  {}  {:>14.4}", obs.date, obs.rate);
    }
    Ok(())
}

fn current(service: &Service, symbol: &str, on: Option<NaiveDate>) -> anyhow::Result<()> {
    let currency = service.resolve_symbol(symbol)?;
    let obs = match on {
        Some(date) => service.rate_on(currency.id, date)?,
        None => service.current_rate(currency.id)?,
    };
    println!("{}  {}  {:.4}", currency.label().bold(), obs.date, obs.rate);
    Ok(())
}
