//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::datalink_reader::parse_rows;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::plot_csv_adapter::PlotCsvAdapter;
use crate::domain::config_validation::{validate_config, RunConfig, SourceKind};
use crate::domain::error::{LinkError, SignalError};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::session::{Session, SessionResult};
use crate::domain::value_column::DataDescriptor;
use crate::ports::broker_port::BrokerPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "linktrader",
    about = "Indicator-driven strategies over data-link custom data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a configured strategy over its data
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Write recorded plot samples to this CSV file
        #[arg(short, long)]
        plots: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Parse a data-link CSV file and print date/value rows
    Inspect {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        value_column: Option<String>,
        /// Also print an SMA over the value column
        #[arg(long)]
        sma: Option<usize>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, plots } => run_session(&config, plots.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Inspect {
            file,
            value_column,
            sma,
        } => run_inspect(&file, value_column.as_deref(), sma),
    }
}

fn fail(err: &LinkError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn run_session(config_path: &Path, plots_override: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let run_config = match validate_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    eprintln!("Strategy: {}", run_config.strategy);

    let data_port = match build_data_port(&adapter, run_config.source) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let plots_path = plots_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "plots_path").map(PathBuf::from));

    match run_pipeline(data_port.as_ref(), run_config, plots_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

pub fn build_data_port(
    config: &dyn ConfigPort,
    source: SourceKind,
) -> Result<Box<dyn DataPort>, LinkError> {
    match source {
        SourceKind::Local => {
            let path = config
                .get_string("data", "path")
                .ok_or_else(|| LinkError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path.trim()))))
        }
        #[cfg(feature = "remote")]
        SourceKind::Remote => {
            use crate::adapters::datalink_source::ApiKey;
            use crate::adapters::remote_adapter::RemoteAdapter;

            let key = ApiKey::from_config(config)?;
            Ok(Box::new(RemoteAdapter::new(key)?))
        }
        #[cfg(not(feature = "remote"))]
        SourceKind::Remote => Err(LinkError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "remote source requires building with --features remote".into(),
        }),
    }
}

/// Initialize, replay, summarize and optionally write plots.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    run_config: RunConfig,
    plots_path: Option<&Path>,
) -> Result<(), LinkError> {
    let RunConfig {
        session: session_config,
        strategy,
        ..
    } = run_config;

    eprintln!(
        "Session: {} to {}, cash {:.2}",
        session_config.start_date(),
        session_config.end_date(),
        session_config.cash()
    );
    let mut broker = PaperBroker::new(session_config.cash());
    let session = Session::initialize(session_config, strategy.into_algorithm())?;
    for sub in session.subscriptions() {
        eprintln!(
            "  Subscribed: {} [{}] ({})",
            sub.symbol, sub.descriptor, sub.resolution
        );
    }

    let result = session.run(data_port, &mut broker)?;
    print_summary(&result, broker.portfolio());

    if let Some(path) = plots_path {
        PlotCsvAdapter::new().write_plots(&result.plots, path)?;
        eprintln!("\nPlots written to: {}", path.display());
    }
    Ok(())
}

fn print_summary(result: &SessionResult, portfolio: &Portfolio) {
    let metrics = Metrics::compute(portfolio);

    eprintln!("  Processed: {} events", result.events);
    eprintln!("  Intents:   {}", result.intents.len());
    for (date, intent) in &result.intents {
        eprintln!("    {} {}", date, intent);
    }

    eprintln!("\n=== Results ===");
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Realized PnL:     {:.2}", metrics.realized_pnl);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_config(&adapter) {
        Ok(run_config) => {
            eprintln!("Config validated successfully");
            eprintln!(
                "  Session:  {} to {}, cash {:.2}",
                run_config.session.start_date(),
                run_config.session.end_date(),
                run_config.session.cash()
            );
            eprintln!("  Source:   {:?}", run_config.source);
            eprintln!("  Strategy: {}", run_config.strategy);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Render parsed rows as `date,value[,sma]` lines.
pub fn inspect_lines(
    symbol: &str,
    content: &str,
    descriptor: &DataDescriptor,
    sma_period: Option<usize>,
) -> Result<Vec<String>, LinkError> {
    let rows = parse_rows(symbol, content, descriptor).map_err(|source| LinkError::Reader {
        symbol: symbol.to_string(),
        source,
    })?;

    let Some(period) = sma_period else {
        return Ok(rows
            .iter()
            .map(|r| match r.value {
                Some(v) => format!("{},{}", r.date, v),
                None => format!("{},", r.date),
            })
            .collect());
    };

    if period == 0 {
        return Err(SignalError::InvalidPeriod(0).into());
    }
    let values: Vec<_> = rows.iter().filter_map(|r| r.value.map(|v| (r.date, v))).collect();
    let series = calculate_sma(symbol, &values, period);
    Ok(series
        .values
        .iter()
        .zip(&values)
        .map(|(point, (date, value))| {
            if point.valid {
                format!("{},{},{}", date, value, point.value)
            } else {
                format!("{},{},", date, value)
            }
        })
        .collect())
}

fn run_inspect(path: &Path, value_column: Option<&str>, sma: Option<usize>) -> ExitCode {
    let descriptor = match value_column.map(str::parse::<DataDescriptor>).transpose() {
        Ok(d) => d.unwrap_or_default(),
        Err(e) => return fail(&LinkError::from(e)),
    };

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(&LinkError::Io(e)),
    };

    let symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match inspect_lines(&symbol, &content, &descriptor, sma) {
        Ok(lines) => {
            eprintln!("{}: {} rows, value column {}", symbol, lines.len(), descriptor);
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}
