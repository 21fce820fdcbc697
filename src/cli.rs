//! CLI definition and dispatch.

use chrono::Duration;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::{CsvPriceAdapter, CsvQuoteAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{SimulationResult, run_backtest};
use crate::domain::candle::PriceSeries;
use crate::domain::compare::{LeaderboardEntry, leaderboard, run_many};
use crate::domain::config_validation::{parse_strategy_config, validate_strategy_config};
use crate::domain::error::PolyedgeError;
use crate::domain::market::{MarketQuote, is_degenerate_price};
use crate::domain::presets;
use crate::domain::strategy::StrategyConfig;
use crate::domain::window::{DEFAULT_MARKET_PRICE, DEFAULT_WINDOW_MINUTES, synthesize_quotes};
use crate::ports::report_port::ResultSink;

#[derive(Parser, Debug)]
#[command(
    name = "polyedge",
    about = "Backtest short-horizon prediction market strategies"
)]
pub struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Where the market windows come from.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Candle CSV: open_time,open,high,low,close,volume
    #[arg(short, long)]
    pub prices: PathBuf,
    /// Quote CSV; windows are synthesized from the candles when omitted
    #[arg(short, long)]
    pub quotes: Option<PathBuf>,
    #[arg(long, default_value = "BTCUSDT")]
    pub asset: String,
    /// Candle resolution in minutes
    #[arg(long, default_value_t = 1)]
    pub resolution: i64,
    /// Market price of synthesized windows
    #[arg(long, default_value_t = DEFAULT_MARKET_PRICE)]
    pub market_price: f64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest of one strategy
    Backtest {
        /// Strategy INI file or preset id
        #[arg(short, long)]
        strategy: String,
        #[command(flatten)]
        input: InputArgs,
        /// Write the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: String,
    },
    /// List the built-in presets
    Presets,
    /// Run several strategies over the same history and rank them
    Compare {
        /// Strategy INI files or preset ids
        #[arg(short, long, required = true, num_args = 1..)]
        strategy: Vec<String>,
        #[command(flatten)]
        input: InputArgs,
        /// Write the leaderboard as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            strategy,
            input,
            output,
        } => run_backtest_command(&strategy, &input, output.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Presets => {
            run_presets();
            Ok(())
        }
        Command::Compare {
            strategy,
            input,
            output,
        } => run_compare(&strategy, &input, output.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// A preset id, or the path of an INI strategy file.
pub fn load_strategy(source: &str) -> Result<StrategyConfig, PolyedgeError> {
    if let Some(preset) = presets::get(source) {
        validate_strategy_config(&preset.config)?;
        return Ok(preset.config);
    }
    let adapter = FileConfigAdapter::from_file(source)?;
    parse_strategy_config(&adapter)
}

/// Load the candle series and the windows to replay over it.
pub fn load_inputs(input: &InputArgs) -> Result<(PriceSeries, Vec<MarketQuote>), PolyedgeError> {
    if input.resolution < 1 {
        return Err(PolyedgeError::invalid(
            "resolution",
            "must be at least one minute",
        ));
    }
    let series = CsvPriceAdapter::new(&input.prices)
        .load_all(&input.asset, Duration::minutes(input.resolution))?;

    let gaps = series.gaps();
    if !gaps.is_empty() {
        warn!(
            asset = %series.asset(),
            gaps = gaps.len(),
            first_gap = %gaps[0].after,
            "price series has missing candles"
        );
    }

    let quotes = match &input.quotes {
        Some(path) => CsvQuoteAdapter::new(path).load_all()?,
        None => {
            if is_degenerate_price(input.market_price) {
                return Err(PolyedgeError::invalid(
                    "market_price",
                    "must be strictly between 0 and 1",
                ));
            }
            synthesize_quotes(
                &series,
                Duration::minutes(DEFAULT_WINDOW_MINUTES),
                input.market_price,
            )
        }
    };
    Ok((series, quotes))
}

fn run_backtest_command(
    source: &str,
    input: &InputArgs,
    output: Option<&Path>,
) -> Result<(), PolyedgeError> {
    let config = load_strategy(source)?;
    eprintln!("Loading strategy: {}", config.name);

    let (series, quotes) = load_inputs(input)?;
    eprintln!(
        "Running backtest: {} candles, {} windows",
        series.len(),
        quotes.len()
    );

    let result = run_backtest(&series, &quotes, &config)?;
    print_summary(&result);

    if let Some(path) = output {
        JsonReportAdapter::new().write(&result, path)?;
        eprintln!("\nResult written to: {}", path.display());
    }
    Ok(())
}

pub fn print_summary(result: &SimulationResult) {
    let m = &result.metrics;
    eprintln!("\n=== Results: {} ({}) ===", result.config.name, result.id);
    eprintln!("Final Capital:    {:.2}", result.final_capital);
    eprintln!(
        "Total P&L:        {:+.2} ({:+.2}%)",
        m.total_pnl,
        m.total_pnl_pct * 100.0
    );
    eprintln!(
        "Trades:           {} ({} won, {} lost)",
        m.total_trades, m.winning_trades, m.losing_trades
    );
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Avg EV Expected:  {:.4}", m.avg_ev_expected);
    eprintln!("Avg EV Realized:  {:.4}", m.avg_ev_realized);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!("Max Loss Streak:  {}", m.max_consecutive_losses);
    eprintln!("Skipped Windows:  {}", m.skipped_windows);
}

fn run_validate(source: &str) -> Result<(), PolyedgeError> {
    eprintln!("Validating strategy: {source}");
    let config = load_strategy(source)?;

    eprintln!("\nName:             {}", config.name);
    eprintln!("Approach:         {}", config.approach);
    eprintln!("Min EV:           {}", config.min_ev);
    eprintln!("Min Confidence:   {}", config.min_confidence);
    eprintln!("Initial Capital:  {}", config.initial_capital);
    eprintln!("Max Position:     {}", config.max_position_pct);
    eprintln!("Fee:              {}", config.fee_pct);
    eprintln!("Lookback:         {}", config.lookback_candles);
    eprintln!("Indicators:");
    for params in config.enabled_indicators() {
        eprintln!("  {params}");
    }
    eprintln!("Required history: {} candles", config.required_history());

    eprintln!("\nStrategy configuration is valid.");
    Ok(())
}

fn run_presets() {
    for preset in presets::all() {
        println!("{:<30} {}", preset.id, preset.description);
    }
}

fn run_compare(
    sources: &[String],
    input: &InputArgs,
    output: Option<&Path>,
) -> Result<(), PolyedgeError> {
    let configs = sources
        .iter()
        .map(|s| load_strategy(s))
        .collect::<Result<Vec<_>, _>>()?;
    let (series, quotes) = load_inputs(input)?;
    eprintln!(
        "Comparing {} strategies: {} candles, {} windows",
        configs.len(),
        series.len(),
        quotes.len()
    );

    let results = run_many(&series, &quotes, &configs)?;
    let board = leaderboard(&results);
    print_leaderboard(&board);

    if let Some(path) = output {
        JsonReportAdapter::new().write_leaderboard(&board, path)?;
        eprintln!("\nLeaderboard written to: {}", path.display());
    }
    Ok(())
}

fn print_leaderboard(board: &[LeaderboardEntry]) {
    eprintln!("\n=== Leaderboard ===");
    for entry in board {
        eprintln!(
            "{:>2}. {:<30} {:>4} trades  {:>5.1}% win  {:>+7.2}%  dd -{:.1}%",
            entry.rank,
            entry.name,
            entry.total_trades,
            entry.win_rate * 100.0,
            entry.total_pnl_pct * 100.0,
            entry.max_drawdown * 100.0,
        );
    }
}
