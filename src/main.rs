use allocator::{MetaOptimizer, RollingWindows, SharedAllocator, Ucb1Allocator, AllocatorSnapshot};
use analytics::BacktestStats;
use anyhow::{Context, bail};
use backtester::{Backtester, SimulationParams};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, init_tracing, load_config_from};
use core_types::{Bar, StrategyId};
use engine::{ExecutionCoordinator, PaperBroker};
use optimizer::{BestParameters, Optimizer};
use risk::AdaptiveRiskManager;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strategies::create_strategy;

/// The main entry point for the Tradewind strategy toolkit.
fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    // Held for the lifetime of the process so buffered log lines are flushed.
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, &config),
        Commands::Optimize(args) => handle_optimize(args, &config),
        Commands::Meta(args) => handle_meta(args, &config),
        Commands::Signal(args) => handle_signal(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backtesting, parameter search and strategy allocation over OHLC bars.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one strategy over a bar file.
    Backtest(BacktestArgs),
    /// Grid-search exit parameters for one strategy across instruments.
    Optimize(OptimizeArgs),
    /// Let the UCB1 allocator choose between strategies over rolling windows.
    Meta(MetaArgs),
    /// Size an order for the latest bar without sending it anywhere.
    Signal(SignalArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// Strategy to run (e.g., "MACrossover", "macd_trend").
    #[arg(long)]
    strategy: StrategyId,

    /// JSON file holding an array of bars, oldest first.
    #[arg(long)]
    data: PathBuf,
}

#[derive(Parser)]
struct OptimizeArgs {
    #[arg(long)]
    strategy: StrategyId,

    /// One `INSTRUMENT=path.json` pair per instrument. Repeatable.
    #[arg(long = "data", value_parser = parse_data_arg, required = true)]
    data: Vec<(String, PathBuf)>,

    /// Where to merge the winning parameters as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct MetaArgs {
    #[arg(long)]
    data: PathBuf,

    /// Bars per round.
    #[arg(long, default_value_t = 500)]
    window: usize,

    /// Bars the window advances between rounds.
    #[arg(long, default_value_t = 100)]
    step: usize,

    /// Allocator state file. Loaded when present, rewritten afterwards.
    #[arg(long)]
    state: Option<PathBuf>,
}

#[derive(Parser)]
struct SignalArgs {
    #[arg(long)]
    instrument: String,

    #[arg(long)]
    data: PathBuf,

    /// Account equity used for sizing.
    #[arg(long)]
    equity: Decimal,

    /// Allocator state file; the strategy it selects is evaluated.
    #[arg(long)]
    state: Option<PathBuf>,
}

/// Parses `INSTRUMENT=path`.
fn parse_data_arg(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((instrument, path)) if !instrument.is_empty() && !path.is_empty() => {
            Ok((instrument.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected INSTRUMENT=path, got '{}'", raw)),
    }
}

fn load_bars(path: &Path) -> anyhow::Result<Vec<Bar>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let bars: Vec<Bar> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of bars", path.display()))?;
    if bars.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
        bail!("bars in {} are not in strictly ascending time order", path.display());
    }
    Ok(bars)
}

fn load_allocator(state: Option<&Path>, meta: &MetaOptimizer) -> anyhow::Result<SharedAllocator> {
    match state {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)?;
            let snapshot = AllocatorSnapshot::from_json_str(&raw)?;
            tracing::info!(path = %path.display(), "Restored allocator state");
            Ok(SharedAllocator::new(Ucb1Allocator::from_snapshot(snapshot)?))
        }
        _ => Ok(meta.new_allocator()?),
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs, config: &Config) -> anyhow::Result<()> {
    let bars = load_bars(&args.data)?;
    let mut strategy = create_strategy(args.strategy, &config.strategies)?;
    let params = SimulationParams::from_config(&config.simulation);

    let run = Backtester::new().simulate(&bars, strategy.as_mut(), &params)?;
    tracing::info!(strategy = %args.strategy, trades = run.trades.len(), "Backtest complete");

    println!("{}", stats_table(&[(args.strategy.as_str().to_string(), &run.stats)]));
    Ok(())
}

fn handle_optimize(args: OptimizeArgs, config: &Config) -> anyhow::Result<()> {
    let mut instruments = Vec::with_capacity(args.data.len());
    let mut bars_by_instrument = HashMap::new();
    for (instrument, path) in &args.data {
        bars_by_instrument.insert(instrument.clone(), load_bars(path)?);
        instruments.push(instrument.clone());
    }

    let optimizer = Optimizer::new(
        config.optimizer.clone(),
        config.simulation.clone(),
        config.strategies.clone(),
    )?
    .with_progress(true);
    let report = optimizer.optimize(args.strategy, &instruments, &bars_by_instrument)?;

    let mut table = Table::new();
    table.set_header(vec![
        "Instrument", "SL x ATR", "TP x ATR", "Max Bars", "Trail x ATR", "Trades", "Win Rate", "Expectancy",
    ]);
    for (instrument, candidate) in &report.best {
        let stats = report.best_stats.get(instrument);
        table.add_row(vec![
            instrument.clone(),
            candidate.sl_mult.to_string(),
            candidate.tp_mult.to_string(),
            candidate.max_duration_bars.to_string(),
            candidate.trail_atr_mult.to_string(),
            stats.map_or_else(String::new, |s| s.trade_count.to_string()),
            stats.map_or_else(String::new, |s| s.win_rate.round_dp(4).to_string()),
            stats.map_or_else(String::new, |s| s.expectancy.round_dp(4).to_string()),
        ]);
    }
    println!("{table}");
    for instrument in &report.no_viable {
        println!("{}: no viable parameter set", instrument);
    }
    if !report.failures.is_empty() {
        println!("{} unit(s) failed; see log for details", report.failures.len());
    }

    if let Some(path) = args.output {
        let mut best = match std::fs::read_to_string(&path) {
            Ok(raw) => BestParameters::from_json_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BestParameters::new(),
            Err(e) => return Err(e.into()),
        };
        best.record(&report);
        std::fs::write(&path, best.to_json_string()?)?;
        tracing::info!(path = %path.display(), "Best parameters written");
    }
    Ok(())
}

fn handle_meta(args: MetaArgs, config: &Config) -> anyhow::Result<()> {
    let bars = load_bars(&args.data)?;
    if bars.is_empty() {
        bail!("{} contains no bars", args.data.display());
    }
    let meta = MetaOptimizer::new(config.allocator.clone(), config.strategies.clone(), &config.simulation);
    let allocator = load_allocator(args.state.as_deref(), &meta)?;

    let report = meta.run(&allocator, &RollingWindows::new(bars, args.window, args.step))?;

    let mut table = Table::new();
    table.set_header(vec!["Strategy", "Pulls", "Cumulative Reward", "Average Reward"]);
    for arm in &report.snapshot.arms {
        table.add_row(vec![
            arm.name.clone(),
            arm.pull_count.to_string(),
            arm.cumulative_reward.round_dp(4).to_string(),
            arm.average_reward().round_dp(4).to_string(),
        ]);
    }
    println!("{table}");
    println!("Winner(s): {}", report.winners.join(", "));

    if let Some(path) = args.state {
        std::fs::write(&path, report.snapshot.to_json_string()?)?;
    }
    Ok(())
}

fn handle_signal(args: SignalArgs, config: &Config) -> anyhow::Result<()> {
    let bars = load_bars(&args.data)?;
    let meta = MetaOptimizer::new(config.allocator.clone(), config.strategies.clone(), &config.simulation);
    let allocator = load_allocator(args.state.as_deref(), &meta)?;

    let risk = AdaptiveRiskManager::new(&config.risk_management, args.equity)?;
    let coordinator = ExecutionCoordinator::new(risk, allocator, Arc::new(PaperBroker::new()));

    let strategy_id: StrategyId = coordinator.next_strategy()?.parse()?;
    let mut strategy = create_strategy(strategy_id, &config.strategies)?;
    let signal = strategy.evaluate(&bars)?;
    let levels = SimulationParams::from_config(&config.simulation);

    match coordinator.on_signal(&args.instrument, signal, &bars, &levels)? {
        Some(intent) => {
            coordinator.dispatch(&intent)?;
            println!("{}", serde_json::to_string_pretty(&intent)?);
        }
        None => println!("{}: no order ({:?})", strategy_id, signal),
    }
    Ok(())
}

fn stats_table(rows: &[(String, &BacktestStats)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Strategy", "Trades", "Win Rate", "Avg Win", "Avg Loss", "Expectancy", "Total PnL", "Profit Factor",
        "Max DD",
    ]);
    for (name, stats) in rows {
        table.add_row(vec![
            name.clone(),
            stats.trade_count.to_string(),
            stats.win_rate.round_dp(4).to_string(),
            stats.avg_win.round_dp(4).to_string(),
            stats.avg_loss.round_dp(4).to_string(),
            stats.expectancy.round_dp(4).to_string(),
            stats.total_pnl.round_dp(4).to_string(),
            stats
                .profit_factor
                .map_or_else(|| "n/a".to_string(), |pf: Decimal| pf.round_dp(2).to_string()),
            stats.max_drawdown.round_dp(4).to_string(),
        ]);
    }
    table
}
