use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};

use crate::calc::{CalculationParams, Calculator};

/// Log level for the application
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Chiffres - solve the "chiffres" numbers game
#[derive(Parser, Debug)]
#[command(name = "chiffres")]
#[command(about = "Combine all operands pairwise with + - * / to reach the target exactly")]
#[command(version)]
pub struct CliArgs {
    /// Target value to reach
    pub target: i32,

    /// Operands to combine, each used exactly once
    #[arg(required = true, num_args = 1..)]
    pub operands: Vec<i32>,

    /// Number of worker threads (default: all available processors)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Keep searching below branches that already hit the target
    /// (diagnostic; reports more filtered solutions)
    #[arg(long)]
    pub test_mode: bool,

    /// Log level (default: warn)
    #[arg(short, long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Initialize logging based on the provided log level
pub fn init_logging(log_level: &LogLevel) -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log_level.to_log_level_filter())
        .init();
    Ok(())
}

/// Run the main application logic
pub fn run() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level)?;

    let params = CalculationParams::new(args.target, &args.operands)
        .context("invalid calculation request")?;
    let mut calculator = Calculator::new(params);
    match args.threads {
        Some(threads) => calculator.set_num_threads(threads),
        None => calculator.set_mode_parallel(true),
    }
    calculator.set_test_mode(args.test_mode);
    calculator.set_on_progress(|current, max| debug!("progress {current}/{max}"));

    info!(
        "searching for {} using operands {:?}",
        args.target, args.operands
    );

    let result = calculator.run().context("calculation failed")?;
    if result.is_exact_solution_found() {
        println!(
            "{} solution(s) for target {}:",
            result.solutions().len(),
            result.target()
        );
        for solution in result.solutions() {
            println!("{solution}");
        }
    } else {
        warn!("no exact solution found");
        println!("No exact solution for target {}.", result.target());
        if result.is_lower_approximation_possible() {
            println!("Best reachable value below: {}", result.lower_approximation());
        }
        if result.is_upper_approximation_possible() {
            println!("Best reachable value above: {}", result.upper_approximation());
        }
    }
    debug!(
        "{} recursion calls, {} redundant solutions filtered",
        result.counter_recursion_calls(),
        result.num_filtered_solutions()
    );
    Ok(())
}
