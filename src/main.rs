use clap::{Parser, Subcommand};
use colored::*;
use pairbench::bench::{expand, BenchmarkReport, BenchmarkRunner, OpBenchmark};
use pairbench::config::{BenchConfig, DEFAULT_CONFIG_PATH};
use pairbench::core::BufferPool;
use pairbench::engine::PairwiseOp;
use pairbench::logging;
use std::fs;
use std::path::Path;
use toon_format::encode_default;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pairbench")]
#[command(version = "0.1")]
#[command(about = "Micro-benchmarks for pairwise elementwise tensor operations", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark suite (default)
    Run {
        /// Path to the config file (defaults to ./pairbench.toml when present)
        #[arg(long)]
        config: Option<String>,
        /// Output format: 'display' (default, human-readable), 'json' or 'toon'
        #[arg(long, default_value = "display")]
        format: String,
        /// Only run these operations (overrides suite.ops)
        #[arg(long = "op")]
        ops: Vec<String>,
        /// Timed iterations per benchmark (overrides run.iterations)
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Write a default pairbench.toml
    Init,
    /// List the available pairwise operations
    Ops,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Run {
            config,
            format,
            ops,
            iterations,
        }) => {
            handle_run(config.as_deref(), &format, &ops, iterations)?;
        }
        Some(Commands::Init) => {
            handle_init()?;
        }
        Some(Commands::Ops) => {
            handle_ops();
        }
        None => {
            handle_run(None, "display", &[], None)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<BenchConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(BenchConfig::load(p)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Ok(BenchConfig::load(DEFAULT_CONFIG_PATH)?)
        }
        None => Ok(BenchConfig::default()),
    }
}

fn handle_run(
    config_path: Option<&str>,
    format: &str,
    ops: &[String],
    iterations: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(format, "display" | "json" | "toon") {
        return Err(format!("unknown output format '{}' (display, json, toon)", format).into());
    }
    let mut config = load_config(config_path)?;
    if !ops.is_empty() {
        config.suite.ops = ops
            .iter()
            .map(|s| s.parse::<PairwiseOp>())
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(n) = iterations {
        config.run.iterations = n;
    }
    config.validate()?;

    let mut pool = BufferPool::new();
    let benches = expand(&config.suite, &mut pool)?;
    info!(
        benchmarks = benches.len(),
        buffers = pool.allocated(),
        "suite ready"
    );

    let runner = BenchmarkRunner::new(config.run.clone());
    let reports = match runner.run_all(benches.iter().map(|b| b as &dyn OpBenchmark)) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("{}: {}", "Benchmark failed".red(), e);
            return Err(e.into());
        }
    };

    drop(benches);
    if pool.live() != 0 {
        warn!(live = pool.live(), "buffers still alive after the suite finished");
    }

    print_reports(&reports, format)
}

fn print_reports(reports: &[BenchmarkReport], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(reports)?),
        "toon" => {
            let toon = encode_default(&reports)
                .unwrap_or_else(|e| format!("Error encoding TOON: {}", e));
            println!("{}", toon);
        }
        "display" => {
            println!("{}", BenchmarkReport::header().bold());
            for report in reports {
                if report.inplace {
                    println!("{}", report.to_string().yellow());
                } else {
                    println!("{}", report);
                }
            }
        }
        other => {
            return Err(format!("unknown output format '{}' (display, json, toon)", other).into());
        }
    }
    Ok(())
}

fn handle_init() -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(DEFAULT_CONFIG_PATH).exists() {
        let default_config = BenchConfig::default().to_toml_string()?;
        fs::write(DEFAULT_CONFIG_PATH, default_config)?;
        println!(
            "Created default configuration: {}",
            DEFAULT_CONFIG_PATH.green()
        );
    } else {
        println!(
            "Configuration file already exists: {}",
            DEFAULT_CONFIG_PATH.yellow()
        );
    }
    Ok(())
}

fn handle_ops() {
    println!("{}", "Pairwise operations".bold().blue());
    for op in PairwiseOp::ALL {
        println!("{:>4}  {}", op.op_num(), op.name());
    }
}
