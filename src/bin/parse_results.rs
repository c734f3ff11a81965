//! Collect gem5 statistics from the results tree and compare predictors
use bp_experiments::{Config, analyze};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Export to JSON
    #[arg(long)]
    json: bool,

    /// Export to CSV
    #[arg(long)]
    csv: bool,

    /// Output directory for exports, default to {results_dir}/analysis
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Results directory to scan, overrides the configuration
    #[arg(short, long)]
    results_dir: Option<PathBuf>,

    /// Path to configuration json, default to experiments.json if present
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(results_dir) = args.results_dir {
        config.results_dir = results_dir;
    }
    let output_dir = args.output_dir.unwrap_or_else(|| config.analysis_dir());

    println!("Collecting results from {}", config.results_dir.display());
    if !config.results_dir.is_dir() {
        println!("Results directory not found: {}", config.results_dir.display());
    }
    let Some(analysis) = analyze(&config.results_dir, &output_dir, args.json, args.csv)? else {
        println!("No results found");
        return Ok(());
    };

    print!("{}", analysis.report);
    for path in &analysis.exports {
        println!("✓ Exported to {}", path.display());
    }

    println!();
    println!("✓ Analysis complete");

    Ok(())
}
