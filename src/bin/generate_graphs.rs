//! Draw comparison charts from the exported results.json
use bp_experiments::{Config, get_json_export_path, plot_all, read_json};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to results json, default to {results_dir}/analysis/results.json
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for charts, overrides the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to configuration json, default to experiments.json if present
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    let input = args
        .input
        .unwrap_or_else(|| get_json_export_path(config.analysis_dir()));
    let output_dir = args.output_dir.unwrap_or(config.graphs_dir);

    println!("Loading results from {}", input.display());
    let results = read_json(&input)?;

    println!("Generating performance comparison graphs...");
    for path in plot_all(&results, &output_dir)? {
        println!("✓ Saved: {}", path.display());
    }

    println!();
    println!("✓ All graphs generated successfully");
    println!("   Location: {}", output_dir.display());

    Ok(())
}
