//! Run every selected predictor on every selected benchmark through gem5
use bp_experiments::{
    Benchmark, Config, ExperimentRunner, Predictor, RunSummary, Selection, experiment_matrix,
    get_tqdm_style,
};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Which predictor to test: bimodal, gshare, tournament or all
    #[arg(short, long, default_value = "all")]
    predictor: Selection<Predictor>,

    /// Which benchmark to run: bfs, factorial, hash_lookup or all
    #[arg(short, long, default_value = "all")]
    benchmark: Selection<Benchmark>,

    /// Clean results directory before running
    #[arg(long)]
    clean: bool,

    /// Path to configuration json, default to experiments.json if present
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    let runner = ExperimentRunner::new(config);
    let results_dir = runner.config().results_dir.clone();

    if args.clean && runner.clean()? {
        println!("Cleaned {}", results_dir.display());
    }

    let predictors = args.predictor.resolve();
    let benchmarks = args.benchmark.resolve();

    if let Err(err) = runner.check_prerequisites(&benchmarks) {
        println!("{}", err);
        std::process::exit(1);
    }
    println!("✓ All prerequisites found");

    let specs = experiment_matrix(&predictors, &benchmarks);
    println!();
    println!(
        "Starting {} experiments at {}",
        specs.len(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "   Predictors: {}",
        predictors
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "   Benchmarks: {}",
        benchmarks
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let pbar = indicatif::ProgressBar::new(specs.len() as u64);
    pbar.set_style(get_tqdm_style()?);
    let results = runner.run_all(&specs, &pbar);
    pbar.finish();

    let summary = RunSummary::from_results(&results);
    println!("{}", "=".repeat(60));
    println!(
        "✓ Completed: {}/{} experiments successful",
        summary.successes, summary.total
    );
    if summary.failures > 0 {
        println!("✗ Failed: {}/{} experiments", summary.failures, summary.total);
    }
    println!(
        "Finished at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("Results saved to: {}", results_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  - View stats: cat {}/<predictor>/<benchmark>/stats.txt",
        results_dir.display()
    );
    println!("  - Parse results: parse_results --json --csv");
    println!("  - Draw charts: generate_graphs");

    Ok(())
}
