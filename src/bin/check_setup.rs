//! Verify the experiment setup is ready to run
use bp_experiments::{Benchmark, Config, Prerequisite, list_prerequisites};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration json, default to experiments.json if present
    #[arg(long)]
    config: Option<PathBuf>,
}

fn check_item(prerequisite: &Prerequisite) -> bool {
    let exists = prerequisite.exists();
    let status = if exists { "✓" } else { "✗" };
    println!(
        "{} {}: {}",
        status,
        prerequisite.name,
        prerequisite.path.display()
    );
    if !exists {
        if let Some(fix) = prerequisite.fix {
            println!("   Fix: {}", fix);
        }
    }
    exists
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;

    println!("Checking experiment setup...");
    println!();

    let mut all_good = true;
    for prerequisite in list_prerequisites(&config, Benchmark::value_variants()) {
        all_good &= check_item(&prerequisite);
    }
    all_good &= check_item(&Prerequisite {
        name: "Entry script".to_string(),
        path: config.entry_script.clone(),
        fix: None,
    });

    println!();
    println!("{}", "=".repeat(60));
    if all_good {
        println!("Setup is ready! You can now run:");
        println!("   run_experiments");
    } else {
        println!("Setup incomplete. Fix the issues above first.");
        std::process::exit(1);
    }

    Ok(())
}
