mod config;
mod error;
mod export;
mod path;
mod plot;
mod report;
mod results;
mod runner;
mod stats;
mod utils;

pub use config::*;
pub use error::*;
pub use export::*;
pub use path::*;
pub use plot::*;
pub use report::*;
pub use results::*;
pub use runner::*;
pub use stats::*;
pub use utils::*;

use clap::ValueEnum;
use std::{fmt, str::FromStr};

/// Branch predictor models understood by the simulator entry script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Predictor {
    /// BiModeBP with a 4096-entry global predictor
    Bimodal,
    /// LTAGE
    Gshare,
    /// TournamentBP
    Tournament,
}

impl Predictor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Predictor::Bimodal => "bimodal",
            Predictor::Gshare => "gshare",
            Predictor::Tournament => "tournament",
        }
    }
}

/// Prebuilt RISC-V workloads under the benchmark directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Benchmark {
    /// breadth-first search over a small graph
    Bfs,
    /// recursive factorial
    Factorial,
    /// hash table lookups
    #[value(name = "hash_lookup")]
    HashLookup,
}

impl Benchmark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Benchmark::Bfs => "bfs",
            Benchmark::Factorial => "factorial",
            Benchmark::HashLookup => "hash_lookup",
        }
    }

    /// file name of the prebuilt binary, e.g. `bfs_riscv`
    pub fn binary_name(&self) -> String {
        format!("{}_riscv", self.as_str())
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of the predictor x benchmark cross-product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExperimentSpec {
    pub predictor: Predictor,
    pub benchmark: Benchmark,
}

impl fmt::Display for ExperimentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.predictor, self.benchmark)
    }
}

/// Either every variant of an enumeration or a single one, as accepted by `--predictor all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T: ValueEnum + Clone> Selection<T> {
    /// Expand into concrete values, keeping declaration order
    pub fn resolve(&self) -> Vec<T> {
        match self {
            Selection::All => T::value_variants().to_vec(),
            Selection::Only(value) => vec![value.clone()],
        }
    }
}

impl<T: ValueEnum> FromStr for Selection<T> {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Selection::All);
        }
        <T as ValueEnum>::from_str(s, false)
            .map(Selection::Only)
            .map_err(|_| HarnessError::InvalidSelection {
                value: s.to_string(),
                expected: T::value_variants()
                    .iter()
                    .filter_map(|v| v.to_possible_value())
                    .map(|v| v.get_name().to_string())
                    .chain(std::iter::once("all".to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Build the cross-product, predictors in the outer loop and benchmarks in the inner loop
pub fn experiment_matrix(predictors: &[Predictor], benchmarks: &[Benchmark]) -> Vec<ExperimentSpec> {
    let mut specs = vec![];
    for predictor in predictors {
        for benchmark in benchmarks {
            specs.push(ExperimentSpec {
                predictor: *predictor,
                benchmark: *benchmark,
            });
        }
    }
    specs
}
