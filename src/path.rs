// results folder structure:
// results/
// |- {predictor}/
//    \- {benchmark}/
//       |- stats.txt   (written by the simulator via --outdir)
//       |- stdout.txt
//       \- stderr.txt
// \- analysis/
//    |- results.json
//    \- results.csv
//
// graphs folder structure:
// docs/graphs/
// |- ipc_comparison.svg
// |- mispred_comparison.svg
// \- cycles_comparison.svg

use crate::{Benchmark, Config, ExperimentSpec};
use std::path::{Path, PathBuf};

pub const STATS_FILE: &str = "stats.txt";
pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";
pub const JSON_EXPORT_FILE: &str = "results.json";
pub const CSV_EXPORT_FILE: &str = "results.csv";

pub fn get_run_dir<P: AsRef<Path>>(results_dir: P, spec: &ExperimentSpec) -> PathBuf {
    results_dir
        .as_ref()
        .join(spec.predictor.as_str())
        .join(spec.benchmark.as_str())
}

pub fn get_benchmark_path(config: &Config, benchmark: Benchmark) -> PathBuf {
    config.benchmark_dir.join(benchmark.binary_name())
}

pub fn get_stats_path<P: AsRef<Path>>(run_dir: P) -> PathBuf {
    run_dir.as_ref().join(STATS_FILE)
}

pub fn get_json_export_path<P: AsRef<Path>>(output_dir: P) -> PathBuf {
    output_dir.as_ref().join(JSON_EXPORT_FILE)
}

pub fn get_csv_export_path<P: AsRef<Path>>(output_dir: P) -> PathBuf {
    output_dir.as_ref().join(CSV_EXPORT_FILE)
}

#[cfg(test)]
mod tests {
    use crate::{Benchmark, Config, ExperimentSpec, Predictor, get_benchmark_path, get_run_dir};
    use std::path::PathBuf;

    #[test]
    fn test_layout() {
        let spec = ExperimentSpec {
            predictor: Predictor::Tournament,
            benchmark: Benchmark::HashLookup,
        };
        assert_eq!(
            get_run_dir("results", &spec),
            PathBuf::from("results/tournament/hash_lookup")
        );
        assert_eq!(
            get_benchmark_path(&Config::default(), Benchmark::Bfs),
            PathBuf::from("benchmarks/bfs_riscv")
        );
    }
}
