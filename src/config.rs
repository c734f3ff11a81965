use crate::HarnessError;
use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "experiments.json";

/// Where the simulator, benchmarks and results live. Every field is optional in the json file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// gem5 binary built for RISC-V
    pub simulator: PathBuf,
    /// python config script handed to the simulator
    pub entry_script: PathBuf,
    /// directory holding `{benchmark}_riscv` binaries
    pub benchmark_dir: PathBuf,
    /// root of `{predictor}/{benchmark}/` run directories
    pub results_dir: PathBuf,
    /// where chart images go
    pub graphs_dir: PathBuf,
    /// wall clock budget per simulation
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulator: PathBuf::from("gem5")
                .join("build")
                .join("RISCV")
                .join("gem5.opt"),
            entry_script: PathBuf::from("src").join("run_branch_pred.py"),
            benchmark_dir: PathBuf::from("benchmarks"),
            results_dir: PathBuf::from("results"),
            graphs_dir: PathBuf::from("docs").join("graphs"),
            timeout_secs: 300,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `experiments.json` if present, or fall back to defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                path
            }
        };
        debug!("Loading configuration from {}", path.display());
        let content =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_slice(&content)
            .map_err(|err| HarnessError::ConfigError(path.clone(), err))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// default `--output-dir` of the aggregator
    pub fn analysis_dir(&self) -> PathBuf {
        self.results_dir.join("analysis")
    }
}
