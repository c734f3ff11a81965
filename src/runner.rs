//! Launch the simulator once per experiment and keep its output on disk
use crate::{
    Benchmark, Config, ExperimentSpec, HarnessError, STDERR_FILE, STDOUT_FILE,
    get_benchmark_path, get_run_dir,
};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::{
    fmt,
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
// how long to wait for pipe readers after killing a timed out child
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// A file the batch cannot run without
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub name: String,
    pub path: PathBuf,
    /// command that produces the file
    pub fix: Option<&'static str>,
}

impl Prerequisite {
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Simulator binary followed by every selected benchmark binary
pub fn list_prerequisites(config: &Config, benchmarks: &[Benchmark]) -> Vec<Prerequisite> {
    let mut prerequisites = vec![Prerequisite {
        name: "gem5 binary".to_string(),
        path: config.simulator.clone(),
        fix: Some("cd gem5 && scons build/RISCV/gem5.opt -j$(nproc)"),
    }];
    for benchmark in benchmarks {
        prerequisites.push(Prerequisite {
            name: format!("Benchmark {}", benchmark.binary_name()),
            path: get_benchmark_path(config, *benchmark),
            fix: Some("cd benchmarks && make"),
        });
    }
    prerequisites
}

/// How a single simulation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// non-zero exit, `None` if the child was killed by a signal
    Failed(Option<i32>),
    TimedOut(Duration),
    /// the child could not be started or waited on
    LaunchError(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        *self == RunOutcome::Success
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "✓ Success"),
            RunOutcome::Failed(Some(code)) => write!(f, "✗ Failed (return code: {})", code),
            RunOutcome::Failed(None) => write!(f, "✗ Failed (terminated by signal)"),
            RunOutcome::TimedOut(timeout) => write!(f, "✗ Timeout (>{}s)", timeout.as_secs_f64()),
            RunOutcome::LaunchError(err) => write!(f, "✗ Error: {}", err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub spec: ExperimentSpec,
    pub outcome: RunOutcome,
    pub stdout: String,
    pub stderr: String,
    /// simulator --outdir, also holds stdout.txt and stderr.txt
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RunResult]) -> Self {
        let successes = results
            .iter()
            .filter(|result| result.outcome.is_success())
            .count();
        Self {
            total: results.len(),
            successes,
            failures: results.len() - successes,
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = vec![];
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

// a grandchild may keep the pipe open after the child exits, returns `None` past the deadline
fn collect_output(reader: Option<JoinHandle<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    while !reader.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    match reader.join() {
        Ok(buf) => Some(String::from_utf8_lossy(&buf).into_owned()),
        Err(_) => Some(String::new()),
    }
}

pub struct ExperimentRunner {
    config: Config,
    timeout: Duration,
}

impl ExperimentRunner {
    pub fn new(config: Config) -> Self {
        let timeout = config.timeout();
        Self { config, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fails with every missing path at once, before anything runs
    pub fn check_prerequisites(&self, benchmarks: &[Benchmark]) -> Result<(), HarnessError> {
        let missing: Vec<Prerequisite> = list_prerequisites(&self.config, benchmarks)
            .into_iter()
            .filter(|prerequisite| !prerequisite.exists())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::MissingPrerequisites(missing))
        }
    }

    /// Remove the results directory, returns whether there was one
    pub fn clean(&self) -> anyhow::Result<bool> {
        let results_dir = &self.config.results_dir;
        if !results_dir.exists() {
            return Ok(false);
        }
        info!("Cleaning {}", results_dir.display());
        std::fs::remove_dir_all(results_dir)?;
        Ok(true)
    }

    /// `{simulator} --outdir {dir} {entry_script} --binary {benchmark} --predictor {predictor}`
    pub fn simulator_command(&self, spec: &ExperimentSpec, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.config.simulator);
        command
            .arg("--outdir")
            .arg(output_dir)
            .arg(&self.config.entry_script)
            .arg("--binary")
            .arg(get_benchmark_path(&self.config, spec.benchmark))
            .arg("--predictor")
            .arg(spec.predictor.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Run one simulation, wait up to the timeout and persist stdout.txt/stderr.txt.
    ///
    /// Only filesystem errors on the output directory are returned as `Err`,
    /// everything that goes wrong with the child is part of the outcome.
    pub fn run_experiment(&self, spec: &ExperimentSpec) -> anyhow::Result<RunResult> {
        let output_dir = get_run_dir(&self.config.results_dir, spec);
        std::fs::create_dir_all(&output_dir)?;

        let mut command = self.simulator_command(spec, &output_dir);
        debug!("Running {:?}", command);

        let (outcome, stdout, stderr) = match command.spawn() {
            Ok(mut child) => {
                let stdout_reader = child.stdout.take().map(spawn_reader);
                let stderr_reader = child.stderr.take().map(spawn_reader);

                let start = Instant::now();
                let outcome = loop {
                    match child.try_wait() {
                        Ok(Some(status)) if status.success() => break RunOutcome::Success,
                        Ok(Some(status)) => break RunOutcome::Failed(status.code()),
                        Ok(None) => {
                            if start.elapsed() >= self.timeout {
                                let _ = child.kill();
                                let _ = child.wait();
                                break RunOutcome::TimedOut(self.timeout);
                            }
                            std::thread::sleep(POLL_INTERVAL);
                        }
                        Err(err) => {
                            let _ = child.kill();
                            let _ = child.wait();
                            break RunOutcome::LaunchError(err.to_string());
                        }
                    }
                };

                // the timeout also covers draining the pipes of an exited child
                let deadline = match outcome {
                    RunOutcome::Success | RunOutcome::Failed(_) => start + self.timeout,
                    _ => Instant::now() + DRAIN_GRACE,
                };
                let stdout = collect_output(stdout_reader, deadline);
                let stderr = collect_output(stderr_reader, deadline);
                match (stdout, stderr) {
                    (Some(stdout), Some(stderr)) => (outcome, stdout, stderr),
                    (stdout, stderr) => {
                        warn!("Output pipe of {} still open past the deadline", spec);
                        let outcome = match outcome {
                            RunOutcome::Success | RunOutcome::Failed(_) => {
                                RunOutcome::TimedOut(self.timeout)
                            }
                            outcome => outcome,
                        };
                        (outcome, stdout.unwrap_or_default(), stderr.unwrap_or_default())
                    }
                }
            }
            // nothing was captured, keep the reason next to the run
            Err(err) => (
                RunOutcome::LaunchError(err.to_string()),
                String::new(),
                format!("{}\n", err),
            ),
        };

        std::fs::write(output_dir.join(STDOUT_FILE), &stdout)?;
        std::fs::write(output_dir.join(STDERR_FILE), &stderr)?;

        Ok(RunResult {
            spec: *spec,
            outcome,
            stdout,
            stderr,
            output_dir,
        })
    }

    /// Run every experiment in order, a failing one never stops the batch
    pub fn run_all(&self, specs: &[ExperimentSpec], pbar: &ProgressBar) -> Vec<RunResult> {
        let total = specs.len();
        let mut results = vec![];
        for (index, spec) in specs.iter().enumerate() {
            pbar.println(format!("[{}/{}] {}", index + 1, total, spec));

            let result = match self.run_experiment(spec) {
                Ok(result) => result,
                Err(err) => RunResult {
                    spec: *spec,
                    outcome: RunOutcome::LaunchError(format!("{:#}", err)),
                    stdout: String::new(),
                    stderr: String::new(),
                    output_dir: get_run_dir(&self.config.results_dir, spec),
                },
            };
            pbar.println(format!("    Output: {}", result.output_dir.display()));
            pbar.println(format!("    {}", result.outcome));
            if !result.outcome.is_success() {
                warn!("{} failed: {}", spec, result.outcome);
            }

            results.push(result);
            pbar.inc(1);
        }
        results
    }
}
