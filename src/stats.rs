//! Metric extraction from the simulator's stats.txt
use anyhow::Context;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::Path};

pub const SIM_TICKS: &str = "sim_ticks";
pub const SIM_SECONDS: &str = "sim_seconds";
pub const NUM_INSTS: &str = "num_insts";
pub const NUM_CYCLES: &str = "num_cycles";
pub const IPC: &str = "ipc";
pub const BRANCH_PRED_LOOKUPS: &str = "branch_pred_lookups";
pub const BRANCH_PRED_COND_PREDICTED: &str = "branch_pred_cond_predicted";
pub const BRANCH_PRED_COND_INCORRECT: &str = "branch_pred_cond_incorrect";

/// Shape of the number following a statistic name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// digits only
    Integer,
    /// digits and dots
    Decimal,
}

impl NumberKind {
    fn pattern(&self) -> &'static str {
        match self {
            NumberKind::Integer => r"\d+",
            NumberKind::Decimal => r"[\d.]+",
        }
    }
}

/// How one metric is located: `{stat}\s+{number}` at the start of a line
#[derive(Debug, Clone, Copy)]
pub struct MetricRule {
    /// key in MetricSet and in exports
    pub key: &'static str,
    /// statistic name as printed by the simulator
    pub stat: &'static str,
    pub kind: NumberKind,
}

pub const METRIC_RULES: &[MetricRule] = &[
    MetricRule {
        key: SIM_TICKS,
        stat: "simTicks",
        kind: NumberKind::Integer,
    },
    MetricRule {
        key: SIM_SECONDS,
        stat: "simSeconds",
        kind: NumberKind::Decimal,
    },
    MetricRule {
        key: NUM_INSTS,
        stat: "system.cpu.numInsts",
        kind: NumberKind::Integer,
    },
    MetricRule {
        key: NUM_CYCLES,
        stat: "system.cpu.numCycles",
        kind: NumberKind::Integer,
    },
    MetricRule {
        key: IPC,
        stat: "system.cpu.ipc",
        kind: NumberKind::Decimal,
    },
    MetricRule {
        key: BRANCH_PRED_LOOKUPS,
        stat: "system.cpu.branchPred.lookups",
        kind: NumberKind::Integer,
    },
    MetricRule {
        key: BRANCH_PRED_COND_PREDICTED,
        stat: "system.cpu.branchPred.condPredicted",
        kind: NumberKind::Integer,
    },
    MetricRule {
        key: BRANCH_PRED_COND_INCORRECT,
        stat: "system.cpu.branchPred.condIncorrect",
        kind: NumberKind::Integer,
    },
];

/// A counter value, keeping whether it was printed as an integer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(u64),
    Float(f64),
}

impl MetricValue {
    /// integer interpretation first, fractional as fallback
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(value) = text.parse::<u64>() {
            return Some(MetricValue::Int(value));
        }
        text.parse::<f64>().ok().map(MetricValue::Float)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(value) => *value as f64,
            MetricValue::Float(value) => *value,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(value) => write!(f, "{}", value),
            // keep the fractional part visible so 2.0 is read back as a float
            MetricValue::Float(value) => write!(f, "{:?}", value),
        }
    }
}

/// Metrics of one (predictor, benchmark) run. `None` means the statistic was not found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<MetricValue>>,
    /// condIncorrect / condPredicted in percent
    pub mispredict_rate: Option<f64>,
}

impl MetricSet {
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.values.get(key).copied().flatten()
    }

    pub fn set(&mut self, key: &str, value: Option<MetricValue>) {
        self.values.insert(key.to_string(), value);
    }

    /// Recompute mispredict_rate from the branch predictor counters.
    ///
    /// A missing predicted count leaves the rate missing, a zero predicted count gives 0.
    pub fn derive_mispredict_rate(&mut self) {
        let predicted = self.get(BRANCH_PRED_COND_PREDICTED).map(|v| v.as_f64());
        let incorrect = self.get(BRANCH_PRED_COND_INCORRECT).map(|v| v.as_f64());
        self.mispredict_rate = match (predicted, incorrect) {
            (None, _) => None,
            (Some(predicted), _) if predicted == 0.0 => Some(0.0),
            (Some(predicted), Some(incorrect)) => Some(incorrect / predicted * 100.0),
            (Some(_), None) => None,
        };
    }
}

/// Compiled METRIC_RULES
pub struct StatsParser {
    rules: Vec<(MetricRule, Regex)>,
}

impl StatsParser {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_rules(METRIC_RULES)
    }

    pub fn with_rules(rules: &[MetricRule]) -> anyhow::Result<Self> {
        let mut compiled = vec![];
        for rule in rules {
            let pattern = format!(
                r"(?m)^\s*{}\s+({})",
                regex::escape(rule.stat),
                rule.kind.pattern()
            );
            compiled.push((*rule, Regex::new(&pattern)?));
        }
        Ok(Self { rules: compiled })
    }

    /// Every rule yields an entry, so absent statistics show up as explicit `None`
    pub fn parse(&self, content: &str) -> MetricSet {
        let mut metrics = MetricSet::default();
        for (rule, regex) in &self.rules {
            let value = regex.captures(content).and_then(|captures| {
                let text = &captures[1];
                let value = MetricValue::parse(text);
                if value.is_none() {
                    warn!("Unparsable value {:?} for {}", text, rule.stat);
                }
                value
            });
            metrics.set(rule.key, value);
        }
        metrics.derive_mispredict_rate();
        metrics
    }

    /// Returns `Ok(None)` if the file does not exist. Invalid UTF-8 is replaced,
    /// statistic names and values are ASCII.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<Option<MetricSet>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        let content =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(self.parse(&String::from_utf8_lossy(&content))))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        BRANCH_PRED_COND_INCORRECT, BRANCH_PRED_COND_PREDICTED, BRANCH_PRED_LOOKUPS, IPC,
        MetricValue, NUM_CYCLES, NUM_INSTS, SIM_SECONDS, SIM_TICKS, StatsParser,
    };

    const GEM5_STATS: &str = "
---------- Begin Simulation Statistics ----------
simSeconds                                   0.000512                       # Number of seconds simulated (Second)
simTicks                                    512345000                       # Number of ticks simulated (Tick)
finalTick                                   512345000                       # Number of ticks from beginning of simulation (Tick)
hostTickRate                               1034567890                       # Simulator tick rate (ticks/s) ((Tick/Second))
system.cpu.numCycles                           512345                       # Number of cpu cycles simulated (Cycle)
system.cpu.numInsts                            204938                       # Number of instructions committed (Count)
system.cpu.ipc                               0.400002                       # IPC: instructions per cycle ((Count/Cycle))
system.cpu.branchPred.lookups                   41230                       # Number of BP lookups (Count)
system.cpu.branchPred.condPredicted             30120                       # Number of conditional branches predicted (Count)
system.cpu.branchPred.condIncorrect              1506                       # Number of conditional branches incorrect (Count)
---------- End Simulation Statistics   ----------
";

    #[test]
    fn test_gem5_stats() {
        let metrics = StatsParser::new().unwrap().parse(GEM5_STATS);
        assert_eq!(metrics.get(SIM_SECONDS), Some(MetricValue::Float(0.000512)));
        assert_eq!(metrics.get(SIM_TICKS), Some(MetricValue::Int(512345000)));
        assert_eq!(metrics.get(NUM_CYCLES), Some(MetricValue::Int(512345)));
        assert_eq!(metrics.get(NUM_INSTS), Some(MetricValue::Int(204938)));
        assert_eq!(metrics.get(IPC), Some(MetricValue::Float(0.400002)));
        assert_eq!(metrics.get(BRANCH_PRED_LOOKUPS), Some(MetricValue::Int(41230)));
        assert_eq!(metrics.mispredict_rate, Some(5.0));
    }

    #[test]
    fn test_partial_stats() {
        let content = "simTicks 500000\nsystem.cpu.numInsts 2000\nsystem.cpu.branchPred.condPredicted 1000\nsystem.cpu.branchPred.condIncorrect 50\n";
        let metrics = StatsParser::new().unwrap().parse(content);
        assert_eq!(metrics.get(SIM_TICKS), Some(MetricValue::Int(500000)));
        assert_eq!(metrics.get(NUM_INSTS), Some(MetricValue::Int(2000)));
        assert_eq!(
            metrics.get(BRANCH_PRED_COND_PREDICTED),
            Some(MetricValue::Int(1000))
        );
        assert_eq!(
            metrics.get(BRANCH_PRED_COND_INCORRECT),
            Some(MetricValue::Int(50))
        );
        assert_eq!(metrics.mispredict_rate, Some(5.0));

        // absent statistics are recorded, but as missing
        assert!(metrics.values.contains_key(IPC));
        assert_eq!(metrics.get(IPC), None);
        assert_eq!(metrics.get(SIM_SECONDS), None);
        assert_eq!(metrics.values.len(), 8);
    }

    #[test]
    fn test_mispredict_rate_edge_cases() {
        let parser = StatsParser::new().unwrap();

        // no conditional branches evaluated
        let metrics = parser.parse("system.cpu.branchPred.condPredicted 0\n");
        assert_eq!(metrics.mispredict_rate, Some(0.0));
        let metrics = parser.parse(
            "system.cpu.branchPred.condPredicted 0\nsystem.cpu.branchPred.condIncorrect 7\n",
        );
        assert_eq!(metrics.mispredict_rate, Some(0.0));

        // no predictor instrumentation
        let metrics = parser.parse("system.cpu.branchPred.condIncorrect 7\n");
        assert_eq!(metrics.mispredict_rate, None);

        // perfect prediction is a real zero
        let metrics = parser.parse(
            "system.cpu.branchPred.condPredicted 100\nsystem.cpu.branchPred.condIncorrect 0\n",
        );
        assert_eq!(metrics.mispredict_rate, Some(0.0));

        // incorrect count not reported
        let metrics = parser.parse("system.cpu.branchPred.condPredicted 100\n");
        assert_eq!(metrics.mispredict_rate, None);

        // anomalies are not clamped
        let metrics = parser.parse(
            "system.cpu.branchPred.condPredicted 10\nsystem.cpu.branchPred.condIncorrect 25\n",
        );
        assert_eq!(metrics.mispredict_rate, Some(250.0));
    }

    #[test]
    fn test_first_match_wins() {
        let content = "simTicks 100\nsimTicks 200\nhostSimTicks 5\n";
        let metrics = StatsParser::new().unwrap().parse(content);
        assert_eq!(metrics.get(SIM_TICKS), Some(MetricValue::Int(100)));

        // prefixed names belong to other statistics
        let metrics = StatsParser::new().unwrap().parse("hostSimTicks 5\n");
        assert_eq!(metrics.get(SIM_TICKS), None);
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(MetricValue::parse("42"), Some(MetricValue::Int(42)));
        assert_eq!(MetricValue::parse("4.5"), Some(MetricValue::Float(4.5)));
        assert_eq!(MetricValue::parse("1.2.3"), None);
        assert_eq!(MetricValue::Float(2.0).to_string(), "2.0");

        // a malformed decimal is missing rather than an error
        let metrics = StatsParser::new().unwrap().parse("system.cpu.ipc 1.2.3\n");
        assert_eq!(metrics.get(IPC), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let parser = StatsParser::new().unwrap();
        assert!(parser.parse_file(dir.path().join("stats.txt")).unwrap().is_none());
    }
}
