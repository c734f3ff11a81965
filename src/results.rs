use crate::{MetricSet, StatsParser, get_stats_path};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

/// Aggregated results keyed by predictor, then benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    entries: BTreeMap<String, BTreeMap<String, MetricSet>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous metrics stored under the same pair, if any
    pub fn insert<P: Into<String>, B: Into<String>>(
        &mut self,
        predictor: P,
        benchmark: B,
        metrics: MetricSet,
    ) -> Option<MetricSet> {
        self.entries
            .entry(predictor.into())
            .or_default()
            .insert(benchmark.into(), metrics)
    }

    pub fn get(&self, predictor: &str, benchmark: &str) -> Option<&MetricSet> {
        self.entries
            .get(predictor)
            .and_then(|benchmarks| benchmarks.get(benchmark))
    }

    /// Sorted predictor names
    pub fn predictors(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Sorted union of benchmark names over all predictors
    pub fn benchmarks(&self) -> Vec<&str> {
        let mut benchmarks = BTreeSet::new();
        for per_predictor in self.entries.values() {
            benchmarks.extend(per_predictor.keys().map(String::as_str));
        }
        benchmarks.into_iter().collect()
    }

    /// (predictor, benchmark, metrics) in lexicographic order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str, &MetricSet)> {
        self.entries.iter().flat_map(|(predictor, benchmarks)| {
            benchmarks
                .iter()
                .map(move |(benchmark, metrics)| (predictor.as_str(), benchmark.as_str(), metrics))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Import `{root}/{predictor}/{benchmark}/stats.txt` files.
    ///
    /// Returns `Ok(None)` if the root does not exist. Non-directory entries and
    /// benchmark directories without a stats file are skipped.
    pub fn scan<P: AsRef<Path>>(root: P, parser: &StatsParser) -> anyhow::Result<Option<Self>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Ok(None);
        }

        let mut table = Self::new();
        for predictor_entry in std::fs::read_dir(root)? {
            let predictor_dir = predictor_entry?.path();
            if !predictor_dir.is_dir() {
                continue;
            }
            let Some(predictor) = predictor_dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };

            for benchmark_entry in std::fs::read_dir(&predictor_dir)? {
                let benchmark_dir = benchmark_entry?.path();
                if !benchmark_dir.is_dir() {
                    continue;
                }
                let Some(benchmark) = benchmark_dir.file_name().and_then(|name| name.to_str())
                else {
                    continue;
                };

                let stats_path = get_stats_path(&benchmark_dir);
                match parser.parse_file(&stats_path) {
                    Ok(Some(metrics)) => {
                        debug!("Parsed {}", stats_path.display());
                        table.insert(predictor, benchmark, metrics);
                    }
                    Ok(None) => debug!("No statistics in {}, skipping", benchmark_dir.display()),
                    // one unreadable run never hides the others
                    Err(err) => warn!("{:#}, skipping", err),
                }
            }
        }

        info!("Collected {} results from {}", table.len(), root.display());
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use crate::{MetricValue, NUM_INSTS, ResultTable, SIM_TICKS, StatsParser};
    use std::fs;

    #[test]
    fn test_scan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("gshare/bfs")).unwrap();
        fs::write(root.join("gshare/bfs/stats.txt"), "system.cpu.numInsts 10\n").unwrap();
        fs::create_dir_all(root.join("bimodal/factorial")).unwrap();
        fs::write(root.join("bimodal/factorial/stats.txt"), "simTicks 1\n").unwrap();
        // run that produced no statistics
        fs::create_dir_all(root.join("bimodal/hash_lookup")).unwrap();
        fs::write(root.join("bimodal/hash_lookup/stderr.txt"), "fatal\n").unwrap();
        // stray files at both levels
        fs::write(root.join("README"), "").unwrap();
        fs::write(root.join("gshare/notes.txt"), "").unwrap();
        // predictor without any completed run
        fs::create_dir_all(root.join("tournament/bfs")).unwrap();

        let table = ResultTable::scan(root, &StatsParser::new().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(table.predictors(), vec!["bimodal", "gshare"]);
        assert_eq!(table.benchmarks(), vec!["bfs", "factorial"]);
        assert_eq!(table.len(), 2);
        assert!(table.get("bimodal", "hash_lookup").is_none());
        assert_eq!(
            table.get("gshare", "bfs").unwrap().get(NUM_INSTS),
            Some(MetricValue::Int(10))
        );
        // scanning never removes anything
        assert!(root.join("bimodal/hash_lookup/stderr.txt").exists());
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("gshare/bfs")).unwrap();
        fs::write(root.join("gshare/bfs/stats.txt"), "system.cpu.numInsts 10\n").unwrap();
        fs::create_dir_all(root.join("gshare/factorial")).unwrap();
        fs::write(root.join("gshare/factorial/stats.txt"), b"simTicks 7\n\xff\xfe\n").unwrap();

        let table = ResultTable::scan(root, &StatsParser::new().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(table.benchmarks(), vec!["bfs", "factorial"]);
        assert_eq!(
            table.get("gshare", "bfs").unwrap().get(NUM_INSTS),
            Some(MetricValue::Int(10))
        );
        assert_eq!(
            table.get("gshare", "factorial").unwrap().get(SIM_TICKS),
            Some(MetricValue::Int(7))
        );
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let parser = StatsParser::new().unwrap();
        assert!(
            ResultTable::scan(dir.path().join("results"), &parser)
                .unwrap()
                .is_none()
        );

        let table = ResultTable::scan(dir.path(), &parser).unwrap().unwrap();
        assert!(table.is_empty());
    }
}
