//! JSON and CSV exports of a ResultTable
use crate::{
    BRANCH_PRED_COND_INCORRECT, BRANCH_PRED_COND_PREDICTED, BRANCH_PRED_LOOKUPS, IPC, MetricSet,
    MetricValue, NUM_CYCLES, NUM_INSTS, ResultTable, SIM_SECONDS, SIM_TICKS,
};
use anyhow::{Context, bail};
use log::info;
use std::{fs::File, io::BufReader, path::Path};

const PREDICTOR_COLUMN: &str = "Predictor";
const BENCHMARK_COLUMN: &str = "Benchmark";
const MISPREDICT_RATE_COLUMN: &str = "Misprediction Rate (%)";

/// Flattened csv columns after predictor and benchmark: (header, metric key)
pub const CSV_METRIC_COLUMNS: &[(&str, &str)] = &[
    ("IPC", IPC),
    (MISPREDICT_RATE_COLUMN, ""),
    ("Instructions", NUM_INSTS),
    ("Cycles", NUM_CYCLES),
    ("Sim Seconds", SIM_SECONDS),
    ("Sim Ticks", SIM_TICKS),
    ("Branch Lookups", BRANCH_PRED_LOOKUPS),
    ("Cond. Predicted", BRANCH_PRED_COND_PREDICTED),
    ("Cond. Incorrect", BRANCH_PRED_COND_INCORRECT),
];

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Nested predictor -> benchmark -> metrics, overwriting any existing file
pub fn export_json<P: AsRef<Path>>(results: &ResultTable, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    std::fs::write(path, serde_json::to_vec_pretty(results)?)?;
    info!("Exported {} results to {}", results.len(), path.display());
    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> anyhow::Result<ResultTable> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// One row per (predictor, benchmark), missing values as empty fields
pub fn export_csv<P: AsRef<Path>>(results: &ResultTable, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![PREDICTOR_COLUMN, BENCHMARK_COLUMN];
    header.extend(CSV_METRIC_COLUMNS.iter().map(|(column, _)| *column));
    writer.write_record(&header)?;

    for (predictor, benchmark, metrics) in results.rows() {
        let mut record = vec![predictor.to_string(), benchmark.to_string()];
        for (column, key) in CSV_METRIC_COLUMNS {
            let field = if *column == MISPREDICT_RATE_COLUMN {
                metrics.mispredict_rate.map(MetricValue::Float)
            } else {
                metrics.get(key)
            };
            record.push(field.map(|value| value.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!("Exported {} results to {}", results.len(), path.display());
    Ok(())
}

/// Rebuild a ResultTable from a file written by `export_csv`
pub fn read_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<ResultTable> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let header = reader.headers()?.clone();
    let expected_len = CSV_METRIC_COLUMNS.len() + 2;
    if header.len() != expected_len
        || &header[0] != PREDICTOR_COLUMN
        || &header[1] != BENCHMARK_COLUMN
    {
        bail!("Unexpected csv header: {:?}", header);
    }

    let mut results = ResultTable::new();
    for record in reader.records() {
        let record = record?;
        let mut metrics = MetricSet::default();
        for (index, (column, key)) in CSV_METRIC_COLUMNS.iter().enumerate() {
            let field = &record[index + 2];
            let value = if field.is_empty() {
                None
            } else {
                Some(
                    MetricValue::parse(field)
                        .with_context(|| format!("Invalid value {:?} in column {}", field, column))?,
                )
            };
            if *column == MISPREDICT_RATE_COLUMN {
                metrics.mispredict_rate = value.map(|value| value.as_f64());
            } else {
                metrics.set(key, value);
            }
        }
        results.insert(&record[0], &record[1], metrics);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use crate::{
        IPC, MetricValue, ResultTable, StatsParser, export_csv, export_json, read_csv, read_json,
    };

    fn sample_results() -> ResultTable {
        let parser = StatsParser::new().unwrap();
        let mut results = ResultTable::new();
        results.insert(
            "gshare",
            "bfs",
            parser.parse("simSeconds 0.000512\nsimTicks 512345000\nsystem.cpu.numInsts 204938\nsystem.cpu.numCycles 512345\nsystem.cpu.ipc 2.0\nsystem.cpu.branchPred.lookups 41230\nsystem.cpu.branchPred.condPredicted 30120\nsystem.cpu.branchPred.condIncorrect 1506\n"),
        );
        results.insert(
            "bimodal",
            "bfs",
            parser.parse("system.cpu.branchPred.condPredicted 4\nsystem.cpu.branchPred.condIncorrect 1\n"),
        );
        results.insert("bimodal", "factorial", parser.parse("simTicks 500000\n"));
        results
    }

    #[test]
    fn test_json_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis/results.json");
        let results = sample_results();

        export_json(&results, &path).unwrap();
        let first = std::fs::read(&path).unwrap();
        export_json(&results, &path).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);

        assert_eq!(read_json(&path).unwrap(), results);

        let json: serde_json::Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(json["gshare"]["bfs"]["ipc"], serde_json::json!(2.0));
        assert_eq!(json["gshare"]["bfs"]["num_insts"], serde_json::json!(204938));
        assert_eq!(json["bimodal"]["factorial"]["ipc"], serde_json::Value::Null);
        assert_eq!(
            json["bimodal"]["factorial"]["mispredict_rate"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_json_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "x".repeat(100_000)).unwrap();

        let mut results = ResultTable::new();
        results.insert("gshare", "bfs", StatsParser::new().unwrap().parse(""));
        export_json(&results, &path).unwrap();
        assert_eq!(read_json(&path).unwrap(), results);
    }

    #[test]
    fn test_csv_matches_json() {
        let dir = tempfile::tempdir().unwrap();
        let results = sample_results();
        let json_path = dir.path().join("out/results.json");
        let csv_path = dir.path().join("out/results.csv");

        export_json(&results, &json_path).unwrap();
        export_csv(&results, &csv_path).unwrap();

        let from_json = read_json(&json_path).unwrap();
        let from_csv = read_csv(&csv_path).unwrap();
        assert_eq!(from_csv, from_json);
        assert_eq!(
            from_csv.get("gshare", "bfs").unwrap().get(IPC),
            Some(MetricValue::Float(2.0))
        );

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Predictor,Benchmark,IPC,Misprediction Rate (%),Instructions,Cycles,Sim Seconds,Sim Ticks,Branch Lookups,Cond. Predicted,Cond. Incorrect"
        );
        assert_eq!(lines.next().unwrap(), "bimodal,bfs,,25.0,,,,,,4,1");
        assert_eq!(lines.next().unwrap(), "bimodal,factorial,,,,,,500000,,,");
    }
}
