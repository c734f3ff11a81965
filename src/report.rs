//! Terminal comparison table and the aggregator pass
use crate::{
    IPC, MetricSet, MetricValue, NUM_CYCLES, NUM_INSTS, ResultTable, StatsParser, export_csv,
    export_json, get_csv_export_path, get_json_export_path,
};
use cli_table::{Cell, CellStruct, Table};
use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

const NOT_AVAILABLE: &str = "N/A";

// insert a comma every three digits from the right
fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Format a counter with thousands separators, e.g. `1,234,567`
pub fn group_thousands(value: &MetricValue) -> String {
    match value {
        MetricValue::Int(value) => group_digits(&value.to_string()),
        MetricValue::Float(value) => {
            let text = value.to_string();
            match text.split_once('.') {
                Some((int_part, frac_part)) => format!("{}.{}", group_digits(int_part), frac_part),
                None => group_digits(&text),
            }
        }
    }
}

pub fn format_ipc(value: Option<MetricValue>) -> String {
    match value {
        Some(value) => format!("{:.4}", value.as_f64()),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.2}%", rate),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_count(value: Option<MetricValue>) -> String {
    match value {
        Some(value) => group_thousands(&value),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn metric_row(predictor: &str, metrics: &MetricSet) -> Vec<CellStruct> {
    vec![
        predictor.cell(),
        format_ipc(metrics.get(IPC)).cell(),
        format_rate(metrics.mispredict_rate).cell(),
        format_count(metrics.get(NUM_INSTS)).cell(),
        format_count(metrics.get(NUM_CYCLES)).cell(),
    ]
}

/// One section per benchmark, one row per predictor, both sorted
pub fn render_comparison(results: &ResultTable) -> anyhow::Result<String> {
    let mut output = String::new();
    let rule = "=".repeat(80);
    writeln!(output, "{}", rule)?;
    writeln!(output, "BRANCH PREDICTOR COMPARISON")?;
    writeln!(output, "{}", rule)?;

    let predictors = results.predictors();
    for benchmark in results.benchmarks() {
        writeln!(output)?;
        writeln!(output, "{}", benchmark.to_uppercase())?;

        let mut table = vec![];
        for predictor in &predictors {
            match results.get(predictor, benchmark) {
                Some(metrics) => table.push(metric_row(predictor, metrics)),
                None => table.push(vec![
                    predictor.cell(),
                    "NO DATA".cell(),
                    "".cell(),
                    "".cell(),
                    "".cell(),
                ]),
            }
        }
        let table = table.table().title(vec![
            "Predictor".cell(),
            "IPC".cell(),
            "Mispred %".cell(),
            "Instructions".cell(),
            "Cycles".cell(),
        ]);
        writeln!(output, "{}", table.display()?)?;
    }

    Ok(output)
}

#[derive(Debug)]
pub struct Analysis {
    pub results: ResultTable,
    /// rendered comparison table
    pub report: String,
    /// export files written, json first
    pub exports: Vec<PathBuf>,
}

/// Scan `results_dir`, render the comparison and write the requested exports into `output_dir`.
///
/// Returns `Ok(None)` if there is no result to report, no file is written in that case.
pub fn analyze<P: AsRef<Path>, Q: AsRef<Path>>(
    results_dir: P,
    output_dir: Q,
    json: bool,
    csv: bool,
) -> anyhow::Result<Option<Analysis>> {
    let parser = StatsParser::new()?;
    let results = match ResultTable::scan(results_dir, &parser)? {
        Some(results) if !results.is_empty() => results,
        _ => return Ok(None),
    };
    let report = render_comparison(&results)?;

    let mut exports = vec![];
    if json {
        let path = get_json_export_path(&output_dir);
        export_json(&results, &path)?;
        exports.push(path);
    }
    if csv {
        let path = get_csv_export_path(&output_dir);
        export_csv(&results, &path)?;
        exports.push(path);
    }

    Ok(Some(Analysis {
        results,
        report,
        exports,
    }))
}
