//! Grouped bar charts comparing predictors per benchmark
use crate::{IPC, MetricSet, NUM_CYCLES, ResultTable};
use log::info;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

/// Metric shown on the y axis of one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMetric {
    Ipc,
    MispredictRate,
    /// in thousands of cycles
    Cycles,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 3] = [
        ChartMetric::Ipc,
        ChartMetric::MispredictRate,
        ChartMetric::Cycles,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartMetric::Ipc => "ipc_comparison.svg",
            ChartMetric::MispredictRate => "mispred_comparison.svg",
            ChartMetric::Cycles => "cycles_comparison.svg",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ChartMetric::Ipc => "Branch Predictor IPC Comparison",
            ChartMetric::MispredictRate => "Branch Predictor Misprediction Rates",
            ChartMetric::Cycles => "Execution Cycles Comparison",
        }
    }

    fn y_desc(&self) -> &'static str {
        match self {
            ChartMetric::Ipc => "IPC (Instructions Per Cycle)",
            ChartMetric::MispredictRate => "Misprediction Rate (%)",
            ChartMetric::Cycles => "Cycles (thousands)",
        }
    }

    pub fn value(&self, metrics: &MetricSet) -> Option<f64> {
        match self {
            ChartMetric::Ipc => metrics.get(IPC).map(|value| value.as_f64()),
            ChartMetric::MispredictRate => metrics.mispredict_rate,
            ChartMetric::Cycles => metrics.get(NUM_CYCLES).map(|value| value.as_f64() / 1000.0),
        }
    }
}

/// Bar heights of one chart: x axis labels and one series per predictor
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub benchmarks: Vec<String>,
    pub series: Vec<(String, Vec<f64>)>,
}

impl ChartData {
    /// Benchmarks are the union over all predictors. A missing run or a
    /// missing metric is drawn as a zero-height bar.
    pub fn collect(results: &ResultTable, metric: ChartMetric) -> Self {
        let benchmarks: Vec<String> = results
            .benchmarks()
            .into_iter()
            .map(String::from)
            .collect();
        let series = results
            .predictors()
            .into_iter()
            .map(|predictor| {
                let values = benchmarks
                    .iter()
                    .map(|benchmark| {
                        results
                            .get(predictor, benchmark)
                            .and_then(|metrics| metric.value(metrics))
                            .unwrap_or(0.0)
                    })
                    .collect();
                (predictor.to_string(), values)
            })
            .collect();
        Self { benchmarks, series }
    }

    fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Render one chart as svg
pub fn plot_chart<P: AsRef<Path>>(data: &ChartData, metric: ChartMetric, path: P) -> anyhow::Result<()> {
    let root = SVGBackend::new(path.as_ref(), (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = match data.max_value() {
        max if max > 0.0 => max * 1.1,
        _ => 1.0,
    };
    let groups = data.benchmarks.len().max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption(metric.title(), ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..groups, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .x_desc("Benchmark")
        .y_desc(metric.y_desc())
        .draw()?;

    // bars of one benchmark share 80% of its slot
    let width = 0.8 / data.series.len().max(1) as f64;
    for (index, (predictor, values)) in data.series.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        let offset = 0.1 + width * index as f64;
        chart
            .draw_series(values.iter().enumerate().map(|(group, value)| {
                let left = group as f64 + offset;
                Rectangle::new([(left, 0.0), (left + width, *value)], color.filled())
            }))?
            .label(predictor.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    // benchmark names centered under each group
    let label_style = TextStyle::from(("sans-serif", 16).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for (group, benchmark) in data.benchmarks.iter().enumerate() {
        let (x, y) = chart.backend_coord(&(group as f64 + 0.5, 0.0));
        root.draw(&Text::new(benchmark.to_uppercase(), (x, y + 5), label_style.clone()))?;
    }

    root.present()?;
    Ok(())
}

/// Write one chart per metric into `output_dir`, returns the written paths
pub fn plot_all<P: AsRef<Path>>(results: &ResultTable, output_dir: P) -> anyhow::Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;
    let mut paths = vec![];
    for metric in ChartMetric::ALL {
        let path = output_dir.join(metric.file_name());
        plot_chart(&ChartData::collect(results, metric), metric, &path)?;
        info!("Saved {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use crate::{ChartData, ChartMetric, ResultTable, StatsParser};

    #[test]
    fn test_chart_data() {
        let parser = StatsParser::new().unwrap();
        let mut results = ResultTable::new();
        results.insert(
            "gshare",
            "bfs",
            parser.parse("system.cpu.ipc 0.75\nsystem.cpu.numCycles 4000\n"),
        );
        results.insert("gshare", "factorial", parser.parse("system.cpu.ipc 1.5\n"));
        results.insert(
            "bimodal",
            "hash_lookup",
            parser.parse("system.cpu.branchPred.condPredicted 10\nsystem.cpu.branchPred.condIncorrect 1\n"),
        );

        let ipc = ChartData::collect(&results, ChartMetric::Ipc);
        assert_eq!(ipc.benchmarks, vec!["bfs", "factorial", "hash_lookup"]);
        assert_eq!(
            ipc.series,
            vec![
                ("bimodal".to_string(), vec![0.0, 0.0, 0.0]),
                ("gshare".to_string(), vec![0.75, 1.5, 0.0]),
            ]
        );

        let cycles = ChartData::collect(&results, ChartMetric::Cycles);
        assert_eq!(cycles.series[1].1, vec![4.0, 0.0, 0.0]);

        let rate = ChartData::collect(&results, ChartMetric::MispredictRate);
        assert_eq!(rate.series[0].1, vec![0.0, 0.0, 10.0]);
        assert_eq!(rate.max_value(), 10.0);
    }

    #[test]
    fn test_file_names() {
        let names: Vec<&str> = ChartMetric::ALL.iter().map(|m| m.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "ipc_comparison.svg",
                "mispred_comparison.svg",
                "cycles_comparison.svg"
            ]
        );
    }
}
