use super::extract::ensure_dir;
use crate::core::models::dataset::{Dataset, Measurement};
use crate::core::models::ids::CaseId;
use crate::core::models::interaction::InteractionType;
use crate::core::stats::descriptive::Summary;
use crate::core::stats::regression::{LinearFit, r_squared};
use crate::engine::config::TrendConfig;
use crate::engine::error::EngineError;
use crate::engine::merge;
use crate::engine::progress::{Progress, ProgressReporter};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// One colour per plotted case, in series order.
pub const PALETTE: [RGBColor; 6] = [
    RED,
    BLUE,
    GREEN,
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
    RGBColor(255, 105, 180),
];

const PLOT_SIZE: (u32, u32) = (1200, 800);
const FONT: &str = "sans-serif";
const X_RANGE: (f64, f64) = (0.0, 100.0);

/// Statistics of every structure sharing one deacetylation degree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub dd_percent: f64,
    pub mean: f64,
    pub std: f64,
    pub sem: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub case: CaseId,
    pub label: String,
    pub points: Vec<TrendPoint>,
    pub fit: LinearFit,
    pub r_squared: f64,
}

#[derive(Debug)]
pub struct TrendResult {
    pub series: Vec<TrendSeries>,
    pub plot_path: PathBuf,
}

/// Plotted value of one structure: the binding energy with its sign flipped, or
/// the total over the amino-acid block.
pub fn plotted_value(measurement: &Measurement) -> f64 {
    match measurement {
        Measurement::Energy(energy) => -energy,
        Measurement::PerResidue(_) => measurement.total(),
    }
}

pub fn plot_file_name(interaction: InteractionType) -> String {
    format!("{}_vs_dd.png", interaction.label().replace(' ', ""))
}

pub fn check_palette(series: usize) -> Result<(), EngineError> {
    if series > PALETTE.len() {
        return Err(EngineError::TooManySeries {
            requested: series,
            available: PALETTE.len(),
        });
    }
    Ok(())
}

/// Groups the records of one case by DD and fits a line through the bucket means.
pub fn series_for_case(case: CaseId, dataset: &Dataset) -> Result<TrendSeries, EngineError> {
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for record in dataset.iter() {
        buckets
            .entry(record.key.dd_code)
            .or_default()
            .push(plotted_value(&record.measurement));
    }

    let mut points = Vec::with_capacity(buckets.len());
    for (dd_code, values) in &buckets {
        let summary = Summary::of(values)?;
        points.push(TrendPoint {
            dd_percent: *dd_code as f64 / 10.0,
            mean: summary.mean,
            std: summary.std,
            sem: summary.sem,
            count: summary.count,
        });
    }

    let xs: Vec<f64> = points.iter().map(|p| p.dd_percent).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.mean).collect();
    let fit = LinearFit::fit(&xs, &ys)?;
    let predicted: Vec<f64> = xs.iter().map(|x| fit.predict(*x)).collect();
    let r_squared = r_squared(&ys, &predicted)?;

    Ok(TrendSeries {
        case,
        label: format!("HD = {:.2}", case.hd()),
        points,
        fit,
        r_squared,
    })
}

fn y_range(series: &[TrendSeries]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .flat_map(|s| s.points.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.mean - p.sem), hi.max(p.mean + p.sem))
        });
    let pad = if hi > lo { (hi - lo) * 0.1 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// Data coordinates of the equation and R2 labels of series `index`.
///
/// Each series takes its own band in the left part of the plot area, stacked
/// upwards, so every palette entry fits inside the axes.
fn annotation_anchors(index: usize, y_min: f64, y_max: f64) -> [(f64, f64); 2] {
    let x = X_RANGE.0 + 0.05 * (X_RANGE.1 - X_RANGE.0);
    let base = 0.08 + 0.14 * index as f64;
    let at = |fraction: f64| y_min + fraction * (y_max - y_min);
    [(x, at(base + 0.06)), (x, at(base))]
}

fn render(
    path: &Path,
    interaction: InteractionType,
    series: &[TrendSeries],
) -> Result<(), Box<dyn Error>> {
    let label = interaction.label();
    let (y_min, y_max) = y_range(series);

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} vs deacetylation degree", label), (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Deacetylation degree [%]")
        .y_desc(label)
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[i];

        for p in &s.points {
            let (lo, hi) = (p.mean - p.sem, p.mean + p.sem);
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(p.dd_percent, lo), (p.dd_percent, hi)],
                color,
            )))?;
            for y in [lo, hi] {
                chart.draw_series(std::iter::once(PathElement::new(
                    vec![(p.dd_percent - 0.8, y), (p.dd_percent + 0.8, y)],
                    color,
                )))?;
            }
        }
        chart.draw_series(
            s.points
                .iter()
                .map(|p| Circle::new((p.dd_percent, p.mean), 4, color.filled())),
        )?;

        let first = s.points.first().map_or(0.0, |p| p.dd_percent);
        let last = s.points.last().map_or(100.0, |p| p.dd_percent);
        chart
            .draw_series(LineSeries::new(
                [first, last].into_iter().map(|x| (x, s.fit.predict(x))),
                color.stroke_width(2),
            ))?
            .label(s.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        let [equation_at, r_squared_at] = annotation_anchors(i, y_min, y_max);
        chart.draw_series([
            Text::new(
                s.fit.equation(),
                equation_at,
                (FONT, 16).into_font().color(&color),
            ),
            Text::new(
                format!("R2 = {:.2}", s.r_squared),
                r_squared_at,
                (FONT, 16).into_font().color(&color),
            ),
        ])?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[instrument(skip_all, name = "trend_workflow", fields(interaction = %config.interaction))]
pub fn run(config: &TrendConfig, reporter: &ProgressReporter) -> Result<TrendResult, EngineError> {
    check_palette(config.cases.len())?;
    let cases = merge::resolve_cases(&config.scan.input_root, &config.cases)?;
    check_palette(cases.len())?;
    if cases.is_empty() {
        return Err(EngineError::NoData(format!(
            "no case directories under '{}'",
            config.scan.input_root.display()
        )));
    }

    let scan = merge::collect_interaction(&cases, config.interaction, &config.scan, reporter)?;
    for failure in &scan.case_failures {
        warn!("{}", failure);
    }

    reporter.report(Progress::PhaseStart { name: "Trend fit" });
    let mut series = Vec::with_capacity(cases.len());
    for (case, _) in &cases {
        let records = scan.dataset.filter(|key| key.case_id() == *case);
        if records.is_empty() {
            warn!(%case, "No records, case left out of the plot.");
            continue;
        }
        match series_for_case(*case, &records) {
            Ok(s) => {
                info!(
                    %case,
                    points = s.points.len(),
                    slope = s.fit.slope,
                    r_squared = s.r_squared,
                    "Series fitted."
                );
                series.push(s);
            }
            Err(e) => warn!(%case, "Case left out of the plot: {}", e),
        }
    }
    reporter.report(Progress::PhaseFinish);

    if series.is_empty() {
        return Err(EngineError::NoData(format!(
            "no case has enough {} records to fit a trend",
            config.interaction
        )));
    }

    ensure_dir(&config.output_dir)?;
    let plot_path = config.output_dir.join(plot_file_name(config.interaction));
    render(&plot_path, config.interaction, &series).map_err(|e| EngineError::Render {
        path: plot_path.clone(),
        message: e.to_string(),
    })?;
    info!(path = %plot_path.display(), series = series.len(), "Plot written.");

    Ok(TrendResult { series, plot_path })
}
