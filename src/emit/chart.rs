use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::calc::{acceleration_column, moving_average_column, velocity_column};
use crate::error::ArtifactWriteError;
use crate::table::{value_at, IndicatorTable, GDP, INCOME_INTERPOLATED, POPULATION};

const SIZE: (u32, u32) = (1000, 600);

const PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),  // blue
    RGBColor(255, 127, 14),  // orange
    RGBColor(44, 160, 44),   // green
    RGBColor(214, 39, 40),   // red
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Population, GDP and interpolated income over time.
    Evolution,
    /// Velocity and acceleration of GDP.
    GdpDynamics,
    /// Interpolated income with its 3- and 7-period moving averages.
    IncomeMovingAverages,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::Evolution,
        ChartKind::GdpDynamics,
        ChartKind::IncomeMovingAverages,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Evolution => "Indicator Evolution",
            ChartKind::GdpDynamics => "GDP Dynamics",
            ChartKind::IncomeMovingAverages => "Per-Capita Income Moving Averages",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::Evolution => "chart_evolution.svg",
            ChartKind::GdpDynamics => "chart_gdp_dynamics.svg",
            ChartKind::IncomeMovingAverages => "chart_moving_average.svg",
        }
    }

    fn y_desc(self) -> &'static str {
        match self {
            ChartKind::Evolution => "Value",
            ChartKind::GdpDynamics => "Change",
            ChartKind::IncomeMovingAverages => "Per-Capita Income",
        }
    }

    /// (legend label, table column) per plotted line.
    fn series(self) -> Vec<(&'static str, String)> {
        match self {
            ChartKind::Evolution => vec![
                ("Population", POPULATION.to_string()),
                ("GDP", GDP.to_string()),
                ("Per-Capita Income", INCOME_INTERPOLATED.to_string()),
            ],
            ChartKind::GdpDynamics => vec![
                ("GDP Velocity", velocity_column(GDP)),
                ("GDP Acceleration", acceleration_column(GDP)),
            ],
            ChartKind::IncomeMovingAverages => vec![
                ("Per-Capita Income", INCOME_INTERPOLATED.to_string()),
                (
                    "3-year Moving Average",
                    moving_average_column(INCOME_INTERPOLATED, 3),
                ),
                (
                    "7-year Moving Average",
                    moving_average_column(INCOME_INTERPOLATED, 7),
                ),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub path: PathBuf,
}

/// The transient chart images of one run.
#[derive(Debug, Default)]
pub struct ChartSet {
    charts: Vec<RenderedChart>,
}

impl ChartSet {
    /// Render every chart kind into `dir` as SVG.
    #[tracing::instrument(level = "info", skip(table, dir), fields(dir = %dir.as_ref().display()))]
    pub fn render_all<P: AsRef<Path>>(table: &IndicatorTable, dir: P) -> Result<ChartSet> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| ArtifactWriteError::new("chart directory", dir, e.into()))?;

        let mut set = ChartSet::default();
        for kind in ChartKind::ALL {
            let path = dir.join(kind.file_name());
            if let Err(e) = render_line_chart(table, kind, &path) {
                // drop whatever was already written before bailing out
                set.charts.push(RenderedChart { kind, path });
                set.cleanup();
                return Err(e);
            }
            set.charts.push(RenderedChart { kind, path });
        }
        info!(count = set.charts.len(), "rendered charts");
        Ok(set)
    }

    pub fn charts(&self) -> &[RenderedChart] {
        &self.charts
    }

    /// Best-effort removal of every chart file. Returns how many removals failed.
    pub fn cleanup(self) -> usize {
        let mut failures = 0;
        for chart in self.charts {
            match fs::remove_file(&chart.path) {
                Ok(()) => debug!("removed {}", chart.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("failed to remove {}: {}", chart.path.display(), e);
                    failures += 1;
                }
            }
        }
        failures
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("chart render error: {}", e)
}

/// Padded axis range over the defined values; a flat or empty range is widened.
fn axis_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Split a sequence of optional points into runs without gaps.
fn contiguous_runs(points: &[Option<(f64, f64)>]) -> Vec<Vec<(f64, f64)>> {
    points
        .split(|p| p.is_none())
        .filter(|run| !run.is_empty())
        .map(|run| run.iter().flatten().copied().collect())
        .collect()
}

/// Draw one chart kind from `table` to an SVG file at `path`.
pub fn render_line_chart(table: &IndicatorTable, kind: ChartKind, path: &Path) -> Result<()> {
    draw(table, kind, path).map_err(|e| ArtifactWriteError::new("chart image", path, e))?;
    debug!(chart = kind.title(), "wrote {}", path.display());
    Ok(())
}

fn draw(table: &IndicatorTable, kind: ChartKind, path: &Path) -> Result<()> {
    let years = table.years();
    let mut lines: Vec<(&'static str, Vec<Option<(f64, f64)>>)> = Vec::new();
    for (label, column) in kind.series() {
        let values = table.column(&column)?;
        let points = (0..table.num_rows())
            .map(|i| value_at(values, i).map(|v| (years.value(i) as f64, v)))
            .collect();
        lines.push((label, points));
    }

    let (x0, x1) = axis_range(years.iter().flatten().map(|y| y as f64));
    let (x0, x1) = (x0.floor() - 0.5, x1.ceil() + 0.5);
    let (y0, y1) = axis_range(lines.iter().flat_map(|(_, pts)| pts.iter().flatten().map(|p| p.1)));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(kind.title(), ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(kind.y_desc())
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()
        .map_err(plot_err)?;

    for (i, (label, points)) in lines.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        for run in contiguous_runs(points) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(plot_err)?;
        }
        chart
            .draw_series(
                points
                    .iter()
                    .flatten()
                    .map(|&p| Circle::new(p, 4, color.filled())),
            )
            .map_err(plot_err)?
            .label(*label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x - 10, y), (x + 10, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
