//! Chart description and SVG rendering.
//!
//! Reports describe what to draw with a [`Figure`] and hand it to a
//! [`Renderer`]; only the renderer knows about files and backends. Tests
//! swap in a recording renderer and never touch the filesystem.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

/// The chart shapes the reports use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One slice per series; each series carries exactly one value.
    Pie,
    /// One bar per label, single series, first label on top.
    HorizontalBar,
    /// Two aligned series over a shared x axis.
    DualLine,
    /// One bar per label, series stacked left to right, first label at
    /// the bottom.
    StackedHorizontalBar,
}

/// A named sequence of values with a fixed color.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

/// A complete, backend-independent chart description.
#[derive(Debug, Clone)]
pub struct Figure {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Row labels for bar charts; unused by pie and line charts.
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    /// Canvas size in pixels, width then height.
    pub size: (u32, u32),
}

/// Writes a figure out under a caller-chosen file stem and reports the
/// resulting path.
pub trait Renderer {
    fn render(&self, figure: &Figure, name: &str) -> Result<PathBuf>;
}

/// Renders figures as standalone SVG files in one output directory.
pub struct SvgRenderer {
    out_dir: PathBuf,
}

impl SvgRenderer {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
        }
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, figure: &Figure, name: &str) -> Result<PathBuf> {
        ensure!(
            !figure.series.is_empty(),
            "figure '{}' has no series to draw",
            figure.title
        );

        let path = self.out_dir.join(format!("{name}.svg"));
        match figure.kind {
            ChartKind::Pie => draw_pie(figure, &path),
            ChartKind::HorizontalBar => draw_horizontal_bars(figure, &path),
            ChartKind::DualLine => draw_dual_line(figure, &path),
            ChartKind::StackedHorizontalBar => draw_stacked_bars(figure, &path),
        }
        .with_context(|| format!("failed to render chart to {}", path.display()))?;

        Ok(path)
    }
}

fn draw_pie(figure: &Figure, path: &Path) -> Result<()> {
    ensure!(
        figure.series.iter().all(|s| s.values.len() == 1),
        "pie slices must hold exactly one value each"
    );

    let sizes: Vec<f64> = figure.series.iter().map(|s| s.values[0]).collect();
    let colors: Vec<RGBColor> = figure.series.iter().map(|s| s.color).collect();
    let labels: Vec<String> = figure.series.iter().map(|s| s.name.clone()).collect();

    let root = SVGBackend::new(path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(&figure.title, ("sans-serif", 30).into_font())?;

    let dims = area.dim_in_pixel();
    let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
    let radius = dims.0.min(dims.1) as f64 * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 20).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 18).into_font().color(&BLACK));
    area.draw(&pie)?;

    root.present()?;
    Ok(())
}

fn draw_horizontal_bars(figure: &Figure, path: &Path) -> Result<()> {
    ensure!(
        figure.series.len() == 1,
        "horizontal bar charts take exactly one series"
    );
    let series = &figure.series[0];
    let n = figure.labels.len();
    ensure!(n > 0, "horizontal bar charts need at least one row");
    ensure!(
        series.values.len() == n,
        "series '{}' has {} values for {} labels",
        series.name,
        series.values.len(),
        n
    );

    let root = SVGBackend::new(path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = series.values.iter().copied().fold(0.0_f64, f64::max).max(1.0) * 1.08;

    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(150)
        .build_cartesian_2d(0f64..x_max, (0i32..n as i32).into_segmented())?;

    let labels = &figure.labels;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .y_labels(n)
        .y_label_formatter(&|seg: &SegmentValue<i32>| match seg {
            SegmentValue::Exact(v) | SegmentValue::CenterOf(v) => row_label(labels, *v),
            SegmentValue::Last => String::new(),
        })
        .x_label_formatter(&|v| format!("{v:.0}"))
        .label_style(("sans-serif", 15))
        .draw()?;

    // Rows are ranked already; invert the segment index so the widest bar
    // sits at the top, and fade the fill as counts shrink.
    chart.draw_series(series.values.iter().enumerate().map(|(i, &value)| {
        let row = (n - 1 - i) as i32;
        let shade = series.color.mix(1.0 - 0.55 * (i as f64 / n as f64));
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(row)),
                (value, SegmentValue::Exact(row + 1)),
            ],
            shade.filled(),
        );
        bar.set_margin(3, 3, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

fn draw_dual_line(figure: &Figure, path: &Path) -> Result<()> {
    ensure!(
        figure.series.len() == 2,
        "dual line charts take exactly two series"
    );
    let len = figure.series[0].values.len();
    ensure!(len > 0, "line charts need at least one point");
    ensure!(
        figure.series[1].values.len() == len,
        "both line series must cover the same bins"
    );

    let root = SVGBackend::new(path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = figure
        .series
        .iter()
        .flat_map(|s| s.values.iter())
        .copied()
        .fold(0.0_f64, f64::max)
        .max(1.0)
        * 1.1;
    let x_max = len.saturating_sub(1).max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .label_style(("sans-serif", 15))
        .draw()?;

    let first = &figure.series[0];
    let first_color = first.color;
    chart
        .draw_series(LineSeries::new(
            first.values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            first_color.stroke_width(2),
        ))?
        .label(first.name.as_str())
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], first_color.stroke_width(2))
        });

    let second = &figure.series[1];
    let second_color = second.color;
    chart
        .draw_series(DashedLineSeries::new(
            second.values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            6,
            4,
            second_color.stroke_width(2),
        ))?
        .label(second.name.as_str())
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], second_color.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_stacked_bars(figure: &Figure, path: &Path) -> Result<()> {
    let n = figure.labels.len();
    ensure!(n > 0, "stacked bar charts need at least one row");
    for series in &figure.series {
        ensure!(
            series.values.len() == n,
            "series '{}' has {} values for {} labels",
            series.name,
            series.values.len(),
            n
        );
    }

    let root = SVGBackend::new(path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(150)
        .build_cartesian_2d(0f64..1.0f64, (0i32..n as i32).into_segmented())?;

    let labels = &figure.labels;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .y_labels(n)
        .y_label_formatter(&|seg: &SegmentValue<i32>| match seg {
            SegmentValue::Exact(v) | SegmentValue::CenterOf(v) => {
                labels.get(*v as usize).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .x_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .label_style(("sans-serif", 15))
        .draw()?;

    // Segments accumulate left to right in series order, so each row's
    // offsets must be tracked across series. Row 0 sits at the bottom.
    let mut offsets = vec![0.0f64; n];
    for series in &figure.series {
        let color = series.color;
        let mut bars = Vec::with_capacity(n);
        for (i, &value) in series.values.iter().enumerate() {
            let row = i as i32;
            let mut bar = Rectangle::new(
                [
                    (offsets[i], SegmentValue::Exact(row)),
                    (offsets[i] + value, SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(3, 3, 0, 0);
            bars.push(bar);
            offsets[i] += value;
        }

        chart
            .draw_series(bars)?
            .label(series.name.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Bar rows are drawn top-down while segment indices grow bottom-up, so
/// the label lookup runs backwards.
fn row_label(labels: &[String], segment: i32) -> String {
    let n = labels.len();
    let i = segment as usize;
    if i < n {
        labels[n - 1 - i].clone()
    } else {
        String::new()
    }
}
