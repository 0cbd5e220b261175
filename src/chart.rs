//! Chart Renderer - speedup and efficiency plots
//!
//! The figure has two panels sharing the thread-count axis:
//!
//! - left: speedup per matrix plus a dashed "ideal speedup" diagonal
//! - right: efficiency per matrix plus a dashed 100% line
//!
//! [`ChartLayout`] holds everything that is decided from the data (series,
//! ranges, reference lines) so it can be checked without rasterizing.
//! Rendering and display sit behind [`ChartRenderer`] and [`ChartDisplay`].

use std::ops::Range;
use std::path::Path;
use std::process::{Command, Stdio};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::experiment::ResultsGrid;
use crate::{Error, Result};

/// Line colors, cycled by matrix index.
pub const PALETTE: [RGBColor; 3] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
];

/// Upper bound of the efficiency axis, in percent.
pub const EFFICIENCY_CEILING: f64 = 150.0;

/// Efficiency of a perfectly scaling run, in percent.
pub const IDEAL_EFFICIENCY: f64 = 100.0;

/// 15×6 inches at 300 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (4500, 1800);

const REFERENCE: RGBColor = RGBColor(0x80, 0x80, 0x80);
const FONT: &str = "sans-serif";
const SUPTITLE_PX: u32 = 68;
const TITLE_PX: u32 = 58;
const AXIS_DESC_PX: u32 = 50;
const LABEL_PX: u32 = 40;
const LINE_PX: u32 = 6;
const MARKER_PX: i32 = 22;

/// Marker shapes, cycled by matrix index alongside [`PALETTE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    /// Hollow circle
    Circle,
    /// Hollow square
    Square,
    /// Hollow triangle
    Triangle,
}

const MARKERS: [MarkerShape; 3] = [MarkerShape::Circle, MarkerShape::Square, MarkerShape::Triangle];

/// One matrix's curves.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    /// Legend label
    pub label: String,
    /// Line and marker color
    pub color: RGBColor,
    /// Marker shape
    pub marker: MarkerShape,
    /// `(threads, speedup)` points
    pub speedup: Vec<(f64, f64)>,
    /// `(threads, efficiency)` points
    pub efficiency: Vec<(f64, f64)>,
}

/// Data-driven part of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// Curves for matrices with at least one successful trial
    pub series: Vec<PlotSeries>,
    /// Largest thread count across all series (0 when there is no data)
    pub max_threads: u32,
    /// Diagonal reference points `(t, t)` for `t` in `1..=max_threads`
    pub ideal_speedup: Vec<(f64, f64)>,
    /// Shared x range
    pub x_range: Range<f64>,
    /// Speedup panel y range
    pub speedup_y: Range<f64>,
    /// Efficiency panel y range
    pub efficiency_y: Range<f64>,
}

impl ChartLayout {
    /// Build the layout from a results grid.
    ///
    /// Palette slots are assigned by position in the grid, so a matrix with
    /// no data still consumes its color.
    #[must_use]
    pub fn from_grid(grid: &ResultsGrid) -> Self {
        let series: Vec<PlotSeries> = grid
            .iter()
            .enumerate()
            .filter(|(_, (_, s))| !s.is_empty())
            .map(|(i, (name, s))| {
                let xs = s.threads().iter().map(|&t| f64::from(t));
                PlotSeries {
                    label: format!("Matrix {name}"),
                    color: PALETTE[i % PALETTE.len()],
                    marker: MARKERS[i % MARKERS.len()],
                    speedup: xs.clone().zip(s.speedup().iter().copied()).collect(),
                    efficiency: xs.zip(s.efficiency().iter().copied()).collect(),
                }
            })
            .collect();

        let max_threads = grid.max_threads().unwrap_or(0);
        let ideal_speedup = (1..=max_threads)
            .map(|t| (f64::from(t), f64::from(t)))
            .collect();
        let top = f64::from(max_threads.max(1));

        Self {
            series,
            max_threads,
            ideal_speedup,
            x_range: 0.5..top + 0.5,
            speedup_y: 0.0..top,
            efficiency_y: 0.0..EFFICIENCY_CEILING,
        }
    }
}

/// Produces the chart image for a results grid.
pub trait ChartRenderer {
    /// Render `grid` to an image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if drawing or encoding fails.
    fn render(&self, grid: &ResultsGrid, path: &Path) -> Result<()>;
}

/// Renders a PNG with the plotters bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct BitmapRenderer {
    width: u32,
    height: u32,
}

impl Default for BitmapRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1)
    }
}

impl BitmapRenderer {
    /// Renderer producing a `width × height` image.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ChartRenderer for BitmapRenderer {
    fn render(&self, grid: &ResultsGrid, path: &Path) -> Result<()> {
        let layout = ChartLayout::from_grid(grid);
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let body = root
            .titled(
                "Performance",
                (FONT, SUPTITLE_PX).into_font().style(FontStyle::Bold),
            )
            .map_err(render_error)?;
        let (left, right) = body.split_horizontally(self.width / 2);

        draw_panel(&left, &layout, Panel::Speedup).map_err(render_error)?;
        draw_panel(&right, &layout, Panel::Efficiency).map_err(render_error)?;
        root.present().map_err(render_error)?;

        tracing::info!(path = %path.display(), series = layout.series.len(), "chart rendered");
        Ok(())
    }
}

/// Renderer that draws nothing, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl ChartRenderer for NoopRenderer {
    fn render(&self, _grid: &ResultsGrid, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Speedup,
    Efficiency,
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    layout: &ChartLayout,
    panel: Panel,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (title, y_desc, y_range) = match panel {
        Panel::Speedup => (
            "Speedup vs. thread count",
            "Speedup (x)",
            layout.speedup_y.clone(),
        ),
        Panel::Efficiency => (
            "Efficiency vs. thread count",
            "Efficiency (%)",
            layout.efficiency_y.clone(),
        ),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, TITLE_PX).into_font().style(FontStyle::Bold))
        .margin(40)
        .x_label_area_size(120)
        .y_label_area_size(150)
        .build_cartesian_2d(layout.x_range.clone(), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Thread count")
        .y_desc(y_desc)
        .x_labels(layout.max_threads.max(1) as usize + 1)
        .x_label_formatter(&|x| format!("{x:.0}"))
        .label_style((FONT, LABEL_PX))
        .axis_desc_style((FONT, AXIS_DESC_PX))
        .draw()?;

    for series in &layout.series {
        let points = match panel {
            Panel::Speedup => &series.speedup,
            Panel::Efficiency => &series.efficiency,
        };
        let color = series.color;
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(LINE_PX),
            ))?
            .label(series.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 40, y)], color.stroke_width(LINE_PX))
            });

        let fill = WHITE.filled();
        let edge = color.stroke_width(LINE_PX);
        match series.marker {
            MarkerShape::Circle => {
                chart.draw_series(points.iter().map(|&p| Circle::new(p, MARKER_PX, fill)))?;
                chart.draw_series(points.iter().map(|&p| Circle::new(p, MARKER_PX, edge)))?;
            }
            MarkerShape::Square => {
                let corners = [(-MARKER_PX, -MARKER_PX), (MARKER_PX, MARKER_PX)];
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| EmptyElement::at(p) + Rectangle::new(corners, fill)),
                )?;
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| EmptyElement::at(p) + Rectangle::new(corners, edge)),
                )?;
            }
            MarkerShape::Triangle => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| TriangleMarker::new(p, MARKER_PX, fill)),
                )?;
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| TriangleMarker::new(p, MARKER_PX, edge)),
                )?;
            }
        }
    }

    let reference = REFERENCE.mix(0.7).stroke_width(LINE_PX);
    match panel {
        Panel::Speedup if !layout.ideal_speedup.is_empty() => {
            chart
                .draw_series(DashedLineSeries::new(
                    layout.ideal_speedup.clone(),
                    30,
                    20,
                    reference,
                ))?
                .label("Ideal speedup")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 40, y)], reference));
        }
        Panel::Speedup => {}
        Panel::Efficiency => {
            let (start, end) = (layout.x_range.start, layout.x_range.end);
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(start, IDEAL_EFFICIENCY), (end, IDEAL_EFFICIENCY)],
                    30,
                    20,
                    reference,
                ))?
                .label("Ideal efficiency")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 40, y)], reference));
        }
    }

    chart
        .configure_series_labels()
        .label_font((FONT, LABEL_PX))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    Ok(())
}

fn render_error(err: impl std::fmt::Display) -> Error {
    Error::Render(err.to_string())
}

/// Shows a rendered chart to the user.
pub trait ChartDisplay {
    /// Display the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no viewer is available; callers treat this as a
    /// notice, never as a failed run.
    fn show(&self, path: &Path) -> Result<()>;
}

/// Opens the chart with the platform's default image viewer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

impl ChartDisplay for SystemViewer {
    fn show(&self, path: &Path) -> Result<()> {
        if cfg!(all(unix, not(target_os = "macos")))
            && std::env::var_os("DISPLAY").is_none()
            && std::env::var_os("WAYLAND_DISPLAY").is_none()
        {
            return Err(Error::Render("no display server".to_string()));
        }
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(windows) {
            "explorer"
        } else {
            "xdg-open"
        };
        let status = Command::new(opener)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| Error::Spawn {
                program: opener.into(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Render(format!("{opener} exited with {status}")))
        }
    }
}

/// Display that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl ChartDisplay for NoDisplay {
    fn show(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Try to display the chart; a failure only prints a notice.
///
/// Returns whether the chart was shown.
pub fn present_chart(display: &dyn ChartDisplay, path: &Path) -> bool {
    match display.show(path) {
        Ok(()) => true,
        Err(err) => {
            println!(
                "Chart saved to {} (interactive display unavailable)",
                path.display()
            );
            tracing::debug!(error = %err, "chart display skipped");
            false
        }
    }
}
