//! Figure rendering with `plotters`.
//!
//! Each figure implements [`Figure`] once, generically over the drawing
//! backend; [`render`] picks SVG or PNG from the output file extension.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::analysis::{BarSummary, FinalStateSummary, GovernorateGrid, TimeSeriesSummary};
use crate::config::ScenarioLabels;
use crate::stats::Bin;

/// Deep blue used for simulated data.
pub const SIMULATED: RGBColor = RGBColor(10, 90, 119);
/// Light blue used for the comparison scenario and observed bars.
pub const OBSERVED: RGBColor = RGBColor(129, 181, 209);

const FONT: &str = "sans-serif";

/// A figure that can be drawn onto any `plotters` backend.
pub trait Figure {
    /// Pixel size of the figure.
    fn size(&self) -> (u32, u32);

    /// Draws the figure onto `root`.
    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static;
}

/// Renders `figure` to `path`, as SVG for `.svg` and PNG otherwise.
pub fn render<F: Figure>(figure: &F, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let is_svg = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        let root = SVGBackend::new(path, figure.size()).into_drawing_area();
        figure.draw(&root)?;
        root.present()?;
    } else {
        let root = BitMapBackend::new(path, figure.size()).into_drawing_area();
        figure.draw(&root)?;
        root.present()?;
    }

    tracing::info!(path = %path.display(), "figure written");
    Ok(())
}

fn max_density(bins: &[Bin]) -> f64 {
    bins.iter().map(|b| b.density).fold(0.0, f64::max)
}

fn x_extent(bins: &[Bin]) -> (f64, f64) {
    let lo = bins.first().map_or(0.0, |b| b.lo);
    let hi = bins.last().map_or(1.0, |b| b.hi);
    (lo, hi)
}

/// Upper axis bound with headroom; never zero.
fn headroom(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Two overlaid density histograms of the national infected fraction.
pub struct FinalHistogram<'a> {
    pub summary: &'a FinalStateSummary,
    pub labels: &'a ScenarioLabels,
}

impl Figure for FinalHistogram<'_> {
    fn size(&self) -> (u32, u32) {
        (1024, 768)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let (x_lo, x_hi) = x_extent(&self.summary.baseline);
        let y_hi = headroom(max_density(&self.summary.baseline).max(max_density(&self.summary.comparison)));

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Fraction of the population infected")
            .y_desc("Probability density")
            .x_label_formatter(&|x| format!("{x:.4}"))
            .draw()?;

        for (bins, color, label) in [
            (&self.summary.baseline, SIMULATED, self.labels.baseline.as_str()),
            (&self.summary.comparison, OBSERVED, self.labels.comparison.as_str()),
        ] {
            chart
                .draw_series(bins.iter().map(|b| {
                    Rectangle::new([(b.lo, 0.0), (b.hi, b.density)], color.mix(0.9).filled())
                }))?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        Ok(())
    }
}

/// Small-multiple histograms, one per governorate, with the observed
/// fraction marked by a dotted line.
pub struct GridFigure<'a> {
    pub grid: &'a GovernorateGrid,
}

impl Figure for GridFigure<'_> {
    fn size(&self) -> (u32, u32) {
        (1600, 1600)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let areas = root.split_evenly((5, 5));

        for (panel, area) in self.grid.panels.iter().zip(areas.iter()) {
            let (lo, hi) = x_extent(&panel.bins);
            let lo = lo.min(panel.observed_fraction);
            let hi = hi.max(panel.observed_fraction);
            let y_hi = headroom(max_density(&panel.bins));

            let mut chart = ChartBuilder::on(area)
                .caption(panel.name, (FONT, 16))
                .margin(8)
                .x_label_area_size(24)
                .y_label_area_size(44)
                .build_cartesian_2d(lo..hi, 0.0..y_hi)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(3)
                .y_labels(3)
                .label_style((FONT, 10))
                .x_label_formatter(&|x| format!("{x:.3}"))
                .y_label_formatter(&|y| format!("{y:.0}"))
                .draw()?;

            chart.draw_series(panel.bins.iter().map(|b| {
                Rectangle::new([(b.lo, 0.0), (b.hi, b.density)], SIMULATED.filled())
            }))?;

            let x = panel.observed_fraction;
            let step = y_hi / 40.0;
            chart.draw_series((0..40).step_by(2).map(|i| {
                let y0 = step * f64::from(i);
                PathElement::new(vec![(x, y0), (x, y0 + step)], GREEN.stroke_width(2))
            }))?;
        }

        Ok(())
    }
}

/// Per-timestamp bands on a log scale with observed points overlaid.
pub struct TimeSeriesFigure<'a> {
    pub summary: &'a TimeSeriesSummary,
}

impl TimeSeriesFigure<'_> {
    fn simulated_series(&self) -> [(&[f64], RGBColor); 6] {
        let s = self.summary;
        [
            (s.median.as_slice(), GREEN),
            (s.mean.as_slice(), BLUE),
            (s.upper_1sd.as_slice(), BLUE),
            (s.lower_1sd.as_slice(), BLUE),
            (s.upper_2sd.as_slice(), BLUE),
            (s.lower_2sd.as_slice(), BLUE),
        ]
    }

    fn extents(&self) -> ((f64, f64), (f64, f64)) {
        let s = self.summary;
        let xs = s
            .timestamps
            .iter()
            .map(|&t| t as f64)
            .chain(s.observed.iter().map(|p| p.timestamp as f64));
        let ys = self
            .simulated_series()
            .into_iter()
            .flat_map(|(values, _)| values.iter().copied())
            .chain(s.observed.iter().map(|p| p.infected as f64))
            .filter(|&y| y > 0.0);

        let (x_lo, x_hi) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
        let (y_lo, y_hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });

        let x = if !x_lo.is_finite() {
            (0.0, 1.0)
        } else if x_hi > x_lo {
            (x_lo, x_hi)
        } else {
            (x_lo - 0.5, x_hi + 0.5)
        };
        let y = if y_lo.is_finite() && y_hi.is_finite() {
            (y_lo * 0.8, y_hi * 1.25)
        } else {
            (1.0, 10.0)
        };
        (x, y)
    }
}

impl Figure for TimeSeriesFigure<'_> {
    fn size(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let ((x_lo, x_hi), (y_lo, y_hi)) = self.extents();

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, (y_lo..y_hi).log_scale())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Day")
            .y_desc("Infected people")
            .y_label_formatter(&|y| format!("{y:.0e}"))
            .draw()?;

        let timestamps = &self.summary.timestamps;
        for (values, color) in self.simulated_series() {
            chart.draw_series(
                timestamps
                    .iter()
                    .zip(values)
                    .filter(|(_, y)| **y > 0.0)
                    .map(|(&t, &y)| Circle::new((t as f64, y), 1, color.filled())),
            )?;
        }

        chart.draw_series(
            self.summary
                .observed
                .iter()
                .filter(|p| p.infected > 0)
                .map(|p| Circle::new((p.timestamp as f64, p.infected as f64), 1, RED.filled())),
        )?;

        Ok(())
    }
}

/// Grouped bars of simulated median against observed cases.
pub struct BarFigure<'a> {
    pub summary: &'a BarSummary,
}

impl BarFigure<'_> {
    const WIDTH: f64 = 0.35;

    /// Slot of the `i`-th governorate: 1, 4, 7, ...
    fn slot(i: usize) -> f64 {
        3.0f64.mul_add(i as f64, 1.0)
    }
}

impl Figure for BarFigure<'_> {
    fn size(&self) -> (u32, u32) {
        (2000, 800)
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let rows = &self.summary.rows;
        let w = Self::WIDTH;

        let y_max = rows
            .iter()
            .map(|r| {
                let top = r.simulated_median + r.half_width.unwrap_or(0.0);
                top.max(r.observed as f64)
            })
            .fold(0.0, f64::max);
        let x_hi = Self::slot(rows.len());

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(90)
            .build_cartesian_2d(-1.0..x_hi, 0.0..headroom(y_max))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_label_formatter(&|_| String::new())
            .x_desc("Governorate")
            .y_desc("Infected people")
            .y_label_formatter(&|y| format!("{y:.0}"))
            .draw()?;

        chart.draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = Self::slot(i);
            Rectangle::new([(x - w / 2.0, 0.0), (x + w / 2.0, r.simulated_median)], SIMULATED.filled())
        }))?;

        chart.draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = 2.0f64.mul_add(w, Self::slot(i));
            Rectangle::new([(x - w / 2.0, 0.0), (x + w / 2.0, r.observed as f64)], OBSERVED.filled())
        }))?;

        chart.draw_series(rows.iter().enumerate().filter_map(|(i, r)| {
            let h = r.half_width?;
            let y = r.simulated_median;
            Some(ErrorBar::new_vertical(
                Self::slot(i),
                (y - h).max(0.0),
                y,
                y + h,
                BLUE.stroke_width(1),
                10,
            ))
        }))?;

        let style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        for (i, r) in rows.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(Self::slot(i), 0.0));
            for (line_no, line) in r.label.split('\n').enumerate() {
                let offset = 8 + 15 * i32::try_from(line_no).unwrap_or(0);
                root.draw(&Text::new(line.trim().to_string(), (px, py + offset), style.clone()))?;
            }
        }

        Ok(())
    }
}
