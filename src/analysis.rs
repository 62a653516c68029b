//! Validation computations for each routine.
//!
//! Turns loaded simulation outputs into the summaries the figures are drawn
//! from, and compares them against the observed reference data.

#![allow(clippy::cast_precision_loss)]

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::ingest::{ObservedPoint, RunTable, TimeSeriesRuns};
use crate::reference::{self, Governorate};
use crate::stats::{self, Bin};

/// Runs of a final-state table normalized by the governorate's population.
pub fn normalized_fractions(table: &RunTable, governorate: &Governorate) -> Vec<f64> {
    table
        .values_f64(governorate.name)
        .into_iter()
        .map(|x| x / governorate.population as f64)
        .collect()
}

/// Evenly spaced edges spanning every value in `values`.
///
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn shared_edges(values: &[f64], edges: usize) -> Vec<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return stats::linspace(0.0, 1.0, edges);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return stats::linspace(lo - 0.5, hi + 0.5, edges);
    }
    stats::linspace(lo, hi, edges)
}

/// Number of runs within a relative band around the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandCount {
    pub epsilon: f64,
    pub within: usize,
    pub total: usize,
}

/// Final infected fraction of the whole country, two scenarios overlaid.
#[derive(Debug, Clone, Serialize)]
pub struct FinalStateSummary {
    pub observed_fraction: f64,
    pub baseline_runs: usize,
    pub comparison_runs: usize,
    pub baseline_median: f64,
    pub comparison_median: f64,
    pub baseline: Vec<Bin>,
    pub comparison: Vec<Bin>,
    pub bands: Vec<BandCount>,
}

impl FinalStateSummary {
    pub fn compute(
        baseline: &RunTable,
        comparison: &RunTable,
        edges: usize,
        epsilons: &[f64],
    ) -> Result<Self> {
        let total = reference::total();
        let base = normalized_fractions(baseline, total);
        let comp = normalized_fractions(comparison, total);
        if base.is_empty() {
            bail!("baseline results contain no runs");
        }
        if comp.is_empty() {
            bail!("comparison results contain no runs");
        }

        let combined: Vec<f64> = base.iter().chain(&comp).copied().collect();
        let edges = shared_edges(&combined, edges);
        let observed = total.observed_fraction();

        let bands = epsilons
            .iter()
            .map(|&epsilon| BandCount {
                epsilon,
                within: base
                    .iter()
                    .filter(|&&x| stats::within_tolerance(x, observed, epsilon))
                    .count(),
                total: base.len(),
            })
            .collect();

        tracing::debug!(
            baseline = base.len(),
            comparison = comp.len(),
            observed,
            "computed final-state summary"
        );

        Ok(Self {
            observed_fraction: observed,
            baseline_runs: base.len(),
            comparison_runs: comp.len(),
            baseline_median: stats::median(&base),
            comparison_median: stats::median(&comp),
            baseline: stats::density_histogram(&base, &edges),
            comparison: stats::density_histogram(&comp, &edges),
            bands,
        })
    }
}

/// One small-multiple panel of the per-governorate grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridPanel {
    pub name: &'static str,
    pub observed_fraction: f64,
    pub median_fraction: f64,
    pub bins: Vec<Bin>,
}

/// Final infected fraction per governorate, one panel each.
#[derive(Debug, Clone, Serialize)]
pub struct GovernorateGrid {
    pub panels: Vec<GridPanel>,
}

impl GovernorateGrid {
    /// Builds one panel per governorate with `bins` density bins each.
    pub fn compute(table: &RunTable, bins: usize) -> Result<Self> {
        if table.runs() == 0 {
            bail!("results contain no runs");
        }
        let panels = reference::governorates()
            .map(|g| {
                let fractions = normalized_fractions(table, g);
                let edges = shared_edges(&fractions, bins + 1);
                GridPanel {
                    name: g.name,
                    observed_fraction: g.observed_fraction(),
                    median_fraction: stats::median(&fractions),
                    bins: stats::density_histogram(&fractions, &edges),
                }
            })
            .collect();
        Ok(Self { panels })
    }
}

/// Per-timestamp location and spread of infected counts across runs.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesSummary {
    pub timestamps: Vec<i64>,
    pub median: Vec<f64>,
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    /// mean + sd
    pub upper_1sd: Vec<f64>,
    /// max(0, mean - sd)
    pub lower_1sd: Vec<f64>,
    /// mean + 2 sd
    pub upper_2sd: Vec<f64>,
    /// max(0, mean - 2 sd)
    pub lower_2sd: Vec<f64>,
    pub observed: Vec<ObservedPoint>,
    pub runs: usize,
}

impl TimeSeriesSummary {
    pub fn compute(series: &TimeSeriesRuns, observed: Vec<ObservedPoint>) -> Result<Self> {
        if series.runs.is_empty() {
            bail!("time series contains no runs");
        }

        let n = series.timestamps.len();
        let mut summary = Self {
            timestamps: series.timestamps.clone(),
            median: Vec::with_capacity(n),
            mean: Vec::with_capacity(n),
            variance: Vec::with_capacity(n),
            upper_1sd: Vec::with_capacity(n),
            lower_1sd: Vec::with_capacity(n),
            upper_2sd: Vec::with_capacity(n),
            lower_2sd: Vec::with_capacity(n),
            observed,
            runs: series.runs.len(),
        };

        for j in 0..n {
            let column = series
                .runs
                .iter()
                .enumerate()
                .map(|(i, run)| {
                    run.get(j)
                        .map(|&v| v as f64)
                        .with_context(|| format!("run {} has no value at column {j}", i + 1))
                })
                .collect::<Result<Vec<_>>>()?;

            let mean = stats::mean(&column);
            let variance = stats::variance(&column);
            let sd = variance.sqrt();

            summary.median.push(stats::median(&column));
            summary.mean.push(mean);
            summary.variance.push(variance);
            summary.upper_1sd.push(mean + sd);
            summary.lower_1sd.push((mean - sd).max(0.0));
            summary.upper_2sd.push(2.0f64.mul_add(sd, mean));
            summary.lower_2sd.push((-2.0f64).mul_add(sd, mean).max(0.0));
        }

        tracing::debug!(runs = summary.runs, timestamps = n, "computed time-series summary");
        Ok(summary)
    }

    /// Observed points whose timestamp is simulated and whose value lies
    /// inside the two-sd band, out of those with a simulated timestamp.
    pub fn observed_within_band(&self) -> (usize, usize) {
        let mut within = 0;
        let mut comparable = 0;
        for point in &self.observed {
            let Some(idx) = self.timestamps.iter().position(|&t| t == point.timestamp) else {
                continue;
            };
            comparable += 1;
            let value = point.infected as f64;
            if value >= self.lower_2sd[idx] && value <= self.upper_2sd[idx] {
                within += 1;
            }
        }
        (within, comparable)
    }
}

/// One governorate's simulated and observed totals.
#[derive(Debug, Clone, Serialize)]
pub struct BarRow {
    pub name: &'static str,
    pub label: &'static str,
    pub simulated_median: f64,
    /// Confidence half-width, absent with fewer than two runs.
    pub half_width: Option<f64>,
    pub observed: u64,
}

impl BarRow {
    /// Relative difference of the simulated median from the observed cases.
    pub fn relative_error(&self) -> f64 {
        stats::relative_difference(self.simulated_median, self.observed as f64)
    }
}

/// Governorates in descending observed-case order.
#[derive(Debug, Clone, Serialize)]
pub struct BarSummary {
    pub confidence: f64,
    pub rows: Vec<BarRow>,
}

impl BarSummary {
    pub fn compute(table: &RunTable, confidence: f64) -> Result<Self> {
        if table.runs() == 0 {
            bail!("results contain no runs");
        }
        let rows = reference::by_cases_desc()
            .into_iter()
            .map(|g| {
                let runs = table.values_f64(g.name);
                BarRow {
                    name: g.name,
                    label: g.label,
                    simulated_median: stats::median(&runs),
                    half_width: stats::confidence_half_width(&runs, confidence),
                    observed: g.cases,
                }
            })
            .collect();
        Ok(Self { confidence, rows })
    }
}
