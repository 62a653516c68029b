//! Routine drivers: load inputs, compute the summary, render the figure.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analysis::{BarSummary, FinalStateSummary, GovernorateGrid, TimeSeriesSummary};
use crate::config::ValidationConfig;
use crate::ingest::{load_observed_series, load_run_table, load_time_series, RunTable};
use crate::plot::{self, BarFigure, FinalHistogram, GridFigure, TimeSeriesFigure};
use crate::reference;
use crate::types::{Routine, RoutineOutcome};

/// Input files a routine reads.
pub fn required_inputs(routine: Routine, config: &ValidationConfig) -> Vec<PathBuf> {
    let inputs = &config.inputs;
    match routine {
        Routine::Final => vec![
            config.input(&inputs.final_results),
            config.input(&inputs.final_results_comparison),
        ],
        Routine::Grid | Routine::Bars => vec![config.input(&inputs.final_results)],
        Routine::TimeSeries => vec![
            config.input(&inputs.time_series),
            config.input(&inputs.observed_series),
        ],
    }
}

/// Runs one routine end to end. Missing inputs skip the routine.
pub fn run(routine: Routine, config: &ValidationConfig) -> RoutineOutcome {
    let name = routine.name().to_string();

    if let Some(missing) = required_inputs(routine, config)
        .into_iter()
        .find(|p| !p.exists())
    {
        return RoutineOutcome::Skip {
            name,
            reason: format!("input not found: {}", missing.display()),
        };
    }

    let figure = config.figure(routine.name());
    let result = match routine {
        Routine::Final => render_final(config, &figure),
        Routine::Grid => render_grid(config, &figure),
        Routine::TimeSeries => render_time_series(config, &figure),
        Routine::Bars => render_bars(config, &figure),
    };

    match result {
        Ok((details, summary)) => RoutineOutcome::Rendered {
            name,
            figure: figure.display().to_string(),
            details,
            summary,
        },
        Err(e) => RoutineOutcome::Error {
            name,
            error: format!("{e:#}"),
        },
    }
}

fn load_final(config: &ValidationConfig, file: &str) -> Result<RunTable> {
    let path = config.input(file);
    load_run_table(&path, &reference::keys())
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Loads both final-state tables and computes the national summary.
pub fn final_state(config: &ValidationConfig) -> Result<FinalStateSummary> {
    let baseline = load_final(config, &config.inputs.final_results)?;
    let comparison = load_final(config, &config.inputs.final_results_comparison)?;
    FinalStateSummary::compute(
        &baseline,
        &comparison,
        config.histogram_edges,
        &config.band_epsilons,
    )
}

/// Loads the baseline table and computes one panel per governorate.
pub fn governorate_grid(config: &ValidationConfig) -> Result<GovernorateGrid> {
    let table = load_final(config, &config.inputs.final_results)?;
    GovernorateGrid::compute(&table, config.histogram_edges)
}

/// Loads the simulated and observed series and computes the bands.
pub fn time_series(config: &ValidationConfig) -> Result<TimeSeriesSummary> {
    let series_path = config.input(&config.inputs.time_series);
    let series = load_time_series(&series_path)
        .with_context(|| format!("Failed to load {}", series_path.display()))?;

    let observed_path = config.input(&config.inputs.observed_series);
    let observed = load_observed_series(&observed_path)
        .with_context(|| format!("Failed to load {}", observed_path.display()))?;

    TimeSeriesSummary::compute(&series, observed)
}

/// Loads the baseline table and computes the per-governorate bars.
pub fn bars(config: &ValidationConfig) -> Result<BarSummary> {
    let table = load_final(config, &config.inputs.final_results)?;
    BarSummary::compute(&table, config.confidence)
}

type Rendered = (String, serde_json::Value);

fn render_final(config: &ValidationConfig, figure: &std::path::Path) -> Result<Rendered> {
    let summary = final_state(config)?;
    plot::render(
        &FinalHistogram {
            summary: &summary,
            labels: &config.scenarios,
        },
        figure,
    )?;

    let bands = summary
        .bands
        .iter()
        .map(|b| format!("±{:.0}%: {}/{}", b.epsilon * 100.0, b.within, b.total))
        .collect::<Vec<_>>()
        .join(", ");
    let details = format!(
        "median={:.5} observed={:.5} runs={}/{} [{bands}]",
        summary.baseline_median,
        summary.observed_fraction,
        summary.baseline_runs,
        summary.comparison_runs,
    );
    Ok((details, serde_json::to_value(&summary)?))
}

fn render_grid(config: &ValidationConfig, figure: &std::path::Path) -> Result<Rendered> {
    let grid = governorate_grid(config)?;
    plot::render(&GridFigure { grid: &grid }, figure)?;

    let details = format!("{} panels", grid.panels.len());
    Ok((details, serde_json::to_value(&grid)?))
}

fn render_time_series(config: &ValidationConfig, figure: &std::path::Path) -> Result<Rendered> {
    let summary = time_series(config)?;
    plot::render(&TimeSeriesFigure { summary: &summary }, figure)?;

    let (within, comparable) = summary.observed_within_band();
    let details = format!(
        "runs={} timestamps={} observed within 2sd: {within}/{comparable}",
        summary.runs,
        summary.timestamps.len(),
    );
    Ok((details, serde_json::to_value(&summary)?))
}

fn render_bars(config: &ValidationConfig, figure: &std::path::Path) -> Result<Rendered> {
    let summary = bars(config)?;
    plot::render(&BarFigure { summary: &summary }, figure)?;

    let worst = summary
        .rows
        .iter()
        .filter(|r| r.observed > 0)
        .max_by(|a, b| a.relative_error().total_cmp(&b.relative_error()));
    let details = worst.map_or_else(
        || format!("{} governorates", summary.rows.len()),
        |r| {
            format!(
                "{} governorates, largest deviation {} ({:.1}%)",
                summary.rows.len(),
                r.name,
                r.relative_error() * 100.0
            )
        },
    );
    Ok((details, serde_json::to_value(&summary)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_skip() {
        let config = ValidationConfig {
            data_dir: PathBuf::from("/nonexistent/cholera"),
            ..Default::default()
        };
        for routine in Routine::ALL {
            let outcome = run(routine, &config);
            assert!(matches!(outcome, RoutineOutcome::Skip { .. }), "{routine:?}");
        }
    }

    #[test]
    fn inputs_resolve_against_data_dir() {
        let config = ValidationConfig {
            data_dir: PathBuf::from("data"),
            ..Default::default()
        };
        let inputs = required_inputs(Routine::TimeSeries, &config);
        assert_eq!(
            inputs,
            vec![
                PathBuf::from("data/simResultsTime.csv"),
                PathBuf::from("data/realResultsTimes.csv"),
            ]
        );
    }
}
