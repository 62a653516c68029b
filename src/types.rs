//! Common types for cholera-validate.
//!
//! Routine identifiers, per-routine outcomes and the JSON run report.

use serde::Serialize;

/// The validation routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Routine {
    /// National final-state histogram, two scenarios.
    Final,
    /// Per-governorate final-state histograms.
    Grid,
    /// Infected counts over time against the observed series.
    TimeSeries,
    /// Per-governorate bars with confidence intervals.
    Bars,
}

impl Routine {
    /// Every routine, in run order.
    pub const ALL: [Self; 4] = [Self::Final, Self::Grid, Self::TimeSeries, Self::Bars];

    /// Display name, also used as the figure file stem.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Final => "final-state",
            Self::Grid => "governorate-grid",
            Self::TimeSeries => "time-series",
            Self::Bars => "bar-plot",
        }
    }
}

/// Result of running one routine.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RoutineOutcome {
    /// Figure written.
    Rendered {
        name: String,
        figure: String,
        details: String,
        summary: serde_json::Value,
    },
    /// Routine errored.
    Error { name: String, error: String },
    /// Routine was skipped.
    Skip { name: String, reason: String },
}

impl RoutineOutcome {
    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Rendered { name, .. } | Self::Error { name, .. } | Self::Skip { name, .. } => name,
        }
    }
}

/// JSON report of a whole run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub rendered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed_secs: f64,
    pub outcomes: &'a [RoutineOutcome],
}

impl<'a> RunReport<'a> {
    pub fn new(outcomes: &'a [RoutineOutcome], elapsed_secs: f64) -> Self {
        let rendered = outcomes.iter().filter(|o| o.is_rendered()).count();
        let failed = outcomes.iter().filter(|o| o.is_error()).count();
        Self {
            rendered,
            failed,
            skipped: outcomes.len() - rendered - failed,
            elapsed_secs,
            outcomes,
        }
    }
}
