//! End-to-end checks of the routine drivers over CSV fixtures.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use cholera_validate::config::{ImageFormat, ValidationConfig};
use cholera_validate::reference;
use cholera_validate::routines;
use cholera_validate::types::{Routine, RoutineOutcome};

/// Writes a final-state table where every governorate gets `scale` times
/// its observed cases, one row per scale.
fn write_final_table(path: &Path, scales: &[f64]) {
    let keys = reference::keys();
    let mut out = keys.join(",");
    out.push('\n');
    for scale in scales {
        let row: Vec<String> = reference::REFERENCE
            .iter()
            .map(|g| format!("{}", (g.cases as f64 * scale).round() as i64))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn fixture() -> (TempDir, ValidationConfig) {
    let dir = TempDir::new().unwrap();
    let config = ValidationConfig {
        data_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("figures"),
        ..Default::default()
    };

    write_final_table(
        &config.input(&config.inputs.final_results),
        &[0.8, 0.95, 1.0, 1.05, 1.3],
    );
    write_final_table(
        &config.input(&config.inputs.final_results_comparison),
        &[1.5, 2.0],
    );
    fs::write(
        config.input(&config.inputs.time_series),
        "0,7,14,21\n1,4,,30\n,2,8,\n3,6,12\n",
    )
    .unwrap();
    fs::write(
        config.input(&config.inputs.observed_series),
        "0,2\n7,4\n21,1000\n",
    )
    .unwrap();

    (dir, config)
}

#[test]
fn final_state_bands_around_observed_fraction() {
    let (_dir, config) = fixture();
    let summary = routines::final_state(&config).unwrap();

    assert_eq!(summary.baseline_runs, 5);
    assert_eq!(summary.comparison_runs, 2);
    assert_eq!(summary.baseline.len(), config.histogram_edges - 1);

    let within: Vec<_> = summary.bands.iter().map(|b| b.within).collect();
    assert_eq!(within, vec![3, 5]);
    assert!((summary.baseline_median - summary.observed_fraction).abs() < 1e-9);
}

#[test]
fn grid_has_a_panel_per_governorate() {
    let (_dir, config) = fixture();
    let grid = routines::governorate_grid(&config).unwrap();

    assert_eq!(grid.panels.len(), 22);
    let aden = grid.panels.iter().find(|p| p.name == "Aden").unwrap();
    assert!((aden.median_fraction - aden.observed_fraction).abs() < 1e-6);
}

#[test]
fn time_series_forward_fill_and_bands() {
    let (_dir, config) = fixture();
    let summary = routines::time_series(&config).unwrap();

    assert_eq!(summary.timestamps, vec![0, 7, 14, 21]);
    assert_eq!(summary.runs, 3);
    // runs: [1,4,4,30], [1,2,8,8], [3,6,12,12]
    assert_eq!(summary.median, vec![1.0, 4.0, 8.0, 12.0]);
    assert_eq!(summary.mean, vec![5.0 / 3.0, 4.0, 8.0, 50.0 / 3.0]);
    assert_eq!(summary.observed.len(), 3);
    assert_eq!(summary.observed_within_band(), (2, 3));
}

#[test]
fn bars_sorted_with_confidence() {
    let (_dir, config) = fixture();
    let summary = routines::bars(&config).unwrap();

    let names: Vec<_> = summary.rows.iter().take(3).map(|r| r.name).collect();
    assert_eq!(names, vec!["Al Hudaydah", "Hajjah", "Amran"]);

    let hudaydah = &summary.rows[0];
    assert_eq!(hudaydah.observed, 155_908);
    assert!((hudaydah.simulated_median - 155_908.0).abs() < f64::EPSILON);
    assert!(hudaydah.half_width.unwrap() > 0.0);
}

#[test]
fn missing_column_is_reported_as_error() {
    let (_dir, config) = fixture();
    fs::write(config.input(&config.inputs.final_results), "Total,Ibb\n1,2\n").unwrap();

    let outcome = routines::run(Routine::Bars, &config);
    match outcome {
        RoutineOutcome::Error { name, error } => {
            assert_eq!(name, "bar-plot");
            assert!(error.contains("not found in header"), "{error}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn every_routine_renders_png_and_svg() {
    for format in [ImageFormat::Png, ImageFormat::Svg] {
        let (_dir, mut config) = fixture();
        config.image_format = format;
        assert!(!config.output_dir.exists());

        for routine in Routine::ALL {
            let outcome = routines::run(routine, &config);
            let RoutineOutcome::Rendered { figure, .. } = &outcome else {
                panic!("{routine:?} as {format:?}: {outcome:?}");
            };

            let expected = config.figure(routine.name());
            assert_eq!(Path::new(figure), expected.as_path());
            assert_eq!(
                expected.extension().and_then(|e| e.to_str()),
                Some(format.extension())
            );
            let len = fs::metadata(&expected).unwrap().len();
            assert!(len > 0, "{} is empty", expected.display());
        }
    }
}

#[test]
fn svg_output_is_vector_markup() {
    let (_dir, mut config) = fixture();
    config.image_format = ImageFormat::Svg;

    let outcome = routines::run(Routine::Bars, &config);
    assert!(outcome.is_rendered(), "{outcome:?}");
    let svg = fs::read_to_string(config.figure(Routine::Bars.name())).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn single_timestamp_series_renders() {
    let (_dir, config) = fixture();
    fs::write(config.input(&config.inputs.time_series), "5\n3\n4\n").unwrap();
    fs::write(config.input(&config.inputs.observed_series), "5,3\n").unwrap();

    let outcome = routines::run(Routine::TimeSeries, &config);
    assert!(outcome.is_rendered(), "{outcome:?}");
}
