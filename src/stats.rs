//! Descriptive statistics for simulation outputs.
//!
//! Provides location and spread estimates, Student-t confidence intervals
//! and density histograms over per-run samples.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use serde::Serialize;

/// Checks if actual value is within tolerance of expected value.
#[inline]
#[must_use]
pub fn within_tolerance(actual: f64, expected: f64, tolerance: f64) -> bool {
    if expected.abs() < f64::EPSILON {
        actual.abs() <= tolerance
    } else {
        let relative_diff = (actual - expected).abs() / expected.abs();
        relative_diff <= tolerance
    }
}

/// Calculates relative difference between two values.
#[inline]
#[must_use]
pub fn relative_difference(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        actual.abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Arithmetic mean. Returns 0 for an empty sample.
#[must_use]
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Median, averaging the two middle values for even lengths.
#[must_use]
pub fn median(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population variance (divides by `n`).
#[must_use]
pub fn variance(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let m = mean(sample);
    sample.iter().map(|x| (x - m).powi(2)).sum::<f64>() / sample.len() as f64
}

/// Sample standard deviation (divides by `n - 1`).
#[must_use]
pub fn sample_std(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    let m = mean(sample);
    let ss = sample.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    (ss / (sample.len() - 1) as f64).sqrt()
}

/// Standard error of the mean.
#[must_use]
pub fn standard_error(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample_std(sample) / (sample.len() as f64).sqrt()
}

/// Half-width of the two-sided Student-t confidence interval for the mean.
///
/// Returns `None` for fewer than two observations, where the interval is
/// undefined.
#[must_use]
pub fn confidence_half_width(sample: &[f64], confidence: f64) -> Option<f64> {
    if sample.len() < 2 {
        return None;
    }
    let df = (sample.len() - 1) as f64;
    let t = t_quantile((1.0 + confidence) / 2.0, df);
    Some(standard_error(sample) * t)
}

/// `n` evenly spaced values from `lo` to `hi`, both inclusive.
#[must_use]
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

/// One bin of a density histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    /// Left edge.
    pub lo: f64,
    /// Right edge.
    pub hi: f64,
    /// Probability density over the bin.
    pub density: f64,
}

/// Bins `values` over `edges` and normalizes so the histogram integrates to 1.
///
/// Bins are half-open except the last, which includes its right edge.
/// Values outside the edges are ignored.
#[must_use]
pub fn density_histogram(values: &[f64], edges: &[f64]) -> Vec<Bin> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let n_bins = edges.len() - 1;
    let first = edges[0];
    let last = edges[n_bins];

    let mut counts = vec![0usize; n_bins];
    for &v in values {
        if v < first || v > last || v.is_nan() {
            continue;
        }
        let idx = edges.partition_point(|e| *e <= v).saturating_sub(1).min(n_bins - 1);
        counts[idx] += 1;
    }

    let total: usize = counts.iter().sum();
    edges
        .windows(2)
        .zip(counts)
        .map(|(w, count)| {
            let width = w[1] - w[0];
            let density = if total == 0 || width <= 0.0 {
                0.0
            } else {
                count as f64 / (total as f64 * width)
            };
            Bin {
                lo: w[0],
                hi: w[1],
                density,
            }
        })
        .collect()
}

/// Inverse CDF of Student's t distribution with `df` degrees of freedom.
#[must_use]
pub fn t_quantile(p: f64, df: f64) -> f64 {
    if p.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if (p - 0.5).abs() < f64::EPSILON {
        return 0.0;
    }
    if p < 0.5 {
        return -t_quantile(1.0 - p, df);
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while t_cdf(hi, df) < p && hi < 1e12 {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        if t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 * hi.max(1.0) {
            break;
        }
    }
    (lo + hi) / 2.0
}

/// CDF of Student's t distribution.
#[must_use]
pub fn t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    let tail = 0.5 * regularized_incomplete_beta(df / 2.0, 0.5, x);
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

// Modified Lentz evaluation.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3e-16;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

// Lanczos approximation, g = 7.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_within_tolerance_pass() {
        assert!(within_tolerance(100.5, 100.0, 0.01));
    }

    #[test]
    fn test_within_tolerance_fail() {
        assert!(!within_tolerance(102.0, 100.0, 0.01));
    }

    #[test]
    fn test_within_tolerance_zero_expected() {
        assert!(within_tolerance(0.05, 0.0, 0.1));
        assert!(!within_tolerance(0.5, 0.0, 0.1));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert!(close(median(&[3.0, 1.0, 2.0]), 2.0, 1e-12));
        assert!(close(median(&[4.0, 1.0, 3.0, 2.0]), 2.5, 1e-12));
    }

    #[test]
    fn test_variance_is_population() {
        assert!(close(variance(&[1.0, 2.0, 3.0, 4.0]), 1.25, 1e-12));
    }

    #[test]
    fn test_standard_error() {
        assert!(close(standard_error(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.707_106_781_186_547_6, 1e-12));
    }

    #[test]
    fn test_t_quantile_known_values() {
        assert!(close(t_quantile(0.975, 1.0), 12.706_204_736, 1e-6));
        assert!(close(t_quantile(0.975, 4.0), 2.776_445_105, 1e-6));
        assert!(close(t_quantile(0.975, 10.0), 2.228_138_852, 1e-6));
        assert!(close(t_quantile(0.975, 30.0), 2.042_272_456, 1e-6));
        assert!(close(t_quantile(0.025, 10.0), -2.228_138_852, 1e-6));
        assert!(close(t_quantile(0.5, 7.0), 0.0, 1e-12));
    }

    #[test]
    fn test_t_cdf_symmetry() {
        for df in [1.0, 3.0, 30.0] {
            assert!(close(t_cdf(1.3, df) + t_cdf(-1.3, df), 1.0, 1e-12));
        }
    }

    #[test]
    fn test_confidence_half_width() {
        // 0.7071 * 2.7764
        let h = confidence_half_width(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.95).unwrap();
        assert!(close(h, 1.963_243_161, 1e-6));
        assert!(confidence_half_width(&[1.0], 0.95).is_none());
    }

    #[test]
    fn test_linspace_endpoints() {
        let edges = linspace(0.0, 1.0, 5);
        assert_eq!(edges, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_density_histogram_integrates_to_one() {
        let values = [0.0, 0.1, 0.2, 0.5, 0.9, 1.0, 1.0];
        let bins = density_histogram(&values, &linspace(0.0, 1.0, 5));
        let area: f64 = bins.iter().map(|b| b.density * (b.hi - b.lo)).sum();
        assert!(close(area, 1.0, 1e-12));
        // last bin is closed: 0.9, 1.0, 1.0
        assert!(close(bins[3].density, 3.0 / (7.0 * 0.25), 1e-12));
    }

    #[test]
    fn test_density_histogram_ignores_out_of_range() {
        let bins = density_histogram(&[-1.0, 0.5, 2.0], &[0.0, 1.0]);
        assert_eq!(bins.len(), 1);
        assert!(close(bins[0].density, 1.0, 1e-12));
    }
}
