/*!
# Correlation
Spearman's rank correlation between measured and predicted effects.
Ties are given the average of the ranks they span, and the two-sided p-value comes from a t-distribution with `n - 2` degrees of freedom.
*/
use log::warn;
use serde::Serialize;

use crate::data_types::prediction::MergedTable;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("columns have different lengths: {x_len} and {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[error("at least 2 rows are required for a correlation, found {n}")]
    TooFewRows { n: usize },
    #[error("non-finite value at row {row}")]
    NonFinite { row: usize },
}

/// Summary of a rank correlation
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// Number of paired observations
    pub n: usize,
    /// Spearman's rho; NaN if either column is constant
    pub coefficient: f64,
    /// Two-sided p-value for rho != 0; None with fewer than 3 rows or an undefined coefficient
    pub p_value: Option<f64>
}

/// Assigns 1-based ranks, giving tied values the average of the ranks they cover.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }

        // positions start..end share ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in order[start..end].iter() {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson correlation; NaN if either input has no variance
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x == 0.0 || den_y == 0.0 {
        return f64::NAN;
    }
    (num / (den_x * den_y).sqrt()).clamp(-1.0, 1.0)
}

/// Spearman's rank correlation coefficient with a two-sided p-value.
/// # Arguments
/// * `x` - the first column
/// * `y` - the second column, paired by index with `x`
/// # Errors
/// * if the columns have different lengths
/// * if there are fewer than 2 rows
/// * if any value is NaN or infinite
pub fn spearman(x: &[f64], y: &[f64]) -> Result<CorrelationReport, CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch { x_len: x.len(), y_len: y.len() });
    }
    let n = x.len();
    if n < 2 {
        return Err(CorrelationError::TooFewRows { n });
    }
    if let Some(row) = x.iter().zip(y.iter()).position(|(a, b)| !a.is_finite() || !b.is_finite()) {
        return Err(CorrelationError::NonFinite { row });
    }

    let coefficient = pearson(&average_ranks(x), &average_ranks(y));
    if coefficient.is_nan() {
        warn!("Correlation is undefined because at least one column is constant");
    }

    let p_value = if n > 2 && !coefficient.is_nan() {
        Some(two_sided_p_value(coefficient, n - 2))
    } else {
        None
    };

    Ok(CorrelationReport { n, coefficient, p_value })
}

/// Convenience wrapper that correlates the measured and predicted columns of a merged table
pub fn spearman_merged(merged: &MergedTable) -> Result<CorrelationReport, CorrelationError> {
    spearman(&merged.measured(), &merged.predicted())
}

/// Two-sided p-value for a correlation coefficient under the t-distribution
fn two_sided_p_value(r: f64, df: usize) -> f64 {
    let df = df as f64;
    let remainder = (1.0 - r) * (1.0 + r);
    if remainder <= 0.0 {
        // perfect correlation, t is infinite
        return 0.0;
    }
    let t_squared = r * r * df / remainder;

    // P(|T| > t) = I_{df / (df + t^2)}(df / 2, 1 / 2)
    regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t_squared)).clamp(0.0, 1.0)
}

/// Natural log of the gamma function (Lanczos approximation), valid for x > 0
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
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
        // reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = COEFFICIENTS[0];
    for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized incomplete beta function I_x(a, b)
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // the continued fraction converges quickly on this side, use symmetry otherwise
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta function (modified Lentz)
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        // odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}
