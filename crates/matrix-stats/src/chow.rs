//! Chow test for a structural break in a simple linear regression.

use serde::Serialize;
use tracing::debug;

use crate::{
    distribution,
    error::{Error, Result},
};

/// Number of parameters of `y = a + b·x`.
const PARAMETERS: usize = 2;

/// Residual sum of squares below which a fit is considered exact.
const MIN_RSS: f64 = 1e-12;

/// Result of [`chow_test`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChowResult {
    /// The F statistic.
    pub statistic: f64,
    /// Upper-tail p-value of `F(df_numerator, df_denominator)`.
    pub p_value: f64,
    pub df_numerator: usize,
    pub df_denominator: usize,
}

/// Tests whether `y = a + b·x` has different coefficients before and after
/// `break_index`.
///
/// The series is split into `[0, break_index)` and `[break_index, n)`, each
/// segment and the pooled series are fit by least squares, and
///
/// ```text
/// F = ((RSS_pooled - (RSS_1 + RSS_2)) / k) / ((RSS_1 + RSS_2) / (n - 2k))
/// ```
///
/// with `k = 2`.
///
/// # Errors
///
/// * shape error: `x` and `y` differ in length
/// * domain error: a segment with fewer than 3 points, or a non-finite value
/// * degenerate error: constant `x` within a segment, or both segments fit
///   exactly
///
/// # Examples
///
/// ```
/// use matrix_stats::chow::chow_test;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let y = [1.1, 2.0, 2.9, 4.2, 12.0, 14.1, 15.8, 18.2];
/// let result = chow_test(&x, &y, 4).unwrap();
/// assert!(result.p_value < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn chow_test(x: &[f64], y: &[f64], break_index: usize) -> Result<ChowResult> {
    if x.len() != y.len() {
        return Err(Error::shape(format!(
            "x and y must have the same length, got sizes {} and {}",
            x.len(),
            y.len()
        )));
    }
    for (name, values) in [("x", x), ("y", y)] {
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::domain(format!("{name}[{i}] must be finite, got {v}")));
        }
    }
    let n = x.len();
    let min_segment = PARAMETERS + 1;
    if break_index < min_segment || n.saturating_sub(break_index) < min_segment {
        return Err(Error::domain(format!(
            "each segment needs at least {min_segment} points, \
             got {} and {} (break at {break_index} of {n})",
            break_index.min(n),
            n.saturating_sub(break_index)
        )));
    }

    let rss_first = residual_sum_of_squares(&x[..break_index], &y[..break_index], "first")?;
    let rss_second = residual_sum_of_squares(&x[break_index..], &y[break_index..], "second")?;
    let rss_pooled = residual_sum_of_squares(x, y, "pooled")?;
    let rss_split = rss_first + rss_second;
    if rss_split < MIN_RSS {
        return Err(Error::degenerate(
            "both segments fit exactly; the F statistic is undefined",
        ));
    }

    let df_numerator = PARAMETERS;
    let df_denominator = n - 2 * PARAMETERS;
    let statistic = ((rss_pooled - rss_split) / df_numerator as f64).max(0.0)
        / (rss_split / df_denominator as f64);
    let p_value = distribution::f_sf(statistic, df_numerator as f64, df_denominator as f64)?;
    debug!(statistic, p_value, break_index, "Chow test");

    Ok(ChowResult {
        statistic,
        p_value,
        df_numerator,
        df_denominator,
    })
}

#[expect(clippy::cast_precision_loss)]
fn residual_sum_of_squares(x: &[f64], y: &[f64], segment: &str) -> Result<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (sxx, sxy) = x.iter().zip(y).fold((0.0, 0.0), |(sxx, sxy), (xi, yi)| {
        (sxx + (xi - mean_x).powi(2), sxy + (xi - mean_x) * (yi - mean_y))
    });
    if sxx == 0.0 {
        return Err(Error::degenerate(format!(
            "x is constant in the {segment} segment"
        )));
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Ok(x.iter()
        .zip(y)
        .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
        .sum())
}
