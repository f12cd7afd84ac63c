//! Column scaling.
//!
//! Every function returns a new vector and leaves its input untouched.
//! Constant input has no spread to divide by and maps to all zeros.

use crate::{
    descriptive::DescriptiveStats,
    error::{Error, Result},
};

/// Natural logarithm of every value.
///
/// # Examples
///
/// ```
/// use matrix_stats::normalize::log_normalize;
///
/// let logs = log_normalize(&[1.0, std::f64::consts::E]).unwrap();
/// assert_eq!(logs[0], 0.0);
/// assert!((logs[1] - 1.0).abs() < 1e-15);
/// assert!(log_normalize(&[1.0, 0.0]).is_err());
/// ```
pub fn log_normalize(values: &[f64]) -> Result<Vec<f64>> {
    summarize(values)?;
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(Error::domain(format!(
            "log normalization requires positive values, got {v} at index {i}"
        )));
    }
    Ok(values.iter().map(|v| v.ln()).collect())
}

/// Rescales to `[0, 1]`: `(x - min) / (max - min)`.
///
/// # Examples
///
/// ```
/// use matrix_stats::normalize::min_max;
///
/// assert_eq!(min_max(&[2.0, 4.0, 6.0]).unwrap(), vec![0.0, 0.5, 1.0]);
/// ```
pub fn min_max(values: &[f64]) -> Result<Vec<f64>> {
    let stats = summarize(values)?;
    Ok(scale(values, stats.min, stats.range()))
}

/// Centers on the mean and divides by the range: `(x - mean) / (max - min)`.
pub fn mean_normalize(values: &[f64]) -> Result<Vec<f64>> {
    let stats = summarize(values)?;
    Ok(scale(values, stats.mean, stats.range()))
}

/// Z-score scaling with the sample standard deviation: `(x - mean) / sd`.
///
/// # Examples
///
/// ```
/// use matrix_stats::normalize::standardize;
///
/// let z = standardize(&[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(z, vec![-1.0, 0.0, 1.0]);
/// ```
pub fn standardize(values: &[f64]) -> Result<Vec<f64>> {
    let stats = summarize(values)?;
    Ok(scale(values, stats.mean, stats.std_dev))
}

/// Rounds to `decimals` places, ties to even.
///
/// Only meant for presenting results; computations stay in full precision.
///
/// # Examples
///
/// ```
/// use matrix_stats::normalize::round_half_even;
///
/// assert_eq!(round_half_even(2.5, 0), 2.0);
/// assert_eq!(round_half_even(3.5, 0), 4.0);
/// assert_eq!(round_half_even(0.125, 2), 0.12);
/// ```
#[must_use]
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

fn summarize(values: &[f64]) -> Result<DescriptiveStats> {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::domain(format!(
            "values must be finite, got {v} at index {i}"
        )));
    }
    DescriptiveStats::new(values).ok_or_else(|| Error::shape("cannot normalize an empty column"))
}

fn scale(values: &[f64], center: f64, spread: f64) -> Vec<f64> {
    if spread == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - center) / spread).collect()
}
