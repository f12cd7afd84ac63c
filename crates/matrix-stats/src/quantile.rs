/// Computes a quantile from sorted data by linear interpolation.
///
/// This is the "type 7" definition used by R and NumPy: the quantile `q`
/// sits at position `(n - 1) * q` and is interpolated between its
/// neighbouring order statistics.
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `q` - The quantile to compute (0.0 to 1.0, clamped)
///
/// # Returns
///
/// The interpolated value. Returns `f64::NAN` if the input is empty.
///
/// # Panics
///
/// Panics if `sorted_values` is not sorted in ascending order.
///
/// # Examples
///
/// ```
/// use matrix_stats::quantile::quantile_sorted;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile_sorted(&values, 0.5), 2.5);
/// assert_eq!(quantile_sorted(&values, 0.0), 1.0);
/// assert_eq!(quantile_sorted(&values, 1.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn quantile_sorted(sorted_values: &[f64], q: f64) -> f64 {
    assert!(
        sorted_values.is_sorted_by(|a, b| a <= b),
        "values must be sorted in ascending order"
    );
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let position = (sorted_values.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
}

/// Returns the interquartile range `Q3 - Q1` of sorted data.
///
/// # Panics
///
/// Panics if `sorted_values` is not sorted in ascending order.
///
/// # Examples
///
/// ```
/// use matrix_stats::quantile::interquartile_range;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(interquartile_range(&values), 2.0);
/// ```
#[must_use]
pub fn interquartile_range(sorted_values: &[f64]) -> f64 {
    quantile_sorted(sorted_values, 0.75) - quantile_sorted(sorted_values, 0.25)
}

/// Sorts a copy of `values` into the order [`quantile_sorted`] expects.
#[must_use]
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_interpolates_between_neighbours() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((quantile_sorted(&values, 0.1) - 14.0).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.25) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_quantile_is_clamped() {
        let values = [1.0, 2.0];
        assert_eq!(quantile_sorted(&values, -1.0), 1.0);
        assert_eq!(quantile_sorted(&values, 2.0), 2.0);
    }

    #[test]
    #[should_panic(expected = "sorted")]
    fn test_unsorted_panics() {
        let _ = quantile_sorted(&[2.0, 1.0], 0.5);
    }

    #[test]
    fn test_iqr_of_unsorted_copy() {
        let sorted = sorted_copy(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        assert_eq!(interquartile_range(&sorted), 2.0);
    }
}
