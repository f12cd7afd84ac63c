//! Correlation coefficients over paired samples.
//!
//! - [`pearson`]: linear correlation
//! - [`spearman`]: Pearson correlation of average ranks
//! - [`kendall`]: Kendall's tau-b, computed in `O(n log n)`
//!
//! Every function validates that the samples are non-empty, of equal length,
//! finite, and hold at least two pairs. A coefficient whose denominator
//! vanishes (a constant variable) is reported as `0` rather than an error:
//! it describes the absence of a relationship, not invalid input.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Correlation method selector.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl Method {
    /// Computes the coefficient with this method.
    pub fn correlate(self, x: &[f64], y: &[f64]) -> Result<f64> {
        match self {
            Self::Pearson => pearson(x, y),
            Self::Spearman => spearman(x, y),
            Self::Kendall => kendall(x, y),
        }
    }
}

/// Pearson's product-moment correlation coefficient.
///
/// # Examples
///
/// ```
/// use matrix_stats::correlation::pearson;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [2.0, 4.0, 5.0, 4.0, 5.0];
/// assert!((pearson(&x, &y).unwrap() - 0.774_596_669).abs() < 1e-9);
///
/// // A constant variable has no linear relationship with anything.
/// assert_eq!(pearson(&x, &[3.0; 5]).unwrap(), 0.0);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_pair(x, y)?;
    Ok(pearson_unchecked(x, y))
}

/// Spearman's rank correlation: Pearson's coefficient of the ranks, with ties
/// given their average rank.
///
/// # Examples
///
/// ```
/// use matrix_stats::correlation::spearman;
///
/// // Any monotone relationship has a rank correlation of 1.
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [1.0, 8.0, 27.0, 64.0];
/// assert!((spearman(&x, &y).unwrap() - 1.0).abs() < 1e-12);
/// ```
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_pair(x, y)?;
    Ok(pearson_unchecked(&average_ranks(x), &average_ranks(y)))
}

/// Kendall's tau-b.
///
/// Counts discordant pairs as the inversions of a merge sort by `y` of the
/// pairs sorted by `x` (Knight's algorithm), then corrects for ties:
///
/// ```text
/// tau_b = (n0 - t_x - t_y + t_xy - 2 · discordant) / sqrt((n0 - t_x) (n0 - t_y))
/// ```
///
/// where `n0 = n (n - 1) / 2` and `t_x`, `t_y`, `t_xy` count the pairs tied
/// in `x`, in `y`, and in both. Returns `0` when every pair is tied in `x`
/// or in `y`.
///
/// # Examples
///
/// ```
/// use matrix_stats::correlation::kendall;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [5.0, 4.0, 3.0, 2.0, 1.0];
/// assert!((kendall(&x, &y).unwrap() + 1.0).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn kendall(x: &[f64], y: &[f64]) -> Result<f64> {
    validate_pair(x, y)?;
    let n = x.len() as u64;

    let mut pairs = x.iter().copied().zip(y.iter().copied()).collect::<Vec<_>>();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let tied_x = tied_pairs(&pairs, |a, b| a.0 == b.0);
    let tied_xy = tied_pairs(&pairs, |a, b| a == b);

    let mut ys = pairs.iter().map(|p| p.1).collect::<Vec<_>>();
    let mut buffer = vec![0.0; ys.len()];
    let discordant = merge_sort_inversions(&mut ys, &mut buffer);
    let tied_y = tied_pairs(&ys, |a, b| a == b);

    let n0 = n * (n - 1) / 2;
    let denominator = ((n0 - tied_x) as f64 * (n0 - tied_y) as f64).sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }
    let numerator = n0 as f64 - tied_x as f64 - tied_y as f64 + tied_xy as f64
        - 2.0 * discordant as f64;
    Ok((numerator / denominator).clamp(-1.0, 1.0))
}

/// Pairwise correlation matrix of a set of equally long columns.
///
/// # Examples
///
/// ```
/// use matrix_stats::correlation::{Method, correlation_matrix};
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [3.0, 2.0, 1.0];
/// let matrix = correlation_matrix(&[&a, &b], Method::Pearson).unwrap();
/// assert_eq!(matrix[0][0], 1.0);
/// assert!((matrix[0][1] + 1.0).abs() < 1e-12);
/// ```
pub fn correlation_matrix(columns: &[&[f64]], method: Method) -> Result<Vec<Vec<f64>>> {
    let mut matrix = vec![vec![1.0; columns.len()]; columns.len()];
    for i in 0..columns.len() {
        for j in (i + 1)..columns.len() {
            let r = method.correlate(columns[i], columns[j])?;
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    if let [only] = columns {
        validate_pair(only, only)?;
    }
    Ok(matrix)
}

/// Ranks values from 1, giving tied values the average of their ranks.
///
/// # Examples
///
/// ```
/// use matrix_stats::correlation::average_ranks;
///
/// assert_eq!(average_ranks(&[10.0, 30.0, 20.0, 20.0]), vec![1.0, 4.0, 2.5, 2.5]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

fn validate_pair(x: &[f64], y: &[f64]) -> Result<()> {
    if x.is_empty() || y.is_empty() {
        return Err(Error::shape(format!(
            "correlation requires non-empty samples, got sizes {} and {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() != y.len() {
        return Err(Error::shape(format!(
            "correlation requires samples of equal length, got sizes {} and {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::domain(format!(
            "correlation requires at least 2 observations, got {}",
            x.len()
        )));
    }
    for (name, values) in [("x", x), ("y", y)] {
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::domain(format!("{name}[{i}] must be finite, got {v}")));
        }
    }
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn pearson_unchecked(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (sxy / denominator).clamp(-1.0, 1.0)
}

/// Number of pairs within runs of adjacent equal elements.
fn tied_pairs<T, F>(sorted: &[T], mut eq: F) -> u64
where
    F: FnMut(&T, &T) -> bool,
{
    let mut total = 0;
    let mut run = 1u64;
    for window in sorted.windows(2) {
        if eq(&window[0], &window[1]) {
            run += 1;
        } else {
            total += run * (run - 1) / 2;
            run = 1;
        }
    }
    total + run * (run - 1) / 2
}

/// Sorts `values` ascending and returns the number of inversions, i.e. pairs
/// `i < j` with `values[i] > values[j]`. Equal values are not inversions.
fn merge_sort_inversions(values: &mut [f64], buffer: &mut [f64]) -> u64 {
    let len = values.len();
    if len < 2 {
        return 0;
    }
    let mid = len / 2;
    let mut inversions = {
        let (left, right) = values.split_at_mut(mid);
        let (left_buf, right_buf) = buffer.split_at_mut(mid);
        merge_sort_inversions(left, left_buf) + merge_sort_inversions(right, right_buf)
    };

    let (mut i, mut j, mut k) = (0, mid, 0);
    while i < mid && j < len {
        if values[i] <= values[j] {
            buffer[k] = values[i];
            i += 1;
        } else {
            buffer[k] = values[j];
            j += 1;
            inversions += (mid - i) as u64;
        }
        k += 1;
    }
    buffer[k..k + mid - i].copy_from_slice(&values[i..mid]);
    k += mid - i;
    buffer[k..k + len - j].copy_from_slice(&values[j..len]);
    values.copy_from_slice(&buffer[..len]);
    inversions
}
