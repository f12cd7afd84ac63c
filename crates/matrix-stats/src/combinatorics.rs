//! Log-space binomial and hypergeometric primitives.
//!
//! The exact tests evaluate probabilities of tables whose counts easily
//! overflow factorials, so everything here is accumulated as a sum of
//! logarithms and exponentiated once at the end.
//!
//! Counts are taken as `i64` so that callers can ask for out-of-range
//! (including negative) outcomes and get a zero probability back instead of
//! having to range-check first.

/// Returns `ln C(n, k)`.
///
/// Uses the symmetry `C(n, k) = C(n, n - k)` to keep the product short and
/// accumulates `Σ ln(n - k + i) - ln(i)` for `i = 1..=k`.
///
/// Returns `-∞` when `k < 0` or `k > n`, and `0` when `k` is `0` or `n`.
///
/// # Examples
///
/// ```
/// use matrix_stats::combinatorics::log_binomial_coefficient;
///
/// assert!((log_binomial_coefficient(5, 2) - 10f64.ln()).abs() < 1e-12);
/// assert_eq!(log_binomial_coefficient(5, 0), 0.0);
/// assert_eq!(log_binomial_coefficient(5, 6), f64::NEG_INFINITY);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn log_binomial_coefficient(n: i64, k: i64) -> f64 {
    if k < 0 || k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    let k = k.min(n - k);
    (1..=k)
        .map(|i| ((n - k + i) as f64).ln() - (i as f64).ln())
        .sum()
}

/// Returns the probability of exactly `k` successes in `n` Bernoulli trials
/// with success probability `p`.
///
/// Probabilities at or beyond the boundaries are degenerate: with `p <= 0`
/// only `k == 0` has mass, with `p >= 1` only `k == n` has mass.
///
/// # Examples
///
/// ```
/// use matrix_stats::combinatorics::binomial_probability;
///
/// assert!((binomial_probability(4, 2, 0.5) - 0.375).abs() < 1e-12);
/// assert_eq!(binomial_probability(4, 0, 0.0), 1.0);
/// assert_eq!(binomial_probability(4, 5, 0.5), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn binomial_probability(n: i64, k: i64, p: f64) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    if p <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p >= 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    let log_p =
        log_binomial_coefficient(n, k) + k as f64 * p.ln() + (n - k) as f64 * (1.0 - p).ln();
    log_p.exp()
}

/// Returns the hypergeometric probability of drawing exactly `k` successes.
///
/// The population holds `n + m` items of which `t` are successes, and `n`
/// items are drawn without replacement. In 2×2 table terms: `n` and `m` are
/// the row totals, `t` is the first column total and `k` is the top-left cell.
///
/// Out-of-range `k` yields `0`.
///
/// # Examples
///
/// ```
/// use matrix_stats::combinatorics::hypergeometric_probability;
///
/// // Lady tasting tea: 4 of 8 cups drawn, 4 successes in the population.
/// let p = hypergeometric_probability(4, 4, 4, 4);
/// assert!((p - 1.0 / 70.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn hypergeometric_probability(k: i64, n: i64, m: i64, t: i64) -> f64 {
    let population = n + m;
    let failures = population - t;
    if n < 0 || m < 0 || t < 0 || failures < 0 {
        return 0.0;
    }
    let k_min = 0.max(n - failures);
    let k_max = n.min(t);
    if k < k_min || k > k_max {
        return 0.0;
    }
    let log_p = log_binomial_coefficient(t, k) + log_binomial_coefficient(failures, n - k)
        - log_binomial_coefficient(population, n);
    log_p.exp()
}
