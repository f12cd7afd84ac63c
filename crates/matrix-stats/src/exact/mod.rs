//! Exact and asymptotic tests on contingency tables.
//!
//! - [`fisher`]: Fisher's exact test, conditional on both margins
//! - [`barnard`]: Barnard's unconditional test, ordered by the Wald score
//! - [`boschloo`]: Boschloo's unconditional test, ordered by Fisher's p-value
//! - [`cochran_armitage`]: trend in proportions across ordered categories
//! - [`cochran_mantel_haenszel`]: association across stratified 2×2 tables
//!
//! # Unconditional tests
//!
//! Barnard and Boschloo only condition on the row totals `n1` and `n2`. Under
//! the null hypothesis both groups share an unknown success probability π,
//! the nuisance parameter. For a trial π the p-value is the probability of
//! every table at least as extreme as the observed one,
//!
//! ```text
//! P(π) = Σ  Binom(x1; n1, π) · Binom(x2; n2, π)      over extreme (x1, x2)
//! ```
//!
//! and the reported p-value is the maximum of `P(π)` over a grid of
//! `min(100, n + 1)` evenly spaced values of π in `[0, 1]`. The grid is kept
//! rather than a continuous optimizer: `P(π)` is not unimodal in general and
//! the grid result is reproducible.
//!
//! # Cost
//!
//! The unconditional tests enumerate every `(x1, x2)` pair for every grid
//! point, i.e. `O(grid · n1 · n2)` work. This becomes slow beyond a total of
//! about 200 observations; a warning is logged for such inputs.

use tracing::warn;

use crate::{combinatorics::binomial_probability, contingency::Table2x2, error::Error};

pub use self::{
    barnard::{BarnardResult, barnard, barnard_test},
    boschloo::{BoschlooResult, boschloo, boschloo_test},
    cochran_armitage::{CochranArmitageResult, cochran_armitage_test},
    cochran_mantel_haenszel::{CmhResult, cmh, cmh_test},
    fisher::{FisherResult, fisher, fisher_test},
};

pub mod barnard;
pub mod boschloo;
pub mod cochran_armitage;
pub mod cochran_mantel_haenszel;
pub mod fisher;

/// Slack added when comparing a candidate's extremeness against the observed
/// table, so that the observed table always counts as extreme.
pub const INCLUSION_TOLERANCE: f64 = 1e-10;

/// Maximum number of grid points for the nuisance parameter search.
pub const MAX_NUISANCE_GRID: usize = 100;

/// Total sample size beyond which the unconditional tests are slow.
pub const UNCONDITIONAL_PRACTICAL_LIMIT: i64 = 200;

/// Maximum of the tail probability over the nuisance grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NuisanceMaximum {
    pub(crate) p_value: f64,
    pub(crate) nuisance: f64,
}

/// Returns the row totals of a table for an unconditional test, rejecting
/// tables with an empty row.
pub(crate) fn unconditional_groups(test: &str, table: &Table2x2) -> Result<(i64, i64), Error> {
    let (n1, n2) = table.row_totals();
    if n1 == 0 || n2 == 0 {
        return Err(Error::domain(format!(
            "{test} test requires both row totals to be positive, got n1={n1}, n2={n2}"
        )));
    }
    if n1 + n2 > UNCONDITIONAL_PRACTICAL_LIMIT {
        warn!(
            n = n1 + n2,
            "{test} test enumerates O(n1 * n2) tables per grid point; this input may be slow"
        );
    }
    Ok((n1, n2))
}

/// The nuisance grid `π_i = i / (steps - 1)` for `i` in `0..steps`.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn nuisance_grid(n: i64) -> impl Iterator<Item = f64> {
    let steps = usize::try_from(n + 1).map_or(MAX_NUISANCE_GRID, |s| s.min(MAX_NUISANCE_GRID));
    let last = (steps.max(2) - 1) as f64;
    (0..steps).map(move |i| i as f64 / last)
}

/// Maximizes `Σ Binom(x1; n1, π) · Binom(x2; n2, π)` over extreme tables.
///
/// `is_extreme(x1, x2, π)` decides whether the table with `x1` successes in
/// the first row and `x2` in the second counts towards the tail at π.
pub(crate) fn maximize_over_nuisance<F>(n1: i64, n2: i64, mut is_extreme: F) -> NuisanceMaximum
where
    F: FnMut(i64, i64, f64) -> bool,
{
    let mut best = NuisanceMaximum {
        p_value: 0.0,
        nuisance: 0.0,
    };
    for pi in nuisance_grid(n1 + n2) {
        let row1 = (0..=n1)
            .map(|x| binomial_probability(n1, x, pi))
            .collect::<Vec<_>>();
        let row2 = (0..=n2)
            .map(|x| binomial_probability(n2, x, pi))
            .collect::<Vec<_>>();

        let mut p = 0.0;
        for (x1, &p1) in (0..).zip(&row1) {
            for (x2, &p2) in (0..).zip(&row2) {
                if is_extreme(x1, x2, pi) {
                    p += p1 * p2;
                }
            }
        }
        if p > best.p_value {
            best = NuisanceMaximum {
                p_value: p,
                nuisance: pi,
            };
        }
    }
    best.p_value = best.p_value.min(1.0);
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nuisance_grid_small_sample() {
        let grid = nuisance_grid(4).collect::<Vec<_>>();
        assert_eq!(grid, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_nuisance_grid_is_capped() {
        let grid = nuisance_grid(1000).collect::<Vec<_>>();
        assert_eq!(grid.len(), MAX_NUISANCE_GRID);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[MAX_NUISANCE_GRID - 1], 1.0);
    }

    #[test]
    fn test_everything_extreme_gives_one() {
        let max = maximize_over_nuisance(5, 7, |_, _, _| true);
        assert!((max.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nothing_extreme_gives_zero() {
        let max = maximize_over_nuisance(5, 7, |_, _, _| false);
        assert_eq!(max.p_value, 0.0);
    }

    #[test]
    fn test_empty_row_is_rejected() {
        let table = Table2x2::new(&[[0, 0], [3, 4]]).unwrap();
        let err = unconditional_groups("Barnard", &table).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("n1=0"), "{err}");
    }
}
