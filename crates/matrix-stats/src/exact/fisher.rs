use serde::Serialize;

use crate::{
    combinatorics::hypergeometric_probability, contingency::Table2x2, distribution,
    error::Result, exact::INCLUSION_TOLERANCE,
};

/// Result of Fisher's exact test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FisherResult {
    /// Two-sided p-value.
    pub p_value: f64,
    /// Sample odds ratio `ad / bc`.
    ///
    /// Infinite when `bc = 0 < ad`, zero when `ad = 0 < bc`, NaN when both
    /// products vanish.
    pub odds_ratio: f64,
}

/// Fisher's exact test on `[[a, b], [c, d]]`.
///
/// See [`fisher`] for the algorithm.
///
/// # Examples
///
/// ```
/// use matrix_stats::exact::fisher_test;
///
/// let result = fisher_test(&[[1, 9], [11, 3]]).unwrap();
/// assert!(result.p_value < 0.05);
/// ```
pub fn fisher_test(cells: &[[i64; 2]; 2]) -> Result<FisherResult> {
    Ok(fisher(&Table2x2::new(cells)?))
}

/// Fisher's exact test on a validated table.
///
/// Conditions on both margins: the first cell follows a hypergeometric
/// distribution, and the two-sided p-value sums the probabilities of every
/// table with the same margins that is no more likely than the observed one.
#[must_use]
pub fn fisher(table: &Table2x2) -> FisherResult {
    FisherResult {
        p_value: fisher_p_value(table),
        odds_ratio: odds_ratio(table),
    }
}

#[expect(clippy::cast_precision_loss)]
fn odds_ratio(table: &Table2x2) -> f64 {
    let ad = table.a() as f64 * table.d() as f64;
    let bc = table.b() as f64 * table.c() as f64;
    if bc == 0.0 {
        if ad == 0.0 { f64::NAN } else { f64::INFINITY }
    } else {
        ad / bc
    }
}

/// Two-sided Fisher p-value.
///
/// Tables whose probability is within [`INCLUSION_TOLERANCE`] of the observed
/// one are counted as at least as extreme, which keeps the observed table in
/// the sum despite rounding.
pub(crate) fn fisher_p_value(table: &Table2x2) -> f64 {
    let (n1, n2) = table.row_totals();
    let (m1, _) = table.col_totals();
    let observed = hypergeometric_probability(table.a(), n1, n2, m1);

    let k_min = 0.max(m1 - n2);
    let k_max = n1.min(m1);
    let p: f64 = (k_min..=k_max)
        .map(|k| hypergeometric_probability(k, n1, n2, m1))
        .filter(|&p| p <= observed + INCLUSION_TOLERANCE)
        .sum();
    distribution::clamp_probability(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_table_is_not_significant() {
        let result = fisher_test(&[[1, 1], [1, 1]]).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-9);
        assert!((result.odds_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_extreme_table() {
        let result = fisher_test(&[[1, 9], [11, 3]]).unwrap();
        assert!((result.p_value - 0.002_759_456).abs() < 1e-8);
    }

    #[test]
    fn test_tea_tasting() {
        // Classic 8-cup experiment, 3 of 4 correct.
        let result = fisher_test(&[[3, 1], [1, 3]]).unwrap();
        assert!((result.p_value - 0.485_714_286).abs() < 1e-8);
        assert!((result.odds_ratio - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_moderate_table() {
        let result = fisher_test(&[[12, 8], [6, 14]]).unwrap();
        assert!((result.p_value - 0.110_969_537).abs() < 1e-8);
    }

    #[test]
    fn test_p_value_bounds() {
        for a in 0..6 {
            for b in 0..6 {
                for c in 0..4 {
                    for d in 0..4 {
                        let Ok(result) = fisher_test(&[[a, b], [c, d]]) else {
                            continue;
                        };
                        assert!(
                            (0.0..=1.0).contains(&result.p_value),
                            "[[{a},{b}],[{c},{d}]] p={}",
                            result.p_value
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_degenerate_margin_gives_one() {
        // Empty first column: only one table shares these margins.
        let result = fisher_test(&[[0, 5], [0, 7]]).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-12);
        assert!(result.odds_ratio.is_nan());
    }

    #[test]
    fn test_odds_ratio_infinite() {
        let result = fisher_test(&[[5, 0], [0, 5]]).unwrap();
        assert_eq!(result.odds_ratio, f64::INFINITY);
    }

    #[test]
    fn test_odds_ratio_large_counts() {
        let ad = 4e9 * 4e9;
        let bc = 2e9 * 1.33e9;
        let table = Table2x2::new(&[
            [4_000_000_000, 2_000_000_000],
            [1_330_000_000, 4_000_000_000],
        ])
        .unwrap();
        assert!((odds_ratio(&table) - ad / bc).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(fisher_test(&[[0, 0], [0, 0]]).unwrap_err().is_domain());
        assert!(fisher_test(&[[1, 2], [3, -1]]).unwrap_err().is_domain());
    }
}
