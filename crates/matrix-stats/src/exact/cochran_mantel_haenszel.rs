use serde::Serialize;
use tracing::debug;

use crate::{
    contingency::Table2x2,
    distribution,
    error::{Error, Result},
};

/// Total variance or odds-ratio denominator below which it is treated as zero.
const MIN_VARIANCE: f64 = 1e-10;

/// Result of the Cochran-Mantel-Haenszel test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CmhResult {
    /// The CMH χ² statistic.
    pub statistic: f64,
    /// Upper-tail p-value of χ² with one degree of freedom.
    pub p_value: f64,
    /// Mantel-Haenszel estimate of the common odds ratio. NaN when every
    /// stratum has `bc = 0`.
    pub common_odds_ratio: f64,
    /// Always 1 for stratified 2×2 tables.
    pub degrees_of_freedom: u32,
    /// Whether the 0.5 continuity correction was applied.
    pub continuity_correction: bool,
}

/// Cochran-Mantel-Haenszel test of conditional independence across strata.
///
/// Each stratum is a `[[a, b], [c, d]]` table. Conditional on its margins, the
/// first cell of stratum `i` has
///
/// ```text
/// E[a_i]   = n1 m1 / n
/// Var(a_i) = n1 n2 m1 m2 / (n² (n - 1))
/// ```
///
/// and the statistic is `(|Σ (a_i - E[a_i])| - 0.5)² / Σ Var(a_i)`, the
/// correction floored at zero and skipped when `continuity_correction` is
/// false. The Mantel-Haenszel common odds ratio is `Σ (a d / n) / Σ (b c / n)`.
///
/// # Errors
///
/// * shape error: no strata, or a stratum that is not 2×2
/// * domain error: a stratum with a negative cell or zero total (the message
///   names the stratum)
/// * degenerate error: zero total variance
///
/// # Examples
///
/// ```
/// use matrix_stats::exact::cmh_test;
///
/// let strata = [[[2, 5], [3, 6]], [[3, 4], [2, 8]], [[5, 2], [1, 4]]];
/// let result = cmh_test(&strata, true).unwrap();
/// assert!((result.common_odds_ratio - 2.4311).abs() < 1e-4);
/// assert!(result.p_value > 0.05);
/// ```
pub fn cmh_test(strata: &[[[i64; 2]; 2]], continuity_correction: bool) -> Result<CmhResult> {
    let tables = strata
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            Table2x2::new(cells).map_err(|e| match e {
                Error::Shape { message } => Error::shape(format!("stratum {i}: {message}")),
                Error::Domain { message } => Error::domain(format!("stratum {i}: {message}")),
                Error::Degenerate { message } => {
                    Error::degenerate(format!("stratum {i}: {message}"))
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;
    cmh(&tables, continuity_correction)
}

/// Cochran-Mantel-Haenszel test on validated strata.
///
/// See [`cmh_test`].
#[expect(clippy::cast_precision_loss)]
pub fn cmh(strata: &[Table2x2], continuity_correction: bool) -> Result<CmhResult> {
    if strata.is_empty() {
        return Err(Error::shape("CMH test requires at least one stratum, got 0"));
    }

    let mut deviation = 0.0;
    let mut variance = 0.0;
    let mut odds_numerator = 0.0;
    let mut odds_denominator = 0.0;
    for table in strata {
        let (n1, n2) = table.row_totals();
        let (m1, m2) = table.col_totals();
        let (n1, n2, m1, m2) = (n1 as f64, n2 as f64, m1 as f64, m2 as f64);
        let n = table.total() as f64;

        deviation += table.a() as f64 - n1 * m1 / n;
        if n > 1.0 {
            variance += n1 * n2 * m1 * m2 / (n * n * (n - 1.0));
        }
        odds_numerator += table.a() as f64 * table.d() as f64 / n;
        odds_denominator += table.b() as f64 * table.c() as f64 / n;
    }

    if variance < MIN_VARIANCE {
        return Err(Error::degenerate(format!(
            "no variation: total CMH variance is {variance}"
        )));
    }

    let mut numerator = deviation.abs();
    if continuity_correction {
        numerator = (numerator - 0.5).max(0.0);
    }
    let statistic = numerator * numerator / variance;
    let p_value = distribution::chi_squared_sf(statistic, 1.0)?;
    let common_odds_ratio = if odds_denominator.abs() < MIN_VARIANCE {
        f64::NAN
    } else {
        odds_numerator / odds_denominator
    };
    debug!(strata = strata.len(), statistic, p_value, common_odds_ratio, "CMH test");

    Ok(CmhResult {
        statistic,
        p_value,
        common_odds_ratio,
        degrees_of_freedom: 1,
        continuity_correction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATA: [[[i64; 2]; 2]; 3] = [[[2, 5], [3, 6]], [[3, 4], [2, 8]], [[5, 2], [1, 4]]];

    #[test]
    fn test_with_correction() {
        let result = cmh_test(&STRATA, true).unwrap();
        assert!((result.statistic - 1.180_069_017_576_897_7).abs() < 1e-9);
        assert!((result.p_value - 0.277_341_945_398_042_9).abs() < 1e-7);
        assert!((result.common_odds_ratio - 2.431_128_404_669_261).abs() < 1e-9);
        assert_eq!(result.degrees_of_freedom, 1);
        assert!(result.continuity_correction);
    }

    #[test]
    fn test_without_correction() {
        let result = cmh_test(&STRATA, false).unwrap();
        assert!((result.statistic - 1.948_909_170_549_043_3).abs() < 1e-9);
        assert!((result.p_value - 0.162_704_446_493_632).abs() < 1e-7);
        assert!(!result.continuity_correction);
    }

    #[test]
    fn test_single_stratum() {
        let result = cmh_test(&[[[12, 8], [6, 14]]], false).unwrap();
        assert!((result.statistic - 3.545_454_545_454_546).abs() < 1e-9);
        assert!((result.common_odds_ratio - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_correction_floors_at_zero() {
        // Deviation of exactly 0 in a balanced stratum.
        let result = cmh_test(&[[[5, 5], [5, 5]]], true).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_odds_ratio_undefined() {
        let result = cmh_test(&[[[3, 0], [2, 4]], [[1, 2], [0, 5]]], true).unwrap();
        assert!(result.common_odds_ratio.is_nan());
    }

    #[test]
    fn test_counts_in_the_billions() {
        let strata = [
            [[4_000_000_000, 2_000_000_000], [1_330_000_000, 4_000_000_000]],
            [[3_500_000_000, 2_500_000_000], [1_000_000_000, 4_200_000_000]],
        ];
        let result = cmh_test(&strata, true).unwrap();
        assert!(result.statistic.is_finite() && result.statistic > 0.0);
        assert!(result.p_value < 1e-12);

        let (n_1, n_2) = (11.33e9, 11.2e9);
        let expected = (4e9 * 4e9 / n_1 + 3.5e9 * 4.2e9 / n_2)
            / (2e9 * 1.33e9 / n_1 + 2.5e9 * 1e9 / n_2);
        assert!((result.common_odds_ratio / expected - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overflowing_stratum_is_named() {
        let err = cmh_test(&[[[1, 2], [3, 4]], [[i64::MAX, 1], [0, 0]]], true).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().starts_with("stratum 1:"), "{err}");
    }

    #[test]
    fn test_empty_strata() {
        assert!(cmh_test(&[], true).unwrap_err().is_shape());
    }

    #[test]
    fn test_invalid_stratum_is_named() {
        let err = cmh_test(&[[[1, 2], [3, 4]], [[1, -2], [3, 4]]], true).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().starts_with("stratum 1:"), "{err}");
    }

    #[test]
    fn test_no_variation() {
        // Every stratum has an empty column.
        let err = cmh_test(&[[[3, 0], [4, 0]], [[0, 2], [0, 6]]], true).unwrap_err();
        assert!(err.is_degenerate());
    }
}
