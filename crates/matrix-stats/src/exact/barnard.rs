use serde::Serialize;
use tracing::debug;

use crate::{
    contingency::Table2x2,
    error::Result,
    exact::{INCLUSION_TOLERANCE, maximize_over_nuisance, unconditional_groups},
};

/// Result of Barnard's unconditional exact test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarnardResult {
    /// Wald score of the observed table, using the observed pooled proportion.
    pub statistic: f64,
    /// Two-sided p-value, maximized over the nuisance parameter.
    pub p_value: f64,
    /// The grid value of π at which the p-value is attained.
    pub nuisance: f64,
}

/// Barnard's test on `[[a, b], [c, d]]`.
///
/// # Examples
///
/// ```
/// use matrix_stats::exact::{barnard_test, fisher_test};
///
/// let barnard = barnard_test(&[[7, 3], [2, 8]]).unwrap();
/// let fisher = fisher_test(&[[7, 3], [2, 8]]).unwrap();
/// assert!(barnard.p_value < 0.05);
/// assert!(fisher.p_value > 0.05);
/// ```
pub fn barnard_test(cells: &[[i64; 2]; 2]) -> Result<BarnardResult> {
    barnard(&Table2x2::new(cells)?)
}

/// Barnard's test on a validated table.
///
/// Tables with the same row totals are ordered by the absolute Wald score
///
/// ```text
/// T = (p1 - p2) / sqrt(π (1 - π) (1/n1 + 1/n2))
/// ```
///
/// where `π` is the pooled proportion. The reported statistic uses the
/// observed pooled proportion `(a + c) / n`; each candidate table at a trial
/// nuisance value π is scored with that π. Fails when a row total is zero.
pub fn barnard(table: &Table2x2) -> Result<BarnardResult> {
    let (n1, n2) = unconditional_groups("Barnard", table)?;
    let (m1, _) = table.col_totals();
    let pooled = ratio(m1, n1 + n2);
    let statistic = wald_statistic(table.a(), n1, table.c(), n2, pooled);
    let threshold = statistic.abs() - INCLUSION_TOLERANCE;

    let max = maximize_over_nuisance(n1, n2, |x1, x2, pi| {
        wald_statistic(x1, n1, x2, n2, pi).abs() >= threshold
    });
    debug!(statistic, p_value = max.p_value, nuisance = max.nuisance, "Barnard test");

    Ok(BarnardResult {
        statistic,
        p_value: max.p_value,
        nuisance: max.nuisance,
    })
}

/// Wald score for the difference of two proportions.
///
/// With zero variance (π of 0 or 1) the score is `±∞` when the proportions
/// differ and `0` when they agree.
fn wald_statistic(x1: i64, n1: i64, x2: i64, n2: i64, pooled: f64) -> f64 {
    let p1 = ratio(x1, n1);
    let p2 = ratio(x2, n2);
    let variance = pooled * (1.0 - pooled) * (1.0 / ratio(n1, 1) + 1.0 / ratio(n2, 1));
    if variance <= 0.0 {
        if p1 > p2 {
            f64::INFINITY
        } else if p1 < p2 {
            f64::NEG_INFINITY
        } else {
            0.0
        }
    } else {
        (p1 - p2) / variance.sqrt()
    }
}

#[expect(clippy::cast_precision_loss)]
fn ratio(numerator: i64, denominator: i64) -> f64 {
    numerator as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::fisher_test;

    #[test]
    fn test_reference_table() {
        let result = barnard_test(&[[12, 8], [6, 14]]).unwrap();
        assert!((result.statistic - 1.906_925_178_491_184).abs() < 1e-9);
        assert!((result.p_value - 0.114_581_862_904_114).abs() < 1e-9);
        assert!((result.nuisance - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_not_below_fisher_on_reference_table() {
        let cells = [[12, 8], [6, 14]];
        let barnard = barnard_test(&cells).unwrap();
        let fisher = fisher_test(&cells).unwrap();
        assert!(barnard.p_value >= fisher.p_value);
    }

    #[test]
    fn test_extreme_table() {
        let result = barnard_test(&[[1, 9], [11, 3]]).unwrap();
        assert!(result.statistic < 0.0);
        assert!((result.statistic + 3.312_314_684_843_3).abs() < 1e-9);
        assert!((result.p_value - 0.005_423_607_741_494_671).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_table() {
        let result = barnard_test(&[[1, 1], [1, 1]]).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tea_tasting() {
        let result = barnard_test(&[[3, 1], [1, 3]]).unwrap();
        assert!((result.p_value - 0.289_062_5).abs() < 1e-9);
        assert!((result.nuisance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_statistic() {
        // Pooled proportion is 1: every observation is a success.
        let result = barnard_test(&[[4, 0], [6, 0]]).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wald_statistic_degenerate() {
        assert_eq!(wald_statistic(3, 3, 0, 4, 0.0), f64::INFINITY);
        assert_eq!(wald_statistic(0, 3, 4, 4, 1.0), f64::NEG_INFINITY);
        assert_eq!(wald_statistic(1, 2, 2, 4, 0.0), 0.0);
    }

    #[test]
    fn test_empty_row() {
        assert!(barnard_test(&[[0, 0], [5, 5]]).unwrap_err().is_domain());
    }

    #[test]
    fn test_p_value_bounds() {
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let Ok(result) = barnard_test(&[[a, b], [c, d]]) else {
                            continue;
                        };
                        assert!((0.0..=1.0).contains(&result.p_value));
                    }
                }
            }
        }
    }
}
