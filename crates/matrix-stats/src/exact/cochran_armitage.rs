use serde::Serialize;

use crate::{
    distribution,
    error::{Error, Result},
};

/// Variance below which the scores are considered to carry no variation.
const MIN_VARIANCE: f64 = 1e-10;

/// Result of the Cochran-Armitage test for trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CochranArmitageResult {
    /// Standardized trend statistic Z. Positive when the case proportion
    /// increases with the score.
    pub statistic: f64,
    /// Two-sided p-value from the standard normal distribution.
    pub p_value: f64,
    /// The scores assigned to the categories.
    pub scores: Vec<f64>,
}

/// Cochran-Armitage test for a trend in case proportions across `k` ordered
/// categories.
///
/// `cases[i]` and `controls[i]` are the counts in category `i`; `scores`
/// weights the categories and defaults to `0, 1, ..., k - 1`. The choice of
/// scores affects power, not validity, and an affine rescaling `a + b·s` with
/// `b > 0` leaves the p-value unchanged.
///
/// With `R` cases, `S` controls, `N = R + S` and `n_i` observations in
/// category `i`:
///
/// ```text
/// T      = Σ s_i (cases_i · S - controls_i · R)
/// Var(T) = (R S / N) · (N Σ s_i² n_i - (Σ s_i n_i)²)
/// Z      = T / sqrt(Var(T))
/// ```
///
/// # Errors
///
/// * shape error: lists of different lengths, fewer than two categories, or
///   a score list of the wrong length
/// * domain error: a negative count, a non-finite score, or no observations
/// * degenerate error: zero variance, e.g. equal scores or all observations
///   in one category
///
/// # Examples
///
/// ```
/// use matrix_stats::exact::cochran_armitage_test;
///
/// let result = cochran_armitage_test(
///     &[10, 18, 32, 45],
///     &[90, 82, 68, 55],
///     Some(&[0.0, 5.0, 15.0, 30.0]),
/// )
/// .unwrap();
/// assert!(result.statistic > 0.0);
/// assert!(result.p_value < 0.001);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn cochran_armitage_test(
    cases: &[i64],
    controls: &[i64],
    scores: Option<&[f64]>,
) -> Result<CochranArmitageResult> {
    if cases.len() != controls.len() {
        return Err(Error::shape(format!(
            "cases and controls must have the same length, got {} and {}",
            cases.len(),
            controls.len()
        )));
    }
    if cases.len() < 2 {
        return Err(Error::shape(format!(
            "trend test requires at least 2 categories, got {}",
            cases.len()
        )));
    }
    for (name, counts) in [("cases", cases), ("controls", controls)] {
        if let Some((i, value)) = counts.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(Error::domain(format!(
                "{name}[{i}] must be non-negative, got {value}"
            )));
        }
    }
    let scores = match scores {
        Some(scores) if scores.len() != cases.len() => {
            return Err(Error::shape(format!(
                "scores must have one entry per category ({}), got {}",
                cases.len(),
                scores.len()
            )));
        }
        Some(scores) => {
            if let Some((i, value)) = scores.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(Error::domain(format!("scores[{i}] must be finite, got {value}")));
            }
            scores.to_vec()
        }
        None => (0..cases.len()).map(|i| i as f64).collect(),
    };

    let total_cases = cases.iter().map(|&v| v as f64).sum::<f64>();
    let total_controls = controls.iter().map(|&v| v as f64).sum::<f64>();
    let total = total_cases + total_controls;
    if total == 0.0 {
        return Err(Error::domain("trend test requires a positive grand total, got 0"));
    }

    let mut trend = 0.0;
    let mut weighted = 0.0;
    let mut weighted_squares = 0.0;
    for ((&case, &control), &score) in cases.iter().zip(controls).zip(&scores) {
        let (case, control) = (case as f64, control as f64);
        let n = case + control;
        trend += score * (case * total_controls - control * total_cases);
        weighted += score * n;
        weighted_squares += score * score * n;
    }
    let variance = total_cases * total_controls / total
        * (total * weighted_squares - weighted * weighted);
    if variance < MIN_VARIANCE {
        return Err(Error::degenerate(format!(
            "no variation in scores: trend variance is {variance}"
        )));
    }

    let statistic = trend / variance.sqrt();
    Ok(CochranArmitageResult {
        statistic,
        p_value: distribution::normal_two_sided_p(statistic),
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: [i64; 4] = [10, 18, 32, 45];
    const CONTROLS: [i64; 4] = [90, 82, 68, 55];
    const SCORES: [f64; 4] = [0.0, 5.0, 15.0, 30.0];

    #[test]
    fn test_documented_example() {
        let result = cochran_armitage_test(&CASES, &CONTROLS, Some(&SCORES)).unwrap();
        assert!((result.statistic - 6.025_886_736_826_7).abs() < 1e-9);
        assert!(result.p_value < 1e-4);
        assert_eq!(result.scores, SCORES);
    }

    #[test]
    fn test_default_scores() {
        let result = cochran_armitage_test(&CASES, &CONTROLS, None).unwrap();
        assert_eq!(result.scores, vec![0.0, 1.0, 2.0, 3.0]);
        assert!((result.statistic - 6.047_645_103_627_9).abs() < 1e-9);
    }

    #[test]
    fn test_affine_invariance() {
        let base = cochran_armitage_test(&CASES, &CONTROLS, Some(&SCORES)).unwrap();
        for (a, b) in [(3.0, 2.0), (-10.0, 0.5), (100.0, 7.25)] {
            let rescaled = SCORES.map(|s| a + b * s);
            let result = cochran_armitage_test(&CASES, &CONTROLS, Some(&rescaled)).unwrap();
            assert!((result.p_value - base.p_value).abs() < 1e-12);
            assert!((result.statistic - base.statistic).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reversed_scores_flip_sign() {
        let base = cochran_armitage_test(&CASES, &CONTROLS, None).unwrap();
        let reversed =
            cochran_armitage_test(&CASES, &CONTROLS, Some(&[3.0, 2.0, 1.0, 0.0])).unwrap();
        assert!((reversed.statistic + base.statistic).abs() < 1e-9);
        assert!((reversed.p_value - base.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_no_trend() {
        let result = cochran_armitage_test(&[10, 10, 10], &[20, 20, 20], None).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_scores_are_degenerate() {
        let err = cochran_armitage_test(&CASES, &CONTROLS, Some(&[2.0; 4])).unwrap_err();
        assert!(err.is_degenerate());
        assert!(err.message().contains("no variation"));
    }

    #[test]
    fn test_totals_beyond_i64() {
        let result = cochran_armitage_test(&[i64::MAX, i64::MAX], &[1, 2], None).unwrap();
        assert!(result.statistic.is_finite());
        assert!((0.0..=1.0).contains(&result.p_value));
    }

    #[test]
    fn test_validation() {
        assert!(cochran_armitage_test(&[1, 2], &[1], None).unwrap_err().is_shape());
        assert!(cochran_armitage_test(&[1], &[1], None).unwrap_err().is_shape());
        assert!(
            cochran_armitage_test(&[1, 2], &[3, 4], Some(&[1.0]))
                .unwrap_err()
                .is_shape()
        );
        let err = cochran_armitage_test(&[1, 2], &[3, -4], None).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("controls[1]"), "{err}");
        assert!(cochran_armitage_test(&[0, 0], &[0, 0], None).unwrap_err().is_domain());
        assert!(
            cochran_armitage_test(&[1, 2], &[3, 4], Some(&[0.0, f64::NAN]))
                .unwrap_err()
                .is_domain()
        );
    }
}
