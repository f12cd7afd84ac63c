//! Tail probabilities of the reference distributions used by the tests.

use statrs::{
    distribution::{ChiSquared, ContinuousCDF as _, FisherSnedecor},
    function::erf,
};

use crate::error::{Error, Result};

/// Two-sided p-value of a standard normal statistic, `P(|Z| >= |z|)`.
///
/// Infinite statistics yield `0`, a NaN statistic yields NaN.
#[must_use]
pub fn normal_two_sided_p(z: f64) -> f64 {
    clamp_probability(erf::erfc(z.abs() / std::f64::consts::SQRT_2))
}

/// Upper-tail probability of a χ² statistic with `df` degrees of freedom.
pub fn chi_squared_sf(statistic: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df)
        .map_err(|e| Error::domain(format!("invalid chi-squared degrees of freedom {df}: {e}")))?;
    Ok(clamp_probability(dist.sf(statistic)))
}

/// Upper-tail probability of an F statistic.
pub fn f_sf(statistic: f64, df_numerator: f64, df_denominator: f64) -> Result<f64> {
    let dist = FisherSnedecor::new(df_numerator, df_denominator).map_err(|e| {
        Error::domain(format!(
            "invalid F degrees of freedom ({df_numerator}, {df_denominator}): {e}"
        ))
    })?;
    Ok(clamp_probability(dist.sf(statistic)))
}

/// Clamps a probability accumulated in floating point into `[0, 1]`.
pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { p } else { p.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_two_sided_known_values() {
        assert!((normal_two_sided_p(1.959_963_985) - 0.05).abs() < 1e-8);
        assert!((normal_two_sided_p(-1.959_963_985) - 0.05).abs() < 1e-8);
        assert_eq!(normal_two_sided_p(0.0), 1.0);
        assert_eq!(normal_two_sided_p(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_chi_squared_one_df_matches_normal() {
        let z: f64 = 2.3;
        let p = chi_squared_sf(z * z, 1.0).unwrap();
        assert!((p - normal_two_sided_p(z)).abs() < 1e-9);
    }

    #[test]
    fn test_f_sf_known_value() {
        // Upper 5% point of F(2, 10) is 4.102821.
        let p = f_sf(4.102_821, 2.0, 10.0).unwrap();
        assert!((p - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_degrees_of_freedom() {
        assert!(chi_squared_sf(1.0, 0.0).unwrap_err().is_domain());
        assert!(f_sf(1.0, 2.0, -1.0).unwrap_err().is_domain());
    }
}
