use serde::Serialize;
use tracing::debug;

use crate::{
    contingency::Table2x2,
    error::Result,
    exact::{
        INCLUSION_TOLERANCE, fisher::fisher_p_value, maximize_over_nuisance, unconditional_groups,
    },
};

/// Result of Boschloo's unconditional exact test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoschlooResult {
    /// The test statistic: Fisher's p-value of the observed table.
    pub statistic: f64,
    /// Boschloo's p-value, maximized over the nuisance parameter.
    pub p_value: f64,
    /// Fisher's two-sided p-value of the observed table.
    pub fisher_p_value: f64,
    /// The grid value of π at which the p-value is attained.
    pub nuisance: f64,
}

/// Boschloo's test on `[[a, b], [c, d]]`.
///
/// # Examples
///
/// ```
/// use matrix_stats::exact::boschloo_test;
///
/// let result = boschloo_test(&[[12, 8], [6, 14]]).unwrap();
/// assert!(result.p_value <= result.fisher_p_value);
/// ```
pub fn boschloo_test(cells: &[[i64; 2]; 2]) -> Result<BoschlooResult> {
    boschloo(&Table2x2::new(cells)?)
}

/// Boschloo's test on a validated table.
///
/// Same unconditional design as Barnard's test, but tables are ordered by
/// their Fisher p-value: a candidate is extreme when its Fisher p-value does
/// not exceed the observed one. Fails when a row total is zero.
pub fn boschloo(table: &Table2x2) -> Result<BoschlooResult> {
    let (n1, n2) = unconditional_groups("Boschloo", table)?;
    let observed = fisher_p_value(table);
    let threshold = observed + INCLUSION_TOLERANCE;

    // A candidate's Fisher p-value does not depend on π.
    let extreme = (0..=n1)
        .map(|x1| {
            (0..=n2)
                .map(|x2| fisher_p_value(&Table2x2::from_groups(x1, n1, x2, n2)) <= threshold)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let max = maximize_over_nuisance(n1, n2, |x1, x2, _| extreme[index(x1)][index(x2)]);
    debug!(
        fisher_p_value = observed,
        p_value = max.p_value,
        nuisance = max.nuisance,
        "Boschloo test"
    );

    Ok(BoschlooResult {
        statistic: observed,
        p_value: max.p_value,
        fisher_p_value: observed,
        nuisance: max.nuisance,
    })
}

#[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn index(x: i64) -> usize {
    x as usize
}
