//! One-dimensional kernel density estimation.
//!
//! The estimate at `x` from samples `x_1..x_n` with bandwidth `h` is
//!
//! ```text
//! f(x) = 1 / (n h) · Σ K((x - x_i) / h)
//! ```
//!
//! evaluated on an evenly spaced grid. Without an explicit bandwidth,
//! Silverman's rule of thumb is used:
//!
//! ```text
//! h = 0.9 · min(σ, IQR / 1.34) · n^(-1/5)
//! ```
//!
//! # Example
//!
//! ```
//! use matrix_stats::kde::{KdeOptions, Kernel, KernelDensity};
//!
//! let samples = [1.2, 2.3, 1.8, 2.1, 3.5, 2.9];
//! let kde = KernelDensity::fit(&samples, &KdeOptions::default()).unwrap();
//! assert_eq!(kde.x().len(), 512);
//!
//! let (peak, _) = kde.peak();
//! assert!((1.2..=3.5).contains(&peak));
//!
//! let narrow = KernelDensity::fit(
//!     &samples,
//!     &KdeOptions::default().kernel(Kernel::Epanechnikov).adjust(0.5).n(64),
//! )
//! .unwrap();
//! assert!((narrow.bandwidth() - kde.bandwidth() / 2.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    descriptive::DescriptiveStats,
    error::{Error, Result},
    quantile,
};

/// Kernel shape. Every kernel is symmetric, non-negative and integrates to 1.
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
pub enum Kernel {
    /// Standard normal density, infinite support.
    #[default]
    Gaussian,
    /// `0.75 (1 - u²)` on `[-1, 1]`.
    Epanechnikov,
    /// `0.5` on `[-1, 1]`.
    Uniform,
    /// `1 - |u|` on `[-1, 1]`.
    Triangular,
}

impl Kernel {
    /// Evaluates the kernel at the standardized distance `u`.
    ///
    /// # Examples
    ///
    /// ```
    /// use matrix_stats::kde::Kernel;
    ///
    /// assert_eq!(Kernel::Uniform.weight(0.3), 0.5);
    /// assert_eq!(Kernel::Triangular.weight(-1.5), 0.0);
    /// assert!(Kernel::Gaussian.weight(0.0) > Kernel::Gaussian.weight(1.0));
    /// ```
    #[must_use]
    pub fn weight(self, u: f64) -> f64 {
        match self {
            Self::Gaussian => (-0.5 * u * u).exp() / (2.0 * PI).sqrt(),
            Self::Epanechnikov if u.abs() <= 1.0 => 0.75 * (1.0 - u * u),
            Self::Uniform if u.abs() <= 1.0 => 0.5,
            Self::Triangular if u.abs() <= 1.0 => 1.0 - u.abs(),
            Self::Epanechnikov | Self::Uniform | Self::Triangular => 0.0,
        }
    }
}

/// Options for [`KernelDensity::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdeOptions {
    /// Kernel shape. Default: Gaussian.
    pub kernel: Kernel,
    /// Explicit bandwidth. Default: Silverman's rule.
    pub bandwidth: Option<f64>,
    /// Multiplier applied to the bandwidth. Default: 1.0.
    pub adjust: f64,
    /// Number of grid points. Default: 512.
    pub n: usize,
    /// Restrict the grid to the sample range. Default: false, which extends
    /// the grid by 10% of the range on both sides.
    pub trim: bool,
    /// Explicit lower end of the grid.
    pub from: Option<f64>,
    /// Explicit upper end of the grid.
    pub to: Option<f64>,
}

impl Default for KdeOptions {
    fn default() -> Self {
        Self {
            kernel: Kernel::Gaussian,
            bandwidth: None,
            adjust: 1.0,
            n: 512,
            trim: false,
            from: None,
            to: None,
        }
    }
}

impl KdeOptions {
    #[must_use]
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    #[must_use]
    pub fn bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    #[must_use]
    pub fn adjust(mut self, adjust: f64) -> Self {
        self.adjust = adjust;
        self
    }

    #[must_use]
    pub fn n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    #[must_use]
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    #[must_use]
    pub fn from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: f64) -> Self {
        self.to = Some(to);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n < 2 {
            return Err(Error::domain(format!(
                "KDE grid needs at least 2 points, got {}",
                self.n
            )));
        }
        if !(self.adjust.is_finite() && self.adjust > 0.0) {
            return Err(Error::domain(format!(
                "bandwidth adjustment must be positive, got {}",
                self.adjust
            )));
        }
        if let Some(h) = self.bandwidth
            && !(h.is_finite() && h > 0.0)
        {
            return Err(Error::domain(format!("bandwidth must be positive, got {h}")));
        }
        for (name, bound) in [("from", self.from), ("to", self.to)] {
            if let Some(v) = bound
                && !v.is_finite()
            {
                return Err(Error::domain(format!("{name} must be finite, got {v}")));
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from >= to
        {
            return Err(Error::domain(format!(
                "grid bounds must satisfy from < to, got from={from}, to={to}"
            )));
        }
        Ok(())
    }
}

/// A fitted kernel density estimate.
///
/// Holds a sorted copy of the samples, so it can evaluate the density at
/// arbitrary points after fitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelDensity {
    samples: Vec<f64>,
    bandwidth: f64,
    kernel: Kernel,
    x: Vec<f64>,
    density: Vec<f64>,
}

impl KernelDensity {
    /// Fits a density to the finite values in `samples`.
    ///
    /// NaN and infinite values are dropped. Fails when fewer than two values
    /// remain, when the options are invalid, or when Silverman's rule is
    /// needed and the samples have no spread.
    pub fn fit(samples: &[f64], options: &KdeOptions) -> Result<Self> {
        Self::fit_iter(samples.iter().copied(), options)
    }

    /// Like [`Self::fit`], for a column with missing values.
    ///
    /// # Examples
    ///
    /// ```
    /// use matrix_stats::kde::{KdeOptions, KernelDensity};
    ///
    /// let column = [Some(1.0), None, Some(2.5), Some(2.0)];
    /// let kde = KernelDensity::fit_optional(&column, &KdeOptions::default()).unwrap();
    /// assert_eq!(kde.samples(), &[1.0, 2.0, 2.5]);
    ///
    /// assert!(KernelDensity::fit_optional(&[Some(1.0), None], &KdeOptions::default()).is_err());
    /// ```
    pub fn fit_optional(samples: &[Option<f64>], options: &KdeOptions) -> Result<Self> {
        Self::fit_iter(samples.iter().flatten().copied(), options)
    }

    fn fit_iter<I>(samples: I, options: &KdeOptions) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        options.validate()?;
        let mut samples = samples
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if samples.len() < 2 {
            return Err(Error::domain(format!(
                "KDE requires at least 2 finite samples, got {}",
                samples.len()
            )));
        }
        samples.sort_by(f64::total_cmp);

        let base = match options.bandwidth {
            Some(h) => h,
            None => silverman_sorted(&samples)?,
        };
        let bandwidth = base * options.adjust;

        let x = grid(&samples, bandwidth, options)?;
        let density = x
            .iter()
            .map(|&point| density_at(&samples, bandwidth, options.kernel, point))
            .collect();
        debug!(
            samples = samples.len(),
            bandwidth,
            kernel = %options.kernel,
            "fitted kernel density"
        );

        Ok(Self {
            samples,
            bandwidth,
            kernel: options.kernel,
            x,
            density,
        })
    }

    /// Evaluates the density at a single point, without the grid.
    #[must_use]
    pub fn density_at(&self, point: f64) -> f64 {
        density_at(&self.samples, self.bandwidth, self.kernel, point)
    }

    /// The evaluation grid.
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// The density at each grid point.
    #[must_use]
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// The samples used, sorted ascending.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Returns the grid point with the highest density and its density.
    ///
    /// Ties resolve to the leftmost grid point.
    #[must_use]
    pub fn peak(&self) -> (f64, f64) {
        self.x
            .iter()
            .copied()
            .zip(self.density.iter().copied())
            .fold((f64::NAN, f64::NEG_INFINITY), |best, (x, d)| {
                if d > best.1 { (x, d) } else { best }
            })
    }
}

/// Silverman's rule-of-thumb bandwidth.
///
/// The samples may come in any order. Falls back to the standard deviation
/// alone when the IQR is zero, and fails when the samples are empty, contain
/// a non-finite value or have no spread at all.
///
/// # Examples
///
/// ```
/// use matrix_stats::kde::silverman_bandwidth;
///
/// let h = silverman_bandwidth(&[2.3, 1.2, 3.5, 1.8, 2.9, 2.1]).unwrap();
/// assert!((h - 0.410_691_31).abs() < 1e-8);
/// ```
pub fn silverman_bandwidth(samples: &[f64]) -> Result<f64> {
    if let Some((i, v)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::domain(format!(
            "bandwidth selection requires finite samples, got {v} at index {i}"
        )));
    }
    silverman_sorted(&quantile::sorted_copy(samples))
}

#[expect(clippy::cast_precision_loss)]
fn silverman_sorted(sorted_samples: &[f64]) -> Result<f64> {
    let stats = DescriptiveStats::new(sorted_samples)
        .ok_or_else(|| Error::domain("bandwidth selection requires samples, got 0"))?;
    let iqr = quantile::interquartile_range(sorted_samples);
    let spread = if iqr > 0.0 {
        stats.std_dev.min(iqr / 1.34)
    } else {
        stats.std_dev
    };
    if spread <= 0.0 {
        return Err(Error::degenerate(
            "samples have zero variance; supply an explicit bandwidth",
        ));
    }
    Ok(0.9 * spread * (stats.count as f64).powf(-0.2))
}

fn density_at(samples: &[f64], bandwidth: f64, kernel: Kernel, point: f64) -> f64 {
    #[expect(clippy::cast_precision_loss)]
    let scale = samples.len() as f64 * bandwidth;
    samples
        .iter()
        .map(|&xi| kernel.weight((point - xi) / bandwidth))
        .sum::<f64>()
        / scale
}

#[expect(clippy::cast_precision_loss)]
fn grid(sorted_samples: &[f64], bandwidth: f64, options: &KdeOptions) -> Result<Vec<f64>> {
    let min = sorted_samples[0];
    let max = sorted_samples[sorted_samples.len() - 1];
    let range = max - min;
    // Constant samples (with an explicit bandwidth) leave no range to extend.
    let ext = if range == 0.0 {
        3.0 * bandwidth
    } else if options.trim {
        0.0
    } else {
        0.1 * range
    };
    let lo = options.from.unwrap_or(min - ext);
    let hi = options.to.unwrap_or(max + ext);
    if lo >= hi {
        return Err(Error::domain(format!(
            "grid bounds must satisfy from < to, got from={lo}, to={hi}"
        )));
    }

    let step = (hi - lo) / (options.n - 1) as f64;
    let mut x = (0..options.n).map(|i| lo + i as f64 * step).collect::<Vec<_>>();
    x[options.n - 1] = hi;
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 6] = [1.2, 2.3, 1.8, 2.1, 3.5, 2.9];
    const ALL_KERNELS: [Kernel; 4] = [
        Kernel::Gaussian,
        Kernel::Epanechnikov,
        Kernel::Uniform,
        Kernel::Triangular,
    ];

    fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
        x.windows(2)
            .zip(y.windows(2))
            .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
            .sum()
    }

    fn spread_samples() -> Vec<f64> {
        (0..200)
            .map(|i| (f64::from(i) * 0.754_877_666).fract() * 10.0)
            .collect()
    }

    #[test]
    fn test_kernels_integrate_to_one() {
        for kernel in ALL_KERNELS {
            let xs = (0..=8000).map(|i| -4.0 + f64::from(i) * 0.001).collect::<Vec<_>>();
            let ys = xs.iter().map(|&u| kernel.weight(u)).collect::<Vec<_>>();
            let area = trapezoid(&xs, &ys);
            assert!((area - 1.0).abs() < 1e-3, "{kernel}: {area}");
            assert!(kernel.weight(0.0) > 0.0);
            assert_eq!(kernel.weight(0.7), kernel.weight(-0.7));
        }
    }

    #[test]
    fn test_density_normalization_default_grid() {
        let samples = spread_samples();
        for kernel in ALL_KERNELS {
            let kde = KernelDensity::fit(&samples, &KdeOptions::default().kernel(kernel)).unwrap();
            let area = trapezoid(kde.x(), kde.density());
            assert!((area - 1.0).abs() < 0.03, "{kernel}: {area}");
        }
    }

    #[test]
    fn test_density_normalization_wide_grid() {
        let h = silverman_bandwidth(&SAMPLES).unwrap();
        for kernel in ALL_KERNELS {
            let options = KdeOptions::default()
                .kernel(kernel)
                .from(1.2 - 5.0 * h)
                .to(3.5 + 5.0 * h);
            let kde = KernelDensity::fit(&SAMPLES, &options).unwrap();
            let area = trapezoid(kde.x(), kde.density());
            assert!((area - 1.0).abs() < 0.005, "{kernel}: {area}");
        }
    }

    #[test]
    fn test_peak_within_sample_range() {
        let kde = KernelDensity::fit(&SAMPLES, &KdeOptions::default()).unwrap();
        let (peak, height) = kde.peak();
        assert!((1.2..=3.5).contains(&peak), "{peak}");
        assert!((peak - 2.093).abs() < 0.01, "{peak}");
        assert!(height > 0.0);
    }

    #[test]
    fn test_grid_bounds() {
        let kde = KernelDensity::fit(&SAMPLES, &KdeOptions::default().n(11)).unwrap();
        assert_eq!(kde.x().len(), 11);
        assert_eq!(kde.density().len(), 11);
        assert!((kde.x()[0] - (1.2 - 0.23)).abs() < 1e-12);
        assert!((kde.x()[10] - (3.5 + 0.23)).abs() < 1e-12);

        let trimmed = KernelDensity::fit(&SAMPLES, &KdeOptions::default().trim(true)).unwrap();
        assert_eq!(trimmed.x()[0], 1.2);
        assert_eq!(trimmed.x()[511], 3.5);

        let explicit =
            KernelDensity::fit(&SAMPLES, &KdeOptions::default().from(0.0).to(5.0)).unwrap();
        assert_eq!(explicit.x()[0], 0.0);
        assert_eq!(explicit.x()[511], 5.0);
    }

    #[test]
    fn test_point_query_matches_grid() {
        let options = KdeOptions::default().kernel(Kernel::Triangular);
        let kde = KernelDensity::fit(&SAMPLES, &options).unwrap();
        for (&x, &d) in kde.x().iter().zip(kde.density()).step_by(37) {
            assert!((kde.density_at(x) - d).abs() < 1e-15);
        }
        assert_eq!(kde.density_at(100.0), 0.0);
    }

    #[test]
    fn test_explicit_bandwidth_is_adjusted() {
        let options = KdeOptions::default().bandwidth(0.5).adjust(2.0);
        let kde = KernelDensity::fit(&SAMPLES, &options).unwrap();
        assert_eq!(kde.bandwidth(), 1.0);
    }

    #[test]
    fn test_samples_are_filtered_and_sorted() {
        let samples = [3.0, f64::NAN, 1.0, f64::INFINITY, 2.0];
        let kde = KernelDensity::fit(&samples, &KdeOptions::default()).unwrap();
        assert_eq!(kde.samples(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_silverman_accepts_any_order() {
        let sorted = quantile::sorted_copy(&SAMPLES);
        let mut reversed = sorted.clone();
        reversed.reverse();
        let h = silverman_bandwidth(&sorted).unwrap();
        assert_eq!(silverman_bandwidth(&SAMPLES).unwrap(), h);
        assert_eq!(silverman_bandwidth(&reversed).unwrap(), h);

        assert!(silverman_bandwidth(&[]).unwrap_err().is_domain());
        let err = silverman_bandwidth(&[1.0, f64::NAN, 2.0]).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("index 1"), "{err}");
    }

    #[test]
    fn test_too_few_samples() {
        let err = KernelDensity::fit(&[1.0, f64::NAN], &KdeOptions::default()).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("got 1"), "{err}");
    }

    #[test]
    fn test_constant_samples() {
        let err = KernelDensity::fit(&[2.0, 2.0, 2.0], &KdeOptions::default()).unwrap_err();
        assert!(err.is_degenerate());

        let kde =
            KernelDensity::fit(&[2.0, 2.0, 2.0], &KdeOptions::default().bandwidth(0.5)).unwrap();
        let (peak, _) = kde.peak();
        assert!((peak - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_invalid_options() {
        let fit = |options: KdeOptions| KernelDensity::fit(&SAMPLES, &options).unwrap_err();
        assert!(fit(KdeOptions::default().n(1)).is_domain());
        assert!(fit(KdeOptions::default().adjust(0.0)).is_domain());
        assert!(fit(KdeOptions::default().bandwidth(-1.0)).is_domain());
        assert!(fit(KdeOptions::default().from(3.0).to(1.0)).is_domain());
        assert!(fit(KdeOptions::default().from(10.0)).is_domain());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: KdeOptions =
            serde_json::from_str(r#"{"kernel": "epanechnikov", "n": 128}"#).unwrap();
        assert_eq!(options.kernel, Kernel::Epanechnikov);
        assert_eq!(options.n, 128);
        assert_eq!(options.adjust, 1.0);
    }
}
