//! K-Means clustering with K-Means++ seeding and elbow-based choice of k.
//!
//! # Example
//!
//! ```
//! use matrix_stats::kmeans::{KMeans, KMeansOptions};
//!
//! let points = [
//!     [0.0, 0.0], [0.5, 0.3], [0.2, 0.4],
//!     [10.0, 10.0], [10.4, 9.8], [9.7, 10.2],
//! ];
//! let clustering = KMeans::fit(&points, &KMeansOptions::new(2).seed(7)).unwrap();
//! assert_eq!(clustering.labels[0], clustering.labels[1]);
//! assert_eq!(clustering.labels[3], clustering.labels[5]);
//! assert_ne!(clustering.labels[0], clustering.labels[3]);
//! ```

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, seq::index};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Options for [`KMeans::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansOptions {
    /// Number of clusters.
    pub k: usize,
    /// Iteration cap. Default: 100.
    pub max_iterations: usize,
    /// Seed with K-Means++ instead of k distinct random points. Default: true.
    pub use_kmeans_plus_plus: bool,
    /// Stop once the relative WCSS improvement falls to `epsilon`. Default: true.
    pub use_epsilon_convergence: bool,
    /// Relative WCSS improvement threshold. Default: 1e-4.
    pub epsilon: f64,
    /// RNG seed. `None` draws a fresh seed for every fit.
    pub seed: Option<u64>,
}

impl KMeansOptions {
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 100,
            use_kmeans_plus_plus: true,
            use_epsilon_convergence: true,
            epsilon: 1e-4,
            seed: None,
        }
    }

    #[must_use]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn use_kmeans_plus_plus(mut self, enabled: bool) -> Self {
        self.use_kmeans_plus_plus = enabled;
        self
    }

    #[must_use]
    pub fn use_epsilon_convergence(mut self, enabled: bool) -> Self {
        self.use_epsilon_convergence = enabled;
        self
    }

    #[must_use]
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Range of k tried by [`KMeans::fit_auto`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowOptions {
    /// Smallest k tried. Default: 1.
    pub k_min: usize,
    /// Largest k tried, capped at the number of points. Default: 10.
    pub k_max: usize,
    /// Options for each fit; `base.k` is ignored.
    pub base: KMeansOptions,
}

impl Default for ElbowOptions {
    fn default() -> Self {
        Self {
            k_min: 1,
            k_max: 10,
            base: KMeansOptions::new(1),
        }
    }
}

/// Outcome of a K-Means fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// Number of clusters.
    pub k: usize,
    /// Cluster id in `0..k` for each input point.
    pub labels: Vec<usize>,
    /// Final centroid of each cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances of the final assignment.
    pub wcss: f64,
    /// WCSS after each iteration; non-increasing.
    pub wcss_history: Vec<f64>,
    /// Number of Lloyd iterations run.
    pub iterations: usize,
    /// Whether the fit stopped before the iteration cap.
    pub converged: bool,
    /// Wall-clock time of the fit. Informational.
    pub elapsed: Duration,
}

impl Clustering {
    /// Number of points in each cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Indices of the points assigned to `cluster`.
    #[must_use]
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &label)| (label == cluster).then_some(i))
            .collect()
    }
}

/// Outcome of [`KMeans::fit_auto`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoClustering {
    /// The chosen number of clusters.
    pub k: usize,
    /// The fit for the chosen k.
    pub clustering: Clustering,
    /// `(k, wcss)` for every k tried.
    pub wcss_by_k: Vec<(usize, f64)>,
}

/// K-Means clustering entry points.
#[derive(Debug, Clone, Copy)]
pub struct KMeans;

impl KMeans {
    /// Partitions `points` into `options.k` clusters with Lloyd's algorithm.
    ///
    /// Each point is assigned to its nearest centroid (ties go to the lower
    /// cluster id), then each centroid moves to the mean of its points. A
    /// cluster that loses all its points keeps its previous centroid.
    /// Iteration stops at `max_iterations`, when no assignment changes, or,
    /// with epsilon convergence, once `prev - wcss <= epsilon * prev`.
    ///
    /// # Errors
    ///
    /// * shape error: no points, or rows of different dimension
    /// * domain error: a non-finite coordinate, `k == 0`, or invalid
    ///   iteration options
    /// * degenerate error: more clusters than points
    pub fn fit<P>(points: &[P], options: &KMeansOptions) -> Result<Clustering>
    where
        P: AsRef<[f64]>,
    {
        let points = validate_points(points)?;
        validate_options(options, points.len())?;
        let mut rng = match options.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::seed_from_u64(rand::rng().random()),
        };
        Ok(lloyd(&points, options, &mut rng))
    }

    /// Fits every k in `k_min..=k_max` and keeps the one at the elbow.
    ///
    /// The WCSS curve is normalized to the unit square and the k whose point
    /// lies farthest from the chord joining the first and last points is
    /// chosen. With fewer than three candidates, or a flat curve, the
    /// smallest k is chosen.
    ///
    /// # Examples
    ///
    /// ```
    /// use matrix_stats::kmeans::{ElbowOptions, KMeans, KMeansOptions};
    ///
    /// let mut points = Vec::new();
    /// for (cx, cy) in [(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)] {
    ///     for i in 0..10 {
    ///         let offset = f64::from(i) * 0.1;
    ///         points.push([cx + offset, cy - offset]);
    ///     }
    /// }
    /// let options = ElbowOptions {
    ///     k_max: 6,
    ///     base: KMeansOptions::new(1).seed(3),
    ///     ..Default::default()
    /// };
    /// let auto = KMeans::fit_auto(&points, &options).unwrap();
    /// assert_eq!(auto.k, 3);
    /// assert_eq!(auto.wcss_by_k.len(), 6);
    /// ```
    pub fn fit_auto<P>(points: &[P], options: &ElbowOptions) -> Result<AutoClustering>
    where
        P: AsRef<[f64]>,
    {
        let rows = validate_points(points)?;
        if options.k_min == 0 {
            return Err(Error::domain("k_min must be at least 1, got 0"));
        }
        if options.k_max < options.k_min {
            return Err(Error::domain(format!(
                "k_max must be >= k_min ({}), got {}",
                options.k_min, options.k_max
            )));
        }
        if options.k_min > rows.len() {
            return Err(Error::degenerate(format!(
                "k_min ({}) exceeds the number of points ({})",
                options.k_min,
                rows.len()
            )));
        }
        let k_max = options.k_max.min(rows.len());

        let mut fits = Vec::with_capacity(k_max - options.k_min + 1);
        for k in options.k_min..=k_max {
            let fit_options = KMeansOptions {
                k,
                ..options.base.clone()
            };
            fits.push(Self::fit(points, &fit_options)?);
        }
        let wcss_by_k = fits.iter().map(|c| (c.k, c.wcss)).collect::<Vec<_>>();
        let best = elbow_index(&fits.iter().map(|c| c.wcss).collect::<Vec<_>>());
        let clustering = fits.swap_remove(best);
        debug!(k = clustering.k, candidates = wcss_by_k.len(), "elbow selected k");

        Ok(AutoClustering {
            k: clustering.k,
            clustering,
            wcss_by_k,
        })
    }
}

fn validate_points<P>(points: &[P]) -> Result<Vec<&[f64]>>
where
    P: AsRef<[f64]>,
{
    let Some(first) = points.first() else {
        return Err(Error::shape("K-Means requires at least one point, got 0"));
    };
    let dim = first.as_ref().len();
    if dim == 0 {
        return Err(Error::shape("points must have at least one coordinate"));
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let p = p.as_ref();
            if p.len() != dim {
                return Err(Error::shape(format!(
                    "row {i} has {} coordinates, expected {dim}",
                    p.len()
                )));
            }
            if let Some((j, v)) = p.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(Error::domain(format!(
                    "point [{i}][{j}] must be finite, got {v}"
                )));
            }
            Ok(p)
        })
        .collect()
}

fn validate_options(options: &KMeansOptions, n: usize) -> Result<()> {
    if options.k == 0 {
        return Err(Error::domain("k must be at least 1, got 0"));
    }
    if options.k > n {
        return Err(Error::degenerate(format!(
            "k ({}) exceeds the number of points ({n})",
            options.k
        )));
    }
    if options.max_iterations == 0 {
        return Err(Error::domain("max_iterations must be at least 1, got 0"));
    }
    if !(options.epsilon.is_finite() && options.epsilon >= 0.0) {
        return Err(Error::domain(format!(
            "epsilon must be finite and non-negative, got {}",
            options.epsilon
        )));
    }
    Ok(())
}

fn lloyd(points: &[&[f64]], options: &KMeansOptions, rng: &mut Pcg64) -> Clustering {
    let start = Instant::now();
    let mut centroids = if options.use_kmeans_plus_plus {
        kmeans_plus_plus(points, options.k, rng)
    } else {
        random_centroids(points, options.k, rng)
    };
    let (mut labels, mut wcss) = assign(points, &centroids);

    let mut wcss_history = Vec::new();
    let mut converged = false;
    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        update_centroids(points, &labels, &mut centroids);
        let (next_labels, next_wcss) = assign(points, &centroids);
        let changed = next_labels != labels;
        let previous = wcss;
        labels = next_labels;
        wcss = next_wcss;
        wcss_history.push(wcss);
        debug!(iteration = iterations, wcss, changed, "K-Means iteration");

        if !changed
            || (options.use_epsilon_convergence && previous - wcss <= options.epsilon * previous)
        {
            converged = true;
            break;
        }
    }

    Clustering {
        k: options.k,
        labels,
        centroids,
        wcss,
        wcss_history,
        iterations,
        converged,
        elapsed: start.elapsed(),
    }
}

fn kmeans_plus_plus(points: &[&[f64]], k: usize, rng: &mut Pcg64) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..n)].to_vec());

    let mut nearest = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect::<Vec<_>>();
    while centroids.len() < k {
        let total = nearest.iter().sum::<f64>();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative > target
                })
                .or_else(|| nearest.iter().rposition(|&d| d > 0.0))
                .unwrap_or(0)
        } else {
            // Every point coincides with a chosen centroid.
            rng.random_range(0..n)
        };
        let centroid = points[next].to_vec();
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn random_centroids(points: &[&[f64]], k: usize, rng: &mut Pcg64) -> Vec<Vec<f64>> {
    index::sample(rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].to_vec())
        .collect()
}

fn assign(points: &[&[f64]], centroids: &[Vec<f64>]) -> (Vec<usize>, f64) {
    let mut wcss = 0.0;
    let labels = points
        .iter()
        .map(|p| {
            let (label, distance) = centroids
                .iter()
                .map(|c| squared_distance(p, c))
                .enumerate()
                .fold((0, f64::INFINITY), |best, (i, d)| {
                    if d < best.1 { (i, d) } else { best }
                });
            wcss += distance;
            label
        })
        .collect();
    (labels, wcss)
}

#[expect(clippy::cast_precision_loss)]
fn update_centroids(points: &[&[f64]], labels: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = points[0].len();
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0_usize; centroids.len()];
    for (p, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(p.iter()) {
            *s += v;
        }
    }
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the knee of a WCSS curve indexed by consecutive k.
#[expect(clippy::cast_precision_loss)]
fn elbow_index(wcss: &[f64]) -> usize {
    if wcss.len() < 3 {
        return 0;
    }
    let first = wcss[0];
    let last = wcss[wcss.len() - 1];
    let span = first - last;
    if span <= 0.0 {
        return 0;
    }
    let steps = (wcss.len() - 1) as f64;
    // On the normalized curve the chord runs from (0, 1) to (1, 0), so the
    // distance of (x, y) from it is proportional to 1 - x - y.
    wcss.iter()
        .enumerate()
        .map(|(i, &w)| 1.0 - i as f64 / steps - (w - last) / span)
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| {
            if d > best.1 { (i, d) } else { best }
        })
        .0
}
