//! Statistical algorithms for tabular numeric data.
//!
//! This crate provides:
//!
//! - **Contingency-table tests**: Fisher's exact test, Barnard's and
//!   Boschloo's unconditional tests, the Cochran-Armitage trend test and the
//!   Cochran-Mantel-Haenszel test for stratified tables
//! - **Clustering**: K-Means with K-Means++ seeding and elbow-based choice of k
//! - **Density estimation**: kernel density estimates with Silverman bandwidths
//! - **Correlation**: Pearson, Spearman and Kendall's tau-b
//! - **Scaling and regression checks**: column normalization and the Chow
//!   structural-break test
//!
//! Every engine is a synchronous, pure computation over caller-owned data.
//! Invalid input is reported through [`Error`]; no engine panics on bad data.
//!
//! # Modules
//!
//! - [`combinatorics`]: log-space binomial and hypergeometric probabilities
//! - [`contingency`]: validated 2×2 tables
//! - [`exact`]: hypothesis tests on contingency tables
//! - [`kmeans`]: K-Means clustering
//! - [`kde`]: kernel density estimation
//! - [`correlation`]: correlation coefficients
//! - [`normalize`]: log, min-max, mean and z-score scaling
//! - [`chow`]: Chow test for `y = a + b·x`
//! - [`descriptive`], [`quantile`]: summary statistics
//! - [`distribution`]: tail probabilities of the reference distributions
//! - [`table`]: named numeric columns
//!
//! # Examples
//!
//! ## Testing a 2×2 table
//!
//! ```
//! use matrix_stats::exact::{barnard_test, fisher_test};
//!
//! let table = [[12, 8], [6, 14]];
//! let fisher = fisher_test(&table).unwrap();
//! let barnard = barnard_test(&table).unwrap();
//! assert!(fisher.p_value > 0.05);
//! assert!(barnard.p_value > 0.05);
//! ```
//!
//! ## Estimating a density
//!
//! ```
//! use matrix_stats::kde::{KdeOptions, KernelDensity};
//!
//! let kde = KernelDensity::fit(&[1.2, 2.3, 1.8, 2.1, 3.5, 2.9], &KdeOptions::default()).unwrap();
//! assert!(kde.density_at(2.0) > kde.density_at(5.0));
//! ```
//!
//! ## Correlating two columns
//!
//! ```
//! use matrix_stats::correlation::{kendall, pearson, spearman};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.0, 4.0, 5.0, 4.0, 6.0];
//! assert!(pearson(&x, &y).unwrap() > 0.8);
//! assert!(spearman(&x, &y).unwrap() > 0.8);
//! assert!(kendall(&x, &y).unwrap() > 0.6);
//! ```

pub use self::error::{Error, Result};

pub mod chow;
pub mod combinatorics;
pub mod contingency;
pub mod correlation;
pub mod descriptive;
pub mod distribution;
pub mod error;
pub mod exact;
pub mod kde;
pub mod kmeans;
pub mod normalize;
pub mod quantile;
pub mod table;
