use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use matrix_stats::{
    kmeans::{ElbowOptions, KMeans, KMeansOptions},
    table::NumericTable as _,
};
use tracing::info;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct KMeansArg {
    /// Path to the table JSON file
    table: PathBuf,
    /// Columns forming the point coordinates (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,
    /// Number of clusters
    #[arg(short, required_unless_present = "auto", conflicts_with = "auto")]
    k: Option<usize>,
    /// Choose the number of clusters with the elbow method
    #[arg(long)]
    auto: bool,
    /// Smallest k tried with --auto
    #[arg(long, default_value_t = 1, requires = "auto")]
    k_min: usize,
    /// Largest k tried with --auto
    #[arg(long, default_value_t = 10, requires = "auto")]
    k_max: usize,
    /// Iteration cap per fit
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,
    /// Relative WCSS improvement at which iteration stops (0 disables)
    #[arg(long, default_value_t = 1e-4)]
    epsilon: f64,
    /// Seed with random points instead of K-Means++
    #[arg(long)]
    random_init: bool,
    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl KMeansArg {
    fn options(&self, k: usize) -> KMeansOptions {
        let mut options = KMeansOptions::new(k)
            .max_iterations(self.max_iterations)
            .use_kmeans_plus_plus(!self.random_init)
            .use_epsilon_convergence(self.epsilon > 0.0)
            .epsilon(self.epsilon);
        options.seed = self.seed;
        options
    }
}

pub(crate) fn run(arg: &KMeansArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.table)?;
    let columns = arg.columns.iter().map(String::as_str).collect::<Vec<_>>();
    let points = table.points(&columns)?;

    if let Some(k) = arg.k {
        let clustering = KMeans::fit(&points, &arg.options(k)).context("K-Means failed")?;
        info!(
            "Fitted {k} clusters in {} iterations ({:.3?})",
            clustering.iterations, clustering.elapsed
        );
        Output::save_json(&clustering, arg.output.as_deref())
    } else {
        let options = ElbowOptions {
            k_min: arg.k_min,
            k_max: arg.k_max,
            base: arg.options(arg.k_min),
        };
        let auto = KMeans::fit_auto(&points, &options).context("K-Means elbow search failed")?;
        info!("Elbow method chose k = {}", auto.k);
        Output::save_json(&auto, arg.output.as_deref())
    }
}
