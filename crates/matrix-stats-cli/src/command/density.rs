use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use matrix_stats::{
    kde::{KdeOptions, Kernel, KernelDensity},
    table::NumericTable as _,
};
use serde::Serialize;
use tracing::info;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct KdeArg {
    /// Path to the table JSON file
    table: PathBuf,
    /// Column to estimate the density of
    #[arg(long)]
    column: String,
    /// Kernel shape (gaussian, epanechnikov, uniform, triangular)
    #[arg(long, default_value = "gaussian")]
    kernel: Kernel,
    /// Fixed bandwidth (default: Silverman's rule)
    #[arg(long)]
    bandwidth: Option<f64>,
    /// Bandwidth multiplier
    #[arg(long, default_value_t = 1.0)]
    adjust: f64,
    /// Number of grid points
    #[arg(short, long = "points", default_value_t = 512)]
    n: usize,
    /// Restrict the grid to the data range
    #[arg(long)]
    trim: bool,
    /// Lower end of the grid
    #[arg(long, allow_negative_numbers = true)]
    from: Option<f64>,
    /// Upper end of the grid
    #[arg(long, allow_negative_numbers = true)]
    to: Option<f64>,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DensityReport<'a> {
    column: &'a str,
    kernel: Kernel,
    bandwidth: f64,
    samples: usize,
    peak: (f64, f64),
    x: &'a [f64],
    density: &'a [f64],
}

pub(crate) fn run(arg: &KdeArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.table)?;
    let values = table.require_column(&arg.column)?;

    let options = KdeOptions {
        kernel: arg.kernel,
        bandwidth: arg.bandwidth,
        adjust: arg.adjust,
        n: arg.n,
        trim: arg.trim,
        from: arg.from,
        to: arg.to,
    };
    let kde = KernelDensity::fit(values, &options)
        .with_context(|| format!("Density estimation failed for column {:?}", arg.column))?;
    info!(
        "Estimated density from {} samples with bandwidth {:.6}",
        kde.samples().len(),
        kde.bandwidth()
    );

    let report = DensityReport {
        column: &arg.column,
        kernel: kde.kernel(),
        bandwidth: kde.bandwidth(),
        samples: kde.samples().len(),
        peak: kde.peak(),
        x: kde.x(),
        density: kde.density(),
    };
    Output::save_json(&report, arg.output.as_deref())
}
