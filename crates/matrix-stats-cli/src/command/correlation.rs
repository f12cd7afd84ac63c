use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use matrix_stats::{
    correlation::{Method, correlation_matrix},
    table::NumericTable as _,
};
use serde::Serialize;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct CorrelationArg {
    /// Path to the table JSON file
    table: PathBuf,
    /// First column
    #[arg(long, requires = "y", required_unless_present = "columns")]
    x: Option<String>,
    /// Second column
    #[arg(long, requires = "x")]
    y: Option<String>,
    /// Compute the full matrix over these columns instead (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["x", "y"])]
    columns: Option<Vec<String>>,
    /// Correlation measure (pearson, spearman, kendall)
    #[arg(long, default_value = "pearson")]
    method: Method,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PairReport<'a> {
    method: Method,
    x: &'a str,
    y: &'a str,
    n: usize,
    coefficient: f64,
}

#[derive(Debug, Serialize)]
struct MatrixReport<'a> {
    method: Method,
    columns: &'a [String],
    matrix: Vec<Vec<f64>>,
}

pub(crate) fn run(arg: &CorrelationArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.table)?;

    if let Some(names) = &arg.columns {
        let columns = names
            .iter()
            .map(|name| table.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = correlation_matrix(&columns, arg.method)
            .with_context(|| format!("{} correlation matrix failed", arg.method))?;
        let report = MatrixReport {
            method: arg.method,
            columns: names,
            matrix,
        };
        return Output::save_json(&report, arg.output.as_deref());
    }

    let (Some(x_name), Some(y_name)) = (&arg.x, &arg.y) else {
        anyhow::bail!("either --x and --y or --columns must be given");
    };
    let x = table.require_column(x_name)?;
    let y = table.require_column(y_name)?;
    let coefficient = arg
        .method
        .correlate(x, y)
        .with_context(|| {
            format!(
                "{} correlation of {x_name:?} and {y_name:?} failed",
                arg.method
            )
        })?;
    let report = PairReport {
        method: arg.method,
        x: x_name,
        y: y_name,
        n: x.len(),
        coefficient,
    };
    Output::save_json(&report, arg.output.as_deref())
}
