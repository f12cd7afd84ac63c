use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use matrix_stats::{normalize, table::NumericTable as _};
use serde::Serialize;

use crate::util::{self, Output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Scaling {
    /// Natural logarithm
    #[display("log")]
    Log,
    /// (x - min) / (max - min)
    #[display("min-max")]
    MinMax,
    /// (x - mean) / (max - min)
    #[display("mean")]
    Mean,
    /// (x - mean) / sd
    #[display("standardize")]
    Standardize,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct NormalizeArg {
    /// Path to the table JSON file
    table: PathBuf,
    /// Column to scale
    #[arg(long)]
    column: String,
    /// Scaling method
    #[arg(long, value_enum, default_value_t = Scaling::Standardize)]
    method: Scaling,
    /// Round results to this many decimals, ties to even
    #[arg(long)]
    decimals: Option<i32>,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct NormalizeReport<'a> {
    column: &'a str,
    method: Scaling,
    values: Vec<f64>,
}

pub(crate) fn run(arg: &NormalizeArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.table)?;
    let column = table.require_column(&arg.column)?;
    let mut values = scale(arg.method, column)
        .with_context(|| format!("{} scaling of column {:?} failed", arg.method, arg.column))?;
    if let Some(decimals) = arg.decimals {
        for value in &mut values {
            *value = normalize::round_half_even(*value, decimals);
        }
    }

    let report = NormalizeReport {
        column: &arg.column,
        method: arg.method,
        values,
    };
    Output::save_json(&report, arg.output.as_deref())
}

fn scale(method: Scaling, values: &[f64]) -> matrix_stats::Result<Vec<f64>> {
    match method {
        Scaling::Log => normalize::log_normalize(values),
        Scaling::MinMax => normalize::min_max(values),
        Scaling::Mean => normalize::mean_normalize(values),
        Scaling::Standardize => normalize::standardize(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_dispatch() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(scale(Scaling::MinMax, &values).unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scale(Scaling::Standardize, &values).unwrap(), vec![-1.0, 0.0, 1.0]);
        assert!(scale(Scaling::Log, &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Scaling::from_str("min-max", false), Ok(Scaling::MinMax));
        assert_eq!(Scaling::MinMax.to_string(), "min-max");
    }
}
