use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use matrix_stats::{chow::chow_test, table::NumericTable as _};

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct ChowArg {
    /// Path to the table JSON file
    table: PathBuf,
    /// Regressor column
    #[arg(long)]
    x: String,
    /// Response column
    #[arg(long)]
    y: String,
    /// Row index of the first observation after the break
    #[arg(long)]
    break_index: usize,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ChowArg) -> anyhow::Result<()> {
    let table = util::read_table_file(&arg.table)?;
    let x = table.require_column(&arg.x)?;
    let y = table.require_column(&arg.y)?;
    let result = chow_test(x, y, arg.break_index)
        .with_context(|| format!("Chow test at row {} failed", arg.break_index))?;
    Output::save_json(&result, arg.output.as_deref())
}
