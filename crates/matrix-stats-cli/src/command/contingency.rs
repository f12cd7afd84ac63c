use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use matrix_stats::{
    contingency::Table2x2,
    exact::{self, cochran_armitage_test, cmh_test},
};
use serde::Serialize;
use tracing::info;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct TableArg {
    /// Cells of the 2x2 table in row-major order: a,b,c,d
    #[arg(long, value_delimiter = ',', required = true)]
    table: Vec<i64>,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct TrendArg {
    /// Case counts per ordered category
    #[arg(long, value_delimiter = ',', required = true)]
    cases: Vec<i64>,
    /// Control counts per ordered category
    #[arg(long, value_delimiter = ',', required = true)]
    controls: Vec<i64>,
    /// Category scores (default: 0, 1, ..., k-1)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    scores: Option<Vec<f64>>,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct CmhArg {
    /// Path to a JSON file holding a list of 2x2 strata: [[[a, b], [c, d]], ...]
    strata: PathBuf,
    /// Disable the 0.5 continuity correction
    #[arg(long)]
    no_correction: bool,
    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct TableReport<T> {
    test: &'static str,
    table: Table2x2,
    result: T,
}

pub(crate) fn run_fisher(arg: &TableArg) -> anyhow::Result<()> {
    let table = parse_table(&arg.table)?;
    let result = exact::fisher(&table);
    save_table_report("fisher", table, result, arg)
}

pub(crate) fn run_barnard(arg: &TableArg) -> anyhow::Result<()> {
    let table = parse_table(&arg.table)?;
    let result = exact::barnard(&table).context("Barnard's test failed")?;
    save_table_report("barnard", table, result, arg)
}

pub(crate) fn run_boschloo(arg: &TableArg) -> anyhow::Result<()> {
    let table = parse_table(&arg.table)?;
    let result = exact::boschloo(&table).context("Boschloo's test failed")?;
    save_table_report("boschloo", table, result, arg)
}

pub(crate) fn run_trend(arg: &TrendArg) -> anyhow::Result<()> {
    let result = cochran_armitage_test(&arg.cases, &arg.controls, arg.scores.as_deref())
        .context("Cochran-Armitage test failed")?;
    Output::save_json(&result, arg.output.as_deref())
}

pub(crate) fn run_cmh(arg: &CmhArg) -> anyhow::Result<()> {
    let strata: Vec<[[i64; 2]; 2]> = util::read_json_file("strata", &arg.strata)?;
    info!("Read {} strata from {}", strata.len(), arg.strata.display());
    let result = cmh_test(&strata, !arg.no_correction).context("CMH test failed")?;
    Output::save_json(&result, arg.output.as_deref())
}

fn parse_table(cells: &[i64]) -> anyhow::Result<Table2x2> {
    let &[a, b, c, d] = cells else {
        anyhow::bail!(
            "--table expects exactly 4 comma-separated counts, got {}",
            cells.len()
        );
    };
    Table2x2::new(&[[a, b], [c, d]]).context("Invalid 2x2 table")
}

fn save_table_report<T>(
    test: &'static str,
    table: Table2x2,
    result: T,
    arg: &TableArg,
) -> anyhow::Result<()>
where
    T: Serialize,
{
    let report = TableReport {
        test,
        table,
        result,
    };
    Output::save_json(&report, arg.output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let table = parse_table(&[1, 9, 11, 3]).unwrap();
        assert_eq!(table.cells(), [[1, 9], [11, 3]]);
        assert!(parse_table(&[1, 2, 3]).is_err());
        assert!(parse_table(&[1, 2, 3, -4]).is_err());
    }

    #[test]
    fn test_report_serializes_table_as_nested_array() {
        let report = TableReport {
            test: "fisher",
            table: parse_table(&[3, 1, 1, 3]).unwrap(),
            result: exact::fisher(&parse_table(&[3, 1, 1, 3]).unwrap()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["table"], serde_json::json!([[3, 1], [1, 3]]));
        assert_eq!(json["test"], "fisher");
        assert!(json["result"]["p_value"].as_f64().unwrap() > 0.4);
    }
}
