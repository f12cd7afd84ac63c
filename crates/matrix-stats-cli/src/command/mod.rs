use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
    chow::ChowArg,
    cluster::KMeansArg,
    contingency::{CmhArg, TableArg, TrendArg},
    correlation::CorrelationArg,
    density::KdeArg,
    normalize::NormalizeArg,
};

mod chow;
mod cluster;
mod contingency;
mod correlation;
mod density;
mod normalize;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace); overrides RUST_LOG
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Fisher's exact test on a 2x2 table
    Fisher(#[clap(flatten)] TableArg),
    /// Barnard's unconditional exact test on a 2x2 table
    Barnard(#[clap(flatten)] TableArg),
    /// Boschloo's unconditional exact test on a 2x2 table
    Boschloo(#[clap(flatten)] TableArg),
    /// Cochran-Armitage test for trend across ordered categories
    Trend(#[clap(flatten)] TrendArg),
    /// Cochran-Mantel-Haenszel test across stratified 2x2 tables
    Cmh(#[clap(flatten)] CmhArg),
    /// K-Means clustering of table rows
    Kmeans(#[clap(flatten)] KMeansArg),
    /// Kernel density estimate of a table column
    Kde(#[clap(flatten)] KdeArg),
    /// Correlation between two table columns
    Correlation(#[clap(flatten)] CorrelationArg),
    /// Scale a table column
    Normalize(#[clap(flatten)] NormalizeArg),
    /// Chow structural-break test for y = a + b*x
    Chow(#[clap(flatten)] ChowArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.verbose);

    match args.mode {
        Mode::Fisher(arg) => contingency::run_fisher(&arg)?,
        Mode::Barnard(arg) => contingency::run_barnard(&arg)?,
        Mode::Boschloo(arg) => contingency::run_boschloo(&arg)?,
        Mode::Trend(arg) => contingency::run_trend(&arg)?,
        Mode::Cmh(arg) => contingency::run_cmh(&arg)?,
        Mode::Kmeans(arg) => cluster::run(&arg)?,
        Mode::Kde(arg) => density::run(&arg)?,
        Mode::Correlation(arg) => correlation::run(&arg)?,
        Mode::Normalize(arg) => normalize::run(&arg)?,
        Mode::Chow(arg) => chow::run(&arg)?,
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_table_test() {
        let args =
            CommandArgs::try_parse_from(["matrix-stats", "fisher", "--table", "1,9,11,3"]).unwrap();
        assert!(matches!(args.mode, Mode::Fisher(_)));
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_parse_kmeans_requires_k_or_auto() {
        let base = ["matrix-stats", "kmeans", "points.json", "--columns", "x,y"];
        assert!(CommandArgs::try_parse_from(base).is_err());
        assert!(CommandArgs::try_parse_from(base.iter().chain(&["-k", "3"])).is_ok());
        assert!(CommandArgs::try_parse_from(base.iter().chain(&["--auto"])).is_ok());
        assert!(CommandArgs::try_parse_from(base.iter().chain(&["--auto", "-k", "3"])).is_err());
    }

    #[test]
    fn test_parse_correlation_pair_or_matrix() {
        let base = ["matrix-stats", "correlation", "data.json"];
        assert!(CommandArgs::try_parse_from(base).is_err());
        assert!(CommandArgs::try_parse_from(base.iter().chain(&["--x", "a"])).is_err());
        let pair = ["--x", "a", "--y", "b", "--method", "kendall"];
        assert!(CommandArgs::try_parse_from(base.iter().chain(&pair)).is_ok());
        assert!(CommandArgs::try_parse_from(base.iter().chain(&["--columns", "a,b,c"])).is_ok());
        let both = ["--columns", "a,b", "--x", "a"];
        assert!(CommandArgs::try_parse_from(base.iter().chain(&both)).is_err());
    }

    #[test]
    fn test_parse_kde_kernel() {
        let args = CommandArgs::try_parse_from([
            "matrix-stats",
            "-vv",
            "kde",
            "data.json",
            "--column",
            "x",
            "--kernel",
            "epanechnikov",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.mode, Mode::Kde(_)));
    }
}
