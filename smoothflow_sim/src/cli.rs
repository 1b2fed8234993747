// smoothflow_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Smoothflow: traffic state estimation on synthetic scenarios.
///
/// Generates noisy detector and floating-car data from a scenario's ground
/// truth, filters it and reports the estimation error.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/jam_wave.toml")]
    pub scenario: PathBuf,

    /// Run every scenario found below this directory instead.
    #[arg(long, conflicts_with = "scenario")]
    pub all: Option<PathBuf>,

    /// Use the exact filter, whatever the scenario's output section says.
    #[arg(long, default_value_t = false)]
    pub exact: bool,

    /// Override the kernel weight below which the fast filter skips samples.
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Print the resolved scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from(["smoothflow", "--exact", "--cutoff", "1e-6"]);
        assert!(cli.exact);
        assert_eq!(cli.cutoff, Some(1e-6));
        assert_eq!(cli.scenario, PathBuf::from("assets/scenarios/jam_wave.toml"));
        assert!(cli.all.is_none());
    }

    #[test]
    fn directory_mode_conflicts_with_explicit_file() {
        let parsed = Cli::try_parse_from(["smoothflow", "--all", "dir", "-s", "a.toml"]);
        assert!(parsed.is_err());
        let cli = Cli::parse_from(["smoothflow", "--all", "assets/scenarios"]);
        assert_eq!(cli.all, Some(PathBuf::from("assets/scenarios")));
    }
}
