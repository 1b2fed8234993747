// smoothflow_sim/src/main.rs

use clap::Parser;
use smoothflow_sim::cli::Cli;
use smoothflow_sim::config::ScenarioCatalog;
use smoothflow_sim::error::Result;
use smoothflow_sim::{load_with_overrides, run_scenario};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let paths = match &cli.all {
        Some(dir) => ScenarioCatalog::discover(dir)?
            .iter()
            .map(|(key, path)| {
                info!("Found scenario '{}'", key);
                path.to_path_buf()
            })
            .collect(),
        None => vec![cli.scenario.clone()],
    };

    for path in &paths {
        let config = load_with_overrides(path, cli)?;
        if cli.print_config {
            println!("{}", toml::to_string_pretty(&config)?);
            continue;
        }
        let report = run_scenario(config)?;
        println!("{report}");
    }
    Ok(())
}
