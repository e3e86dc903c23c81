use clap::Parser;
use log::info;
use std::path::PathBuf;

mod config;
mod dosing;
mod dynamics;
mod error;
mod optimizer;
mod output;
mod pk;
mod simulation;

use crate::config::{Config, DosingRegimen};
use crate::optimizer::RegimenOptimizer;
use crate::simulation::Simulator;

#[derive(Parser)]
#[command(name = "pkpd_simulation")]
#[command(about = "Antibiotic resistance PK/PD simulation with regimen optimization")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Override the treatment horizon in days
    #[arg(short, long)]
    days: Option<f64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = Config::from_file(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let days = cli.days.unwrap_or(config.simulation.days);
    let simulator = Simulator::new(&config.simulation)?;

    // Use the configured regimen when given; otherwise search the grid.
    let (regimen, optimal) = match config.regimen {
        Some(regimen) => {
            info!(
                "Using configured regimen: {} mg q{}h",
                regimen.dose_mg, regimen.interval_hours
            );
            (regimen, None)
        }
        None => {
            let optimizer = RegimenOptimizer::new(&config.optimizer, &simulator)?;
            let best = optimizer.optimize(&config.patient, &config.drug)?;
            info!(
                "Optimizer selected {} mg q{}h (score {:.3})",
                best.dose_mg, best.interval_hours, best.score
            );
            (
                DosingRegimen {
                    dose_mg: best.dose_mg,
                    interval_hours: best.interval_hours,
                },
                Some(best),
            )
        }
    };

    let result = simulator.run(&config.patient, &config.drug, &regimen, days)?;
    info!(
        "Simulation finished: final load {:.3e} CFU/mL, resistance fraction {}, success: {}",
        result.final_total(),
        result
            .resistance_fraction
            .map_or("undefined".to_string(), |f| format!("{:.3}", f)),
        result.treatment_success
    );

    std::fs::create_dir_all(&cli.output)?;
    crate::output::save_results(
        &config.patient,
        &config.drug,
        &regimen,
        optimal.as_ref(),
        &result,
        &cli.output,
    )?;

    Ok(())
}
