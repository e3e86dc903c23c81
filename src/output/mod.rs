use chrono::Utc;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::config::{DosingRegimen, DrugProfile, PatientProfile};
use crate::error::SimResult;
use crate::optimizer::OptimalRegimen;
use crate::simulation::SimulationResult;

pub fn save_results<P: AsRef<Path>>(
    patient: &PatientProfile,
    drug: &DrugProfile,
    regimen: &DosingRegimen,
    optimal: Option<&OptimalRegimen>,
    result: &SimulationResult,
    output_dir: P,
) -> SimResult<()> {
    let output_path = output_dir.as_ref();

    save_time_series(result, &output_path.join("time_series.csv"))?;
    save_report(
        patient,
        drug,
        regimen,
        optimal,
        result,
        &output_path.join("report.json"),
    )?;

    info!("Results saved to {:?}", output_path);
    Ok(())
}

fn save_time_series<P: AsRef<Path>>(result: &SimulationResult, path: P) -> SimResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "TIME_H",
        "CONCENTRATION_MG_L",
        "SENSITIVE_CFU_ML",
        "RESISTANT_CFU_ML",
    ])?;

    for i in 0..result.time_grid.len() {
        writer.write_record(&[
            result.time_grid[i].to_string(),
            result.concentrations[i].to_string(),
            result.sensitive[i].to_string(),
            result.resistant[i].to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    timestamp: String,
    patient: &'a PatientProfile,
    drug: &'a DrugProfile,
    regimen: &'a DosingRegimen,
    #[serde(skip_serializing_if = "Option::is_none")]
    optimizer_score: Option<f64>,
    summary: Summary,
}

#[derive(Serialize)]
struct Summary {
    final_sensitive: f64,
    final_resistant: f64,
    final_total: f64,
    resistance_fraction: Option<f64>,
    treatment_success: bool,
    max_concentration: f64,
    min_positive_concentration: Option<f64>,
    time_above_mic_fraction: f64,
    doses_administered: usize,
}

fn save_report<P: AsRef<Path>>(
    patient: &PatientProfile,
    drug: &DrugProfile,
    regimen: &DosingRegimen,
    optimal: Option<&OptimalRegimen>,
    result: &SimulationResult,
    path: P,
) -> SimResult<()> {
    let report = Report {
        timestamp: Utc::now().to_rfc3339(),
        patient,
        drug,
        regimen,
        optimizer_score: optimal.map(|o| o.score),
        summary: Summary {
            final_sensitive: result.final_sensitive,
            final_resistant: result.final_resistant,
            final_total: result.final_total(),
            resistance_fraction: result.resistance_fraction,
            treatment_success: result.treatment_success,
            max_concentration: result.max_concentration,
            min_positive_concentration: result.min_positive_concentration,
            time_above_mic_fraction: result.time_above_mic_fraction,
            doses_administered: result.doses_administered,
        },
    };

    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &report)?;
    Ok(())
}
