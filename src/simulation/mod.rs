use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{
    DosingRegimen, DrugProfile, IntegrationMethod, PatientProfile, SimulationSettings,
};
use crate::dosing::DoseSchedule;
use crate::dynamics::{BacterialDynamics, BacterialParams, PopulationState};
use crate::error::{SimError, SimResult};
use crate::pk::{ConcentrationProfile, PkModel};

/// Total bacterial load below which a course counts as successful (CFU/mL).
const SUCCESS_BACTERIAL_LOAD: f64 = 1e6;
/// Resistance fraction at or above which a course counts as failed.
const SUCCESS_RESISTANCE_FRACTION: f64 = 0.1;

/// One complete treatment course: concentration series, bacterial
/// trajectory, and scalar summaries. Produced fresh per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub time_grid: Vec<f64>,
    pub concentrations: Vec<f64>,
    pub sensitive: Vec<f64>,
    pub resistant: Vec<f64>,
    pub final_sensitive: f64,
    pub final_resistant: f64,
    /// `None` when the final total population is exactly zero.
    pub resistance_fraction: Option<f64>,
    pub treatment_success: bool,
    pub max_concentration: f64,
    /// Smallest strictly positive concentration sample, if any.
    pub min_positive_concentration: Option<f64>,
    /// Fraction of grid time spent above the sensitive-strain MIC.
    pub time_above_mic_fraction: f64,
    pub doses_administered: usize,
}

impl SimulationResult {
    pub fn final_total(&self) -> f64 {
        self.final_sensitive + self.final_resistant
    }
}

/// Runs one patient/drug/regimen course over a uniform time grid.
pub struct Simulator {
    bacterial: BacterialParams,
    method: IntegrationMethod,
    step_hours: f64,
}

impl Simulator {
    pub fn new(settings: &SimulationSettings) -> SimResult<Self> {
        settings.validate()?;
        Ok(Self {
            bacterial: settings.bacterial,
            method: settings.integration_method,
            step_hours: settings.step_hours,
        })
    }

    /// Deterministic: identical inputs always produce identical results.
    pub fn run(
        &self,
        patient: &PatientProfile,
        drug: &DrugProfile,
        regimen: &DosingRegimen,
        days: f64,
    ) -> SimResult<SimulationResult> {
        // Input validation happens before any grid is built.
        regimen.validate()?;
        if days <= 0.0 {
            return Err(SimError::InvalidParameter("days must be positive".to_string()));
        }
        let pk = PkModel::new(drug, patient)?;
        debug!(
            "personalized PK: ke = {:.4} /h, Vd = {:.1} L",
            pk.elimination_rate(),
            pk.volume_of_distribution()
        );

        let horizon_hours = days * 24.0;
        let time_grid = uniform_grid(horizon_hours, self.step_hours);
        let schedule = DoseSchedule::from_regimen(regimen, horizon_hours)?;
        debug!(
            "simulating {} mg q{}h over {} days ({} doses, {} grid points)",
            regimen.dose_mg,
            regimen.interval_hours,
            days,
            schedule.len(),
            time_grid.len()
        );

        let concentrations = pk.concentration_series(&time_grid, &schedule);
        let profile = ConcentrationProfile::new(time_grid.clone(), concentrations.clone())?;
        let dynamics = BacterialDynamics::new(&self.bacterial, drug, &profile);
        let trajectory = dynamics.integrate(&time_grid, self.method)?;

        Ok(summarize(
            time_grid,
            concentrations,
            &trajectory,
            drug.mic_sensitive,
            schedule.len(),
        ))
    }
}

fn uniform_grid(horizon_hours: f64, step_hours: f64) -> Vec<f64> {
    let steps = (horizon_hours / step_hours).round() as usize;
    (0..=steps).map(|i| i as f64 * step_hours).collect()
}

fn summarize(
    time_grid: Vec<f64>,
    concentrations: Vec<f64>,
    trajectory: &[PopulationState],
    mic_sensitive: f64,
    doses_administered: usize,
) -> SimulationResult {
    let sensitive: Vec<f64> = trajectory.iter().map(|s| s.sensitive).collect();
    let resistant: Vec<f64> = trajectory.iter().map(|s| s.resistant).collect();

    let final_sensitive = *sensitive.last().unwrap_or(&0.0);
    let final_resistant = *resistant.last().unwrap_or(&0.0);
    let final_total = final_sensitive + final_resistant;

    let resistance_fraction = if final_total > 0.0 {
        Some(final_resistant / final_total)
    } else {
        None
    };
    // A fully eradicated population trivially satisfies the resistance
    // criterion.
    let treatment_success = final_total < SUCCESS_BACTERIAL_LOAD
        && resistance_fraction.map_or(true, |f| f < SUCCESS_RESISTANCE_FRACTION);

    let max_concentration = concentrations.iter().copied().fold(0.0, f64::max);
    let min_positive_concentration = concentrations
        .iter()
        .copied()
        .filter(|&c| c > 0.0)
        .fold(None, |acc: Option<f64>, c| {
            Some(acc.map_or(c, |m| m.min(c)))
        });
    let above_mic = concentrations.iter().filter(|&&c| c > mic_sensitive).count();
    let time_above_mic_fraction = if concentrations.is_empty() {
        0.0
    } else {
        above_mic as f64 / concentrations.len() as f64
    };

    SimulationResult {
        time_grid,
        concentrations,
        sensitive,
        resistant,
        final_sensitive,
        final_resistant,
        resistance_fraction,
        treatment_success,
        max_concentration,
        min_positive_concentration,
        time_above_mic_fraction,
        doses_administered,
    }
}
