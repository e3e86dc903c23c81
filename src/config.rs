use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dynamics::BacterialParams;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub patient: PatientProfile,
    pub drug: DrugProfile,
    /// Explicit regimen. When absent the optimizer selects one.
    pub regimen: Option<DosingRegimen>,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: f64,
    pub weight_kg: f64,
    /// Creatinine clearance in mL/min (normal reference 120).
    pub creatinine_clearance: f64,
    /// Infection severity on a 0-1 scale.
    pub infection_severity: f64,
    #[serde(default)]
    pub genetic_markers: GeneticMarkers,
    /// Informational only, not consumed by any model formula.
    #[serde(default)]
    pub comorbidities: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeneticMarkers {
    #[serde(default = "default_activity")]
    pub cyp_activity: f64,
    #[serde(default = "default_activity")]
    pub mdr1_activity: f64,
}

fn default_activity() -> f64 {
    1.0
}

impl Default for GeneticMarkers {
    fn default() -> Self {
        Self {
            cyp_activity: 1.0,
            mdr1_activity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugProfile {
    pub name: String,
    /// MIC for the sensitive strain (mg/L).
    pub mic_sensitive: f64,
    /// MIC for the resistant strain (mg/L).
    pub mic_resistant: f64,
    /// Mutant prevention concentration (mg/L), carried for reporting.
    pub mpc: f64,
    pub half_life_hours: f64,
    /// Volume of distribution per kg body weight (L/kg).
    pub volume_distribution_per_kg: f64,
    /// Maximal kill rate of the Hill dose-response curve (/h).
    pub emax: f64,
    pub hill_coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DosingRegimen {
    pub dose_mg: f64,
    pub interval_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Treatment horizon in days.
    #[serde(default = "default_days")]
    pub days: f64,
    /// Uniform time grid resolution in hours.
    #[serde(default = "default_step_hours")]
    pub step_hours: f64,
    #[serde(default)]
    pub integration_method: IntegrationMethod,
    #[serde(default)]
    pub bacterial: BacterialParams,
}

fn default_days() -> f64 {
    7.0
}

fn default_step_hours() -> f64 {
    0.25
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            days: default_days(),
            step_hours: default_step_hours(),
            integration_method: IntegrationMethod::default(),
            bacterial: BacterialParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    #[default]
    Rk4,
    Euler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default = "default_dose_options")]
    pub dose_options_mg: Vec<f64>,
    #[serde(default = "default_interval_options")]
    pub interval_options_hours: Vec<f64>,
    /// Shortened horizon used to score each candidate.
    #[serde(default = "default_search_days")]
    pub search_days: f64,
}

fn default_dose_options() -> Vec<f64> {
    vec![250.0, 500.0, 750.0, 1000.0]
}

fn default_interval_options() -> Vec<f64> {
    vec![6.0, 8.0, 12.0, 24.0]
}

fn default_search_days() -> f64 {
    3.0
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            dose_options_mg: default_dose_options(),
            interval_options_hours: default_interval_options(),
            search_days: default_search_days(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.patient.validate()?;
        self.drug.validate()?;
        if let Some(regimen) = &self.regimen {
            regimen.validate()?;
        }
        self.simulation.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}

impl PatientProfile {
    pub fn validate(&self) -> SimResult<()> {
        if self.age < 0.0 {
            return Err(SimError::InvalidParameter("age must be non-negative".to_string()));
        }
        if self.weight_kg <= 0.0 {
            return Err(SimError::InvalidParameter("weight_kg must be positive".to_string()));
        }
        if self.creatinine_clearance <= 0.0 {
            return Err(SimError::InvalidParameter(
                "creatinine_clearance must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.infection_severity) {
            return Err(SimError::InvalidParameter(
                "infection_severity must lie in [0, 1]".to_string(),
            ));
        }
        if self.genetic_markers.cyp_activity <= 0.0 || self.genetic_markers.mdr1_activity <= 0.0 {
            return Err(SimError::InvalidParameter(
                "genetic marker activities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl DrugProfile {
    pub fn validate(&self) -> SimResult<()> {
        let fields = [
            ("mic_sensitive", self.mic_sensitive),
            ("mic_resistant", self.mic_resistant),
            ("mpc", self.mpc),
            ("half_life_hours", self.half_life_hours),
            ("volume_distribution_per_kg", self.volume_distribution_per_kg),
            ("emax", self.emax),
            ("hill_coefficient", self.hill_coefficient),
        ];
        for (name, value) in fields {
            if value <= 0.0 {
                return Err(SimError::InvalidParameter(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

impl DosingRegimen {
    pub fn validate(&self) -> SimResult<()> {
        if self.dose_mg <= 0.0 {
            return Err(SimError::InvalidParameter("dose_mg must be positive".to_string()));
        }
        if self.interval_hours <= 0.0 {
            return Err(SimError::InvalidParameter(
                "interval_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.days <= 0.0 {
            return Err(SimError::InvalidParameter("days must be positive".to_string()));
        }
        if self.step_hours <= 0.0 {
            return Err(SimError::InvalidParameter("step_hours must be positive".to_string()));
        }
        self.bacterial.validate()
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.dose_options_mg.is_empty() || self.interval_options_hours.is_empty() {
            return Err(SimError::InvalidParameter(
                "optimizer candidate sets must not be empty".to_string(),
            ));
        }
        if self.dose_options_mg.iter().any(|&d| d <= 0.0)
            || self.interval_options_hours.iter().any(|&i| i <= 0.0)
        {
            return Err(SimError::InvalidParameter(
                "optimizer candidates must be positive".to_string(),
            ));
        }
        if self.search_days <= 0.0 {
            return Err(SimError::InvalidParameter("search_days must be positive".to_string()));
        }
        Ok(())
    }
}
