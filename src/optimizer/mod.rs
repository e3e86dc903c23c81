use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{DosingRegimen, DrugProfile, OptimizerSettings, PatientProfile};
use crate::error::{SimError, SimResult};
use crate::simulation::{SimulationResult, Simulator};

/// Best regimen found by the grid search, with its score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimalRegimen {
    pub dose_mg: f64,
    pub interval_hours: f64,
    pub score: f64,
}

/// Outcome of one grid-search candidate. Failed candidates stay in the
/// sequence so callers can see why they were excluded.
#[derive(Debug)]
pub struct CandidateOutcome {
    pub regimen: DosingRegimen,
    pub outcome: SimResult<SimulationResult>,
}

/// Exhaustive search over the fixed dose/interval grid.
///
/// Each candidate is simulated at a shortened horizon and scored; the
/// strictly highest score wins, so the first candidate in iteration order
/// (dose ascending, then interval ascending) wins ties. This is not a
/// continuous optimizer and does not claim global optimality.
pub struct RegimenOptimizer<'a> {
    settings: &'a OptimizerSettings,
    simulator: &'a Simulator,
}

impl<'a> RegimenOptimizer<'a> {
    pub fn new(settings: &'a OptimizerSettings, simulator: &'a Simulator) -> SimResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            simulator,
        })
    }

    pub fn optimize(
        &self,
        patient: &PatientProfile,
        drug: &DrugProfile,
    ) -> SimResult<OptimalRegimen> {
        let outcomes = self.evaluate_candidates(patient, drug);

        let mut best: Option<OptimalRegimen> = None;
        for candidate in &outcomes {
            match &candidate.outcome {
                Ok(result) => {
                    let score = score_candidate(&candidate.regimen, result);
                    debug!(
                        "candidate {} mg q{}h: success={} score={:.3}",
                        candidate.regimen.dose_mg,
                        candidate.regimen.interval_hours,
                        result.treatment_success,
                        score
                    );
                    if best.map_or(true, |b| score > b.score) {
                        best = Some(OptimalRegimen {
                            dose_mg: candidate.regimen.dose_mg,
                            interval_hours: candidate.regimen.interval_hours,
                            score,
                        });
                    }
                }
                Err(err) => {
                    warn!(
                        "candidate {} mg q{}h skipped: {}",
                        candidate.regimen.dose_mg, candidate.regimen.interval_hours, err
                    );
                }
            }
        }

        best.ok_or(SimError::NoViableRegimen)
    }

    /// Run every candidate at the shortened search horizon. Errors are
    /// captured per candidate; they never abort the search.
    pub fn evaluate_candidates(
        &self,
        patient: &PatientProfile,
        drug: &DrugProfile,
    ) -> Vec<CandidateOutcome> {
        let mut outcomes =
            Vec::with_capacity(self.settings.dose_options_mg.len()
                * self.settings.interval_options_hours.len());

        for &dose_mg in &self.settings.dose_options_mg {
            for &interval_hours in &self.settings.interval_options_hours {
                let regimen = DosingRegimen {
                    dose_mg,
                    interval_hours,
                };
                let outcome =
                    self.simulator
                        .run(patient, drug, &regimen, self.settings.search_days);
                outcomes.push(CandidateOutcome { regimen, outcome });
            }
        }

        outcomes
    }
}

/// Treatment success dominates; among equal outcomes the lower dose wins.
fn score_candidate(regimen: &DosingRegimen, result: &SimulationResult) -> f64 {
    let success_term = if result.treatment_success { 1.0 } else { 0.0 };
    success_term - regimen.dose_mg / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneticMarkers, SimulationSettings};
    use approx::assert_relative_eq;

    fn patient() -> PatientProfile {
        PatientProfile {
            age: 65.0,
            weight_kg: 75.0,
            creatinine_clearance: 80.0,
            infection_severity: 0.7,
            genetic_markers: GeneticMarkers::default(),
            comorbidities: Vec::new(),
        }
    }

    fn ciprofloxacin() -> DrugProfile {
        DrugProfile {
            name: "Ciprofloxacin".to_string(),
            mic_sensitive: 0.5,
            mic_resistant: 8.0,
            mpc: 2.0,
            half_life_hours: 4.0,
            volume_distribution_per_kg: 2.5,
            emax: 4.0,
            hill_coefficient: 2.0,
        }
    }

    fn simulator() -> Simulator {
        Simulator::new(&SimulationSettings::default()).unwrap()
    }

    #[test]
    fn optimizer_returns_a_candidate_from_the_grid() {
        let settings = OptimizerSettings::default();
        let simulator = simulator();
        let optimizer = RegimenOptimizer::new(&settings, &simulator).unwrap();

        let best = optimizer.optimize(&patient(), &ciprofloxacin()).unwrap();
        assert!(settings.dose_options_mg.contains(&best.dose_mg));
        assert!(settings.interval_options_hours.contains(&best.interval_hours));
    }

    #[test]
    fn all_failing_candidates_yield_no_viable_regimen() {
        // A zero MIC is rejected at model construction for every candidate.
        let mut drug = ciprofloxacin();
        drug.mic_sensitive = 0.0;

        let settings = OptimizerSettings::default();
        let simulator = simulator();
        let optimizer = RegimenOptimizer::new(&settings, &simulator).unwrap();

        let outcomes = optimizer.evaluate_candidates(&patient(), &drug);
        assert_eq!(outcomes.len(), 16);
        assert!(outcomes.iter().all(|c| c.outcome.is_err()));

        assert!(matches!(
            optimizer.optimize(&patient(), &drug),
            Err(SimError::NoViableRegimen)
        ));
    }

    #[test]
    fn first_candidate_wins_score_ties() {
        // A drug potent against both strains succeeds at every candidate, so
        // intervals tie at equal dose and the first interval must win.
        let mut drug = ciprofloxacin();
        drug.mic_sensitive = 0.01;
        drug.mic_resistant = 0.02;
        drug.emax = 10.0;

        let settings = OptimizerSettings {
            dose_options_mg: vec![500.0],
            interval_options_hours: vec![6.0, 8.0],
            search_days: 3.0,
        };
        let simulator = simulator();
        let optimizer = RegimenOptimizer::new(&settings, &simulator).unwrap();

        let best = optimizer.optimize(&patient(), &drug).unwrap();
        assert_eq!(best.interval_hours, 6.0);
        assert_relative_eq!(best.score, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn without_any_success_the_lowest_dose_scores_best() {
        // An ineffective drug fails everywhere; the score reduces to the
        // dose penalty and the smallest dose wins.
        let mut drug = ciprofloxacin();
        drug.emax = 0.1;

        let settings = OptimizerSettings::default();
        let simulator = simulator();
        let optimizer = RegimenOptimizer::new(&settings, &simulator).unwrap();

        let best = optimizer.optimize(&patient(), &drug).unwrap();
        assert_eq!(best.dose_mg, 250.0);
        assert_eq!(best.interval_hours, 6.0);
        assert_relative_eq!(best.score, -0.25, epsilon = 1e-12);
    }
}
