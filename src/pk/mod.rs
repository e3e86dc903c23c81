use crate::config::{DrugProfile, PatientProfile};
use crate::dosing::DoseSchedule;
use crate::error::{SimError, SimResult};

/// Creatinine clearance of a patient with normal renal function (mL/min).
const NORMAL_CREATININE_CLEARANCE: f64 = 120.0;

/// One-compartment model with patient-adjusted elimination.
///
/// Repeated bolus dosing is handled by linear superposition: every
/// administered dose decays independently at first order and the
/// contributions sum.
#[derive(Debug, Clone)]
pub struct PkModel {
    elimination_rate: f64,
    volume_of_distribution: f64,
}

impl PkModel {
    pub fn new(drug: &DrugProfile, patient: &PatientProfile) -> SimResult<Self> {
        drug.validate()?;
        patient.validate()?;

        let base_ke = std::f64::consts::LN_2 / drug.half_life_hours;
        let renal_factor = patient.creatinine_clearance / NORMAL_CREATININE_CLEARANCE;
        let age_factor = if patient.age > 30.0 {
            1.0 - (patient.age - 30.0) * 0.01
        } else {
            1.0
        };

        let elimination_rate =
            base_ke * renal_factor * patient.genetic_markers.cyp_activity * age_factor;
        // A non-positive rate (possible for very old patients) would make the
        // simulation silently wrong, so it is fatal here.
        if elimination_rate <= 0.0 {
            return Err(SimError::DegenerateEliminationRate {
                rate: elimination_rate,
            });
        }

        Ok(Self {
            elimination_rate,
            volume_of_distribution: drug.volume_distribution_per_kg * patient.weight_kg,
        })
    }

    pub fn elimination_rate(&self) -> f64 {
        self.elimination_rate
    }

    pub fn volume_of_distribution(&self) -> f64 {
        self.volume_of_distribution
    }

    /// Plasma concentration at `time`, zero before the first dose.
    pub fn concentration_at(&self, time: f64, schedule: &DoseSchedule) -> f64 {
        let total: f64 = schedule
            .events_before(time)
            .iter()
            .map(|dose| {
                let elapsed = time - dose.time;
                (dose.amount / self.volume_of_distribution)
                    * (-self.elimination_rate * elapsed).exp()
            })
            .sum();
        total.max(0.0)
    }

    pub fn concentration_series(&self, time_grid: &[f64], schedule: &DoseSchedule) -> Vec<f64> {
        time_grid
            .iter()
            .map(|&t| self.concentration_at(t, schedule))
            .collect()
    }
}

/// Precomputed concentration series queryable at arbitrary times.
///
/// Linear interpolation between grid points; constant extrapolation past the
/// last point. Values never go below zero.
#[derive(Debug, Clone)]
pub struct ConcentrationProfile {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl ConcentrationProfile {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> SimResult<Self> {
        if times.len() != values.len() || times.is_empty() {
            return Err(SimError::InvalidParameter(
                "concentration profile needs matching, non-empty time and value series"
                    .to_string(),
            ));
        }
        Ok(Self { times, values })
    }

    pub fn at(&self, time: f64) -> f64 {
        let last = self.times.len() - 1;
        if time <= self.times[0] {
            return self.values[0].max(0.0);
        }
        if time >= self.times[last] {
            return self.values[last].max(0.0);
        }

        let hi = self.times.partition_point(|&t| t <= time);
        let lo = hi - 1;
        let span = self.times[hi] - self.times[lo];
        if span <= 0.0 {
            return self.values[lo].max(0.0);
        }
        let frac = (time - self.times[lo]) / span;
        let value = self.values[lo] + frac * (self.values[hi] - self.values[lo]);
        value.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DosingRegimen, GeneticMarkers};
    use approx::assert_relative_eq;

    fn reference_patient() -> PatientProfile {
        // CrCl 120, cyp 1.0, age 30: all adjustment factors are exactly 1.
        PatientProfile {
            age: 30.0,
            weight_kg: 70.0,
            creatinine_clearance: 120.0,
            infection_severity: 0.5,
            genetic_markers: GeneticMarkers::default(),
            comorbidities: Vec::new(),
        }
    }

    fn reference_drug() -> DrugProfile {
        DrugProfile {
            name: "TestDrug".to_string(),
            mic_sensitive: 0.5,
            mic_resistant: 8.0,
            mpc: 2.0,
            half_life_hours: 4.0,
            volume_distribution_per_kg: 0.5,
            emax: 4.0,
            hill_coefficient: 2.0,
        }
    }

    fn schedule(dose_mg: f64, interval_hours: f64, horizon: f64) -> DoseSchedule {
        let regimen = DosingRegimen {
            dose_mg,
            interval_hours,
        };
        DoseSchedule::from_regimen(&regimen, horizon).unwrap()
    }

    #[test]
    fn single_bolus_decays_at_first_order() {
        let model = PkModel::new(&reference_drug(), &reference_patient()).unwrap();
        let schedule = schedule(500.0, 48.0, 48.0);

        // Vd = 0.5 L/kg * 70 kg = 35 L, ke = ln2 / 4 h.
        assert_relative_eq!(model.volume_of_distribution(), 35.0, epsilon = 1e-12);
        assert_relative_eq!(
            model.elimination_rate(),
            std::f64::consts::LN_2 / 4.0,
            epsilon = 1e-12
        );

        let c0 = model.concentration_at(0.0, &schedule);
        assert_relative_eq!(c0, 500.0 / 35.0, epsilon = 1e-9);

        // One half-life later the concentration has halved.
        let c4 = model.concentration_at(4.0, &schedule);
        assert_relative_eq!(c4, c0 / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn concentration_is_zero_before_first_dose() {
        let model = PkModel::new(&reference_drug(), &reference_patient()).unwrap();
        let delayed = DoseSchedule::from_events(vec![crate::dosing::DoseEvent {
            time: 6.0,
            amount: 500.0,
        }]);

        assert_eq!(model.concentration_at(0.0, &delayed), 0.0);
        assert_eq!(model.concentration_at(5.9, &delayed), 0.0);
        assert!(model.concentration_at(6.0, &delayed) > 0.0);
    }

    #[test]
    fn repeated_doses_superpose() {
        let model = PkModel::new(&reference_drug(), &reference_patient()).unwrap();
        let schedule = schedule(500.0, 12.0, 48.0);

        let ke = model.elimination_rate();
        let vd = model.volume_of_distribution();
        let expected: f64 = [0.0, 12.0]
            .iter()
            .map(|&t0| (500.0 / vd) * (-ke * (12.0 - t0)).exp())
            .sum();
        assert_relative_eq!(model.concentration_at(12.0, &schedule), expected, epsilon = 1e-9);
    }

    #[test]
    fn concentration_decays_monotonically_without_further_doses() {
        let model = PkModel::new(&reference_drug(), &reference_patient()).unwrap();
        let schedule = schedule(500.0, 100.0, 24.0);

        let mut previous = model.concentration_at(0.0, &schedule);
        for i in 1..50 {
            let current = model.concentration_at(i as f64 * 0.5, &schedule);
            assert!(current < previous);
            assert!(current >= 0.0);
            previous = current;
        }
    }

    #[test]
    fn degenerate_elimination_rate_is_fatal() {
        let mut patient = reference_patient();
        patient.age = 135.0; // age factor = 1 - 105 * 0.01 = -0.05
        let err = PkModel::new(&reference_drug(), &patient).unwrap_err();
        assert!(matches!(err, SimError::DegenerateEliminationRate { rate } if rate < 0.0));
    }

    #[test]
    fn profile_interpolates_and_holds_last_value() {
        let profile =
            ConcentrationProfile::new(vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 4.0]).unwrap();

        assert_relative_eq!(profile.at(0.5), 5.0, epsilon = 1e-12);
        assert_relative_eq!(profile.at(1.5), 7.0, epsilon = 1e-12);
        // Constant extrapolation beyond the grid.
        assert_relative_eq!(profile.at(10.0), 4.0, epsilon = 1e-12);
        // Clamped at the left edge.
        assert_relative_eq!(profile.at(-1.0), 0.0, epsilon = 1e-12);
    }
}
