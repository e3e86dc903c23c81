pub mod effect;

pub use effect::hill_effect;

use serde::{Deserialize, Serialize};

use crate::config::{DrugProfile, IntegrationMethod};
use crate::error::{SimError, SimResult};
use crate::pk::ConcentrationProfile;

/// Growth, mutation, and population constants of the bacterial model.
///
/// Passed explicitly into the integrator so tests can vary them; the
/// defaults are the literature-derived values used throughout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BacterialParams {
    /// Sensitive-strain growth rate (/h), one doubling per hour.
    pub growth_rate_sensitive: f64,
    /// Resistant-strain growth rate (/h), lower due to the fitness cost of
    /// resistance.
    pub growth_rate_resistant: f64,
    /// One-way sensitive-to-resistant mutation flux (/h).
    pub mutation_rate: f64,
    /// Logistic ceiling on the total population (CFU/mL).
    pub carrying_capacity: f64,
    pub initial_sensitive: f64,
    pub initial_resistant: f64,
}

impl Default for BacterialParams {
    fn default() -> Self {
        Self {
            growth_rate_sensitive: 0.693,
            growth_rate_resistant: 0.623,
            mutation_rate: 1e-8,
            carrying_capacity: 1e12,
            initial_sensitive: 1e8,
            initial_resistant: 1e4,
        }
    }
}

impl BacterialParams {
    pub fn validate(&self) -> SimResult<()> {
        let fields = [
            ("growth_rate_sensitive", self.growth_rate_sensitive),
            ("growth_rate_resistant", self.growth_rate_resistant),
            ("carrying_capacity", self.carrying_capacity),
        ];
        for (name, value) in fields {
            if value <= 0.0 {
                return Err(SimError::InvalidParameter(format!("{} must be positive", name)));
            }
        }
        if self.mutation_rate < 0.0 {
            return Err(SimError::InvalidParameter(
                "mutation_rate must be non-negative".to_string(),
            ));
        }
        if self.initial_sensitive < 0.0 || self.initial_resistant < 0.0 {
            return Err(SimError::InvalidParameter(
                "initial populations must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationState {
    pub sensitive: f64,
    pub resistant: f64,
}

impl PopulationState {
    pub fn total(&self) -> f64 {
        self.sensitive + self.resistant
    }
}

/// Coupled sensitive/resistant population system driven by a precomputed
/// concentration profile.
pub struct BacterialDynamics<'a> {
    params: &'a BacterialParams,
    drug: &'a DrugProfile,
    concentration: &'a ConcentrationProfile,
}

impl<'a> BacterialDynamics<'a> {
    pub fn new(
        params: &'a BacterialParams,
        drug: &'a DrugProfile,
        concentration: &'a ConcentrationProfile,
    ) -> Self {
        Self {
            params,
            drug,
            concentration,
        }
    }

    fn derivatives(&self, time: f64, sensitive: f64, resistant: f64) -> (f64, f64) {
        let c = self.concentration.at(time);
        let kill_sensitive = hill_effect(
            c,
            self.drug.mic_sensitive,
            self.drug.emax,
            self.drug.hill_coefficient,
        );
        let kill_resistant = hill_effect(
            c,
            self.drug.mic_resistant,
            self.drug.emax,
            self.drug.hill_coefficient,
        );

        let growth_factor = 1.0 - (sensitive + resistant) / self.params.carrying_capacity;
        let mutation_flux = self.params.mutation_rate * sensitive;

        let d_sensitive = (self.params.growth_rate_sensitive * growth_factor - kill_sensitive)
            * sensitive
            - mutation_flux;
        let d_resistant = (self.params.growth_rate_resistant * growth_factor - kill_resistant)
            * resistant
            + mutation_flux;

        (d_sensitive, d_resistant)
    }

    fn step(
        &self,
        time: f64,
        dt: f64,
        state: PopulationState,
        method: IntegrationMethod,
    ) -> (f64, f64) {
        match method {
            IntegrationMethod::Euler => self.derivatives(time, state.sensitive, state.resistant),
            IntegrationMethod::Rk4 => {
                let (s, r) = (state.sensitive, state.resistant);
                let (k1s, k1r) = self.derivatives(time, s, r);
                let half = dt / 2.0;
                let (k2s, k2r) =
                    self.derivatives(time + half, s + half * k1s, r + half * k1r);
                let (k3s, k3r) =
                    self.derivatives(time + half, s + half * k2s, r + half * k2r);
                let (k4s, k4r) = self.derivatives(time + dt, s + dt * k3s, r + dt * k3r);
                (
                    (k1s + 2.0 * k2s + 2.0 * k3s + k4s) / 6.0,
                    (k1r + 2.0 * k2r + 2.0 * k3r + k4r) / 6.0,
                )
            }
        }
    }

    /// Advance the population across the full time grid.
    ///
    /// Populations are clamped at zero from below. A non-finite derivative
    /// or state aborts the integration with the time it was detected at.
    pub fn integrate(
        &self,
        time_grid: &[f64],
        method: IntegrationMethod,
    ) -> SimResult<Vec<PopulationState>> {
        let mut state = PopulationState {
            sensitive: self.params.initial_sensitive,
            resistant: self.params.initial_resistant,
        };
        let mut trajectory = Vec::with_capacity(time_grid.len());
        trajectory.push(state);

        for window in time_grid.windows(2) {
            let (time, next_time) = (window[0], window[1]);
            let dt = next_time - time;

            let (d_sensitive, d_resistant) = self.step(time, dt, state, method);
            if !d_sensitive.is_finite() || !d_resistant.is_finite() {
                return Err(SimError::NumericDivergence { time });
            }

            state = PopulationState {
                sensitive: (state.sensitive + d_sensitive * dt).max(0.0),
                resistant: (state.resistant + d_resistant * dt).max(0.0),
            };
            if !state.sensitive.is_finite() || !state.resistant.is_finite() {
                return Err(SimError::NumericDivergence { time: next_time });
            }
            trajectory.push(state);
        }

        Ok(trajectory)
    }
}
