/// Sigmoid Emax (Hill) kill rate.
///
/// Monotonically increasing in concentration and saturating at `emax`, with
/// the MIC as the half-maximal point. Zero at or below zero concentration.
pub fn hill_effect(concentration: f64, mic: f64, emax: f64, hill: f64) -> f64 {
    if concentration <= 0.0 {
        return 0.0;
    }
    let conc_pow = concentration.powf(hill);
    emax * conc_pow / (mic.powf(hill) + conc_pow)
}
