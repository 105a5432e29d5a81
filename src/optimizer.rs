//! The optimizer contract: a narrow `Minimizer` strategy trait, plus one
//! concrete derivative-free implementation over the bounded parameter box.

use std::cell::RefCell;

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::particleswarm::ParticleSwarm;

use crate::error::{Error, Result};
use crate::tracker::{
    TrackerSettings, COVARIANCE_RANGE, DISTANCE_THRESHOLD_RANGE, MAX_AGE_RANGE,
    MAX_CONSECUTIVE_MISSES_RANGE, MEASUREMENT_NOISE_RANGE, MIN_HITS_RANGE, PROCESS_NOISE_RANGE,
};

/// Number of scalar dimensions in the search: the same seven fields that
/// make up `TrackerSettings`, in this fixed order.
const DIMS: usize = 7;

/// The bounded box a `Minimizer` is allowed to search. Field order matches
/// `TrackerSettings`: measurement_noise, process_noise, covariance,
/// distance_threshold, max_age, min_hits, max_consecutive_misses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterBox {
    pub lower: [f64; DIMS],
    pub upper: [f64; DIMS],
}

impl Default for ParameterBox {
    /// The bounded box from the optimizer contract (spec §4.E).
    fn default() -> Self {
        let ranges = [
            MEASUREMENT_NOISE_RANGE,
            PROCESS_NOISE_RANGE,
            COVARIANCE_RANGE,
            DISTANCE_THRESHOLD_RANGE,
            (MAX_AGE_RANGE.0 as f64, MAX_AGE_RANGE.1 as f64),
            (MIN_HITS_RANGE.0 as f64, MIN_HITS_RANGE.1 as f64),
            (MAX_CONSECUTIVE_MISSES_RANGE.0 as f64, MAX_CONSECUTIVE_MISSES_RANGE.1 as f64),
        ];
        let mut lower = [0.0; DIMS];
        let mut upper = [0.0; DIMS];
        for (i, (lo, hi)) in ranges.into_iter().enumerate() {
            lower[i] = lo;
            upper[i] = hi;
        }
        Self { lower, upper }
    }
}

/// Convert a raw search vector into validated `TrackerSettings`, nudging
/// values a hair inside an open bound so a particle that lands exactly on
/// the box edge doesn't trip `TrackerSettings::new`'s strict range check.
fn vector_to_settings(v: &[f64]) -> Result<TrackerSettings> {
    if v.len() != DIMS {
        return Err(Error::malformed(format!("expected a {DIMS}-dimensional parameter vector, got {}", v.len())));
    }
    let nudge = |value: f64, (lo, hi): (f64, f64)| -> f64 {
        let eps = (hi - lo) * 1e-9;
        value.clamp(lo + eps, hi - eps)
    };

    TrackerSettings::new(
        nudge(v[0], MEASUREMENT_NOISE_RANGE),
        nudge(v[1], PROCESS_NOISE_RANGE),
        nudge(v[2], COVARIANCE_RANGE),
        nudge(v[3], DISTANCE_THRESHOLD_RANGE),
        v[4].round().clamp(MAX_AGE_RANGE.0 as f64, MAX_AGE_RANGE.1 as f64) as u32,
        v[5].round().clamp(MIN_HITS_RANGE.0 as f64, MIN_HITS_RANGE.1 as f64) as u32,
        v[6].round().clamp(MAX_CONSECUTIVE_MISSES_RANGE.0 as f64, MAX_CONSECUTIVE_MISSES_RANGE.1 as f64) as u32,
    )
}

/// The contract any derivative-free optimizer must satisfy: given a bounded
/// box and an objective, run `trials` evaluations and return the best
/// `TrackerSettings` found along with its loss.
pub trait Minimizer {
    fn minimize(
        &mut self,
        box_: &ParameterBox,
        objective: &mut dyn FnMut(&TrackerSettings) -> f64,
        trials: usize,
    ) -> Result<(TrackerSettings, f64)>;
}

struct ProblemAdapter<'a> {
    objective: RefCell<&'a mut dyn FnMut(&TrackerSettings) -> f64>,
}

impl<'a> CostFunction for ProblemAdapter<'a> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        let settings = vector_to_settings(param).map_err(|e| argmin::core::Error::msg(e.to_string()))?;
        Ok((self.objective.borrow_mut())(&settings))
    }
}

/// Derivative-free minimizer backed by `argmin`'s particle swarm solver —
/// the closest real ecosystem equivalent to a black-box sampler for a
/// bounded, non-differentiable objective like this one.
pub struct ParticleSwarmMinimizer {
    pub num_particles: usize,
}

impl Default for ParticleSwarmMinimizer {
    fn default() -> Self {
        Self { num_particles: 40 }
    }
}

impl Minimizer for ParticleSwarmMinimizer {
    fn minimize(
        &mut self,
        box_: &ParameterBox,
        objective: &mut dyn FnMut(&TrackerSettings) -> f64,
        trials: usize,
    ) -> Result<(TrackerSettings, f64)> {
        let problem = ProblemAdapter { objective: RefCell::new(objective) };
        let solver = ParticleSwarm::new((box_.lower.to_vec(), box_.upper.to_vec()), self.num_particles);

        let max_iters = (trials / self.num_particles.max(1)).max(1) as u64;

        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iters))
            .run()
            .map_err(|e| Error::malformed(format!("particle swarm run failed: {e}")))?;

        let best_param = result
            .state()
            .get_best_param()
            .ok_or_else(|| Error::malformed("particle swarm produced no best parameter"))?
            .position
            .clone();
        let best_cost = result.state().get_best_cost();

        let settings = vector_to_settings(&best_param)?;
        Ok((settings, best_cost))
    }
}

/// Runs a `Minimizer` to completion and hands back the winning settings.
pub struct OptimizerDriver<M: Minimizer> {
    minimizer: M,
    box_: ParameterBox,
}

impl<M: Minimizer> OptimizerDriver<M> {
    pub fn new(minimizer: M, box_: ParameterBox) -> Self {
        Self { minimizer, box_ }
    }

    /// After `trials` evaluations, returns the parameter vector achieving
    /// minimum mean loss and that loss.
    pub fn run(
        &mut self,
        trials: usize,
        mut objective: impl FnMut(&TrackerSettings) -> f64,
    ) -> Result<(TrackerSettings, f64)> {
        self.minimizer.minimize(&self.box_, &mut objective, trials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_to_settings_rejects_wrong_dimension() {
        assert!(vector_to_settings(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_vector_to_settings_nudges_off_boundary_values() {
        let v = [
            MEASUREMENT_NOISE_RANGE.0,
            PROCESS_NOISE_RANGE.1,
            COVARIANCE_RANGE.0,
            DISTANCE_THRESHOLD_RANGE.1,
            MAX_AGE_RANGE.0 as f64,
            MIN_HITS_RANGE.1 as f64,
            MAX_CONSECUTIVE_MISSES_RANGE.0 as f64,
        ];
        assert!(vector_to_settings(&v).is_ok());
    }

    #[test]
    fn test_default_parameter_box_matches_settings_ranges() {
        let box_ = ParameterBox::default();
        assert_eq!(box_.lower[0], MEASUREMENT_NOISE_RANGE.0);
        assert_eq!(box_.upper[3], DISTANCE_THRESHOLD_RANGE.1);
    }

    struct FixedMinimizer {
        settings: TrackerSettings,
    }

    impl Minimizer for FixedMinimizer {
        fn minimize(
            &mut self,
            _box_: &ParameterBox,
            objective: &mut dyn FnMut(&TrackerSettings) -> f64,
            _trials: usize,
        ) -> Result<(TrackerSettings, f64)> {
            let loss = objective(&self.settings);
            Ok((self.settings, loss))
        }
    }

    #[test]
    fn test_optimizer_driver_delegates_to_the_minimizer() {
        let settings = TrackerSettings::new(0.1, 0.01, 1.0, 2.0, 3, 1, 5).unwrap();
        let mut driver = OptimizerDriver::new(FixedMinimizer { settings }, ParameterBox::default());
        let (best, loss) = driver.run(10, |_s| 42.0).unwrap();
        assert_eq!(best, settings);
        assert_eq!(loss, 42.0);
    }
}
