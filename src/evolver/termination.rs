//! Termination policies.
//!
//! [`Termination`] is the configured policy; [`TerminationState`] tracks the
//! best-fitness sequence of a running loop and reports when to stop.

use crate::error::EvolverError;

/// When the evolutionary loop stops.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Run exactly this many generations.
    Generations(usize),

    /// Stop once the best fitness improves by less than `epsilon` for
    /// `patience` consecutive generations, or after `max_generations`.
    ///
    /// This is a convergence heuristic, not a proof of optimality.
    Stagnation {
        epsilon: f64,
        patience: usize,
        max_generations: usize,
    },
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Generations(100)
    }
}

impl Termination {
    /// Stagnation with patience 1: stop at the first generation whose best
    /// fitness improved by less than `epsilon`.
    pub fn stagnation(epsilon: f64, max_generations: usize) -> Self {
        Termination::Stagnation {
            epsilon,
            patience: 1,
            max_generations,
        }
    }

    /// Upper bound on the number of generations.
    pub fn max_generations(&self) -> usize {
        match self {
            Termination::Generations(g) => *g,
            Termination::Stagnation {
                max_generations, ..
            } => *max_generations,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EvolverError> {
        if self.max_generations() == 0 {
            return Err(EvolverError::invalid_config(
                "max_generations must be at least 1",
            ));
        }
        if let Termination::Stagnation {
            epsilon, patience, ..
        } = self
        {
            if !epsilon.is_finite() || *epsilon < 0.0 {
                return Err(EvolverError::invalid_config(format!(
                    "stagnation epsilon must be finite and non-negative, got {epsilon}"
                )));
            }
            if *patience == 0 {
                return Err(EvolverError::invalid_config(
                    "stagnation patience must be at least 1",
                ));
            }
        }
        Ok(())
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// The generation budget was used up.
    GenerationLimit,
    /// Best fitness stopped improving.
    Stagnation,
}

/// Running state of a [`Termination`] policy.
///
/// Feed it the initial best fitness with [`start`](Self::start), then one
/// best-fitness value per generation with [`observe`](Self::observe).
#[derive(Debug, Clone)]
pub struct TerminationState {
    policy: Termination,
    previous: Option<f64>,
    stalled: usize,
    generation: usize,
}

impl TerminationState {
    pub fn new(policy: Termination) -> Self {
        Self {
            policy,
            previous: None,
            stalled: 0,
            generation: 0,
        }
    }

    /// Records the best fitness of the initial population.
    pub fn start(&mut self, best: f64) {
        self.previous = Some(best);
        self.stalled = 0;
        self.generation = 0;
    }

    /// Generations observed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Records the best fitness after one more generation.
    ///
    /// Returns `Some` when the loop must stop at this generation.
    pub fn observe(&mut self, best: f64) -> Option<StopReason> {
        self.generation += 1;

        if let Termination::Stagnation {
            epsilon, patience, ..
        } = self.policy
        {
            if let Some(previous) = self.previous {
                if best - previous < epsilon {
                    self.stalled += 1;
                } else {
                    self.stalled = 0;
                }
            }
            self.previous = Some(best);
            if self.stalled >= patience {
                return Some(StopReason::Stagnation);
            }
        }

        if self.generation >= self.policy.max_generations() {
            return Some(StopReason::GenerationLimit);
        }
        None
    }
}
