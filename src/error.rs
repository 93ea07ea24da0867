//! Error types.
//!
//! Configuration problems are reported before the evolutionary loop starts.
//! Selection and repair failures surface from inside the loop and end the
//! run; nothing is retried behind the caller's back.

/// Failure raised by a [`FitnessFunction`](crate::evolver::FitnessFunction).
///
/// A failed evaluation leaves the population half-updated, so the runner
/// stops and propagates it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("EvaluationError: {message}")]
pub struct EvaluationError {
    message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced by the evolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolverError {
    #[error("InvalidBounds: gene {index} has unusable bounds min={min}, max={max}")]
    InvalidBounds { index: usize, min: f64, max: f64 },

    #[error("OutOfBounds: gene {index} = {value} lies outside [{min}, {max}]")]
    OutOfBounds {
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("PopulationTooSmall: population_size={size}, at least 2 required")]
    PopulationTooSmall { size: usize },

    #[error("EmptyGenome: a search space needs at least one gene")]
    EmptyGenome,

    #[error("LengthMismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("CapacityUnreachable: lower bounds sum to {min_sum}, above capacity {capacity}")]
    CapacityUnreachable { min_sum: f64, capacity: f64 },

    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    #[error("ZeroTotalFitness: roulette selection needs a positive fitness total")]
    ZeroTotalFitness,

    #[error("NegativeFitness: roulette selection got fitness {fitness} at index {index}")]
    NegativeFitness { index: usize, fitness: f64 },

    #[error("NonFiniteFitness: roulette selection got fitness {fitness} at index {index}")]
    NonFiniteFitness { index: usize, fitness: f64 },

    #[error("Infeasible: no offspring satisfied the capacity constraint after {attempts} attempts")]
    Infeasible { attempts: usize },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl EvolverError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
