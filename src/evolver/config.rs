//! Evolver configuration.
//!
//! [`EvolverConfig`] holds every parameter that controls the evolutionary
//! loop. The problem itself (search space and fitness function) is passed
//! to the runner separately.

use super::operators::Crossover;
use super::replacement::Replacement;
use super::selection::Selection;
use super::termination::Termination;
use crate::error::EvolverError;

/// What to do when no offspring satisfies the capacity constraint within
/// the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RepairPolicy {
    /// Lower the last attempt's genes from the back until the capacity holds.
    #[default]
    Truncate,
    /// Fail the run with [`EvolverError::Infeasible`].
    Abort,
}

/// Configuration for the evolver.
///
/// # Defaults
///
/// ```
/// use u_evolver::evolver::EvolverConfig;
///
/// let config = EvolverConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.termination.max_generations(), 100);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolver::evolver::{Crossover, EvolverConfig, Replacement, Selection, Termination};
///
/// let config = EvolverConfig::default()
///     .with_population_size(400)
///     .with_selection(Selection::Tournament(5))
///     .with_crossover(Crossover::TwoPoint)
///     .with_replacement(Replacement::Elitism { rate: 0.2 })
///     .with_termination(Termination::stagnation(1e-6, 100))
///     .with_mutation_rate(0.7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolverConfig {
    /// Number of genomes in the population. At least 2.
    pub population_size: usize,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Crossover operator.
    pub crossover: Crossover,

    /// Probability of applying crossover to a pair of parents (0.0–1.0).
    ///
    /// When crossover is skipped the offspring is a copy of the first parent.
    pub crossover_rate: f64,

    /// Probability of mutating each offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// How offspring enter the population.
    pub replacement: Replacement,

    /// When the loop stops.
    pub termination: Termination,

    /// Breeding attempts per offspring before the repair policy applies.
    ///
    /// Only relevant for search spaces with a capacity.
    pub max_repair_attempts: usize,

    /// Fallback once `max_repair_attempts` is exhausted.
    pub repair: RepairPolicy,

    /// Fitness assigned when the fitness function returns NaN or infinity.
    pub degenerate_fitness: f64,

    /// Evaluate offspring on the rayon pool.
    ///
    /// Has no effect unless the crate is built with the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            selection: Selection::default(),
            crossover: Crossover::default(),
            crossover_rate: 1.0,
            mutation_rate: 0.1,
            replacement: Replacement::default(),
            termination: Termination::default(),
            max_repair_attempts: 1000,
            repair: RepairPolicy::default(),
            degenerate_fitness: 0.0,
            parallel: false,
            seed: None,
        }
    }
}

impl EvolverConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Convenience builder for tournament selection.
    ///
    /// Equivalent to `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the replacement policy.
    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacement = replacement;
        self
    }

    /// Generational replacement keeping `rate` of the population as elites.
    pub fn with_elitism(self, rate: f64) -> Self {
        self.with_replacement(Replacement::Elitism {
            rate: rate.clamp(0.0, 1.0),
        })
    }

    /// Sets the termination policy.
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Runs exactly `n` generations.
    pub fn with_max_generations(self, n: usize) -> Self {
        self.with_termination(Termination::Generations(n))
    }

    /// Sets the repair retry budget.
    pub fn with_max_repair_attempts(mut self, attempts: usize) -> Self {
        self.max_repair_attempts = attempts;
        self
    }

    /// Sets the fallback for exhausted repair attempts.
    pub fn with_repair(mut self, repair: RepairPolicy) -> Self {
        self.repair = repair;
        self
    }

    /// Sets the fitness substituted for NaN and infinite results.
    pub fn with_degenerate_fitness(mut self, fitness: f64) -> Self {
        self.degenerate_fitness = fitness;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for steady-state search: one crossover per generation whose
    /// children replace the worst members.
    ///
    /// - Population: 100, Generations: 100
    /// - Tournament of 5, uniform crossover, no mutation
    pub fn steady_state() -> Self {
        Self {
            population_size: 100,
            selection: Selection::Tournament(5),
            crossover: Crossover::Uniform { paired: false },
            mutation_rate: 0.0,
            replacement: Replacement::ReplaceWorst,
            termination: Termination::Generations(100),
            ..Self::default()
        }
    }

    /// Preset for generational search with elitism and early stopping.
    ///
    /// - Population: 400, at most 100 generations
    /// - Tournament of 5, two-point crossover
    /// - Elite rate 0.2, stagnation epsilon 1e-6
    pub fn generational() -> Self {
        Self {
            population_size: 400,
            selection: Selection::Tournament(5),
            crossover: Crossover::TwoPoint,
            replacement: Replacement::Elitism { rate: 0.2 },
            termination: Termination::stagnation(1e-6, 100),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` describing the first invalid parameter.
    pub fn validate(&self) -> Result<(), EvolverError> {
        if self.population_size < 2 {
            return Err(EvolverError::PopulationTooSmall {
                size: self.population_size,
            });
        }
        self.selection.validate()?;
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EvolverError::invalid_config(format!(
                    "{name} must lie in [0, 1], got {rate}"
                )));
            }
        }
        self.replacement.validate(self.population_size)?;
        self.termination.validate()?;
        if self.max_repair_attempts == 0 {
            return Err(EvolverError::invalid_config(
                "max_repair_attempts must be at least 1",
            ));
        }
        if !self.degenerate_fitness.is_finite() {
            return Err(EvolverError::invalid_config(
                "degenerate_fitness must be finite",
            ));
        }
        Ok(())
    }
}
