//! Evolutionary loop execution.
//!
//! [`EvolverRunner`] orchestrates the complete process:
//! initialization → evaluation → selection → crossover → mutation →
//! repair → replacement → evaluation → termination check → repeat.

use super::config::{EvolverConfig, RepairPolicy};
use super::operators::mutate;
use super::population::{evaluate_all, Population};
use super::replacement::Replacement;
use super::space::SearchSpace;
use super::termination::{StopReason, TerminationState};
use super::types::{FitnessFunction, Genome};
use crate::error::EvolverError;
use crate::random::create_rng;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

/// Result of an evolver run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolverResult {
    /// The best genome found during the entire run.
    pub best: Genome,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: f64,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run stopped because fitness stagnated.
    pub stagnated: bool,

    /// Best fitness found so far: the initial population, then one entry
    /// per generation. Never decreases.
    pub fitness_history: Vec<f64>,
}

/// Per-generation progress, handed to the observer of
/// [`EvolverRunner::run_with_observer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    /// Best fitness found so far.
    pub best_fitness: f64,
    /// Best fitness within the current population.
    pub population_best: f64,
    /// Mean fitness of the current population.
    pub mean_fitness: f64,
}

/// Executes the evolutionary loop.
///
/// # Usage
///
/// ```
/// use u_evolver::evolver::{EvolverConfig, EvolverRunner, SearchSpace};
///
/// let space = SearchSpace::real(&[(-5.0, 5.0), (-5.0, 5.0)])?;
/// let sphere = |genes: &[f64]| -genes.iter().map(|g| g * g).sum::<f64>();
/// let config = EvolverConfig::default()
///     .with_population_size(30)
///     .with_max_generations(20)
///     .with_seed(42);
///
/// let result = EvolverRunner::run(&space, &sphere, &config)?;
/// assert!(result.best_fitness <= 0.0);
/// # Ok::<(), u_evolver::error::EvolverError>(())
/// ```
pub struct EvolverRunner;

impl EvolverRunner {
    /// Runs the evolver.
    ///
    /// Configuration problems are reported before any genome is sampled.
    pub fn run<F>(
        space: &SearchSpace,
        fitness: &F,
        config: &EvolverConfig,
    ) -> Result<EvolverResult, EvolverError>
    where
        F: FitnessFunction + ?Sized,
    {
        Self::run_with_observer(space, fitness, config, |_| {})
    }

    /// Runs the evolver, calling `observer` after every generation.
    ///
    /// The observer is a progress side channel; it cannot influence the run.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            population_size = config.population_size,
            genes = space.len(),
            seed = ?config.seed,
        )
    )]
    pub fn run_with_observer<F, O>(
        space: &SearchSpace,
        fitness: &F,
        config: &EvolverConfig,
        mut observer: O,
    ) -> Result<EvolverResult, EvolverError>
    where
        F: FitnessFunction + ?Sized,
        O: FnMut(&GenerationStats),
    {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        info!(
            replacement = ?config.replacement,
            selection = ?config.selection,
            crossover = ?config.crossover,
            termination = ?config.termination,
            "starting evolution"
        );

        // 1. Initialize and evaluate population
        let mut population = Population::random(
            space,
            config.population_size,
            fitness,
            config.degenerate_fitness,
            config.parallel,
            &mut rng,
        )?;

        // 2. Track best
        let mut best = population.best().clone();
        let mut best_fitness = population.fitness_of(population.best_index());
        let max_generations = config.termination.max_generations();
        let mut fitness_history = Vec::with_capacity(max_generations + 1);
        fitness_history.push(best_fitness);

        let mut termination = TerminationState::new(config.termination);
        termination.start(best_fitness);

        let breeder = Breeder { space, config };
        let mut stop = StopReason::GenerationLimit;

        // 3. Evolutionary loop
        loop {
            match config.replacement {
                Replacement::ReplaceWorst => {
                    steady_state_step(&breeder, &mut population, fitness, &mut rng)?
                }
                Replacement::Elitism { .. } => {
                    generational_step(&breeder, &mut population, fitness, &mut rng)?
                }
            }

            let gen_best_idx = population.best_index();
            let population_best = population.fitness_of(gen_best_idx);
            if population_best > best_fitness {
                best = population.get(gen_best_idx).clone();
                best_fitness = population_best;
            }
            fitness_history.push(best_fitness);

            let stats = GenerationStats {
                generation: termination.generation() + 1,
                best_fitness,
                population_best,
                mean_fitness: population.mean_fitness(),
            };
            debug!(
                generation = stats.generation,
                best_fitness = stats.best_fitness,
                population_best = stats.population_best,
                mean_fitness = stats.mean_fitness,
                "generation complete"
            );
            observer(&stats);

            if let Some(reason) = termination.observe(best_fitness) {
                stop = reason;
                break;
            }
        }

        let generations = termination.generation();
        info!(generations, best_fitness, reason = ?stop, "evolution finished");

        Ok(EvolverResult {
            best,
            best_fitness,
            generations,
            stagnated: stop == StopReason::Stagnation,
            fitness_history,
        })
    }
}

/// Steady state: one crossover, the children evaluated and written over the
/// least fit members of the population before insertion.
fn steady_state_step<F, R>(
    breeder: &Breeder<'_>,
    population: &mut Population,
    fitness: &F,
    rng: &mut R,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
    R: Rng,
{
    let snapshot = population.fitnesses();
    let mut children = breeder.breed(population.members(), &snapshot, rng)?;
    evaluate_all(
        &mut children,
        fitness,
        breeder.config.degenerate_fitness,
        breeder.config.parallel,
    )?;
    population.replace_worst(children);
    Ok(())
}

/// Generational: elites survive, the rest is bred from the completed
/// current generation, then the new generation is swapped in at once.
fn generational_step<F, R>(
    breeder: &Breeder<'_>,
    population: &mut Population,
    fitness: &F,
    rng: &mut R,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
    R: Rng,
{
    let size = population.len();
    let elite_count = breeder.config.replacement.elite_count(size);
    let snapshot = population.fitnesses();

    let mut offspring: Vec<Genome> = Vec::with_capacity(size - elite_count);
    while offspring.len() < size - elite_count {
        for child in breeder.breed(population.members(), &snapshot, rng)? {
            if offspring.len() >= size - elite_count {
                break;
            }
            offspring.push(child);
        }
    }

    evaluate_all(
        &mut offspring,
        fitness,
        breeder.config.degenerate_fitness,
        breeder.config.parallel,
    )?;

    let mut next_gen = population.elites(elite_count);
    next_gen.extend(offspring);
    population.replace_all(next_gen);
    Ok(())
}

/// Produces constraint-valid offspring from a population snapshot.
struct Breeder<'a> {
    space: &'a SearchSpace,
    config: &'a EvolverConfig,
}

impl Breeder<'_> {
    /// Select → crossover → mutate, retried until at least one child
    /// satisfies the capacity; after `max_repair_attempts` the repair policy
    /// decides. Returned children are unevaluated.
    fn breed<R: Rng>(
        &self,
        members: &[Genome],
        fitness: &[f64],
        rng: &mut R,
    ) -> Result<Vec<Genome>, EvolverError> {
        let config = self.config;
        let mut last = Vec::new();

        for _ in 0..config.max_repair_attempts {
            let p1 = config.selection.select(fitness, rng)?;
            let p2 = config.selection.select(fitness, rng)?;

            let mut children = if rng.random_bool(config.crossover_rate) {
                config
                    .crossover
                    .apply(&members[p1], &members[p2], self.space, rng)
            } else {
                vec![members[p1].clone()]
            };

            for child in &mut children {
                child.clear_fitness();
                if rng.random_bool(config.mutation_rate) {
                    mutate(child, self.space, rng);
                }
            }

            if children.iter().all(|c| self.space.within_capacity(c)) {
                return Ok(children);
            }
            let feasible: Vec<Genome> = children
                .iter()
                .filter(|c| self.space.within_capacity(c))
                .cloned()
                .collect();
            if !feasible.is_empty() {
                return Ok(feasible);
            }
            last = children;
        }

        match config.repair {
            RepairPolicy::Abort => Err(EvolverError::Infeasible {
                attempts: config.max_repair_attempts,
            }),
            RepairPolicy::Truncate => {
                warn!(
                    attempts = config.max_repair_attempts,
                    "no feasible offspring, truncating to capacity"
                );
                for child in &mut last {
                    self.space.truncate_to_capacity(child);
                }
                Ok(last)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
