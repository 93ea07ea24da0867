//! Genetic-algorithm engine over bounded parameter spaces.
//!
//! A candidate solution is a fixed-length [`Genome`] of numeric genes drawn
//! from a [`SearchSpace`]. The caller supplies only a [`FitnessFunction`];
//! selection, recombination, mutation, repair and replacement are handled
//! generically.
//!
//! # Key Types
//!
//! - [`SearchSpace`]: Gene kind, per-gene bounds, optional capacity and prices
//! - [`EvolverConfig`]: Algorithm parameters (population size, operators, presets)
//! - [`EvolverRunner`]: Executes the evolutionary loop
//! - [`EvolverResult`]: Best genome, fitness history and stop reason
//!
//! # Strategies
//!
//! - [`Selection`]: Tournament, roulette wheel, linear rank
//! - [`Crossover`]: Single-point, two-point, uniform
//! - [`Replacement`]: Steady-state replace-worst, generational elitism
//! - [`Termination`]: Fixed generations or stagnation
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Syswerda (1989), *Uniform Crossover in Genetic Algorithms*

mod config;
mod operators;
mod population;
mod replacement;
mod runner;
mod selection;
mod space;
mod termination;
mod types;

pub use config::{EvolverConfig, RepairPolicy};
pub use operators::{mutate, single_point_at, two_point_at, uniform_with_mask, Crossover};
pub use population::Population;
pub use replacement::Replacement;
pub use runner::{EvolverResult, EvolverRunner, GenerationStats};
pub use selection::Selection;
pub use space::SearchSpace;
pub use termination::{StopReason, Termination, TerminationState};
pub use types::{FitnessFunction, GeneBounds, GeneKind, Genome, TryFitness};
