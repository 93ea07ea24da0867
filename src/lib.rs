//! Generic genetic-algorithm engine for bounded parameter spaces.
//!
//! Optimizes fixed-length vectors of real, integer or binary genes against a
//! caller-supplied fitness function:
//!
//! - **Evolver**: Population-based search with pluggable selection,
//!   crossover, replacement and termination policies, plus an optional
//!   capacity constraint on the gene sum.
//! - **Allocation**: Fitness for capacity-constrained resource allocation,
//!   scored by greedy production profit, leftovers and purchase cost.
//! - **Problems**: Ready-made engine, wing and portfolio design objectives.
//!
//! # Quick start
//!
//! ```
//! use u_evolver::evolver::{EvolverConfig, EvolverRunner, SearchSpace};
//!
//! // OneMax: maximize the number of set bits
//! let space = SearchSpace::binary(10)?;
//! let ones = |genes: &[f64]| genes.iter().sum::<f64>();
//! let config = EvolverConfig::default()
//!     .with_population_size(30)
//!     .with_max_generations(50)
//!     .with_mutation_rate(0.3)
//!     .with_seed(7);
//!
//! let result = EvolverRunner::run(&space, &ones, &config)?;
//! assert_eq!(result.fitness_history.len(), 51);
//! # Ok::<(), u_evolver::error::EvolverError>(())
//! ```
//!
//! # Features
//!
//! - `parallel`: evaluate offspring on the rayon thread pool when
//!   [`EvolverConfig::parallel`](evolver::EvolverConfig) is set.
//! - `serde`: `Serialize`/`Deserialize` for configuration, search spaces,
//!   genomes and results.

pub mod allocation;
pub mod error;
pub mod evolver;
pub mod problems;
pub mod random;
