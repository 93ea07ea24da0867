//! Core types shared by every part of the evolver.
//!
//! A [`Genome`] is a fixed-length gene vector with a cached fitness. Genes
//! are stored as `f64` for all [`GeneKind`]s; integer and binary genes hold
//! integral values. The [`FitnessFunction`] trait is the contract between
//! the generic engine and a problem definition.

use crate::error::EvaluationError;
use rand::Rng;

/// Largest magnitude below which every integer is exactly representable.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// The kind shared by all genes of one problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeneKind {
    /// A 0/1 gene. Bounds must lie within `[0, 1]`.
    Binary,
    /// An integral gene sampled from `[ceil(min), floor(max)]`.
    Integer,
    /// A continuous gene sampled from `[min, max]`.
    Real,
}

impl GeneKind {
    /// Whether genes of this kind hold integral values.
    pub fn is_discrete(self) -> bool {
        !matches!(self, GeneKind::Real)
    }
}

/// Inclusive bounds of one gene.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneBounds {
    pub min: f64,
    pub max: f64,
}

impl GeneBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds of a binary gene.
    pub const fn bit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    /// Lowest value a gene of `kind` can actually take.
    pub fn effective_min(&self, kind: GeneKind) -> f64 {
        if kind.is_discrete() {
            self.min.ceil()
        } else {
            self.min
        }
    }

    /// Highest value a gene of `kind` can actually take.
    pub fn effective_max(&self, kind: GeneKind) -> f64 {
        if kind.is_discrete() {
            self.max.floor()
        } else {
            self.max
        }
    }

    /// Whether the bounds describe a non-empty range for `kind`.
    ///
    /// The span `max - min` must be finite, and discrete bounds must lie
    /// within `±2^53`.
    pub fn is_valid_for(&self, kind: GeneKind) -> bool {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return false;
        }
        if !(self.max - self.min).is_finite() {
            return false;
        }
        match kind {
            GeneKind::Real => true,
            GeneKind::Integer => {
                self.effective_min(kind) >= -MAX_EXACT_INT
                    && self.effective_max(kind) <= MAX_EXACT_INT
                    && self.effective_min(kind) <= self.effective_max(kind)
            }
            GeneKind::Binary => {
                self.min >= 0.0
                    && self.max <= 1.0
                    && self.effective_min(kind) <= self.effective_max(kind)
            }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Draws a value uniformly from `[lo, hi]`, honoring `kind`.
    ///
    /// Callers guarantee `lo <= hi` after kind-specific rounding.
    pub(crate) fn sample_range<R: Rng>(kind: GeneKind, lo: f64, hi: f64, rng: &mut R) -> f64 {
        match kind {
            GeneKind::Real => rng.random_range(lo..=hi),
            GeneKind::Integer | GeneKind::Binary => {
                let lo = lo.ceil() as i64;
                let hi = hi.floor() as i64;
                rng.random_range(lo..=hi) as f64
            }
        }
    }

    /// Draws a value uniformly from these bounds.
    pub fn sample<R: Rng>(&self, kind: GeneKind, rng: &mut R) -> f64 {
        Self::sample_range(kind, self.min, self.max, rng)
    }
}

/// One candidate solution.
///
/// The gene vector is owned; crossover and mutation build or modify private
/// copies, so two genomes never share storage. Changing a gene clears the
/// cached fitness.
///
/// When the search space declares per-gene prices the genome also carries
/// `cost = sum(gene_i * price_i)`, kept up to date incrementally by
/// [`SearchSpace::set_gene`](super::SearchSpace::set_gene).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genome {
    genes: Vec<f64>,
    fitness: Option<f64>,
    cost: Option<f64>,
}

impl Genome {
    /// Wraps a gene vector without cost tracking.
    ///
    /// Use [`SearchSpace::genome`](super::SearchSpace::genome) to get bounds
    /// checking and the cost attribute.
    pub fn from_genes(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: None,
            cost: None,
        }
    }

    pub(crate) fn with_cost(genes: Vec<f64>, cost: Option<f64>) -> Self {
        Self {
            genes,
            fitness: None,
            cost,
        }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Fitness from the most recent evaluation, `None` if the genes changed
    /// since or the genome was never evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Weighted gene sum, present when the search space declares prices.
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn gene_sum(&self) -> f64 {
        self.genes.iter().sum()
    }

    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub(crate) fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Overwrites one gene, moving the cost by the price-weighted delta.
    pub(crate) fn replace_gene(&mut self, index: usize, value: f64, price: Option<f64>) {
        let old = self.genes[index];
        if let (Some(cost), Some(price)) = (self.cost.as_mut(), price) {
            *cost -= old * price;
            *cost += value * price;
        }
        self.genes[index] = value;
        self.fitness = None;
    }
}

/// Maps a genome to a scalar fitness. Higher is better.
///
/// Implementations must be pure: the same genes always give the same
/// fitness. Closures over the gene slice implement this trait directly:
///
/// ```
/// use u_evolver::evolver::{FitnessFunction, Genome};
///
/// let sphere = |genes: &[f64]| -genes.iter().map(|g| g * g).sum::<f64>();
/// let fitness = sphere.evaluate(&Genome::from_genes(vec![1.0, 2.0])).unwrap();
/// assert_eq!(fitness, -5.0);
/// ```
///
/// Use [`TryFitness`] for closures that can fail.
pub trait FitnessFunction: Send + Sync {
    /// Computes the fitness of `genome`.
    ///
    /// An `Err` aborts the run. Non-finite values are clamped by the runner.
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        Ok(self(genome.genes()))
    }
}

/// Adapts a fallible closure into a [`FitnessFunction`].
pub struct TryFitness<F>(pub F);

impl<F> FitnessFunction for TryFitness<F>
where
    F: Fn(&[f64]) -> Result<f64, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        (self.0)(genome.genes())
    }
}

/// Replaces NaN and infinities with `fallback`.
///
/// NaN breaks every ordering the selection and replacement steps rely on.
pub(crate) fn sanitize_fitness(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        tracing::debug!(value, fallback, "non-finite fitness clamped");
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_bounds_validity() {
        assert!(GeneBounds::new(1.0, 2.0).is_valid_for(GeneKind::Real));
        assert!(GeneBounds::new(2.0, 2.0).is_valid_for(GeneKind::Real));
        assert!(!GeneBounds::new(3.0, 2.0).is_valid_for(GeneKind::Real));
        assert!(!GeneBounds::new(f64::NAN, 2.0).is_valid_for(GeneKind::Real));
        assert!(!GeneBounds::new(0.2, 0.8).is_valid_for(GeneKind::Integer));
        assert!(GeneBounds::bit().is_valid_for(GeneKind::Binary));
        assert!(!GeneBounds::new(0.0, 2.0).is_valid_for(GeneKind::Binary));
    }

    #[test]
    fn test_bounds_span_must_be_representable() {
        assert!(!GeneBounds::new(-1e308, 1e308).is_valid_for(GeneKind::Real));
        assert!(GeneBounds::new(-1e307, 1e307).is_valid_for(GeneKind::Real));

        assert!(!GeneBounds::new(0.0, 1e19).is_valid_for(GeneKind::Integer));
        assert!(!GeneBounds::new(-1e19, 0.0).is_valid_for(GeneKind::Integer));
        assert!(GeneBounds::new(-MAX_EXACT_INT, MAX_EXACT_INT).is_valid_for(GeneKind::Integer));
    }

    #[test]
    fn test_sample_extreme_bounds() {
        let mut rng = create_rng(9);
        let real = GeneBounds::new(-1e307, 1e307);
        let int = GeneBounds::new(-MAX_EXACT_INT, MAX_EXACT_INT);
        for _ in 0..100 {
            assert!(real.contains(real.sample(GeneKind::Real, &mut rng)));
            let i = int.sample(GeneKind::Integer, &mut rng);
            assert!(int.contains(i), "{i}");
        }
    }

    #[test]
    fn test_sample_stays_in_bounds() {
        let mut rng = create_rng(42);
        let real = GeneBounds::new(0.27, 0.3);
        let int = GeneBounds::new(-3.0, 4.0);
        for _ in 0..1000 {
            let r = real.sample(GeneKind::Real, &mut rng);
            assert!(real.contains(r), "{r}");
            let i = int.sample(GeneKind::Integer, &mut rng);
            assert!(int.contains(i), "{i}");
            assert_eq!(i, i.round());
        }
    }

    #[test]
    fn test_binary_sample_hits_both_values() {
        let mut rng = create_rng(3);
        let draws: Vec<f64> = (0..200)
            .map(|_| GeneBounds::bit().sample(GeneKind::Binary, &mut rng))
            .collect();
        assert!(draws.contains(&0.0));
        assert!(draws.contains(&1.0));
        assert!(draws.iter().all(|&b| b == 0.0 || b == 1.0));
    }

    #[test]
    fn test_replace_gene_moves_cost_and_clears_fitness() {
        let mut genome = Genome::with_cost(vec![2.0, 4.0], Some(2.0 * 0.5 + 4.0 * 1.5));
        genome.set_fitness(1.0);
        genome.replace_gene(1, 10.0, Some(1.5));
        assert_eq!(genome.genes(), &[2.0, 10.0]);
        assert!((genome.cost().unwrap() - 16.0).abs() < 1e-12);
        assert!(!genome.is_evaluated());
    }

    #[test]
    fn test_closure_is_fitness_function() {
        let f = |genes: &[f64]| genes.iter().sum::<f64>();
        let genome = Genome::from_genes(vec![1.0, 2.0, 3.0]);
        assert_eq!(f.evaluate(&genome), Ok(6.0));
    }

    #[test]
    fn test_try_fitness_propagates_error() {
        let f = TryFitness(|genes: &[f64]| {
            if genes[0] < 0.0 {
                Err(EvaluationError::new("negative input"))
            } else {
                Ok(genes[0])
            }
        });
        assert_eq!(f.evaluate(&Genome::from_genes(vec![2.0])), Ok(2.0));
        assert!(f.evaluate(&Genome::from_genes(vec![-1.0])).is_err());
    }

    #[test]
    fn test_sanitize_fitness() {
        assert_eq!(sanitize_fitness(3.5, 0.0), 3.5);
        assert_eq!(sanitize_fitness(f64::NAN, 0.0), 0.0);
        assert_eq!(sanitize_fitness(f64::INFINITY, -1.0), -1.0);
        assert_eq!(sanitize_fitness(f64::NEG_INFINITY, 0.0), 0.0);
    }
}
