//! Search space: gene kind, per-gene bounds and optional global constraints.

use super::types::{GeneBounds, GeneKind, Genome};
use crate::error::EvolverError;
use rand::Rng;

/// Slack allowed when comparing floating sums against the capacity.
const CAPACITY_TOLERANCE: f64 = 1e-9;

/// The space a problem is searched in.
///
/// Holds one [`GeneBounds`] per gene, all of the same [`GeneKind`]. Two
/// optional constraints model the allocation-style problems:
///
/// - a **capacity**: `sum(genes) <= capacity` for every feasible genome;
/// - **prices**: per-gene weights used to maintain the genome cost
///   `sum(gene_i * price_i)`.
///
/// # Examples
///
/// ```
/// use u_evolver::evolver::{GeneBounds, GeneKind, SearchSpace};
///
/// let space = SearchSpace::new(
///     GeneKind::Integer,
///     vec![GeneBounds::new(0.0, 100.0); 3],
/// )?
/// .with_capacity(100.0)?
/// .with_prices(vec![0.5, 1.5, 2.0])?;
///
/// assert_eq!(space.len(), 3);
/// # Ok::<(), u_evolver::error::EvolverError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchSpace {
    kind: GeneKind,
    bounds: Vec<GeneBounds>,
    capacity: Option<f64>,
    prices: Option<Vec<f64>>,
}

impl SearchSpace {
    /// Creates a search space, rejecting empty or inverted bounds.
    pub fn new(kind: GeneKind, bounds: Vec<GeneBounds>) -> Result<Self, EvolverError> {
        if bounds.is_empty() {
            return Err(EvolverError::EmptyGenome);
        }
        if let Some((index, b)) = bounds
            .iter()
            .enumerate()
            .find(|(_, b)| !b.is_valid_for(kind))
        {
            return Err(EvolverError::InvalidBounds {
                index,
                min: b.min,
                max: b.max,
            });
        }
        Ok(Self {
            kind,
            bounds,
            capacity: None,
            prices: None,
        })
    }

    /// `n` genes sharing the same bounds.
    pub fn uniform(kind: GeneKind, n: usize, bounds: GeneBounds) -> Result<Self, EvolverError> {
        Self::new(kind, vec![bounds; n])
    }

    /// `n` binary genes.
    pub fn binary(n: usize) -> Result<Self, EvolverError> {
        Self::uniform(GeneKind::Binary, n, GeneBounds::bit())
    }

    /// `n` real genes with the given `(min, max)` pairs.
    pub fn real(bounds: &[(f64, f64)]) -> Result<Self, EvolverError> {
        Self::new(
            GeneKind::Real,
            bounds.iter().map(|&(lo, hi)| GeneBounds::new(lo, hi)).collect(),
        )
    }

    /// Adds the global constraint `sum(genes) <= capacity`.
    pub fn with_capacity(mut self, capacity: f64) -> Result<Self, EvolverError> {
        if !capacity.is_finite() {
            return Err(EvolverError::invalid_config(format!(
                "capacity must be finite, got {capacity}"
            )));
        }
        let min_sum = self.min_sum();
        if min_sum > capacity + CAPACITY_TOLERANCE {
            return Err(EvolverError::CapacityUnreachable { min_sum, capacity });
        }
        self.capacity = Some(capacity);
        Ok(self)
    }

    /// Declares per-gene prices, enabling the genome cost attribute.
    pub fn with_prices(mut self, prices: Vec<f64>) -> Result<Self, EvolverError> {
        if prices.len() != self.bounds.len() {
            return Err(EvolverError::LengthMismatch {
                expected: self.bounds.len(),
                actual: prices.len(),
            });
        }
        if let Some(p) = prices.iter().find(|p| !p.is_finite()) {
            return Err(EvolverError::invalid_config(format!(
                "prices must be finite, got {p}"
            )));
        }
        self.prices = Some(prices);
        Ok(self)
    }

    pub fn kind(&self) -> GeneKind {
        self.kind
    }

    pub fn bounds(&self) -> &[GeneBounds] {
        &self.bounds
    }

    /// Number of genes per genome.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn capacity(&self) -> Option<f64> {
        self.capacity
    }

    pub fn prices(&self) -> Option<&[f64]> {
        self.prices.as_deref()
    }

    pub(crate) fn price(&self, index: usize) -> Option<f64> {
        self.prices.as_ref().map(|p| p[index])
    }

    /// Weighted sum `sum(gene_i * price_i)`, when prices are declared.
    pub fn cost_of(&self, genes: &[f64]) -> Option<f64> {
        self.prices
            .as_ref()
            .map(|p| genes.iter().zip(p).map(|(g, p)| g * p).sum())
    }

    /// Wraps `genes` in a genome after checking length and bounds.
    pub fn genome(&self, genes: Vec<f64>) -> Result<Genome, EvolverError> {
        if genes.len() != self.len() {
            return Err(EvolverError::LengthMismatch {
                expected: self.len(),
                actual: genes.len(),
            });
        }
        if let Some((index, (&value, b))) = genes
            .iter()
            .zip(&self.bounds)
            .enumerate()
            .find(|(_, (g, b))| !b.contains(**g))
        {
            return Err(EvolverError::OutOfBounds {
                index,
                value,
                min: b.min,
                max: b.max,
            });
        }
        let cost = self.cost_of(&genes);
        Ok(Genome::with_cost(genes, cost))
    }

    /// Draws a random genome.
    ///
    /// Each gene is uniform within its bounds. Under a capacity the range of
    /// gene `j` shrinks to what is left after the genes before it, keeping
    /// the lower bounds of the genes after it in reserve, so the running sum
    /// never exceeds the capacity.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Genome {
        let genes = match self.capacity {
            None => self
                .bounds
                .iter()
                .map(|b| b.sample(self.kind, rng))
                .collect(),
            Some(capacity) => self.sample_within_capacity(capacity, rng),
        };
        let cost = self.cost_of(&genes);
        Genome::with_cost(genes, cost)
    }

    fn sample_within_capacity<R: Rng>(&self, capacity: f64, rng: &mut R) -> Vec<f64> {
        let mins: Vec<f64> = self
            .bounds
            .iter()
            .map(|b| b.effective_min(self.kind))
            .collect();
        let mut reserved: f64 = mins.iter().sum();
        let mut running = 0.0;
        let mut genes = Vec::with_capacity(self.len());

        for (j, b) in self.bounds.iter().enumerate() {
            reserved -= mins[j];
            let lo = mins[j];
            let room = capacity - running - reserved;
            let hi = b.effective_max(self.kind).min(room);
            let hi = if self.kind.is_discrete() { hi.floor() } else { hi };
            let gene = GeneBounds::sample_range(self.kind, lo, hi.max(lo), rng);
            running += gene;
            genes.push(gene);
        }
        genes
    }

    /// Sets gene `index` to `value`, maintaining the genome cost.
    pub fn set_gene(&self, genome: &mut Genome, index: usize, value: f64) {
        genome.replace_gene(index, value, self.price(index));
    }

    /// Resamples gene `index` uniformly from its bounds and returns the new value.
    pub fn resample_gene<R: Rng>(&self, genome: &mut Genome, index: usize, rng: &mut R) -> f64 {
        let value = self.bounds[index].sample(self.kind, rng);
        self.set_gene(genome, index, value);
        value
    }

    /// Whether every gene lies within its bounds.
    pub fn contains(&self, genes: &[f64]) -> bool {
        genes.len() == self.len()
            && genes
                .iter()
                .zip(&self.bounds)
                .all(|(g, b)| b.contains(*g))
    }

    /// Whether the genome respects the capacity constraint.
    pub fn within_capacity(&self, genome: &Genome) -> bool {
        match self.capacity {
            None => true,
            Some(capacity) => genome.gene_sum() <= capacity + CAPACITY_TOLERANCE,
        }
    }

    /// Bounds and capacity both hold.
    pub fn is_feasible(&self, genome: &Genome) -> bool {
        self.contains(genome.genes()) && self.within_capacity(genome)
    }

    /// Lowers genes from the last index backwards, toward their lower
    /// bounds, until the capacity holds.
    pub fn truncate_to_capacity(&self, genome: &mut Genome) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let mut excess = genome.gene_sum() - capacity;
        if excess <= CAPACITY_TOLERANCE {
            return;
        }
        if self.kind.is_discrete() {
            excess = excess.ceil();
        }
        for index in (0..self.len()).rev() {
            if excess <= 0.0 {
                break;
            }
            let gene = genome.genes()[index];
            let reducible = (gene - self.bounds[index].effective_min(self.kind)).max(0.0);
            let cut = reducible.min(excess);
            if cut > 0.0 {
                self.set_gene(genome, index, gene - cut);
                excess -= cut;
            }
        }
    }

    fn min_sum(&self) -> f64 {
        self.bounds.iter().map(|b| b.effective_min(self.kind)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn allocation_space() -> SearchSpace {
        SearchSpace::uniform(GeneKind::Integer, 3, GeneBounds::new(0.0, 100.0))
            .unwrap()
            .with_capacity(100.0)
            .unwrap()
            .with_prices(vec![0.5, 1.5, 2.0])
            .unwrap()
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = SearchSpace::real(&[(0.0, 1.0), (5.0, 2.0)]).unwrap_err();
        assert_eq!(
            err,
            EvolverError::InvalidBounds {
                index: 1,
                min: 5.0,
                max: 2.0
            }
        );
    }

    #[test]
    fn test_unrepresentable_bounds_rejected() {
        let err = SearchSpace::real(&[(-1e308, 1e308)]).unwrap_err();
        assert_eq!(
            err,
            EvolverError::InvalidBounds {
                index: 0,
                min: -1e308,
                max: 1e308
            }
        );

        let too_wide = GeneBounds::new(0.0, 1e19);
        let err = SearchSpace::uniform(GeneKind::Integer, 2, too_wide).unwrap_err();
        assert!(matches!(err, EvolverError::InvalidBounds { index: 0, .. }));
    }

    #[test]
    fn test_empty_space_rejected() {
        assert_eq!(
            SearchSpace::new(GeneKind::Real, vec![]).unwrap_err(),
            EvolverError::EmptyGenome
        );
    }

    #[test]
    fn test_unreachable_capacity_rejected() {
        let err = SearchSpace::uniform(GeneKind::Integer, 3, GeneBounds::new(40.0, 60.0))
            .unwrap()
            .with_capacity(100.0)
            .unwrap_err();
        assert!(matches!(err, EvolverError::CapacityUnreachable { .. }));
    }

    #[test]
    fn test_price_length_checked() {
        let err = SearchSpace::binary(3)
            .unwrap()
            .with_prices(vec![1.0])
            .unwrap_err();
        assert_eq!(
            err,
            EvolverError::LengthMismatch {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_genome_rejects_out_of_bounds() {
        let space = SearchSpace::real(&[(0.0, 1.0), (0.0, 1.0)]).unwrap();
        assert!(space.genome(vec![0.5, 0.5]).is_ok());
        assert!(matches!(
            space.genome(vec![0.5, 1.5]),
            Err(EvolverError::OutOfBounds { index: 1, .. })
        ));
        assert!(matches!(
            space.genome(vec![0.5]),
            Err(EvolverError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_capacity_sampling_respects_limit() {
        let space = allocation_space();
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let genome = space.sample(&mut rng);
            assert!(genome.gene_sum() <= 100.0, "{:?}", genome.genes());
            assert!(space.contains(genome.genes()));
            let expected = space.cost_of(genome.genes()).unwrap();
            assert!((genome.cost().unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_capacity_sampling_reserves_lower_bounds() {
        let space = SearchSpace::new(
            GeneKind::Integer,
            vec![
                GeneBounds::new(0.0, 50.0),
                GeneBounds::new(10.0, 50.0),
                GeneBounds::new(20.0, 50.0),
            ],
        )
        .unwrap()
        .with_capacity(40.0)
        .unwrap();
        let mut rng = create_rng(7);
        for _ in 0..500 {
            let genome = space.sample(&mut rng);
            assert!(space.is_feasible(&genome), "{:?}", genome.genes());
        }
    }

    #[test]
    fn test_truncate_restores_capacity() {
        let space = allocation_space();
        let mut genome = space.genome(vec![60.0, 30.0, 40.0]).unwrap();
        assert!(!space.within_capacity(&genome));
        space.truncate_to_capacity(&mut genome);
        assert_eq!(genome.genes(), &[60.0, 30.0, 10.0]);
        assert!((genome.cost().unwrap() - (30.0 + 45.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_truncate_walks_backwards_over_several_genes() {
        let space = allocation_space();
        let mut genome = space.genome(vec![90.0, 30.0, 20.0]).unwrap();
        space.truncate_to_capacity(&mut genome);
        assert_eq!(genome.genes(), &[90.0, 10.0, 0.0]);
        assert!(space.is_feasible(&genome));
    }

    #[test]
    fn test_resample_gene_updates_cost() {
        let space = allocation_space();
        let mut rng = create_rng(1);
        let mut genome = space.genome(vec![10.0, 20.0, 30.0]).unwrap();
        for _ in 0..50 {
            let index = rng.random_range(0..3);
            space.resample_gene(&mut genome, index, &mut rng);
            let expected = space.cost_of(genome.genes()).unwrap();
            assert!((genome.cost().unwrap() - expected).abs() < 1e-9);
        }
    }

    proptest! {
        #[test]
        fn prop_samples_within_bounds(seed in any::<u64>(), lo in -50.0f64..50.0, width in 0.0f64..100.0) {
            let space = SearchSpace::uniform(GeneKind::Real, 4, GeneBounds::new(lo, lo + width)).unwrap();
            let mut rng = create_rng(seed);
            let genome = space.sample(&mut rng);
            prop_assert!(space.contains(genome.genes()));
        }

        #[test]
        fn prop_capacity_samples_feasible(seed in any::<u64>(), n in 1usize..8, capacity in 0u32..200) {
            let space = SearchSpace::uniform(GeneKind::Integer, n, GeneBounds::new(0.0, 100.0))
                .unwrap()
                .with_capacity(capacity as f64)
                .unwrap();
            let mut rng = create_rng(seed);
            let genome = space.sample(&mut rng);
            prop_assert!(space.is_feasible(&genome));
        }
    }
}
