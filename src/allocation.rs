//! Capacity-constrained resource allocation.
//!
//! A genome assigns an integral amount to each of `N` resources, bounded by
//! a shared capacity. Its quality is judged by what can be produced from
//! those resources:
//!
//! 1. Products are visited by descending selling price. Each is produced
//!    repeatedly while every resource it needs is still available.
//! 2. Whatever is left over counts as a penalty.
//! 3. A score formula combines profit, penalty, purchase cost and the total
//!    allocation into the fitness.
//!
//! The greedy production order is fast, not optimal: a cheaper product that
//! would use leftovers better is never preferred over a pricier one.
//!
//! # Examples
//!
//! ```
//! use u_evolver::allocation::{AllocationFitness, Product};
//! use u_evolver::evolver::{EvolverConfig, EvolverRunner};
//!
//! let fitness = AllocationFitness::new(
//!     vec![0.5, 1.5, 2.0],
//!     100.0,
//!     vec![Product::new(vec![1.0, 1.0, 0.0], 6.0)],
//! )?;
//! let space = fitness.search_space()?;
//! let config = EvolverConfig::generational()
//!     .with_population_size(50)
//!     .with_seed(42);
//!
//! let result = EvolverRunner::run(&space, &fitness, &config)?;
//! let report = fitness.breakdown(&result.best);
//! assert!(report.total_allocation <= 100.0);
//! # Ok::<(), u_evolver::error::EvolverError>(())
//! ```

use crate::error::{EvaluationError, EvolverError};
use crate::evolver::{FitnessFunction, GeneBounds, GeneKind, Genome, SearchSpace};
use std::fmt;
use std::sync::Arc;

/// A product that consumes a fixed amount of each resource per unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Product {
    needs: Vec<f64>,
    price: f64,
}

impl Product {
    /// `needs[i]` units of resource `i` make one unit, sold at `price`.
    pub fn new(needs: Vec<f64>, price: f64) -> Self {
        Self { needs, price }
    }

    pub fn needs(&self) -> &[f64] {
        &self.needs
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    fn consumes_nothing(&self) -> bool {
        self.needs.iter().all(|&n| n == 0.0)
    }

    fn fits(&self, available: &[f64]) -> bool {
        self.needs
            .iter()
            .zip(available)
            .all(|(need, have)| have - need >= 0.0)
    }
}

/// Everything the score formula sees about one allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationBreakdown {
    /// Sales revenue of the greedy production plan.
    pub profit: f64,
    /// Sum of resources left unconsumed.
    pub penalty: f64,
    /// Purchase cost of the allocation, `sum(gene_i * price_i)`.
    pub cost: f64,
    /// Sum of all allocated resources.
    pub total_allocation: f64,
    /// Units produced per product, in construction order.
    pub produced: Vec<usize>,
    /// Fitness assigned by the score formula.
    pub score: f64,
}

/// Score formula over an [`AllocationBreakdown`] (its `score` field unset).
pub type ScoreFn = dyn Fn(&AllocationBreakdown) -> f64 + Send + Sync;

/// Fitness of a resource allocation.
#[derive(Clone)]
pub struct AllocationFitness {
    prices: Vec<f64>,
    capacity: f64,
    products: Vec<Product>,
    /// Indices into `products`, by descending price; ties keep input order.
    order: Vec<usize>,
    score: Option<Arc<ScoreFn>>,
}

impl fmt::Debug for AllocationFitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationFitness")
            .field("prices", &self.prices)
            .field("capacity", &self.capacity)
            .field("products", &self.products)
            .field("custom_score", &self.score.is_some())
            .finish()
    }
}

impl AllocationFitness {
    /// Creates the fitness for `prices.len()` resources sharing `capacity`.
    ///
    /// # Errors
    ///
    /// - [`EvolverError::EmptyGenome`] without resources
    /// - [`EvolverError::LengthMismatch`] if a product's needs do not cover
    ///   every resource
    /// - [`EvolverError::InvalidConfig`] for negative or non-finite values
    pub fn new(
        prices: Vec<f64>,
        capacity: f64,
        products: Vec<Product>,
    ) -> Result<Self, EvolverError> {
        if prices.is_empty() {
            return Err(EvolverError::EmptyGenome);
        }
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(EvolverError::invalid_config(format!(
                "capacity must be finite and non-negative, got {capacity}"
            )));
        }
        if let Some(p) = prices.iter().find(|p| !p.is_finite()) {
            return Err(EvolverError::invalid_config(format!(
                "resource price must be finite, got {p}"
            )));
        }
        for product in &products {
            if product.needs.len() != prices.len() {
                return Err(EvolverError::LengthMismatch {
                    expected: prices.len(),
                    actual: product.needs.len(),
                });
            }
            if product.needs.iter().any(|n| !n.is_finite() || *n < 0.0) {
                return Err(EvolverError::invalid_config(format!(
                    "product needs must be finite and non-negative, got {:?}",
                    product.needs
                )));
            }
            if !product.price.is_finite() {
                return Err(EvolverError::invalid_config(format!(
                    "product price must be finite, got {}",
                    product.price
                )));
            }
        }

        let mut order: Vec<usize> = (0..products.len()).collect();
        order.sort_by(|&a, &b| products[b].price.total_cmp(&products[a].price));

        Ok(Self {
            prices,
            capacity,
            products,
            order,
            score: None,
        })
    }

    /// Replaces the default score formula.
    pub fn with_score<S>(mut self, score: S) -> Self
    where
        S: Fn(&AllocationBreakdown) -> f64 + Send + Sync + 'static,
    {
        self.score = Some(Arc::new(score));
        self
    }

    pub fn resource_count(&self) -> usize {
        self.prices.len()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Integer genes in `[0, capacity]`, summing to at most the capacity,
    /// with the resource prices attached for incremental cost tracking.
    pub fn search_space(&self) -> Result<SearchSpace, EvolverError> {
        SearchSpace::uniform(
            GeneKind::Integer,
            self.resource_count(),
            GeneBounds::new(0.0, self.capacity),
        )?
        .with_capacity(self.capacity)?
        .with_prices(self.prices.clone())
    }

    /// Default score:
    /// `(profit / cost) * (total_allocation - penalty) / (resource_count * capacity)`,
    /// floored at 0. A zero cost or capacity scores 0.
    pub fn default_score(&self, b: &AllocationBreakdown) -> f64 {
        let scale = self.resource_count() as f64 * self.capacity;
        if b.cost == 0.0 || scale == 0.0 {
            return 0.0;
        }
        let score = (b.profit / b.cost) * (b.total_allocation - b.penalty) / scale;
        score.max(0.0)
    }

    /// Full evaluation report of `genome`.
    ///
    /// Uses the genome's cached cost when it carries one.
    ///
    /// # Panics
    /// Panics if the genome length differs from the resource count.
    pub fn breakdown(&self, genome: &Genome) -> AllocationBreakdown {
        let cost = genome
            .cost()
            .unwrap_or_else(|| self.cost_of(genome.genes()));
        self.breakdown_with_cost(genome.genes(), cost)
    }

    /// Evaluation report of a raw allocation vector.
    pub fn breakdown_of(&self, genes: &[f64]) -> AllocationBreakdown {
        self.breakdown_with_cost(genes, self.cost_of(genes))
    }

    fn cost_of(&self, genes: &[f64]) -> f64 {
        genes.iter().zip(&self.prices).map(|(g, p)| g * p).sum()
    }

    fn breakdown_with_cost(&self, genes: &[f64], cost: f64) -> AllocationBreakdown {
        assert_eq!(
            genes.len(),
            self.resource_count(),
            "allocation must cover every resource"
        );

        let mut available = genes.to_vec();
        let mut produced = vec![0usize; self.products.len()];
        let mut profit = 0.0;

        for &p in &self.order {
            let product = &self.products[p];
            if product.consumes_nothing() {
                continue;
            }
            while product.fits(&available) {
                for (have, need) in available.iter_mut().zip(&product.needs) {
                    *have -= need;
                }
                profit += product.price;
                produced[p] += 1;
            }
        }

        let mut report = AllocationBreakdown {
            profit,
            penalty: available.iter().sum(),
            cost,
            total_allocation: genes.iter().sum(),
            produced,
            score: 0.0,
        };
        report.score = match &self.score {
            Some(score) => score(&report),
            None => self.default_score(&report),
        };
        report
    }
}

impl FitnessFunction for AllocationFitness {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        if genome.len() != self.resource_count() {
            return Err(EvaluationError::new(format!(
                "allocation has {} genes, expected {}",
                genome.len(),
                self.resource_count()
            )));
        }
        Ok(self.breakdown(genome).score)
    }
}
