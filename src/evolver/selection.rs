//! Selection strategies.
//!
//! Selection picks parents from a fitness snapshot of the current
//! generation. All strategies **maximize**: higher fitness is preferred.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use crate::error::EvolverError;
use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_evolver::evolver::Selection;
///
/// // Tournament of 5, as used by most of the bundled problems
/// let sel = Selection::Tournament(5);
///
/// // Fitness-proportionate; requires non-negative fitness
/// let sel = Selection::Roulette;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Tournament selection: draw `k` members with replacement, keep the best.
    ///
    /// `k` sets the selection pressure:
    /// - k=1: uniform random choice
    /// - k=5-10: strong pressure, fast convergence
    /// - larger k risks premature convergence
    ///
    /// # Complexity
    /// O(k) per selection
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Every fitness must be non-negative and the total positive; anything
    /// else is reported as an error instead of sampling from a broken wheel.
    ///
    /// # Complexity
    /// O(n) per selection (linear scan)
    Roulette,

    /// Linear rank selection.
    ///
    /// Members are ranked by fitness and weighted by rank position, which
    /// avoids the scaling problems of roulette selection and accepts
    /// negative fitness.
    ///
    /// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
    /// Algorithms"
    ///
    /// # Complexity
    /// O(n log n) per selection (sort)
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(5)
    }
}

impl Selection {
    /// Selects a parent index from a fitness snapshot.
    ///
    /// # Panics
    /// Panics if `fitness` is empty.
    pub fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> Result<usize, EvolverError> {
        assert!(!fitness.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => Ok(tournament(fitness, *k, rng)),
            Selection::Roulette => roulette(fitness, rng),
            Selection::Rank => Ok(rank(fitness, rng)),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EvolverError> {
        match self {
            Selection::Tournament(0) => Err(EvolverError::invalid_config(
                "tournament size must be at least 1",
            )),
            _ => Ok(()),
        }
    }
}

/// Tournament selection: `k` draws with replacement, strictly greater wins,
/// so ties keep the first drawn.
fn tournament<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = fitness.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if fitness[idx] > fitness[best_idx] {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel: draw `r` in `[0, total)` and subtract fitnesses in order
/// until the remainder is no longer positive.
///
/// When the fitnesses sum past `f64::MAX`, every slice is divided by the
/// largest fitness first; the proportions are unchanged.
fn roulette<R: Rng>(fitness: &[f64], rng: &mut R) -> Result<usize, EvolverError> {
    if let Some((index, &f)) = fitness.iter().enumerate().find(|(_, f)| !f.is_finite()) {
        return Err(EvolverError::NonFiniteFitness { index, fitness: f });
    }
    if let Some((index, &f)) = fitness.iter().enumerate().find(|(_, &f)| f < 0.0) {
        return Err(EvolverError::NegativeFitness { index, fitness: f });
    }
    let mut total: f64 = fitness.iter().sum();
    if total <= 0.0 {
        return Err(EvolverError::ZeroTotalFitness);
    }

    let scale = if total.is_finite() {
        1.0
    } else {
        let max = fitness.iter().copied().fold(0.0, f64::max);
        total = fitness.iter().map(|f| f / max).sum();
        max
    };

    let mut remainder = rng.random_range(0.0..total);
    for (i, &f) in fitness.iter().enumerate() {
        if f <= 0.0 {
            continue;
        }
        remainder -= f / scale;
        if remainder <= 0.0 {
            return Ok(i);
        }
    }

    // floating-point fallback: last member with a non-zero slice
    Ok(fitness.iter().rposition(|&f| f > 0.0).unwrap_or(fitness.len() - 1))
}

/// Linear rank selection: the best member gets weight `n`, the worst `1`.
fn rank<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    let n = fitness.len();
    if n == 1 {
        return 0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

    let total: f64 = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;

    for (rank, &original_idx) in order.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return original_idx;
        }
    }

    order[n - 1]
}
