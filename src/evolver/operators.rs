//! Crossover and mutation operators for fixed-length gene vectors.
//!
//! # Crossover Operators
//!
//! - [`Crossover::SinglePoint`]: head of parent A, tail of parent B
//! - [`Crossover::TwoPoint`]: parent A with a middle segment from parent B
//! - [`Crossover::Uniform`]: per-gene fair coin, optionally emitting the
//!   complementary second child
//!
//! The `*_at` functions are the deterministic cores; the enum draws the cut
//! points or coin mask and delegates to them.
//!
//! # Mutation
//!
//! - [`mutate`]: resample one random gene from its bounds, O(1)
//!
//! Operators only ever produce genes copied from a parent or drawn from the
//! gene bounds, so children always stay within bounds. The capacity
//! constraint is *not* preserved and is handled by the runner's repair step.
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - De Jong & Spears (1992), "A formal analysis of the role of multi-point
//!   crossover in genetic algorithms"

use super::space::SearchSpace;
use super::types::Genome;
use rand::Rng;
use std::ops::Range;

/// Crossover strategy for combining two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Crossover {
    /// One cut `m` in `[0, N)`: genes `[0, m)` from A, `[m, N)` from B.
    SinglePoint,

    /// Two cuts `m1 <= m2` in `[0, N)`: genes `[m1, m2)` from B, the rest
    /// from A.
    TwoPoint,

    /// Each gene from A or B by a fair coin.
    ///
    /// With `paired`, a second child takes the opposite outcome of every
    /// coin, so the two children split the parental genes exactly.
    Uniform { paired: bool },
}

impl Default for Crossover {
    fn default() -> Self {
        Crossover::Uniform { paired: false }
    }
}

impl Crossover {
    /// Number of children one application produces.
    pub fn offspring_count(&self) -> usize {
        match self {
            Crossover::Uniform { paired: true } => 2,
            _ => 1,
        }
    }

    /// Recombines `a` and `b` into one or two children.
    ///
    /// # Panics
    /// Panics if the parents have different lengths or are empty.
    pub fn apply<R: Rng>(
        &self,
        a: &Genome,
        b: &Genome,
        space: &SearchSpace,
        rng: &mut R,
    ) -> Vec<Genome> {
        let n = a.len();
        assert_eq!(n, b.len(), "parents must have equal length");
        assert!(n > 0, "parents must not be empty");

        match self {
            Crossover::SinglePoint => {
                let m = rng.random_range(0..n);
                vec![single_point_at(a, b, m, space)]
            }
            Crossover::TwoPoint => {
                let (m1, m2) = random_segment(n, rng);
                vec![two_point_at(a, b, m1, m2, space)]
            }
            Crossover::Uniform { paired } => {
                let mask: Vec<bool> = (0..n).map(|_| rng.random_bool(0.5)).collect();
                let (first, second) = uniform_with_mask(a, b, &mask, space);
                if *paired {
                    vec![first, second]
                } else {
                    vec![first]
                }
            }
        }
    }
}

/// Single-point crossover at cut `m`: `a[..m] ++ b[m..]`.
pub fn single_point_at(a: &Genome, b: &Genome, m: usize, space: &SearchSpace) -> Genome {
    let n = a.len();
    let mut child = ChildBuilder::new(n, space);
    child.inherit(a, 0..m);
    child.inherit(b, m..n);
    child.finish()
}

/// Two-point crossover: `a[..m1] ++ b[m1..m2] ++ a[m2..]`.
///
/// `m1 == m2` copies `a`; `m1 == 0, m2 == N` copies `b`. The child cost is
/// summed over the inherited segments.
///
/// # Panics
/// Panics unless `m1 <= m2 <= N`.
pub fn two_point_at(a: &Genome, b: &Genome, m1: usize, m2: usize, space: &SearchSpace) -> Genome {
    let n = a.len();
    assert!(m1 <= m2 && m2 <= n, "cut points must satisfy m1 <= m2 <= len");
    let mut child = ChildBuilder::new(n, space);
    child.inherit(a, 0..m1);
    child.inherit(b, m1..m2);
    child.inherit(a, m2..n);
    child.finish()
}

/// Uniform crossover with an explicit mask.
///
/// `mask[i] == true` gives the first child `a[i]` and the second `b[i]`;
/// `false` swaps them.
///
/// # Panics
/// Panics if `mask` and the parents differ in length.
pub fn uniform_with_mask(
    a: &Genome,
    b: &Genome,
    mask: &[bool],
    space: &SearchSpace,
) -> (Genome, Genome) {
    let n = a.len();
    assert_eq!(n, mask.len(), "mask must match genome length");
    let mut first = ChildBuilder::new(n, space);
    let mut second = ChildBuilder::new(n, space);
    for (i, &take_a) in mask.iter().enumerate() {
        let (x, y) = if take_a { (a, b) } else { (b, a) };
        first.inherit(x, i..i + 1);
        second.inherit(y, i..i + 1);
    }
    (first.finish(), second.finish())
}

/// Resamples one uniformly chosen gene from its bounds.
///
/// The genome cost moves by the old and new contributions of that gene
/// only. Returns the mutated index.
pub fn mutate<R: Rng>(genome: &mut Genome, space: &SearchSpace, rng: &mut R) -> usize {
    let index = rng.random_range(0..genome.len());
    space.resample_gene(genome, index, rng);
    index
}

/// Accumulates a child's genes and cost segment by segment.
struct ChildBuilder<'a> {
    genes: Vec<f64>,
    cost: f64,
    prices: Option<&'a [f64]>,
}

impl<'a> ChildBuilder<'a> {
    fn new(n: usize, space: &'a SearchSpace) -> Self {
        Self {
            genes: Vec::with_capacity(n),
            cost: 0.0,
            prices: space.prices(),
        }
    }

    fn inherit(&mut self, parent: &Genome, range: Range<usize>) {
        let segment = &parent.genes()[range.clone()];
        if let Some(prices) = self.prices {
            self.cost += segment
                .iter()
                .zip(&prices[range])
                .map(|(g, p)| g * p)
                .sum::<f64>();
        }
        self.genes.extend_from_slice(segment);
    }

    fn finish(self) -> Genome {
        let cost = self.prices.map(|_| self.cost);
        Genome::with_cost(self.genes, cost)
    }
}

/// Pick two cut points `m1 <= m2` within `0..n`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
