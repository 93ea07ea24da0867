//! Fixed-size population of evaluated genomes.

use super::space::SearchSpace;
use super::types::{sanitize_fitness, FitnessFunction, Genome};
use crate::error::EvolverError;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A fixed-size collection of evaluated genomes.
///
/// Every member carries a fitness whenever the population is observable:
/// construction evaluates all members, and the mutating methods only accept
/// evaluated genomes. The size never changes after construction.
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Genome>,
}

impl Population {
    /// Samples `size` random genomes from `space` and evaluates them.
    pub fn random<F, R>(
        space: &SearchSpace,
        size: usize,
        fitness: &F,
        degenerate_fitness: f64,
        parallel: bool,
        rng: &mut R,
    ) -> Result<Self, EvolverError>
    where
        F: FitnessFunction + ?Sized,
        R: Rng,
    {
        let members = (0..size).map(|_| space.sample(rng)).collect();
        Self::from_genomes(members, fitness, degenerate_fitness, parallel)
    }

    /// Builds a population from existing genomes, evaluating those that
    /// carry no fitness.
    pub fn from_genomes<F>(
        mut members: Vec<Genome>,
        fitness: &F,
        degenerate_fitness: f64,
        parallel: bool,
    ) -> Result<Self, EvolverError>
    where
        F: FitnessFunction + ?Sized,
    {
        if members.len() < 2 {
            return Err(EvolverError::PopulationTooSmall {
                size: members.len(),
            });
        }
        let expected = members[0].len();
        if let Some(m) = members.iter().find(|m| m.len() != expected) {
            return Err(EvolverError::LengthMismatch {
                expected,
                actual: m.len(),
            });
        }
        let pending: Vec<&mut Genome> = members.iter_mut().filter(|m| !m.is_evaluated()).collect();
        evaluate_refs(pending, fitness, degenerate_fitness, parallel)?;
        Ok(Self { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Genome] {
        &self.members
    }

    pub fn get(&self, index: usize) -> &Genome {
        &self.members[index]
    }

    /// Fitness of member `index`.
    pub fn fitness_of(&self, index: usize) -> f64 {
        self.members[index].fitness().unwrap_or(f64::NEG_INFINITY)
    }

    /// Snapshot of all member fitnesses, in member order.
    pub fn fitnesses(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.fitness_of(i)).collect()
    }

    /// Index of the fittest member; the first one wins ties.
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for i in 1..self.len() {
            if self.fitness_of(i) > self.fitness_of(best) {
                best = i;
            }
        }
        best
    }

    pub fn best(&self) -> &Genome {
        &self.members[self.best_index()]
    }

    /// Index of the least fit member; the first one wins ties.
    pub fn worst_index(&self) -> usize {
        let mut worst = 0;
        for i in 1..self.len() {
            if self.fitness_of(i) < self.fitness_of(worst) {
                worst = i;
            }
        }
        worst
    }

    pub fn mean_fitness(&self) -> f64 {
        self.fitnesses().iter().sum::<f64>() / self.len() as f64
    }

    /// Member indices ordered by descending fitness. The sort is stable, so
    /// equal fitnesses keep member order.
    pub fn ranked_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.fitness_of(b).total_cmp(&self.fitness_of(a)));
        order
    }

    /// Clones of the `count` fittest members, best first.
    pub fn elites(&self, count: usize) -> Vec<Genome> {
        self.ranked_indices()
            .into_iter()
            .take(count)
            .map(|i| self.members[i].clone())
            .collect()
    }

    /// Overwrites the least fit members with `children` and returns the
    /// slots, in child order.
    ///
    /// The slots are ranked before any child is inserted, so siblings never
    /// overwrite each other. Equal fitnesses keep member order.
    ///
    /// # Panics
    /// Panics if a child has not been evaluated or there are more children
    /// than members.
    pub fn replace_worst(&mut self, children: Vec<Genome>) -> Vec<usize> {
        assert!(
            children.iter().all(Genome::is_evaluated),
            "offspring must be evaluated before replacement"
        );
        assert!(children.len() <= self.len(), "more offspring than members");

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.fitness_of(a).total_cmp(&self.fitness_of(b)));
        let slots: Vec<usize> = order.into_iter().take(children.len()).collect();
        for (&slot, child) in slots.iter().zip(children) {
            self.members[slot] = child;
        }
        slots
    }

    /// Swaps in a complete next generation.
    pub(crate) fn replace_all(&mut self, next: Vec<Genome>) {
        debug_assert_eq!(next.len(), self.members.len());
        debug_assert!(next.iter().all(Genome::is_evaluated));
        self.members = next;
    }
}

/// Evaluates one genome and stores the clamped fitness.
pub(crate) fn evaluate_genome<F>(
    genome: &mut Genome,
    fitness: &F,
    degenerate_fitness: f64,
) -> Result<f64, EvolverError>
where
    F: FitnessFunction + ?Sized,
{
    let value = sanitize_fitness(fitness.evaluate(genome)?, degenerate_fitness);
    genome.set_fitness(value);
    Ok(value)
}

/// Evaluates every genome in `genomes`.
///
/// With the `parallel` feature and `parallel == true` the work is spread
/// over the rayon pool; otherwise it runs in order on the caller's thread.
pub(crate) fn evaluate_all<F>(
    genomes: &mut [Genome],
    fitness: &F,
    degenerate_fitness: f64,
    parallel: bool,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
{
    evaluate_refs(genomes.iter_mut().collect(), fitness, degenerate_fitness, parallel)
}

fn evaluate_refs<F>(
    genomes: Vec<&mut Genome>,
    fitness: &F,
    degenerate_fitness: f64,
    parallel: bool,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
{
    if parallel {
        return evaluate_parallel(genomes, fitness, degenerate_fitness);
    }
    for genome in genomes {
        evaluate_genome(genome, fitness, degenerate_fitness)?;
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn evaluate_parallel<F>(
    genomes: Vec<&mut Genome>,
    fitness: &F,
    degenerate_fitness: f64,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
{
    genomes
        .into_par_iter()
        .try_for_each(|g| evaluate_genome(g, fitness, degenerate_fitness).map(|_| ()))
}

#[cfg(not(feature = "parallel"))]
fn evaluate_parallel<F>(
    genomes: Vec<&mut Genome>,
    fitness: &F,
    degenerate_fitness: f64,
) -> Result<(), EvolverError>
where
    F: FitnessFunction + ?Sized,
{
    evaluate_refs(genomes, fitness, degenerate_fitness, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::evolver::TryFitness;
    use crate::random::create_rng;

    fn evaluated(genes: Vec<f64>, fitness: f64) -> Genome {
        let mut g = Genome::from_genes(genes);
        g.set_fitness(fitness);
        g
    }

    fn population(fitnesses: &[f64]) -> Population {
        let members = fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| evaluated(vec![i as f64], f))
            .collect();
        Population::from_genomes(members, &|_: &[f64]| 0.0, 0.0, false).unwrap()
    }

    #[test]
    fn test_random_population_is_evaluated() {
        let space = SearchSpace::real(&[(0.0, 1.0), (0.0, 1.0)]).unwrap();
        let mut rng = create_rng(42);
        let sum = |genes: &[f64]| genes.iter().sum::<f64>();
        let pop = Population::random(&space, 20, &sum, 0.0, false, &mut rng).unwrap();
        assert_eq!(pop.len(), 20);
        for member in pop.members() {
            let expected = member.genes().iter().sum::<f64>();
            assert_eq!(member.fitness(), Some(expected));
        }
    }

    #[test]
    fn test_population_too_small() {
        let err = Population::from_genomes(
            vec![Genome::from_genes(vec![1.0])],
            &|_: &[f64]| 0.0,
            0.0,
            false,
        )
        .unwrap_err();
        assert_eq!(err, EvolverError::PopulationTooSmall { size: 1 });
    }

    #[test]
    fn test_degenerate_fitness_is_clamped() {
        let members = vec![
            Genome::from_genes(vec![0.0]),
            Genome::from_genes(vec![1.0]),
        ];
        let ratio = |genes: &[f64]| 1.0 / genes[0] - f64::INFINITY * genes[0];
        let pop = Population::from_genomes(members, &ratio, -5.0, false).unwrap();
        assert_eq!(pop.fitness_of(0), -5.0);
        assert_eq!(pop.fitness_of(1), -5.0);
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let members = vec![
            Genome::from_genes(vec![0.0]),
            Genome::from_genes(vec![1.0]),
        ];
        let failing = TryFitness(|_: &[f64]| Err(EvaluationError::new("boom")));
        let err = Population::from_genomes(members, &failing, 0.0, false).unwrap_err();
        assert_eq!(err, EvolverError::Evaluation(EvaluationError::new("boom")));
    }

    #[test]
    fn test_best_and_worst_first_wins_ties() {
        let pop = population(&[3.0, 7.0, 1.0, 7.0, 1.0]);
        assert_eq!(pop.best_index(), 1);
        assert_eq!(pop.worst_index(), 2);
    }

    #[test]
    fn test_replace_worst_keeps_size() {
        let mut pop = population(&[3.0, 7.0, 1.0, 5.0]);
        let child = evaluated(vec![99.0], 4.0);
        let slots = pop.replace_worst(vec![child]);
        assert_eq!(slots, vec![2]);
        assert_eq!(pop.len(), 4);
        assert_eq!(pop.get(2).genes(), &[99.0]);
        assert_eq!(pop.worst_index(), 0);
    }

    #[test]
    fn test_replace_worst_siblings_take_distinct_slots() {
        // the first child becomes the new worst, the second must not land on it
        let mut pop = population(&[3.0, 7.0, 1.0, 5.0, 2.0]);
        let first = evaluated(vec![98.0], 0.5);
        let second = evaluated(vec![99.0], 0.5);
        let slots = pop.replace_worst(vec![first, second]);
        assert_eq!(slots, vec![2, 4]);
        assert_eq!(pop.get(2).genes(), &[98.0]);
        assert_eq!(pop.get(4).genes(), &[99.0]);
        assert_eq!(pop.get(0).genes(), &[0.0]);
        assert_eq!(pop.len(), 5);
    }

    #[test]
    fn test_replace_worst_ties_keep_member_order() {
        let mut pop = population(&[4.0, 1.0, 6.0, 1.0, 1.0]);
        let children = vec![evaluated(vec![10.0], 9.0), evaluated(vec![11.0], 9.0)];
        assert_eq!(pop.replace_worst(children), vec![1, 3]);
        assert_eq!(pop.fitness_of(4), 1.0);
    }

    #[test]
    #[should_panic(expected = "offspring must be evaluated")]
    fn test_replace_worst_rejects_unevaluated() {
        let mut pop = population(&[1.0, 2.0]);
        pop.replace_worst(vec![evaluated(vec![1.0], 1.0), Genome::from_genes(vec![0.0])]);
    }

    #[test]
    fn test_ranked_indices_stable() {
        let pop = population(&[2.0, 9.0, 2.0, 5.0]);
        assert_eq!(pop.ranked_indices(), vec![1, 3, 0, 2]);
        let elites = pop.elites(2);
        assert_eq!(elites[0].genes(), &[1.0]);
        assert_eq!(elites[1].genes(), &[3.0]);
    }

    #[test]
    fn test_mean_fitness() {
        let pop = population(&[1.0, 2.0, 3.0]);
        assert!((pop.mean_fitness() - 2.0).abs() < 1e-12);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_evaluation_matches_sequential() {
        let space = SearchSpace::real(&[(-1.0, 1.0); 4]).unwrap();
        let mut rng = create_rng(9);
        let genomes: Vec<Genome> = (0..64).map(|_| space.sample(&mut rng)).collect();
        let square = |genes: &[f64]| genes.iter().map(|g| g * g).sum::<f64>();

        let sequential = Population::from_genomes(genomes.clone(), &square, 0.0, false).unwrap();
        let parallel = Population::from_genomes(genomes, &square, 0.0, true).unwrap();
        assert_eq!(sequential.fitnesses(), parallel.fitnesses());
    }
}
