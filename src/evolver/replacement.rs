//! Replacement policies: how offspring enter the population.

use crate::error::EvolverError;

/// Decides which members are overwritten by offspring each generation.
///
/// # Examples
///
/// ```
/// use u_evolver::evolver::Replacement;
///
/// let steady = Replacement::ReplaceWorst;
/// let generational = Replacement::Elitism { rate: 0.2 };
/// assert_eq!(generational.elite_count(500), 100);
/// assert_eq!(steady.elite_count(500), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Replacement {
    /// Steady state: each generation runs one crossover and the children
    /// overwrite the least fit members ranked before insertion (member
    /// order on ties).
    ReplaceWorst,

    /// Generational: the top `floor(P * rate)` members survive unchanged
    /// and the rest of the next generation is bred from the complete
    /// current one.
    Elitism {
        /// Fraction of the population kept as elites, in `[0, 1)`.
        rate: f64,
    },
}

impl Default for Replacement {
    fn default() -> Self {
        Replacement::Elitism { rate: 0.1 }
    }
}

impl Replacement {
    /// Number of members carried over unchanged, `floor(P * rate)`.
    pub fn elite_count(&self, population_size: usize) -> usize {
        match self {
            Replacement::ReplaceWorst => 0,
            Replacement::Elitism { rate } => (population_size as f64 * rate).floor() as usize,
        }
    }

    pub(crate) fn validate(&self, population_size: usize) -> Result<(), EvolverError> {
        if let Replacement::Elitism { rate } = self {
            if !(0.0..=1.0).contains(rate) {
                return Err(EvolverError::invalid_config(format!(
                    "elitism rate must lie in [0, 1], got {rate}"
                )));
            }
            if self.elite_count(population_size) >= population_size {
                return Err(EvolverError::invalid_config(
                    "elitism rate too high: elites fill entire population",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elite_count_floors() {
        assert_eq!(Replacement::Elitism { rate: 0.2 }.elite_count(400), 80);
        assert_eq!(Replacement::Elitism { rate: 0.15 }.elite_count(10), 1);
        assert_eq!(Replacement::Elitism { rate: 0.0 }.elite_count(10), 0);
    }

    #[test]
    fn test_validate() {
        assert!(Replacement::ReplaceWorst.validate(2).is_ok());
        assert!(Replacement::Elitism { rate: 0.2 }.validate(10).is_ok());
        assert!(Replacement::Elitism { rate: 1.0 }.validate(10).is_err());
        assert!(Replacement::Elitism { rate: -0.1 }.validate(10).is_err());
        assert!(Replacement::Elitism { rate: f64::NAN }.validate(10).is_err());
    }
}
