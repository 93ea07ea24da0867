//! Ready-made fitness functions for classic design problems.
//!
//! Each problem is a plain struct whose fields hold the model constants,
//! with a [`search_space`](EnginePower::search_space) describing the gene
//! bounds and a [`FitnessFunction`] implementation.
//!
//! | Problem              | Genes | Kind   | Objective                         |
//! |----------------------|-------|--------|-----------------------------------|
//! | [`EnginePower`]      | 4     | Real   | brake horsepower                  |
//! | [`EngineEfficiency`] | 4     | Real   | power gain vs. fuel consumption   |
//! | [`WingLift`]         | 5     | Real   | lift force                        |
//! | [`Portfolio`]        | N     | Binary | return / risk ratio               |

use crate::error::{EvaluationError, EvolverError};
use crate::evolver::{FitnessFunction, Genome, SearchSpace};
use std::f64::consts::PI;

/// Horsepower from the PLAN formula `P·L·A·N·n / 33000`, two strokes per
/// power cycle.
///
/// Genes: mean effective pressure (psi), stroke (ft), bore (in), speed (rpm).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnginePower {
    pub cylinders: f64,
}

impl Default for EnginePower {
    fn default() -> Self {
        Self { cylinders: 4.0 }
    }
}

impl EnginePower {
    pub fn search_space(&self) -> Result<SearchSpace, EvolverError> {
        SearchSpace::real(&[(170.0, 280.0), (0.27, 0.3), (2.9, 3.5), (3500.0, 4000.0)])
    }

    pub fn horsepower(&self, genes: &[f64]) -> f64 {
        let (mep, stroke, bore, rpm) = (genes[0], genes[1], genes[2], genes[3]);
        self.cylinders * mep * stroke * (PI / 4.0) * bore * bore * rpm / (2.0 * 33000.0)
    }
}

impl FitnessFunction for EnginePower {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        check_len(genome, 4)?;
        Ok(self.horsepower(genome.genes()))
    }
}

// Four-cylinder, 86 x 86 mm square engine.
const BORE_MM: f64 = 86.0;
const STROKE_MM: f64 = 86.0;
const ROD_LENGTH_MM: f64 = 147.7;
const CYLINDERS: f64 = 4.0;
const FUEL_ENERGY_DENSITY: f64 = 42.8e6;
const FUEL_AIR_RATIO: f64 = 14.7;
const HEAT_CAPACITY_RATIO: f64 = 1.4;
const AIR_DENSITY: f64 = 1.2;
const WATTS_PER_HP: f64 = 745.7;

/// Weighted trade-off between power and fuel consumption.
///
/// Genes are timings in degrees: valve timing, fuel injection timing,
/// ignition timing, and compression ratio (also read as degrees). Only the
/// ignition timing and compression ratio enter the power model; the fuel
/// model depends on engine speed alone.
///
/// `fitness = power_weight * power / target_power
///          + fuel_weight * target_fuel / fuel_consumption`
///
/// Power and fuel consumption are evaluated at separate engine speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineEfficiency {
    /// Engine speed for the power model (rpm).
    pub power_rpm: f64,
    /// Engine speed for the fuel model (rpm).
    pub fuel_rpm: f64,
    pub target_power: f64,
    pub target_fuel: f64,
    pub power_weight: f64,
    pub fuel_weight: f64,
}

impl Default for EngineEfficiency {
    fn default() -> Self {
        Self {
            power_rpm: 6000.0,
            fuel_rpm: 7000.0,
            target_power: 150.0,
            target_fuel: 16.0,
            power_weight: 1.0,
            fuel_weight: -1.0,
        }
    }
}

impl EngineEfficiency {
    pub fn search_space(&self) -> Result<SearchSpace, EvolverError> {
        SearchSpace::real(&[(200.0, 300.0), (20.0, 40.0), (10.0, 40.0), (8.0, 14.0)])
    }

    fn displacement() -> f64 {
        PI * (BORE_MM / 2.0).powi(2) * STROKE_MM * CYLINDERS
    }

    fn fuel_mass_flow(rpm: f64) -> f64 {
        let air = AIR_DENSITY * rpm * Self::displacement() / (4.0 * ROD_LENGTH_MM);
        air / FUEL_AIR_RATIO
    }

    /// Power in horsepower at `power_rpm`.
    ///
    /// Returns NaN when the crank angle puts the piston at top dead centre.
    pub fn power(&self, genes: &[f64]) -> f64 {
        let ignition = genes[2].to_radians();
        let compression = genes[3].to_radians();
        let rpm = self.power_rpm;

        let energy = Self::fuel_mass_flow(rpm) * FUEL_ENERGY_DENSITY;
        let crank_angle = 2.0 * PI * rpm * ignition / 60.0;
        let volume = Self::displacement() / 2.0 * (1.0 - crank_angle.cos());
        let pressure =
            (energy / volume) * (1.0 + (HEAT_CAPACITY_RATIO - 1.0) / 2.0 * (compression - 1.0));

        pressure * volume * rpm / (4.0 * PI) / WATTS_PER_HP
    }

    /// Fuel consumption at `fuel_rpm`.
    pub fn fuel_consumption(&self) -> f64 {
        let rpm = self.fuel_rpm;
        (Self::fuel_mass_flow(rpm) / 1000.0) / ((rpm / 60.0) * 100_000.0 / 1000.0) * 100.0
    }
}

impl FitnessFunction for EngineEfficiency {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        check_len(genome, 4)?;
        let power = self.power(genome.genes());
        let fuel = self.fuel_consumption();
        Ok(self.power_weight * (power / self.target_power)
            + self.fuel_weight * (self.target_fuel / fuel))
    }
}

/// Lift of a finite wing, `L = ½ ρ v² S C_L` with
/// `C_L = 2πα / (1 + π e AR)`.
///
/// Genes: airspeed v, wing area S, angle of attack α (rad), span
/// efficiency e, aspect ratio AR.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WingLift {
    /// Air density (kg/m³).
    pub air_density: f64,
}

impl Default for WingLift {
    fn default() -> Self {
        Self { air_density: 1.293 }
    }
}

impl WingLift {
    pub fn search_space(&self) -> Result<SearchSpace, EvolverError> {
        SearchSpace::real(&[
            (50.0, 350.0),
            (60.0, 200.0),
            (0.1, 0.43),
            (0.1, 1.0),
            (5.0, 15.0),
        ])
    }

    pub fn lift(&self, genes: &[f64]) -> f64 {
        let (v, area, alpha, e, ar) = (genes[0], genes[1], genes[2], genes[3], genes[4]);
        let cl = 2.0 * PI * alpha / (1.0 + PI * e * ar);
        0.5 * self.air_density * v * v * area * cl
    }
}

impl FitnessFunction for WingLift {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        check_len(genome, 5)?;
        Ok(self.lift(genome.genes()))
    }
}

/// Equal-weight portfolio over the selected assets.
///
/// Each binary gene includes or excludes one asset; included assets share
/// the capital equally. The fitness is expected return over risk, where risk
/// is `sqrt(Σ (w_i σ_i)²)` (assets assumed uncorrelated).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    pub returns: Vec<f64>,
    pub risks: Vec<f64>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            returns: vec![0.05, 0.07, 0.09, 0.11, 0.13],
            risks: vec![0.03, 0.035, 0.04, 0.045, 0.05],
        }
    }
}

impl Portfolio {
    pub fn new(returns: Vec<f64>, risks: Vec<f64>) -> Result<Self, EvolverError> {
        if returns.is_empty() {
            return Err(EvolverError::EmptyGenome);
        }
        if returns.len() != risks.len() {
            return Err(EvolverError::LengthMismatch {
                expected: returns.len(),
                actual: risks.len(),
            });
        }
        Ok(Self { returns, risks })
    }

    pub fn search_space(&self) -> Result<SearchSpace, EvolverError> {
        SearchSpace::binary(self.returns.len())
    }

    /// Capital share per asset; all zeros when nothing is selected.
    pub fn weights(&self, genes: &[f64]) -> Vec<f64> {
        let selected: f64 = genes.iter().sum();
        if selected == 0.0 {
            return vec![0.0; genes.len()];
        }
        genes.iter().map(|g| g / selected).collect()
    }

    /// `(expected return, risk)` of the selection.
    pub fn return_and_risk(&self, genes: &[f64]) -> (f64, f64) {
        let weights = self.weights(genes);
        let ret = weights.iter().zip(&self.returns).map(|(w, r)| w * r).sum();
        let risk = weights
            .iter()
            .zip(&self.risks)
            .map(|(w, s)| (w * s).powi(2))
            .sum::<f64>()
            .sqrt();
        (ret, risk)
    }
}

impl FitnessFunction for Portfolio {
    fn evaluate(&self, genome: &Genome) -> Result<f64, EvaluationError> {
        check_len(genome, self.returns.len())?;
        let (ret, risk) = self.return_and_risk(genome.genes());
        if risk == 0.0 {
            return Ok(0.0);
        }
        Ok(ret / risk)
    }
}

fn check_len(genome: &Genome, expected: usize) -> Result<(), EvaluationError> {
    if genome.len() != expected {
        return Err(EvaluationError::new(format!(
            "genome has {} genes, expected {expected}",
            genome.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolver::{EvolverConfig, EvolverRunner, Selection};

    fn eval<F: FitnessFunction>(f: &F, genes: &[f64]) -> f64 {
        f.evaluate(&Genome::from_genes(genes.to_vec())).unwrap()
    }

    #[test]
    fn test_engine_power_formula() {
        let genes = [200.0, 0.3, 3.0, 4000.0];
        let expected = 4.0 * 200.0 * 0.3 * (PI / 4.0) * 9.0 * 4000.0 / 66000.0;
        assert!((eval(&EnginePower::default(), &genes) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_engine_power_maximum_at_upper_corner() {
        let problem = EnginePower::default();
        let space = problem.search_space().unwrap();
        let upper: Vec<f64> = space.bounds().iter().map(|b| b.max).collect();
        let lower: Vec<f64> = space.bounds().iter().map(|b| b.min).collect();
        assert!(problem.horsepower(&upper) > problem.horsepower(&lower));
    }

    #[test]
    fn test_engine_efficiency_speeds_are_independent() {
        let base = EngineEfficiency::default();
        let genes = [250.0, 30.0, 20.0, 10.0];

        let faster_fuel = EngineEfficiency {
            fuel_rpm: 6000.0,
            ..base
        };
        assert_eq!(base.power(&genes), faster_fuel.power(&genes));
        assert_ne!(base.fuel_consumption(), faster_fuel.fuel_consumption());
    }

    #[test]
    fn test_engine_efficiency_ignores_valve_and_injection() {
        let problem = EngineEfficiency::default();
        let a = eval(&problem, &[200.0, 20.0, 25.0, 11.0]);
        let b = eval(&problem, &[300.0, 40.0, 25.0, 11.0]);
        assert_eq!(a, b);
        assert!(a.is_finite());
    }

    #[test]
    fn test_wing_lift_formula() {
        let genes = [100.0, 100.0, 0.2, 0.5, 10.0];
        let cl = 2.0 * PI * 0.2 / (1.0 + PI * 0.5 * 10.0);
        let expected = 0.5 * 1.293 * 10_000.0 * 100.0 * cl;
        assert!((eval(&WingLift::default(), &genes) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_portfolio_single_asset() {
        let problem = Portfolio::default();
        let fitness = eval(&problem, &[0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!((fitness - 0.13 / 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_weights_normalized() {
        let problem = Portfolio::default();
        let weights = problem.weights(&[1.0, 0.0, 1.0, 1.0, 0.0]);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(weights[1], 0.0);
    }

    #[test]
    fn test_portfolio_empty_selection_scores_zero() {
        let problem = Portfolio::default();
        assert_eq!(eval(&problem, &[0.0; 5]), 0.0);
    }

    #[test]
    fn test_portfolio_new_validation() {
        assert_eq!(
            Portfolio::new(vec![], vec![]).unwrap_err(),
            EvolverError::EmptyGenome
        );
        assert!(Portfolio::new(vec![0.1, 0.2], vec![0.1]).is_err());
    }

    #[test]
    fn test_wrong_length_is_evaluation_error() {
        let err = EnginePower::default()
            .evaluate(&Genome::from_genes(vec![1.0; 3]))
            .unwrap_err();
        assert!(err.message().contains("expected 4"));
    }

    #[test]
    fn test_portfolio_evolves_to_diversified_selection() {
        let problem = Portfolio::default();
        let space = problem.search_space().unwrap();
        let config = EvolverConfig::default()
            .with_population_size(20)
            .with_max_generations(30)
            .with_selection(Selection::Roulette)
            .with_mutation_rate(0.5)
            .with_seed(42);

        let result = EvolverRunner::run(&space, &problem, &config).unwrap();

        // the best single asset scores 0.13 / 0.05
        assert!(result.best_fitness > 0.13 / 0.05);
        assert!(result.best.gene_sum() >= 2.0);
    }

    #[test]
    fn test_wing_lift_evolution_stays_in_bounds() {
        let problem = WingLift::default();
        let space = problem.search_space().unwrap();
        let config = EvolverConfig::steady_state()
            .with_tournament_size(10)
            .with_crossover(crate::evolver::Crossover::Uniform { paired: true })
            .with_mutation_rate(0.2)
            .with_seed(1);

        let result = EvolverRunner::run(&space, &problem, &config).unwrap();

        assert!(space.contains(result.best.genes()));
        assert!(result.best_fitness > 0.0);
    }
}
