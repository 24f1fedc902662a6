//! The adaptive large neighborhood search loop.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::constructive::clarke_wright_savings;
use crate::evaluation::{finalize_solution, RouteValidator};
use crate::models::{
    Customer, ProblemInstance, Route, SingleDaySolver, Solution, Weekday,
};

use super::destroy::{
    DestroyOperator, RandomRemoval, ShawRemoval, TimeBasedRemoval, WorstRemoval,
};
use super::repair::{GreedyInsertion, RegretInsertion, RepairOperator};
use super::AlnsContext;

const SCORE_NEW_BEST: f64 = 10.0;
const SCORE_BETTER: f64 = 5.0;
const SCORE_ACCEPTED: f64 = 1.0;
const SCORE_REJECTED: f64 = 0.0;
const MAX_NO_IMPROVEMENT: usize = 500;

/// Tuning knobs for the ALNS solver.
///
/// # Examples
///
/// ```
/// use weekroute::alns::AlnsConfig;
///
/// let config = AlnsConfig::default()
///     .with_max_iterations(1000)
///     .with_seed(42);
/// assert_eq!(config.max_iterations, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct AlnsConfig {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Fraction of visits removed per destroy step.
    pub destruction_rate: f64,
    /// Initial annealing temperature.
    pub temperature_start: f64,
    /// Temperature floor.
    pub temperature_end: f64,
    /// Multiplicative cooling per iteration.
    pub cooling_rate: f64,
    /// RNG seed; equal seeds reproduce runs bit-exactly.
    pub seed: u64,
}

impl Default for AlnsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            destruction_rate: 0.3,
            temperature_start: 100.0,
            temperature_end: 1.0,
            cooling_rate: 0.99,
            seed: 42,
        }
    }
}

impl AlnsConfig {
    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the destroy fraction.
    pub fn with_destruction_rate(mut self, rate: f64) -> Self {
        self.destruction_rate = rate;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// The ALNS metaheuristic solver.
///
/// Starts from a Clarke-Wright solution, then alternates roulette-selected
/// destroy and repair operators under simulated-annealing acceptance.
/// Operator weights grow by the score of each accepted move and never
/// decay, biasing selection toward early-successful operators.
pub struct AlnsSolver {
    config: AlnsConfig,
}

impl AlnsSolver {
    /// Creates a solver with default configuration.
    pub fn new() -> Self {
        Self {
            config: AlnsConfig::default(),
        }
    }

    /// Creates a solver with the given configuration.
    pub fn with_config(config: AlnsConfig) -> Self {
        Self { config }
    }

    /// Multi-objective route-set cost: distance, vehicle count, and
    /// deviation from the 85% utilization target.
    fn cost(routes: &[Route]) -> f64 {
        let distance: f64 = routes.iter().map(|r| r.total_distance_km()).sum();
        let vehicles = routes.len() as f64;
        let util_penalty: f64 = routes
            .iter()
            .map(|r| (r.utilization() - 85.0).abs())
            .sum();
        distance + 1000.0 * vehicles + 500.0 * util_penalty
    }

    /// Roulette-wheel selection over operator weights.
    fn select(weights: &[f64], rng: &mut StdRng) -> usize {
        let total: f64 = weights.iter().sum();
        let mut r = rng.random_range(0.0..total);
        for (i, w) in weights.iter().enumerate() {
            if r <= *w {
                return i;
            }
            r -= w;
        }
        weights.len() - 1
    }
}

impl Default for AlnsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleDaySolver for AlnsSolver {
    fn solve_day(
        &self,
        problem: &ProblemInstance,
        day: Weekday,
        shift_start: NaiveDateTime,
    ) -> Solution {
        let eligible: Vec<Arc<Customer>> = problem
            .customers()
            .iter()
            .filter(|c| c.is_day_allowed(day) && c.window_for_day(Some(day)).is_some())
            .cloned()
            .collect();

        if eligible.is_empty() {
            let mut solution = Solution::new(day);
            for c in problem.customers() {
                solution.add_unserved(c.id());
            }
            return solution;
        }

        let sub = problem.with_customers(eligible);
        let initial = clarke_wright_savings(&sub, day, shift_start);
        let mut current: Vec<Route> = initial.routes().to_vec();

        if current.is_empty() {
            let unserved = all_unserved(problem, &current);
            return finalize_solution(problem, day, Vec::new(), unserved);
        }

        let ctx = AlnsContext {
            problem: &sub,
            day,
            shift_start,
        };
        let validator = RouteValidator::new(&sub);

        let destroy_ops: Vec<Box<dyn DestroyOperator>> = vec![
            Box::new(RandomRemoval),
            Box::new(WorstRemoval),
            Box::new(ShawRemoval),
            Box::new(TimeBasedRemoval),
        ];
        let repair_ops: Vec<Box<dyn RepairOperator>> = vec![
            Box::new(GreedyInsertion),
            Box::new(RegretInsertion::new(2)),
            Box::new(RegretInsertion::new(3)),
        ];
        let mut destroy_weights = vec![1.0f64; destroy_ops.len()];
        let mut repair_weights = vec![1.0f64; repair_ops.len()];

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best = current.clone();
        let mut best_cost = Self::cost(&best);
        let mut temperature = self.config.temperature_start;
        let mut no_improvement = 0usize;

        for iteration in 0..self.config.max_iterations {
            let d = Self::select(&destroy_weights, &mut rng);
            let r = Self::select(&repair_weights, &mut rng);

            // Destroy and repair act on a structural clone; customer and
            // vehicle records stay shared.
            let mut working = current.clone();
            let total_visits: usize = working.iter().map(|route| route.len()).sum();
            if total_visits == 0 {
                break;
            }
            let count = ((total_visits as f64 * self.config.destruction_rate).ceil() as usize)
                .max(1);

            let pool = destroy_ops[d].destroy(&mut working, count, &ctx, &mut rng);
            working.retain(|route| !route.is_empty());
            let _dropped = repair_ops[r].repair(&mut working, pool, &ctx);

            // Refresh schedules and metrics before costing.
            for route in &mut working {
                validator.validate(route);
            }

            let new_cost = Self::cost(&working);
            let current_cost = Self::cost(&current);

            let score;
            if new_cost < best_cost {
                best = working.clone();
                best_cost = new_cost;
                current = working;
                score = SCORE_NEW_BEST;
                no_improvement = 0;
            } else if new_cost < current_cost {
                current = working;
                score = SCORE_BETTER;
                no_improvement += 1;
            } else {
                let delta = new_cost - current_cost;
                let probability = (-delta / temperature).exp();
                if rng.random::<f64>() < probability {
                    current = working;
                    score = SCORE_ACCEPTED;
                } else {
                    score = SCORE_REJECTED;
                }
                no_improvement += 1;
            }

            destroy_weights[d] += score;
            repair_weights[r] += score;
            temperature = (temperature * self.config.cooling_rate).max(self.config.temperature_end);

            if no_improvement > MAX_NO_IMPROVEMENT {
                debug!(iteration, best_cost, "alns stagnated, stopping early");
                break;
            }
        }

        debug!(
            best_cost,
            ?destroy_weights,
            ?repair_weights,
            "alns finished"
        );

        let unserved = all_unserved(problem, &best);
        finalize_solution(problem, day, best, unserved)
    }
}

/// Everything in the instance that the route set does not serve.
fn all_unserved(problem: &ProblemInstance, routes: &[Route]) -> Vec<String> {
    let served: HashSet<&str> = routes
        .iter()
        .flat_map(|r| r.stops().iter().map(|s| s.customer.id()))
        .collect();
    problem
        .customers()
        .iter()
        .filter(|c| !served.contains(c.id()))
        .map(|c| c.id().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TravelMatrix;
    use crate::models::{TimeWindow, Vehicle};
    use chrono::NaiveDate;

    fn shift() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .expect("valid date")
            .and_hms_opt(8, 0, 0)
            .expect("valid time")
    }

    fn instance() -> ProblemInstance {
        let customers: Vec<Customer> = (1..=6)
            .map(|i| {
                Customer::new(format!("S{i}"), format!("Store {i}"), 0.0, 0.0, 2.0)
                    .with_window(TimeWindow::parse("07:00", "19:00").expect("valid"))
                    .with_service_minutes(10)
            })
            .collect();
        let vehicles = vec![
            Vehicle::new("V1", "Truck A", 8.0),
            Vehicle::new("V2", "Truck B", 8.0),
        ];
        let mut km = TravelMatrix::new();
        let mut minutes = TravelMatrix::new();
        let coords: [(&str, f64, f64); 7] = [
            ("depot", 0.0, 0.0),
            ("S1", 1.0, 0.0),
            ("S2", 2.0, 0.0),
            ("S3", 3.0, 0.0),
            ("S4", 0.0, 1.0),
            ("S5", 0.0, 2.0),
            ("S6", 0.0, 3.0),
        ];
        for (i, &(a, ax, ay)) in coords.iter().enumerate() {
            for &(b, bx, by) in coords.iter().skip(i + 1) {
                let d = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
                km.insert_symmetric(a, b, d);
                minutes.insert_symmetric(a, b, d * 3.0);
            }
        }
        ProblemInstance::new(customers, vehicles, km, minutes, "depot").expect("valid")
    }

    fn solver(iterations: usize, seed: u64) -> AlnsSolver {
        AlnsSolver::with_config(
            AlnsConfig::default()
                .with_max_iterations(iterations)
                .with_seed(seed),
        )
    }

    #[test]
    fn test_serves_all_customers() {
        let solution = solver(300, 42).solve_day(&instance(), Weekday::Mon, shift());
        assert_eq!(solution.stores_served(), 6);
        assert!(solution.unserved().is_empty());
        assert!(solution.is_feasible(), "{:?}", solution.violations());
    }

    #[test]
    fn test_capacity_invariant_holds() {
        let solution = solver(300, 7).solve_day(&instance(), Weekday::Mon, shift());
        for route in solution.routes() {
            assert!(route.total_load_cbm() <= route.vehicle().capacity_cbm() + 1e-9);
        }
    }

    #[test]
    fn test_same_seed_reproduces_bit_exactly() {
        let a = solver(400, 99).solve_day(&instance(), Weekday::Mon, shift());
        let b = solver(400, 99).solve_day(&instance(), Weekday::Mon, shift());
        assert_eq!(
            serde_json::to_string(&a.report()).expect("serializes"),
            serde_json::to_string(&b.report()).expect("serializes"),
        );
    }

    #[test]
    fn test_not_worse_than_construction() {
        let problem = instance();
        let initial = clarke_wright_savings(&problem, Weekday::Mon, shift());
        let improved = solver(400, 5).solve_day(&problem, Weekday::Mon, shift());
        let initial_cost = AlnsSolver::cost(initial.routes());
        let improved_cost = AlnsSolver::cost(improved.routes());
        assert!(improved_cost <= initial_cost + 1e-6);
    }

    #[test]
    fn test_day_excluded_customer_stays_unserved() {
        let mut customers: Vec<Customer> = (1..=2)
            .map(|i| {
                Customer::new(format!("S{i}"), format!("Store {i}"), 0.0, 0.0, 2.0)
                    .with_window(TimeWindow::parse("07:00", "19:00").expect("valid"))
            })
            .collect();
        customers[1] = customers[1].clone().with_excluded_day(Weekday::Mon);
        let vehicles = vec![Vehicle::new("V1", "Truck", 8.0)];
        let mut km = TravelMatrix::new();
        for (a, b, d) in [("depot", "S1", 1.0), ("depot", "S2", 2.0), ("S1", "S2", 1.0)] {
            km.insert_symmetric(a, b, d);
        }
        let problem =
            ProblemInstance::new(customers, vehicles, km, TravelMatrix::new(), "depot")
                .expect("valid");
        let solution = solver(100, 1).solve_day(&problem, Weekday::Mon, shift());
        assert_eq!(solution.unserved(), &["S2".to_string()]);
        assert_eq!(solution.stores_served(), 1);
    }

    #[test]
    fn test_empty_when_no_eligible() {
        let customers = vec![Customer::new("S1", "One", 0.0, 0.0, 2.0)]; // no window
        let vehicles = vec![Vehicle::new("V1", "Truck", 8.0)];
        let mut km = TravelMatrix::new();
        km.insert_symmetric("depot", "S1", 1.0);
        let problem =
            ProblemInstance::new(customers, vehicles, km, TravelMatrix::new(), "depot")
                .expect("valid");
        let solution = solver(100, 1).solve_day(&problem, Weekday::Mon, shift());
        assert_eq!(solution.num_vehicles_used(), 0);
        assert_eq!(solution.unserved(), &["S1".to_string()]);
    }
}
