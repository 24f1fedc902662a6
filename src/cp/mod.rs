//! Constraint-programming routing solver with guided local search.
//!
//! The day's problem is encoded into an integer routing model with scaled
//! distances, folded service times, capacity and time dimensions, and a
//! drop penalty per customer, then solved by a deterministic guided local
//! search under a caller-supplied wall-clock budget.

mod model;
mod search;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::evaluation::finalize_solution;
use crate::models::{
    Customer, ProblemInstance, Route, SingleDaySolver, Solution, Weekday,
};

use model::CpModel;

/// Configuration for the CP solver.
#[derive(Debug, Clone)]
pub struct CpConfig {
    /// Wall-clock search budget in seconds.
    pub time_limit_seconds: u64,
}

impl Default for CpConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 120,
        }
    }
}

/// The CP routing solver.
///
/// # Examples
///
/// ```
/// use weekroute::cp::CpSolver;
///
/// let solver = CpSolver::new().with_time_limit(5);
/// ```
pub struct CpSolver {
    config: CpConfig,
}

impl CpSolver {
    /// Creates a solver with the default 120-second budget.
    pub fn new() -> Self {
        Self {
            config: CpConfig::default(),
        }
    }

    /// Sets the wall-clock budget in seconds.
    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.config.time_limit_seconds = seconds;
        self
    }
}

impl Default for CpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleDaySolver for CpSolver {
    fn solve_day(
        &self,
        problem: &ProblemInstance,
        day: Weekday,
        shift_start: NaiveDateTime,
    ) -> Solution {
        // Day eligibility: the day is allowed and a window exists for it.
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

        let cp = CpModel::build(problem, day, shift_start, eligible);
        let budget = Duration::from_secs(self.config.time_limit_seconds);

        let Some(result) = search::solve(&cp, budget) else {
            warn!(day = %day, "cp search found no solution within the budget");
            let mut solution = Solution::new(day);
            for c in problem.customers() {
                solution.add_unserved(c.id());
            }
            solution.set_feasible(false);
            return solution;
        };

        // Vehicles with no visits emit no route.
        let mut routes = Vec::new();
        for (v, seq) in result.routes.iter().enumerate() {
            if seq.is_empty() {
                continue;
            }
            let vehicle = Arc::clone(&problem.vehicles()[v]);
            let mut route = Route::new(vehicle, Some(day)).with_departure(shift_start);
            for &node in seq {
                route.add_stop(Arc::clone(cp.customer(node)));
            }
            routes.push(route);
        }
        debug!(day = %day, routes = routes.len(), "cp extraction done");

        let served: std::collections::HashSet<&str> = result
            .routes
            .iter()
            .flat_map(|seq| seq.iter().map(|&n| cp.customer(n).id()))
            .collect();
        let unserved: Vec<String> = problem
            .customers()
            .iter()
            .filter(|c| !served.contains(c.id()))
            .map(|c| c.id().to_string())
            .collect();

        finalize_solution(problem, day, routes, unserved)
    }
}
