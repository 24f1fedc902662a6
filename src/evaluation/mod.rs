//! Feasibility kernel: route validation, scheduling, and insertion checks.
//!
//! The kernel is a library used by every solver:
//!
//! - [`RouteValidator`] — full per-route validation; the validation pass is
//!   also the scheduling pass (arrival/departure timestamps, loads,
//!   distance, and duration are written back).
//! - [`can_add`] — fast preflight for route construction.
//! - [`insertion_cost`] — O(1) marginal distance of splicing a customer in.
//! - [`finalize_solution`] — assembles a validated [`Solution`] from routes.

mod checker;
mod validator;

pub use checker::{can_add, insertion_cost, AddRejection};
pub use validator::RouteValidator;

use crate::models::{ProblemInstance, Route, Solution, Weekday};

/// Builds a [`Solution`] from solver output, validating every route.
///
/// Empty routes are discarded (a vehicle with no visits emits no route).
/// Violations found by the kernel clear the feasibility flag; metrics are
/// recomputed from the validated routes.
pub fn finalize_solution(
    problem: &ProblemInstance,
    day: Weekday,
    routes: Vec<Route>,
    unserved: Vec<String>,
) -> Solution {
    let validator = RouteValidator::new(problem);
    let mut solution = Solution::new(day);

    for mut route in routes {
        if route.is_empty() {
            continue;
        }
        let (_, violations) = validator.validate(&mut route);
        for violation in violations {
            solution.add_violation(violation);
        }
        solution.add_route(route);
    }

    for id in unserved {
        solution.add_unserved(id);
    }

    solution.compute_metrics();
    solution
}
