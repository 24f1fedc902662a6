//! Intra-route 2-opt improvement.
//!
//! # Algorithm
//!
//! For each pair of positions (i, j) in a route, build the candidate with
//! the segment `[i..=j]` reversed. A candidate is accepted when it strictly
//! lowers the total distance *and* passes full route validation: segment
//! reversal can break time windows even when it shortens the path, so the
//! distance delta alone is not enough. First-improvement strategy, capped
//! at 100 passes.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman problems",
//! *Operations Research* 6(6), 791-812.

use std::sync::Arc;

use tracing::trace;

use crate::evaluation::RouteValidator;
use crate::models::{ProblemInstance, Route};

const MAX_PASSES: usize = 100;

/// Improves a route by validated segment reversals.
///
/// Returns the improved route with its schedule and metrics refreshed. The
/// result's distance is never greater than the input's.
pub fn two_opt_improve(route: &Route, problem: &ProblemInstance) -> Route {
    let validator = RouteValidator::new(problem);

    let mut current = route.clone();
    validator.validate(&mut current);

    if current.len() < 2 {
        return current;
    }

    for pass in 0..MAX_PASSES {
        let mut improved = false;
        let n = current.len();

        'scan: for i in 0..n - 1 {
            for j in (i + 1)..n {
                let mut candidate = reversed(&current, i, j);
                let (feasible, _) = validator.validate(&mut candidate);
                if feasible && candidate.total_distance_km() < current.total_distance_km() - 1e-9 {
                    trace!(
                        pass,
                        i,
                        j,
                        from = current.total_distance_km(),
                        to = candidate.total_distance_km(),
                        "2-opt reversal accepted"
                    );
                    current = candidate;
                    improved = true;
                    break 'scan;
                }
            }
        }

        if !improved {
            break;
        }
    }

    current
}

/// Builds a copy of the route with the stop segment `[i..=j]` reversed.
fn reversed(route: &Route, i: usize, j: usize) -> Route {
    let mut order: Vec<Arc<crate::models::Customer>> = route
        .stops()
        .iter()
        .map(|s| Arc::clone(&s.customer))
        .collect();
    order[i..=j].reverse();

    let mut out = Route::new(Arc::clone(route.vehicle()), route.day());
    if let Some(dep) = route.depot_departure() {
        out.set_depot_departure(dep);
    }
    for customer in order {
        out.add_stop(customer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TravelMatrix;
    use crate::models::{Customer, TimeWindow, Vehicle, Weekday};
    use chrono::NaiveDate;

    fn problem(km_pairs: &[(&str, &str, f64)], customers: Vec<Customer>) -> ProblemInstance {
        let mut km = TravelMatrix::new();
        for &(a, b, d) in km_pairs {
            km.insert_symmetric(a, b, d);
        }
        ProblemInstance::new(
            customers,
            vec![Vehicle::new("V1", "Truck", 100.0)],
            km,
            TravelMatrix::new(),
            "depot",
        )
        .expect("valid")
    }

    fn route_of(p: &ProblemInstance, ids: &[&str]) -> Route {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2)
            .expect("valid")
            .and_hms_opt(8, 0, 0)
            .expect("valid");
        let mut route =
            Route::new(p.vehicles()[0].clone(), Some(Weekday::Mon)).with_departure(start);
        for id in ids {
            route.add_stop(Arc::clone(p.customer(id).expect("exists")));
        }
        route
    }

    fn line_problem() -> ProblemInstance {
        // Customers on a line at 1, 2, 3 km from the depot.
        problem(
            &[
                ("depot", "A", 1.0),
                ("depot", "B", 2.0),
                ("depot", "C", 3.0),
                ("A", "B", 1.0),
                ("A", "C", 2.0),
                ("B", "C", 1.0),
            ],
            vec![
                Customer::new("A", "A", 0.0, 0.0, 1.0),
                Customer::new("B", "B", 0.0, 0.0, 1.0),
                Customer::new("C", "C", 0.0, 0.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_fixes_crossing() {
        let p = line_problem();
        // A, C, B: 1 + 2 + 1 + 2 = 6; optimal A, B, C: 1 + 1 + 1 + 3 = 6.
        // Use a detour order that is strictly worse: C, A, B = 3 + 2 + 1 + 2 = 8.
        let route = route_of(&p, &["C", "A", "B"]);
        let improved = two_opt_improve(&route, &p);
        assert!(improved.total_distance_km() <= 6.0 + 1e-9);
    }

    #[test]
    fn test_never_worsens() {
        let p = line_problem();
        for order in [["A", "B", "C"], ["B", "A", "C"], ["C", "B", "A"]] {
            let mut route = route_of(&p, &order);
            RouteValidator::new(&p).validate(&mut route);
            let before = route.total_distance_km();
            let improved = two_opt_improve(&route, &p);
            assert!(improved.total_distance_km() <= before + 1e-9);
        }
    }

    #[test]
    fn test_single_stop_untouched() {
        let p = line_problem();
        let route = route_of(&p, &["B"]);
        let improved = two_opt_improve(&route, &p);
        assert_eq!(improved.customer_ids(), vec!["B"]);
        assert_eq!(improved.total_distance_km(), 4.0);
    }

    #[test]
    fn test_respects_time_windows() {
        // B must be served first (early-closing window), even though the
        // distance-optimal order visits A first.
        let p = problem(
            &[
                ("depot", "A", 1.0),
                ("depot", "B", 5.0),
                ("A", "B", 4.5),
            ],
            vec![
                Customer::new("A", "A", 0.0, 0.0, 1.0)
                    .with_window(TimeWindow::parse("08:00", "17:00").expect("valid"))
                    .with_service_minutes(30),
                Customer::new("B", "B", 0.0, 0.0, 1.0)
                    .with_window(TimeWindow::parse("08:00", "08:30").expect("valid"))
                    .with_service_minutes(30),
            ],
        );
        let route = route_of(&p, &["B", "A"]);
        let improved = two_opt_improve(&route, &p);
        // Reversal to [A, B] would shorten nothing here anyway, but even a
        // shorter infeasible order must not be accepted.
        assert_eq!(improved.customer_ids(), vec!["B", "A"]);
        let mut check = improved.clone();
        let (feasible, _) = RouteValidator::new(&p).validate(&mut check);
        assert!(feasible);
    }
}
