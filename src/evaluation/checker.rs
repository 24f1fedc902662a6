//! Fast constraint checks for route construction.

use thiserror::Error;

use crate::models::{Customer, ProblemInstance, Route, Weekday};

/// Reason a customer cannot be added to a route.
///
/// Produced by the [`can_add`] preflight; the `Display` form is the
/// human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddRejection {
    /// The demand does not fit in the remaining capacity.
    #[error("exceeds vehicle capacity")]
    CapacityExceeded,
    /// Fleet restrictions forbid the vehicle from serving the customer.
    #[error("vehicle cannot serve this customer (fleet restriction)")]
    FleetRestriction,
    /// The customer excludes the route's day.
    #[error("customer not available on {0}")]
    DayExcluded(Weekday),
    /// The customer has no time window applicable on the day.
    #[error("no time window available for {0}")]
    NoWindow(Weekday),
}

/// Preflight check: can the customer be added to the route on this day?
///
/// Checks capacity headroom, fleet compatibility, day exclusion, and window
/// availability. Does *not* run the schedule; a passing preflight can
/// still produce a time-window violation once the full route is validated.
pub fn can_add(route: &Route, customer: &Customer, day: Weekday) -> Result<(), AddRejection> {
    if route.total_load_cbm() + customer.demand_cbm() > route.vehicle().capacity_cbm() {
        return Err(AddRejection::CapacityExceeded);
    }
    if !route.vehicle().can_serve(customer.id()) {
        return Err(AddRejection::FleetRestriction);
    }
    if !customer.is_day_allowed(day) {
        return Err(AddRejection::DayExcluded(day));
    }
    if customer.window_for_day(Some(day)).is_none() {
        return Err(AddRejection::NoWindow(day));
    }
    Ok(())
}

/// Marginal distance (km) of splicing `customer` into `route` at `position`.
///
/// O(1) using only the distance matrix: an empty route costs the full
/// depot–customer–depot loop, a head or tail insertion replaces one depot
/// edge, and a middle insertion swaps two edges.
pub fn insertion_cost(
    route: &Route,
    customer: &Customer,
    position: usize,
    problem: &ProblemInstance,
) -> f64 {
    let depot = problem.depot_id();
    let cid = customer.id();
    let stops = route.stops();

    if stops.is_empty() {
        return problem.distance(depot, cid) + problem.distance(cid, depot);
    }

    if position == 0 {
        let first = stops[0].customer.id();
        problem.distance(depot, cid) + problem.distance(cid, first)
            - problem.distance(depot, first)
    } else if position >= stops.len() {
        let last = stops[stops.len() - 1].customer.id();
        problem.distance(last, cid) + problem.distance(cid, depot)
            - problem.distance(last, depot)
    } else {
        let prev = stops[position - 1].customer.id();
        let next = stops[position].customer.id();
        problem.distance(prev, cid) + problem.distance(cid, next)
            - problem.distance(prev, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TravelMatrix;
    use crate::models::{TimeWindow, Vehicle};
    use std::sync::Arc;

    fn problem() -> ProblemInstance {
        let customers = vec![
            Customer::new("S1", "One", 0.0, 0.0, 4.0)
                .with_window(TimeWindow::parse("08:00", "17:00").expect("valid")),
            Customer::new("S2", "Two", 0.0, 0.0, 4.0)
                .with_window(TimeWindow::parse("08:00", "17:00").expect("valid")),
            Customer::new("S3", "Three", 0.0, 0.0, 4.0)
                .with_window(TimeWindow::parse("08:00", "17:00").expect("valid")),
        ];
        let vehicles = vec![Vehicle::new("V1", "Truck", 10.0)];
        let mut km = TravelMatrix::new();
        for (a, b, d) in [
            ("depot", "S1", 10.0),
            ("depot", "S2", 12.0),
            ("depot", "S3", 8.0),
            ("S1", "S2", 3.0),
            ("S1", "S3", 6.0),
            ("S2", "S3", 5.0),
        ] {
            km.insert_symmetric(a, b, d);
        }
        ProblemInstance::new(customers, vehicles, km, TravelMatrix::new(), "depot")
            .expect("valid")
    }

    fn route_of(problem: &ProblemInstance, ids: &[&str]) -> Route {
        let mut route = Route::new(problem.vehicles()[0].clone(), Some(Weekday::Mon));
        for id in ids {
            route.add_stop(Arc::clone(problem.customer(id).expect("exists")));
        }
        route
    }

    #[test]
    fn test_insertion_cost_empty_route() {
        let p = problem();
        let route = route_of(&p, &[]);
        let c = p.customer("S1").expect("exists");
        assert!((insertion_cost(&route, c, 0, &p) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_insertion_cost_head() {
        let p = problem();
        let route = route_of(&p, &["S2"]);
        let c = p.customer("S1").expect("exists");
        // depot->S1 + S1->S2 - depot->S2 = 10 + 3 - 12 = 1
        assert!((insertion_cost(&route, c, 0, &p) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_insertion_cost_tail() {
        let p = problem();
        let route = route_of(&p, &["S2"]);
        let c = p.customer("S1").expect("exists");
        // S2->S1 + S1->depot - S2->depot = 3 + 10 - 12 = 1
        assert!((insertion_cost(&route, c, 1, &p) - 1.0).abs() < 1e-10);
        // Positions past the end behave like the tail.
        assert!((insertion_cost(&route, c, 5, &p) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_insertion_cost_middle() {
        let p = problem();
        let route = route_of(&p, &["S1", "S3"]);
        let c = p.customer("S2").expect("exists");
        // S1->S2 + S2->S3 - S1->S3 = 3 + 5 - 6 = 2
        assert!((insertion_cost(&route, c, 1, &p) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_can_add_ok() {
        let p = problem();
        let route = route_of(&p, &["S1"]);
        let c = p.customer("S2").expect("exists");
        assert_eq!(can_add(&route, c, Weekday::Mon), Ok(()));
    }

    #[test]
    fn test_can_add_capacity() {
        let p = problem();
        let route = route_of(&p, &["S1", "S2"]); // load 8 of 10
        let c = p.customer("S3").expect("exists"); // demand 4
        assert_eq!(
            can_add(&route, c, Weekday::Mon),
            Err(AddRejection::CapacityExceeded)
        );
    }

    #[test]
    fn test_can_add_fleet() {
        let p = problem();
        let restricted = Arc::new(Vehicle::new("V2", "Truck", 10.0).with_forbidden_customer("S2"));
        let route = Route::new(restricted, Some(Weekday::Mon));
        let c = p.customer("S2").expect("exists");
        assert_eq!(
            can_add(&route, c, Weekday::Mon),
            Err(AddRejection::FleetRestriction)
        );
    }

    #[test]
    fn test_can_add_day_and_window() {
        let p = problem();
        let route = route_of(&p, &[]);
        let excluded = Customer::new("S9", "Nine", 0.0, 0.0, 1.0)
            .with_window(TimeWindow::parse("08:00", "17:00").expect("valid"))
            .with_excluded_day(Weekday::Fri);
        assert_eq!(
            can_add(&route, &excluded, Weekday::Fri),
            Err(AddRejection::DayExcluded(Weekday::Fri))
        );

        let windowless = Customer::new("S8", "Eight", 0.0, 0.0, 1.0);
        assert_eq!(
            can_add(&route, &windowless, Weekday::Mon),
            Err(AddRejection::NoWindow(Weekday::Mon))
        );
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            AddRejection::CapacityExceeded.to_string(),
            "exceeds vehicle capacity"
        );
        assert_eq!(
            AddRejection::NoWindow(Weekday::Tue).to_string(),
            "no time window available for Tue"
        );
    }
}
