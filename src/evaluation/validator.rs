//! Route validation and the deterministic scheduling pass.

use chrono::TimeDelta;

use crate::models::{ProblemInstance, Route, Violation};

/// Converts fractional minutes to a chrono delta at second precision.
fn minutes_delta(minutes: f64) -> TimeDelta {
    TimeDelta::seconds((minutes * 60.0).round() as i64)
}

/// Validates routes against all constraints, writing the schedule back.
///
/// Validation is the scheduling pass: arrival and departure timestamps,
/// depot return, loads, distance, and duration are recomputed and stored on
/// the route. Checks run in a fixed order and accumulate every violation
/// rather than short-circuiting, so solvers see all reasons at once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use weekroute::evaluation::RouteValidator;
/// use weekroute::matrix::TravelMatrix;
/// use weekroute::models::{Customer, ProblemInstance, Route, TimeWindow, Vehicle, Weekday};
///
/// let customers = vec![Customer::new("S1", "Store", 0.0, 0.0, 5.0)
///     .with_window(TimeWindow::parse("08:00", "17:00").unwrap())];
/// let vehicles = vec![Vehicle::new("V1", "Truck", 10.0)];
/// let mut km = TravelMatrix::new();
/// km.insert_symmetric("depot", "S1", 10.0);
/// let mut minutes = TravelMatrix::new();
/// minutes.insert_symmetric("depot", "S1", 15.0);
/// let problem = ProblemInstance::new(customers, vehicles, km, minutes, "depot").unwrap();
///
/// let shift = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let mut route = Route::new(problem.vehicles()[0].clone(), Some(Weekday::Mon))
///     .with_departure(shift);
/// route.add_stop(Arc::clone(&problem.customers()[0]));
///
/// let (feasible, violations) = RouteValidator::new(&problem).validate(&mut route);
/// assert!(feasible, "{violations:?}");
/// assert_eq!(route.total_distance_km(), 20.0);
/// assert_eq!(route.total_duration_minutes(), 90.0);
/// ```
pub struct RouteValidator<'a> {
    problem: &'a ProblemInstance,
}

impl<'a> RouteValidator<'a> {
    /// Creates a validator over the given problem data.
    pub fn new(problem: &'a ProblemInstance) -> Self {
        Self { problem }
    }

    /// Runs all checks on the route, returning `(feasible, violations)`.
    ///
    /// Check order: capacity, time windows (with wait-clamping), blackout
    /// intervals, fleet compatibility, day exclusion, maximum duration.
    /// Arriving before a window opens is not a violation; the arrival is
    /// clamped forward to the window start. Arriving after it closes is
    /// reported, and the schedule proceeds with the late arrival so that
    /// downstream stops still get timestamps.
    pub fn validate(&self, route: &mut Route) -> (bool, Vec<Violation>) {
        let mut violations = Vec::new();

        // Capacity. Load is recomputed from the stops so stale totals
        // cannot mask an overload.
        let load: f64 = route.stops().iter().map(|s| s.customer.demand_cbm()).sum();
        route.set_total_load_cbm(load);
        let capacity = route.vehicle().capacity_cbm();
        if load > capacity {
            violations.push(Violation::CapacityExceeded {
                vehicle_id: route.vehicle().id().to_string(),
                load_cbm: load,
                capacity_cbm: capacity,
            });
        }

        self.schedule(route, &mut violations);

        // Blackout intervals, on the scheduled (post-clamp) arrival.
        for stop in route.stops() {
            if let Some(arrival) = stop.arrival {
                if let Some(blackout) = stop.customer.blackout_at(arrival.time()) {
                    violations.push(Violation::BlackoutConflict {
                        customer_id: stop.customer.id().to_string(),
                        arrival: arrival.time(),
                        start: blackout.start(),
                        end: blackout.end(),
                        reason: blackout.reason().to_string(),
                    });
                }
            }
        }

        // Fleet compatibility.
        for stop in route.stops() {
            if !route.vehicle().can_serve(stop.customer.id()) {
                violations.push(Violation::FleetIncompatible {
                    vehicle_id: route.vehicle().id().to_string(),
                    customer_id: stop.customer.id().to_string(),
                });
            }
        }

        // Day exclusion.
        if let Some(day) = route.day() {
            for stop in route.stops() {
                if !stop.customer.is_day_allowed(day) {
                    violations.push(Violation::DayExcluded {
                        customer_id: stop.customer.id().to_string(),
                        day,
                    });
                }
            }
        }

        // Maximum route duration.
        let max_minutes = route.vehicle().max_route_duration_hours() * 60.0;
        if route.total_duration_minutes() > max_minutes {
            violations.push(Violation::MaxDurationExceeded {
                duration_minutes: route.total_duration_minutes(),
                max_minutes,
            });
        }

        (violations.is_empty(), violations)
    }

    /// Computes the schedule: arrivals with wait-for-window clamping,
    /// departures, loads, depot return, distance, and duration.
    fn schedule(&self, route: &mut Route, violations: &mut Vec<Violation>) {
        let depot = self.problem.depot_id().to_string();
        let day = route.day();

        // Distance is independent of timing.
        let ids = route.customer_ids();
        let mut distance = 0.0;
        if !ids.is_empty() {
            distance += self.problem.distance(&depot, &ids[0]);
            for pair in ids.windows(2) {
                distance += self.problem.distance(&pair[0], &pair[1]);
            }
            distance += self.problem.distance(&ids[ids.len() - 1], &depot);
        }
        route.set_total_distance_km(distance);

        let Some(departure) = route.depot_departure() else {
            route.set_depot_return(None);
            route.set_total_duration_minutes(0.0);
            return;
        };
        if route.is_empty() {
            route.set_depot_return(None);
            route.set_total_duration_minutes(0.0);
            return;
        }

        let mut current = departure;
        let mut prev = depot.clone();
        let mut load = 0.0;

        for stop in route.stops_mut() {
            let cid = stop.customer.id().to_string();
            let travel = self.problem.travel_time(&prev, &cid);
            let mut arrival = current + minutes_delta(travel);

            if let Some(window) = stop.customer.window_for_day(day) {
                if arrival.time() < window.earliest() {
                    // Wait for the window to open.
                    arrival = arrival.date().and_time(window.earliest());
                } else if arrival.time() > window.latest() {
                    violations.push(Violation::TimeWindowMissed {
                        customer_id: cid.clone(),
                        arrival: arrival.time(),
                        latest: window.latest(),
                    });
                }
            }

            stop.arrival = Some(arrival);
            let departure = arrival + minutes_delta(f64::from(stop.customer.service_minutes()));
            stop.departure = Some(departure);
            stop.load_before_cbm = load;
            load += stop.customer.demand_cbm();
            stop.load_after_cbm = load;

            current = departure;
            prev = cid;
        }

        let return_travel = self.problem.travel_time(&prev, &depot);
        let depot_return = current + minutes_delta(return_travel);
        route.set_depot_return(Some(depot_return));
        route.set_total_duration_minutes(
            depot_return.signed_duration_since(departure).num_seconds() as f64 / 60.0,
        );
    }
}
