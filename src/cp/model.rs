//! Integer routing model for the constraint-programming solver.
//!
//! The day's problem is encoded over integer quantities so that search
//! moves compare exactly, with no float drift:
//!
//! - distances in meters (km × 1000),
//! - arc times in whole minutes, destination service folded in,
//! - demands and capacities in centi-CBM (× 100),
//! - per-node windows in minutes from shift start.
//!
//! Node 0 is the depot; node `i ≥ 1` is `customers[i - 1]`.

use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};

use crate::models::{Customer, ProblemInstance, Weekday};

/// Waiting allowed at a node before service, in minutes.
const SLACK_MINUTES: i64 = 30;
/// Per-vehicle time horizon, in minutes.
const HORIZON_MINUTES: i64 = 12 * 60;
/// Cost of dropping a customer from the plan.
const DROP_PENALTY: i64 = 100_000;
/// Weight of the global time span in the objective.
const SPAN_COEFFICIENT: i64 = 100;

/// Timing and load of one feasible vehicle route.
#[derive(Debug, Clone)]
pub(crate) struct RouteSchedule {
    /// Arrival (cumulative minutes from shift start) per visited node.
    pub arrivals: Vec<i64>,
    /// Return-to-depot time in minutes from shift start.
    pub end_time: i64,
    /// Total load in centi-CBM.
    pub load: i64,
}

/// The integer model for one day.
pub(crate) struct CpModel {
    customers: Vec<Arc<Customer>>,
    dist_m: Vec<Vec<i64>>,
    time_min: Vec<Vec<i64>>,
    demand: Vec<i64>,
    caps: Vec<i64>,
    windows: Vec<(i64, i64)>,
    compat: Vec<Vec<bool>>,
}

impl CpModel {
    /// Encodes the day-eligible customers into the integer model.
    pub(crate) fn build(
        problem: &ProblemInstance,
        day: Weekday,
        shift_start: NaiveDateTime,
        eligible: Vec<Arc<Customer>>,
    ) -> Self {
        let n = eligible.len() + 1;
        let depot = problem.depot_id().to_string();
        let shift_minute = i64::from(shift_start.time().hour()) * 60
            + i64::from(shift_start.time().minute());

        let ids: Vec<&str> = std::iter::once(depot.as_str())
            .chain(eligible.iter().map(|c| c.id()))
            .collect();

        let mut dist_m = vec![vec![0i64; n]; n];
        let mut time_min = vec![vec![0i64; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                dist_m[i][j] = (problem.distance(ids[i], ids[j]) * 1000.0).round() as i64;
                let service = if j > 0 {
                    i64::from(eligible[j - 1].service_minutes())
                } else {
                    0
                };
                time_min[i][j] =
                    problem.travel_time(ids[i], ids[j]).round() as i64 + service;
            }
        }

        let mut demand = vec![0i64; n];
        let mut windows = vec![(0i64, HORIZON_MINUTES); n];
        for (i, c) in eligible.iter().enumerate() {
            demand[i + 1] = (c.demand_cbm() * 100.0).round() as i64;
            if let Some(w) = c.window_for_day(Some(day)) {
                let earliest = i64::from(w.earliest().hour()) * 60
                    + i64::from(w.earliest().minute())
                    - shift_minute;
                let latest = i64::from(w.latest().hour()) * 60 + i64::from(w.latest().minute())
                    - shift_minute;
                windows[i + 1] = (earliest.max(0), latest);
            }
        }

        let caps: Vec<i64> = problem
            .vehicles()
            .iter()
            .map(|v| (v.capacity_cbm() * 100.0).round() as i64)
            .collect();
        let compat: Vec<Vec<bool>> = problem
            .vehicles()
            .iter()
            .map(|v| {
                (0..n)
                    .map(|i| i == 0 || v.can_serve(eligible[i - 1].id()))
                    .collect()
            })
            .collect();

        Self {
            customers: eligible,
            dist_m,
            time_min,
            demand,
            caps,
            windows,
            compat,
        }
    }

    /// Number of nodes including the depot.
    pub(crate) fn num_nodes(&self) -> usize {
        self.dist_m.len()
    }

    /// Number of vehicles.
    pub(crate) fn num_vehicles(&self) -> usize {
        self.caps.len()
    }

    /// The customer behind a non-depot node.
    pub(crate) fn customer(&self, node: usize) -> &Arc<Customer> {
        &self.customers[node - 1]
    }

    /// Arc distance in meters.
    pub(crate) fn dist(&self, from: usize, to: usize) -> i64 {
        self.dist_m[from][to]
    }

    /// Forward-propagates the time and capacity dimensions along a route.
    ///
    /// Returns `None` when the sequence is infeasible for the vehicle:
    /// incompatible node, capacity overflow, a wait longer than the slack,
    /// a missed window, or a return past the horizon.
    pub(crate) fn route_schedule(&self, vehicle: usize, seq: &[usize]) -> Option<RouteSchedule> {
        let mut t = 0i64;
        let mut load = 0i64;
        let mut prev = 0usize;
        let mut arrivals = Vec::with_capacity(seq.len());

        for &node in seq {
            if !self.compat[vehicle][node] {
                return None;
            }
            load += self.demand[node];
            if load > self.caps[vehicle] {
                return None;
            }

            let mut arrival = t + self.time_min[prev][node];
            let (earliest, latest) = self.windows[node];
            if arrival < earliest {
                if earliest - arrival > SLACK_MINUTES {
                    return None;
                }
                arrival = earliest;
            }
            if arrival > latest || arrival > HORIZON_MINUTES {
                return None;
            }

            arrivals.push(arrival);
            t = arrival;
            prev = node;
        }

        let end_time = t + self.time_min[prev][0];
        if end_time > HORIZON_MINUTES {
            return None;
        }

        Some(RouteSchedule {
            arrivals,
            end_time,
            load,
        })
    }

    /// Distance of a route in meters, depot to depot.
    pub(crate) fn route_dist(&self, seq: &[usize]) -> i64 {
        if seq.is_empty() {
            return 0;
        }
        let mut total = self.dist_m[0][seq[0]];
        for pair in seq.windows(2) {
            total += self.dist_m[pair[0]][pair[1]];
        }
        total += self.dist_m[seq[seq.len() - 1]][0];
        total
    }

    /// The true objective: arc cost, drop penalties, and the global time
    /// span weighted by [`SPAN_COEFFICIENT`].
    ///
    /// All routes must be feasible for their vehicle.
    pub(crate) fn objective(&self, routes: &[Vec<usize>]) -> i64 {
        let mut total = 0i64;
        let mut span = 0i64;
        let mut visited = 0usize;
        for (v, seq) in routes.iter().enumerate() {
            if seq.is_empty() {
                continue;
            }
            total += self.route_dist(seq);
            let schedule = self
                .route_schedule(v, seq)
                .expect("objective requires feasible routes");
            span = span.max(schedule.end_time);
            visited += seq.len();
        }
        let dropped = (self.num_nodes() - 1 - visited) as i64;
        total + DROP_PENALTY * dropped + SPAN_COEFFICIENT * span
    }
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

    fn build_model() -> CpModel {
        let customers = vec![
            Customer::new("S1", "One", 0.0, 0.0, 2.5)
                .with_window(TimeWindow::parse("08:00", "12:00").expect("valid"))
                .with_service_minutes(30),
            Customer::new("S2", "Two", 0.0, 0.0, 4.0)
                .with_window(TimeWindow::parse("09:00", "17:00").expect("valid"))
                .with_service_minutes(30),
        ];
        let vehicles = vec![Vehicle::new("V1", "Truck", 10.0)];
        let mut km = TravelMatrix::new();
        let mut minutes = TravelMatrix::new();
        for (a, b, d, t) in [
            ("depot", "S1", 10.0, 20.0),
            ("depot", "S2", 8.0, 15.0),
            ("S1", "S2", 3.0, 10.0),
        ] {
            km.insert_symmetric(a, b, d);
            minutes.insert_symmetric(a, b, t);
        }
        let problem =
            ProblemInstance::new(customers, vehicles, km, minutes, "depot").expect("valid");
        let eligible = problem.customers().to_vec();
        CpModel::build(&problem, Weekday::Mon, shift(), eligible)
    }

    #[test]
    fn test_scaling() {
        let m = build_model();
        assert_eq!(m.num_nodes(), 3);
        assert_eq!(m.dist(0, 1), 10_000); // 10 km -> meters
        assert_eq!(m.demand[1], 250); // 2.5 CBM -> centi-CBM
        assert_eq!(m.caps[0], 1000);
        // Arc time folds destination service: 20 travel + 30 service.
        assert_eq!(m.time_min[0][1], 50);
        // Return to depot has no service.
        assert_eq!(m.time_min[1][0], 20);
    }

    #[test]
    fn test_windows_relative_to_shift() {
        let m = build_model();
        // S1 08:00-12:00 with an 08:00 shift: [0, 240].
        assert_eq!(m.windows[1], (0, 240));
        // S2 09:00-17:00: [60, 540].
        assert_eq!(m.windows[2], (60, 540));
        assert_eq!(m.windows[0], (0, HORIZON_MINUTES));
    }

    #[test]
    fn test_route_schedule_feasible() {
        let m = build_model();
        let s = m.route_schedule(0, &[1, 2]).expect("feasible");
        // Node 1: arrive 50 (travel 20 + service 30 folded).
        // Node 2: 50 + 10 + 30 = 90, window opens at 60.
        assert_eq!(s.arrivals, vec![50, 90]);
        assert_eq!(s.end_time, 105);
        assert_eq!(s.load, 650);
    }

    #[test]
    fn test_route_schedule_waits_within_slack() {
        let m = build_model();
        // Going straight to S2: arrive 15 + 30 = 45, window opens at 60.
        // Wait of 15 fits in the 30-minute slack.
        let s = m.route_schedule(0, &[2]).expect("feasible");
        assert_eq!(s.arrivals, vec![60]);
    }

    #[test]
    fn test_route_schedule_rejects_missed_window() {
        let customers = vec![Customer::new("S1", "One", 0.0, 0.0, 2.0)
            .with_window(TimeWindow::parse("08:00", "08:30").expect("valid"))
            .with_service_minutes(10)];
        let vehicles = vec![Vehicle::new("V1", "Truck", 10.0)];
        let mut km = TravelMatrix::new();
        km.insert_symmetric("depot", "S1", 30.0);
        let mut minutes = TravelMatrix::new();
        minutes.insert_symmetric("depot", "S1", 45.0);
        let problem =
            ProblemInstance::new(customers, vehicles, km, minutes, "depot").expect("valid");
        let eligible = problem.customers().to_vec();
        let m = CpModel::build(&problem, Weekday::Mon, shift(), eligible);
        // Arrival 45 + 10 = 55 minutes, window closes at 30.
        assert!(m.route_schedule(0, &[1]).is_none());
    }

    #[test]
    fn test_route_schedule_rejects_overload() {
        let m = build_model();
        // 2.5 + 4.0 + 2.5 + 4.0 = 13 CBM > 10 CBM.
        assert!(m.route_schedule(0, &[1, 2, 1, 2]).is_none());
    }

    #[test]
    fn test_objective_counts_drops_and_span() {
        let m = build_model();
        let all = vec![vec![1, 2]];
        let none: Vec<Vec<usize>> = vec![vec![]];
        let full = m.objective(&all);
        let empty = m.objective(&none);
        // Dropping both customers costs two penalties and saves the span.
        assert_eq!(empty, 2 * DROP_PENALTY);
        assert!(full < empty);
        // dist(0,1)+dist(1,2)+dist(2,0) = 10000+3000+8000 = 21000 meters,
        // span 105 * 100.
        assert_eq!(full, 21_000 + 105 * SPAN_COEFFICIENT);
    }
}
