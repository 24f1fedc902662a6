//! Single-day solution, violations, and the emitted report shape.

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

use super::{Route, Weekday};

/// A constraint violation found by the feasibility kernel.
///
/// Violations are not errors: a solve always completes, attaching the
/// violations it found to the returned [`Solution`]. The `Display` form is
/// the human-readable string emitted in reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// Route load exceeds vehicle capacity.
    #[error("capacity exceeded on vehicle {vehicle_id}: {load_cbm:.2} CBM > {capacity_cbm:.2} CBM")]
    CapacityExceeded {
        /// Vehicle id.
        vehicle_id: String,
        /// Load on the route.
        load_cbm: f64,
        /// Vehicle capacity.
        capacity_cbm: f64,
    },

    /// Arrival after the applicable window closed.
    #[error("customer {customer_id} time window violation: arrival {arrival} after window close {latest}")]
    TimeWindowMissed {
        /// Customer id.
        customer_id: String,
        /// Scheduled arrival time-of-day.
        arrival: NaiveTime,
        /// Window close.
        latest: NaiveTime,
    },

    /// Arrival inside a blackout interval.
    #[error("customer {customer_id} blackout conflict: arrival {arrival} within {start}-{end} ({reason})")]
    BlackoutConflict {
        /// Customer id.
        customer_id: String,
        /// Scheduled arrival time-of-day.
        arrival: NaiveTime,
        /// Blackout start.
        start: NaiveTime,
        /// Blackout end.
        end: NaiveTime,
        /// Blackout reason label.
        reason: String,
    },

    /// Fleet restrictions forbid the vehicle from serving the customer.
    #[error("vehicle {vehicle_id} cannot serve customer {customer_id} (fleet restriction)")]
    FleetIncompatible {
        /// Vehicle id.
        vehicle_id: String,
        /// Customer id.
        customer_id: String,
    },

    /// The route's day is on the customer's excluded list.
    #[error("customer {customer_id} cannot be served on {day} (day excluded)")]
    DayExcluded {
        /// Customer id.
        customer_id: String,
        /// The excluded day.
        day: Weekday,
    },

    /// Route duration exceeds the vehicle's maximum.
    #[error("route duration {duration_minutes:.0} min exceeds maximum {max_minutes:.0} min")]
    MaxDurationExceeded {
        /// Scheduled duration.
        duration_minutes: f64,
        /// Vehicle maximum in minutes.
        max_minutes: f64,
    },
}

/// Rounds to two decimal places for report emission.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Utilization spread across a solution's routes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtilizationStats {
    /// Lowest route utilization percent.
    pub min: f64,
    /// Highest route utilization percent.
    pub max: f64,
    /// Mean route utilization percent.
    pub avg: f64,
    /// Population standard deviation of route utilizations.
    pub std: f64,
}

/// A complete solution for one weekday.
///
/// Owns its routes; customers and vehicles are shared immutable records.
/// Solvers never abort: anything unplaceable lands in `unserved`, and
/// infeasibility is reported through `violations` and the feasibility flag.
#[derive(Debug, Clone)]
pub struct Solution {
    routes: Vec<Route>,
    day: Weekday,
    unserved: Vec<String>,
    total_distance_km: f64,
    total_duration_hours: f64,
    total_cost: f64,
    num_vehicles_used: usize,
    is_feasible: bool,
    violations: Vec<Violation>,
}

impl Solution {
    /// Creates an empty solution for the given day.
    pub fn new(day: Weekday) -> Self {
        Self {
            routes: Vec::new(),
            day,
            unserved: Vec::new(),
            total_distance_km: 0.0,
            total_duration_hours: 0.0,
            total_cost: 0.0,
            num_vehicles_used: 0,
            is_feasible: true,
            violations: Vec::new(),
        }
    }

    /// Adds a route.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Marks a customer as unserved.
    pub fn add_unserved(&mut self, customer_id: impl Into<String>) {
        self.unserved.push(customer_id.into());
    }

    /// Records a violation and clears the feasibility flag.
    pub fn add_violation(&mut self, violation: Violation) {
        self.is_feasible = false;
        self.violations.push(violation);
    }

    /// Overrides the feasibility flag.
    ///
    /// Used when a solver gives up without a solution: the returned empty
    /// solution is marked infeasible even though no single route violated a
    /// constraint.
    pub fn set_feasible(&mut self, feasible: bool) {
        self.is_feasible = feasible;
    }

    /// Recomputes the aggregated metrics from the current routes.
    pub fn compute_metrics(&mut self) {
        self.num_vehicles_used = self.routes.len();
        self.total_distance_km = self.routes.iter().map(|r| r.total_distance_km()).sum();
        self.total_duration_hours = self
            .routes
            .iter()
            .map(|r| r.total_duration_minutes())
            .sum::<f64>()
            / 60.0;
        self.total_cost = self.routes.iter().map(|r| r.cost()).sum();
    }

    /// The routes of this solution.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Mutable access to the routes.
    pub fn routes_mut(&mut self) -> &mut Vec<Route> {
        &mut self.routes
    }

    /// The day this solution is for.
    pub fn day(&self) -> Weekday {
        self.day
    }

    /// Ids of unserved customers.
    pub fn unserved(&self) -> &[String] {
        &self.unserved
    }

    /// Total distance across routes in km.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Total duration across routes in hours.
    pub fn total_duration_hours(&self) -> f64 {
        self.total_duration_hours
    }

    /// Total cost across routes.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Number of vehicles used (= number of routes).
    pub fn num_vehicles_used(&self) -> usize {
        self.num_vehicles_used
    }

    /// Returns `true` if no constraint violations were found.
    pub fn is_feasible(&self) -> bool {
        self.is_feasible
    }

    /// The violations found by the kernel.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Number of customers served across all routes.
    pub fn stores_served(&self) -> usize {
        self.routes.iter().map(|r| r.len()).sum()
    }

    /// Mean capacity utilization percent across routes.
    pub fn average_utilization(&self) -> f64 {
        if self.routes.is_empty() {
            return 0.0;
        }
        self.routes.iter().map(|r| r.utilization()).sum::<f64>() / self.routes.len() as f64
    }

    /// Utilization min/max/avg/std across routes.
    pub fn utilization_stats(&self) -> UtilizationStats {
        if self.routes.is_empty() {
            return UtilizationStats {
                min: 0.0,
                max: 0.0,
                avg: 0.0,
                std: 0.0,
            };
        }
        let utils: Vec<f64> = self.routes.iter().map(|r| r.utilization()).collect();
        let avg = utils.iter().sum::<f64>() / utils.len() as f64;
        let var = utils.iter().map(|u| (u - avg).powi(2)).sum::<f64>() / utils.len() as f64;
        UtilizationStats {
            min: utils.iter().copied().fold(f64::INFINITY, f64::min),
            max: utils.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg,
            std: var.sqrt(),
        }
    }

    /// Emits the serializable report shape.
    pub fn report(&self) -> SolutionReport {
        SolutionReport {
            day: self.day,
            is_feasible: self.is_feasible,
            num_vehicles_used: self.num_vehicles_used,
            total_distance_km: round2(self.total_distance_km),
            total_duration_hours: round2(self.total_duration_hours),
            total_cost: round2(self.total_cost),
            average_utilization: round2(self.average_utilization()),
            stores_served: self.stores_served(),
            unserved_stores: self.unserved.clone(),
            constraint_violations: self.violations.iter().map(|v| v.to_string()).collect(),
            routes: self
                .routes
                .iter()
                .map(|r| RouteReport {
                    vehicle_id: r.vehicle().id().to_string(),
                    vehicle_name: r.vehicle().name().to_string(),
                    stops: r.customer_ids(),
                    distance_km: round2(r.total_distance_km()),
                    duration_minutes: round2(r.total_duration_minutes()),
                    load_cbm: round2(r.total_load_cbm()),
                    capacity_cbm: r.vehicle().capacity_cbm(),
                    utilization: round2(r.utilization()),
                })
                .collect(),
        }
    }
}

/// The emitted per-day solution shape.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    /// Weekday this solution is for.
    pub day: Weekday,
    /// Whether all constraints hold.
    pub is_feasible: bool,
    /// Number of vehicles used.
    pub num_vehicles_used: usize,
    /// Total distance in km, 2 dp.
    pub total_distance_km: f64,
    /// Total duration in hours, 2 dp.
    pub total_duration_hours: f64,
    /// Total cost, 2 dp.
    pub total_cost: f64,
    /// Mean utilization percent, 2 dp.
    pub average_utilization: f64,
    /// Customers served.
    pub stores_served: usize,
    /// Ids of unserved customers.
    pub unserved_stores: Vec<String>,
    /// Human-readable violation strings.
    pub constraint_violations: Vec<String>,
    /// Per-route breakdown.
    pub routes: Vec<RouteReport>,
}

/// The emitted per-route shape.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    /// Vehicle id.
    pub vehicle_id: String,
    /// Vehicle display name.
    pub vehicle_name: String,
    /// Customer ids in visit order.
    pub stops: Vec<String>,
    /// Route distance in km, 2 dp.
    pub distance_km: f64,
    /// Route duration in minutes, 2 dp.
    pub duration_minutes: f64,
    /// Route load in CBM, 2 dp.
    pub load_cbm: f64,
    /// Vehicle capacity in CBM.
    pub capacity_cbm: f64,
    /// Utilization percent, 2 dp.
    pub utilization: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Vehicle};
    use std::sync::Arc;

    fn route_with(demand: f64, distance: f64) -> Route {
        let v = Arc::new(Vehicle::new("V1", "Truck", 10.0));
        let mut r = Route::new(v, Some(Weekday::Mon));
        r.add_stop(Arc::new(Customer::new("S1", "Store", 0.0, 0.0, demand)));
        r.set_total_distance_km(distance);
        r.set_total_duration_minutes(distance * 2.0);
        r
    }

    #[test]
    fn test_empty_solution() {
        let s = Solution::new(Weekday::Tue);
        assert!(s.is_feasible());
        assert_eq!(s.stores_served(), 0);
        assert_eq!(s.average_utilization(), 0.0);
        assert_eq!(s.day(), Weekday::Tue);
    }

    #[test]
    fn test_compute_metrics() {
        let mut s = Solution::new(Weekday::Mon);
        s.add_route(route_with(5.0, 20.0));
        s.add_route(route_with(8.0, 30.0));
        s.compute_metrics();
        assert_eq!(s.num_vehicles_used(), 2);
        assert!((s.total_distance_km() - 50.0).abs() < 1e-10);
        // (40 + 60) minutes = 100 min
        assert!((s.total_duration_hours() - 100.0 / 60.0).abs() < 1e-10);
        // Cost: 2 * 1000 fixed + 2/km * 50 km
        assert!((s.total_cost() - 2100.0).abs() < 1e-10);
    }

    #[test]
    fn test_violation_clears_feasibility() {
        let mut s = Solution::new(Weekday::Mon);
        assert!(s.is_feasible());
        s.add_violation(Violation::CapacityExceeded {
            vehicle_id: "V1".to_string(),
            load_cbm: 12.0,
            capacity_cbm: 10.0,
        });
        assert!(!s.is_feasible());
        assert_eq!(s.violations().len(), 1);
    }

    #[test]
    fn test_violation_message() {
        let v = Violation::DayExcluded {
            customer_id: "S1".to_string(),
            day: Weekday::Mon,
        };
        assert_eq!(
            v.to_string(),
            "customer S1 cannot be served on Mon (day excluded)"
        );
    }

    #[test]
    fn test_utilization_stats() {
        let mut s = Solution::new(Weekday::Mon);
        s.add_route(route_with(5.0, 10.0)); // 50%
        s.add_route(route_with(10.0, 10.0)); // 100%
        let stats = s.utilization_stats();
        assert!((stats.min - 50.0).abs() < 1e-10);
        assert!((stats.max - 100.0).abs() < 1e-10);
        assert!((stats.avg - 75.0).abs() < 1e-10);
        assert!((stats.std - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_report_shape() {
        let mut s = Solution::new(Weekday::Mon);
        s.add_route(route_with(5.0, 20.556));
        s.add_unserved("S9");
        s.compute_metrics();
        let report = s.report();
        assert_eq!(report.day, Weekday::Mon);
        assert_eq!(report.total_distance_km, 20.56);
        assert_eq!(report.unserved_stores, vec!["S9"]);
        assert_eq!(report.routes.len(), 1);
        assert_eq!(report.routes[0].stops, vec!["S1"]);

        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["day"], "Mon");
        assert_eq!(json["routes"][0]["vehicle_id"], "V1");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005), 1.0); // float representation of 1.005 rounds down
        assert_eq!(round2(2.675_4), 2.68);
        assert_eq!(round2(-1.119), -1.12);
    }
}
