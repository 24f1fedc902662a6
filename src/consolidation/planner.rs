//! Day assignment and per-day delegation across the Mon-Fri horizon.
//!
//! # Strategy
//!
//! Customers are handled in demand-descending order. An order close to a
//! full vehicle (demand / largest capacity at or above the consolidation
//! threshold) is placed on its best single day; smaller orders are steered
//! toward days where they consolidate with already-assigned neighbors.
//! Each non-empty day is then solved independently by the supplied
//! single-day solver; per-day solves touch disjoint state, so they run in
//! parallel.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::{
    ConsolidationStats, Customer, MultiDaySolution, ProblemInstance, SingleDaySolver, Weekday,
};

/// Day-load rejection score for days that would overflow the whole fleet.
const OVERFLOW_SCORE: f64 = -10_000.0;
/// Clustering radius in km for the consolidation proximity bonus.
const CLUSTER_RADIUS_KM: f64 = 10.0;

/// Plans a week of deliveries: assigns each customer to one weekday, then
/// delegates each day to a single-day solver.
///
/// # Examples
///
/// ```
/// use weekroute::consolidation::WeeklyPlanner;
///
/// let planner = WeeklyPlanner::new().with_threshold(60.0);
/// ```
pub struct WeeklyPlanner {
    consolidation_threshold: f64,
}

impl WeeklyPlanner {
    /// Creates a planner with the default 70% consolidation threshold.
    pub fn new() -> Self {
        Self {
            consolidation_threshold: 70.0,
        }
    }

    /// Sets the consolidation threshold in percent of the largest vehicle
    /// capacity.
    pub fn with_threshold(mut self, percent: f64) -> Self {
        self.consolidation_threshold = percent;
        self
    }

    /// Optimizes the whole week.
    ///
    /// `week_start` is Monday's depot departure; each later weekday departs
    /// one calendar day further on. Days with no assigned customers are
    /// skipped entirely.
    pub fn optimize_week(
        &self,
        problem: &ProblemInstance,
        solver: &dyn SingleDaySolver,
        week_start: NaiveDateTime,
    ) -> MultiDaySolution {
        let assignments = self.assign_days(problem);

        let stats = self.consolidation_stats(problem, &assignments);
        info!(
            total = stats.total_stores,
            assigned = stats.stores_assigned,
            "weekly day assignment done"
        );

        let work: Vec<(Weekday, Vec<Arc<Customer>>)> = assignments
            .into_iter()
            .filter(|(_, customers)| !customers.is_empty())
            .collect();

        let solved: Vec<(Weekday, crate::models::Solution)> = work
            .into_par_iter()
            .map(|(day, customers)| {
                let sub = problem.with_customers(customers);
                let start =
                    week_start + TimeDelta::days(day.offset_from_monday() as i64);
                (day, solver.solve_day(&sub, day, start))
            })
            .collect();

        let mut week = MultiDaySolution::new();
        for (day, solution) in solved {
            week.add_day(day, solution);
        }
        week.set_stats(stats);
        week
    }

    /// Assigns every assignable customer to one weekday.
    fn assign_days(&self, problem: &ProblemInstance) -> BTreeMap<Weekday, Vec<Arc<Customer>>> {
        let mut assignments: BTreeMap<Weekday, Vec<Arc<Customer>>> = Weekday::ALL
            .iter()
            .map(|d| (*d, Vec::new()))
            .collect();
        let mut day_loads: BTreeMap<Weekday, f64> =
            Weekday::ALL.iter().map(|d| (*d, 0.0)).collect();

        let Some(max_capacity) = problem
            .vehicles()
            .iter()
            .map(|v| v.capacity_cbm())
            .max_by(|a, b| a.partial_cmp(b).expect("capacity is not NaN"))
        else {
            return assignments;
        };
        let fleet_size = problem.vehicles().len();

        // Largest orders claim their day first.
        let mut ordered: Vec<Arc<Customer>> = problem.customers().to_vec();
        ordered.sort_by(|a, b| {
            b.demand_cbm()
                .partial_cmp(&a.demand_cbm())
                .expect("demand is not NaN")
        });

        for customer in ordered {
            let available: Vec<Weekday> = Weekday::ALL
                .iter()
                .copied()
                .filter(|d| customer.is_day_allowed(*d))
                .collect();
            if available.is_empty() {
                continue;
            }

            let demand_percent = customer.demand_cbm() / max_capacity * 100.0;
            let day = if demand_percent >= self.consolidation_threshold {
                self.best_single_day(&customer, &available, &day_loads)
            } else {
                self.best_consolidation_day(
                    problem,
                    &customer,
                    &available,
                    &day_loads,
                    &assignments,
                    max_capacity,
                    fleet_size,
                )
            };

            debug!(customer = customer.id(), day = %day, demand_percent, "assigned");
            *day_loads.get_mut(&day).expect("all weekdays present") += customer.demand_cbm();
            assignments
                .get_mut(&day)
                .expect("all weekdays present")
                .push(customer);
        }

        assignments
    }

    /// Best day for an order large enough to dominate a vehicle: balance
    /// day loads, honor preferences, favor roomy windows.
    fn best_single_day(
        &self,
        customer: &Customer,
        available: &[Weekday],
        day_loads: &BTreeMap<Weekday, f64>,
    ) -> Weekday {
        let mut best = available[0];
        let mut best_score = f64::NEG_INFINITY;
        for &day in available {
            let mut score = 1000.0 - day_loads[&day];
            if customer.preferred_days().contains(&day) {
                score += 500.0;
            }
            if let Some(window) = customer.window_for_day(Some(day)) {
                score += window.duration_minutes() as f64;
            }
            if score > best_score {
                best_score = score;
                best = day;
            }
        }
        best
    }

    /// Best day for a small order: join days that already carry load, stay
    /// under fleet-wide capacity, honor preferences, cluster with nearby
    /// assigned customers.
    #[allow(clippy::too_many_arguments)]
    fn best_consolidation_day(
        &self,
        problem: &ProblemInstance,
        customer: &Customer,
        available: &[Weekday],
        day_loads: &BTreeMap<Weekday, f64>,
        assignments: &BTreeMap<Weekday, Vec<Arc<Customer>>>,
        max_capacity: f64,
        fleet_size: usize,
    ) -> Weekday {
        let fleet_capacity = max_capacity * fleet_size as f64;
        let mut best = available[0];
        let mut best_score = f64::NEG_INFINITY;

        for &day in available {
            let load = day_loads[&day];
            let score = if load + customer.demand_cbm() > fleet_capacity {
                OVERFLOW_SCORE
            } else {
                let mut score = 0.0;
                if load > 0.0 {
                    score += 200.0;
                }
                if load / fleet_capacity < 0.7 {
                    score += 300.0;
                }
                if customer.preferred_days().contains(&day) {
                    score += 500.0;
                }
                let nearby = assignments[&day].iter().any(|other| {
                    problem.distance(customer.id(), other.id()) < CLUSTER_RADIUS_KM
                });
                if nearby {
                    score += 400.0;
                }
                score
            };

            if score > best_score {
                best_score = score;
                best = day;
            }
        }
        best
    }

    /// Consolidation statistics over the final assignment.
    fn consolidation_stats(
        &self,
        problem: &ProblemInstance,
        assignments: &BTreeMap<Weekday, Vec<Arc<Customer>>>,
    ) -> ConsolidationStats {
        let total_stores = problem.customers().len();
        let stores_assigned: usize = assignments.values().map(|v| v.len()).sum();

        let consolidatable = problem
            .customers()
            .iter()
            .filter(|c| {
                Weekday::ALL
                    .iter()
                    .filter(|d| c.is_day_allowed(**d))
                    .count()
                    > 1
            })
            .count();
        let consolidation_rate_percent = if total_stores > 0 {
            consolidatable as f64 / total_stores as f64 * 100.0
        } else {
            0.0
        };

        // One delivery per customer per week: the trip counts only diverge
        // once a customer can be split across days.
        let baseline_trips = total_stores;
        let optimized_trips = stores_assigned;
        let trip_reduction_percent = if baseline_trips > 0 {
            (baseline_trips as f64 - optimized_trips as f64) / baseline_trips as f64 * 100.0
        } else {
            0.0
        };

        ConsolidationStats {
            total_stores,
            stores_assigned,
            consolidation_rate_percent: (consolidation_rate_percent * 100.0).round() / 100.0,
            baseline_trips,
            optimized_trips,
            trip_reduction_percent: (trip_reduction_percent * 100.0).round() / 100.0,
            stores_per_day: assignments
                .iter()
                .map(|(day, customers)| (*day, customers.len()))
                .collect(),
        }
    }
}

impl Default for WeeklyPlanner {
    fn default() -> Self {
        Self::new()
    }
}
