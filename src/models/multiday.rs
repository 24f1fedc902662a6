//! Multi-day solution and consolidation statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use super::solution::{round2, Solution, SolutionReport};
use super::Weekday;

/// Statistics describing how the weekly planner consolidated deliveries.
///
/// In the default one-delivery-per-week model, `optimized_trips` equals the
/// number of assigned customers, so `trip_reduction_percent` reports zero
/// unless a customer is split across multiple days.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidationStats {
    /// Customers considered by the planner.
    pub total_stores: usize,
    /// Customers assigned to a day.
    pub stores_assigned: usize,
    /// Percent of customers with more than one available day.
    pub consolidation_rate_percent: f64,
    /// One trip per customer per week.
    pub baseline_trips: usize,
    /// Total day assignments.
    pub optimized_trips: usize,
    /// Percent reduction of trips vs. baseline.
    pub trip_reduction_percent: f64,
    /// Assigned customer count per weekday.
    pub stores_per_day: BTreeMap<Weekday, usize>,
}

/// Per-day solutions for a full week plus consolidation statistics.
#[derive(Debug, Clone)]
pub struct MultiDaySolution {
    daily: BTreeMap<Weekday, Solution>,
    stats: ConsolidationStats,
}

impl MultiDaySolution {
    /// Creates an empty multi-day solution.
    pub fn new() -> Self {
        Self {
            daily: BTreeMap::new(),
            stats: ConsolidationStats::default(),
        }
    }

    /// Adds the solution for one day.
    pub fn add_day(&mut self, day: Weekday, solution: Solution) {
        self.daily.insert(day, solution);
    }

    /// Sets the consolidation statistics.
    pub fn set_stats(&mut self, stats: ConsolidationStats) {
        self.stats = stats;
    }

    /// Per-day solutions in weekday order.
    pub fn daily(&self) -> &BTreeMap<Weekday, Solution> {
        &self.daily
    }

    /// The solution for a specific day, if that day was planned.
    pub fn day(&self, day: Weekday) -> Option<&Solution> {
        self.daily.get(&day)
    }

    /// Consolidation statistics.
    pub fn stats(&self) -> &ConsolidationStats {
        &self.stats
    }

    /// Total distance across the week in km.
    pub fn total_distance_km(&self) -> f64 {
        self.daily.values().map(|s| s.total_distance_km()).sum()
    }

    /// Total vehicles used across the week.
    pub fn total_vehicles_used(&self) -> usize {
        self.daily.values().map(|s| s.num_vehicles_used()).sum()
    }

    /// Total cost across the week.
    pub fn total_cost(&self) -> f64 {
        self.daily.values().map(|s| s.total_cost()).sum()
    }

    /// Total customers served across the week.
    pub fn total_stores_served(&self) -> usize {
        self.daily.values().map(|s| s.stores_served()).sum()
    }

    /// Emits the serializable weekly report.
    pub fn report(&self) -> MultiDayReport {
        MultiDayReport {
            total_distance_km: round2(self.total_distance_km()),
            total_vehicles_used: self.total_vehicles_used(),
            total_cost: round2(self.total_cost()),
            total_stores_served: self.total_stores_served(),
            daily_breakdown: self
                .daily
                .iter()
                .map(|(day, sol)| (*day, sol.report()))
                .collect(),
            consolidation_stats: self.stats.clone(),
        }
    }
}

impl Default for MultiDaySolution {
    fn default() -> Self {
        Self::new()
    }
}

/// The emitted weekly report shape.
#[derive(Debug, Clone, Serialize)]
pub struct MultiDayReport {
    /// Weekly distance in km, 2 dp.
    pub total_distance_km: f64,
    /// Weekly vehicle-uses.
    pub total_vehicles_used: usize,
    /// Weekly cost, 2 dp.
    pub total_cost: f64,
    /// Weekly customers served.
    pub total_stores_served: usize,
    /// Per-day reports keyed by weekday.
    pub daily_breakdown: BTreeMap<Weekday, SolutionReport>,
    /// Consolidation statistics.
    pub consolidation_stats: ConsolidationStats,
}
