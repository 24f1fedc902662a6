//! Domain model types for multi-day vehicle routing.
//!
//! Provides the core abstractions: customers with demands, time windows,
//! blackout intervals, and day constraints; vehicles with capacity and
//! fleet restrictions; routes as ordered, scheduled stop sequences; and
//! per-day and weekly solution types.

mod customer;
mod multiday;
mod problem;
mod route;
mod solution;
mod vehicle;
mod weekday;

pub use customer::{Customer, ForbiddenInterval, TimeWindow};
pub use multiday::{ConsolidationStats, MultiDayReport, MultiDaySolution};
pub use problem::{ProblemInstance, SingleDaySolver, DEFAULT_TRAVEL_MINUTES};
pub use route::{Route, RouteStop};
pub use solution::{RouteReport, Solution, SolutionReport, UtilizationStats, Violation};
pub use vehicle::Vehicle;
pub use weekday::Weekday;
