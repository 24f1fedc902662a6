//! Adaptive Large Neighborhood Search metaheuristic.
//!
//! - [`AlnsSolver`] / [`AlnsConfig`] — the ruin-and-recreate loop with
//!   adaptive operator weights and simulated-annealing acceptance
//! - [`destroy`] — destroy operators (random, worst, Shaw, time-based)
//! - [`repair`] — repair operators (greedy insertion, regret-k insertion)

pub mod destroy;
pub mod repair;
mod solver;

pub use solver::{AlnsConfig, AlnsSolver};

use chrono::NaiveDateTime;

use crate::models::{ProblemInstance, Weekday};

/// Shared read-only context handed to destroy and repair operators.
pub struct AlnsContext<'a> {
    /// The (day-filtered) problem view.
    pub problem: &'a ProblemInstance,
    /// The day being solved.
    pub day: Weekday,
    /// Depot departure timestamp for new routes.
    pub shift_start: NaiveDateTime,
}
