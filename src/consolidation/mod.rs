//! Weekly smart-consolidation planner.

mod planner;

pub use planner::WeeklyPlanner;
