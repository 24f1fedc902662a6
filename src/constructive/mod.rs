//! Constructive heuristics for building initial solutions.

mod clarke_wright;

pub use clarke_wright::{clarke_wright_savings, ClarkeWrightSolver};
