//! # weekroute
//!
//! Multi-day capacitated vehicle routing with time windows, blackout
//! intervals, fleet-customer compatibility, and day exclusions, plus a
//! smart weekly consolidation planner that assigns each customer to one
//! day of the Mon-Fri horizon and solves each day independently.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Customer, Vehicle, Route, Solution,
//!   ProblemInstance, weekday vocabulary)
//! - [`matrix`] — Id-keyed distance and travel-time matrices
//! - [`evaluation`] — Feasibility kernel: scheduling validator, insertion
//!   cost, preflight checks
//! - [`constructive`] — Clarke-Wright savings constructor
//! - [`local_search`] — 2-opt route polish
//! - [`cp`] — Constraint-programming routing solver with guided local
//!   search
//! - [`alns`] — Adaptive Large Neighborhood Search metaheuristic
//! - [`consolidation`] — Weekly consolidation planner
//! - [`error`] — Input-shape errors
//!
//! Solvers are pure functions of their inputs (plus an RNG seed for ALNS):
//! customers, vehicles, and matrices are shared read-only views, while
//! routes and solutions are owned by the producing solver. Nothing aborts
//! mid-solve; infeasibility and unplaceable customers are reported on the
//! returned [`Solution`](models::Solution).

pub mod alns;
pub mod consolidation;
pub mod constructive;
pub mod cp;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod matrix;
pub mod models;
