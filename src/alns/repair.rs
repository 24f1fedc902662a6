//! Repair operators: reinsertion of removed customers.
//!
//! # Operators
//!
//! - [`GreedyInsertion`] — each pool customer in order goes to its cheapest
//!   feasible position
//! - [`RegretInsertion`] — the customer with the most to lose from being
//!   postponed (largest gap between its k-th best and best insertion cost)
//!   goes first
//!
//! Both fall back to opening a fresh route with the first compatible
//! vehicle, and drop the customer when no vehicle takes it.
//!
//! # Reference
//!
//! Ropke, S. & Pisinger, D. (2006). "An Adaptive Large Neighborhood Search
//! Heuristic for the Pickup and Delivery Problem with Time Windows",
//! *Transportation Science* 40(4), 455-472.

use std::sync::Arc;

use crate::evaluation::{can_add, insertion_cost};
use crate::models::{Customer, Route};

use super::AlnsContext;

/// Reinserts pool customers into the punctured route set.
pub trait RepairOperator: Send + Sync {
    /// Operator name for weight tracking and logs.
    fn name(&self) -> &'static str;

    /// Inserts the pool back into `routes`, returning ids it had to drop.
    fn repair(
        &self,
        routes: &mut Vec<Route>,
        pool: Vec<Arc<Customer>>,
        ctx: &AlnsContext<'_>,
    ) -> Vec<String>;
}

/// Opens a new route for the customer, or reports it dropped.
fn open_route_or_drop(
    routes: &mut Vec<Route>,
    customer: Arc<Customer>,
    ctx: &AlnsContext<'_>,
    dropped: &mut Vec<String>,
) {
    match ctx.problem.first_compatible_vehicle(&customer) {
        Some(vehicle) => {
            let mut route = Route::new(Arc::clone(vehicle), Some(ctx.day))
                .with_departure(ctx.shift_start);
            route.add_stop(customer);
            routes.push(route);
        }
        None => dropped.push(customer.id().to_string()),
    }
}

/// All feasible `(cost, route, position)` insertions for a customer,
/// cheapest first (stable order on ties).
fn sorted_insertions(
    routes: &[Route],
    customer: &Customer,
    ctx: &AlnsContext<'_>,
) -> Vec<(f64, usize, usize)> {
    let mut costs = Vec::new();
    for (ri, route) in routes.iter().enumerate() {
        if can_add(route, customer, ctx.day).is_err() {
            continue;
        }
        for pos in 0..=route.len() {
            costs.push((insertion_cost(route, customer, pos, ctx.problem), ri, pos));
        }
    }
    costs.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("insertion cost is not NaN"));
    costs
}

/// Inserts each pool customer, in pool order, at its cheapest feasible
/// position across all existing routes.
pub struct GreedyInsertion;

impl RepairOperator for GreedyInsertion {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn repair(
        &self,
        routes: &mut Vec<Route>,
        pool: Vec<Arc<Customer>>,
        ctx: &AlnsContext<'_>,
    ) -> Vec<String> {
        let mut dropped = Vec::new();
        for customer in pool {
            let mut best: Option<(f64, usize, usize)> = None;
            for (ri, route) in routes.iter().enumerate() {
                if can_add(route, &customer, ctx.day).is_err() {
                    continue;
                }
                for pos in 0..=route.len() {
                    let cost = insertion_cost(route, &customer, pos, ctx.problem);
                    if best.is_none_or(|(b, _, _)| cost < b) {
                        best = Some((cost, ri, pos));
                    }
                }
            }
            match best {
                Some((_, ri, pos)) => routes[ri].insert_stop(pos, customer),
                None => open_route_or_drop(routes, customer, ctx, &mut dropped),
            }
        }
        dropped
    }
}

/// Regret-k insertion.
///
/// Each round picks the pool customer with the largest regret (the cost
/// gap between its k-th best and best feasible insertion) and places it at
/// its best position. Ties break on the lower best cost, then on pool
/// order. When no customer has k feasible positions left, the head of the
/// pool falls back to a fresh route (or is dropped).
pub struct RegretInsertion {
    k: usize,
}

impl RegretInsertion {
    /// Creates a regret-k operator; `k` is clamped to at least 2.
    pub fn new(k: usize) -> Self {
        Self { k: k.max(2) }
    }
}

impl RepairOperator for RegretInsertion {
    fn name(&self) -> &'static str {
        match self.k {
            2 => "regret2",
            3 => "regret3",
            _ => "regret_k",
        }
    }

    fn repair(
        &self,
        routes: &mut Vec<Route>,
        pool: Vec<Arc<Customer>>,
        ctx: &AlnsContext<'_>,
    ) -> Vec<String> {
        let mut pool = pool;
        let mut dropped = Vec::new();

        while !pool.is_empty() {
            let mut best: Option<(usize, usize, usize, f64, f64)> = None; // (pool, route, pos, best_cost, regret)

            for (pi, customer) in pool.iter().enumerate() {
                let costs = sorted_insertions(routes, customer, ctx);
                if costs.len() < self.k {
                    continue;
                }
                let best_cost = costs[0].0;
                let regret = costs[self.k - 1].0 - best_cost;
                let wins = match &best {
                    None => true,
                    Some((_, _, _, incumbent_cost, incumbent_regret)) => {
                        regret > *incumbent_regret
                            || (regret == *incumbent_regret && best_cost < *incumbent_cost)
                    }
                };
                if wins {
                    best = Some((pi, costs[0].1, costs[0].2, best_cost, regret));
                }
            }

            match best {
                Some((pi, ri, pos, _, _)) => {
                    let customer = pool.remove(pi);
                    routes[ri].insert_stop(pos, customer);
                }
                None => {
                    let customer = pool.remove(0);
                    open_route_or_drop(routes, customer, ctx, &mut dropped);
                }
            }
        }

        dropped
    }
}
