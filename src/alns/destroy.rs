//! Destroy operators for the ruin-and-recreate loop.
//!
//! # Operators
//!
//! - [`RandomRemoval`] — removes uniformly random stops
//! - [`WorstRemoval`] — greedily removes the stops whose removal saves the
//!   most distance
//! - [`ShawRemoval`] — removes stops related to a random seed stop by
//!   distance and demand similarity
//! - [`TimeBasedRemoval`] — reserved operator slot, currently identical to
//!   random removal
//!
//! # Reference
//!
//! Ropke, S. & Pisinger, D. (2006). "An Adaptive Large Neighborhood Search
//! Heuristic for the Pickup and Delivery Problem with Time Windows",
//! *Transportation Science* 40(4), 455-472.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::models::{Customer, Route};

use super::AlnsContext;

/// Removes customers from a solution's routes into a removal pool.
pub trait DestroyOperator: Send + Sync {
    /// Operator name for weight tracking and logs.
    fn name(&self) -> &'static str;

    /// Removes up to `count` customers from `routes`, returning the pool.
    fn destroy(
        &self,
        routes: &mut Vec<Route>,
        count: usize,
        ctx: &AlnsContext<'_>,
        rng: &mut StdRng,
    ) -> Vec<Arc<Customer>>;
}

fn total_stops(routes: &[Route]) -> usize {
    routes.iter().map(|r| r.len()).sum()
}

/// Removes a customer picked uniformly over all stops, `count` times.
pub struct RandomRemoval;

fn remove_random(routes: &mut [Route], count: usize, rng: &mut StdRng) -> Vec<Arc<Customer>> {
    let mut removed = Vec::with_capacity(count);
    for _ in 0..count {
        let assigned = total_stops(routes);
        if assigned == 0 {
            break;
        }
        let target = rng.random_range(0..assigned as u64) as usize;
        let mut seen = 0;
        for route in routes.iter_mut() {
            if seen + route.len() > target {
                removed.push(route.remove_stop_at(target - seen));
                break;
            }
            seen += route.len();
        }
    }
    removed
}

impl DestroyOperator for RandomRemoval {
    fn name(&self) -> &'static str {
        "random"
    }

    fn destroy(
        &self,
        routes: &mut Vec<Route>,
        count: usize,
        _ctx: &AlnsContext<'_>,
        rng: &mut StdRng,
    ) -> Vec<Arc<Customer>> {
        remove_random(routes, count, rng)
    }
}

/// Greedily removes the stop with the largest distance saving, re-scanning
/// after each removal.
pub struct WorstRemoval;

impl WorstRemoval {
    /// Distance saved by removing the stop at `pos`: the two edges through
    /// it are replaced by one bypass edge.
    fn removal_saving(route: &Route, pos: usize, ctx: &AlnsContext<'_>) -> f64 {
        let depot = ctx.problem.depot_id();
        let stops = route.stops();
        let cid = stops[pos].customer.id();
        let prev = if pos == 0 {
            depot
        } else {
            stops[pos - 1].customer.id()
        };
        let next = if pos == stops.len() - 1 {
            depot
        } else {
            stops[pos + 1].customer.id()
        };
        if prev == next {
            // Only stop on the route: the whole loop disappears.
            return ctx.problem.distance(prev, cid) + ctx.problem.distance(cid, prev);
        }
        ctx.problem.distance(prev, cid) + ctx.problem.distance(cid, next)
            - ctx.problem.distance(prev, next)
    }
}

impl DestroyOperator for WorstRemoval {
    fn name(&self) -> &'static str {
        "worst"
    }

    fn destroy(
        &self,
        routes: &mut Vec<Route>,
        count: usize,
        ctx: &AlnsContext<'_>,
        _rng: &mut StdRng,
    ) -> Vec<Arc<Customer>> {
        let mut removed = Vec::with_capacity(count);
        for _ in 0..count {
            let mut best: Option<(usize, usize, f64)> = None;
            for (ri, route) in routes.iter().enumerate() {
                for pos in 0..route.len() {
                    let saving = Self::removal_saving(route, pos, ctx);
                    // Strict comparison keeps the first maximum, so ties
                    // resolve by scan order.
                    if best.is_none_or(|(_, _, b)| saving > b) {
                        best = Some((ri, pos, saving));
                    }
                }
            }
            match best {
                Some((ri, pos, _)) => removed.push(routes[ri].remove_stop_at(pos)),
                None => break,
            }
        }
        removed
    }
}

/// Removes stops similar to a random seed stop.
///
/// Similarity is `d(a, b) + 10 × |demand_a − demand_b|`; lower is more
/// similar. The seed itself (similarity zero) is always removed first.
pub struct ShawRemoval;

impl DestroyOperator for ShawRemoval {
    fn name(&self) -> &'static str {
        "shaw"
    }

    fn destroy(
        &self,
        routes: &mut Vec<Route>,
        count: usize,
        ctx: &AlnsContext<'_>,
        rng: &mut StdRng,
    ) -> Vec<Arc<Customer>> {
        let assigned = total_stops(routes);
        if assigned == 0 {
            return Vec::new();
        }

        let seed_target = rng.random_range(0..assigned as u64) as usize;
        let mut seen = 0;
        let mut seed: Option<Arc<Customer>> = None;
        for route in routes.iter() {
            if seen + route.len() > seed_target {
                seed = Some(Arc::clone(&route.stops()[seed_target - seen].customer));
                break;
            }
            seen += route.len();
        }
        let seed = seed.expect("seed index within assigned stops");

        let mut scored: Vec<(f64, String)> = Vec::with_capacity(assigned);
        for route in routes.iter() {
            for stop in route.stops() {
                let c = &stop.customer;
                let similarity = if c.id() == seed.id() {
                    0.0
                } else {
                    ctx.problem.distance(seed.id(), c.id())
                        + 10.0 * (seed.demand_cbm() - c.demand_cbm()).abs()
                };
                scored.push((similarity, c.id().to_string()));
            }
        }
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("similarity is not NaN"));

        let mut removed = Vec::with_capacity(count);
        for (_, cid) in scored.into_iter().take(count) {
            for route in routes.iter_mut() {
                if let Some(pos) = route.stops().iter().position(|s| s.customer.id() == cid) {
                    removed.push(route.remove_stop_at(pos));
                    break;
                }
            }
        }
        removed
    }
}

/// Reserved time-based operator slot.
///
/// TODO: cluster removals by window-center proximity instead of delegating
/// to random removal.
pub struct TimeBasedRemoval;

impl DestroyOperator for TimeBasedRemoval {
    fn name(&self) -> &'static str {
        "time_based"
    }

    fn destroy(
        &self,
        routes: &mut Vec<Route>,
        count: usize,
        _ctx: &AlnsContext<'_>,
        rng: &mut StdRng,
    ) -> Vec<Arc<Customer>> {
        remove_random(routes, count, rng)
    }
}
