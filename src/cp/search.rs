//! Guided local search over the integer routing model.
//!
//! # Search
//!
//! A cheapest-arc path constructor builds the first solution, then a guided
//! local search loop runs until the wall-clock budget expires: the current
//! solution is improved by first-improvement moves (reinsert dropped,
//! relocate, intra-route 2-opt, inter-route exchange) over an *augmented*
//! objective that adds penalties on arc features. At a local optimum the
//! arcs with the highest utility `dist / (1 + penalty)` are penalized,
//! deforming the landscape so the search escapes without randomness; the
//! whole solver is deterministic.
//!
//! # Reference
//!
//! Voudouris, C. & Tsang, E. (1999). "Guided local search and its
//! application to the traveling salesman problem", *European Journal of
//! Operational Research* 113(2), 469-499.

use std::time::{Duration, Instant};

use tracing::debug;

use super::model::CpModel;

/// Penalization rounds without a new best before the search gives up early.
const MAX_STALE_ROUNDS: usize = 200;

/// Best-found routes, one sequence per vehicle (possibly empty).
pub(crate) struct CpSearchResult {
    pub routes: Vec<Vec<usize>>,
}

struct Penalties {
    counts: Vec<Vec<i64>>,
    lambda: i64,
}

impl Penalties {
    fn new(n: usize) -> Self {
        Self {
            counts: vec![vec![0i64; n]; n],
            lambda: 0,
        }
    }

    fn of_route(&self, seq: &[usize]) -> i64 {
        if seq.is_empty() {
            return 0;
        }
        let mut total = self.counts[0][seq[0]];
        for pair in seq.windows(2) {
            total += self.counts[pair[0]][pair[1]];
        }
        total += self.counts[seq[seq.len() - 1]][0];
        total
    }

    fn of(&self, routes: &[Vec<usize>]) -> i64 {
        routes.iter().map(|seq| self.of_route(seq)).sum()
    }
}

/// Runs guided local search within the time budget.
///
/// Returns `None` only when the budget is zero; otherwise at least the
/// constructed first solution is returned.
pub(crate) fn solve(model: &CpModel, time_limit: Duration) -> Option<CpSearchResult> {
    if time_limit.is_zero() {
        return None;
    }
    let deadline = Instant::now() + time_limit;

    let mut current = cheapest_arc_paths(model);
    let mut penalties = Penalties::new(model.num_nodes());

    let mut best = current.clone();
    let mut best_cost = model.objective(&best);
    debug!(best_cost, "cp first solution constructed");

    let mut stale_rounds = 0usize;
    while Instant::now() < deadline && stale_rounds < MAX_STALE_ROUNDS {
        if improve_once(model, &penalties, &mut current) {
            let cost = model.objective(&current);
            if cost < best_cost {
                best = current.clone();
                best_cost = cost;
                stale_rounds = 0;
            }
        } else {
            if penalties.lambda == 0 {
                // Standard GLS scaling: a fraction of the local optimum's
                // cost per used arc.
                let arcs: usize = current.iter().map(|r| r.len() + 1).sum();
                penalties.lambda = (model.objective(&current) / (10 * arcs.max(1) as i64)).max(1);
            }
            penalize(model, &mut penalties, &current);
            stale_rounds += 1;
        }
    }

    debug!(best_cost, stale_rounds, "cp search finished");
    Some(CpSearchResult { routes: best })
}

/// First solution: for each vehicle in order, repeatedly follow the
/// cheapest feasible arc from the current node. Lower node index wins ties.
fn cheapest_arc_paths(model: &CpModel) -> Vec<Vec<usize>> {
    let n = model.num_nodes();
    let mut visited = vec![false; n];
    let mut routes = Vec::with_capacity(model.num_vehicles());

    for v in 0..model.num_vehicles() {
        let mut seq: Vec<usize> = Vec::new();
        loop {
            let current = *seq.last().unwrap_or(&0);
            let mut chosen: Option<(usize, i64)> = None;
            for node in 1..n {
                if visited[node] {
                    continue;
                }
                let mut candidate = seq.clone();
                candidate.push(node);
                if model.route_schedule(v, &candidate).is_none() {
                    continue;
                }
                let d = model.dist(current, node);
                if chosen.is_none_or(|(_, best_d)| d < best_d) {
                    chosen = Some((node, d));
                }
            }
            match chosen {
                Some((node, _)) => {
                    visited[node] = true;
                    seq.push(node);
                }
                None => break,
            }
        }
        routes.push(seq);
    }

    routes
}

/// Augmented objective: true objective plus `lambda ×` penalties on used arcs.
fn augmented(model: &CpModel, penalties: &Penalties, routes: &[Vec<usize>]) -> i64 {
    model.objective(routes) + penalties.lambda * penalties.of(routes)
}

/// Applies the first move that improves the augmented objective.
///
/// Move order is fixed (reinsert, relocate, 2-opt, exchange) and scans are
/// in ascending index order, so the search is deterministic.
fn improve_once(model: &CpModel, penalties: &Penalties, routes: &mut Vec<Vec<usize>>) -> bool {
    let current_aug = augmented(model, penalties, routes);

    if try_reinsert(model, penalties, routes, current_aug)
        || try_relocate(model, penalties, routes, current_aug)
        || try_two_opt(model, penalties, routes, current_aug)
        || try_exchange(model, penalties, routes, current_aug)
    {
        return true;
    }
    false
}

fn dropped_nodes(model: &CpModel, routes: &[Vec<usize>]) -> Vec<usize> {
    let n = model.num_nodes();
    let mut in_route = vec![false; n];
    for seq in routes {
        for &node in seq {
            in_route[node] = true;
        }
    }
    (1..n).filter(|&i| !in_route[i]).collect()
}

fn try_reinsert(
    model: &CpModel,
    penalties: &Penalties,
    routes: &mut Vec<Vec<usize>>,
    current_aug: i64,
) -> bool {
    for node in dropped_nodes(model, routes) {
        for v in 0..routes.len() {
            for pos in 0..=routes[v].len() {
                let mut candidate = routes.clone();
                candidate[v].insert(pos, node);
                if model.route_schedule(v, &candidate[v]).is_none() {
                    continue;
                }
                if augmented(model, penalties, &candidate) < current_aug {
                    *routes = candidate;
                    return true;
                }
            }
        }
    }
    false
}

fn try_relocate(
    model: &CpModel,
    penalties: &Penalties,
    routes: &mut Vec<Vec<usize>>,
    current_aug: i64,
) -> bool {
    for from in 0..routes.len() {
        for i in 0..routes[from].len() {
            for to in 0..routes.len() {
                let max_pos = if to == from {
                    routes[to].len() - 1
                } else {
                    routes[to].len()
                };
                for pos in 0..=max_pos {
                    if to == from && pos == i {
                        continue;
                    }
                    let mut candidate = routes.clone();
                    let node = candidate[from].remove(i);
                    candidate[to].insert(pos, node);
                    if model.route_schedule(from, &candidate[from]).is_none()
                        || model.route_schedule(to, &candidate[to]).is_none()
                    {
                        continue;
                    }
                    if augmented(model, penalties, &candidate) < current_aug {
                        *routes = candidate;
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn try_two_opt(
    model: &CpModel,
    penalties: &Penalties,
    routes: &mut Vec<Vec<usize>>,
    current_aug: i64,
) -> bool {
    for v in 0..routes.len() {
        let len = routes[v].len();
        if len < 2 {
            continue;
        }
        for i in 0..len - 1 {
            for j in (i + 1)..len {
                let mut candidate = routes.clone();
                candidate[v][i..=j].reverse();
                if model.route_schedule(v, &candidate[v]).is_none() {
                    continue;
                }
                if augmented(model, penalties, &candidate) < current_aug {
                    *routes = candidate;
                    return true;
                }
            }
        }
    }
    false
}

fn try_exchange(
    model: &CpModel,
    penalties: &Penalties,
    routes: &mut Vec<Vec<usize>>,
    current_aug: i64,
) -> bool {
    for a in 0..routes.len() {
        for b in (a + 1)..routes.len() {
            for i in 0..routes[a].len() {
                for j in 0..routes[b].len() {
                    let mut candidate = routes.clone();
                    let tmp = candidate[a][i];
                    candidate[a][i] = candidate[b][j];
                    candidate[b][j] = tmp;
                    if model.route_schedule(a, &candidate[a]).is_none()
                        || model.route_schedule(b, &candidate[b]).is_none()
                    {
                        continue;
                    }
                    if augmented(model, penalties, &candidate) < current_aug {
                        *routes = candidate;
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Penalizes the used arcs with maximal utility `dist / (1 + penalty)`.
///
/// Utilities are compared by cross-multiplication to stay exact in
/// integers.
fn penalize(model: &CpModel, penalties: &mut Penalties, routes: &[Vec<usize>]) {
    let mut arcs: Vec<(usize, usize)> = Vec::new();
    for seq in routes {
        if seq.is_empty() {
            continue;
        }
        arcs.push((0, seq[0]));
        for pair in seq.windows(2) {
            arcs.push((pair[0], pair[1]));
        }
        arcs.push((seq[seq.len() - 1], 0));
    }
    if arcs.is_empty() {
        return;
    }

    let utility_gt = |a: (usize, usize), b: (usize, usize), counts: &Vec<Vec<i64>>| -> bool {
        let ua = i128::from(model.dist(a.0, a.1)) * i128::from(1 + counts[b.0][b.1]);
        let ub = i128::from(model.dist(b.0, b.1)) * i128::from(1 + counts[a.0][a.1]);
        ua > ub
    };

    let mut max_arc = arcs[0];
    for &arc in &arcs[1..] {
        if utility_gt(arc, max_arc, &penalties.counts) {
            max_arc = arc;
        }
    }
    for &(from, to) in &arcs {
        if !utility_gt(max_arc, (from, to), &penalties.counts)
            && !utility_gt((from, to), max_arc, &penalties.counts)
        {
            penalties.counts[from][to] += 1;
        }
    }
}
