//! Route construction: walk the skeleton graph greedily, bridging back
//! over cut skeleton whenever the walk runs out of uncut neighbours.
//!
//! The walk alternates between two phases:
//!
//! - **Extending**: step to the uncut neighbour whose nearest open branch
//!   tip is closest (see [`terminal_distance`]), ties going to the
//!   neighbour discovered first while building the graph.
//! - **Bridging**: retrace to the nearest uncut site (see
//!   [`BridgeFinder`]), emitting every site along the way.
//!
//! The walk stops when every site is cut, or when no uncut site is
//! reachable from the current position. In the latter case the remaining
//! sites belong to other components and are left out of the route.
//!
//! Both searches draw on one shared work budget. Once it is spent the walk
//! degrades to a plain depth-first traversal: extend to the first uncut
//! neighbour in discovery order, and when stuck, back up along the walk so
//! far until a site with an uncut neighbour is reached.

use crate::bridge::BridgeFinder;
use crate::graph::{SiteId, SkeletonGraph};
use crate::oracle::terminal_distance;
use crate::types::Route;

/// Walk phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Extending,
    Bridging,
    Done,
}

/// Ordered site sequence plus counters describing how it was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTrace {
    /// Sites in visiting order. Bridged sites may appear more than once.
    pub sites: Vec<SiteId>,
    /// Number of bridges taken, searched or backed up along the walk.
    pub bridges: usize,
    /// Number of already-cut sites re-emitted by bridges.
    pub retraced: usize,
    /// Sites never reached from the start site.
    pub unreached: usize,
    /// Sites popped across all terminal-distance searches.
    pub oracle_expansions: usize,
    /// Sites popped across all bridge searches.
    pub bridge_expansions: usize,
    /// Whether the search budget ran out during the walk.
    pub budget_exhausted: bool,
}

impl RouteTrace {
    /// Map the site sequence to output points.
    #[must_use]
    pub fn to_route(&self, graph: &SkeletonGraph, default_radius: f64) -> Route {
        Route::new(
            self.sites
                .iter()
                .map(|&id| graph.site(id).route_point(default_radius))
                .collect(),
        )
    }
}

/// Remaining search work for one walk.
#[derive(Debug, Clone, Copy)]
struct SearchBudget {
    remaining: Option<usize>,
}

impl SearchBudget {
    const fn is_exhausted(self) -> bool {
        matches!(self.remaining, Some(0))
    }

    fn spend(&mut self, work: usize, trace: &mut RouteTrace) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(work);
        }
        if self.is_exhausted() && !trace.budget_exhausted {
            trace.budget_exhausted = true;
            log::warn!(
                "route.construct: search budget exhausted after {} expansions, falling back to discovery order",
                trace.oracle_expansions + trace.bridge_expansions,
            );
        }
    }
}

/// Construct the visiting order for every site reachable from site `0`.
///
/// `search_budget` caps the work spent on searching: every site a
/// terminal-distance or bridge search pops costs one unit, and every
/// scored candidate costs at least one. A step that starts with budget
/// left always finishes. Once the budget is spent, extension takes the
/// first uncut neighbour in discovery order and bridging backs up along
/// the walk, so the rest of the walk costs O(sites + edges).
#[must_use]
pub fn construct_route(graph: &SkeletonGraph, search_budget: Option<usize>) -> RouteTrace {
    let site_count = graph.site_count();
    let mut trace = RouteTrace::default();
    if site_count == 0 {
        return trace;
    }

    let mut budget = SearchBudget {
        remaining: search_budget,
    };
    let mut finder = BridgeFinder::new(site_count);
    let mut visited = vec![false; site_count];
    let mut cursor = vec![0; site_count];
    let mut visited_count = 1;
    let mut current: SiteId = 0;
    visited[current] = true;
    trace.sites.push(current);
    // Walk so far as a stack of moves; the top is always `current`.
    let mut walk = vec![current];

    let mut phase = Phase::Extending;
    loop {
        if visited_count == site_count {
            phase = Phase::Done;
        }

        match phase {
            Phase::Extending => {
                let next = if budget.is_exhausted() {
                    first_unvisited(graph, current, &visited, &mut cursor)
                } else {
                    let candidates: Vec<SiteId> = graph
                        .neighbors(current)
                        .iter()
                        .copied()
                        .filter(|&n| !visited[n])
                        .collect();
                    choose_next(graph, &candidates, &visited, &mut budget, &mut trace)
                };

                let Some(next) = next else {
                    phase = Phase::Bridging;
                    continue;
                };

                log::trace!("route.extend: from={current} to={next}");
                visited[next] = true;
                visited_count += 1;
                trace.sites.push(next);
                walk.push(next);
                current = next;
            }
            Phase::Bridging if budget.is_exhausted() => {
                let Some(resume) = back_up(graph, &mut walk, &visited, &mut cursor, &mut trace)
                else {
                    phase = Phase::Done;
                    continue;
                };
                log::trace!("route.bridge: from={current} back to={resume}");
                current = resume;
                phase = Phase::Extending;
            }
            Phase::Bridging => {
                let search = finder.search(graph, current, |s| !visited[s]);
                trace.bridge_expansions += search.expanded;
                budget.spend(search.expanded, &mut trace);

                let Some(path) = search.path else {
                    phase = Phase::Done;
                    continue;
                };

                log::trace!(
                    "route.bridge: from={current} to={:?} hops={}",
                    path.last(),
                    path.len() - 1,
                );
                trace.bridges += 1;
                for &site in &path[1..] {
                    if visited[site] {
                        trace.retraced += 1;
                    } else {
                        visited[site] = true;
                        visited_count += 1;
                    }
                    trace.sites.push(site);
                }
                walk.extend_from_slice(&path[1..]);
                current = path[path.len() - 1];
                phase = Phase::Extending;
            }
            Phase::Done => break,
        }
    }

    trace.unreached = site_count - visited_count;
    if trace.unreached > 0 {
        log::warn!(
            "route.construct: unreached sites={} of {site_count} (disconnected input)",
            trace.unreached,
        );
    }
    log::debug!(
        "route.construct: done sites={site_count} emitted={} bridges={} retraced={}",
        trace.sites.len(),
        trace.bridges,
        trace.retraced,
    );

    trace
}

/// Pick the candidate with the lowest terminal distance.
///
/// Candidates are scored in order and only a strictly lower score replaces
/// the current best, so ties go to the earliest candidate.
fn choose_next(
    graph: &SkeletonGraph,
    candidates: &[SiteId],
    visited: &[bool],
    budget: &mut SearchBudget,
    trace: &mut RouteTrace,
) -> Option<SiteId> {
    let first = *candidates.first()?;
    if candidates.len() == 1 {
        return Some(first);
    }

    let mut best = first;
    let mut best_cost = f64::INFINITY;
    let mut work = 0;
    for (i, &candidate) in candidates.iter().enumerate() {
        let score = terminal_distance(graph, candidate, visited);
        trace.oracle_expansions += score.expanded;
        work += score.expanded.max(1);
        if i == 0 || score.cost < best_cost {
            best = candidate;
            best_cost = score.cost;
        }
    }
    budget.spend(work, trace);

    Some(best)
}

/// First uncut neighbour of `site` in discovery order.
///
/// `cursor[site]` only ever moves past cut neighbours, so repeated calls
/// cost O(edges) over the whole walk.
fn first_unvisited(
    graph: &SkeletonGraph,
    site: SiteId,
    visited: &[bool],
    cursor: &mut [usize],
) -> Option<SiteId> {
    let neighbors = graph.neighbors(site);
    while let Some(&n) = neighbors.get(cursor[site]) {
        if !visited[n] {
            return Some(n);
        }
        cursor[site] += 1;
    }
    None
}

/// Pop the walk back to the latest site with an uncut neighbour, emitting
/// the sites passed on the way. Returns `None`, and emits nothing, when no
/// site on the walk has one left.
fn back_up(
    graph: &SkeletonGraph,
    walk: &mut Vec<SiteId>,
    visited: &[bool],
    cursor: &mut [usize],
    trace: &mut RouteTrace,
) -> Option<SiteId> {
    let mut passed = Vec::new();
    loop {
        walk.pop();
        let &top = walk.last()?;
        passed.push(top);
        if first_unvisited(graph, top, visited, cursor).is_some() {
            trace.bridges += 1;
            trace.retraced += passed.len();
            trace.sites.extend_from_slice(&passed);
            return Some(top);
        }
    }
}
