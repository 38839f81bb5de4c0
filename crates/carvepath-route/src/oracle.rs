//! Terminal-distance scoring for the greedy extension step.
//!
//! A candidate next site is scored by how far it is, through the skeleton
//! graph, from the nearest branch tip that has not been cut yet. Heading
//! towards the closest open tip finishes short arms first, which keeps the
//! number of backtracking bridges low.

use std::collections::{HashSet, VecDeque};

use crate::graph::{SiteId, SkeletonGraph};

/// Result of one terminal-distance search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalDistance {
    /// Accumulated squared edge length along the breadth-first path to the
    /// first unvisited terminal, or `f64::INFINITY` if none is reachable.
    pub cost: f64,
    /// Number of sites popped from the search queue.
    pub expanded: usize,
}

impl TerminalDistance {
    /// Returns `true` if an unvisited terminal was found.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.cost.is_finite()
    }
}

/// Score `start` by breadth-first search towards the nearest unvisited
/// terminal.
///
/// Returns a cost of 0 without searching if `start` is itself a terminal.
/// Otherwise the graph is explored in hop order; each site's cost is the
/// cost of the site it was discovered from plus the squared length of the
/// connecting edge, and the first popped terminal with
/// `visited[terminal] == false` ends the search. Visited sites are still
/// traversed, they just do not count as a destination.
///
/// `visited` is indexed by [`SiteId`] and is never modified.
#[must_use]
pub fn terminal_distance(graph: &SkeletonGraph, start: SiteId, visited: &[bool]) -> TerminalDistance {
    if graph.is_terminal(start) {
        return TerminalDistance {
            cost: 0.0,
            expanded: 0,
        };
    }

    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0.0_f64)]);
    let mut expanded = 0;

    while let Some((site, cost)) = queue.pop_front() {
        expanded += 1;
        if site != start && !visited[site] && graph.is_terminal(site) {
            return TerminalDistance { cost, expanded };
        }
        for &neighbor in graph.neighbors(site) {
            if seen.insert(neighbor) {
                queue.push_back((neighbor, cost + graph.distance_squared(site, neighbor)));
            }
        }
    }

    TerminalDistance {
        cost: f64::INFINITY,
        expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::types::SkeletonPoint;

    fn pts(coords: &[(f64, f64)]) -> Vec<SkeletonPoint> {
        coords
            .iter()
            .map(|&(x, y)| SkeletonPoint::new(x, y))
            .collect()
    }

    /// j a1 a2 a1 j b1 j: arm a is two edges long, arm b one edge long.
    fn two_arm_graph() -> SkeletonGraph {
        build_graph(
            &[pts(&[
                (0.0, 0.0),
                (1.0, 0.0),
                (2.0, 0.0),
                (1.0, 0.0),
                (0.0, 0.0),
                (0.0, 3.0),
            ])],
            0.01,
        )
    }

    #[test]
    fn terminal_start_scores_zero() {
        let graph = two_arm_graph();
        // Site 2 is (2, 0), the tip of arm a.
        let score = terminal_distance(&graph, 2, &[false; 4]);
        assert!(score.cost.abs() < f64::EPSILON);
        assert_eq!(score.expanded, 0);
    }

    #[test]
    fn cost_is_squared_edge_length_not_hops() {
        let graph = two_arm_graph();
        // From the junction (0,0): tip b at (0,3) is one hop but costs 9,
        // tip a at (2,0) is two hops costing 1 + 1. Breadth-first order
        // reaches the one-hop terminal first.
        let score = terminal_distance(&graph, 0, &[false; 4]);
        assert!((score.cost - 9.0).abs() < 1e-12, "cost {}", score.cost);
        assert!(score.is_reachable());
    }

    #[test]
    fn visited_terminals_are_skipped() {
        let graph = two_arm_graph();
        let mut visited = vec![false; 4];
        visited[3] = true; // tip b
        let score = terminal_distance(&graph, 0, &visited);
        assert!((score.cost - 2.0).abs() < 1e-12, "cost {}", score.cost);
    }

    #[test]
    fn search_passes_through_visited_junctions() {
        let graph = two_arm_graph();
        let mut visited = vec![false; 4];
        visited[0] = true; // junction
        visited[3] = true; // tip b
        // Start at a1 (site 1): nearest open tip is a2, one unit away.
        let score = terminal_distance(&graph, 1, &visited);
        assert!((score.cost - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_open_terminal_is_unreachable() {
        let graph = two_arm_graph();
        let visited = vec![false, false, true, true];
        let score = terminal_distance(&graph, 0, &visited);
        assert!(score.cost.is_infinite());
        assert!(!score.is_reachable());
        assert_eq!(score.expanded, graph.site_count());
    }

    #[test]
    fn visited_set_is_untouched() {
        let graph = two_arm_graph();
        let visited = vec![true, false, false, false];
        let before = visited.clone();
        let _ = terminal_distance(&graph, 1, &visited);
        assert_eq!(visited, before);
    }
}
