//! Bridge search: when the walk has no uncut neighbour left, find the
//! nearest uncut site by retracing already-cut skeleton.
//!
//! The search is breadth-first, so the returned path has the fewest hops.
//! Within one expansion, newly discovered neighbours are queued nearest
//! first (by squared distance from the site being expanded). Among paths
//! with equal hop count this favours short first steps, which is not the
//! same as the geometrically shortest path; downstream motion generation
//! depends on this exact ordering.

use std::collections::VecDeque;

use crate::graph::{SiteId, SkeletonGraph};

/// Result of one bridge search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSearch {
    /// Sites from the start to the matched target, both inclusive, or
    /// `None` if no target is reachable.
    pub path: Option<Vec<SiteId>>,
    /// Number of sites popped from the search queue.
    pub expanded: usize,
}

/// Reusable scratch space for repeated bridge searches over one graph.
///
/// Parent links are indexed by [`SiteId`]; only the entries written by
/// the previous search are cleared, so a search costs what it explores
/// rather than the size of the graph.
#[derive(Debug, Clone, Default)]
pub struct BridgeFinder {
    parent: Vec<Option<SiteId>>,
    touched: Vec<SiteId>,
    queue: VecDeque<SiteId>,
    discovered: Vec<SiteId>,
}

impl BridgeFinder {
    /// Scratch space for a graph with `site_count` sites.
    #[must_use]
    pub fn new(site_count: usize) -> Self {
        Self {
            parent: vec![None; site_count],
            ..Self::default()
        }
    }

    /// Find the hop-shortest path from `start` to any site for which
    /// `is_target` returns `true`.
    ///
    /// `start` itself never matches, so a returned path always has at
    /// least two sites.
    pub fn search<F>(&mut self, graph: &SkeletonGraph, start: SiteId, is_target: F) -> BridgeSearch
    where
        F: Fn(SiteId) -> bool,
    {
        self.reset(graph.site_count());
        self.queue.push_back(start);
        let mut expanded = 0;

        while let Some(site) = self.queue.pop_front() {
            expanded += 1;
            if site != start && is_target(site) {
                return BridgeSearch {
                    path: Some(self.reconstruct(start, site)),
                    expanded,
                };
            }

            self.discovered.clear();
            let parent = &self.parent;
            self.discovered.extend(
                graph
                    .neighbors(site)
                    .iter()
                    .copied()
                    .filter(|&n| n != start && parent[n].is_none()),
            );
            // Stable sort: equal distances keep discovery order.
            self.discovered.sort_by(|&a, &b| {
                graph
                    .distance_squared(site, a)
                    .total_cmp(&graph.distance_squared(site, b))
            });
            for &n in &self.discovered {
                self.parent[n] = Some(site);
                self.touched.push(n);
                self.queue.push_back(n);
            }
        }

        BridgeSearch {
            path: None,
            expanded,
        }
    }

    fn reset(&mut self, site_count: usize) {
        if self.parent.len() < site_count {
            self.parent.resize(site_count, None);
        }
        for &id in &self.touched {
            self.parent[id] = None;
        }
        self.touched.clear();
        self.queue.clear();
    }

    /// Walk parent links back from `end` to `start`.
    fn reconstruct(&self, start: SiteId, end: SiteId) -> Vec<SiteId> {
        let mut path = vec![end];
        let mut current = end;
        while current != start {
            let Some(prev) = self.parent[current] else {
                break;
            };
            path.push(prev);
            current = prev;
        }
        path.reverse();
        path
    }
}

/// One-off bridge search; see [`BridgeFinder::search`].
#[must_use]
pub fn find_bridge<F>(graph: &SkeletonGraph, start: SiteId, is_target: F) -> BridgeSearch
where
    F: Fn(SiteId) -> bool,
{
    BridgeFinder::new(graph.site_count()).search(graph, start, is_target)
}
