//! Graph construction: merge coincident skeleton points into sites and
//! link each site to its neighbours along the (cyclic) input loops.
//!
//! Sites are keyed by integer-quantized coordinates so that points within
//! the configured tolerance of the same grid cell collapse into one site.
//! The number of times a site occurs in the input decides its role: a site
//! seen once is a branch tip (terminal), a site seen more than once is
//! traversed repeatedly by the skeleton boundary (junction).

use std::collections::HashMap;

use crate::types::{RoutePoint, SkeletonPoint};

/// Index of a site within a [`SkeletonGraph`], in first-seen order.
pub type SiteId = usize;

/// Integer-quantized coordinate used to deduplicate points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteKey {
    /// `round(x / tolerance)`.
    pub x: i64,
    /// `round(y / tolerance)`.
    pub y: i64,
}

impl SiteKey {
    /// Quantize a coordinate pair onto the tolerance grid.
    ///
    /// Coordinates are expected to be finite; out-of-range values saturate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(x: f64, y: f64, tolerance: f64) -> Self {
        Self {
            x: (x / tolerance).round() as i64,
            y: (y / tolerance).round() as i64,
        }
    }
}

/// Role of a site in the skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Occurs once in the input, or has no neighbours at all.
    Terminal,
    /// Occurs more than once in the input.
    Junction,
}

/// A deduplicated skeleton coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// Quantized key shared by every point merged into this site.
    pub key: SiteKey,
    /// First-seen horizontal position.
    pub x: f64,
    /// First-seen vertical position.
    pub y: f64,
    /// First specified radius among the merged points.
    pub r: Option<f64>,
    /// Number of input points merged into this site.
    pub occurrences: usize,
}

impl Site {
    /// Squared Euclidean distance to another site.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Convert to an output point, substituting `default_radius` when no
    /// occurrence carried a radius.
    #[must_use]
    pub fn route_point(&self, default_radius: f64) -> RoutePoint {
        RoutePoint::new(self.x, self.y, self.r.unwrap_or(default_radius))
    }
}

/// Sites plus an undirected adjacency list.
///
/// Neighbour lists keep discovery order (the order edges were first seen
/// while walking the input), which downstream tie-breaking relies on.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGraph {
    sites: Vec<Site>,
    index: HashMap<SiteKey, SiteId>,
    neighbors: Vec<Vec<SiteId>>,
}

impl SkeletonGraph {
    /// Number of distinct sites.
    #[must_use]
    pub const fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if the graph has no sites.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// All sites in first-seen order.
    #[must_use]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The site with the given id.
    ///
    /// Ids come from this graph, so indexing is always in bounds.
    #[must_use]
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id]
    }

    /// Look up the site a coordinate would merge into.
    #[must_use]
    pub fn site_id(&self, key: SiteKey) -> Option<SiteId> {
        self.index.get(&key).copied()
    }

    /// Neighbours of a site in discovery order.
    #[must_use]
    pub fn neighbors(&self, id: SiteId) -> &[SiteId] {
        &self.neighbors[id]
    }

    /// Classify a site.
    #[must_use]
    pub fn kind(&self, id: SiteId) -> SiteKind {
        if self.sites[id].occurrences == 1 || self.neighbors[id].is_empty() {
            SiteKind::Terminal
        } else {
            SiteKind::Junction
        }
    }

    /// Shorthand for `kind(id) == SiteKind::Terminal`.
    #[must_use]
    pub fn is_terminal(&self, id: SiteId) -> bool {
        self.kind(id) == SiteKind::Terminal
    }

    /// Squared length of the edge between two sites.
    #[must_use]
    pub fn distance_squared(&self, a: SiteId, b: SiteId) -> f64 {
        self.sites[a].distance_squared(&self.sites[b])
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Iterate over undirected edges as `(lower_id, higher_id)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (SiteId, SiteId)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(a, ns)| {
            ns.iter().copied().filter(move |&b| a < b).map(move |b| (a, b))
        })
    }

    /// Number of terminal sites.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        (0..self.sites.len())
            .filter(|&id| self.is_terminal(id))
            .count()
    }

    /// Number of junction sites.
    #[must_use]
    pub fn junction_count(&self) -> usize {
        self.sites.len() - self.terminal_count()
    }

    /// Merge a point into its site, creating the site on first sight.
    fn intern(&mut self, point: SkeletonPoint, tolerance: f64) -> SiteId {
        let key = SiteKey::quantize(point.x, point.y, tolerance);
        if let Some(&id) = self.index.get(&key) {
            let site = &mut self.sites[id];
            site.occurrences += 1;
            if site.r.is_none() {
                site.r = point.r;
            }
            return id;
        }
        let id = self.sites.len();
        self.sites.push(Site {
            key,
            x: point.x,
            y: point.y,
            r: point.r,
            occurrences: 1,
        });
        self.neighbors.push(Vec::new());
        self.index.insert(key, id);
        id
    }

    /// Append `neighbor` to `id`'s list unless it is already there or is
    /// the site itself.
    fn link(&mut self, id: SiteId, neighbor: SiteId) {
        if id != neighbor && !self.neighbors[id].contains(&neighbor) {
            self.neighbors[id].push(neighbor);
        }
    }
}

/// Build the site map and adjacency graph from one or more cyclic loops.
///
/// Every point is linked to its predecessor and then its successor within
/// its own loop, wrapping at both ends, so an open polyline still gains an
/// edge between its last and first points. Sites are numbered in the order
/// their first point appears, loop by loop; site `0` is therefore the first
/// point of the first non-empty loop.
///
/// Coordinates must be finite; callers validate before building.
#[must_use]
pub fn build_graph<L: AsRef<[SkeletonPoint]>>(loops: &[L], tolerance: f64) -> SkeletonGraph {
    let mut graph = SkeletonGraph::default();

    let loop_sites: Vec<Vec<SiteId>> = loops
        .iter()
        .map(|points| {
            points
                .as_ref()
                .iter()
                .map(|&p| graph.intern(p, tolerance))
                .collect()
        })
        .collect();

    for ids in &loop_sites {
        let n = ids.len();
        for (i, &id) in ids.iter().enumerate() {
            let prev = ids[(i + n - 1) % n];
            let next = ids[(i + 1) % n];
            graph.link(id, prev);
            graph.link(id, next);
        }
    }

    log::debug!(
        "graph.build: done loops={} sites={} edges={}",
        loops.len(),
        graph.site_count(),
        graph.edge_count(),
    );

    graph
}
