//! carvepath-route: Pure skeleton-to-toolpath routing (sans-IO).
//!
//! Turns the unordered, self-intersecting point sequence of a medial-axis
//! skeleton into one ordered traversal for a V-carve cutting tool:
//! site deduplication -> adjacency graph -> greedy terminal-seeking walk
//! -> breadth-first bridging when the walk stalls.
//!
//! The walk is a heuristic that keeps tool retracts low; it does not
//! promise a minimal total path. Every call builds its own graph and
//! holds no state afterwards.
//!
//! This crate has **no I/O dependencies**. Reading skeleton files and
//! writing routes lives in `carvepath-cli`; rendering lives in
//! `carvepath-export`.

pub mod bridge;
pub mod diagnostics;
pub mod graph;
pub mod oracle;
pub mod route;
pub mod types;

pub use graph::{Site, SiteId, SiteKey, SiteKind, SkeletonGraph, build_graph};
pub use route::{RouteTrace, construct_route};
pub use types::{Route, RouteConfig, RouteError, RoutePoint, SkeletonPoint};

/// Route a single skeleton loop.
///
/// The sequence is treated as cyclic: its last point is linked back to its
/// first. The walk starts at the first point.
///
/// # Errors
///
/// Returns [`RouteError::InvalidConfig`] if `config` fails validation.
/// Returns [`RouteError::NonFiniteCoordinate`] if any point has a NaN or
/// infinite component.
pub fn route(points: &[SkeletonPoint], config: &RouteConfig) -> Result<Route, RouteError> {
    route_loops(&[points], config)
}

/// Route several skeleton loops that share one site map.
///
/// Each loop wraps on its own. Loops touch only where they share
/// coordinates (within `config.tolerance`); loops not connected to the
/// first point of the first non-empty loop are left out of the route.
///
/// If the loops hold at most one point in total, that point (if any) is
/// returned as-is.
///
/// # Errors
///
/// Returns [`RouteError::InvalidConfig`] if `config` fails validation.
/// Returns [`RouteError::NonFiniteCoordinate`] if any point has a NaN or
/// infinite component.
pub fn route_loops<L: AsRef<[SkeletonPoint]>>(
    loops: &[L],
    config: &RouteConfig,
) -> Result<Route, RouteError> {
    validate_input(loops, config)?;
    if let Some(route) = passthrough(loops, config) {
        return Ok(route);
    }

    let graph = build_graph(loops, config.tolerance);
    let trace = construct_route(&graph, config.search_budget);
    Ok(trace.to_route(&graph, config.default_radius))
}

/// Validate the configuration and every input coordinate.
pub(crate) fn validate_input<L: AsRef<[SkeletonPoint]>>(
    loops: &[L],
    config: &RouteConfig,
) -> Result<(), RouteError> {
    config.validate()?;
    for (loop_index, points) in loops.iter().enumerate() {
        if let Some(point_index) = points.as_ref().iter().position(|p| !p.is_finite()) {
            return Err(RouteError::NonFiniteCoordinate {
                loop_index,
                point_index,
            });
        }
    }
    Ok(())
}

/// Inputs of zero or one point need no graph: return them unchanged.
pub(crate) fn passthrough<L: AsRef<[SkeletonPoint]>>(
    loops: &[L],
    config: &RouteConfig,
) -> Option<Route> {
    let mut points = loops.iter().flat_map(|l| l.as_ref().iter());
    let first = points.next();
    if points.next().is_some() {
        return None;
    }
    Some(Route::new(
        first
            .map(|p| RoutePoint::new(p.x, p.y, p.r.unwrap_or(config.default_radius)))
            .into_iter()
            .collect(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn route_empty_input() {
        let result = route(&[], &RouteConfig::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn route_single_point_is_identity() {
        let result = route(
            &[SkeletonPoint::with_radius(3.0, 4.0, 1.5)],
            &RouteConfig::default(),
        )
        .unwrap();
        assert_eq!(result.points(), &[RoutePoint::new(3.0, 4.0, 1.5)]);
    }

    #[test]
    fn route_single_point_without_radius_uses_default() {
        let config = RouteConfig {
            default_radius: 0.75,
            ..RouteConfig::default()
        };
        let result = route(&[SkeletonPoint::new(3.0, 4.0)], &config).unwrap();
        assert_eq!(result.points(), &[RoutePoint::new(3.0, 4.0, 0.75)]);
    }

    #[test]
    fn route_loops_with_one_point_total_is_passthrough() {
        let loops: [Vec<SkeletonPoint>; 3] = [vec![], vec![SkeletonPoint::new(1.0, 1.0)], vec![]];
        let result = route_loops(&loops, &RouteConfig::default()).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn route_rejects_nan() {
        let points = [SkeletonPoint::new(0.0, 0.0), SkeletonPoint::new(f64::NAN, 1.0)];
        let result = route(&points, &RouteConfig::default());
        assert_eq!(
            result,
            Err(RouteError::NonFiniteCoordinate {
                loop_index: 0,
                point_index: 1,
            })
        );
    }

    #[test]
    fn route_rejects_invalid_config_before_passthrough() {
        let config = RouteConfig {
            tolerance: -1.0,
            ..RouteConfig::default()
        };
        assert!(matches!(
            route(&[], &config),
            Err(RouteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn route_two_points() {
        let points = [SkeletonPoint::new(0.0, 0.0), SkeletonPoint::new(1.0, 0.0)];
        let result = route(&points, &RouteConfig::default()).unwrap();
        assert_eq!(
            result.points(),
            &[RoutePoint::new(0.0, 0.0, 0.0), RoutePoint::new(1.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn route_loops_skips_leading_empty_loop() {
        let loops = [
            vec![],
            vec![SkeletonPoint::new(5.0, 5.0), SkeletonPoint::new(6.0, 5.0)],
        ];
        let result = route_loops(&loops, &RouteConfig::default()).unwrap();
        assert_eq!(result.first(), Some(&RoutePoint::new(5.0, 5.0, 0.0)));
    }
}
