//! Route diagnostics: timing, graph shape, and walk statistics.
//!
//! These diagnostics are permanent instrumentation intended for tuning
//! skeleton extraction upstream and for checking that routing stays
//! deterministic. [`route_with_diagnostics`] collects them alongside the
//! route.
//!
//! Duration measurements go through the [`Clock`] trait so callers can
//! supply their own time source. [`SystemClock`] uses the `web-time`
//! crate, which maps to `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::hash::Hasher;
use std::time::Duration;

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::graph::{SkeletonGraph, build_graph};
use crate::route::construct_route;
use crate::types::{Route, RouteConfig, RouteError, SkeletonPoint};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since an earlier timestamp.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by `web_time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single routing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDiagnostics {
    /// Site deduplication and adjacency construction.
    pub build_graph: StageDiagnostics,
    /// Greedy walk with bridging.
    pub construct_route: StageDiagnostics,
    /// Total wall-clock duration of the call (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts.
    pub summary: RouteSummary,
}

/// Diagnostics for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Graph construction metrics.
    BuildGraph {
        /// Number of input loops.
        loop_count: usize,
        /// Total input points across all loops.
        input_point_count: usize,
        /// Distinct sites after deduplication.
        site_count: usize,
        /// Sites seen once (branch tips) or isolated.
        terminal_count: usize,
        /// Sites seen more than once.
        junction_count: usize,
        /// Undirected edges.
        edge_count: usize,
        /// Connected components of the site graph.
        component_count: usize,
    },
    /// Walk metrics.
    ConstructRoute {
        /// Successful bridge searches.
        bridge_count: usize,
        /// Already-cut sites re-emitted by bridges.
        retraced_count: usize,
        /// Sites left out because they were unreachable from the start.
        unreached_count: usize,
        /// Sites popped across all terminal-distance searches.
        oracle_expansions: usize,
        /// Sites popped across all bridge searches.
        bridge_expansions: usize,
        /// Whether the search budget ran out.
        budget_exhausted: bool,
    },
    /// The input had at most one point and was returned unchanged.
    Passthrough {
        /// Total input points (0 or 1).
        input_point_count: usize,
    },
}

/// High-level summary of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Total input points.
    pub input_point_count: usize,
    /// Points in the output route.
    pub output_point_count: usize,
    /// Total travel length of the output route.
    pub route_length: f64,
    /// Stable fingerprint of the output, see [`route_fingerprint`].
    pub fingerprint: u64,
}

impl RouteDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Route Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Input points: {}  |  Output points: {}  |  Length: {:.3}",
            self.summary.input_point_count,
            self.summary.output_point_count,
            self.summary.route_length,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(format!("Fingerprint: {:016x}", self.summary.fingerprint));
        lines.push(String::new());

        lines.push(format!(
            "{:<20} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in [
            ("Build Graph", &self.build_graph),
            ("Construct Route", &self.construct_route),
        ] {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<20} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::BuildGraph {
            loop_count,
            input_point_count,
            site_count,
            terminal_count,
            junction_count,
            edge_count,
            component_count,
        } => format!(
            "{loop_count} loops, {input_point_count} pts -> {site_count} sites \
             ({terminal_count} terminals, {junction_count} junctions), \
             {edge_count} edges, {component_count} components",
        ),
        StageMetrics::ConstructRoute {
            bridge_count,
            retraced_count,
            unreached_count,
            oracle_expansions,
            bridge_expansions,
            budget_exhausted,
        } => {
            let budget = if *budget_exhausted {
                " (budget exhausted)"
            } else {
                ""
            };
            format!(
                "{bridge_count} bridges, {retraced_count} retraced, {unreached_count} unreached, \
                 expansions oracle={oracle_expansions} bridge={bridge_expansions}{budget}",
            )
        }
        StageMetrics::Passthrough { input_point_count } => {
            format!("passthrough ({input_point_count} pts)")
        }
    }
}

/// Count connected components of the site graph.
#[must_use]
pub fn component_count(graph: &SkeletonGraph) -> usize {
    let n = graph.site_count();
    let mut uf = UnionFind::<usize>::new(n);
    let mut components = n;
    for (a, b) in graph.edges() {
        if uf.union(a, b) {
            components -= 1;
        }
    }
    components
}

/// Stable 64-bit fingerprint of a route.
///
/// SipHash-1-3 with fixed zero keys over the bit patterns of every
/// coordinate and radius, so identical routes hash identically across
/// runs and platforms.
#[must_use]
pub fn route_fingerprint(route: &Route) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(u64::try_from(route.len()).unwrap_or(u64::MAX));
    for p in route.points() {
        hasher.write_u64(p.x.to_bits());
        hasher.write_u64(p.y.to_bits());
        hasher.write_u64(p.r.to_bits());
    }
    hasher.finish()
}

/// Route `loops` and collect diagnostics.
///
/// Behaves exactly like [`route_loops`](crate::route_loops) and
/// additionally reports per-stage timing and counts.
///
/// # Errors
///
/// Same as [`route_loops`](crate::route_loops).
pub fn route_with_diagnostics<L, C>(
    loops: &[L],
    config: &RouteConfig,
    clock: &C,
) -> Result<(Route, RouteDiagnostics), RouteError>
where
    L: AsRef<[SkeletonPoint]>,
    C: Clock,
{
    let start = clock.now();
    crate::validate_input(loops, config)?;
    let input_point_count: usize = loops.iter().map(|l| l.as_ref().len()).sum();

    if let Some(route) = crate::passthrough(loops, config) {
        let summary = summarize(input_point_count, &route);
        let total_duration = clock.elapsed(&start);
        let passthrough = StageDiagnostics {
            duration: Duration::ZERO,
            metrics: StageMetrics::Passthrough { input_point_count },
        };
        return Ok((
            route,
            RouteDiagnostics {
                build_graph: passthrough.clone(),
                construct_route: passthrough,
                total_duration,
                summary,
            },
        ));
    }

    let t = clock.now();
    let graph = build_graph(loops, config.tolerance);
    let build_metrics = StageMetrics::BuildGraph {
        loop_count: loops.len(),
        input_point_count,
        site_count: graph.site_count(),
        terminal_count: graph.terminal_count(),
        junction_count: graph.junction_count(),
        edge_count: graph.edge_count(),
        component_count: component_count(&graph),
    };
    let build_duration = clock.elapsed(&t);

    let t = clock.now();
    let trace = construct_route(&graph, config.search_budget);
    let route = trace.to_route(&graph, config.default_radius);
    let route_duration = clock.elapsed(&t);

    let summary = summarize(input_point_count, &route);
    let diagnostics = RouteDiagnostics {
        build_graph: StageDiagnostics {
            duration: build_duration,
            metrics: build_metrics,
        },
        construct_route: StageDiagnostics {
            duration: route_duration,
            metrics: StageMetrics::ConstructRoute {
                bridge_count: trace.bridges,
                retraced_count: trace.retraced,
                unreached_count: trace.unreached,
                oracle_expansions: trace.oracle_expansions,
                bridge_expansions: trace.bridge_expansions,
                budget_exhausted: trace.budget_exhausted,
            },
        },
        total_duration: clock.elapsed(&start),
        summary,
    };

    Ok((route, diagnostics))
}

fn summarize(input_point_count: usize, route: &Route) -> RouteSummary {
    RouteSummary {
        input_point_count,
        output_point_count: route.len(),
        route_length: route.length(),
        fingerprint: route_fingerprint(route),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::RoutePoint;

    /// Clock that reports a fixed duration for every stage.
    struct FixedClock;

    impl Clock for FixedClock {
        type Instant = ();

        fn now(&self) {}

        fn elapsed(&self, _since: &()) -> Duration {
            Duration::from_millis(2)
        }
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<SkeletonPoint> {
        coords
            .iter()
            .map(|&(x, y)| SkeletonPoint::new(x, y))
            .collect()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn component_count_separates_loops() {
        let graph = build_graph(
            &[
                pts(&[(0.0, 0.0), (1.0, 0.0)]),
                pts(&[(5.0, 0.0), (6.0, 0.0)]),
                pts(&[(9.0, 9.0)]),
            ],
            0.01,
        );
        assert_eq!(component_count(&graph), 3);
    }

    #[test]
    fn fingerprint_distinguishes_order() {
        let a = Route::new(vec![
            RoutePoint::new(0.0, 0.0, 0.0),
            RoutePoint::new(1.0, 0.0, 0.0),
        ]);
        let b = Route::new(vec![
            RoutePoint::new(1.0, 0.0, 0.0),
            RoutePoint::new(0.0, 0.0, 0.0),
        ]);
        assert_eq!(route_fingerprint(&a), route_fingerprint(&a.clone()));
        assert_ne!(route_fingerprint(&a), route_fingerprint(&b));
    }

    #[test]
    fn diagnostics_for_two_loops() {
        let loops = [
            pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            pts(&[(10.0, 0.0), (11.0, 0.0)]),
        ];
        let (route, diag) =
            route_with_diagnostics(&loops, &RouteConfig::default(), &FixedClock).unwrap();

        assert_eq!(route.len(), 3);
        assert_eq!(diag.summary.input_point_count, 5);
        assert_eq!(diag.summary.output_point_count, 3);
        assert_eq!(diag.summary.fingerprint, route_fingerprint(&route));
        assert_eq!(diag.build_graph.duration, Duration::from_millis(2));
        assert!(matches!(
            diag.build_graph.metrics,
            StageMetrics::BuildGraph {
                site_count: 5,
                component_count: 2,
                ..
            }
        ));
        assert!(matches!(
            diag.construct_route.metrics,
            StageMetrics::ConstructRoute {
                unreached_count: 2,
                bridge_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn diagnostics_for_passthrough() {
        let (route, diag) = route_with_diagnostics(
            &[vec![SkeletonPoint::with_radius(1.0, 2.0, 0.3)]],
            &RouteConfig::default(),
            &FixedClock,
        )
        .unwrap();
        assert_eq!(route.points(), &[RoutePoint::new(1.0, 2.0, 0.3)]);
        assert!(matches!(
            diag.build_graph.metrics,
            StageMetrics::Passthrough {
                input_point_count: 1
            }
        ));
    }

    #[test]
    fn diagnostics_reject_invalid_config() {
        let config = RouteConfig {
            tolerance: 0.0,
            ..RouteConfig::default()
        };
        let result = route_with_diagnostics(&[pts(&[(0.0, 0.0)])], &config, &FixedClock);
        assert!(matches!(result, Err(RouteError::InvalidConfig(_))));
    }

    #[test]
    fn report_mentions_stages() {
        let loops = [pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)])];
        let (_, diag) =
            route_with_diagnostics(&loops, &RouteConfig::default(), &FixedClock).unwrap();
        let report = diag.report();
        assert!(report.contains("Route Diagnostics Report"));
        assert!(report.contains("Build Graph"));
        assert!(report.contains("Construct Route"));
        assert!(report.contains("1 junctions"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let loops = [pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])];
        let (_, diag) =
            route_with_diagnostics(&loops, &RouteConfig::default(), &FixedClock).unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: RouteDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(diag.build_graph, back.build_graph);
        assert_eq!(diag.construct_route, back.construct_route);
        assert_eq!(diag.total_duration, back.total_duration);
        assert_eq!(diag.summary.fingerprint, back.summary.fingerprint);
        assert!((diag.summary.route_length - back.summary.route_length).abs() < 1e-9);
    }
}
