//! Shared types for the carvepath routing core.

use serde::{Deserialize, Serialize};

/// A skeleton point as produced by upstream medial-axis extraction.
///
/// The radius is the inscribed-circle radius at this point, which a
/// V-carve post-processor converts into cutting depth. It is optional
/// because not every skeleton source provides it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkeletonPoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Tool radius at this point, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
}

impl SkeletonPoint {
    /// Create a point without a radius.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, r: None }
    }

    /// Create a point with a known radius.
    #[must_use]
    pub const fn with_radius(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r: Some(r) }
    }

    /// Returns `true` if every present component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.r.is_none_or(f64::is_finite)
    }
}

/// A point on the output toolpath.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Tool radius at this point.
    pub r: f64,
}

impl RoutePoint {
    /// Create a new route point.
    #[must_use]
    pub const fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }

    /// Squared Euclidean distance to another point, ignoring the radius.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point, ignoring the radius.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// The ordered sequence of points the cutting tool visits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route(Vec<RoutePoint>);

impl Route {
    /// Create a route from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<RoutePoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the route has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the route.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&RoutePoint> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&RoutePoint> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[RoutePoint] {
        &self.0
    }

    /// Consumes the route and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<RoutePoint> {
        self.0
    }

    /// Total travel length along the route (sum of segment lengths).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Configuration for route construction.
///
/// # Invariants
///
/// `tolerance` must be finite and positive, `default_radius` finite and
/// non-negative, and `search_budget` non-zero when present. Checked by
/// [`RouteConfig::validate`], which every public entry point calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Quantization step used to merge coincident points into one site.
    /// Two points whose coordinates round to the same multiple of this
    /// value are the same site.
    pub tolerance: f64,

    /// Radius emitted for sites where no occurrence specified one.
    pub default_radius: f64,

    /// Cap on search work during one call: sites popped by terminal-distance
    /// and bridge searches, with every scored candidate costing at least
    /// one. `None` disables the cap.
    ///
    /// When the budget runs out, the rest of the walk takes the first
    /// unvisited neighbour in discovery order and backs up along the walk
    /// when stuck.
    pub search_budget: Option<usize>,
}

impl RouteConfig {
    /// Default site quantization step (0.01 units, two decimal places).
    pub const DEFAULT_TOLERANCE: f64 = 0.01;

    /// Default radius for points that do not carry one.
    pub const DEFAULT_RADIUS: f64 = 0.0;

    /// Default cap on search work per call.
    pub const DEFAULT_SEARCH_BUDGET: usize = 20_000_000;

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidConfig`] describing the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if !self.default_radius.is_finite() || self.default_radius < 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "default_radius must be finite and non-negative, got {}",
                self.default_radius
            )));
        }
        if self.search_budget == Some(0) {
            return Err(RouteError::InvalidConfig(
                "search_budget must be non-zero (use null for unbounded)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            default_radius: Self::DEFAULT_RADIUS,
            search_budget: Some(Self::DEFAULT_SEARCH_BUDGET),
        }
    }
}

/// Errors that can occur before routing starts.
///
/// Routing itself never fails: disconnected or degenerate input yields a
/// shorter route rather than an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum RouteError {
    /// Route configuration is invalid.
    #[error("invalid route configuration: {0}")]
    InvalidConfig(String),

    /// An input point has a NaN or infinite component.
    #[error("non-finite coordinate at loop {loop_index}, point {point_index}")]
    NonFiniteCoordinate {
        /// Index of the loop containing the point.
        loop_index: usize,
        /// Index of the point within its loop.
        point_index: usize,
    },
}
