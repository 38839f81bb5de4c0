//! SVG export serializer.
//!
//! Converts a [`Route`] into an SVG string using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! The whole route becomes a single `<path>` element using `M` (move to)
//! and `L` (line to) commands, since a route is one continuous tool
//! motion. Optional [`SvgOptions::show_radius`] adds one `<circle>` per
//! point sized to the tool radius at that point, which previews the
//! material the V-bit removes.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use carvepath_route::{Route, RoutePoint};

/// Smallest padding around the route bounding box, in route units.
const MIN_PADDING: f64 = 1.0;

/// Namespace of the `<carvepath:route>` element inside `<metadata>`.
const METADATA_NAMESPACE: &str = "urn:carvepath:route:1";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the input skeleton filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized route configuration, emitted inside a `<metadata>`
    /// element wrapped in a namespaced `<carvepath:route>` element so
    /// exported files carry the settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Rendering switches for [`to_svg`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SvgOptions {
    /// Draw a circle of the tool radius at every route point.
    pub show_radius: bool,
}

/// Build an SVG path `d` attribute string from a route.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for routes with fewer than 2 points.
///
/// Coordinates are formatted by the [`svg`] crate using `f32` precision.
///
/// # Examples
///
/// ```
/// use carvepath_route::{Route, RoutePoint};
/// use carvepath_export::build_path_data;
///
/// let route = Route::new(vec![
///     RoutePoint::new(10.0, 20.0, 0.5),
///     RoutePoint::new(30.0, 40.0, 0.5),
/// ]);
/// assert_eq!(build_path_data(&route), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(route: &Route) -> String {
    let points = route.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Axis-aligned bounds of the route, padded by the largest tool radius
/// (at least [`MIN_PADDING`]). An empty route is centred on the origin.
///
/// Returns `(min_x, min_y, width, height)`.
fn padded_bounds(points: &[RoutePoint]) -> (f64, f64, f64, f64) {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut max_r: f64 = 0.0;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
        max_r = max_r.max(p.r);
    }
    if points.is_empty() {
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
    }

    let pad = max_r.max(MIN_PADDING);
    (
        min_x - pad,
        min_y - pad,
        2.0f64.mul_add(pad, max_x - min_x),
        2.0f64.mul_add(pad, max_y - min_y),
    )
}

/// Serialize a route into an SVG document string.
///
/// The `viewBox` is the bounding box of the route, padded on every side
/// by the largest tool radius (never less than one unit). A route with
/// 2 or more points becomes one `<path>` element; shorter routes emit no
/// path.
///
/// If [`SvgMetadata::title`] or [`SvgMetadata::description`] is
/// provided, the corresponding `<title>` / `<desc>` element is emitted
/// after the opening `<svg>` tag. If [`SvgMetadata::config_json`] is
/// provided, a `<metadata>` element is emitted containing the JSON
/// wrapped in a namespaced `<carvepath:route>` element.
///
/// # Examples
///
/// ```
/// use carvepath_route::{Route, RoutePoint};
/// use carvepath_export::{SvgMetadata, SvgOptions, to_svg};
///
/// let route = Route::new(vec![
///     RoutePoint::new(10.0, 15.0, 0.5),
///     RoutePoint::new(12.5, 18.3, 0.5),
/// ]);
/// let metadata = SvgMetadata {
///     title: Some("letter-a"),
///     description: Some("Exported by carvepath"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&route, &metadata, SvgOptions::default());
/// assert!(svg.contains("<title>letter-a</title>"));
/// assert!(svg.contains("<desc>Exported by carvepath</desc>"));
/// assert!(svg.contains("M10,15 L12.5,18.3"));
/// ```
#[must_use]
pub fn to_svg(route: &Route, metadata: &SvgMetadata<'_>, options: SvgOptions) -> String {
    let (min_x, min_y, width, height) = padded_bounds(route.points());
    let mut doc = Document::new().set("viewBox", format!("{min_x} {min_y} {width} {height}"));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut route_el = Element::new("carvepath:route");
        route_el.assign("xmlns:carvepath", METADATA_NAMESPACE);
        route_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(route_el);
        doc = doc.add(metadata_el);
    }

    if options.show_radius && !route.is_empty() {
        let mut group = Group::new()
            .set("id", "tool-radius")
            .set("fill", "none")
            .set("stroke", "#999999")
            .set("vector-effect", "non-scaling-stroke");
        for p in route.points().iter().filter(|p| p.r > 0.0) {
            group = group.add(Circle::new().set("cx", p.x).set("cy", p.y).set("r", p.r));
        }
        doc = doc.add(group);
    }

    let d = build_path_data(route);
    if !d.is_empty() {
        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1)
            .set("vector-effect", "non-scaling-stroke");
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
