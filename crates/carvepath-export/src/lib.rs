//! carvepath-export: Pure format serializers (sans-IO)
//!
//! Converts routes into output formats. Currently supports SVG.

pub mod svg;

pub use svg::{SvgMetadata, SvgOptions, build_path_data, to_svg};
