//! Skeleton input files.
//!
//! A skeleton file is JSON holding either one loop (an array of points)
//! or several loops (an array of arrays of points). Each point is an
//! object with `x`, `y` and an optional `r`.

use std::io::Read;
use std::path::Path;

use carvepath_route::SkeletonPoint;
use serde::Deserialize;

/// Parsed skeleton file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkeletonInput {
    /// Several loops sharing one site map.
    Loops(Vec<Vec<SkeletonPoint>>),
    /// A single loop.
    Loop(Vec<SkeletonPoint>),
}

impl SkeletonInput {
    /// Normalize to a list of loops.
    pub fn into_loops(self) -> Vec<Vec<SkeletonPoint>> {
        match self {
            Self::Loops(loops) => loops,
            Self::Loop(points) => vec![points],
        }
    }
}

/// Parse skeleton JSON text.
pub fn parse_input(text: &str) -> Result<SkeletonInput, String> {
    serde_json::from_str(text).map_err(|e| format!("Error parsing skeleton JSON: {e}"))
}

/// Read and parse a skeleton file; `-` reads stdin.
pub fn read_input(path: &Path) -> Result<SkeletonInput, String> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("Error reading stdin: {e}"))?;
        text
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display()))?
    };
    parse_input(&text)
}
