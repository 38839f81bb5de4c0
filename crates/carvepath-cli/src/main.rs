//! carvepath: route medial-axis skeletons into V-carve toolpaths.
//!
//! Reads a skeleton point file, orders the points into one continuous
//! traversal, and writes the route as JSON. Optionally renders the route
//! to SVG and prints per-stage diagnostics. Useful for:
//!
//! - Producing tool motion input from a skeletonizer's output
//! - Tuning the merge tolerance and search budget
//! - Checking that repeated runs produce identical routes
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin carvepath -- [OPTIONS] <INPUT>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod input;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use carvepath_route::diagnostics::{RouteDiagnostics, SystemClock, route_with_diagnostics};
use carvepath_route::{Route, RouteConfig, SkeletonPoint};
use clap::Parser;

use crate::logging::LogLevel;

/// Route a medial-axis skeleton into a single V-carve toolpath.
///
/// Input is JSON: an array of `{"x", "y", "r"?}` points (one loop) or an
/// array of such arrays (several loops). The route is written as a JSON
/// array of `{"x", "y", "r"}` points.
#[derive(Parser)]
#[command(name = "carvepath", version)]
struct Cli {
    /// Path to the skeleton JSON file, or `-` for stdin.
    input: PathBuf,

    /// Merge tolerance: points rounding to the same multiple are one site.
    #[arg(long, default_value_t = RouteConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Tool radius for points that do not carry one.
    #[arg(long, default_value_t = RouteConfig::DEFAULT_RADIUS)]
    default_radius: f64,

    /// Cap on search work, scoring plus bridging (0 = unbounded).
    #[arg(long, default_value_t = RouteConfig::DEFAULT_SEARCH_BUDGET)]
    search_budget: usize,

    /// Full route config as a JSON string.
    ///
    /// When provided, the individual config flags are ignored.
    /// The JSON must be a valid `RouteConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write route JSON to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write an SVG rendering of the route to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Draw tool-radius circles in the SVG.
    #[arg(long, requires = "svg")]
    show_radius: bool,

    /// Print a diagnostics report to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON (implies --diagnostics).
    #[arg(long)]
    json: bool,

    /// Route this many times and fail unless every run is identical.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

/// Build a [`RouteConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual config flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<RouteConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str::<RouteConfig>(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        RouteConfig {
            tolerance: cli.tolerance,
            default_radius: cli.default_radius,
            search_budget: (cli.search_budget > 0).then_some(cli.search_budget),
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.log_level) {
        eprintln!("Error initializing logger: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;
    let loops = input::read_input(&cli.input)?.into_loops();
    log::info!(
        "cli.input: path={} loops={} points={}",
        cli.input.display(),
        loops.len(),
        loops.iter().map(Vec::len).sum::<usize>(),
    );

    let (route, all_diagnostics) = route_runs(&loops, &config, cli.runs)?;

    if cli.diagnostics || cli.json {
        for diagnostics in &all_diagnostics {
            if cli.json {
                let json = serde_json::to_string_pretty(diagnostics)
                    .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
                eprintln!("{json}");
            } else {
                eprintln!("{}", diagnostics.report());
            }
        }
        if all_diagnostics.len() > 1 {
            print_multi_run_summary(&all_diagnostics);
        }
    }

    write_route(&route, cli.output.as_deref())?;

    if let Some(ref svg_path) = cli.svg {
        write_svg(&route, &config, cli, svg_path)?;
    }

    Ok(())
}

/// Route `runs` times, failing if any run differs from the first.
fn route_runs(
    loops: &[Vec<SkeletonPoint>],
    config: &RouteConfig,
    runs: usize,
) -> Result<(Route, Vec<RouteDiagnostics>), String> {
    let mut first: Option<Route> = None;
    let mut all_diagnostics = Vec::with_capacity(runs);

    for run in 0..runs {
        let (route, diagnostics) = route_with_diagnostics(loops, config, &SystemClock)
            .map_err(|e| format!("Routing error: {e}"))?;

        if let Some(ref expected) = first {
            let expected_fingerprint = all_diagnostics
                .first()
                .map_or(0, |d: &RouteDiagnostics| d.summary.fingerprint);
            if diagnostics.summary.fingerprint != expected_fingerprint || route != *expected {
                return Err(format!(
                    "Run {} produced a different route (fingerprint {:016x}, expected {expected_fingerprint:016x})",
                    run + 1,
                    diagnostics.summary.fingerprint,
                ));
            }
        } else {
            first = Some(route);
        }
        all_diagnostics.push(diagnostics);
    }

    let route = first.unwrap_or_default();
    Ok((route, all_diagnostics))
}

fn write_route(route: &Route, output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(route)
        .map_err(|e| format!("Error serializing route: {e}"))?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .map_err(|e| format!("Error writing route to {}: {e}", path.display()))?;
            eprintln!(
                "Route written to {} ({} points)",
                path.display(),
                route.len()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn write_svg(route: &Route, config: &RouteConfig, cli: &Cli, path: &Path) -> Result<(), String> {
    let title = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("carvepath");
    let description = format!(
        "tolerance={} default_radius={} search_budget={}",
        config.tolerance,
        config.default_radius,
        config
            .search_budget
            .map_or_else(|| "unbounded".to_string(), |b| b.to_string()),
    );
    let config_json = serde_json::to_string(config)
        .map_err(|e| format!("Error serializing config: {e}"))?;
    let metadata = carvepath_export::SvgMetadata {
        title: Some(title),
        description: Some(&description),
        config_json: Some(&config_json),
    };
    let options = carvepath_export::SvgOptions {
        show_radius: cli.show_radius,
    };
    let svg = carvepath_export::to_svg(route, &metadata, options);
    std::fs::write(path, &svg)
        .map_err(|e| format!("Error writing SVG to {}: {e}", path.display()))?;
    eprintln!("SVG written to {} ({} bytes)", path.display(), svg.len());
    Ok(())
}

/// Print aggregated timing across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[RouteDiagnostics]) {
    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();
    if durations.is_empty() {
        return;
    }

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    eprintln!();
    eprintln!(
        "Summary ({} runs, identical routes)\n{}",
        durations.len(),
        "=".repeat(60),
    );
    eprintln!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("carvepath").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_route_config() {
        let cli = parse(&["skeleton.json"]);
        assert_eq!(config_from_cli(&cli).unwrap(), RouteConfig::default());
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.runs, 1);
    }

    #[test]
    fn zero_search_budget_means_unbounded() {
        let cli = parse(&["skeleton.json", "--search-budget", "0"]);
        assert_eq!(config_from_cli(&cli).unwrap().search_budget, None);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "skeleton.json",
            "--tolerance",
            "0.5",
            "--config-json",
            r#"{"tolerance": 0.25, "search_budget": null}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.tolerance - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.search_budget, None);
        assert!((config.default_radius - RouteConfig::DEFAULT_RADIUS).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let cli = parse(&["skeleton.json", "--tolerance", "0"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("tolerance"), "{err}");
    }

    #[test]
    fn zero_runs_is_rejected() {
        let result = Cli::try_parse_from(["carvepath", "skeleton.json", "--runs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn show_radius_requires_svg() {
        let result = Cli::try_parse_from(["carvepath", "skeleton.json", "--show-radius"]);
        assert!(result.is_err());
    }

    #[test]
    fn repeated_runs_agree() {
        let loops = vec![vec![
            SkeletonPoint::new(0.0, 0.0),
            SkeletonPoint::new(1.0, 0.0),
            SkeletonPoint::new(2.0, 0.0),
            SkeletonPoint::new(1.0, 0.0),
        ]];
        let (route, diagnostics) = route_runs(&loops, &RouteConfig::default(), 3).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(diagnostics.len(), 3);
    }
}
