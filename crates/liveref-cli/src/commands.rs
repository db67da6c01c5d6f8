use std::fs;
use std::path::Path as FsPath;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use liveref_engine::{Census, LiveReferences, ScanConfig, ScanResult, SkipObjects};
use liveref_heap::{HeapSnapshot, LoadedHeap};
use liveref_types::LiveObject;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Paths(args) => cmd_paths(args, &cli.format),
        Command::Census(args) => cmd_census(args, &cli.format),
    }
}

fn load_snapshot(path: &FsPath) -> anyhow::Result<LoadedHeap> {
    let snapshot = HeapSnapshot::load(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let loaded = snapshot.materialize().context("failed to build heap from snapshot")?;
    debug!(objects = loaded.object_count(), path = %path.display(), "loaded snapshot");
    Ok(loaded)
}

fn load_config(path: Option<&FsPath>) -> anyhow::Result<ScanConfig> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Ok(ScanConfig::from_toml_str(&text)?)
}

/// Targets resolved against a loaded snapshot, with the scan result.
struct PathsReport {
    targets: Vec<(String, LiveObject)>,
    result: ScanResult,
}

fn scan_paths(args: &PathsArgs) -> anyhow::Result<PathsReport> {
    let loaded = load_snapshot(&args.snapshot)?;
    let config = load_config(args.config.as_deref())?;
    let targets = loaded.objects(&args.targets)?;
    let hints = loaded.objects(&args.hints)?;
    let skip = SkipObjects::from_objects(loaded.objects(&args.skip)?.iter());

    let result = LiveReferences::new(&loaded.heap)
        .with_config(config)
        .from_roots_filtered(&targets, &hints, None, Some(&skip))?;
    Ok(PathsReport {
        targets: args.targets.iter().cloned().zip(targets).collect(),
        result,
    })
}

fn cmd_paths(args: PathsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let report = scan_paths(&args)?;
    match format {
        OutputFormat::Text => print!("{}", render_paths_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_paths_json(&report))?),
    }
    Ok(())
}

fn render_paths_text(report: &PathsReport) -> String {
    let mut out = String::new();
    for (id, target) in &report.targets {
        match report.result.get(target) {
            Some(path) => {
                let refs = format!("({} references)", path.distance());
                out.push_str(&format!("{} {}\n{path}\n\n", id.yellow().bold(), refs.dimmed()));
            }
            None => out.push_str(&format!("{} {}\n\n", id.yellow().bold(), "not reachable".red())),
        }
    }
    let stats = report.result.stats();
    out.push_str(&format!(
        "{} {}/{} found, {} objects visited, {} unresolvable edges\n",
        "Scan:".bold(),
        report.result.len(),
        report.targets.len(),
        stats.visited,
        stats.unresolvable_edges
    ));
    if !report.result.outcome().is_complete() {
        out.push_str(&format!("{}\n", "Scan stopped early; missing targets may still be reachable.".yellow()));
    }
    out
}

fn render_paths_json(report: &PathsReport) -> serde_json::Value {
    let targets: Vec<serde_json::Value> = report
        .targets
        .iter()
        .map(|(id, target)| match report.result.get(target) {
            Some(path) => json!({
                "id": id,
                "found": true,
                "distance": path.distance(),
                "path": path.steps(),
            }),
            None => json!({ "id": id, "found": false }),
        })
        .collect();
    json!({
        "outcome": report.result.outcome(),
        "stats": report.result.stats(),
        "targets": targets,
    })
}

fn take_census(args: &CensusArgs) -> anyhow::Result<Census> {
    let loaded = load_snapshot(&args.snapshot)?;
    let config = load_config(args.config.as_deref())?;
    let roots = loaded.objects(&args.roots)?;
    let skip = SkipObjects::from_objects(loaded.objects(&args.skip)?.iter());
    Ok(LiveReferences::new(&loaded.heap)
        .with_config(config)
        .census(&roots, Some(&skip))?)
}

fn cmd_census(args: CensusArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let census = take_census(&args)?;
    match format {
        OutputFormat::Text => print!("{}", render_census_text(&census)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&census)?),
    }
    if let Some(limit) = args.limit {
        if census.total_size > limit {
            bail!(
                "reachable set is {} bytes, {} over the limit of {limit}",
                census.total_size,
                census.total_size - limit
            );
        }
        if matches!(format, OutputFormat::Text) {
            println!("{} within limit of {limit} bytes", "✓".green().bold());
        }
    }
    Ok(())
}

fn render_census_text(census: &Census) -> String {
    let mut out = format!(
        "{} {} objects, {} bytes\n",
        "Census:".bold(),
        census.total_objects,
        census.total_size
    );
    for (name, stats) in census.largest_types() {
        out.push_str(&format!("  {}: {}, {}B\n", name.cyan(), stats.count, stats.size));
    }
    if census.unresolvable_edges > 0 {
        out.push_str(&format!("  {} unresolvable edges\n", census.unresolvable_edges.to_string().yellow()));
    }
    if census.partial {
        out.push_str(&format!("{}\n", "Census stopped early.".yellow()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const SNAPSHOT: &str = r#"{
        "classes": [
            { "name": "Cache", "fields": [{ "name": "entries", "kind": "reference" }] },
            { "name": "Entry", "fields": [
                { "name": "value", "kind": "reference" },
                { "name": "hits", "kind": "primitive" }
            ] }
        ],
        "objects": [
            { "kind": "instance", "id": "cache", "class": "Cache", "fields": { "entries": "table" } },
            { "kind": "array", "id": "table", "element_type": "Entry", "items": ["e1", null] },
            { "kind": "instance", "id": "e1", "class": "Entry", "fields": { "value": "leak", "hits": 3 } },
            { "kind": "string", "id": "leak", "value": "payload" },
            { "kind": "string", "id": "stray", "value": "unreferenced" }
        ],
        "statics": [{ "owner": "App", "field": "CACHE", "object": "cache" }]
    }"#;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        file
    }

    fn paths_args(snapshot: PathBuf, targets: &[&str]) -> PathsArgs {
        PathsArgs {
            snapshot,
            targets: targets.iter().map(|s| s.to_string()).collect(),
            hints: Vec::new(),
            skip: Vec::new(),
            config: None,
        }
    }

    #[test]
    fn paths_report_finds_and_misses() {
        colored::control::set_override(false);
        let file = snapshot_file();
        let report = scan_paths(&paths_args(file.path().to_path_buf(), &["leak", "stray"])).unwrap();
        let text = render_paths_text(&report);
        assert!(text.contains("leak (3 references)\nstatic App.CACHE->\nCache@"));
        assert!(text.contains("-entries->\nEntry[]@"));
        assert!(text.contains("-[0]->\nEntry@"));
        assert!(text.contains("-value->\nString@"));
        assert!(text.contains("stray not reachable"));
        assert!(text.contains("1/2 found"));
    }

    #[test]
    fn paths_json_shape() {
        let file = snapshot_file();
        let report = scan_paths(&paths_args(file.path().to_path_buf(), &["leak"])).unwrap();
        let value = render_paths_json(&report);
        assert_eq!(value["outcome"], "all_found");
        assert_eq!(value["targets"][0]["found"], true);
        assert_eq!(value["targets"][0]["distance"], 3);
        assert_eq!(value["targets"][0]["path"][0]["reference"], "static App.CACHE");
        assert_eq!(value["targets"][0]["path"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn skip_blocks_only_route() {
        let file = snapshot_file();
        let mut args = paths_args(file.path().to_path_buf(), &["leak"]);
        args.skip = vec!["e1".into()];
        let report = scan_paths(&args).unwrap();
        assert!(report.result.is_empty());
    }

    #[test]
    fn config_file_is_applied() {
        let file = snapshot_file();
        let mut config = tempfile::NamedTempFile::new().unwrap();
        config.write_all(b"static_roots = false\n").unwrap();
        let mut args = paths_args(file.path().to_path_buf(), &["leak"]);
        args.config = Some(config.path().to_path_buf());
        assert!(scan_paths(&args).unwrap().result.is_empty());

        args.hints = vec!["table".into()];
        let report = scan_paths(&args).unwrap();
        assert_eq!(report.result.len(), 1);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let file = snapshot_file();
        assert!(scan_paths(&paths_args(file.path().to_path_buf(), &["ghost"])).is_err());
    }

    #[test]
    fn census_counts_cache() {
        colored::control::set_override(false);
        let file = snapshot_file();
        let args = CensusArgs {
            snapshot: file.path().to_path_buf(),
            roots: vec!["cache".into()],
            skip: Vec::new(),
            limit: None,
            config: None,
        };
        let census = take_census(&args).unwrap();
        assert_eq!(census.total_objects, 4);
        assert_eq!(census.by_type["String"].count, 1);
        let text = render_census_text(&census);
        assert!(text.starts_with(&format!("Census: 4 objects, {} bytes\n", census.total_size)));
    }

    #[test]
    fn census_over_limit_fails() {
        let file = snapshot_file();
        let args = CensusArgs {
            snapshot: file.path().to_path_buf(),
            roots: vec!["cache".into()],
            skip: Vec::new(),
            limit: Some(1),
            config: None,
        };
        let err = cmd_census(args, &OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("over the limit of 1"));
    }
}
