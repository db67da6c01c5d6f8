use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "liveref",
    about = "Find what keeps objects alive in a heap snapshot",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show reference paths from GC roots to target objects
    Paths(PathsArgs),
    /// Count objects and bytes reachable from the given objects
    Census(CensusArgs),
}

#[derive(Args)]
pub struct PathsArgs {
    /// Heap snapshot (JSON)
    pub snapshot: PathBuf,
    /// Object id to find a path to
    #[arg(short, long = "target", required = true)]
    pub targets: Vec<String>,
    /// Object id to treat as an extra root
    #[arg(long = "hint")]
    pub hints: Vec<String>,
    /// Object id the paths must not pass through
    #[arg(long = "skip")]
    pub skip: Vec<String>,
    /// Scan configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CensusArgs {
    /// Heap snapshot (JSON)
    pub snapshot: PathBuf,
    /// Object id to start counting from
    #[arg(short, long = "root", required = true)]
    pub roots: Vec<String>,
    /// Object id to leave out, together with what only it reaches
    #[arg(long = "skip")]
    pub skip: Vec<String>,
    /// Fail when the total exceeds this many bytes
    #[arg(long)]
    pub limit: Option<usize>,
    /// Scan configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_paths() {
        let cli = Cli::try_parse_from(["liveref", "paths", "heap.json", "-t", "a", "--target", "b"]).unwrap();
        if let Command::Paths(args) = cli.command {
            assert_eq!(args.snapshot, PathBuf::from("heap.json"));
            assert_eq!(args.targets, vec!["a", "b"]);
            assert!(args.hints.is_empty());
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn paths_requires_target() {
        assert!(Cli::try_parse_from(["liveref", "paths", "heap.json"]).is_err());
    }

    #[test]
    fn parse_paths_with_hints_and_skip() {
        let cli = Cli::try_parse_from([
            "liveref", "paths", "heap.json", "-t", "leak", "--hint", "h", "--skip", "x", "--skip", "y",
            "--config", "scan.toml",
        ])
        .unwrap();
        if let Command::Paths(args) = cli.command {
            assert_eq!(args.hints, vec!["h"]);
            assert_eq!(args.skip, vec!["x", "y"]);
            assert_eq!(args.config, Some(PathBuf::from("scan.toml")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_census_json() {
        let cli = Cli::try_parse_from(["liveref", "--format", "json", "census", "heap.json", "-r", "cache", "--limit", "4096"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        if let Command::Census(args) = cli.command {
            assert_eq!(args.roots, vec!["cache"]);
            assert_eq!(args.limit, Some(4096));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["liveref", "census", "heap.json", "-r", "x", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
