//! CLI entry point for dirload.
//!
//! This binary scans a directory tree and prints the assembled dictionary as
//! JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! dirload [OPTIONS] <COMMAND>
//!
//! # Load every controller into a dictionary keyed by identity
//! dirload load api/controllers --filter '(.+)Controller\.json$'
//!
//! # Report which config files exist without loading them
//! dirload exists config --filter '(.+)\.json$'
//!
//! # Deep-merge every config file into one dictionary
//! dirload aggregate config
//!
//! # Flat listing of every file up to ten levels deep
//! dirload list assets
//!
//! # Raw nested tree, options taken from a file
//! dirload --config scan.json tree
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use dl_core::ScanOptions;
use dl_scanner::presets::{self, DEFAULT_EXCLUDE_DIRS};
use dl_scanner::{FileLoader, nonblocking};
use tokio::task::spawn_blocking;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Recursively scan a directory and print its matched files as one JSON dictionary.
#[derive(Parser, Debug)]
#[command(name = "dirload", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON file with scan options. Command-line flags override its values.
    #[arg(short, long, global = true, env = "DIRLOAD_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Print compact JSON instead of pretty-printed JSON.
    #[arg(long, global = true)]
    compact: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every matched file into a dictionary keyed by identity.
    Load(ScanArgs),

    /// Mark every matched file with `true` without loading it.
    Exists(ScanArgs),

    /// Deep-merge every matched file into one dictionary.
    Aggregate(ScanArgs),

    /// List matched files as a flat map of relative paths.
    List(ScanArgs),

    /// Print the raw nested tree, before identity resolution.
    Tree(ScanArgs),
}

impl Commands {
    const fn args(&self) -> &ScanArgs {
        match self {
            Self::Load(args)
            | Self::Exists(args)
            | Self::Aggregate(args)
            | Self::List(args)
            | Self::Tree(args) => args,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Exists(_) => "exists",
            Self::Aggregate(_) => "aggregate",
            Self::List(_) => "list",
            Self::Tree(_) => "tree",
        }
    }
}

/// Scan options shared by every subcommand.
///
/// Flags only ever switch behavior on; switch it off in the options file.
#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(env = "DIRLOAD_ROOT")]
    root: Option<Utf8PathBuf>,

    /// Regex on file names; the first capture group becomes the key.
    #[arg(short, long, env = "DIRLOAD_FILTER")]
    filter: Option<String>,

    /// Regex on `/`-prefixed relative paths.
    #[arg(long)]
    path_filter: Option<String>,

    /// Capture group of `--path-filter` that supplies the key.
    #[arg(long)]
    path_key_group: Option<usize>,

    /// Regex on directory names to skip.
    #[arg(long, env = "DIRLOAD_EXCLUDE_DIRS")]
    exclude_dirs: Option<String>,

    /// Regex on relative paths to skip (repeatable).
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Maximum directory depth to traverse.
    #[arg(short, long, env = "DIRLOAD_DEPTH")]
    depth: Option<usize>,

    /// Treat a missing directory as empty.
    #[arg(long)]
    optional: bool,

    /// Skip files that fail to load.
    #[arg(long)]
    ignore_load_failures: bool,

    /// Record matched files as `true` without loading them.
    #[arg(long)]
    skip_load: bool,

    /// Fold subdirectory entries into their parent.
    #[arg(long)]
    flatten: bool,

    /// Prefix flattened keys with their directory path.
    #[arg(long)]
    keep_path: bool,

    /// Tag directories with `"isDirectory": true`.
    #[arg(long)]
    mark_directories: bool,

    /// Allow key collisions (last one wins).
    #[arg(long)]
    allow_duplicates: bool,

    /// Key resources by their global name instead of their identity.
    #[arg(long)]
    use_global_name: bool,

    /// Keep filename keys and skip identity annotation.
    #[arg(long)]
    no_identity: bool,

    /// Regex rewritten in filename-derived identities.
    #[arg(long)]
    identity_rewrite: Option<String>,

    /// Replacement text for `--identity-rewrite`.
    #[arg(long, requires = "identity_rewrite")]
    identity_replacement: Option<String>,

    /// Follow symbolic links.
    #[arg(long)]
    follow_links: bool,
}

impl ScanArgs {
    /// Overlays the flags that were given onto `options`.
    fn apply(&self, options: &mut ScanOptions) {
        if let Some(root) = &self.root {
            options.root_path.clone_from(root);
        }
        if let Some(filter) = &self.filter {
            options.name_filter = Some(filter.clone());
        }
        if let Some(filter) = &self.path_filter {
            options.path_filter = Some(filter.clone());
        }
        if let Some(group) = self.path_key_group {
            options.path_key_group = group;
        }
        if let Some(pattern) = &self.exclude_dirs {
            options.exclude_dirs = Some(pattern.clone());
        }
        options.exclude_paths.extend(self.exclude.iter().cloned());
        if let Some(depth) = self.depth {
            options.max_depth = Some(depth);
        }
        if let Some(pattern) = &self.identity_rewrite {
            options.identity_rewrite = Some(pattern.clone());
        }
        if let Some(replacement) = &self.identity_replacement {
            options.identity_replacement.clone_from(replacement);
        }

        options.optional_if_missing |= self.optional;
        options.ignore_load_failures |= self.ignore_load_failures;
        options.skip_load |= self.skip_load;
        options.flatten |= self.flatten;
        options.keep_path_on_flatten |= self.keep_path;
        options.mark_directories |= self.mark_directories;
        options.allow_duplicate_keys |= self.allow_duplicates;
        options.use_global_name_for_key |= self.use_global_name;
        options.follow_links |= self.follow_links;
        if self.no_identity {
            options.resolve_identity = false;
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so that
/// stdout stays clean JSON and stderr stays quiet.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Resolves the scan options from the options file and the flags.
///
/// # Errors
///
/// Returns an error if the options file cannot be read or no root is given.
fn build_options(config: Option<&Utf8PathBuf>, args: &ScanArgs) -> color_eyre::Result<ScanOptions> {
    let mut options = match config {
        Some(path) => ScanOptions::from_json_file(path)
            .wrap_err_with(|| format!("Failed to load options from {path}"))?,
        None => ScanOptions::default(),
    };
    args.apply(&mut options);

    if options.root_path.as_str().is_empty() {
        return Err(eyre!(
            "No directory to scan: pass one as an argument, set DIRLOAD_ROOT, or set `root_path` in --config"
        ));
    }
    Ok(options)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs one subcommand and returns the JSON it produced.
///
/// # Errors
///
/// Returns an error if the scan fails.
async fn run(command: &Commands, options: ScanOptions) -> color_eyre::Result<serde_json::Value> {
    info!(command = command.name(), root = %options.root_path, "Running command");

    let value = match command {
        Commands::Load(_) => {
            let mut options = options;
            if options.exclude_dirs.is_none() {
                options.exclude_dirs = Some(DEFAULT_EXCLUDE_DIRS.to_owned());
            }
            nonblocking::build(options, Arc::new(FileLoader::new()))
                .await?
                .to_json()
        }
        Commands::Tree(_) => nonblocking::walk(options, Arc::new(FileLoader::new()))
            .await?
            .to_json(),
        Commands::Exists(_) => spawn_blocking(move || presets::exists(options))
            .await??
            .to_json(),
        Commands::Aggregate(_) => {
            spawn_blocking(move || presets::aggregate(options, FileLoader::new()))
                .await??
                .to_json()
        }
        Commands::List(_) => spawn_blocking(move || presets::scan_listing(options))
            .await??
            .to_json(),
    };
    Ok(value)
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Writes `value` to stdout followed by a newline.
fn print_json(value: &serde_json::Value, compact: bool) -> color_eyre::Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{rendered}")?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve options and run
    let options = build_options(cli.config.as_ref(), cli.command.args())?;
    let value = run(&cli.command, options).await?;
    print_json(&value, cli.compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dirload").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_map_onto_options() {
        let cli = parse(&[
            "load",
            "api/controllers",
            "--filter",
            r"(.+)Controller\.json$",
            "--depth",
            "2",
            "-x",
            "^fixtures",
            "--exclude",
            r"\.bak$",
            "--optional",
            "--use-global-name",
            "--no-identity",
        ]);
        let options = build_options(None, cli.command.args()).unwrap();

        assert_eq!(options.root_path, "api/controllers");
        assert_eq!(options.name_filter.as_deref(), Some(r"(.+)Controller\.json$"));
        assert_eq!(options.max_depth, Some(2));
        assert_eq!(options.exclude_paths, [r"^fixtures", r"\.bak$"]);
        assert!(options.optional_if_missing);
        assert!(options.use_global_name_for_key);
        assert!(!options.resolve_identity);
        assert!(options.force_reload);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["list", "assets", "--compact", "-v"]);
        assert!(cli.compact);
        assert!(cli.verbose);
        assert_eq!(cli.command.name(), "list");
    }

    #[test]
    fn test_flags_override_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("scan.json")).unwrap();
        std::fs::write(
            &path,
            r#"{"root_path": "from-file", "name_filter": "(.+)\\.json$", "flatten": true}"#,
        )
        .unwrap();

        let cli = parse(&["tree", "from-flag"]);
        let options = build_options(Some(&path), cli.command.args()).unwrap();
        assert_eq!(options.root_path, "from-flag");
        assert_eq!(options.name_filter.as_deref(), Some(r"(.+)\.json$"));
        assert!(options.flatten);
    }

    #[test]
    fn test_missing_root_is_reported() {
        let args = ScanArgs::default();
        assert!(build_options(None, &args).is_err());
    }

    #[test]
    fn test_identity_replacement_requires_rewrite() {
        let result = Cli::try_parse_from(["dirload", "load", "x", "--identity-replacement", "y"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_list_command() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        std::fs::create_dir_all(root.join("lib")).unwrap();
        std::fs::write(root.join("lib/a.js"), "").unwrap();

        let cli = parse(&["list", root.as_str()]);
        let options = build_options(None, cli.command.args()).unwrap();
        let value = run(&cli.command, options).await.unwrap();
        assert_eq!(value, serde_json::json!({ "lib/a.js": true }));
    }

    #[tokio::test]
    async fn test_run_exists_and_aggregate_commands() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        std::fs::write(root.join("a.json"), r#"{"log": {"level": "info"}}"#).unwrap();
        std::fs::write(root.join("b.json"), r#"{"log": {"color": false}}"#).unwrap();

        let cli = parse(&["exists", root.as_str(), "--filter", r"(.+)\.json$"]);
        let options = build_options(None, cli.command.args()).unwrap();
        let value = run(&cli.command, options).await.unwrap();
        assert_eq!(value, serde_json::json!({ "a": true, "b": true }));

        let cli = parse(&["aggregate", root.as_str()]);
        let options = build_options(None, cli.command.args()).unwrap();
        let value = run(&cli.command, options).await.unwrap();
        assert_eq!(value, serde_json::json!({ "log": { "level": "info", "color": false } }));
    }
}
