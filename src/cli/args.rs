//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental utility-CSS compiler for no-build HTML projects
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: manifest.toml)
    #[arg(short = 'C', long, default_value = "manifest.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new project from template
    #[command(visible_alias = "i")]
    Init {
        /// Project directory name/path (relative to current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        name: Option<PathBuf>,

        /// Print the config template instead of writing files
        #[arg(long)]
        dry: bool,
    },

    /// Compile the utility stylesheet once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Recompile on file changes and lifecycle events
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Read lifecycle events as JSON lines from stdin
        #[arg(short, long)]
        events: bool,
    },

    /// Inspect or reset the compiled CSS cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// List cached entries
    List,
    /// Remove entries older than `cache.max_age_hours`
    Prune,
    /// Remove every entry
    Clear,
}

/// Shared build arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Minify the generated CSS
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Inject the utility `<style>` into the entry page
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub inject: Option<bool>,

    /// Output stylesheet path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Neither read nor write the compiled CSS cache
    #[arg(long)]
    pub no_cache: bool,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    /// Commands that compile and therefore need a valid project.
    pub const fn needs_project(&self) -> bool {
        matches!(self.command, Commands::Build { .. } | Commands::Watch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from(["manifest-css", "build", "-m", "--inject=false", "-o", "out.css"]);
        let Commands::Build { build_args } = &cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.minify, Some(true));
        assert_eq!(build_args.inject, Some(false));
        assert_eq!(build_args.output, Some(PathBuf::from("out.css")));
        assert!(!build_args.no_cache);
        assert!(cli.needs_project());
    }

    #[test]
    fn test_parse_watch_and_globals() {
        let cli = Cli::parse_from(["manifest-css", "-C", "site/manifest.toml", "watch", "--events", "-v"]);
        assert!(matches!(cli.command, Commands::Watch { events: true, .. }));
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site/manifest.toml"));
    }

    #[test]
    fn test_parse_cache_and_init() {
        let cli = Cli::parse_from(["manifest-css", "cache", "prune"]);
        assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Prune }));
        assert!(!cli.needs_project());

        let cli = Cli::parse_from(["manifest-css", "init", "demo", "--dry"]);
        assert!(cli.is_init());
    }
}
