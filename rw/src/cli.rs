//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

/// ReleaseWatch - email once per new upstream release
#[derive(Parser)]
#[command(
    name = "rw",
    about = "Watch GitHub projects and email when a new release is published",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `check`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every project once, notify on new releases, then exit
    Check {
        /// Output format for the run report
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check repeatedly until interrupted
    Watch {
        /// Seconds between runs (overrides watch.poll-interval-secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// List tracked projects
    Projects,

    /// Show the checkpointed tag of every tracked project
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Forget the checkpointed tag of a project so its current release is announced again
    Reset {
        /// Project name or owner/name
        project: String,
    },
}

/// Output format for check/status commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}
