use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scm-tree")]
#[command(about = "A TUI for browsing pending source-control changes as a tree")]
pub struct Cli {
    #[command(flatten)]
    pub options: TreeOptions,

    /// Send debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Overrides applied on top of the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct TreeOptions {
    /// JSON configuration file
    #[arg(long = "settings", global = true)]
    pub settings: Option<PathBuf>,

    /// Minimum number of files sharing a folder before it is shown as a node
    #[arg(long, global = true)]
    pub threshold: Option<usize>,

    /// Start in tree layout
    #[arg(long, global = true, conflicts_with = "flat")]
    pub tree: bool,

    /// Start in flat layout
    #[arg(long, global = true)]
    pub flat: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive TUI (default)
    Run {
        /// Directory inside the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Generate a screenshot from a JSON snapshot
    Screenshot {
        /// Path to the JSON snapshot file
        #[arg(short, long)]
        config: PathBuf,
        /// Output file for the screenshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Terminal width for rendering
        #[arg(long, default_value = "120")]
        width: u16,
        /// Terminal height for rendering
        #[arg(long, default_value = "40")]
        height: u16,
    },
    /// Execute a command against a snapshot and output the resulting snapshot
    Execute {
        /// Path to the JSON snapshot file
        #[arg(short, long)]
        config: PathBuf,
        /// Command to execute (e.g., "down", "next_change", "sequence:[home,right]")
        #[arg(short = 'x', long)]
        command: String,
        /// Output file for the resulting snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also print a screenshot of the result to stderr
        #[arg(long)]
        screenshot: bool,
        /// Terminal width for screenshot (if enabled)
        #[arg(long, default_value = "120")]
        width: u16,
        /// Terminal height for screenshot (if enabled)
        #[arg(long, default_value = "40")]
        height: u16,
    },
    /// Print the change tree of a repository and exit
    Status {
        /// Directory inside the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
