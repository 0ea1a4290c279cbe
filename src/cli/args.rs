//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Decision trees you can build, walk one choice at a time, and round-trip through JSON
#[derive(Parser, Debug)]
#[command(name = "dectree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output on stderr (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Tree file (JSON record, default: `tree_file` from config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tree structure
    Show,

    /// Show node, leaf and end-node counts and the height
    Stats,

    /// List leaf ids in depth-first order
    Leaves,

    /// Show a node and its path from the root
    Find {
        /// Node id
        id: String,
    },

    /// Walk the tree from the root, one choice per argument (`..` goes back)
    Walk {
        /// Child ids to follow
        choices: Vec<String>,
    },

    /// Print the normalized JSON record
    Export,

    /// Check that the tree file is well formed
    Validate,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
