use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "auto-catalog")]
#[command(about = "Sort loose Markdown notes into your vault's folder taxonomy with an LLM")]
#[command(version)]
pub struct Cli {
    /// Verbose output (raw and sanitized classifier answers)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory to start the vault search from (default: current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Config file (default: <vault>/.obsidian/auto-catalog.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify Markdown files and move them into their category folders
    Sort {
        /// Files or directories to process (directories are searched recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Dry run (show destinations, don't move anything)
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Overwrite a file with the same name at the destination
        #[arg(short, long)]
        force: bool,
    },

    /// Show the flattened category table
    Categories,

    /// Write a starter config into the vault
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
