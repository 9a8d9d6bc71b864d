pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "twtfeed")]
#[command(about = "A twtxt feed reader", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/twtfeed/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel workers for fetching feeds
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Html,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and show a single feed
    View {
        /// Feed URL or local path
        source: String,

        /// Label to use when the feed declares no nick
        #[arg(short, long)]
        label: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also list lines that could not be parsed
        #[arg(long)]
        warnings: bool,
    },
    /// Show your own feed and everything you follow, newest first
    Timeline {
        /// Maximum number of entries to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compute the twt hash of an entry
    Hash {
        /// URL of the feed the entry belongs to
        url: String,
        /// Entry timestamp as written in the feed
        timestamp: String,
        /// Entry text as written in the feed
        text: String,
    },
}
