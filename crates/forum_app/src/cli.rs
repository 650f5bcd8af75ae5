use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use forum_core::StopBound;

use crate::config::{AppConfig, CacheSetting};

#[derive(Debug, Parser)]
#[command(
    name = "forum_harvest",
    version,
    about = "Harvest comments, user histories and topic listings from a forum"
)]
pub(crate) struct Cli {
    /// RON configuration file (default: ./forum_harvest.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Forum root URL
    #[arg(long, global = true)]
    pub site: Option<String>,

    /// Page cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// How fetched pages interact with the cache
    #[arg(long, global = true, value_enum)]
    pub cache_mode: Option<CacheSetting>,

    /// Append every raw comment cell to this file
    #[arg(long, global = true)]
    pub audit: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print every page of a topic thread as JSON lines
    Post {
        /// URL of the thread's first page
        url: String,
        #[command(flatten)]
        range: PageRange,
    },
    /// Print a user's comment history as JSON lines
    User {
        name: String,
        #[command(flatten)]
        range: PageRange,
    },
    /// Print the topics listed in a section as JSON lines
    Section {
        name: String,
        #[command(flatten)]
        range: PageRange,
    },
    /// Summarize who commented on a thread
    Commenters {
        /// URL of the thread's first page
        url: String,
        /// Print the sorted unique names instead of per-name counts
        #[arg(long)]
        unique: bool,
    },
    /// Count the words used in a section's topic titles
    Words {
        name: String,
        #[command(flatten)]
        range: PageRange,
        /// Only print the most frequent words
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub(crate) struct PageRange {
    /// First page index
    #[arg(long, default_value_t = 0)]
    pub start: u32,
    /// Last page index, inclusive (default: every page)
    #[arg(long)]
    pub stop: Option<u32>,
}

impl PageRange {
    pub fn stop_bound(&self) -> StopBound {
        match self.stop {
            Some(last) => StopBound::At(last),
            None => StopBound::All,
        }
    }
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(site) = &self.site {
            config.site_url = site.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(mode) = self.cache_mode {
            config.cache_mode = mode;
        }
        if let Some(path) = &self.audit {
            config.audit_path = Some(path.clone());
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}
