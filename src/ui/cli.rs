use crate::api::client::CLIENT_NAME;
use crate::core::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hydrus-browser - Browse a hydrus client by tag from the terminal
#[derive(Parser, Debug)]
#[command(name = "hydrus-browser")]
#[command(about = "Search a hydrus client by tag, page through results and view files", long_about = None)]
#[command(version)]
#[command(subcommand_required = false)]
#[command(arg_required_else_help = false)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Tags to search for right away when opening the TUI
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// More detailed logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Overrides for values from config.toml
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Custom base directory (default: ~/.hydrus-browser)
    #[arg(long, global = true)]
    pub base_dir: Option<String>,

    /// Client API access key
    #[arg(long, global = true, env = "HYDRUS_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Host running the hydrus client
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Client API port
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Results per page
    #[arg(long, global = true)]
    pub page_size: Option<usize>,
}

impl ConnectionArgs {
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.base_dir.as_deref().map(PathBuf::from)
    }

    /// Replace settings read from config.toml with the ones given on the
    /// command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(key) = &self.access_key {
            config.settings.access_key = key.clone();
        }
        if let Some(host) = &self.host {
            config.settings.api_host = host.clone();
        }
        if let Some(port) = &self.port {
            config.settings.api_port = port.clone();
        }
        if let Some(page_size) = self.page_size {
            config.settings.page_size = page_size;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
    /// Show the client API and hydrus versions
    Version,
    /// Search by tags and print one page of results
    Search {
        /// Tags, separated by spaces
        query: String,
        /// Page to print
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Print metadata for files
    Metadata {
        /// File ids
        #[arg(required = true)]
        file_ids: Vec<u64>,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a thumbnail
    Thumbnail {
        file_id: Option<u64>,
        #[arg(long)]
        hash: Option<String>,
        /// Output path
        #[arg(short, long)]
        output: String,
    },
    /// Save a file, optionally only a byte range of it
    File {
        file_id: Option<u64>,
        #[arg(long)]
        hash: Option<String>,
        /// Output path
        #[arg(short, long)]
        output: String,
        /// First byte of the range
        #[arg(long)]
        start: Option<u64>,
        /// Last byte of the range (inclusive)
        #[arg(long, requires = "start")]
        end: Option<u64>,
    },
    /// Print a direct streaming URL for a file
    Url { file_id: u64 },
    /// Ask the client for a new access key
    Permissions {
        /// Name shown in the hydrus permissions dialog
        #[arg(long, default_value = CLIENT_NAME)]
        name: String,
    },
}
