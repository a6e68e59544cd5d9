//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::Collection;
use crate::validate::collection_arg;

pub mod commands;

/// startsync - start-page history and favorites, synced through Dropbox
#[derive(Parser, Debug)]
#[command(name = "startsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.startsync/data/startsync.db)
    #[arg(long, global = true, env = "STARTSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the local database and a default config file
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show sync status
    Status {
        /// Also compare each collection with the remote copy
        #[arg(long)]
        remote: bool,
    },

    /// Run one sync pass (replays the offline queue first)
    Sync,

    /// Search history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Favorite sites
    #[command(alias = "favs")]
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },

    /// Offline operation queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },

    /// Dropbox credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Keep syncing in the foreground until interrupted
    Daemon {
        /// Seconds between passes (default: config `syncIntervalSecs`)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// History Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// Record a search (moves it to the front)
    Add {
        /// Search term
        term: String,
    },

    /// Remove a search term
    #[command(alias = "rm")]
    Remove {
        /// Search term to remove
        term: String,
    },

    /// List recent searches
    #[command(alias = "ls")]
    List {
        /// Maximum entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show the remote copy instead of the local one
        #[arg(long)]
        remote: bool,
    },
}

// ============================================================================
// Favorites Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum FavoritesCommands {
    /// Add a favorite site
    Add {
        /// Absolute URL
        url: String,
    },

    /// Remove a favorite
    #[command(alias = "rm")]
    Remove {
        /// URL of the favorite
        url: String,
    },

    /// Pin a favorite to the front
    Pin {
        /// URL of the favorite
        url: String,
    },

    /// Unpin a favorite
    Unpin {
        /// URL of the favorite
        url: String,
    },

    /// Reorder favorites: entry at ORDER[i] moves to position i
    Reorder {
        /// Comma-separated positions from `favorites list`, e.g. 2,0,1
        #[arg(value_delimiter = ',', required = true)]
        order: Vec<usize>,
    },

    /// List favorites in display order
    #[command(alias = "ls")]
    List {
        /// Show the remote copy instead of the local one
        #[arg(long)]
        remote: bool,
    },
}

// ============================================================================
// Queue Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum QueueCommands {
    /// List queued operations (oldest first)
    #[command(alias = "ls")]
    List {
        /// Only show one collection (history, favorites)
        #[arg(short, long, value_parser = collection_arg)]
        collection: Option<Collection>,
    },

    /// Replay queued operations now
    Drain,

    /// Drop all queued operations without replaying them
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

// ============================================================================
// Auth Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Show stored credential state
    Status,

    /// Store credentials from a refresh token or an authorization code
    Login {
        /// Refresh token obtained from the Dropbox app console
        #[arg(required_unless_present = "code", conflicts_with = "code")]
        refresh_token: Option<String>,

        /// Authorization code from the URL printed by `auth url`
        #[arg(long)]
        code: Option<String>,
    },

    /// Print the authorization URL to open in a browser
    Url,

    /// Forget stored credentials
    Logout,
}
