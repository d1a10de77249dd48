//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// Jamhub - game jam backend
#[derive(Parser)]
#[command(name = "jamhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage the global admin flag directly in storage
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Make a user a global admin, creating the record if needed
    Grant {
        /// User name
        name: String,
    },
    /// Remove the global admin flag
    Revoke {
        /// User name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Revoke every session of a user
    Purge {
        /// User name
        name: String,
    },
}
