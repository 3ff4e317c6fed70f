use std::path::PathBuf;

use clap::Subcommand;

use crate::types::Role;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory (create database and admin account)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show database status information
    Info {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new account
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username for the new account
        #[arg(long)]
        username: Option<String>,

        /// Role of the new account (admin or staff)
        #[arg(long, default_value = "staff")]
        role: Role,

        /// Password; generated when omitted in non-interactive mode
        #[arg(long)]
        password: Option<String>,

        /// Skip interactive prompts (requires --username)
        #[arg(long)]
        non_interactive: bool,
    },
}

/// Arguments of the top-level `import` command.
#[derive(clap::Args)]
pub struct ImportArgs {
    /// Data directory for the database
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// CSV file to import (UTF-8 or Shift_JIS)
    #[arg(long, short)]
    pub file: PathBuf,

    /// Name recorded in the operation log
    #[arg(long, default_value = "cli")]
    pub as_user: String,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}
