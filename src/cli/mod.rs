//! CLI module - command-line interface for AquaDesk
//!
//! Structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};

/// AquaDesk - back-office terminal client for the water-station POS
#[derive(Parser)]
#[command(name = "aquadesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Log in to the POS backend
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the current user profile
    #[command(alias = "me")]
    Whoami,

    /// Manage device approval requests (admin)
    Devices {
        #[command(subcommand)]
        command: DeviceCommands,
    },

    /// Show the financial dashboard
    #[command(alias = "dash")]
    Dashboard {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Keep the dashboard open and refresh periodically
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// List pending approval requests
    #[command(alias = "ls")]
    List,

    /// Approve a pending request by id
    Approve {
        /// Request id
        id: String,
    },

    /// Approve using the code emailed to the account owner
    ApproveCode {
        /// Emailed approval code
        code: String,
    },

    /// Reject a pending request by id
    Reject {
        /// Request id
        id: String,
    },

    /// Show approved devices per user
    Summary,
}
