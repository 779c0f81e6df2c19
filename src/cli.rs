//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Bitbucket Cloud command-line client: OAuth login and session management.
#[derive(Debug, Parser)]
#[command(name = "bbcli", version = bbcli::build_info::CLI_VERSION)]
pub struct Args {
    /// Path to config file (default: ./bbcli.toml or ~/.config/bbcli/bbcli.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Override where the OAuth token record is stored.
    #[arg(long = "token-file", global = true)]
    pub token_file: Option<String>,

    /// Enable debug logging on stderr (RUST_LOG takes precedence).
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Disable color output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in through the browser using OAuth 2.0.
    Login {
        /// Print the authorization URL without trying to open a browser.
        #[arg(long = "no-browser")]
        no_browser: bool,
    },
    /// Log out and delete the saved OAuth tokens.
    Logout,
    /// Show the saved login, its expiry, and granted scopes.
    Status,
    /// Refresh the access token now, even if it is still valid.
    Refresh,
    /// Show the account the saved login belongs to.
    Whoami,
}
