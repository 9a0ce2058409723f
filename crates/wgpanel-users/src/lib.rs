//! Manage the panel's user file from the command line.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;
use wgpanel_core::{UserStore, UserStoreError};

#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("GIT_VERSION"))]
#[command(about = "Manage wgpanel login accounts")]
pub struct Cli {
    /// Path to the users file
    #[arg(long, env = "USERS_FILE", default_value = "/etc/wgpanel/users.json")]
    pub users_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new active user
    Create { username: String, password: String },
    /// Replace a user's password
    Update { username: String, new_password: String },
    /// Allow a user to log in
    Activate { username: String },
    /// Block a user from logging in
    Deactivate { username: String },
    /// Remove a user
    Delete { username: String },
    /// Show all users
    List,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("Error: {0}")]
    Store(#[from] UserStoreError),
}

impl CliError {
    /// Help and version requests exit cleanly; everything else is a failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(e) if !e.use_stderr() => 0,
            _ => 1,
        }
    }
}

/// Apply one subcommand and return the line to print.
pub fn execute(store: &UserStore, command: Command) -> Result<String, UserStoreError> {
    match command {
        Command::Create { username, password } => {
            store.create(&username, &password)?;
            Ok(format!("User '{username}' created successfully"))
        }
        Command::Update {
            username,
            new_password,
        } => {
            store.update_password(&username, &new_password)?;
            Ok(format!("Password updated for user '{username}'"))
        }
        Command::Activate { username } => {
            store.set_active(&username, true)?;
            Ok(format!("User '{username}' activated successfully"))
        }
        Command::Deactivate { username } => {
            store.set_active(&username, false)?;
            Ok(format!("User '{username}' deactivated successfully"))
        }
        Command::Delete { username } => {
            store.delete(&username)?;
            Ok(format!("User '{username}' deleted successfully"))
        }
        Command::List => store.list(),
    }
}

/// Parse `args` (including the program name) and run the subcommand.
pub fn run<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    tracing::debug!(users_file = %cli.users_file.display(), "opening user store");
    let store = UserStore::new(cli.users_file);
    Ok(execute(&store, cli.command)?)
}
