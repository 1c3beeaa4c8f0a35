//! Command-line interface.
//!
//! - `serve` (default) - run the HTTP API with the scheduled cleanup task
//! - `cleanup` - run one booking retention pass and exit

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "salonbook")]
#[command(author, version, about = "Salon booking and shop backend", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SALONBOOK_CONFIG", default_value = "salonbook.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the API server
    Serve,
    /// Delete bookings past the retention window, then exit
    Cleanup,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["salonbook"]).unwrap();
        assert_eq!(cli.command(), Commands::Serve);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_cleanup_subcommand() {
        let cli =
            Cli::try_parse_from(["salonbook", "--config", "/etc/salon.toml", "cleanup"]).unwrap();
        assert_eq!(cli.command(), Commands::Cleanup);
        assert_eq!(cli.config, PathBuf::from("/etc/salon.toml"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["salonbook", "migrate"]).is_err());
    }
}
