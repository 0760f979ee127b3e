use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "order-watch")]
#[command(version)]
#[command(about = "Exchange open-order watcher with price alerts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and the per-environment overrides
    #[arg(long, global = true, default_value = "config", env = "WATCHER_CONFIG_DIR")]
    pub config_dir: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Serve the dashboard and run the periodic refresh (default)
    Serve {
        /// Serve only; refresh on demand through /refresh
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Run one refresh-and-check pass and exit
    Refresh,
    /// Clear the failed-login lockout of a source address
    Unlock {
        /// Source address exactly as logged by the gate
        source: String,
    },
}

impl Cli {
    /// Subcommand to run, `serve` when none was given
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Serve { no_scheduler: false })
    }
}
