use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// End-to-end mail delivery monitor
#[derive(Parser, Debug)]
#[command(name = "mailprobe")]
#[command(about = "Send probe mail over SMTP and verify it arrives over IMAP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file. Otherwise `MAILPROBE_CONFIG`,
    /// `./mailprobe.config.ron` and `/etc/mailprobe/mailprobe.config.ron` are
    /// tried in that order.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Monitor every target until interrupted (the default)
    Run,
    /// Run a single probe cycle and report the result
    Check {
        /// Only probe this target
        #[arg(short, long)]
        target: Option<String>,
    },
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
