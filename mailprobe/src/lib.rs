//! The `mailprobe` process: configuration, command line and lifecycle.

pub mod cli;
pub mod config;
pub mod controller;

pub use cli::{Cli, Command};
pub use config::{Config, find_config_file};
pub use controller::Mailprobe;
