#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use clap::Parser;
use mailprobe::{Cli, Config, controller, find_config_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => find_config_file()?,
    };
    let config = Config::load(&config_path)?;

    controller::execute(config, cli.command()).await
}
