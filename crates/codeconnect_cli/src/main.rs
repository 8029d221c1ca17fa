//! `codeconnect` executable.
//!
//! # Responsibility
//! - Resolve server configuration from file, environment and flags.
//! - Initialize logging before the store is opened.
//! - Keep `ping`/`version` as quick linkage probes with deterministic output.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use codeconnect_server::{ConfigLayer, ConfigLoader, ServerConfig};
use log::info;

#[derive(Parser)]
#[command(name = "codeconnect")]
#[command(version)]
#[command(about = "CodeConnect organization/project/file API server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Print `pong` from the core crate.
    Ping,
    /// Print the core crate version.
    Version,
}

#[derive(Args)]
struct ServeArgs {
    /// TOML configuration file.
    #[arg(long, env = "CODECONNECT_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8080.
    #[arg(long)]
    listen: Option<String>,

    /// Store backend: memory or sqlite.
    #[arg(long)]
    store: Option<String>,

    #[arg(long)]
    sqlite_path: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Do not duplicate log lines to stderr.
    #[arg(long)]
    quiet: bool,
}

impl ServeArgs {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            listen: self.listen.clone(),
            store: self.store.clone(),
            sqlite_path: self.sqlite_path.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            echo_stderr: self.quiet.then_some(false),
        }
    }

    fn load_config(&self) -> anyhow::Result<ServerConfig> {
        let mut loader = ConfigLoader::new().with_overrides(self.overrides());
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        loader.load().context("load configuration failed")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Ping => {
            println!("codeconnect_core ping={}", codeconnect_core::ping());
            Ok(())
        }
        Commands::Version => {
            println!("codeconnect_core version={}", codeconnect_core::core_version());
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    codeconnect_core::init_logging(&config.logging_options())
        .map_err(|message| anyhow!(message))
        .context("initialize logging failed")?;
    info!(
        "event=config_load module=cli status=ok listen={} store={} log_level={}",
        config.listen,
        config.store.as_str(),
        config.log_level
    );

    codeconnect_server::serve(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "codeconnect",
            "serve",
            "--listen",
            "0.0.0.0:9000",
            "--store",
            "sqlite",
            "--quiet",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve command");
        };

        let layer = args.overrides();
        assert_eq!(layer.listen.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(layer.store.as_deref(), Some("sqlite"));
        assert_eq!(layer.echo_stderr, Some(false));
        assert_eq!(layer.log_dir, None);
    }

    #[test]
    fn omitted_quiet_keeps_lower_layers() {
        let cli = Cli::try_parse_from(["codeconnect", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.overrides(), ConfigLayer::default());
    }
}
