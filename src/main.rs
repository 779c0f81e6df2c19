//! CLI entry point for bbcli.

mod app;
mod cli;
#[cfg(test)]
#[allow(dead_code)]
#[path = "testsupport.rs"]
mod testsupport;

use std::io::IsTerminal;
use std::path::PathBuf;

use app::commands::{login, logout, refresh, status, whoami};
use bbcli::config::{load_config, Config, DefaultCredentials};
use bbcli::error::CliError;
use bbcli::render::{RenderSink, Renderer};
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    let color = !args.no_color && std::io::stderr().is_terminal();
    let renderer = Renderer::new(color);

    let defaults = DefaultCredentials::from_build_env();
    let mut config = match load_config(args.config.as_deref(), Some(&defaults)) {
        Ok(c) => c,
        Err(e) => {
            renderer.error(&CliError::from(e).to_string());
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(path) = &args.token_file {
        config.token_file = Some(PathBuf::from(path));
    }

    if let Err(e) = run(&renderer, &config, args.command).await {
        renderer.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(
    renderer: &dyn RenderSink,
    config: &Config,
    command: cli::Command,
) -> Result<(), CliError> {
    match command {
        cli::Command::Login { no_browser } => {
            login::handle_login_command(renderer, config, no_browser).await
        }
        cli::Command::Logout => logout::handle_logout_command(renderer, config),
        cli::Command::Status => status::handle_status_command(renderer, config),
        cli::Command::Refresh => refresh::handle_refresh_command(renderer, config).await,
        cli::Command::Whoami => whoami::handle_whoami_command(renderer, config).await,
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let fallback = if verbose { "bbcli=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
