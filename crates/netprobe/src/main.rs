mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "netprobe", &mut std::io::stdout());
            Ok(())
        }

        Command::Devices(args) => {
            let cfg = config::load_config()?;
            let mut global = cli.global;
            config::apply_defaults(&mut global, &cfg)?;
            let settings = config::resolve_manager(&global, &cfg)?;
            tracing::debug!(manager = %settings.url, "dispatching devices command");
            commands::devices::handle(args, &settings, &global).await
        }

        Command::Exec(args) => {
            let cfg = config::load_config()?;
            let mut global = cli.global;
            config::apply_defaults(&mut global, &cfg)?;
            let ssh = config::resolve_ssh(&args, &global, &cfg)?;
            tracing::debug!(peer = %ssh.socket_addr(), "dispatching exec command");
            commands::exec::handle(&args, &ssh, &global).await
        }
    }
}
