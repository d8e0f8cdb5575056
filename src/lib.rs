use clap::Parser;
use deploy_hook_core::{config::Config, secrets::Secrets};
use std::process::ExitCode;

pub mod cli;
mod commands;
mod logging;

async fn load_config(cli: &cli::Cli) -> eyre::Result<Config> {
    let config_file = cli.config_file();
    let path = config_file.path()?;
    Ok(Config::parse_file(path).await?)
}

pub async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    let maybe_config = load_config(&cli).await;

    let log_file = cli.log_file.clone().or_else(|| {
        maybe_config
            .as_ref()
            .ok()
            .and_then(|config| config.log_file.clone())
    });
    let cgi = matches!(cli.subcommand, None | Some(cli::Cmd::Cgi));
    logging::setup_logger(log_file.as_deref(), cli.verbose, !cgi)?;
    if let Some(source) = maybe_config.as_ref().ok().and_then(|c| c.source.as_ref()) {
        tracing::debug!("using configuration file {}", source.display());
    }

    let secrets = Secrets;

    match cli.subcommand {
        None | Some(cli::Cmd::Cgi) => commands::cgi(&secrets, maybe_config).await,
        Some(cli::Cmd::Deploy) => commands::deploy(&maybe_config?).await,
        Some(cli::Cmd::Index(args)) => {
            commands::index(maybe_config, args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
