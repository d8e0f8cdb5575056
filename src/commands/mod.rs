use crate::cli;
use deploy_hook_core::{
    config::{Config, IndexConfig},
    handler::{self, Request, Response, Status},
    index,
    pipeline::{Pipeline, Report},
    secrets::Secrets,
};
use eyre::WrapErr;
use std::{io::Write, process::ExitCode};

pub async fn cgi(secrets: &Secrets, maybe_config: eyre::Result<Config>) -> eyre::Result<ExitCode> {
    let response = match maybe_config {
        Ok(config) => {
            let request = Request::from_env(&config);
            handler::handle(&config, secrets, &request).await
        }
        Err(e) => {
            tracing::error!("{:?}", e);
            Response::error(Status::InternalServerError, "Server misconfigured.")
        }
    };
    response
        .write_to(std::io::stdout().lock())
        .wrap_err("failed to write response")?;
    Ok(exit_code(response.exit_code()))
}

pub async fn deploy(config: &Config) -> eyre::Result<ExitCode> {
    let mut report = Report::default();
    let result = Pipeline::new(config).run(&mut report).await;
    let mut stdout = std::io::stdout().lock();
    for line in report.lines() {
        writeln!(stdout, "{}", line)?;
    }
    match result {
        Ok(outcome) => {
            writeln!(stdout, "{}", outcome.summary())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            writeln!(stdout, "Deployment failed: {}", e.describe())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn index(maybe_config: eyre::Result<Config>, args: cli::index::Cli) -> eyre::Result<()> {
    let index_config = maybe_config
        .ok()
        .and_then(|config| config.index)
        .unwrap_or_else(IndexConfig::default);
    let entries = index::build_index(&args.dir)
        .wrap_err_with(|| format!("failed to index '{}'", args.dir.display()))?;
    let output = if args.page {
        index::render_page(&entries, &index_config)
    } else {
        index::render_table(&entries, &index_config.labels, &index_config.link_prefix)
    };
    print!("{}", output);
    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
