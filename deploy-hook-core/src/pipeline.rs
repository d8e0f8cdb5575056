//! The deployment sequence: pull, index, build, publish and notify.
//!
//! Stages run strictly one after another and the first failing stage aborts the rest. There is no
//! locking; two deployments started at the same time race on the same checkout and web root.

use crate::{
    config::{Config, ConfigCheckError, IndexConfig},
    git::{self, CommitInfo, Git, PullOutcome},
    index::{self, ScanError},
    notify::{DeploymentResult, Notifier},
    process::{self, ExitStatus, Runner},
    publish,
};
use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Pull,
    Index,
    Build,
    Clean,
    Copy,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Pull => "git pull",
            Stage::Index => "index generation",
            Stage::Build => "build",
            Stage::Clean => "cleaning the web root",
            Stage::Copy => "copying the site",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration")]
    Config(#[from] ConfigCheckError),
    #[error("{stage} {}", .status.message())]
    StageFailed {
        stage: Stage,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{0} failed")]
    Process(Stage, #[source] process::Error),
    #[error("{0} failed")]
    Git(Stage, #[source] git::Error),
    #[error("{} failed", Stage::Index)]
    Scan(#[source] ScanError),
    #[error("failed to write document index {}", .0.display())]
    WriteIndex(PathBuf, #[source] std::io::Error),
    #[error("{0} failed")]
    Publish(Stage, #[source] publish::Error),
    #[error("{0} was interrupted")]
    Task(Stage, #[source] tokio::task::JoinError),
}

impl PipelineError {
    /// Error output captured from the failing external program, if any.
    pub fn stage_output(&self) -> Option<&str> {
        match self {
            PipelineError::StageFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// The error with all its causes and any captured error output, for human consumption.
    pub fn describe(&self) -> String {
        let mut description = error_chain(self);
        if let Some(output) = self.stage_output().map(str::trim).filter(|s| !s.is_empty()) {
            description.push('\n');
            description.push_str(output);
        }
        description
    }

    fn from_git(stage: Stage, error: git::Error) -> Self {
        match error {
            git::Error::Process(e) => PipelineError::Process(stage, e),
            git::Error::Failed { status, stderr, .. } => PipelineError::StageFailed {
                stage,
                status,
                stderr,
            },
            other => PipelineError::Git(stage, other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed,
    UpToDate,
}

impl Outcome {
    pub fn summary(&self) -> &'static str {
        match self {
            Outcome::Deployed => "Deployment successful.",
            Outcome::UpToDate => "No changes to deploy.",
        }
    }
}

/// Human-readable progress of one run. Every line is also logged.
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::warn!("{}", line);
        self.lines.push(format!("Warning: {}", line));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    runner: Runner,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Pipeline {
            config,
            runner: Runner::new(config.timeout),
        }
    }

    pub async fn run(&self, report: &mut Report) -> Result<Outcome, PipelineError> {
        self.config.check_paths()?;
        let git = Git::new(
            &self.config.git_binary,
            &self.config.repository,
            &self.runner,
        );

        report.info("Pulling latest changes...");
        let pulled = git
            .pull()
            .await
            .map_err(|e| PipelineError::from_git(Stage::Pull, e))?;
        if pulled == PullOutcome::UpToDate {
            return Ok(Outcome::UpToDate);
        }

        let commit = match &self.config.notify {
            Some(_) => self.last_commit(&git, report).await,
            None => None,
        };

        let result = self.deploy(report).await;

        if let (Some(notify), Some(commit)) = (&self.config.notify, &commit) {
            let deployment_result = match &result {
                Ok(()) => DeploymentResult::Deployed,
                Err(e) => DeploymentResult::Failed(e.describe()),
            };
            match Notifier::new(notify, &self.runner)
                .send(commit, &deployment_result)
                .await
            {
                Ok(()) => report.info(format!("Notified {}.", commit.author_email)),
                Err(e) => report.warn(format!("failed to notify author: {}", error_chain(&e))),
            }
        }

        result.map(|()| Outcome::Deployed)
    }

    async fn last_commit(&self, git: &Git<'_>, report: &mut Report) -> Option<CommitInfo> {
        match git.last_commit().await {
            Ok(commit) => Some(commit),
            Err(e) => {
                report.warn(format!(
                    "failed to determine commit author: {}",
                    error_chain(&e)
                ));
                None
            }
        }
    }

    async fn deploy(&self, report: &mut Report) -> Result<(), PipelineError> {
        if let Some(index_config) = &self.config.index {
            let count = self.generate_index(index_config).await?;
            report.info(format!("Indexed {} documents.", count));
        }

        report.info(format!("Building site: {}", self.config.build_command));
        self.build().await?;

        let build_output = self.config.build_output_dir();
        if !build_output.is_dir() {
            return Err(PipelineError::Publish(
                Stage::Copy,
                publish::Error::MissingSource(build_output),
            ));
        }

        report.info("Cleaning web root...");
        let web_root = self.config.web_root.clone();
        blocking(Stage::Clean, move || publish::clear_dir(&web_root))
            .await?
            .map_err(|e| PipelineError::Publish(Stage::Clean, e))?;

        report.info("Copying site...");
        let web_root = self.config.web_root.clone();
        let copied = blocking(Stage::Copy, move || {
            publish::copy_tree(&build_output, &web_root)
        })
        .await?
        .map_err(|e| PipelineError::Publish(Stage::Copy, e))?;
        report.info(format!("Published {} files.", copied));
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn generate_index(&self, index_config: &IndexConfig) -> Result<usize, PipelineError> {
        let root = self.config.repository.join(&index_config.documents);
        let entries = blocking(Stage::Index, move || index::build_index(&root))
            .await?
            .map_err(PipelineError::Scan)?;
        let page = index::render_page(&entries, index_config);
        let output = self.config.repository.join(&index_config.output);
        tokio::fs::write(&output, page)
            .await
            .map_err(|e| PipelineError::WriteIndex(output, e))?;
        Ok(entries.len())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn build(&self) -> Result<(), PipelineError> {
        let command = &self.config.build_command;
        let output = self
            .runner
            .run(&command.program, &command.args, Some(self.config.repository.as_path()))
            .await
            .map_err(|e| PipelineError::Process(Stage::Build, e))?;
        if output.success() {
            Ok(())
        } else {
            Err(PipelineError::StageFailed {
                stage: Stage::Build,
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}

async fn blocking<T: Send + 'static>(
    stage: Stage,
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, PipelineError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Task(stage, e))
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
