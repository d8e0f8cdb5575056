use crate::process::{self, Output, Runner};
use std::path::PathBuf;

const UP_TO_DATE_MARKERS: &[&str] = &["Already up to date", "Already up-to-date"];

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PullOutcome {
    UpToDate,
    Updated,
}

impl PullOutcome {
    fn from_stdout(stdout: &str) -> Self {
        if UP_TO_DATE_MARKERS
            .iter()
            .any(|marker| stdout.contains(marker))
        {
            PullOutcome::UpToDate
        } else {
            PullOutcome::Updated
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommitInfo {
    pub author_email: String,
    pub subject: String,
}

impl CommitInfo {
    fn from_log_output(stdout: &str) -> Option<Self> {
        let mut lines = stdout.lines();
        let author_email = lines.next()?.trim();
        let subject = lines.next().unwrap_or_default().trim();
        if author_email.is_empty() {
            return None;
        }
        Some(CommitInfo {
            author_email: author_email.to_owned(),
            subject: subject.to_owned(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Process(#[from] process::Error),
    #[error("git {command} {}", .status.message())]
    Failed {
        command: &'static str,
        status: process::ExitStatus,
        stderr: String,
    },
    #[error("no author address in git log output")]
    NoAuthor,
}

/// Git commands against one working copy.
#[derive(Debug)]
pub struct Git<'a> {
    binary: PathBuf,
    repository: PathBuf,
    runner: &'a Runner,
}

impl<'a> Git<'a> {
    pub fn new(
        binary: impl Into<PathBuf>,
        repository: impl Into<PathBuf>,
        runner: &'a Runner,
    ) -> Self {
        Git {
            binary: binary.into(),
            repository: repository.into(),
            runner,
        }
    }

    pub async fn pull(&self) -> Result<PullOutcome, Error> {
        let output = self.git("pull", &["pull"]).await?;
        Ok(PullOutcome::from_stdout(&output.stdout))
    }

    pub async fn last_commit(&self) -> Result<CommitInfo, Error> {
        let output = self
            .git("log", &["log", "-1", "--format=%ae%n%s"])
            .await?;
        CommitInfo::from_log_output(&output.stdout).ok_or(Error::NoAuthor)
    }

    async fn git(&self, command: &'static str, args: &[&str]) -> Result<Output, Error> {
        let output = self
            .runner
            .run(&self.binary, args, Some(self.repository.as_path()))
            .await?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::Failed {
                command,
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}
