use crate::{
    config::NotifyConfig,
    git::CommitInfo,
    process::{self, Runner},
};

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("author address '{0}' can't be used as a mail recipient")]
    InvalidRecipient(String),
    #[error("failed to submit mail")]
    Submit(#[source] process::Error),
    #[error("mail submission {}: {}", .0.message(), .1.trim())]
    Rejected(process::ExitStatus, String),
}

/// Result of a deployment as reported to the commit author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentResult {
    Deployed,
    Failed(String),
}

/// Hands notification mails to a sendmail-compatible program.
#[derive(Debug)]
pub struct Notifier<'a> {
    config: &'a NotifyConfig,
    runner: &'a Runner,
}

impl<'a> Notifier<'a> {
    pub fn new(config: &'a NotifyConfig, runner: &'a Runner) -> Self {
        Notifier { config, runner }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(to = %commit.author_email))]
    pub async fn send(
        &self,
        commit: &CommitInfo,
        result: &DeploymentResult,
    ) -> Result<(), NotificationError> {
        let recipient = commit.author_email.as_str();
        if !is_plain_address(recipient) {
            return Err(NotificationError::InvalidRecipient(recipient.to_owned()));
        }
        let message = compose(&self.config.sender, commit, result);
        let output = self
            .runner
            .run_with_input(
                &self.config.sendmail_binary,
                &["-i", "-f", self.config.sender.as_str(), "--", recipient],
                None,
                Some(message.as_bytes()),
            )
            .await
            .map_err(NotificationError::Submit)?;
        if !output.success() {
            return Err(NotificationError::Rejected(output.status, output.stderr));
        }
        tracing::info!("sent deployment notification");
        Ok(())
    }
}

fn is_plain_address(address: &str) -> bool {
    !address.is_empty()
        && !address.starts_with('-')
        && address.contains('@')
        && !address.chars().any(|c| c.is_whitespace() || c.is_control())
}

fn compose(sender: &str, commit: &CommitInfo, result: &DeploymentResult) -> String {
    let subject = single_line(&commit.subject);
    let (status, body) = match result {
        DeploymentResult::Deployed => (
            "Deployed",
            format!("Your commit \"{}\" has been deployed.", subject),
        ),
        DeploymentResult::Failed(reason) => (
            "Deployment failed",
            format!(
                "Deploying your commit \"{}\" failed:\n\n{}",
                subject,
                reason.trim()
            ),
        ),
    };
    format!(
        "From: {}\nTo: {}\nSubject: {}: {}\nContent-Type: text/plain; charset=utf-8\n\n{}\n",
        single_line(sender),
        commit.author_email,
        status,
        subject,
        body
    )
}

fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}
