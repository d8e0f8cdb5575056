use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
};

const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ExitStatus {
    Successful,
    Failed(Option<i32>),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self == &ExitStatus::Successful
    }

    pub fn message(&self) -> String {
        match self {
            ExitStatus::Successful => "exited successfully".to_owned(),
            ExitStatus::Failed(Some(code)) => format!("exited with error status {}", code),
            ExitStatus::Failed(None) => "exited with unknown error status".to_owned(),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Successful
        } else {
            ExitStatus::Failed(status.code())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start process '{}'", .0.display())]
    FailedToStartProcess(PathBuf, #[source] std::io::Error),
    #[error("error communicating with process '{}'", .0.display())]
    SubprocessIoError(PathBuf, #[source] std::io::Error),
    #[error("process '{}' did not finish within {:?}", .0.display(), .1)]
    TimedOut(PathBuf, Duration),
    #[error("error killing process '{}'", .0.display())]
    SubprocessTerminateError(PathBuf, #[source] std::io::Error),
}

/// Status and captured output of a finished process.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs external programs with an explicit argument list and captures their output.
#[derive(Debug, Default, Clone)]
pub struct Runner {
    timeout: Option<Duration>,
}

impl Runner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Runner { timeout }
    }

    pub async fn run(
        &self,
        program: &Path,
        args: &[impl AsRef<OsStr>],
        cwd: Option<&Path>,
    ) -> Result<Output, Error> {
        self.run_with_input(program, args, cwd, None).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(program = %program.display()))]
    pub async fn run_with_input(
        &self,
        program: &Path,
        args: &[impl AsRef<OsStr>],
        cwd: Option<&Path>,
        input: Option<&[u8]>,
    ) -> Result<Output, Error> {
        let mut cmd = Command::new(program);
        cmd.args(args.iter().map(AsRef::as_ref))
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // kill-on-drop is a final fallback, normally the process gets terminated gracefully
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        tracing::debug!(args = ?cmd.as_std().get_args().collect::<Vec<_>>(), "starting process");

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::FailedToStartProcess(program.to_owned(), e))?;
        let collect = collect_output(&mut child, input);
        let result = match self.timeout {
            Some(timeout) => {
                let timed = tokio::time::timeout(timeout, collect).await;
                match timed {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("process did not finish before timeout, terminating it");
                        terminate(&mut child, TERMINATE_GRACE_PERIOD)
                            .await
                            .map_err(|e| Error::SubprocessTerminateError(program.to_owned(), e))?;
                        return Err(Error::TimedOut(program.to_owned(), timeout));
                    }
                }
            }
            None => collect.await,
        };
        let output = result.map_err(|e| Error::SubprocessIoError(program.to_owned(), e))?;
        tracing::debug!(status = ?output.status, "process finished");
        Ok(output)
    }
}

async fn collect_output(child: &mut Child, input: Option<&[u8]>) -> std::io::Result<Output> {
    let stdin = child.stdin.take();
    let write_input = async move {
        if let (Some(mut stdin), Some(input)) = (stdin, input) {
            let written = match stdin.write_all(input).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            };
            match written {
                // exited without reading everything
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("process closed stdin before reading all input");
                }
                other => other?,
            }
        }
        Ok::<_, std::io::Error>(())
    };
    let (_, stdout, stderr) = tokio::try_join!(
        write_input,
        read_lossy(child.stdout.take()),
        read_lossy(child.stderr.take()),
    )?;
    let status = child.wait().await?;
    Ok(Output {
        status: status.into(),
        stdout,
        stderr,
    })
}

async fn read_lossy(pipe: Option<impl AsyncRead + Unpin>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(unix)]
fn ask_to_terminate(child: &mut Child) -> std::io::Result<()> {
    match child.id() {
        Some(pid) => {
            unsafe { libc::kill(pid as i32, libc::SIGTERM) };
            Ok(())
        }
        // already reaped
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn ask_to_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

#[tracing::instrument(level = "debug", skip_all, fields(pid = child.id(), grace_period_secs = grace_period.as_secs_f64()))]
async fn terminate(child: &mut Child, grace_period: Duration) -> std::io::Result<()> {
    tracing::debug!("trying to terminate gracefully");
    ask_to_terminate(child)?;
    match tokio::time::timeout(grace_period, child.wait()).await {
        Ok(result) => {
            tracing::debug!("process terminated before timeout");
            result?;
        }
        Err(_) => {
            tracing::debug!("process did not terminate before timeout, killing it instead");
            child.kill().await?;
        }
    };
    Ok(())
}
