use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub mod index;
pub mod secret;

pub use index::{IndexConfig, Labels};
pub use secret::Secret;

#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub repository: PathBuf,
    #[serde(alias = "web_root")]
    pub web_root: PathBuf,
    #[serde(alias = "build_command")]
    pub build_command: CommandLine,
    #[serde(default = "default_build_output", alias = "build_output")]
    pub build_output: PathBuf,
    pub secret: Secret,
    #[serde(default = "default_secret_header", alias = "secret_header")]
    pub secret_header: String,
    #[serde(default = "default_git_binary", alias = "git_binary")]
    pub git_binary: PathBuf,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(alias = "log_file")]
    pub log_file: Option<PathBuf>,
    pub index: Option<IndexConfig>,
    pub notify: Option<NotifyConfig>,

    /// path of the configuration file, if the configuration was loaded from a file
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_build_output() -> PathBuf {
    PathBuf::from("_site")
}

fn default_secret_header() -> String {
    "X-Secret".to_owned()
}

fn default_git_binary() -> PathBuf {
    PathBuf::from("git")
}

#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotifyConfig {
    pub sender: String,
    #[serde(default = "default_sendmail_binary", alias = "sendmail_binary")]
    pub sendmail_binary: PathBuf,
}

fn default_sendmail_binary() -> PathBuf {
    PathBuf::from("/usr/sbin/sendmail")
}

/// An external command as a program and an explicit argument list.
///
/// In the configuration file this is either a list of words or a single string, which is split on
/// whitespace. No shell is involved, so quoting is not interpreted.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(try_from = "RawCommandLine")]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommandLine {
    Line(String),
    Words(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
#[error("command line must not be empty")]
pub struct EmptyCommandLine;

impl TryFrom<RawCommandLine> for CommandLine {
    type Error = EmptyCommandLine;

    fn try_from(raw: RawCommandLine) -> Result<Self, Self::Error> {
        let words = match raw {
            RawCommandLine::Line(line) => line.split_whitespace().map(str::to_owned).collect(),
            RawCommandLine::Words(words) => words,
        };
        let mut words = words.into_iter();
        let program = words.next().ok_or(EmptyCommandLine)?;
        Ok(CommandLine {
            program: PathBuf::from(program),
            args: words.collect(),
        })
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration string")]
    InvalidConfigString(#[source] eyre::Report),
    #[error("invalid configuration file {}", .0.display())]
    InvalidConfigFile(PathBuf, #[source] eyre::Report),
    #[error("i/o error reading configuration file {}", .0.display())]
    IoError(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigCheckError {
    #[error("{what} {} does not exist or is not a directory", .path.display())]
    NotADirectory { what: &'static str, path: PathBuf },
    #[error("web root {} must not be the filesystem root", .0.display())]
    WebRootIsFilesystemRoot(PathBuf),
    #[error("web root {} contains the repository {}", .0.display(), .1.display())]
    WebRootContainsRepository(PathBuf, PathBuf),
}

impl Config {
    pub fn parse(s: &str) -> Result<Config, ConfigLoadError> {
        toml::from_str(s).map_err(|e| ConfigLoadError::InvalidConfigString(e.into()))
    }

    pub async fn parse_file(p: &Path) -> Result<Config, ConfigLoadError> {
        let config_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ConfigLoadError::IoError(p.to_owned(), e))?;
        let mut config: Config = toml::from_str(&config_string)
            .map_err(|e| ConfigLoadError::InvalidConfigFile(p.to_owned(), e.into()))?;
        config.source = Some(p.to_owned());
        Ok(config)
    }

    /// Name of the CGI environment variable the web server puts the secret header into.
    pub fn secret_variable(&self) -> String {
        let header: String = self
            .secret_header
            .chars()
            .map(|c| match c {
                '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("HTTP_{}", header)
    }

    pub fn build_output_dir(&self) -> PathBuf {
        self.repository.join(&self.build_output)
    }

    pub fn check_paths(&self) -> Result<(), ConfigCheckError> {
        let repository = canonical_dir("repository", &self.repository)?;
        let web_root = canonical_dir("web root", &self.web_root)?;
        if web_root.parent().is_none() {
            return Err(ConfigCheckError::WebRootIsFilesystemRoot(web_root));
        }
        if repository.starts_with(&web_root) {
            return Err(ConfigCheckError::WebRootContainsRepository(
                web_root, repository,
            ));
        }
        Ok(())
    }
}

fn canonical_dir(what: &'static str, path: &Path) -> Result<PathBuf, ConfigCheckError> {
    let not_a_directory = || ConfigCheckError::NotADirectory {
        what,
        path: path.to_owned(),
    };
    let canonical = path.canonicalize().map_err(|_| not_a_directory())?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(not_a_directory())
    }
}
