use clap::{Parser, Subcommand};
use dirs_next as dirs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ConfigFile(Option<PathBuf>);

impl ConfigFile {
    pub fn path(&self) -> eyre::Result<&Path> {
        self.0
            .as_ref()
            .map(|p| p.as_path())
            .ok_or_else(|| eyre::eyre!("failed to get default config file path"))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let default_path = dirs::config_dir().map(|dir| dir.join("deploy-hook").join("config.toml"));
        ConfigFile(default_path)
    }
}

impl From<Option<PathBuf>> for ConfigFile {
    fn from(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => ConfigFile(Some(path)),
            None => ConfigFile::default(),
        }
    }
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "<none>"),
        }
    }
}

/// Rebuilds and publishes a git-hosted static site when triggered by a webhook.
///
/// Without a subcommand, handles a single CGI request.
#[derive(Debug, Parser)]
#[command(name = "deploy-hook", disable_version_flag = true)]
pub struct Cli {
    /// Sets a custom configuration file path
    #[arg(short, long, env = "DEPLOY_HOOK_CONFIG_FILE", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Appends log output to a file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Logs debug output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub subcommand: Option<Cmd>,
}

impl Cli {
    pub fn config_file(&self) -> ConfigFile {
        ConfigFile::from(self.config_file.clone())
    }
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Handles a CGI request (the default)
    Cgi,

    /// Runs a deployment right away, without a request
    Deploy,

    /// Prints the document index of a directory
    Index(index::Cli),
}

pub mod index {
    use std::path::PathBuf;

    #[derive(Debug, clap::Args)]
    pub struct Cli {
        /// The directory to index
        #[arg(value_name = "DIR")]
        pub dir: PathBuf,

        /// Prints the whole page including front matter
        #[arg(long)]
        pub page: bool,
    }
}
